//! Material Profiles

use smallvec::SmallVec;
use thiserror::Error;

pub mod registry;

/// Errors raised while building material profiles.
#[derive(Debug, Error, PartialEq)]
pub enum ProfileError {
    /// Consumption per unit must be a finite, positive length.
    #[error("size {size} has invalid consumption per unit: {consumption}")]
    NonPositiveConsumption {
        /// Size identifier
        size: String,

        /// Rejected consumption value
        consumption: f64,
    },

    /// Profit per unit must be finite.
    #[error("size {size} has non-finite profit per unit: {profit}")]
    NonFiniteProfit {
        /// Size identifier
        size: String,

        /// Rejected profit value
        profit: f64,
    },

    /// Material cost per metre must be finite and non-negative.
    #[error("material {material} has invalid cost per metre: {cost}")]
    InvalidCost {
        /// Material name
        material: String,

        /// Rejected cost value
        cost: f64,
    },

    /// The same size identifier was declared twice in one profile.
    #[error("size {size} is declared more than once in material {material}")]
    DuplicateSize {
        /// Material name
        material: String,

        /// Duplicated size identifier
        size: String,
    },

    /// The same material name was registered twice.
    #[error("material {0} is registered more than once")]
    DuplicateMaterial(String),

    /// A profile was declared without any sizes.
    #[error("material {0} declares no sizes")]
    NoSizes(String),
}

/// Per-unit production parameters for a single size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeParameters {
    consumption: f64,
    profit: f64,
}

impl SizeParameters {
    /// Create size parameters, validating that consumption is positive and profit is finite.
    ///
    /// # Errors
    ///
    /// - [`ProfileError::NonPositiveConsumption`]: consumption is zero, negative or not finite.
    /// - [`ProfileError::NonFiniteProfit`]: profit is NaN or infinite.
    pub fn new(size: &str, consumption: f64, profit: f64) -> Result<Self, ProfileError> {
        if !consumption.is_finite() || consumption <= 0.0 {
            return Err(ProfileError::NonPositiveConsumption {
                size: size.to_string(),
                consumption,
            });
        }

        if !profit.is_finite() {
            return Err(ProfileError::NonFiniteProfit {
                size: size.to_string(),
                profit,
            });
        }

        Ok(Self {
            consumption,
            profit,
        })
    }

    /// Material length consumed by one unit
    pub fn consumption(&self) -> f64 {
        self.consumption
    }

    /// Profit earned by one unit, before material cost
    pub fn profit(&self) -> f64 {
        self.profit
    }

    /// Profit per unit after paying for the material it consumes.
    pub fn net_margin(&self, cost_per_metre: f64) -> f64 {
        self.profit - self.consumption * cost_per_metre
    }

    /// Net margin earned per metre of material.
    pub fn ratio(&self, cost_per_metre: f64) -> f64 {
        self.net_margin(cost_per_metre) / self.consumption
    }
}

/// A named size within a material profile.
#[derive(Debug, Clone, PartialEq)]
pub struct Size {
    id: String,
    parameters: SizeParameters,
}

impl Size {
    /// Size identifier (e.g. `"M"`)
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Production parameters for this size
    pub fn parameters(&self) -> &SizeParameters {
        &self.parameters
    }

    /// Material length consumed by one unit
    pub fn consumption(&self) -> f64 {
        self.parameters.consumption
    }

    /// Profit earned by one unit
    pub fn profit(&self) -> f64 {
        self.parameters.profit
    }
}

/// Reference data for one material type: its sizes, cost and recommended uses.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialProfile {
    name: String,
    cost_per_metre: f64,
    recommended_for: Vec<String>,
    sizes: SmallVec<[Size; 8]>,
}

impl MaterialProfile {
    /// Create an empty profile with the given material cost per metre.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::InvalidCost`] if the cost is negative or not finite.
    pub fn new(name: impl Into<String>, cost_per_metre: f64) -> Result<Self, ProfileError> {
        let name = name.into();

        if !cost_per_metre.is_finite() || cost_per_metre < 0.0 {
            return Err(ProfileError::InvalidCost {
                material: name,
                cost: cost_per_metre,
            });
        }

        Ok(Self {
            name,
            cost_per_metre,
            recommended_for: Vec::new(),
            sizes: SmallVec::new(),
        })
    }

    /// Append a size. Sizes keep declaration order.
    ///
    /// # Errors
    ///
    /// - [`ProfileError::DuplicateSize`]: the size is already declared on this profile.
    /// - [`ProfileError::NonPositiveConsumption`] / [`ProfileError::NonFiniteProfit`]: invalid parameters.
    pub fn add_size(
        &mut self,
        id: impl Into<String>,
        consumption: f64,
        profit: f64,
    ) -> Result<&mut Self, ProfileError> {
        let id = id.into();

        if self.contains(&id) {
            return Err(ProfileError::DuplicateSize {
                material: self.name.clone(),
                size: id,
            });
        }

        let parameters = SizeParameters::new(&id, consumption, profit)?;

        self.sizes.push(Size { id, parameters });

        Ok(self)
    }

    /// Add product categories this material is recommended for.
    pub fn recommend_for<I, S>(&mut self, products: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.recommended_for
            .extend(products.into_iter().map(Into::into));

        self
    }

    /// Material name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Material cost per metre, shared by every size
    pub fn cost_per_metre(&self) -> f64 {
        self.cost_per_metre
    }

    /// Sizes in declaration order
    pub fn sizes(&self) -> &[Size] {
        &self.sizes
    }

    /// Look up a size by identifier.
    pub fn size(&self, id: &str) -> Option<&Size> {
        self.sizes.iter().find(|size| size.id == id)
    }

    /// Returns true if the profile declares the given size.
    pub fn contains(&self, id: &str) -> bool {
        self.size(id).is_some()
    }

    /// Product categories this material suits
    pub fn recommended_for(&self) -> &[String] {
        &self.recommended_for
    }

    /// Returns true if the material is recommended for the given product category.
    pub fn recommends(&self, product: &str) -> bool {
        self.recommended_for.iter().any(|p| p == product)
    }
}
