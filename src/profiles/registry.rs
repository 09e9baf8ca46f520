//! Profile Registry

use rustc_hash::FxHashMap;
use rusty_money::iso::{self, Currency};
use slotmap::{SlotMap, new_key_type};

use crate::{
    allocation::{AllocationError, AllocationRequest},
    profiles::{MaterialProfile, ProfileError},
};

new_key_type! {
    /// Material Key
    pub struct MaterialKey;
}

/// Product categories offered when the configuration does not list any.
pub const DEFAULT_PRODUCTS: [&str; 9] = [
    "Shirt", "Trousers", "Uniform", "Dress", "Blouse", "Suit", "Leggings", "Gown", "Jeans",
];

/// Read-only registry of material profiles, keyed by material name.
#[derive(Debug)]
pub struct ProfileRegistry {
    currency: &'static Currency,
    products: Vec<String>,
    profiles: SlotMap<MaterialKey, MaterialProfile>,
    keys: FxHashMap<String, MaterialKey>,
    order: Vec<MaterialKey>,
}

impl Default for ProfileRegistry {
    fn default() -> Self {
        Self::new(iso::IDR)
    }
}

impl ProfileRegistry {
    /// Create an empty registry reporting profit in the given currency.
    pub fn new(currency: &'static Currency) -> Self {
        Self {
            currency,
            products: DEFAULT_PRODUCTS.iter().map(ToString::to_string).collect(),
            profiles: SlotMap::with_key(),
            keys: FxHashMap::default(),
            order: Vec::new(),
        }
    }

    /// Register a profile under its material name.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::DuplicateMaterial`] if the name is already registered.
    pub fn insert(&mut self, profile: MaterialProfile) -> Result<MaterialKey, ProfileError> {
        if self.keys.contains_key(profile.name()) {
            return Err(ProfileError::DuplicateMaterial(profile.name().to_string()));
        }

        let name = profile.name().to_string();
        let key = self.profiles.insert(profile);

        self.keys.insert(name, key);
        self.order.push(key);

        Ok(key)
    }

    /// Replace the product catalogue.
    pub fn set_products<I, S>(&mut self, products: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.products = products.into_iter().map(Into::into).collect();
    }

    /// Look up a profile by material name.
    pub fn get(&self, name: &str) -> Option<&MaterialProfile> {
        self.keys
            .get(name)
            .and_then(|key| self.profiles.get(*key))
    }

    /// Look up a profile by material name, failing for unknown materials.
    ///
    /// # Errors
    ///
    /// Returns [`AllocationError::InvalidMaterialType`] if no profile has this name.
    pub fn profile(&self, name: &str) -> Result<&MaterialProfile, AllocationError> {
        self.get(name)
            .ok_or_else(|| AllocationError::InvalidMaterialType(name.to_string()))
    }

    /// Start an allocation request for the named material.
    ///
    /// # Errors
    ///
    /// Returns [`AllocationError::InvalidMaterialType`] if no profile has this name.
    pub fn request(
        &self,
        material: &str,
        budget: f64,
    ) -> Result<AllocationRequest<'_>, AllocationError> {
        Ok(AllocationRequest::new(budget, self.profile(material)?))
    }

    /// Profiles in registration order
    pub fn iter(&self) -> impl Iterator<Item = &MaterialProfile> {
        self.order.iter().filter_map(|key| self.profiles.get(*key))
    }

    /// Material names in registration order
    pub fn names(&self) -> Vec<&str> {
        self.iter().map(MaterialProfile::name).collect()
    }

    /// Materials recommended for a product category.
    ///
    /// Falls back to every registered material when none lists the category.
    pub fn recommend(&self, product: &str) -> Vec<&str> {
        let recommended: Vec<&str> = self
            .iter()
            .filter(|profile| profile.recommends(product))
            .map(MaterialProfile::name)
            .collect();

        if recommended.is_empty() {
            self.names()
        } else {
            recommended
        }
    }

    /// Currency used to report profit
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// Product categories known to the registry
    pub fn products(&self) -> &[String] {
        &self.products
    }

    /// Number of registered materials
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns true if no materials are registered.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    fn registry() -> Result<ProfileRegistry, ProfileError> {
        let mut registry = ProfileRegistry::new(iso::IDR);

        let mut cotton = MaterialProfile::new("Cotton", 5.0)?;
        cotton
            .add_size("S", 1.2, 20.0)?
            .recommend_for(["Shirt", "Dress"]);

        let mut denim = MaterialProfile::new("Denim", 9.0)?;
        denim.add_size("M", 1.6, 40.0)?.recommend_for(["Jeans"]);

        let mut linen = MaterialProfile::new("Linen", 7.0)?;
        linen.add_size("L", 1.8, 30.0)?.recommend_for(["Shirt"]);

        registry.insert(cotton)?;
        registry.insert(denim)?;
        registry.insert(linen)?;

        Ok(registry)
    }

    #[test]
    fn names_follow_registration_order() -> TestResult {
        let registry = registry()?;

        assert_eq!(registry.names(), ["Cotton", "Denim", "Linen"]);
        assert_eq!(registry.len(), 3);

        Ok(())
    }

    #[test]
    fn recommend_filters_by_category() -> TestResult {
        let registry = registry()?;

        assert_eq!(registry.recommend("Shirt"), ["Cotton", "Linen"]);
        assert_eq!(registry.recommend("Jeans"), ["Denim"]);

        Ok(())
    }

    #[test]
    fn recommend_falls_back_to_all_materials() -> TestResult {
        let registry = registry()?;

        assert_eq!(registry.recommend("Parka"), ["Cotton", "Denim", "Linen"]);

        Ok(())
    }

    #[test]
    fn insert_rejects_duplicate_material() -> TestResult {
        let mut registry = registry()?;

        let result = registry.insert(MaterialProfile::new("Denim", 1.0)?);

        assert_eq!(
            result.err(),
            Some(ProfileError::DuplicateMaterial("Denim".to_string()))
        );

        Ok(())
    }

    #[test]
    fn unknown_material_is_invalid_material_type() -> TestResult {
        let registry = registry()?;

        let result = registry.profile("Silk");

        assert!(matches!(
            result,
            Err(AllocationError::InvalidMaterialType(ref name)) if name == "Silk"
        ));

        Ok(())
    }

    #[test]
    fn default_products_are_used_until_replaced() {
        let mut registry = ProfileRegistry::default();

        assert_eq!(registry.products().len(), DEFAULT_PRODUCTS.len());
        assert_eq!(registry.currency(), iso::IDR);

        registry.set_products(["Scarf"]);

        assert_eq!(registry.products(), ["Scarf".to_string()]);
        assert!(registry.is_empty());
    }
}
