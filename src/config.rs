//! Registry Configuration
//!
//! Loads a [`ProfileRegistry`] from a YAML file:
//!
//! ```yaml
//! currency: IDR
//! products: [Shirt, Dress]
//! materials:
//!   - name: Cotton
//!     cost_per_metre: 5000
//!     recommended_for: [Shirt, Dress]
//!     sizes:
//!       - { id: S, consumption: 1.2, profit: 25000 }
//!       - { id: M, consumption: 1.5, profit: 30000 }
//! ```

use std::{fs, path::Path};

use rusty_money::iso::{self, Currency};
use serde::Deserialize;
use thiserror::Error;

use crate::profiles::{MaterialProfile, ProfileError, registry::ProfileRegistry};

/// Configuration Loading Errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error reading the configuration file
    #[error("Failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Unknown currency code
    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),

    /// Invalid material or size data
    #[error("Invalid profile data: {0}")]
    Profile(#[from] ProfileError),
}

/// Registry file contents
#[derive(Debug, Deserialize)]
pub struct RegistryConfig {
    /// ISO currency code used to report profit
    pub currency: String,

    /// Product catalogue; the built-in list is used when omitted
    #[serde(default)]
    pub products: Option<Vec<String>>,

    /// Material profiles in display order
    pub materials: Vec<MaterialConfig>,
}

/// One material profile
#[derive(Debug, Deserialize)]
pub struct MaterialConfig {
    /// Material name
    pub name: String,

    /// Material cost per metre
    pub cost_per_metre: f64,

    /// Product categories this material suits
    #[serde(default)]
    pub recommended_for: Vec<String>,

    /// Sizes in declaration order
    pub sizes: Vec<SizeConfig>,
}

/// One size within a material profile
#[derive(Debug, Deserialize)]
pub struct SizeConfig {
    /// Size identifier
    pub id: String,

    /// Material length consumed per unit
    pub consumption: f64,

    /// Profit per unit
    pub profit: f64,
}

impl TryFrom<MaterialConfig> for MaterialProfile {
    type Error = ProfileError;

    fn try_from(config: MaterialConfig) -> Result<Self, Self::Error> {
        if config.sizes.is_empty() {
            return Err(ProfileError::NoSizes(config.name));
        }

        let mut profile = MaterialProfile::new(config.name, config.cost_per_metre)?;

        for size in config.sizes {
            profile.add_size(size.id, size.consumption, size.profit)?;
        }

        profile.recommend_for(config.recommended_for);

        Ok(profile)
    }
}

impl TryFrom<RegistryConfig> for ProfileRegistry {
    type Error = ConfigError;

    fn try_from(config: RegistryConfig) -> Result<Self, Self::Error> {
        let mut registry = ProfileRegistry::new(parse_currency(&config.currency)?);

        if let Some(products) = config.products {
            registry.set_products(products);
        }

        for material in config.materials {
            registry.insert(MaterialProfile::try_from(material)?)?;
        }

        Ok(registry)
    }
}

impl ProfileRegistry {
    /// Parse a registry from YAML text.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the YAML is invalid, the currency is unknown, or a
    /// profile fails validation.
    pub fn from_yaml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: RegistryConfig = serde_norway::from_str(contents)?;

        config.try_into()
    }

    /// Load a registry from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read or its contents are invalid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path.as_ref())?;

        Self::from_yaml_str(&contents)
    }
}

/// Map an ISO currency code to a supported currency.
///
/// # Errors
///
/// Returns [`ConfigError::UnknownCurrency`] for codes outside the supported set.
pub fn parse_currency(code: &str) -> Result<&'static Currency, ConfigError> {
    let currency = match code.trim() {
        "IDR" => iso::IDR,
        "MYR" => iso::MYR,
        "SGD" => iso::SGD,
        "USD" => iso::USD,
        "GBP" => iso::GBP,
        "EUR" => iso::EUR,
        other => return Err(ConfigError::UnknownCurrency(other.to_string())),
    };

    Ok(currency)
}
