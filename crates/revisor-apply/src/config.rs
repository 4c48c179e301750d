//! Configuration for the Apply Engine

use serde::{Deserialize, Serialize};

/// Configuration for applying approved changes
///
/// # Examples
///
/// ```
/// use revisor_apply::ApplyConfig;
///
/// let config = ApplyConfig::default();
/// assert_eq!(config.max_concurrent_documents, 4);
///
/// // One document at a time
/// let config = ApplyConfig::sequential();
/// assert_eq!(config.max_concurrent_documents, 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplyConfig {
    /// Documents written concurrently; changes within a document are
    /// always applied one after another
    pub max_concurrent_documents: usize,

    /// A document gets a major version bump when the changed characters
    /// exceed this share of its prior length
    pub major_change_threshold: f64,
}

impl Default for ApplyConfig {
    fn default() -> Self {
        Self {
            max_concurrent_documents: 4,
            major_change_threshold: 0.50,
        }
    }
}

impl ApplyConfig {
    /// Write one document at a time
    pub fn sequential() -> Self {
        Self {
            max_concurrent_documents: 1,
            ..Self::default()
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_concurrent_documents == 0 {
            return Err("max_concurrent_documents must be greater than 0".to_string());
        }
        if !(self.major_change_threshold > 0.0 && self.major_change_threshold <= 1.0) {
            return Err(format!(
                "major_change_threshold {} must be within (0.0, 1.0]",
                self.major_change_threshold
            ));
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(ApplyConfig::default().validate().is_ok());
        assert!(ApplyConfig::sequential().validate().is_ok());
    }

    #[test]
    fn test_zero_concurrency_invalid() {
        let config = ApplyConfig {
            max_concurrent_documents: 0,
            ..ApplyConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_threshold_bounds() {
        let mut config = ApplyConfig::default();
        config.major_change_threshold = 0.0;
        assert!(config.validate().is_err());
        config.major_change_threshold = 1.0;
        assert!(config.validate().is_ok());
        config.major_change_threshold = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = ApplyConfig {
            max_concurrent_documents: 8,
            major_change_threshold: 0.75,
        };
        let parsed = ApplyConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(config, parsed);
    }
}
