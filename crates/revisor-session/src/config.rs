//! Unified configuration for a revision session

use crate::error::SessionError;
use crate::upload::UploadPolicy;
use revisor_analyzer::AnalyzerConfig;
use revisor_apply::ApplyConfig;
use revisor_gatekeeper::ValidationConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// All component settings, one table each
///
/// # Examples
///
/// ```
/// use revisor_session::RevisorConfig;
///
/// let config = RevisorConfig::from_toml(r#"
///     [analyzer]
///     analysis_timeout_secs = 30
///
///     [apply]
///     max_concurrent_documents = 2
/// "#).unwrap();
///
/// assert_eq!(config.analyzer.analysis_timeout_secs, 30);
/// assert_eq!(config.apply.max_concurrent_documents, 2);
/// assert_eq!(config.validation.min_overall, 0.30);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RevisorConfig {
    /// Content analysis
    pub analyzer: AnalyzerConfig,

    /// Proposal validation
    pub validation: ValidationConfig,

    /// Writing approved changes
    pub apply: ApplyConfig,

    /// Upload acceptance
    pub upload: UploadPolicy,
}

impl RevisorConfig {
    /// Parse and validate a TOML document
    pub fn from_toml(toml_str: &str) -> Result<Self, SessionError> {
        let config: Self = toml::from_str(toml_str)
            .map_err(|e| SessionError::Config(format!("Failed to parse TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SessionError> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Serialize to TOML
    pub fn to_toml(&self) -> Result<String, SessionError> {
        toml::to_string_pretty(self)
            .map_err(|e| SessionError::Config(format!("Failed to serialize to TOML: {}", e)))
    }

    /// Validate every section
    pub fn validate(&self) -> Result<(), SessionError> {
        self.analyzer
            .validate()
            .map_err(|e| SessionError::Config(format!("[analyzer] {}", e)))?;
        self.validation
            .validate()
            .map_err(|e| SessionError::Config(format!("[validation] {}", e)))?;
        self.apply
            .validate()
            .map_err(|e| SessionError::Config(format!("[apply] {}", e)))?;
        self.upload
            .validate()
            .map_err(|e| SessionError::Config(format!("[upload] {}", e)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upload::FileKind;

    #[test]
    fn test_default_is_valid() {
        let config = RevisorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.analyzer.analysis_timeout_secs, 120);
        assert_eq!(config.apply.major_change_threshold, 0.50);
    }

    #[test]
    fn test_empty_toml_gives_defaults() {
        let config = RevisorConfig::from_toml("").unwrap();
        assert_eq!(config.upload.max_size_bytes, UploadPolicy::default().max_size_bytes);
    }

    #[test]
    fn test_roundtrip() {
        let mut config = RevisorConfig::default();
        config.upload.allowed_kinds = vec![FileKind::Markdown];
        let text = config.to_toml().unwrap();
        let parsed = RevisorConfig::from_toml(&text).unwrap();
        assert_eq!(parsed.upload.allowed_kinds, vec![FileKind::Markdown]);
    }

    #[test]
    fn test_invalid_section_named() {
        let err = RevisorConfig::from_toml("[validation]\nmin_overall = 0.1").unwrap_err();
        assert!(err.to_string().contains("[validation]"));

        let err = RevisorConfig::from_toml("[apply]\nmax_concurrent_documents = 0").unwrap_err();
        assert!(err.to_string().contains("[apply]"));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("revisor.toml");
        fs::write(&path, "[upload]\nmax_size_bytes = 2048\n").unwrap();

        let config = RevisorConfig::from_file(&path).unwrap();
        assert_eq!(config.upload.max_size_bytes, 2048);

        let missing = RevisorConfig::from_file(dir.path().join("nope.toml"));
        assert!(matches!(missing, Err(SessionError::Io(_))));
    }
}
