//! Configuration for the Analyzer

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the Analyzer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Maximum uploaded text length (bytes)
    pub max_text_length: usize,

    /// Maximum candidate documents sent as context
    pub max_candidate_documents: usize,

    /// Each candidate's content is cut to this many characters in the prompt
    pub max_document_chars: usize,

    /// Maximum time for the analysis call (seconds)
    pub analysis_timeout_secs: u64,
}

impl AnalyzerConfig {
    /// Get the analysis timeout as a Duration
    pub fn analysis_timeout(&self) -> Duration {
        Duration::from_secs(self.analysis_timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_text_length == 0 {
            return Err("max_text_length must be greater than 0".to_string());
        }
        if self.max_candidate_documents == 0 {
            return Err("max_candidate_documents must be greater than 0".to_string());
        }
        if self.max_document_chars == 0 {
            return Err("max_document_chars must be greater than 0".to_string());
        }
        if self.analysis_timeout_secs == 0 {
            return Err("analysis_timeout_secs must be greater than 0".to_string());
        }
        Ok(())
    }
}

impl Default for AnalyzerConfig {
    /// Default configuration with balanced settings
    fn default() -> Self {
        Self {
            max_text_length: 200_000,
            max_candidate_documents: 50,
            max_document_chars: 20_000,
            analysis_timeout_secs: 120,
        }
    }
}

impl AnalyzerConfig {
    /// Fast preset: fewer candidates and a shorter timeout
    pub fn fast() -> Self {
        Self {
            max_text_length: 50_000,
            max_candidate_documents: 10,
            max_document_chars: 5_000,
            analysis_timeout_secs: 60,
        }
    }

    /// Thorough preset: more context and a longer timeout for slow local models
    pub fn thorough() -> Self {
        Self {
            max_text_length: 500_000,
            max_candidate_documents: 200,
            max_document_chars: 50_000,
            analysis_timeout_secs: 600,
        }
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
