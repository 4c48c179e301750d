//! Error types for the Analyzer

use thiserror::Error;

/// Errors that end an analysis run
///
/// Every variant is fatal for the run: no partial change list is produced.
#[derive(Error, Debug)]
pub enum AnalyzerError {
    /// Analysis service error
    #[error("Analysis service error: {0}")]
    Llm(String),

    /// Uploaded text exceeds maximum length
    #[error("Text too long: {0} chars (max: {1})")]
    TextTooLong(usize, usize),

    /// Analysis timeout
    #[error("Analysis timed out after {0}s")]
    Timeout(u64),

    /// Response does not have the expected structure
    #[error("Invalid analysis format: {0}")]
    InvalidFormat(String),

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    JsonParse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for AnalyzerError {
    fn from(e: serde_json::Error) -> Self {
        AnalyzerError::JsonParse(e.to_string())
    }
}
