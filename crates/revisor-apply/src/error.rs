//! Error types for the Apply Engine

use thiserror::Error;

/// Errors that prevent the engine from running at all
///
/// Failures of individual changes or documents are reported in the
/// `ApplyReport`, never as an `ApplyError`.
#[derive(Error, Debug)]
pub enum ApplyError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
