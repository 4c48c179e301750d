//! Error types for the session workflow

use crate::extract::ExtractionError;
use crate::state::WorkflowStep;
use crate::upload::UploadError;
use revisor_analyzer::AnalyzerError;
use revisor_domain::ReviewError;
use thiserror::Error;

/// Errors that can occur while driving a session
#[derive(Error, Debug)]
pub enum SessionError {
    /// The event is not valid in the current step
    #[error("Cannot {event} while in the {step} step")]
    InvalidTransition {
        /// Step the session was in
        step: WorkflowStep,
        /// Event that was rejected
        event: &'static str,
    },

    /// Upload rejected by the upload policy
    #[error(transparent)]
    Upload(#[from] UploadError),

    /// Text could not be extracted from the upload
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    /// The analysis failed; the session is in the error step
    #[error("Analysis failed: {0}")]
    Analysis(#[from] AnalyzerError),

    /// A review action was refused
    #[error(transparent)]
    Review(#[from] ReviewError),

    /// Apply was requested with no approved changes
    #[error("No approved changes to apply")]
    NothingApproved,

    /// Document store failure outside the apply engine
    #[error("Store error: {0}")]
    Store(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
