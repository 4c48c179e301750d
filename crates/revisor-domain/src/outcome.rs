//! Per-change apply outcomes

use crate::change::{ChangeId, ChangeStatus};
use crate::version::DocumentVersion;
use thiserror::Error;

/// Why a single change could not be applied
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApplyFailure {
    /// The recorded range no longer holds the original text, either because
    /// the document was edited elsewhere or an earlier change in the same run
    /// replaced part of it
    #[error("Stale range {start}..{end}: document no longer contains the original text there")]
    StaleRange {
        /// Recorded start
        start: usize,
        /// Recorded end
        end: usize,
    },

    /// The target document does not exist
    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    /// The document store could not be read
    #[error("Document store unavailable: {0}")]
    StoreUnavailable(String),

    /// The document changed between read and write
    #[error("Version conflict: expected {expected}, store has {current}")]
    VersionConflict {
        /// Version read before computing the update
        expected: DocumentVersion,
        /// Version found at write time
        current: DocumentVersion,
    },

    /// Writing the update failed
    #[error("Persistence failure: {0}")]
    Persistence(String),

    /// The change was not approved
    #[error("Change is {0}, only approved changes can be applied")]
    NotApproved(ChangeStatus),
}

/// Outcome of applying one change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyResult {
    /// Target document
    pub document_id: String,
    /// The change
    pub change_id: ChangeId,
    /// Whether the change was written
    pub success: bool,
    /// Cause of failure
    pub error: Option<ApplyFailure>,
    /// Version the document reached, on success
    pub new_version: Option<DocumentVersion>,
}

impl ApplyResult {
    /// Successful outcome
    pub fn applied(document_id: impl Into<String>, change_id: ChangeId, new_version: DocumentVersion) -> Self {
        Self {
            document_id: document_id.into(),
            change_id,
            success: true,
            error: None,
            new_version: Some(new_version),
        }
    }

    /// Failed outcome
    pub fn failed(document_id: impl Into<String>, change_id: ChangeId, error: ApplyFailure) -> Self {
        Self {
            document_id: document_id.into(),
            change_id,
            success: false,
            error: Some(error),
            new_version: None,
        }
    }
}
