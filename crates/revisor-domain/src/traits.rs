//! Trait definitions for external collaborators
//!
//! These traits define the boundaries between the revision pipeline and the
//! host application. Implementations live in other crates.

use crate::document::{CandidateDocument, DocumentUpdate, NewDocument, StoredDocument};
use crate::version::DocumentVersion;

/// Result of an optimistic document update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The update was written
    Updated,
    /// The stored version did not match the expected version; nothing was written
    VersionConflict {
        /// Version currently in the store
        current: DocumentVersion,
    },
}

/// Trait for persisting managed documents with a linear version history
///
/// Implemented by the infrastructure layer (revisor-store)
pub trait DocumentStore {
    /// Error type for store operations
    type Error;

    /// Get a document with its history
    fn get_document(&self, id: &str) -> Result<Option<StoredDocument>, Self::Error>;

    /// Replace a document's state if its version still equals `expected`
    fn update_document(
        &mut self,
        id: &str,
        expected: DocumentVersion,
        update: DocumentUpdate,
    ) -> Result<UpdateOutcome, Self::Error>;

    /// Index of documents in a project, used as analysis context
    fn list_documents(&self, project_id: &str) -> Result<Vec<CandidateDocument>, Self::Error>;

    /// Create a document at version `1.0`, returning its id
    fn create_document(&mut self, document: NewDocument) -> Result<String, Self::Error>;
}

/// Trait for the content-analysis service (an LLM or equivalent)
///
/// Implemented by the infrastructure layer (revisor-llm)
pub trait LlmProvider {
    /// Error type for LLM operations
    type Error;

    /// Generate text completion
    fn generate(&self, prompt: &str) -> Result<String, Self::Error>;

    /// Generate output constrained by a JSON schema (if supported)
    fn generate_structured(&self, prompt: &str, schema: &str) -> Result<String, Self::Error>;
}

/// Trait for turning an uploaded file into plain text
///
/// Implemented by the session layer for text formats; hosts plug in richer
/// extractors (PDF) through the same seam.
pub trait ContentExtractor {
    /// Error type for extraction
    type Error;

    /// Extract plain text from a file's bytes
    fn extract(
        &self,
        file_name: &str,
        media_type: Option<&str>,
        bytes: &[u8],
    ) -> Result<String, Self::Error>;
}
