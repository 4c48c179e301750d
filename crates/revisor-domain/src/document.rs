//! Managed documents as seen through the document store

use crate::version::{DocumentVersion, VersionEntry};

/// A persisted document with its version history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredDocument {
    /// Store identifier
    pub id: String,
    /// Project/workspace the document belongs to
    pub project_id: String,
    /// Title
    pub title: String,
    /// Current content
    pub content: String,
    /// Current version
    pub version: DocumentVersion,
    /// Prior versions, oldest first
    pub version_history: Vec<VersionEntry>,
}

impl StoredDocument {
    /// Index entry used as analysis context
    pub fn as_candidate(&self) -> CandidateDocument {
        CandidateDocument {
            id: self.id.clone(),
            title: self.title.clone(),
            content: self.content.clone(),
        }
    }
}

/// Index entry handed to the analysis: id, title and content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateDocument {
    /// Store identifier
    pub id: String,
    /// Title
    pub title: String,
    /// Current content
    pub content: String,
}

/// Replacement state written by an optimistic update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentUpdate {
    /// New content
    pub content: String,
    /// New version
    pub version: DocumentVersion,
    /// Full history including the entry for the replaced content
    pub version_history: Vec<VersionEntry>,
}

/// A document to create
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDocument {
    /// Project/workspace to file it under
    pub project_id: String,
    /// Title
    pub title: String,
    /// Content
    pub content: String,
}
