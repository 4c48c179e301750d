//! Request and report types for analysis

use revisor_domain::{AnalysisResult, CandidateDocument, UploadedDocument};

/// Request to analyze an uploaded document against existing documents
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    /// The uploaded document, already extracted to text
    pub uploaded: UploadedDocument,

    /// Index of existing documents in the same project
    pub candidates: Vec<CandidateDocument>,
}

/// Output of one analysis run
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    /// Admitted changes, grouped for review
    pub result: AnalysisResult,

    /// Proposals that were dropped before review
    pub rejected: Vec<RejectedProposal>,

    /// Metadata about the run
    pub metadata: AnalysisMetadata,
}

impl AnalysisReport {
    /// Whether no change qualified for review
    pub fn is_empty(&self) -> bool {
        self.result.is_empty()
    }
}

/// A proposal that never reached review
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedProposal {
    /// Target document named by the proposal (may be unknown)
    pub document_id: String,

    /// Text the proposal wanted to replace
    pub original_text: String,

    /// Why it was dropped
    pub reasons: Vec<String>,
}

/// Metadata about an analysis run
#[derive(Debug, Clone)]
pub struct AnalysisMetadata {
    /// Unix seconds when the run finished
    pub timestamp: u64,

    /// Name of the model used
    pub model_name: String,

    /// Candidate documents sent as context
    pub candidates_considered: usize,

    /// Proposals present in the response
    pub proposals_received: usize,

    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}
