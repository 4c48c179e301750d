//! Analysis results - the sole input to the review stage

use crate::change::ProposedChange;
use crate::confidence::{HIGH_CONFIDENCE, STANDARD_PROPOSAL};

/// Subject of the uploaded document as understood by the analysis
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PrimarySubject {
    /// Broad domain (e.g. "product launch")
    pub domain: String,
    /// Narrow area inside the domain
    pub specific_area: String,
    /// Stated scope of the document
    pub scope: String,
}

/// A fact stated explicitly in the uploaded document
#[derive(Debug, Clone, PartialEq)]
pub struct ExplicitFact {
    /// The fact, restated
    pub statement: String,
    /// Confidence in `[0, 1]`
    pub confidence: f64,
    /// Where the fact appears
    pub source_location: String,
    /// Verbatim quote (never empty once admitted)
    pub verbatim_quote: String,
}

/// Structured understanding of the uploaded document
///
/// Produced once per analysis run; immutable afterwards.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ContentAnalysis {
    /// Primary subject
    pub primary_subject: PrimarySubject,
    /// Explicit facts backed by quotes
    pub explicit_facts: Vec<ExplicitFact>,
    /// Topics the document explicitly does not cover
    pub out_of_scope: Vec<String>,
    /// Boundaries the document states for itself
    pub stated_boundaries: Vec<String>,
}

/// The uploaded document as seen by the analysis
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UploadedDocument {
    /// Original file name
    pub file_name: String,
    /// Extracted plain text
    pub text: String,
}

/// Changes grouped under one target document
///
/// Derived from the flat change list; never stored on its own.
#[derive(Debug, Clone, PartialEq)]
pub struct AffectedDocument {
    /// Target document
    pub document_id: String,
    /// Target document title
    pub document_title: String,
    /// Number of changes in this group
    pub total_changes: usize,
    /// Mean overall confidence of the changes
    pub overall_confidence: f64,
    /// The changes, in analyzer order
    pub changes: Vec<ProposedChange>,
}

impl AffectedDocument {
    /// Group a flat change list by document, keeping first-seen document order
    pub fn group(changes: &[ProposedChange]) -> Vec<AffectedDocument> {
        let mut groups: Vec<AffectedDocument> = Vec::new();

        for change in changes {
            match groups.iter_mut().find(|g| g.document_id == change.document_id) {
                Some(group) => group.changes.push(change.clone()),
                None => groups.push(AffectedDocument {
                    document_id: change.document_id.clone(),
                    document_title: change.document_title.clone(),
                    total_changes: 0,
                    overall_confidence: 0.0,
                    changes: vec![change.clone()],
                }),
            }
        }

        for group in &mut groups {
            group.total_changes = group.changes.len();
            let sum: f64 = group.changes.iter().map(|c| c.overall()).sum();
            group.overall_confidence = sum / group.total_changes as f64;
        }
        groups
    }
}

/// Counts over an analysis result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AnalysisSummary {
    /// Documents with at least one change
    pub total_documents: usize,
    /// Changes across all documents
    pub total_changes: usize,
    /// Changes scoring at or above 0.70
    pub high_confidence_changes: usize,
    /// Changes scoring below 0.50 (flagged)
    pub low_confidence_changes: usize,
}

/// Output of one analysis run
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    /// The uploaded document
    pub uploaded_document: UploadedDocument,
    /// Changes grouped per document
    pub affected_documents: Vec<AffectedDocument>,
    /// Counts
    pub summary: AnalysisSummary,
    /// Structured understanding of the upload
    pub content_analysis: ContentAnalysis,
}

impl AnalysisResult {
    /// Build a result from admitted changes, deriving grouping and counts
    pub fn new(
        uploaded_document: UploadedDocument,
        content_analysis: ContentAnalysis,
        changes: &[ProposedChange],
    ) -> Self {
        let affected_documents = AffectedDocument::group(changes);
        let summary = AnalysisSummary {
            total_documents: affected_documents.len(),
            total_changes: changes.len(),
            high_confidence_changes: changes
                .iter()
                .filter(|c| c.overall() >= HIGH_CONFIDENCE)
                .count(),
            low_confidence_changes: changes
                .iter()
                .filter(|c| c.overall() < STANDARD_PROPOSAL)
                .count(),
        };

        Self {
            uploaded_document,
            affected_documents,
            summary,
            content_analysis,
        }
    }

    /// Flatten the grouped changes back into analyzer order
    pub fn changes(&self) -> Vec<ProposedChange> {
        self.affected_documents
            .iter()
            .flat_map(|d| d.changes.iter().cloned())
            .collect()
    }

    /// Whether the analysis found nothing to propose
    pub fn is_empty(&self) -> bool {
        self.summary.total_changes == 0
    }
}
