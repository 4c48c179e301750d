//! Proposed change module - the unit of review

use crate::confidence::{ConfidenceBreakdown, ConfidenceLevel};
use std::fmt;

/// Unique identifier for a proposed change, based on UUIDv7
///
/// UUIDv7 keeps ids sortable by creation time, so the order in which the
/// analyzer produced changes survives any re-sorting by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChangeId(u128);

impl ChangeId {
    /// Generate a new UUIDv7-based ChangeId
    ///
    /// # Examples
    ///
    /// ```
    /// use revisor_domain::ChangeId;
    ///
    /// let id = ChangeId::new();
    /// assert!(id.value() > 0);
    /// ```
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().as_u128())
    }

    /// Create a ChangeId from a raw u128 value
    pub fn from_value(value: u128) -> Self {
        Self(value)
    }

    /// Parse a ChangeId from its hyphenated string form
    ///
    /// # Examples
    ///
    /// ```
    /// use revisor_domain::ChangeId;
    ///
    /// let id = ChangeId::new();
    /// let parsed = ChangeId::from_string(&id.to_string()).unwrap();
    /// assert_eq!(id, parsed);
    /// ```
    pub fn from_string(s: &str) -> Result<Self, String> {
        uuid::Uuid::parse_str(s)
            .map(|u| Self(u.as_u128()))
            .map_err(|e| format!("Invalid change id: {}", e))
    }

    /// Get the raw u128 value
    pub fn value(&self) -> u128 {
        self.0
    }
}

impl Default for ChangeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ChangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", uuid::Uuid::from_u128(self.0))
    }
}

/// Review status of a proposed change
///
/// ```text
/// pending → approved ⇄ rejected
///              ↓
///           applied (terminal)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeStatus {
    /// Awaiting a reviewer decision
    Pending,
    /// Accepted by the reviewer, eligible for apply
    Approved,
    /// Declined by the reviewer
    Rejected,
    /// Written back into the document (terminal)
    Applied,
}

impl ChangeStatus {
    /// Get the status name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeStatus::Pending => "pending",
            ChangeStatus::Approved => "approved",
            ChangeStatus::Rejected => "rejected",
            ChangeStatus::Applied => "applied",
        }
    }

    /// Whether the reviewer can still act on a change in this status
    pub fn is_reviewable(&self) -> bool {
        !matches!(self, ChangeStatus::Applied)
    }
}

impl fmt::Display for ChangeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why the analysis service linked the uploaded document to the target text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchReason {
    /// The target text covers exactly the subject of the uploaded document
    ExactSubjectMatch,
    /// The target text covers a closely related topic
    RelatedTopic,
    /// The target text may be affected indirectly
    PossiblyAffected,
}

impl MatchReason {
    /// Get the wire name of the reason
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchReason::ExactSubjectMatch => "exact_subject_match",
            MatchReason::RelatedTopic => "related_topic",
            MatchReason::PossiblyAffected => "possibly_affected",
        }
    }

    /// Parse a reason from its wire name
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "exact_subject_match" => Some(MatchReason::ExactSubjectMatch),
            "related_topic" => Some(MatchReason::RelatedTopic),
            "possibly_affected" => Some(MatchReason::PossiblyAffected),
            _ => None,
        }
    }
}

impl fmt::Display for MatchReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Evidence from the uploaded document backing a change
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvidence {
    /// Verbatim quote from the uploaded document (never empty once admitted)
    pub source_quote: String,

    /// Where in the uploaded document the quote was found
    pub source_location: String,

    /// How the target text relates to the uploaded document
    pub match_reason: MatchReason,

    /// Scored confidence for this change
    pub confidence: ConfidenceBreakdown,
}

/// Record of whether a change stays inside the uploaded document's boundaries
///
/// Display and validation only; nothing mutates a change based on these flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScopeJustification {
    /// Change concerns the primary subject
    pub within_primary_subject: bool,
    /// Change concerns the specific area
    pub within_specific_area: bool,
    /// Change stays inside the stated scope
    pub within_stated_scope: bool,
    /// Change reaches across a feature boundary
    pub crosses_feature_boundary: bool,
    /// Reviewer should confirm before approving
    pub requires_user_confirmation: bool,
}

impl ScopeJustification {
    /// Whether any flag suggests the change reaches outside the stated scope
    pub fn is_out_of_bounds(&self) -> bool {
        !self.within_primary_subject
            || !self.within_stated_scope
            || self.crosses_feature_boundary
    }
}

/// What the analysis proposes for one document, before review
///
/// `start_index..end_index` is a byte range into the target document's
/// content at analysis time.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeProposal {
    /// Target document
    pub document_id: String,

    /// Target document title
    pub document_title: String,

    /// Section containing the target text
    pub section_name: String,

    /// Page number, when the target document is paginated
    pub page_number: Option<u32>,

    /// Text currently in the document
    pub original_text: String,

    /// Text the analysis proposes instead
    pub proposed_text: String,

    /// Byte offset where `original_text` starts
    pub start_index: usize,

    /// Byte offset one past the end of `original_text`
    pub end_index: usize,

    /// Evidence and confidence
    pub evidence: ChangeEvidence,

    /// Scope flags
    pub scope_justification: ScopeJustification,

    /// Things the analysis asserts are NOT affected by this change
    pub non_impact: Vec<String>,
}

/// One candidate text substitution in one managed document
///
/// Starts at [`ChangeStatus::Pending`]. The status only moves through
/// [`ReviewBoard`](crate::ReviewBoard), which enforces the legal transitions.
#[derive(Debug, Clone, PartialEq)]
pub struct ProposedChange {
    /// Unique identifier within the session
    pub id: ChangeId,

    /// Target document
    pub document_id: String,

    /// Target document title
    pub document_title: String,

    /// Section containing the target text
    pub section_name: String,

    /// Page number, when the target document is paginated
    pub page_number: Option<u32>,

    /// Text currently in the document
    pub original_text: String,

    /// Text the analysis proposes instead
    pub proposed_text: String,

    /// Byte offset where `original_text` starts
    pub start_index: usize,

    /// Byte offset one past the end of `original_text`
    pub end_index: usize,

    /// Review status
    pub(crate) status: ChangeStatus,

    /// Reviewer's replacement for `proposed_text`, if any
    pub user_edited_text: Option<String>,

    /// Evidence and confidence
    pub evidence: ChangeEvidence,

    /// Scope flags
    pub scope_justification: ScopeJustification,

    /// Things the analysis asserts are NOT affected by this change
    pub non_impact: Vec<String>,
}

impl ProposedChange {
    /// Enter a proposal into review as a pending change with a fresh id
    pub fn new(proposal: ChangeProposal) -> Self {
        Self {
            id: ChangeId::new(),
            document_id: proposal.document_id,
            document_title: proposal.document_title,
            section_name: proposal.section_name,
            page_number: proposal.page_number,
            original_text: proposal.original_text,
            proposed_text: proposal.proposed_text,
            start_index: proposal.start_index,
            end_index: proposal.end_index,
            status: ChangeStatus::Pending,
            user_edited_text: None,
            evidence: proposal.evidence,
            scope_justification: proposal.scope_justification,
            non_impact: proposal.non_impact,
        }
    }

    /// Review status
    pub fn status(&self) -> ChangeStatus {
        self.status
    }

    /// The text that will be written on apply
    pub fn replacement_text(&self) -> &str {
        self.user_edited_text
            .as_deref()
            .unwrap_or(&self.proposed_text)
    }

    /// Overall confidence score
    pub fn overall(&self) -> f64 {
        self.evidence.confidence.overall()
    }

    /// Confidence classification of this change
    pub fn level(&self) -> ConfidenceLevel {
        self.evidence.confidence.level()
    }

    /// Whether the change should be visually flagged and skipped by bulk approval
    pub fn is_flagged(&self) -> bool {
        self.level() == ConfidenceLevel::FlaggedForReview
    }
}
