//! Proposed change validation logic

use crate::ValidationConfig;
use revisor_domain::{CandidateDocument, ConfidenceLevel, ExplicitFact, ProposedChange};
use std::fmt;

/// Result of change validation
#[derive(Debug, Clone)]
pub struct ValidationResult {
    /// Whether the change passed validation
    pub status: ValidationStatus,

    /// Rejection reasons (if any)
    pub reasons: Vec<RejectionReason>,

    /// Confidence classification of the change
    pub level: ConfidenceLevel,
}

/// Validation status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationStatus {
    /// Change admitted to review
    Accepted,

    /// Change dropped
    Rejected,
}

/// Reasons for rejection
#[derive(Debug, Clone, PartialEq)]
pub enum RejectionReason {
    /// The named target document is not in the candidate index
    UnknownDocument(String),

    /// The evidence quote is empty
    MissingSourceQuote,

    /// The evidence quote does not appear in the uploaded text
    QuoteNotInUpload(String),

    /// The change has no original text to replace
    EmptyOriginalText,

    /// The original text does not appear in the target document
    OriginalTextNotFound {
        /// Target document
        document_id: String,
    },

    /// The original text appears more than once and no valid position was given
    AmbiguousOriginalText {
        /// Target document
        document_id: String,
        /// Number of occurrences
        occurrences: usize,
    },

    /// The recorded range does not hold the original text
    RangeMismatch {
        /// Recorded start
        start: usize,
        /// Recorded end
        end: usize,
    },

    /// The replacement equals the original text
    NoOpChange,

    /// The overall score is below the configured minimum
    BelowThreshold {
        /// Overall score
        overall: f64,
        /// Minimum required
        minimum: f64,
    },
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectionReason::UnknownDocument(id) => write!(f, "unknown target document '{}'", id),
            RejectionReason::MissingSourceQuote => write!(f, "evidence quote is empty"),
            RejectionReason::QuoteNotInUpload(quote) => {
                write!(f, "evidence quote not found in uploaded document: \"{}\"", quote)
            }
            RejectionReason::EmptyOriginalText => write!(f, "original text is empty"),
            RejectionReason::OriginalTextNotFound { document_id } => {
                write!(f, "original text not found verbatim in document '{}'", document_id)
            }
            RejectionReason::AmbiguousOriginalText { document_id, occurrences } => write!(
                f,
                "original text occurs {} times in document '{}'",
                occurrences, document_id
            ),
            RejectionReason::RangeMismatch { start, end } => {
                write!(f, "range {}..{} does not hold the original text", start, end)
            }
            RejectionReason::NoOpChange => write!(f, "proposed text equals original text"),
            RejectionReason::BelowThreshold { overall, minimum } => {
                write!(f, "confidence {:.2} below minimum {:.2}", overall, minimum)
            }
        }
    }
}

/// Find the byte range of `needle` in `content`
///
/// A `hint` pointing at a verbatim occurrence wins. Otherwise the text must
/// occur exactly once; several occurrences are ambiguous and rejected.
pub fn locate(content: &str, needle: &str, hint: Option<usize>) -> Result<(usize, usize), LocateError> {
    if needle.is_empty() {
        return Err(LocateError::Empty);
    }

    if let Some(start) = hint {
        // An out-of-range hint falls through to the occurrence search
        if let Some(end) = start.checked_add(needle.len()) {
            if content.get(start..end) == Some(needle) {
                return Ok((start, end));
            }
        }
    }

    let mut matches = content.match_indices(needle);
    match (matches.next(), matches.next()) {
        (Some((start, _)), None) => Ok((start, start + needle.len())),
        (None, _) => Err(LocateError::NotFound),
        (Some(_), Some(_)) => Err(LocateError::Ambiguous(2 + matches.count())),
    }
}

/// Why [`locate`] failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocateError {
    /// Nothing to look for
    Empty,
    /// No occurrence
    NotFound,
    /// This many occurrences
    Ambiguous(usize),
}

impl LocateError {
    /// Convert into a rejection reason for `document_id`
    pub fn into_reason(self, document_id: &str) -> RejectionReason {
        match self {
            LocateError::Empty => RejectionReason::EmptyOriginalText,
            LocateError::NotFound => RejectionReason::OriginalTextNotFound {
                document_id: document_id.to_string(),
            },
            LocateError::Ambiguous(occurrences) => RejectionReason::AmbiguousOriginalText {
                document_id: document_id.to_string(),
                occurrences,
            },
        }
    }
}

/// Collapse whitespace runs to single spaces and trim
fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// The Gatekeeper validates proposed changes before review
pub struct Gatekeeper {
    config: ValidationConfig,
}

impl Gatekeeper {
    /// Create a new Gatekeeper with the given configuration
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Create a Gatekeeper with default configuration
    pub fn default_config() -> Self {
        Self::new(ValidationConfig::default())
    }

    /// Active configuration
    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Validate a change against its target document and the uploaded text
    ///
    /// # Arguments
    ///
    /// * `change` - The change to validate, with its range already located
    /// * `target` - The target document from the candidate index, if known
    /// * `uploaded_text` - Extracted text of the uploaded document
    pub fn validate(
        &self,
        change: &ProposedChange,
        target: Option<&CandidateDocument>,
        uploaded_text: &str,
    ) -> ValidationResult {
        let mut reasons = Vec::new();

        // 1. Evidence grounding
        if let Some(reason) = self.check_evidence(&change.evidence.source_quote, uploaded_text) {
            reasons.push(reason);
        }

        // 2. Target text grounding
        match target {
            None => reasons.push(RejectionReason::UnknownDocument(change.document_id.clone())),
            Some(doc) => {
                if change.original_text.is_empty() {
                    reasons.push(RejectionReason::EmptyOriginalText);
                } else if doc.content.get(change.start_index..change.end_index)
                    != Some(change.original_text.as_str())
                {
                    reasons.push(RejectionReason::RangeMismatch {
                        start: change.start_index,
                        end: change.end_index,
                    });
                }
            }
        }

        // 3. No-op substitutions
        if self.config.reject_noop_changes && change.original_text == change.proposed_text {
            reasons.push(RejectionReason::NoOpChange);
        }

        // 4. Confidence threshold
        let overall = change.overall();
        if overall < self.config.min_overall {
            reasons.push(RejectionReason::BelowThreshold {
                overall,
                minimum: self.config.min_overall,
            });
        }

        let status = if reasons.is_empty() {
            ValidationStatus::Accepted
        } else {
            ValidationStatus::Rejected
        };

        ValidationResult {
            status,
            reasons,
            level: change.level(),
        }
    }

    /// Validate an explicit fact from the content analysis
    ///
    /// Facts carry a quote like changes do; an empty or ungrounded quote
    /// voids the fact.
    pub fn validate_fact(&self, fact: &ExplicitFact, uploaded_text: &str) -> Result<(), RejectionReason> {
        match self.check_evidence(&fact.verbatim_quote, uploaded_text) {
            Some(reason) => Err(reason),
            None => Ok(()),
        }
    }

    fn check_evidence(&self, quote: &str, uploaded_text: &str) -> Option<RejectionReason> {
        let quote = normalize_whitespace(quote);
        if quote.is_empty() {
            return Some(RejectionReason::MissingSourceQuote);
        }
        if self.config.verify_quote_in_upload && !normalize_whitespace(uploaded_text).contains(&quote) {
            return Some(RejectionReason::QuoteNotInUpload(quote));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use revisor_domain::{
        ChangeEvidence, ChangeProposal, ConfidenceBreakdown, MatchReason,
        ScopeJustification,
    };

    const UPLOAD: &str = "Update: the rollout will begin\nMarch 1 for all regions.";

    fn target() -> CandidateDocument {
        CandidateDocument {
            id: "launch-plan".to_string(),
            title: "Launch Plan".to_string(),
            content: "The rollout will begin February 15.".to_string(),
        }
    }

    fn create_test_change() -> ProposedChange {
        ProposedChange::new(ChangeProposal {
            document_id: "launch-plan".to_string(),
            document_title: "Launch Plan".to_string(),
            section_name: "Schedule".to_string(),
            page_number: None,
            original_text: "February 15".to_string(),
            proposed_text: "March 1".to_string(),
            start_index: 23,
            end_index: 34,
            evidence: ChangeEvidence {
                source_quote: "rollout will begin March 1".to_string(),
                source_location: "paragraph 1".to_string(),
                match_reason: MatchReason::ExactSubjectMatch,
                confidence: ConfidenceBreakdown::score(0.95, 0.95, 0.9, 0.95),
            },
            scope_justification: ScopeJustification::default(),
            non_impact: Vec::new(),
        })
    }

    #[test]
    fn test_valid_change() {
        let gatekeeper = Gatekeeper::default_config();
        let result = gatekeeper.validate(&create_test_change(), Some(&target()), UPLOAD);

        assert_eq!(result.status, ValidationStatus::Accepted, "{:?}", result.reasons);
        assert!(result.reasons.is_empty());
        assert_eq!(result.level, ConfidenceLevel::AutoApproveEligible);
    }

    #[test]
    fn test_empty_quote_rejected() {
        let gatekeeper = Gatekeeper::default_config();
        let mut change = create_test_change();
        change.evidence.source_quote = "   ".to_string();

        let result = gatekeeper.validate(&change, Some(&target()), UPLOAD);
        assert_eq!(result.status, ValidationStatus::Rejected);
        assert_eq!(result.reasons, vec![RejectionReason::MissingSourceQuote]);
    }

    #[test]
    fn test_quote_must_come_from_upload() {
        let mut change = create_test_change();
        change.evidence.source_quote = "rollout will begin April 2".to_string();

        let strict = Gatekeeper::default_config().validate(&change, Some(&target()), UPLOAD);
        assert!(matches!(strict.reasons[0], RejectionReason::QuoteNotInUpload(_)));

        let lenient = Gatekeeper::new(ValidationConfig::permissive())
            .validate(&change, Some(&target()), UPLOAD);
        assert_eq!(lenient.status, ValidationStatus::Accepted);
    }

    #[test]
    fn test_range_mismatch() {
        let gatekeeper = Gatekeeper::default_config();
        let mut change = create_test_change();
        change.start_index = 0;
        change.end_index = 11;

        let result = gatekeeper.validate(&change, Some(&target()), UPLOAD);
        assert_eq!(result.reasons, vec![RejectionReason::RangeMismatch { start: 0, end: 11 }]);
    }

    #[test]
    fn test_unknown_document() {
        let gatekeeper = Gatekeeper::default_config();
        let result = gatekeeper.validate(&create_test_change(), None, UPLOAD);
        assert_eq!(
            result.reasons,
            vec![RejectionReason::UnknownDocument("launch-plan".to_string())]
        );
    }

    #[test]
    fn test_noop_and_low_score_both_reported() {
        let gatekeeper = Gatekeeper::default_config();
        let mut change = create_test_change();
        change.proposed_text = change.original_text.clone();
        change.evidence.confidence = ConfidenceBreakdown::score(0.1, 0.1, 0.1, 1.0);

        let result = gatekeeper.validate(&change, Some(&target()), UPLOAD);
        assert_eq!(result.status, ValidationStatus::Rejected);
        assert_eq!(result.reasons.len(), 2);
        assert_eq!(result.reasons[0], RejectionReason::NoOpChange);
        assert!(matches!(result.reasons[1], RejectionReason::BelowThreshold { .. }));
        assert_eq!(result.level, ConfidenceLevel::DoNotPropose);
    }

    #[test]
    fn test_strict_rejects_flagged() {
        let mut change = create_test_change();
        change.evidence.confidence = ConfidenceBreakdown::score(0.4, 0.4, 0.4, 0.4);

        let default = Gatekeeper::default_config().validate(&change, Some(&target()), UPLOAD);
        assert_eq!(default.status, ValidationStatus::Accepted);
        assert_eq!(default.level, ConfidenceLevel::FlaggedForReview);

        let strict = Gatekeeper::new(ValidationConfig::strict()).validate(&change, Some(&target()), UPLOAD);
        assert_eq!(strict.status, ValidationStatus::Rejected);
    }

    #[test]
    fn test_fact_requires_quote() {
        let gatekeeper = Gatekeeper::default_config();
        let mut fact = ExplicitFact {
            statement: "Rollout moved".to_string(),
            confidence: 0.9,
            source_location: "paragraph 1".to_string(),
            verbatim_quote: "the rollout will begin March 1".to_string(),
        };
        assert!(gatekeeper.validate_fact(&fact, UPLOAD).is_ok());

        fact.verbatim_quote.clear();
        assert_eq!(
            gatekeeper.validate_fact(&fact, UPLOAD),
            Err(RejectionReason::MissingSourceQuote)
        );
    }

    #[test]
    fn test_locate() {
        let content = "alpha beta alpha";
        assert_eq!(locate(content, "beta", None), Ok((6, 10)));
        assert_eq!(locate(content, "gamma", None), Err(LocateError::NotFound));
        assert_eq!(locate(content, "alpha", None), Err(LocateError::Ambiguous(2)));
        assert_eq!(locate(content, "alpha", Some(11)), Ok((11, 16)));
        // A wrong hint falls back to searching
        assert_eq!(locate(content, "beta", Some(0)), Ok((6, 10)));
        assert_eq!(locate(content, "", None), Err(LocateError::Empty));
    }

    #[test]
    fn test_locate_hint_off_char_boundary() {
        // 'é' is two bytes; a hint inside it must not panic
        assert_eq!(locate("café au lait", "au", Some(4)), Ok((6, 8)));
    }

    #[test]
    fn test_locate_hint_past_usize_range() {
        assert_eq!(locate("alpha beta alpha", "beta", Some(usize::MAX)), Ok((6, 10)));
        assert_eq!(
            locate("alpha beta alpha", "alpha", Some(usize::MAX - 2)),
            Err(LocateError::Ambiguous(2))
        );
    }
}
