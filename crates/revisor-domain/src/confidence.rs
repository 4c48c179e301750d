//! Confidence scoring for proposed changes
//!
//! Combines four normalized sub-scores into one weighted overall score and
//! classifies it against fixed thresholds:
//!
//! ```text
//! overall = 0.30·subject_match + 0.30·factual_alignment
//!         + 0.25·scope_containment + 0.15·change_minimality
//! ```
//!
//! | Band | Range | Effect |
//! |------|-------|--------|
//! | Do not propose | `< 0.30` | Discarded by the analyzer |
//! | Flagged for review | `[0.30, 0.50)` | Shown flagged, skipped by bulk approve |
//! | Standard | `[0.50, 0.70)` | Shown normally |
//! | High confidence | `[0.70, 0.90)` | Shown normally |
//! | Auto-approve eligible | `>= 0.90` | One-click bulk approval (never auto-applied) |

use crate::diff::{changed_chars, diff};

/// Weight applied to `subject_match`
pub const SUBJECT_EXACT_MATCH: f64 = 0.30;

/// Weight applied to `factual_alignment`
pub const EVIDENCE_DIRECTNESS: f64 = 0.30;

/// Weight applied to `scope_containment`
pub const SCOPE_CONTAINMENT: f64 = 0.25;

/// Weight applied to `change_minimality`
pub const CHANGE_MINIMALITY: f64 = 0.15;

/// Scores below this are never proposed
pub const DO_NOT_PROPOSE: f64 = 0.30;

/// Scores below this (and at or above [`DO_NOT_PROPOSE`]) are flagged for review
pub const STANDARD_PROPOSAL: f64 = 0.50;

/// Scores at or above this count as high confidence
pub const HIGH_CONFIDENCE: f64 = 0.70;

/// Scores at or above this are eligible for one-click bulk approval
pub const AUTO_APPROVE_ELIGIBLE: f64 = 0.90;

/// Check that the four weights sum to 1.0
///
/// Called when the analyzer and the session controller are constructed.
pub fn verify_weights() -> Result<(), String> {
    let sum = SUBJECT_EXACT_MATCH + EVIDENCE_DIRECTNESS + SCOPE_CONTAINMENT + CHANGE_MINIMALITY;
    if (sum - 1.0).abs() > 1e-9 {
        return Err(format!("confidence weights sum to {}, expected 1.0", sum));
    }
    Ok(())
}

/// Classification of an overall score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConfidenceLevel {
    /// Below 0.30
    DoNotPropose,
    /// 0.30 to 0.50
    FlaggedForReview,
    /// 0.50 to 0.70
    Standard,
    /// 0.70 to 0.90
    HighConfidence,
    /// 0.90 and above
    AutoApproveEligible,
}

impl ConfidenceLevel {
    /// Classify an overall score
    pub fn classify(overall: f64) -> Self {
        if overall >= AUTO_APPROVE_ELIGIBLE {
            ConfidenceLevel::AutoApproveEligible
        } else if overall >= HIGH_CONFIDENCE {
            ConfidenceLevel::HighConfidence
        } else if overall >= STANDARD_PROPOSAL {
            ConfidenceLevel::Standard
        } else if overall >= DO_NOT_PROPOSE {
            ConfidenceLevel::FlaggedForReview
        } else {
            ConfidenceLevel::DoNotPropose
        }
    }

    /// Short label for display
    pub fn label(&self) -> &'static str {
        match self {
            ConfidenceLevel::DoNotPropose => "do not propose",
            ConfidenceLevel::FlaggedForReview => "flagged",
            ConfidenceLevel::Standard => "standard",
            ConfidenceLevel::HighConfidence => "high",
            ConfidenceLevel::AutoApproveEligible => "auto-approve eligible",
        }
    }
}

/// Four sub-scores in `[0, 1]` and their weighted combination
///
/// Fields are private so that `overall` can only ever be the weighted sum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceBreakdown {
    subject_match: f64,
    factual_alignment: f64,
    scope_containment: f64,
    change_minimality: f64,
    overall: f64,
}

impl ConfidenceBreakdown {
    /// Score a change from its four sub-scores
    ///
    /// Inputs are clamped to `[0, 1]`; non-finite inputs count as 0.
    ///
    /// # Examples
    ///
    /// ```
    /// use revisor_domain::ConfidenceBreakdown;
    ///
    /// let c = ConfidenceBreakdown::score(1.0, 1.0, 1.0, 1.0);
    /// assert!((c.overall() - 1.0).abs() < 1e-9);
    /// ```
    pub fn score(
        subject_match: f64,
        factual_alignment: f64,
        scope_containment: f64,
        change_minimality: f64,
    ) -> Self {
        let subject_match = normalize(subject_match);
        let factual_alignment = normalize(factual_alignment);
        let scope_containment = normalize(scope_containment);
        let change_minimality = normalize(change_minimality);

        let overall = SUBJECT_EXACT_MATCH * subject_match
            + EVIDENCE_DIRECTNESS * factual_alignment
            + SCOPE_CONTAINMENT * scope_containment
            + CHANGE_MINIMALITY * change_minimality;

        Self {
            subject_match,
            factual_alignment,
            scope_containment,
            change_minimality,
            overall: overall.clamp(0.0, 1.0),
        }
    }

    /// How directly the target text covers the uploaded document's subject
    pub fn subject_match(&self) -> f64 {
        self.subject_match
    }

    /// How directly the evidence quote supports the change
    pub fn factual_alignment(&self) -> f64 {
        self.factual_alignment
    }

    /// How well the change stays within the stated scope
    pub fn scope_containment(&self) -> f64 {
        self.scope_containment
    }

    /// How small the change is relative to its document
    pub fn change_minimality(&self) -> f64 {
        self.change_minimality
    }

    /// Weighted overall score
    pub fn overall(&self) -> f64 {
        self.overall
    }

    /// Classification of the overall score
    pub fn level(&self) -> ConfidenceLevel {
        ConfidenceLevel::classify(self.overall)
    }
}

fn normalize(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Minimality signal for replacing `original` with `proposed` in a document
/// of `document_len` characters
///
/// `1.0` means nothing changes; `0.0` means the change touches at least as many
/// characters as the document holds.
pub fn change_minimality(original: &str, proposed: &str, document_len: usize) -> f64 {
    let changed = changed_chars(&diff(original, proposed));
    if changed == 0 {
        return 1.0;
    }
    if document_len == 0 {
        return 0.0;
    }
    (1.0 - changed as f64 / document_len as f64).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weights_sum_to_one() {
        assert!(verify_weights().is_ok());
    }

    #[test]
    fn test_weighted_sum() {
        let c = ConfidenceBreakdown::score(1.0, 0.5, 0.0, 1.0);
        let expected = 0.30 + 0.15 + 0.0 + 0.15;
        assert!((c.overall() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_inputs_clamped() {
        let c = ConfidenceBreakdown::score(2.0, -1.0, f64::NAN, 0.5);
        assert_eq!(c.subject_match(), 1.0);
        assert_eq!(c.factual_alignment(), 0.0);
        assert_eq!(c.scope_containment(), 0.0);
        assert!((c.overall() - (0.30 + 0.075)).abs() < 1e-9);
    }

    #[test]
    fn test_classification_boundaries() {
        assert_eq!(ConfidenceLevel::classify(0.29), ConfidenceLevel::DoNotPropose);
        assert_eq!(ConfidenceLevel::classify(0.30), ConfidenceLevel::FlaggedForReview);
        assert_eq!(ConfidenceLevel::classify(0.49), ConfidenceLevel::FlaggedForReview);
        assert_eq!(ConfidenceLevel::classify(0.50), ConfidenceLevel::Standard);
        assert_eq!(ConfidenceLevel::classify(0.70), ConfidenceLevel::HighConfidence);
        assert_eq!(ConfidenceLevel::classify(0.89), ConfidenceLevel::HighConfidence);
        assert_eq!(ConfidenceLevel::classify(0.90), ConfidenceLevel::AutoApproveEligible);
    }

    #[test]
    fn test_minimality_small_edit_in_large_document() {
        let m = change_minimality("February 15", "March 1", 200);
        assert!(m > 0.9, "got {}", m);
    }

    #[test]
    fn test_minimality_identical_text() {
        assert_eq!(change_minimality("same", "same", 0), 1.0);
    }

    #[test]
    fn test_minimality_whole_document_rewrite() {
        assert_eq!(change_minimality("short", "entirely different words", 5), 0.0);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: raising any single sub-score never lowers the overall score
        #[test]
        fn test_overall_monotonic(
            base in prop::array::uniform4(0.0f64..=1.0),
            which in 0usize..4,
            bump in 0.0f64..=1.0,
        ) {
            let before = ConfidenceBreakdown::score(base[0], base[1], base[2], base[3]);
            let mut raised = base;
            raised[which] = (raised[which] + bump).min(1.0);
            let after = ConfidenceBreakdown::score(raised[0], raised[1], raised[2], raised[3]);
            prop_assert!(after.overall() >= before.overall());
        }

        /// Property: overall stays in [0, 1]
        #[test]
        fn test_overall_in_range(s in -1.0f64..2.0, f in -1.0f64..2.0, c in -1.0f64..2.0, m in -1.0f64..2.0) {
            let overall = ConfidenceBreakdown::score(s, f, c, m).overall();
            prop_assert!((0.0..=1.0).contains(&overall));
        }
    }
}
