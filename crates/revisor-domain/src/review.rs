//! Change review state machine
//!
//! Owns the flat list of proposed changes for a session and enforces the
//! per-change lifecycle:
//!
//! ```text
//! pending ──approve──▶ approved ──(apply engine)──▶ applied
//!    │                  ▲    │
//!    └──reject──▶ rejected ◀─┘
//! ```
//!
//! The set of change ids is fixed once the board is built. Review operations
//! only touch `status` and `user_edited_text`; nothing is added or removed.

use crate::analysis::{AffectedDocument, AnalysisResult};
use crate::change::{ChangeId, ChangeStatus, ProposedChange};
use crate::confidence::ConfidenceLevel;
use thiserror::Error;

/// Errors from review operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReviewError {
    /// No change with this id in the session
    #[error("Unknown change: {0}")]
    UnknownChange(ChangeId),

    /// The change was already written back and is terminal
    #[error("Change {0} is already applied")]
    AlreadyApplied(ChangeId),

    /// Only approved changes can be marked applied
    #[error("Change {id} is {status}, only approved changes can be applied")]
    NotApproved {
        /// The change
        id: ChangeId,
        /// Its current status
        status: ChangeStatus,
    },
}

/// Which pending changes a bulk approval touches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BulkFilter {
    /// Everything except flagged changes
    SkipFlagged,
    /// Every pending change
    All,
    /// Only changes eligible for one-click approval
    AutoEligible,
}

impl BulkFilter {
    fn admits(&self, change: &ProposedChange) -> bool {
        match self {
            BulkFilter::SkipFlagged => !change.is_flagged(),
            BulkFilter::All => true,
            BulkFilter::AutoEligible => change.level() == ConfidenceLevel::AutoApproveEligible,
        }
    }
}

/// The review state for one session's proposed changes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReviewBoard {
    changes: Vec<ProposedChange>,
}

impl ReviewBoard {
    /// Create a board over the given changes, in analyzer order
    pub fn new(changes: Vec<ProposedChange>) -> Self {
        Self { changes }
    }

    /// Create a board from an analysis result
    pub fn from_analysis(result: &AnalysisResult) -> Self {
        Self::new(result.changes())
    }

    /// All changes, in analyzer order
    pub fn changes(&self) -> &[ProposedChange] {
        &self.changes
    }

    /// Look up a change
    pub fn get(&self, id: ChangeId) -> Option<&ProposedChange> {
        self.changes.iter().find(|c| c.id == id)
    }

    /// Number of changes
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Whether the board holds no changes
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Number of changes currently in `status`
    pub fn count(&self, status: ChangeStatus) -> usize {
        self.changes.iter().filter(|c| c.status == status).count()
    }

    /// Changes grouped per document, recomputed from the flat list
    pub fn affected_documents(&self) -> Vec<AffectedDocument> {
        AffectedDocument::group(&self.changes)
    }

    /// Approved changes grouped per document, in first-seen document order
    /// and analyzer order within each document
    pub fn approved_by_document(&self) -> Vec<(String, Vec<ProposedChange>)> {
        let mut groups: Vec<(String, Vec<ProposedChange>)> = Vec::new();
        for change in self.changes.iter().filter(|c| c.status == ChangeStatus::Approved) {
            match groups.iter_mut().find(|(doc, _)| *doc == change.document_id) {
                Some((_, list)) => list.push(change.clone()),
                None => groups.push((change.document_id.clone(), vec![change.clone()])),
            }
        }
        groups
    }

    /// Approve a change (from pending or rejected)
    pub fn approve(&mut self, id: ChangeId) -> Result<(), ReviewError> {
        self.decide(id, ChangeStatus::Approved)
    }

    /// Reject a change (from pending or approved)
    pub fn reject(&mut self, id: ChangeId) -> Result<(), ReviewError> {
        self.decide(id, ChangeStatus::Rejected)
    }

    /// Replace the text that will be written for a change; status is unchanged
    pub fn edit(&mut self, id: ChangeId, text: impl Into<String>) -> Result<(), ReviewError> {
        let change = self.reviewable_mut(id)?;
        change.user_edited_text = Some(text.into());
        Ok(())
    }

    /// Drop a reviewer edit, falling back to the proposed text
    pub fn discard_edit(&mut self, id: ChangeId) -> Result<(), ReviewError> {
        let change = self.reviewable_mut(id)?;
        change.user_edited_text = None;
        Ok(())
    }

    /// Approve pending, non-flagged changes of one document
    pub fn approve_all_for_document(&mut self, document_id: &str) -> usize {
        self.bulk(Some(document_id), ChangeStatus::Approved, BulkFilter::SkipFlagged)
    }

    /// Approve every pending change of one document, flagged ones included
    pub fn approve_all_for_document_including_flagged(&mut self, document_id: &str) -> usize {
        self.bulk(Some(document_id), ChangeStatus::Approved, BulkFilter::All)
    }

    /// Reject every pending change of one document
    pub fn reject_all_for_document(&mut self, document_id: &str) -> usize {
        self.bulk(Some(document_id), ChangeStatus::Rejected, BulkFilter::All)
    }

    /// Approve pending, non-flagged changes across all documents
    pub fn approve_all(&mut self) -> usize {
        self.bulk(None, ChangeStatus::Approved, BulkFilter::SkipFlagged)
    }

    /// Approve every pending change, flagged ones included
    pub fn approve_all_including_flagged(&mut self) -> usize {
        self.bulk(None, ChangeStatus::Approved, BulkFilter::All)
    }

    /// Reject every pending change across all documents
    pub fn reject_all(&mut self) -> usize {
        self.bulk(None, ChangeStatus::Rejected, BulkFilter::All)
    }

    /// Approve pending changes scoring at or above the auto-approve threshold
    ///
    /// This is a reviewer action; nothing calls it implicitly.
    pub fn approve_auto_eligible(&mut self) -> usize {
        self.bulk(None, ChangeStatus::Approved, BulkFilter::AutoEligible)
    }

    /// Mark an approved change as written back into its document
    ///
    /// Reserved for the apply engine.
    pub fn mark_applied(&mut self, id: ChangeId) -> Result<(), ReviewError> {
        let change = self
            .changes
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(ReviewError::UnknownChange(id))?;
        match change.status {
            ChangeStatus::Approved => {
                change.status = ChangeStatus::Applied;
                Ok(())
            }
            ChangeStatus::Applied => Err(ReviewError::AlreadyApplied(id)),
            status => Err(ReviewError::NotApproved { id, status }),
        }
    }

    fn decide(&mut self, id: ChangeId, status: ChangeStatus) -> Result<(), ReviewError> {
        let change = self.reviewable_mut(id)?;
        change.status = status;
        Ok(())
    }

    fn reviewable_mut(&mut self, id: ChangeId) -> Result<&mut ProposedChange, ReviewError> {
        let change = self
            .changes
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(ReviewError::UnknownChange(id))?;
        if !change.status.is_reviewable() {
            return Err(ReviewError::AlreadyApplied(id));
        }
        Ok(change)
    }

    fn bulk(&mut self, document_id: Option<&str>, status: ChangeStatus, filter: BulkFilter) -> usize {
        let mut touched = 0;
        for change in self.changes.iter_mut() {
            if change.status != ChangeStatus::Pending {
                continue;
            }
            if document_id.is_some_and(|doc| doc != change.document_id) {
                continue;
            }
            if !filter.admits(change) {
                continue;
            }
            change.status = status;
            touched += 1;
        }
        touched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::{ChangeEvidence, ChangeProposal, MatchReason, ScopeJustification};
    use crate::confidence::ConfidenceBreakdown;

    fn change(doc: &str, score: f64) -> ProposedChange {
        ProposedChange::new(ChangeProposal {
            document_id: doc.to_string(),
            document_title: format!("Title {}", doc),
            section_name: "Intro".to_string(),
            page_number: None,
            original_text: "old".to_string(),
            proposed_text: "new".to_string(),
            start_index: 0,
            end_index: 3,
            evidence: ChangeEvidence {
                source_quote: "the new thing".to_string(),
                source_location: "p1".to_string(),
                match_reason: MatchReason::ExactSubjectMatch,
                confidence: ConfidenceBreakdown::score(score, score, score, score),
            },
            scope_justification: ScopeJustification::default(),
            non_impact: Vec::new(),
        })
    }

    #[test]
    fn test_approve_reject_flip() {
        let c = change("d1", 0.8);
        let id = c.id;
        let mut board = ReviewBoard::new(vec![c]);

        board.approve(id).unwrap();
        assert_eq!(board.get(id).unwrap().status, ChangeStatus::Approved);
        board.reject(id).unwrap();
        assert_eq!(board.get(id).unwrap().status, ChangeStatus::Rejected);
        board.approve(id).unwrap();
        assert_eq!(board.get(id).unwrap().status, ChangeStatus::Approved);
    }

    #[test]
    fn test_unknown_change() {
        let mut board = ReviewBoard::new(vec![change("d1", 0.8)]);
        let missing = ChangeId::from_value(7);
        assert_eq!(board.approve(missing), Err(ReviewError::UnknownChange(missing)));
    }

    #[test]
    fn test_edit_keeps_status() {
        let c = change("d1", 0.8);
        let id = c.id;
        let mut board = ReviewBoard::new(vec![c]);

        board.edit(id, "reviewer text").unwrap();
        let edited = board.get(id).unwrap();
        assert_eq!(edited.status, ChangeStatus::Pending);
        assert_eq!(edited.replacement_text(), "reviewer text");

        board.discard_edit(id).unwrap();
        assert_eq!(board.get(id).unwrap().replacement_text(), "new");
    }

    #[test]
    fn test_pending_cannot_be_marked_applied() {
        let c = change("d1", 0.8);
        let id = c.id;
        let mut board = ReviewBoard::new(vec![c]);

        assert_eq!(
            board.mark_applied(id),
            Err(ReviewError::NotApproved { id, status: ChangeStatus::Pending })
        );
        assert_eq!(board.get(id).unwrap().status, ChangeStatus::Pending);
    }

    #[test]
    fn test_applied_is_terminal() {
        let c = change("d1", 0.8);
        let id = c.id;
        let mut board = ReviewBoard::new(vec![c]);
        board.approve(id).unwrap();
        board.mark_applied(id).unwrap();

        assert_eq!(board.approve(id), Err(ReviewError::AlreadyApplied(id)));
        assert_eq!(board.reject(id), Err(ReviewError::AlreadyApplied(id)));
        assert_eq!(board.edit(id, "x"), Err(ReviewError::AlreadyApplied(id)));
        assert_eq!(board.mark_applied(id), Err(ReviewError::AlreadyApplied(id)));
        assert_eq!(board.reject_all(), 0);
        assert_eq!(board.get(id).unwrap().status, ChangeStatus::Applied);
    }

    #[test]
    fn test_bulk_only_touches_pending() {
        let decided = change("d1", 0.8);
        let decided_id = decided.id;
        let mut board = ReviewBoard::new(vec![decided, change("d1", 0.8), change("d1", 0.8)]);
        board.reject(decided_id).unwrap();

        assert_eq!(board.approve_all(), 2);
        assert_eq!(board.get(decided_id).unwrap().status, ChangeStatus::Rejected);
        assert_eq!(board.count(ChangeStatus::Approved), 2);
    }

    #[test]
    fn test_approve_all_skips_flagged() {
        let flagged = change("d1", 0.4);
        let flagged_id = flagged.id;
        let mut board = ReviewBoard::new(vec![flagged, change("d1", 0.8)]);

        assert_eq!(board.approve_all(), 1);
        assert_eq!(board.get(flagged_id).unwrap().status, ChangeStatus::Pending);

        assert_eq!(board.approve_all_including_flagged(), 1);
        assert_eq!(board.get(flagged_id).unwrap().status, ChangeStatus::Approved);
    }

    #[test]
    fn test_approve_auto_eligible() {
        let eligible = change("d1", 0.95);
        let eligible_id = eligible.id;
        let mut board = ReviewBoard::new(vec![eligible, change("d1", 0.75)]);

        assert_eq!(board.approve_auto_eligible(), 1);
        assert_eq!(board.get(eligible_id).unwrap().status, ChangeStatus::Approved);
        assert_eq!(board.count(ChangeStatus::Pending), 1);
    }

    #[test]
    fn test_document_scoped_bulk() {
        let mut board = ReviewBoard::new(vec![change("d1", 0.8), change("d2", 0.8), change("d2", 0.8)]);

        assert_eq!(board.reject_all_for_document("d2"), 2);
        assert_eq!(board.count(ChangeStatus::Rejected), 2);
        assert_eq!(board.count(ChangeStatus::Pending), 1);
        assert_eq!(board.approve_all_for_document("unknown"), 0);
    }

    #[test]
    fn test_reject_all_then_approve_document() {
        // d1 holds one change approved before the global reject
        let pre_approved = change("d1", 0.8);
        let pre_approved_id = pre_approved.id;
        let d1_other = change("d1", 0.8);
        let d1_other_id = d1_other.id;
        let d2_change = change("d2", 0.8);
        let d2_id = d2_change.id;
        let mut board = ReviewBoard::new(vec![pre_approved, d1_other, d2_change]);
        board.approve(pre_approved_id).unwrap();

        assert_eq!(board.reject_all(), 2);
        // Nothing in d2 is pending any more, so the document approval is a no-op
        assert_eq!(board.approve_all_for_document("d2"), 0);

        assert_eq!(board.get(pre_approved_id).unwrap().status, ChangeStatus::Approved);
        assert_eq!(board.get(d1_other_id).unwrap().status, ChangeStatus::Rejected);
        assert_eq!(board.get(d2_id).unwrap().status, ChangeStatus::Rejected);
    }

    #[test]
    fn test_approved_by_document_order() {
        let a = change("d1", 0.8);
        let b = change("d2", 0.8);
        let c = change("d1", 0.8);
        let (a_id, c_id) = (a.id, c.id);
        let mut board = ReviewBoard::new(vec![a, b, c]);
        board.approve(a_id).unwrap();
        board.approve(c_id).unwrap();

        let groups = board.approved_by_document();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].0, "d1");
        let ids: Vec<_> = groups[0].1.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![a_id, c_id]);
    }

    #[test]
    fn test_affected_documents_recomputed() {
        let board = ReviewBoard::new(vec![change("d1", 0.8), change("d1", 0.6), change("d2", 0.9)]);
        let docs = board.affected_documents();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].total_changes, 2);
        assert!((docs[0].overall_confidence - 0.7).abs() < 1e-9);
    }
}
