//! Outcome reporting for an apply run

use revisor_domain::{ApplyResult, DocumentVersion};

/// Per-change results of one apply run, in document then change order
#[derive(Debug, Clone, Default)]
pub struct ApplyReport {
    /// One result per change
    pub results: Vec<ApplyResult>,

    /// Wall-clock duration in milliseconds
    pub elapsed_ms: u64,
}

/// Aggregate outcome for one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentOutcome {
    /// Target document
    pub document_id: String,
    /// Changes written
    pub applied: usize,
    /// Changes that failed
    pub failed: usize,
    /// Version reached, if anything was written
    pub new_version: Option<DocumentVersion>,
}

impl ApplyReport {
    /// Create a report from results
    pub fn new(results: Vec<ApplyResult>) -> Self {
        Self {
            results,
            elapsed_ms: 0,
        }
    }

    /// Number of changes attempted
    pub fn total(&self) -> usize {
        self.results.len()
    }

    /// Number of changes written
    pub fn applied_count(&self) -> usize {
        self.results.iter().filter(|r| r.success).count()
    }

    /// Number of changes that failed
    pub fn failed_count(&self) -> usize {
        self.total() - self.applied_count()
    }

    /// Failed results
    pub fn failures(&self) -> impl Iterator<Item = &ApplyResult> {
        self.results.iter().filter(|r| !r.success)
    }

    /// Outcomes per document, in the order documents were processed
    pub fn documents(&self) -> Vec<DocumentOutcome> {
        let mut outcomes: Vec<DocumentOutcome> = Vec::new();
        for result in &self.results {
            let index = match outcomes.iter().position(|o| o.document_id == result.document_id) {
                Some(index) => index,
                None => {
                    outcomes.push(DocumentOutcome {
                        document_id: result.document_id.clone(),
                        applied: 0,
                        failed: 0,
                        new_version: None,
                    });
                    outcomes.len() - 1
                }
            };
            let outcome = &mut outcomes[index];
            if result.success {
                outcome.applied += 1;
                outcome.new_version = result.new_version;
            } else {
                outcome.failed += 1;
            }
        }
        outcomes
    }

    /// Whether at least one document was updated
    pub fn any_document_succeeded(&self) -> bool {
        self.results.iter().any(|r| r.success)
    }

    /// Human-readable summary: a count line, then one line per failure
    pub fn summary(&self) -> String {
        let mut lines = vec![format!(
            "{} of {} changes applied",
            self.applied_count(),
            self.total()
        )];

        for outcome in self.documents() {
            if let Some(version) = outcome.new_version {
                lines.push(format!("  {} -> v{}", outcome.document_id, version));
            }
        }

        for failure in self.failures() {
            let reason = failure
                .error
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_else(|| "unknown error".to_string());
            lines.push(format!(
                "  failed: {} [{}]: {}",
                failure.document_id, failure.change_id, reason
            ));
        }

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use revisor_domain::{ApplyFailure, ChangeId};

    fn sample() -> ApplyReport {
        ApplyReport::new(vec![
            ApplyResult::applied("plan", ChangeId::from_value(1), DocumentVersion::new(1, 1)),
            ApplyResult::failed("plan", ChangeId::from_value(2), ApplyFailure::StaleRange { start: 4, end: 9 }),
            ApplyResult::failed("faq", ChangeId::from_value(3), ApplyFailure::DocumentNotFound("faq".to_string())),
        ])
    }

    #[test]
    fn test_counts() {
        let report = sample();
        assert_eq!(report.total(), 3);
        assert_eq!(report.applied_count(), 1);
        assert_eq!(report.failed_count(), 2);
        assert!(report.any_document_succeeded());
    }

    #[test]
    fn test_documents() {
        let docs = sample().documents();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].document_id, "plan");
        assert_eq!((docs[0].applied, docs[0].failed), (1, 1));
        assert_eq!(docs[0].new_version, Some(DocumentVersion::new(1, 1)));
        assert_eq!(docs[1].new_version, None);
    }

    #[test]
    fn test_summary_enumerates_failures() {
        let summary = sample().summary();
        let lines: Vec<&str> = summary.lines().collect();
        assert_eq!(lines[0], "1 of 3 changes applied");
        assert_eq!(lines[1], "  plan -> v1.1");
        assert!(lines[2].contains("Stale range 4..9"));
        assert!(lines[3].contains("Document not found: faq"));
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_empty_report() {
        let report = ApplyReport::default();
        assert_eq!(report.summary(), "0 of 0 changes applied");
        assert!(!report.any_document_succeeded());
    }
}
