//! Output formatting for the CLI.

use crate::cli::CliFormat;
use crate::error::Result;
use colored::*;
use revisor_apply::ApplyReport;
use revisor_domain::{diff, AffectedDocument, DiffKind, ProposedChange, StoredDocument};
use revisor_session::RejectedProposal;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
pub struct Formatter {
    format: CliFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: CliFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Selected output format.
    pub fn format(&self) -> CliFormat {
        self.format
    }

    /// Format a list of documents.
    pub fn format_documents(&self, documents: &[StoredDocument]) -> Result<String> {
        match self.format {
            CliFormat::Json => {
                let json: Vec<serde_json::Value> = documents
                    .iter()
                    .map(|d| {
                        serde_json::json!({
                            "id": d.id,
                            "title": d.title,
                            "version": d.version.to_string(),
                            "chars": d.content.chars().count(),
                            "history": d.version_history.len(),
                        })
                    })
                    .collect();
                Ok(serde_json::to_string_pretty(&json)?)
            }
            CliFormat::Quiet => Ok(documents
                .iter()
                .map(|d| d.id.as_str())
                .collect::<Vec<_>>()
                .join("\n")),
            CliFormat::Table => {
                if documents.is_empty() {
                    return Ok(self.colorize("No documents found.", "yellow"));
                }

                let mut builder = Builder::default();
                builder.push_record(["ID", "Title", "Version", "Chars", "Prior versions"]);
                for doc in documents {
                    builder.push_record([
                        doc.id.clone(),
                        doc.title.clone(),
                        doc.version.to_string(),
                        doc.content.chars().count().to_string(),
                        doc.version_history.len().to_string(),
                    ]);
                }
                Ok(self.table(builder))
            }
        }
    }

    /// Format a document's version history.
    pub fn format_history(&self, document: &StoredDocument, show_content: bool) -> Result<String> {
        match self.format {
            CliFormat::Json => {
                let entries: Vec<serde_json::Value> = document
                    .version_history
                    .iter()
                    .map(|e| {
                        serde_json::json!({
                            "version": e.version.to_string(),
                            "replaced_at": e.replaced_at,
                            "summary": e.summary,
                            "content": e.content,
                        })
                    })
                    .collect();
                let json = serde_json::json!({
                    "id": document.id,
                    "title": document.title,
                    "version": document.version.to_string(),
                    "history": entries,
                });
                Ok(serde_json::to_string_pretty(&json)?)
            }
            CliFormat::Quiet => Ok(document
                .version_history
                .iter()
                .map(|e| e.version.to_string())
                .chain(std::iter::once(document.version.to_string()))
                .collect::<Vec<_>>()
                .join("\n")),
            CliFormat::Table => {
                let mut builder = Builder::default();
                builder.push_record(["Version", "Replaced at", "Summary"]);
                for entry in &document.version_history {
                    builder.push_record([
                        entry.version.to_string(),
                        entry.replaced_at.to_string(),
                        entry.summary.clone(),
                    ]);
                }
                builder.push_record([
                    document.version.to_string(),
                    "(current)".to_string(),
                    String::new(),
                ]);

                let mut out = format!("{} ({})\n{}", document.title, document.id, self.table(builder));
                if show_content {
                    for entry in &document.version_history {
                        out.push_str(&format!("\n\n--- v{} ---\n{}", entry.version, entry.content));
                    }
                }
                Ok(out)
            }
        }
    }

    /// Format the proposed changes of an analysis, grouped by document.
    pub fn format_proposals(&self, documents: &[AffectedDocument]) -> Result<String> {
        match self.format {
            CliFormat::Json => {
                let json: Vec<serde_json::Value> = documents
                    .iter()
                    .map(|d| {
                        serde_json::json!({
                            "document_id": d.document_id,
                            "document_title": d.document_title,
                            "overall_confidence": d.overall_confidence,
                            "changes": d.changes.iter().map(change_json).collect::<Vec<_>>(),
                        })
                    })
                    .collect();
                Ok(serde_json::to_string_pretty(&json)?)
            }
            CliFormat::Quiet => Ok(documents
                .iter()
                .flat_map(|d| d.changes.iter().map(|c| c.id.to_string()))
                .collect::<Vec<_>>()
                .join("\n")),
            CliFormat::Table => {
                let mut out = String::new();
                for document in documents {
                    out.push_str(&self.colorize(
                        &format!(
                            "{} ({}) - {} change(s), confidence {:.2}",
                            document.document_title,
                            document.document_id,
                            document.total_changes,
                            document.overall_confidence
                        ),
                        "cyan",
                    ));
                    out.push('\n');
                    for change in &document.changes {
                        out.push_str(&self.format_change(change));
                        out.push('\n');
                    }
                }
                Ok(out.trim_end().to_string())
            }
        }
    }

    /// Format one change with its diff, scores, and evidence.
    pub fn format_change(&self, change: &ProposedChange) -> String {
        let confidence = &change.evidence.confidence;
        let level = change.level();
        let header = format!(
            "  [{}] {} - {} ({:.2})",
            &change.id.to_string()[..8],
            change.section_name,
            level.label(),
            confidence.overall()
        );
        let header = if change.is_flagged() {
            self.colorize(&header, "yellow")
        } else {
            header
        };

        format!(
            "{}\n    {}\n    subject {:.2} | evidence {:.2} | scope {:.2} | minimality {:.2} | {}\n    evidence: \"{}\" ({})",
            header,
            self.render_diff(&change.original_text, change.replacement_text()),
            confidence.subject_match(),
            confidence.factual_alignment(),
            confidence.scope_containment(),
            confidence.change_minimality(),
            change.status(),
            change.evidence.source_quote,
            change.evidence.source_location,
        )
    }

    /// Render a word diff inline.
    ///
    /// Without color, removed text is shown as `[-text-]` and added text as
    /// `{+text+}`.
    pub fn render_diff(&self, original: &str, proposed: &str) -> String {
        diff(original, proposed)
            .iter()
            .map(|segment| match (segment.kind, self.color_enabled) {
                (DiffKind::Same, _) => segment.text.clone(),
                (DiffKind::Removed, true) => segment.text.red().strikethrough().to_string(),
                (DiffKind::Added, true) => segment.text.green().underline().to_string(),
                (DiffKind::Removed, false) => format!("[-{}-]", segment.text),
                (DiffKind::Added, false) => format!("{{+{}+}}", segment.text),
            })
            .collect()
    }

    /// Format proposals dropped before review.
    pub fn format_rejected(&self, rejected: &[RejectedProposal]) -> String {
        if rejected.is_empty() {
            return String::new();
        }
        let mut out = self.warning(&format!("{} proposal(s) dropped", rejected.len()));
        for proposal in rejected {
            out.push_str(&format!(
                "\n  {} \"{}\": {}",
                proposal.document_id,
                proposal.original_text,
                proposal.reasons.join("; ")
            ));
        }
        out
    }

    /// Format an apply report.
    pub fn format_report(&self, report: &ApplyReport) -> Result<String> {
        match self.format {
            CliFormat::Json => {
                let documents: Vec<serde_json::Value> = report
                    .documents()
                    .iter()
                    .map(|d| {
                        serde_json::json!({
                            "document_id": d.document_id,
                            "applied": d.applied,
                            "failed": d.failed,
                            "new_version": d.new_version.map(|v| v.to_string()),
                        })
                    })
                    .collect();
                let failures: Vec<serde_json::Value> = report
                    .failures()
                    .map(|r| {
                        serde_json::json!({
                            "document_id": r.document_id,
                            "change_id": r.change_id.to_string(),
                            "error": r.error.as_ref().map(|e| e.to_string()),
                        })
                    })
                    .collect();
                let json = serde_json::json!({
                    "applied": report.applied_count(),
                    "total": report.total(),
                    "elapsed_ms": report.elapsed_ms,
                    "documents": documents,
                    "failures": failures,
                });
                Ok(serde_json::to_string_pretty(&json)?)
            }
            CliFormat::Quiet => Ok(report.applied_count().to_string()),
            CliFormat::Table => {
                if report.failed_count() == 0 {
                    Ok(self.success(&report.summary()))
                } else {
                    Ok(self.warning(&report.summary()))
                }
            }
        }
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    fn table(&self, builder: Builder) -> String {
        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));
        table.to_string()
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            "cyan" => text.cyan().to_string(),
            _ => text.to_string(),
        }
    }
}

fn change_json(change: &ProposedChange) -> serde_json::Value {
    serde_json::json!({
        "id": change.id.to_string(),
        "section_name": change.section_name,
        "original_text": change.original_text,
        "proposed_text": change.replacement_text(),
        "start_index": change.start_index,
        "end_index": change.end_index,
        "status": change.status().as_str(),
        "overall": change.overall(),
        "level": change.level().label(),
        "evidence": {
            "source_quote": change.evidence.source_quote,
            "source_location": change.evidence.source_location,
            "match_reason": change.evidence.match_reason.as_str(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use revisor_domain::{
        ChangeEvidence, ChangeProposal, ConfidenceBreakdown, DocumentVersion,
        MatchReason, ScopeJustification, VersionEntry,
    };

    fn create_test_document() -> StoredDocument {
        StoredDocument {
            id: "launch-plan".to_string(),
            project_id: "launch".to_string(),
            title: "Launch Plan".to_string(),
            content: "The rollout will begin March 1.".to_string(),
            version: DocumentVersion::new(1, 1),
            version_history: vec![VersionEntry {
                version: DocumentVersion::initial(),
                content: "The rollout will begin February 15.".to_string(),
                replaced_at: 1_700_000_000,
                summary: "Applied 1 reviewed change(s)".to_string(),
            }],
        }
    }

    fn create_test_change(score: f64) -> ProposedChange {
        ProposedChange::new(ChangeProposal {
            document_id: "launch-plan".to_string(),
            document_title: "Launch Plan".to_string(),
            section_name: "Schedule".to_string(),
            page_number: None,
            original_text: "begin February 15".to_string(),
            proposed_text: "begin March 1".to_string(),
            start_index: 17,
            end_index: 34,
            evidence: ChangeEvidence {
                source_quote: "rollout will begin March 1".to_string(),
                source_location: "paragraph 1".to_string(),
                match_reason: MatchReason::ExactSubjectMatch,
                confidence: ConfidenceBreakdown::score(score, score, score, score),
            },
            scope_justification: ScopeJustification::default(),
            non_impact: Vec::new(),
        })
    }

    #[test]
    fn test_plain_diff() {
        let formatter = Formatter::new(CliFormat::Table, false);
        let rendered = formatter.render_diff("begin February 15", "begin March 1");
        assert!(rendered.starts_with("begin "));
        assert!(rendered.contains("[-"));
        assert!(rendered.contains("{+"));
        assert!(rendered.contains("February"));
        assert!(rendered.contains("March"));
    }

    #[test]
    fn test_change_table_format() {
        let formatter = Formatter::new(CliFormat::Table, false);
        let output = formatter.format_change(&create_test_change(0.95));
        assert!(output.contains("Schedule"));
        assert!(output.contains("auto-approve eligible"));
        assert!(output.contains("\"rollout will begin March 1\" (paragraph 1)"));
        assert!(output.contains("pending"));
    }

    #[test]
    fn test_proposals_json() {
        let formatter = Formatter::new(CliFormat::Json, false);
        let documents = AffectedDocument::group(&[create_test_change(0.8), create_test_change(0.4)]);
        let output = formatter.format_proposals(&documents).unwrap();
        let json: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(json[0]["document_id"], "launch-plan");
        assert_eq!(json[0]["changes"].as_array().unwrap().len(), 2);
        assert_eq!(json[0]["changes"][1]["level"], "flagged");
    }

    #[test]
    fn test_quiet_proposals() {
        let formatter = Formatter::new(CliFormat::Quiet, false);
        let change = create_test_change(0.8);
        let id = change.id.to_string();
        let output = formatter.format_proposals(&AffectedDocument::group(&[change])).unwrap();
        assert_eq!(output, id);
    }

    #[test]
    fn test_documents_table() {
        let formatter = Formatter::new(CliFormat::Table, false);
        let output = formatter.format_documents(&[create_test_document()]).unwrap();
        assert!(output.contains("Launch Plan"));
        assert!(output.contains("1.1"));

        let empty = formatter.format_documents(&[]).unwrap();
        assert_eq!(empty, "No documents found.");
    }

    #[test]
    fn test_history_quiet_lists_versions() {
        let formatter = Formatter::new(CliFormat::Quiet, false);
        let output = formatter.format_history(&create_test_document(), false).unwrap();
        assert_eq!(output, "1.0\n1.1");
    }

    #[test]
    fn test_history_content() {
        let formatter = Formatter::new(CliFormat::Table, false);
        let output = formatter.format_history(&create_test_document(), true).unwrap();
        assert!(output.contains("--- v1.0 ---\nThe rollout will begin February 15."));
        assert!(output.contains("(current)"));
    }

    #[test]
    fn test_messages_without_color() {
        let formatter = Formatter::new(CliFormat::Table, false);
        assert_eq!(formatter.success("done"), "✓ done");
        assert_eq!(formatter.warning("careful"), "⚠ careful");
    }
}
