//! Session aggregate and its reducer
//!
//! ```text
//! upload ──▶ analyzing ──▶ preview ──▶ applying ──▶ complete
//!   ▲           │  │          │            │
//!   │  cancel   │  └─▶ no_matches ─(file)──┼──▶ complete
//!   └───────────┘  └─▶ error ◀─────────────┘
//! ```
//!
//! Every step except `analyzing` and `applying` returns to `upload` on an
//! explicit reset. Events tagged with an analysis generation are ignored once
//! that run has been cancelled or reset.

use crate::error::SessionError;
use crate::upload::FileKind;
use revisor_domain::{AnalysisResult, ApplyResult, ContentAnalysis, ReviewBoard};
use std::collections::BTreeSet;
use std::fmt;
use tracing::{debug, info};

/// Coarse position of a session in the workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WorkflowStep {
    /// Waiting for a file
    #[default]
    Upload,
    /// Analysis running
    Analyzing,
    /// Proposed changes under review
    Preview,
    /// Analysis found nothing to change
    NoMatches,
    /// Approved changes being written
    Applying,
    /// Finished
    Complete,
    /// Analysis or apply failed
    Error,
}

impl WorkflowStep {
    /// Short lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowStep::Upload => "upload",
            WorkflowStep::Analyzing => "analyzing",
            WorkflowStep::Preview => "preview",
            WorkflowStep::NoMatches => "no_matches",
            WorkflowStep::Applying => "applying",
            WorkflowStep::Complete => "complete",
            WorkflowStep::Error => "error",
        }
    }
}

impl fmt::Display for WorkflowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The accepted upload, already extracted to text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// Original file name
    pub file_name: String,
    /// Detected format
    pub kind: FileKind,
    /// Size of the raw upload
    pub size_bytes: u64,
    /// Extracted plain text
    pub text: String,
}

/// Inputs to the session reducer
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A file passed the upload checks
    FileSelected(UploadedFile),
    /// Link (or unlink) an assignment
    AssignmentLinked(Option<String>),
    /// Link (or unlink) a task
    TaskLinked(Option<String>),
    /// Analysis begins; opens a new generation
    AnalysisStarted,
    /// Progress for the given run
    AnalysisProgress {
        /// Run the progress belongs to
        generation: u64,
        /// Percentage, clamped to 100
        percent: u8,
    },
    /// The run finished with a result (possibly empty)
    AnalysisSucceeded {
        /// Run the result belongs to
        generation: u64,
        /// Admitted changes and content analysis
        result: AnalysisResult,
    },
    /// The run failed
    AnalysisFailed {
        /// Run that failed
        generation: u64,
        /// User-facing message
        message: String,
    },
    /// The user cancelled the running analysis
    Cancelled,
    /// Apply begins
    ApplyStarted,
    /// Apply finished
    ApplyFinished {
        /// Board with written changes marked applied
        board: ReviewBoard,
        /// One result per attempted change
        results: Vec<ApplyResult>,
        /// Human-readable report
        summary: String,
    },
    /// The upload was stored as a new document
    FiledSeparately {
        /// Id of the new document
        document_id: String,
    },
    /// Start over
    Reset,
}

impl SessionEvent {
    fn name(&self) -> &'static str {
        match self {
            SessionEvent::FileSelected(_) => "select a file",
            SessionEvent::AssignmentLinked(_) => "link an assignment",
            SessionEvent::TaskLinked(_) => "link a task",
            SessionEvent::AnalysisStarted => "start analysis",
            SessionEvent::AnalysisProgress { .. } => "report progress",
            SessionEvent::AnalysisSucceeded { .. } => "finish analysis",
            SessionEvent::AnalysisFailed { .. } => "fail analysis",
            SessionEvent::Cancelled => "cancel",
            SessionEvent::ApplyStarted => "start apply",
            SessionEvent::ApplyFinished { .. } => "finish apply",
            SessionEvent::FiledSeparately { .. } => "file separately",
            SessionEvent::Reset => "reset",
        }
    }

    fn generation(&self) -> Option<u64> {
        match self {
            SessionEvent::AnalysisProgress { generation, .. }
            | SessionEvent::AnalysisSucceeded { generation, .. }
            | SessionEvent::AnalysisFailed { generation, .. } => Some(*generation),
            _ => None,
        }
    }
}

/// State of one upload-through-apply session
///
/// Lives only in memory; an explicit reset starts a fresh session.
#[derive(Debug, Clone, Default)]
pub struct DocumentControlState {
    current_step: WorkflowStep,
    uploaded_file: Option<UploadedFile>,
    linked_assignment: Option<String>,
    linked_task: Option<String>,
    analysis_progress: u8,
    board: ReviewBoard,
    content_analysis: Option<ContentAnalysis>,
    expanded_documents: BTreeSet<String>,
    applied_changes: Vec<ApplyResult>,
    saved_document_id: Option<String>,
    error: Option<String>,
    status_message: Option<String>,
    generation: u64,
}

impl DocumentControlState {
    /// A fresh session in the upload step
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply an event
    ///
    /// Events that do not fit the current step are refused and leave the
    /// state unchanged.
    pub fn dispatch(&mut self, event: SessionEvent) -> Result<(), SessionError> {
        if let Some(generation) = event.generation() {
            if generation != self.generation {
                debug!(
                    "Ignoring {} from stale analysis run {} (current {})",
                    event.name(),
                    generation,
                    self.generation
                );
                return Ok(());
            }
        }

        let from = self.current_step;
        let name = event.name();

        match (from, event) {
            (WorkflowStep::Upload, SessionEvent::FileSelected(file)) => {
                self.status_message = Some(format!("Selected {}", file.file_name));
                self.uploaded_file = Some(file);
                self.error = None;
            }
            (step, SessionEvent::AssignmentLinked(id)) if step != WorkflowStep::Applying => {
                self.linked_assignment = id;
            }
            (step, SessionEvent::TaskLinked(id)) if step != WorkflowStep::Applying => {
                self.linked_task = id;
            }
            (WorkflowStep::Upload, SessionEvent::AnalysisStarted) if self.uploaded_file.is_some() => {
                self.generation += 1;
                self.current_step = WorkflowStep::Analyzing;
                self.analysis_progress = 0;
                self.clear_results();
                self.status_message = Some("Analyzing document".to_string());
            }
            (WorkflowStep::Analyzing, SessionEvent::AnalysisProgress { percent, .. }) => {
                self.analysis_progress = self.analysis_progress.max(percent.min(100));
            }
            (WorkflowStep::Analyzing, SessionEvent::AnalysisSucceeded { result, .. }) => {
                self.analysis_progress = 100;
                self.board = ReviewBoard::from_analysis(&result);
                self.content_analysis = Some(result.content_analysis);
                if self.board.is_empty() {
                    self.current_step = WorkflowStep::NoMatches;
                    self.status_message =
                        Some("No existing document needs changes from this upload".to_string());
                } else {
                    self.current_step = WorkflowStep::Preview;
                    self.status_message = Some(format!(
                        "{} proposed changes across {} documents",
                        result.summary.total_changes, result.summary.total_documents
                    ));
                }
            }
            (WorkflowStep::Analyzing, SessionEvent::AnalysisFailed { message, .. }) => {
                self.current_step = WorkflowStep::Error;
                self.error = Some(message);
                self.status_message = None;
            }
            (WorkflowStep::Analyzing, SessionEvent::Cancelled) => {
                self.generation += 1;
                self.current_step = WorkflowStep::Upload;
                self.analysis_progress = 0;
                self.clear_results();
                self.status_message = Some("Analysis cancelled".to_string());
            }
            (WorkflowStep::Preview, SessionEvent::ApplyStarted) => {
                self.current_step = WorkflowStep::Applying;
                self.status_message = Some("Applying approved changes".to_string());
            }
            (
                WorkflowStep::Applying,
                SessionEvent::ApplyFinished {
                    board,
                    results,
                    summary,
                },
            ) => {
                self.board = board;
                if results.iter().any(|r| r.success) {
                    self.current_step = WorkflowStep::Complete;
                    self.error = None;
                } else {
                    self.current_step = WorkflowStep::Error;
                    self.error = Some(summary.clone());
                }
                self.applied_changes = results;
                self.status_message = Some(summary);
            }
            (WorkflowStep::NoMatches, SessionEvent::FiledSeparately { document_id }) => {
                self.status_message = Some(format!("Filed as new document {}", document_id));
                self.saved_document_id = Some(document_id);
                self.current_step = WorkflowStep::Complete;
            }
            (step, SessionEvent::Reset)
                if step != WorkflowStep::Analyzing && step != WorkflowStep::Applying =>
            {
                *self = Self {
                    generation: self.generation + 1,
                    ..Self::default()
                };
            }
            (step, _) => {
                return Err(SessionError::InvalidTransition { step, event: name });
            }
        }

        if from != self.current_step {
            info!("Session step {} -> {}", from, self.current_step);
        }
        Ok(())
    }

    fn clear_results(&mut self) {
        self.board = ReviewBoard::default();
        self.content_analysis = None;
        self.expanded_documents.clear();
        self.applied_changes.clear();
        self.saved_document_id = None;
        self.error = None;
    }

    /// Expand or collapse a document in the review view; returns whether it
    /// is now expanded
    pub fn toggle_expanded(&mut self, document_id: &str) -> bool {
        if self.expanded_documents.remove(document_id) {
            false
        } else {
            self.expanded_documents.insert(document_id.to_string());
            true
        }
    }

    /// Whether a document is expanded in the review view
    pub fn is_expanded(&self, document_id: &str) -> bool {
        self.expanded_documents.contains(document_id)
    }

    /// Current step
    pub fn current_step(&self) -> WorkflowStep {
        self.current_step
    }

    /// Accepted upload, if any
    pub fn uploaded_file(&self) -> Option<&UploadedFile> {
        self.uploaded_file.as_ref()
    }

    /// Linked assignment id
    pub fn linked_assignment(&self) -> Option<&str> {
        self.linked_assignment.as_deref()
    }

    /// Linked task id
    pub fn linked_task(&self) -> Option<&str> {
        self.linked_task.as_deref()
    }

    /// Analysis progress in percent; never decreases within a run
    pub fn analysis_progress(&self) -> u8 {
        self.analysis_progress
    }

    /// Proposed changes and their review state
    pub fn board(&self) -> &ReviewBoard {
        &self.board
    }

    pub(crate) fn board_mut(&mut self) -> &mut ReviewBoard {
        &mut self.board
    }

    pub(crate) fn take_board(&mut self) -> ReviewBoard {
        std::mem::take(&mut self.board)
    }

    /// Content analysis of the upload, once analysis succeeded
    pub fn content_analysis(&self) -> Option<&ContentAnalysis> {
        self.content_analysis.as_ref()
    }

    /// Expanded document ids
    pub fn expanded_documents(&self) -> &BTreeSet<String> {
        &self.expanded_documents
    }

    /// Results of the last apply
    pub fn applied_changes(&self) -> &[ApplyResult] {
        &self.applied_changes
    }

    /// Id of the document created by filing the upload separately
    pub fn saved_document_id(&self) -> Option<&str> {
        self.saved_document_id.as_deref()
    }

    /// User-facing error message
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// User-facing status line
    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    /// Current analysis generation
    pub fn generation(&self) -> u64 {
        self.generation
    }
}
