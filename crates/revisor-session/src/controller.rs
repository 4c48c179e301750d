//! Session workflow controller
//!
//! The only component that sequences the pipeline: it validates the upload,
//! runs the analyzer once per analyzing phase, exposes the review board
//! while previewing, and runs the apply engine once per applying phase.

use crate::config::RevisorConfig;
use crate::error::SessionError;
use crate::extract::{ExtractionError, PlainTextExtractor};
use crate::state::{DocumentControlState, SessionEvent, UploadedFile, WorkflowStep};
use crate::upload::{FileKind, UploadPolicy};
use revisor_analyzer::{AnalysisMetadata, AnalysisRequest, Analyzer, RejectedProposal};
use revisor_apply::{ApplyEngine, ApplyReport};
use revisor_domain::confidence::verify_weights;
use revisor_domain::traits::{ContentExtractor, DocumentStore, LlmProvider};
use revisor_domain::{CandidateDocument, ChangeStatus, NewDocument, ReviewBoard, UploadedDocument};
use revisor_gatekeeper::Gatekeeper;
use std::fmt::Display;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

type Extractor = Box<dyn ContentExtractor<Error = ExtractionError> + Send + Sync>;

/// Cancels the analysis currently running on a controller
///
/// Cancelling while no analysis runs has no effect on later runs.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    token: Arc<Mutex<CancellationToken>>,
}

impl CancelHandle {
    /// Request cancellation of the running analysis
    pub fn cancel(&self) {
        self.token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .cancel();
    }
}

/// Drives one upload-through-apply session
///
/// # Examples
///
/// ```no_run
/// use revisor_llm::OllamaProvider;
/// use revisor_session::{RevisorConfig, SessionController, WorkflowStep};
/// use revisor_store::SqliteStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let llm = OllamaProvider::default_endpoint("llama3.1");
/// let store = SqliteStore::new("revisor.db")?;
/// let mut session = SessionController::from_config(llm, store, "launch", &RevisorConfig::default())?;
///
/// session.upload("memo.txt", None, b"The rollout will begin March 1.")?;
/// if session.run_analysis().await? == WorkflowStep::Preview {
///     session.review()?.approve_auto_eligible();
///     let report = session.run_apply().await?;
///     println!("{}", report.summary());
/// }
/// # Ok(())
/// # }
/// ```
pub struct SessionController<L, S>
where
    L: LlmProvider,
    S: DocumentStore,
{
    analyzer: Analyzer<L>,
    engine: ApplyEngine<S>,
    extractor: Extractor,
    upload_policy: UploadPolicy,
    project_id: String,
    state: DocumentControlState,
    cancel: Arc<Mutex<CancellationToken>>,
    rejected: Vec<RejectedProposal>,
    metadata: Option<AnalysisMetadata>,
}

impl<L, S> SessionController<L, S>
where
    L: LlmProvider + Send + Sync + 'static,
    L::Error: Display,
    S: DocumentStore + Send + 'static,
    S::Error: Display,
{
    /// Create a controller for documents in `project_id`
    pub fn new(
        analyzer: Analyzer<L>,
        engine: ApplyEngine<S>,
        project_id: impl Into<String>,
    ) -> Result<Self, SessionError> {
        verify_weights().map_err(SessionError::Config)?;

        Ok(Self {
            analyzer,
            engine,
            extractor: Box::new(PlainTextExtractor),
            upload_policy: UploadPolicy::default(),
            project_id: project_id.into(),
            state: DocumentControlState::new(),
            cancel: Arc::new(Mutex::new(CancellationToken::new())),
            rejected: Vec::new(),
            metadata: None,
        })
    }

    /// Build every component from a unified configuration
    pub fn from_config(
        llm: L,
        store: S,
        project_id: impl Into<String>,
        config: &RevisorConfig,
    ) -> Result<Self, SessionError> {
        config.validate()?;
        let analyzer = Analyzer::new(
            llm,
            Gatekeeper::new(config.validation.clone()),
            config.analyzer.clone(),
        )
        .map_err(|e| SessionError::Config(e.to_string()))?;
        let engine = ApplyEngine::new(store, config.apply.clone())
            .map_err(|e| SessionError::Config(e.to_string()))?;

        Ok(Self::new(analyzer, engine, project_id)?.with_upload_policy(config.upload.clone()))
    }

    /// Replace the content extractor (e.g. with a PDF-capable one)
    pub fn with_extractor<E>(mut self, extractor: E) -> Self
    where
        E: ContentExtractor<Error = ExtractionError> + Send + Sync + 'static,
    {
        self.extractor = Box::new(extractor);
        self
    }

    /// Record `model_name` in analysis diagnostics
    pub fn with_model_name(mut self, model_name: impl Into<String>) -> Self {
        self.analyzer = self.analyzer.with_model_name(model_name);
        self
    }

    /// Replace the upload policy
    pub fn with_upload_policy(mut self, policy: UploadPolicy) -> Self {
        self.upload_policy = policy;
        self
    }

    /// Session state
    pub fn state(&self) -> &DocumentControlState {
        &self.state
    }

    /// Project whose documents are analyzed and updated
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Shared document store
    pub fn store(&self) -> Arc<Mutex<S>> {
        self.engine.store()
    }

    /// Proposals dropped by the last analysis, with reasons
    pub fn rejected_proposals(&self) -> &[RejectedProposal] {
        &self.rejected
    }

    /// Diagnostics of the last completed analysis
    pub fn analysis_metadata(&self) -> Option<&AnalysisMetadata> {
        self.metadata.as_ref()
    }

    /// Handle for cancelling analysis from another task
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            token: Arc::clone(&self.cancel),
        }
    }

    /// Accept an uploaded file
    ///
    /// The type and size are checked before any extraction happens. A
    /// rejected upload leaves the session unchanged.
    pub fn upload(
        &mut self,
        file_name: &str,
        media_type: Option<&str>,
        bytes: &[u8],
    ) -> Result<FileKind, SessionError> {
        self.require(WorkflowStep::Upload, "select a file")?;

        let size_bytes = bytes.len() as u64;
        let kind = self
            .upload_policy
            .check(file_name, media_type, size_bytes)
            .map_err(|e| {
                warn!("Upload '{}' rejected: {}", file_name, e);
                e
            })?;
        let text = self.extractor.extract(file_name, media_type, bytes)?;

        info!("Accepted {} upload '{}' ({} bytes)", kind, file_name, size_bytes);
        self.state.dispatch(SessionEvent::FileSelected(UploadedFile {
            file_name: file_name.to_string(),
            kind,
            size_bytes,
            text,
        }))?;
        Ok(kind)
    }

    /// Link the session to an assignment
    pub fn link_assignment(&mut self, assignment_id: Option<String>) -> Result<(), SessionError> {
        self.state.dispatch(SessionEvent::AssignmentLinked(assignment_id))
    }

    /// Link the session to a task
    pub fn link_task(&mut self, task_id: Option<String>) -> Result<(), SessionError> {
        self.state.dispatch(SessionEvent::TaskLinked(task_id))
    }

    /// Analyze the upload against the project's documents
    ///
    /// Returns the step the session ended in: `Preview`, `NoMatches`, or
    /// `Upload` when cancelled. A failed analysis leaves the session in
    /// `Error` and returns the failure.
    pub async fn run_analysis(&mut self) -> Result<WorkflowStep, SessionError> {
        let uploaded = match self.state.uploaded_file() {
            Some(file) => UploadedDocument {
                file_name: file.file_name.clone(),
                text: file.text.clone(),
            },
            None => {
                return Err(SessionError::InvalidTransition {
                    step: self.state.current_step(),
                    event: "start analysis",
                })
            }
        };

        self.state.dispatch(SessionEvent::AnalysisStarted)?;
        let generation = self.state.generation();
        let token = self.fresh_token();
        self.rejected.clear();
        self.metadata = None;

        let listed = tokio::select! {
            _ = token.cancelled() => None,
            listed = list_candidates(self.engine.store(), self.project_id.clone()) => Some(listed),
        };
        let candidates = match listed {
            None => return self.on_cancelled(),
            Some(Ok(candidates)) => candidates,
            Some(Err(e)) => {
                error!("Could not list documents for '{}': {}", self.project_id, e);
                self.state.dispatch(SessionEvent::AnalysisFailed {
                    generation,
                    message: e.to_string(),
                })?;
                return Err(e);
            }
        };
        self.state.dispatch(SessionEvent::AnalysisProgress { generation, percent: 20 })?;

        info!(
            "Analyzing '{}' against {} documents",
            uploaded.file_name,
            candidates.len()
        );
        let request = AnalysisRequest { uploaded, candidates };
        let outcome = tokio::select! {
            _ = token.cancelled() => None,
            result = self.analyzer.analyze(request) => Some(result),
        };

        match outcome {
            None => self.on_cancelled(),
            Some(Ok(report)) => {
                self.state.dispatch(SessionEvent::AnalysisProgress { generation, percent: 90 })?;
                info!(
                    "Analysis by {} took {} ms over {} candidates",
                    report.metadata.model_name,
                    report.metadata.processing_time_ms,
                    report.metadata.candidates_considered
                );
                self.rejected = report.rejected;
                self.metadata = Some(report.metadata);
                self.state.dispatch(SessionEvent::AnalysisSucceeded {
                    generation,
                    result: report.result,
                })?;
                Ok(self.state.current_step())
            }
            Some(Err(e)) => {
                error!("Analysis failed: {}", e);
                self.state.dispatch(SessionEvent::AnalysisFailed {
                    generation,
                    message: e.to_string(),
                })?;
                Err(SessionError::Analysis(e))
            }
        }
    }

    /// Review board for the proposed changes
    pub fn review(&mut self) -> Result<&mut ReviewBoard, SessionError> {
        self.require(WorkflowStep::Preview, "review changes")?;
        Ok(self.state.board_mut())
    }

    /// Expand or collapse a document in the review view
    pub fn toggle_expanded(&mut self, document_id: &str) -> bool {
        self.state.toggle_expanded(document_id)
    }

    /// Write the approved changes back
    ///
    /// The session completes when at least one document was updated and
    /// moves to `Error` when nothing could be written. Either way the full
    /// report is returned.
    pub async fn run_apply(&mut self) -> Result<ApplyReport, SessionError> {
        self.require(WorkflowStep::Preview, "start apply")?;
        if self.state.board().count(ChangeStatus::Approved) == 0 {
            return Err(SessionError::NothingApproved);
        }

        self.state.dispatch(SessionEvent::ApplyStarted)?;
        let mut board = self.state.take_board();
        let report = self.engine.apply_board(&mut board).await;

        self.state.dispatch(SessionEvent::ApplyFinished {
            board,
            results: report.results.clone(),
            summary: report.summary(),
        })?;
        Ok(report)
    }

    /// Store the upload as a new document when nothing matched
    ///
    /// Uses the file name without its extension when no title is given.
    pub async fn file_separately(&mut self, title: Option<String>) -> Result<String, SessionError> {
        self.require(WorkflowStep::NoMatches, "file separately")?;
        let file = self
            .state
            .uploaded_file()
            .cloned()
            .ok_or(SessionError::InvalidTransition {
                step: WorkflowStep::NoMatches,
                event: "file separately",
            })?;

        let title = title.unwrap_or_else(|| {
            Path::new(&file.file_name)
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| file.file_name.clone())
        });
        let document = NewDocument {
            project_id: self.project_id.clone(),
            title,
            content: file.text,
        };

        let store = self.engine.store();
        let document_id = tokio::task::spawn_blocking(move || {
            let mut guard = store
                .lock()
                .map_err(|e| SessionError::Store(format!("store lock poisoned: {}", e)))?;
            guard
                .create_document(document)
                .map_err(|e| SessionError::Store(e.to_string()))
        })
        .await
        .map_err(|e| SessionError::Store(format!("store task failed: {}", e)))??;

        info!("Filed '{}' as new document {}", file.file_name, document_id);
        self.state.dispatch(SessionEvent::FiledSeparately {
            document_id: document_id.clone(),
        })?;
        Ok(document_id)
    }

    /// Start a fresh session
    pub fn reset(&mut self) -> Result<(), SessionError> {
        self.state.dispatch(SessionEvent::Reset)?;
        self.rejected.clear();
        self.metadata = None;
        Ok(())
    }

    fn require(&self, step: WorkflowStep, event: &'static str) -> Result<(), SessionError> {
        let current = self.state.current_step();
        if current != step {
            return Err(SessionError::InvalidTransition { step: current, event });
        }
        Ok(())
    }

    fn fresh_token(&self) -> CancellationToken {
        let mut current = self.cancel.lock().unwrap_or_else(PoisonError::into_inner);
        *current = CancellationToken::new();
        current.clone()
    }

    fn on_cancelled(&mut self) -> Result<WorkflowStep, SessionError> {
        info!("Analysis cancelled");
        self.state.dispatch(SessionEvent::Cancelled)?;
        Ok(self.state.current_step())
    }
}

async fn list_candidates<S>(
    store: Arc<Mutex<S>>,
    project_id: String,
) -> Result<Vec<CandidateDocument>, SessionError>
where
    S: DocumentStore + Send + 'static,
    S::Error: Display,
{
    tokio::task::spawn_blocking(move || {
        let guard = store
            .lock()
            .map_err(|e| SessionError::Store(format!("store lock poisoned: {}", e)))?;
        guard
            .list_documents(&project_id)
            .map_err(|e| SessionError::Store(e.to_string()))
    })
    .await
    .map_err(|e| SessionError::Store(format!("store task failed: {}", e)))?
}
