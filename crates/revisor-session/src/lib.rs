//! Revisor Session Workflow
//!
//! Owns the state of one upload-through-apply session and sequences the
//! other components.
//!
//! # Workflow
//!
//! ```text
//! upload ─▶ analyzing ─▶ preview ─▶ applying ─▶ complete
//!              │   │                    │
//!              │   ├─▶ no_matches ─▶ (file separately) ─▶ complete
//!              │   └─▶ error ◀──────────┘
//!              └─(cancel)─▶ upload
//! ```
//!
//! - [`SessionController`] drives the steps: it calls the analyzer exactly
//!   once per analyzing phase and the apply engine once per applying phase
//! - [`DocumentControlState`] is a plain reducer over [`SessionEvent`]s;
//!   late events from a cancelled analysis are ignored
//! - Uploads are checked by an [`UploadPolicy`] and turned into text by a
//!   [`ContentExtractor`](revisor_domain::traits::ContentExtractor)
//!
//! # Configuration
//!
//! ```toml
//! [analyzer]
//! analysis_timeout_secs = 120
//!
//! [validation]
//! min_overall = 0.30
//!
//! [apply]
//! max_concurrent_documents = 4
//!
//! [upload]
//! max_size_bytes = 52428800
//! allowed_kinds = ["plain_text", "markdown", "json", "pdf"]
//! ```

#![warn(missing_docs)]

mod config;
mod controller;
mod error;
mod extract;
mod state;
mod upload;


pub use config::RevisorConfig;
pub use controller::{CancelHandle, SessionController};
pub use error::SessionError;
pub use extract::{ExtractionError, PlainTextExtractor};
pub use state::{DocumentControlState, SessionEvent, UploadedFile, WorkflowStep};
pub use upload::{FileKind, UploadError, UploadPolicy, DEFAULT_MAX_UPLOAD_BYTES};

pub use revisor_analyzer::{AnalysisMetadata, RejectedProposal};
