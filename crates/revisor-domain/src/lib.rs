//! Revisor Domain Layer
//!
//! This crate contains the core data model and the pure, stateless parts of the
//! document revision pipeline. It has almost no external dependencies and
//! defines the concepts, value objects, and trait interfaces that all other
//! layers depend upon.
//!
//! ## Key Concepts
//!
//! - **ProposedChange**: One candidate text substitution in one managed document,
//!   backed by an evidence quote and a confidence breakdown
//! - **Confidence Breakdown**: Four weighted sub-scores combined into one overall
//!   score that gates and labels proposals
//! - **Word Diff**: A typed same/removed/added segmentation used for review
//!   rendering and as the minimality signal
//! - **Review Board**: The per-change lifecycle (pending → approved/rejected → applied)
//! - **Document Version**: `major.minor` numbering with a linear history
//!
//! ## Architecture
//!
//! ```text
//! Upload → Analyzer → ReviewBoard (+ diff, confidence) → ApplyEngine → Store
//! ```
//!
//! Infrastructure (LLM, storage) lives in other crates behind the traits in
//! [`traits`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analysis;
pub mod change;
pub mod confidence;
pub mod diff;
pub mod document;
pub mod outcome;
pub mod review;
pub mod traits;
pub mod version;

// Re-exports for convenience
pub use analysis::{
    AffectedDocument, AnalysisResult, AnalysisSummary, ContentAnalysis, ExplicitFact,
    PrimarySubject, UploadedDocument,
};
pub use change::{
    ChangeEvidence, ChangeId, ChangeProposal, ChangeStatus, MatchReason, ProposedChange,
    ScopeJustification,
};
pub use confidence::{ConfidenceBreakdown, ConfidenceLevel};
pub use diff::{diff, DiffKind, DiffSegment};
pub use document::{CandidateDocument, DocumentUpdate, NewDocument, StoredDocument};
pub use outcome::{ApplyFailure, ApplyResult};
pub use review::{ReviewBoard, ReviewError};
pub use version::{DocumentVersion, VersionEntry};
