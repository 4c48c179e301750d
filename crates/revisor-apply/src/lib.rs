//! Revisor Apply Engine
//!
//! Writes approved changes back into their documents as new versions.
//!
//! # Overview
//!
//! - Approved changes are grouped by target document
//! - Different documents are written concurrently, bounded by
//!   `max_concurrent_documents`
//! - Within one document, changes are spliced in order against the content
//!   read from the store, and the document is written once, guarded by an
//!   optimistic version check
//! - Each change gets its own `ApplyResult`; nothing short-circuits the batch
//!
//! # Versioning
//!
//! | Changed share of prior length | Next version |
//! |-------------------------------|--------------|
//! | at most `major_change_threshold` (50%) | `major.minor+1` |
//! | above it, or an empty document | `major+1.0` |
//!
//! The prior content and version are appended to the document's history.
//!
//! # Configuration
//!
//! ```toml
//! [apply]
//! max_concurrent_documents = 4
//! major_change_threshold = 0.5
//! ```

#![warn(missing_docs)]

mod config;
mod engine;
mod error;
mod report;

pub use config::ApplyConfig;
pub use engine::ApplyEngine;
pub use error::ApplyError;
pub use report::{ApplyReport, DocumentOutcome};
