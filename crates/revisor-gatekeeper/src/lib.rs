//! Revisor Gatekeeper
//!
//! Validates proposed changes before they reach review.
//!
//! The Gatekeeper enforces the evidence-to-text mapping:
//! - Every change carries a non-empty evidence quote taken from the upload
//! - `original_text` exists verbatim in the target document at the recorded range
//! - No-op substitutions are dropped
//! - Changes scoring below the do-not-propose threshold are dropped
//!
//! Anything that fails is rejected rather than corrected.
//!
//! # Examples
//!
//! ```
//! use revisor_gatekeeper::locate;
//!
//! let range = locate("rollout will begin February 15", "February 15", None);
//! assert_eq!(range, Ok((19, 30)));
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod validator;

pub use config::ValidationConfig;
pub use error::GatekeeperError;
pub use validator::{
    locate, Gatekeeper, LocateError, RejectionReason, ValidationResult, ValidationStatus,
};
