//! Gatekeeper configuration

use crate::GatekeeperError;
use revisor_domain::confidence::{DO_NOT_PROPOSE, STANDARD_PROPOSAL};
use serde::{Deserialize, Serialize};

/// Configuration for validation rules
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Reject changes whose quote does not appear in the uploaded text
    /// (compared with whitespace runs collapsed)
    pub verify_quote_in_upload: bool,

    /// Reject changes whose replacement equals the original text
    pub reject_noop_changes: bool,

    /// Minimum overall confidence; never lower than the do-not-propose threshold
    pub min_overall: f64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            verify_quote_in_upload: true,
            reject_noop_changes: true,
            min_overall: DO_NOT_PROPOSE,
        }
    }
}

impl ValidationConfig {
    /// Accept any quote the service returns, as long as it is present
    pub fn permissive() -> Self {
        Self {
            verify_quote_in_upload: false,
            ..Self::default()
        }
    }

    /// Only admit changes that would not be flagged for review
    pub fn strict() -> Self {
        Self {
            min_overall: STANDARD_PROPOSAL,
            ..Self::default()
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), GatekeeperError> {
        if !(DO_NOT_PROPOSE..=1.0).contains(&self.min_overall) {
            return Err(GatekeeperError::Config(format!(
                "min_overall {} must be within [{}, 1.0]",
                self.min_overall, DO_NOT_PROPOSE
            )));
        }
        Ok(())
    }
}
