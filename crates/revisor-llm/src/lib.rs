//! Revisor LLM Provider Layer
//!
//! Implementations of the content-analysis collaborator: the `LlmProvider`
//! trait from `revisor-domain`.
//!
//! # Providers
//!
//! - `MockProvider`: Deterministic mock for testing, with optional latency and failure
//! - `OllamaProvider`: Local Ollama API integration with JSON-schema output
//!
//! # Examples
//!
//! ```
//! use revisor_llm::MockProvider;
//! use revisor_domain::traits::LlmProvider;
//!
//! let provider = MockProvider::new(r#"{"proposed_changes": []}"#);
//! let result = provider.generate("analyze this").unwrap();
//! assert!(result.contains("proposed_changes"));
//! ```

#![warn(missing_docs)]

pub mod ollama;

use revisor_domain::traits::LlmProvider as LlmProviderTrait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;

pub use ollama::OllamaProvider;

/// Errors that can occur during LLM operations
#[derive(Error, Debug)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Invalid response from LLM
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

/// Mock LLM provider for deterministic testing
///
/// Returns pre-configured responses without making any network calls.
///
/// # Examples
///
/// ```
/// use revisor_llm::MockProvider;
/// use revisor_domain::traits::LlmProvider;
///
/// // Simple fixed response
/// let provider = MockProvider::new("Fixed response");
/// assert_eq!(provider.generate("any prompt").unwrap(), "Fixed response");
///
/// // Service outage
/// let provider = MockProvider::failing("connection refused");
/// assert!(provider.generate("any prompt").is_err());
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_response: Result<String, String>,
    call_count: Arc<Mutex<usize>>,
    last_schema: Arc<Mutex<Option<String>>>,
    latency: Option<Duration>,
}

impl MockProvider {
    /// Create a new MockProvider with a fixed response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: Ok(response.into()),
            call_count: Arc::new(Mutex::new(0)),
            last_schema: Arc::new(Mutex::new(None)),
            latency: None,
        }
    }

    /// Create a MockProvider that fails every call
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            default_response: Err(message.into()),
            ..Self::new("")
        }
    }

    /// Block for `latency` before answering (simulates a slow service)
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Get the number of times generate was called
    pub fn call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    /// Schema passed to the most recent structured call
    pub fn last_schema(&self) -> Option<String> {
        self.last_schema.lock().unwrap().clone()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

impl LlmProviderTrait for MockProvider {
    type Error = LlmError;

    fn generate(&self, _prompt: &str) -> Result<String, Self::Error> {
        *self.call_count.lock().unwrap() += 1;

        if let Some(latency) = self.latency {
            std::thread::sleep(latency);
        }

        self.default_response.clone().map_err(LlmError::Communication)
    }

    fn generate_structured(&self, prompt: &str, schema: &str) -> Result<String, Self::Error> {
        *self.last_schema.lock().unwrap() = Some(schema.to_string());
        self.generate(prompt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_provider_default() {
        let provider = MockProvider::new("Test response");
        assert_eq!(provider.generate("any prompt").unwrap(), "Test response");
    }

    #[test]
    fn test_mock_provider_same_answer_for_every_prompt() {
        let provider = MockProvider::default();
        assert_eq!(provider.generate("hello").unwrap(), "Default mock response");
        assert_eq!(provider.generate("other").unwrap(), "Default mock response");
    }

    #[test]
    fn test_mock_provider_call_count() {
        let provider = MockProvider::new("test");
        assert_eq!(provider.call_count(), 0);

        provider.generate("prompt1").unwrap();
        provider.generate("prompt2").unwrap();
        assert_eq!(provider.call_count(), 2);
    }

    #[test]
    fn test_mock_provider_failing() {
        let provider = MockProvider::failing("down");
        let result = provider.generate("anything");
        assert!(matches!(result, Err(LlmError::Communication(msg)) if msg == "down"));
        assert_eq!(provider.call_count(), 1);
    }

    #[test]
    fn test_mock_provider_records_schema() {
        let provider = MockProvider::new("{}");
        provider.generate_structured("prompt", r#"{"type":"object"}"#).unwrap();
        assert_eq!(provider.last_schema().as_deref(), Some(r#"{"type":"object"}"#));
    }

    #[test]
    fn test_mock_provider_clone_shares_state() {
        let provider1 = MockProvider::new("test");
        let provider2 = provider1.clone();

        provider1.generate("test").unwrap();
        assert_eq!(provider2.call_count(), 1);
    }
}
