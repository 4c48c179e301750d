//! Revisor Analyzer
//!
//! Compares an uploaded document against existing documents through the
//! content-analysis service and turns its answer into reviewable changes.
//!
//! # Architecture
//!
//! ```text
//! Upload text + candidates → Prompt → LLM → Parser → Scoring → Gatekeeper → AnalysisResult
//! ```
//!
//! # Key Features
//!
//! - **Typed boundary**: the service's JSON is parsed into typed structures
//!   immediately; malformed proposals never enter the pipeline
//! - **Local scoring**: the overall confidence is recomputed from the
//!   sub-scores, with change minimality taken from the word diff
//! - **Grounding**: every admitted change has a quote found in the upload and
//!   original text found verbatim, at a single location, in its target
//! - **Diagnostics**: dropped proposals are returned with their reasons
//!
//! # Example Usage
//!
//! ```no_run
//! use revisor_analyzer::{Analyzer, AnalyzerConfig, AnalysisRequest};
//! use revisor_domain::UploadedDocument;
//! use revisor_gatekeeper::Gatekeeper;
//! use revisor_llm::MockProvider;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let llm = MockProvider::new(r#"{"proposed_changes": []}"#);
//! let analyzer = Analyzer::new(llm, Gatekeeper::default_config(), AnalyzerConfig::default())?;
//!
//! let request = AnalysisRequest {
//!     uploaded: UploadedDocument {
//!         file_name: "memo.txt".to_string(),
//!         text: "The rollout will begin March 1.".to_string(),
//!     },
//!     candidates: Vec::new(),
//! };
//!
//! let report = analyzer.analyze(request).await?;
//! println!("{} changes proposed", report.result.summary.total_changes);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod analyzer;
mod config;
mod error;
mod parser;
mod prompt;
mod types;


pub use analyzer::Analyzer;
pub use config::AnalyzerConfig;
pub use error::AnalyzerError;
pub use prompt::RESPONSE_SCHEMA;
pub use types::{AnalysisMetadata, AnalysisReport, AnalysisRequest, RejectedProposal};
