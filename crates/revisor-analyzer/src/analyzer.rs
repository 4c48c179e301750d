//! Core Analyzer implementation

use crate::config::AnalyzerConfig;
use crate::error::AnalyzerError;
use crate::parser::{parse_analysis_response, WireChange};
use crate::prompt::{PromptBuilder, RESPONSE_SCHEMA};
use crate::types::{AnalysisMetadata, AnalysisReport, AnalysisRequest, RejectedProposal};
use revisor_domain::confidence::{change_minimality, verify_weights};
use revisor_domain::traits::LlmProvider;
use revisor_domain::{
    AnalysisResult, CandidateDocument, ChangeEvidence, ChangeProposal,
    ConfidenceBreakdown, ContentAnalysis, MatchReason, ProposedChange,
};
use revisor_gatekeeper::{locate, Gatekeeper, RejectionReason, ValidationStatus};
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Largest accepted gap between a service-reported overall score and the
/// recomputed one before it is logged
const OVERALL_TOLERANCE: f64 = 0.01;

/// The Analyzer turns an uploaded document into reviewable proposed changes
pub struct Analyzer<L>
where
    L: LlmProvider,
{
    llm_provider: Arc<L>,
    gatekeeper: Gatekeeper,
    config: AnalyzerConfig,
    model_name: String,
}

impl<L> Analyzer<L>
where
    L: LlmProvider + Send + Sync + 'static,
    L::Error: std::fmt::Display,
{
    /// Create a new Analyzer
    ///
    /// Fails if the confidence weights do not sum to one or either
    /// configuration is invalid.
    pub fn new(
        llm_provider: L,
        gatekeeper: Gatekeeper,
        config: AnalyzerConfig,
    ) -> Result<Self, AnalyzerError> {
        verify_weights().map_err(AnalyzerError::Config)?;
        config.validate().map_err(AnalyzerError::Config)?;
        gatekeeper
            .config()
            .validate()
            .map_err(|e| AnalyzerError::Config(e.to_string()))?;

        Ok(Self {
            llm_provider: Arc::new(llm_provider),
            gatekeeper,
            config,
            model_name: "llm".to_string(),
        })
    }

    /// Set the model name recorded in report metadata
    pub fn with_model_name(mut self, model_name: impl Into<String>) -> Self {
        self.model_name = model_name.into();
        self
    }

    /// Active configuration
    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Analyze an uploaded document against the candidate documents
    ///
    /// Service failures, timeouts, and malformed responses are errors.
    /// An empty change list is a normal report.
    pub async fn analyze(&self, request: AnalysisRequest) -> Result<AnalysisReport, AnalyzerError> {
        let start_time = Instant::now();
        let uploaded = request.uploaded;
        let mut candidates = request.candidates;

        if uploaded.text.len() > self.config.max_text_length {
            return Err(AnalyzerError::TextTooLong(
                uploaded.text.len(),
                self.config.max_text_length,
            ));
        }

        if candidates.len() > self.config.max_candidate_documents {
            warn!(
                "{} candidate documents exceed the limit; analyzing the first {}",
                candidates.len(),
                self.config.max_candidate_documents
            );
            candidates.truncate(self.config.max_candidate_documents);
        }

        info!(
            "Starting analysis of '{}' ({} chars) against {} documents",
            uploaded.file_name,
            uploaded.text.len(),
            candidates.len()
        );

        if candidates.is_empty() {
            info!("No candidate documents; skipping analysis call");
            let result = AnalysisResult::new(uploaded, ContentAnalysis::default(), &[]);
            return Ok(self.report(result, Vec::new(), 0, 0, start_time));
        }

        let prompt = PromptBuilder::new(uploaded.text.clone(), uploaded.file_name.clone())
            .with_candidates(candidates.clone(), self.config.max_document_chars)
            .build();

        debug!("Prompt length: {} chars", prompt.len());

        let response = timeout(self.config.analysis_timeout(), self.call_llm(prompt))
            .await
            .map_err(|_| AnalyzerError::Timeout(self.config.analysis_timeout_secs))??;

        debug!("Analysis response length: {} chars", response.len());

        let parsed = parse_analysis_response(&response)?;
        let proposals_received = parsed.proposals_received();

        let mut analysis = parsed.analysis;
        analysis.explicit_facts.retain(|fact| {
            match self.gatekeeper.validate_fact(fact, &uploaded.text) {
                Ok(()) => true,
                Err(reason) => {
                    warn!("Dropping fact '{}': {}", fact.statement, reason);
                    false
                }
            }
        });

        let mut rejected = parsed.malformed;
        let mut admitted = Vec::new();
        for wire in parsed.changes {
            match self.admit(wire, &candidates, &uploaded.text) {
                Ok(change) => admitted.push(change),
                Err(proposal) => {
                    warn!(
                        "Dropping proposal for '{}': {}",
                        proposal.document_id,
                        proposal.reasons.join("; ")
                    );
                    rejected.push(proposal);
                }
            }
        }

        let result = AnalysisResult::new(uploaded, analysis, &admitted);

        info!(
            "Analysis complete: {} changes across {} documents, {} rejected",
            result.summary.total_changes,
            result.summary.total_documents,
            rejected.len()
        );

        Ok(self.report(result, rejected, candidates.len(), proposals_received, start_time))
    }

    /// Turn one wire proposal into a pending change, or say why it is dropped
    fn admit(
        &self,
        wire: WireChange,
        candidates: &[CandidateDocument],
        uploaded_text: &str,
    ) -> Result<ProposedChange, RejectedProposal> {
        let Some(match_reason) = MatchReason::parse(&wire.evidence.match_reason) else {
            let reason = format!("unknown match_reason '{}'", wire.evidence.match_reason);
            return Err(rejected(&wire, vec![reason]));
        };

        let Some(target) = candidates.iter().find(|doc| doc.id == wire.document_id) else {
            let reason = RejectionReason::UnknownDocument(wire.document_id.clone());
            return Err(rejected(&wire, vec![reason.to_string()]));
        };

        let (start_index, end_index) = locate(&target.content, &wire.original_text, wire.start_index)
            .map_err(|e| rejected(&wire, vec![e.into_reason(&target.id).to_string()]))?;

        let reported = &wire.evidence.confidence;
        let minimality = change_minimality(
            &wire.original_text,
            &wire.proposed_text,
            target.content.chars().count(),
        );
        let confidence = ConfidenceBreakdown::score(
            reported.subject_match,
            reported.factual_alignment,
            reported.scope_containment,
            minimality,
        );
        if let Some(claimed) = reported.overall {
            if (claimed - confidence.overall()).abs() > OVERALL_TOLERANCE {
                debug!(
                    "Service overall {:.3} differs from recomputed {:.3} for '{}'",
                    claimed,
                    confidence.overall(),
                    wire.original_text
                );
            }
        }

        let change = ProposedChange::new(ChangeProposal {
            document_id: target.id.clone(),
            document_title: target.title.clone(),
            section_name: wire.section_name,
            page_number: wire.page_number,
            original_text: wire.original_text,
            proposed_text: wire.proposed_text,
            start_index,
            end_index,
            evidence: ChangeEvidence {
                source_quote: wire.evidence.source_quote,
                source_location: wire.evidence.source_location,
                match_reason,
                confidence,
            },
            scope_justification: wire.scope_justification.into(),
            non_impact: wire.non_impact,
        });

        let validation = self.gatekeeper.validate(&change, Some(target), uploaded_text);
        if validation.status != ValidationStatus::Accepted {
            return Err(RejectedProposal {
                document_id: change.document_id,
                original_text: change.original_text,
                reasons: validation.reasons.iter().map(ToString::to_string).collect(),
            });
        }

        debug!(
            "Admitted change {} for '{}' ({}, {:.2})",
            change.id,
            change.document_id,
            validation.level.label(),
            change.overall()
        );
        Ok(change)
    }

    fn report(
        &self,
        result: AnalysisResult,
        rejected: Vec<RejectedProposal>,
        candidates_considered: usize,
        proposals_received: usize,
        start_time: Instant,
    ) -> AnalysisReport {
        let metadata = AnalysisMetadata {
            timestamp: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
            model_name: self.model_name.clone(),
            candidates_considered,
            proposals_received,
            processing_time_ms: start_time.elapsed().as_millis() as u64,
        };

        AnalysisReport {
            result,
            rejected,
            metadata,
        }
    }

    /// Call the analysis service
    async fn call_llm(&self, prompt: String) -> Result<String, AnalyzerError> {
        let llm = Arc::clone(&self.llm_provider);

        // LlmProvider is synchronous
        tokio::task::spawn_blocking(move || {
            llm.generate_structured(&prompt, RESPONSE_SCHEMA)
                .map_err(|e| AnalyzerError::Llm(e.to_string()))
        })
        .await
        .map_err(|e| AnalyzerError::Llm(format!("Task join error: {}", e)))?
    }
}

fn rejected(wire: &WireChange, reasons: Vec<String>) -> RejectedProposal {
    RejectedProposal {
        document_id: wire.document_id.clone(),
        original_text: wire.original_text.clone(),
        reasons,
    }
}
