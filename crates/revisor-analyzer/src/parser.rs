//! Parse the analysis service's JSON into typed structures
//!
//! The top-level shape must be right or the whole response is rejected.
//! Individual proposals that fail to deserialize are dropped with a warning
//! and reported, leaving the rest of the response usable.

use crate::error::AnalyzerError;
use crate::types::RejectedProposal;
use revisor_domain::{ContentAnalysis, ExplicitFact, PrimarySubject, ScopeJustification};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

/// A response split into its typed parts
#[derive(Debug)]
pub(crate) struct ParsedResponse {
    pub analysis: ContentAnalysis,
    pub changes: Vec<WireChange>,
    pub malformed: Vec<RejectedProposal>,
}

impl ParsedResponse {
    /// Number of proposals present in the response, well-formed or not
    pub fn proposals_received(&self) -> usize {
        self.changes.len() + self.malformed.len()
    }
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    #[serde(default)]
    content_analysis: WireContentAnalysis,
    proposed_changes: Vec<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireContentAnalysis {
    primary_subject: WireSubject,
    explicit_facts: Vec<Value>,
    out_of_scope: Vec<String>,
    stated_boundaries: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireSubject {
    domain: String,
    specific_area: String,
    scope: String,
}

#[derive(Debug, Deserialize)]
struct WireFact {
    statement: String,
    #[serde(default)]
    confidence: f64,
    #[serde(default)]
    source_location: String,
    verbatim_quote: String,
}

/// One proposed edit as the service sent it
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WireChange {
    pub document_id: String,
    #[serde(default)]
    pub section_name: String,
    #[serde(default)]
    pub page_number: Option<u32>,
    pub original_text: String,
    pub proposed_text: String,
    #[serde(default)]
    pub start_index: Option<usize>,
    pub evidence: WireEvidence,
    #[serde(default)]
    pub scope_justification: WireScope,
    #[serde(default)]
    pub non_impact: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WireEvidence {
    pub source_quote: String,
    #[serde(default)]
    pub source_location: String,
    pub match_reason: String,
    pub confidence: WireConfidence,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WireConfidence {
    pub subject_match: f64,
    pub factual_alignment: f64,
    pub scope_containment: f64,
    // change_minimality is always computed locally from the diff
    #[serde(default)]
    pub overall: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct WireScope {
    within_primary_subject: bool,
    within_specific_area: bool,
    within_stated_scope: bool,
    crosses_feature_boundary: bool,
    requires_user_confirmation: bool,
}

impl From<WireScope> for ScopeJustification {
    fn from(scope: WireScope) -> Self {
        ScopeJustification {
            within_primary_subject: scope.within_primary_subject,
            within_specific_area: scope.within_specific_area,
            within_stated_scope: scope.within_stated_scope,
            crosses_feature_boundary: scope.crosses_feature_boundary,
            requires_user_confirmation: scope.requires_user_confirmation,
        }
    }
}

/// Parse the service response
pub(crate) fn parse_analysis_response(response: &str) -> Result<ParsedResponse, AnalyzerError> {
    // Services sometimes wrap JSON in markdown code blocks
    let json_str = extract_json(response)?;

    let wire: WireResponse = serde_json::from_str(json_str)
        .map_err(|e| AnalyzerError::InvalidFormat(format!("unexpected response shape: {}", e)))?;

    let mut explicit_facts = Vec::new();
    for (idx, value) in wire.content_analysis.explicit_facts.into_iter().enumerate() {
        match serde_json::from_value::<WireFact>(value) {
            Ok(fact) => explicit_facts.push(ExplicitFact {
                statement: fact.statement,
                confidence: if fact.confidence.is_finite() {
                    fact.confidence.clamp(0.0, 1.0)
                } else {
                    0.0
                },
                source_location: fact.source_location,
                verbatim_quote: fact.verbatim_quote,
            }),
            Err(e) => warn!("Failed to parse fact {}: {}", idx, e),
        }
    }

    let subject = wire.content_analysis.primary_subject;
    let analysis = ContentAnalysis {
        primary_subject: PrimarySubject {
            domain: subject.domain,
            specific_area: subject.specific_area,
            scope: subject.scope,
        },
        explicit_facts,
        out_of_scope: wire.content_analysis.out_of_scope,
        stated_boundaries: wire.content_analysis.stated_boundaries,
    };

    let mut changes = Vec::new();
    let mut malformed = Vec::new();
    for (idx, value) in wire.proposed_changes.into_iter().enumerate() {
        let text_field = |key: &str| {
            value
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        let document_id = text_field("document_id");
        let original_text = text_field("original_text");

        match serde_json::from_value::<WireChange>(value) {
            Ok(change) => changes.push(change),
            Err(e) => {
                warn!("Failed to parse proposed change {}: {}", idx, e);
                malformed.push(RejectedProposal {
                    document_id,
                    original_text,
                    reasons: vec![format!("malformed proposal: {}", e)],
                });
            }
        }
    }

    Ok(ParsedResponse {
        analysis,
        changes,
        malformed,
    })
}

/// Extract JSON from response, handling markdown code blocks and stray prose
fn extract_json(response: &str) -> Result<&str, AnalyzerError> {
    let trimmed = response.trim();

    if let Some(rest) = trimmed.strip_prefix("```") {
        // Skip the fence line (```json or ```) and the closing fence
        let body = match rest.find('\n') {
            Some(newline) => &rest[newline + 1..],
            None => return Err(AnalyzerError::InvalidFormat("Empty code block".to_string())),
        };
        let body = body.trim_end();
        return Ok(body.strip_suffix("```").unwrap_or(body).trim());
    }

    if trimmed.starts_with('{') {
        return Ok(trimmed);
    }

    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => Ok(&trimmed[start..=end]),
        _ => Err(AnalyzerError::InvalidFormat(
            "Response contains no JSON object".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"{
        "content_analysis": {
            "primary_subject": {"domain": "product launch", "specific_area": "schedule", "scope": "rollout dates"},
            "explicit_facts": [
                {"statement": "Rollout starts March 1", "confidence": 0.95, "source_location": "p1", "verbatim_quote": "rollout will begin March 1"}
            ],
            "out_of_scope": ["pricing"],
            "stated_boundaries": []
        },
        "proposed_changes": [
            {
                "document_id": "launch-plan",
                "section_name": "Schedule",
                "original_text": "February 15",
                "proposed_text": "March 1",
                "start_index": 36,
                "evidence": {
                    "source_quote": "rollout will begin March 1",
                    "source_location": "p1",
                    "match_reason": "exact_subject_match",
                    "confidence": {"subject_match": 0.95, "factual_alignment": 0.95, "scope_containment": 0.9, "overall": 0.93}
                },
                "scope_justification": {"within_primary_subject": true, "within_stated_scope": true},
                "non_impact": ["marketing dates"]
            }
        ]
    }"#;

    #[test]
    fn test_parse_valid_response() {
        let parsed = parse_analysis_response(VALID).unwrap();
        assert_eq!(parsed.analysis.primary_subject.domain, "product launch");
        assert_eq!(parsed.analysis.explicit_facts.len(), 1);
        assert_eq!(parsed.analysis.out_of_scope, vec!["pricing"]);
        assert_eq!(parsed.changes.len(), 1);
        assert!(parsed.malformed.is_empty());

        let change = &parsed.changes[0];
        assert_eq!(change.start_index, Some(36));
        assert_eq!(change.page_number, None);
        assert_eq!(change.evidence.confidence.overall, Some(0.93));
        let scope: ScopeJustification = change.scope_justification.clone().into();
        assert!(scope.within_primary_subject);
        assert!(!scope.within_specific_area);
    }

    #[test]
    fn test_parse_with_markdown_wrapper() {
        let wrapped = format!("```json\n{}\n```", VALID);
        let parsed = parse_analysis_response(&wrapped).unwrap();
        assert_eq!(parsed.changes.len(), 1);
    }

    #[test]
    fn test_parse_with_leading_prose() {
        let chatty = format!("Here is the analysis:\n{}\nLet me know!", VALID);
        let parsed = parse_analysis_response(&chatty).unwrap();
        assert_eq!(parsed.changes.len(), 1);
    }

    #[test]
    fn test_malformed_proposal_skipped() {
        let response = r#"{
            "proposed_changes": [
                {"document_id": "d1", "original_text": "x"},
                {
                    "document_id": "d2", "original_text": "a", "proposed_text": "b",
                    "evidence": {"source_quote": "q", "match_reason": "related_topic",
                                 "confidence": {"subject_match": 1, "factual_alignment": 1, "scope_containment": 1}}
                }
            ]
        }"#;
        let parsed = parse_analysis_response(response).unwrap();
        assert_eq!(parsed.changes.len(), 1);
        assert_eq!(parsed.changes[0].document_id, "d2");
        assert_eq!(parsed.malformed.len(), 1);
        assert_eq!(parsed.malformed[0].document_id, "d1");
        assert_eq!(parsed.proposals_received(), 2);
        assert_eq!(parsed.analysis, ContentAnalysis::default());
    }

    #[test]
    fn test_fact_confidence_clamped() {
        let response = r#"{
            "content_analysis": {"explicit_facts": [
                {"statement": "s", "confidence": 3.0, "verbatim_quote": "q"},
                {"statement": "no quote field"}
            ]},
            "proposed_changes": []
        }"#;
        let parsed = parse_analysis_response(response).unwrap();
        assert_eq!(parsed.analysis.explicit_facts.len(), 1);
        assert_eq!(parsed.analysis.explicit_facts[0].confidence, 1.0);
    }

    #[test]
    fn test_not_json() {
        let result = parse_analysis_response("I could not analyze this document.");
        assert!(matches!(result, Err(AnalyzerError::InvalidFormat(_))));
    }

    #[test]
    fn test_missing_change_list_is_fatal() {
        let result = parse_analysis_response(r#"{"content_analysis": {}}"#);
        assert!(matches!(result, Err(AnalyzerError::InvalidFormat(_))));
    }

    #[test]
    fn test_array_instead_of_object_is_fatal() {
        let result = parse_analysis_response("[]");
        assert!(matches!(result, Err(AnalyzerError::InvalidFormat(_))));
    }
}
