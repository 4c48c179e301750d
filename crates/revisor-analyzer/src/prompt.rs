//! Prompt construction for content analysis

use revisor_domain::CandidateDocument;

/// Builds the analysis prompt
pub struct PromptBuilder {
    uploaded_text: String,
    file_name: String,
    candidates: Vec<CandidateDocument>,
    max_document_chars: usize,
}

impl PromptBuilder {
    /// Create a new prompt builder for an uploaded document
    pub fn new(uploaded_text: String, file_name: String) -> Self {
        Self {
            uploaded_text,
            file_name,
            candidates: Vec::new(),
            max_document_chars: usize::MAX,
        }
    }

    /// Add the existing documents the upload is compared against
    pub fn with_candidates(mut self, candidates: Vec<CandidateDocument>, max_document_chars: usize) -> Self {
        self.candidates = candidates;
        self.max_document_chars = max_document_chars;
        self
    }

    /// Build the complete analysis prompt
    pub fn build(&self) -> String {
        let mut prompt = String::new();

        // 1. Instructions
        prompt.push_str(ANALYSIS_INSTRUCTIONS);
        prompt.push_str("\n\n");

        // 2. The uploaded document
        prompt.push_str(&format!("Uploaded document: {}\n", self.file_name));
        prompt.push_str("---\n");
        prompt.push_str(&self.uploaded_text);
        prompt.push_str("\n---\n\n");

        // 3. Existing documents
        prompt.push_str(&format!("Existing documents ({}):\n\n", self.candidates.len()));
        for doc in &self.candidates {
            let (content, truncated) = truncate_chars(&doc.content, self.max_document_chars);
            prompt.push_str(&format!("[document_id: {}]\nTitle: {}\n", doc.id, doc.title));
            prompt.push_str("---\n");
            prompt.push_str(content);
            if truncated {
                prompt.push_str("\n[... truncated]");
            }
            prompt.push_str("\n---\n\n");
        }

        // 4. Output format reminder
        prompt.push_str(OUTPUT_FORMAT_REMINDER);

        prompt
    }
}

/// Cut `text` to at most `max` characters on a char boundary
fn truncate_chars(text: &str, max: usize) -> (&str, bool) {
    match text.char_indices().nth(max) {
        Some((cut, _)) => (&text[..cut], true),
        None => (text, false),
    }
}

const ANALYSIS_INSTRUCTIONS: &str = r#"You compare a newly uploaded reference document against existing documents and propose surgical text edits to the existing documents.

First, analyze the uploaded document:
- primary_subject: its domain, specific area, and stated scope
- explicit_facts: facts it states outright, each with the exact quote that states it
- out_of_scope: topics it explicitly does not cover
- stated_boundaries: limits it sets for itself

Then, for every existing document that the uploaded document contradicts or updates, propose edits.

Rules:
- Only propose an edit when a verbatim quote from the uploaded document directly supports it
- source_quote must be copied exactly from the uploaded document
- original_text must be copied exactly from the existing document, and be as short as possible while still unique
- start_index is the byte offset of original_text in the existing document, if known
- Replace only what the evidence changes; keep surrounding wording, tone, and formatting
- Never edit topics the uploaded document marks out of scope
- Never propose edits based on inference, implication, or general knowledge
- Score each edit with four values in [0, 1]:
  - subject_match: how exactly the edited text is about the uploaded document's subject
  - factual_alignment: how directly the quote states the new text
  - scope_containment: how well the edit stays inside the uploaded document's stated scope
  - change_minimality: how small the edit is relative to the document
- match_reason is one of: exact_subject_match, related_topic, possibly_affected
- List in non_impact the nearby content you deliberately left unchanged"#;

const OUTPUT_FORMAT_REMINDER: &str = r#"Output format (a single JSON object only, no additional text):
{
  "content_analysis": {
    "primary_subject": {"domain": "...", "specific_area": "...", "scope": "..."},
    "explicit_facts": [
      {"statement": "...", "confidence": 0.9, "source_location": "...", "verbatim_quote": "..."}
    ],
    "out_of_scope": ["..."],
    "stated_boundaries": ["..."]
  },
  "proposed_changes": [
    {
      "document_id": "...",
      "section_name": "...",
      "page_number": null,
      "original_text": "exact text from the existing document",
      "proposed_text": "replacement text",
      "start_index": 0,
      "evidence": {
        "source_quote": "exact text from the uploaded document",
        "source_location": "...",
        "match_reason": "exact_subject_match",
        "confidence": {
          "subject_match": 0.9,
          "factual_alignment": 0.9,
          "scope_containment": 0.9,
          "change_minimality": 0.9
        }
      },
      "scope_justification": {
        "within_primary_subject": true,
        "within_specific_area": true,
        "within_stated_scope": true,
        "crosses_feature_boundary": false,
        "requires_user_confirmation": false
      },
      "non_impact": ["..."]
    }
  ]
}

Return an empty proposed_changes array if nothing in the existing documents needs to change."#;

/// JSON schema passed to providers that support constrained output
pub const RESPONSE_SCHEMA: &str = r#"{
  "type": "object",
  "required": ["content_analysis", "proposed_changes"],
  "properties": {
    "content_analysis": {
      "type": "object",
      "properties": {
        "primary_subject": {
          "type": "object",
          "properties": {
            "domain": {"type": "string"},
            "specific_area": {"type": "string"},
            "scope": {"type": "string"}
          }
        },
        "explicit_facts": {
          "type": "array",
          "items": {
            "type": "object",
            "required": ["statement", "verbatim_quote"],
            "properties": {
              "statement": {"type": "string"},
              "confidence": {"type": "number"},
              "source_location": {"type": "string"},
              "verbatim_quote": {"type": "string"}
            }
          }
        },
        "out_of_scope": {"type": "array", "items": {"type": "string"}},
        "stated_boundaries": {"type": "array", "items": {"type": "string"}}
      }
    },
    "proposed_changes": {
      "type": "array",
      "items": {
        "type": "object",
        "required": ["document_id", "original_text", "proposed_text", "evidence"],
        "properties": {
          "document_id": {"type": "string"},
          "section_name": {"type": "string"},
          "page_number": {"type": ["integer", "null"]},
          "original_text": {"type": "string"},
          "proposed_text": {"type": "string"},
          "start_index": {"type": ["integer", "null"]},
          "evidence": {
            "type": "object",
            "required": ["source_quote", "match_reason", "confidence"],
            "properties": {
              "source_quote": {"type": "string"},
              "source_location": {"type": "string"},
              "match_reason": {"enum": ["exact_subject_match", "related_topic", "possibly_affected"]},
              "confidence": {
                "type": "object",
                "required": ["subject_match", "factual_alignment", "scope_containment"],
                "properties": {
                  "subject_match": {"type": "number"},
                  "factual_alignment": {"type": "number"},
                  "scope_containment": {"type": "number"},
                  "change_minimality": {"type": "number"},
                  "overall": {"type": "number"}
                }
              }
            }
          },
          "scope_justification": {
            "type": "object",
            "properties": {
              "within_primary_subject": {"type": "boolean"},
              "within_specific_area": {"type": "boolean"},
              "within_stated_scope": {"type": "boolean"},
              "crosses_feature_boundary": {"type": "boolean"},
              "requires_user_confirmation": {"type": "boolean"}
            }
          },
          "non_impact": {"type": "array", "items": {"type": "string"}}
        }
      }
    }
  }
}"#;

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: &str, content: &str) -> CandidateDocument {
        CandidateDocument {
            id: id.to_string(),
            title: format!("Title {}", id),
            content: content.to_string(),
        }
    }

    #[test]
    fn test_prompt_contains_upload_and_candidates() {
        let prompt = PromptBuilder::new("rollout will begin March 1".to_string(), "memo.md".to_string())
            .with_candidates(vec![candidate("doc-1", "Launch on February 15"), candidate("doc-2", "FAQ")], 1000)
            .build();

        assert!(prompt.contains("Uploaded document: memo.md"));
        assert!(prompt.contains("rollout will begin March 1"));
        assert!(prompt.contains("[document_id: doc-1]"));
        assert!(prompt.contains("Title: Title doc-2"));
        assert!(prompt.contains("Existing documents (2)"));
        assert!(!prompt.contains("[... truncated]"));
    }

    #[test]
    fn test_candidate_content_truncated_on_char_boundary() {
        let prompt = PromptBuilder::new(String::new(), "u.txt".to_string())
            .with_candidates(vec![candidate("doc-1", "ééééé")], 3)
            .build();

        assert!(prompt.contains("ééé\n[... truncated]"));
        assert!(!prompt.contains("éééé"));
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("abc", 5), ("abc", false));
        assert_eq!(truncate_chars("abc", 3), ("abc", false));
        assert_eq!(truncate_chars("abcd", 3), ("abc", true));
    }

    #[test]
    fn test_schema_is_valid_json() {
        let schema: serde_json::Value = serde_json::from_str(RESPONSE_SCHEMA).unwrap();
        assert_eq!(schema["required"][1], "proposed_changes");
    }
}
