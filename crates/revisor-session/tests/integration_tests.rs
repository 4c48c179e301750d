//! Integration tests for revisor-session
//!
//! A file-backed store and a config file on disk, driven through two
//! consecutive sessions.

use revisor_domain::traits::DocumentStore;
use revisor_domain::{DocumentVersion, NewDocument};
use revisor_llm::MockProvider;
use revisor_session::{RevisorConfig, SessionController, WorkflowStep};
use revisor_store::SqliteStore;
use serde_json::json;

const HANDBOOK: &str = "Support hours are 9 to 5. Escalations go to the on-call lead.";

fn response(original: &str, proposed: &str, quote: &str) -> String {
    json!({
        "content_analysis": {
            "primary_subject": {"domain": "support", "specific_area": "hours", "scope": "team"},
            "explicit_facts": [],
            "out_of_scope": [],
            "stated_boundaries": []
        },
        "proposed_changes": [{
            "document_id": "handbook",
            "section_name": "Hours",
            "original_text": original,
            "proposed_text": proposed,
            "evidence": {
                "source_quote": quote,
                "source_location": "line 1",
                "match_reason": "exact_subject_match",
                "confidence": {"subject_match": 0.9, "factual_alignment": 0.9, "scope_containment": 0.9}
            },
            "scope_justification": {
                "within_primary_subject": true,
                "within_specific_area": true,
                "within_stated_scope": true
            }
        }]
    })
    .to_string()
}

#[tokio::test]
async fn test_two_sessions_build_history() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("revisor.db");
    let config_path = dir.path().join("revisor.toml");
    std::fs::write(
        &config_path,
        "[apply]\nmax_concurrent_documents = 1\n\n[upload]\nallowed_kinds = [\"plain_text\"]\n",
    )
    .unwrap();
    let config = RevisorConfig::from_file(&config_path).unwrap();

    SqliteStore::new(&db)
        .unwrap()
        .insert_document(
            "handbook",
            NewDocument {
                project_id: "support".to_string(),
                title: "Handbook".to_string(),
                content: HANDBOOK.to_string(),
            },
        )
        .unwrap();

    // First session: hours change
    let llm = MockProvider::new(response("9 to 5", "8 to 6", "support hours are now 8 to 6"));
    let mut session =
        SessionController::from_config(llm, SqliteStore::new(&db).unwrap(), "support", &config).unwrap();
    session
        .upload("update.txt", None, b"From Monday, support hours are now 8 to 6.")
        .unwrap();
    assert_eq!(session.run_analysis().await.unwrap(), WorkflowStep::Preview);
    session.review().unwrap().approve_all();
    assert_eq!(session.run_apply().await.unwrap().applied_count(), 1);

    // Markdown is not allowed by this config
    session.reset().unwrap();
    assert!(session.upload("notes.md", None, b"# Notes").is_err());
    drop(session);

    // Second session against the updated content
    let llm = MockProvider::new(response(
        "the on-call lead",
        "the duty manager",
        "escalations now go to the duty manager",
    ));
    let mut session =
        SessionController::from_config(llm, SqliteStore::new(&db).unwrap(), "support", &config).unwrap();
    session
        .upload("escalation.txt", None, b"Policy change: escalations now go to the duty manager.")
        .unwrap();
    assert_eq!(session.run_analysis().await.unwrap(), WorkflowStep::Preview);
    session.review().unwrap().approve_all();
    session.run_apply().await.unwrap();
    assert_eq!(session.state().current_step(), WorkflowStep::Complete);

    let store = SqliteStore::new(&db).unwrap();
    let doc = store.get_document("handbook").unwrap().unwrap();
    assert_eq!(
        doc.content,
        "Support hours are 8 to 6. Escalations go to the duty manager."
    );
    assert_eq!(doc.version, DocumentVersion::new(1, 2));
    let history: Vec<String> = doc.version_history.iter().map(|e| e.version.to_string()).collect();
    assert_eq!(history, vec!["1.0", "1.1"]);
    assert_eq!(doc.version_history[0].content, HANDBOOK);
}
