//! Core Apply Engine implementation

use crate::{ApplyConfig, ApplyError, ApplyReport};
use revisor_domain::diff::{changed_chars, diff};
use revisor_domain::traits::{DocumentStore, UpdateOutcome};
use revisor_domain::{
    ApplyFailure, ApplyResult, ChangeId, ChangeStatus, DocumentUpdate, DocumentVersion,
    ProposedChange, ReviewBoard, StoredDocument, VersionEntry,
};
use std::sync::{Arc, Mutex};
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

/// Current timestamp in seconds since Unix epoch
fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Writes approved changes back into their documents
///
/// Documents are processed concurrently up to `max_concurrent_documents`.
/// Within a document, changes are applied one after another against the
/// live content, and the document is written once with a new version.
///
/// # Examples
///
/// ```no_run
/// use revisor_apply::{ApplyConfig, ApplyEngine};
/// use revisor_domain::ReviewBoard;
/// use revisor_store::SqliteStore;
///
/// # async fn example(mut board: ReviewBoard) -> Result<(), Box<dyn std::error::Error>> {
/// let store = SqliteStore::new("revisor.db")?;
/// let engine = ApplyEngine::new(store, ApplyConfig::default())?;
///
/// let report = engine.apply_board(&mut board).await;
/// println!("{}", report.summary());
/// # Ok(())
/// # }
/// ```
pub struct ApplyEngine<S>
where
    S: DocumentStore,
{
    store: Arc<Mutex<S>>,
    config: ApplyConfig,
}

impl<S> ApplyEngine<S>
where
    S: DocumentStore + Send + 'static,
    S::Error: std::fmt::Display,
{
    /// Create an engine that owns its store
    pub fn new(store: S, config: ApplyConfig) -> Result<Self, ApplyError> {
        Self::with_shared_store(Arc::new(Mutex::new(store)), config)
    }

    /// Create an engine over a store shared with other components
    pub fn with_shared_store(store: Arc<Mutex<S>>, config: ApplyConfig) -> Result<Self, ApplyError> {
        config.validate().map_err(ApplyError::Config)?;
        Ok(Self { store, config })
    }

    /// Handle to the underlying store
    pub fn store(&self) -> Arc<Mutex<S>> {
        Arc::clone(&self.store)
    }

    /// Active configuration
    pub fn config(&self) -> &ApplyConfig {
        &self.config
    }

    /// Apply the board's approved changes and mark the written ones applied
    pub async fn apply_board(&self, board: &mut ReviewBoard) -> ApplyReport {
        let approved: Vec<ProposedChange> = board
            .approved_by_document()
            .into_iter()
            .flat_map(|(_, changes)| changes)
            .collect();

        let report = self.apply(approved).await;

        for result in report.results.iter().filter(|r| r.success) {
            if let Err(e) = board.mark_applied(result.change_id) {
                warn!("Could not mark change {} applied: {}", result.change_id, e);
            }
        }
        report
    }

    /// Apply changes, returning one result per change
    ///
    /// Changes that are not `approved` fail without touching their document.
    /// A failure never stops other changes or documents from being attempted.
    pub async fn apply(&self, changes: Vec<ProposedChange>) -> ApplyReport {
        let start = Instant::now();
        let mut results = Vec::with_capacity(changes.len());

        let mut groups: Vec<(String, Vec<ProposedChange>)> = Vec::new();
        for change in changes {
            if change.status() != ChangeStatus::Approved {
                results.push(ApplyResult::failed(
                    change.document_id.clone(),
                    change.id,
                    ApplyFailure::NotApproved(change.status()),
                ));
                continue;
            }
            match groups.iter_mut().find(|(doc, _)| *doc == change.document_id) {
                Some((_, list)) => list.push(change),
                None => groups.push((change.document_id.clone(), vec![change])),
            }
        }

        info!(
            "Applying {} changes across {} documents",
            groups.iter().map(|(_, c)| c.len()).sum::<usize>(),
            groups.len()
        );

        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_documents));
        let mut handles = Vec::with_capacity(groups.len());

        for (document_id, doc_changes) in groups {
            let change_ids: Vec<ChangeId> = doc_changes.iter().map(|c| c.id).collect();
            let permit = match Arc::clone(&semaphore).acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    let failure = ApplyFailure::Persistence(format!("apply scheduler closed: {}", e));
                    results.extend(fail_all(&document_id, &change_ids, failure));
                    continue;
                }
            };

            let store = Arc::clone(&self.store);
            let threshold = self.config.major_change_threshold;
            let task_document_id = document_id.clone();
            let handle = tokio::task::spawn_blocking(move || {
                let _permit = permit;
                apply_document(&store, &task_document_id, &doc_changes, threshold)
            });
            handles.push((document_id, change_ids, handle));
        }

        for (document_id, change_ids, handle) in handles {
            match handle.await {
                Ok(doc_results) => results.extend(doc_results),
                Err(e) => {
                    let failure = ApplyFailure::Persistence(format!("apply task failed: {}", e));
                    results.extend(fail_all(&document_id, &change_ids, failure));
                }
            }
        }

        let mut report = ApplyReport::new(results);
        report.elapsed_ms = start.elapsed().as_millis() as u64;

        info!(
            "Apply complete: {} of {} changes applied",
            report.applied_count(),
            report.total()
        );
        report
    }
}

/// Apply one document's changes in order and write the result once
fn apply_document<S>(
    store: &Mutex<S>,
    document_id: &str,
    changes: &[ProposedChange],
    major_change_threshold: f64,
) -> Vec<ApplyResult>
where
    S: DocumentStore,
    S::Error: std::fmt::Display,
{
    let ids: Vec<ChangeId> = changes.iter().map(|c| c.id).collect();

    let fetched = match store.lock() {
        Ok(store) => store
            .get_document(document_id)
            .map_err(|e| ApplyFailure::StoreUnavailable(e.to_string())),
        Err(e) => Err(ApplyFailure::StoreUnavailable(format!("store lock poisoned: {}", e))),
    };
    let document = match fetched {
        Ok(Some(document)) => document,
        Ok(None) => {
            warn!("Document '{}' not found", document_id);
            return fail_all(document_id, &ids, ApplyFailure::DocumentNotFound(document_id.to_string()));
        }
        Err(failure) => {
            warn!("Could not read document '{}': {}", document_id, failure);
            return fail_all(document_id, &ids, failure);
        }
    };

    let edit = splice(&document.content, changes);

    if edit.applied.is_empty() {
        warn!("No change applicable to '{}'", document_id);
        return collect(document_id, changes, &edit.outcomes, None);
    }

    let Some(new_version) = next_version(&document, edit.changed_chars, major_change_threshold) else {
        warn!("Version {} of '{}' cannot be incremented", document.version, document_id);
        let failure = ApplyFailure::Persistence(format!("version {} cannot be incremented", document.version));
        let outcomes = fail_applied(&edit.outcomes, failure);
        return collect(document_id, changes, &outcomes, None);
    };
    let update = DocumentUpdate {
        content: edit.content,
        version: new_version,
        version_history: extend_history(&document, edit.applied.len()),
    };

    let written = match store.lock() {
        Ok(mut store) => store
            .update_document(document_id, document.version, update)
            .map_err(|e| ApplyFailure::Persistence(e.to_string())),
        Err(e) => Err(ApplyFailure::Persistence(format!("store lock poisoned: {}", e))),
    };

    match written {
        Ok(UpdateOutcome::Updated) => {
            info!(
                "Document '{}' updated {} -> {} ({} changes)",
                document_id,
                document.version,
                new_version,
                edit.applied.len()
            );
            collect(document_id, changes, &edit.outcomes, Some(new_version))
        }
        Ok(UpdateOutcome::VersionConflict { current }) => {
            warn!(
                "Version conflict on '{}': read {}, store has {}",
                document_id, document.version, current
            );
            let failure = ApplyFailure::VersionConflict {
                expected: document.version,
                current,
            };
            let outcomes = fail_applied(&edit.outcomes, failure);
            collect(document_id, changes, &outcomes, None)
        }
        Err(failure) => {
            warn!("Could not write '{}': {}", document_id, failure);
            let outcomes = fail_applied(&edit.outcomes, failure);
            collect(document_id, changes, &outcomes, None)
        }
    }
}

/// Content after splicing a document's changes, with per-change outcomes
#[derive(Debug)]
struct Splice {
    content: String,
    /// `(start, end, replacement_len)` of applied changes, in recorded coordinates
    applied: Vec<(usize, usize, usize)>,
    outcomes: Vec<Result<(), ApplyFailure>>,
    changed_chars: usize,
}

/// Substitute each change's range in order
///
/// Recorded ranges refer to the content as read. Each range is shifted by
/// the length differences of earlier substitutions that end before it; a
/// range overlapping an earlier substitution, or one that no longer holds
/// the original text, is stale.
fn splice(original: &str, changes: &[ProposedChange]) -> Splice {
    let mut content = original.to_string();
    let mut applied: Vec<(usize, usize, usize)> = Vec::new();
    let mut outcomes = Vec::with_capacity(changes.len());
    let mut changed = 0;

    for change in changes {
        let (start, end) = (change.start_index, change.end_index);
        let stale = ApplyFailure::StaleRange { start, end };

        if end < start || applied.iter().any(|&(s, e, _)| s < end && start < e) {
            debug!("Change {} overlaps an earlier substitution", change.id);
            outcomes.push(Err(stale));
            continue;
        }

        let shift: isize = applied
            .iter()
            .filter(|&&(_, e, _)| e <= start)
            .map(|&(s, e, len)| len as isize - (e - s) as isize)
            .sum();
        let mapped = start as isize + shift;
        if mapped < 0 {
            outcomes.push(Err(stale));
            continue;
        }
        let mapped = mapped as usize;
        let mapped_end = mapped + (end - start);

        if content.get(mapped..mapped_end) != Some(change.original_text.as_str()) {
            debug!("Change {} no longer matches at {}..{}", change.id, mapped, mapped_end);
            outcomes.push(Err(stale));
            continue;
        }

        let replacement = change.replacement_text();
        content.replace_range(mapped..mapped_end, replacement);
        changed += changed_chars(&diff(&change.original_text, replacement));
        applied.push((start, end, replacement.len()));
        outcomes.push(Ok(()));
    }

    Splice {
        content,
        applied,
        outcomes,
        changed_chars: changed,
    }
}

/// Minor bump by default; major when the change share exceeds the threshold
fn next_version(document: &StoredDocument, changed: usize, threshold: f64) -> Option<DocumentVersion> {
    let prior_len = document.content.chars().count();
    if prior_len == 0 || changed as f64 / prior_len as f64 > threshold {
        document.version.next_major()
    } else {
        document.version.next_minor()
    }
}

fn extend_history(document: &StoredDocument, applied: usize) -> Vec<VersionEntry> {
    let mut history = document.version_history.clone();
    history.push(VersionEntry {
        version: document.version,
        content: document.content.clone(),
        replaced_at: current_timestamp(),
        summary: format!(
            "Applied {} reviewed change{}",
            applied,
            if applied == 1 { "" } else { "s" }
        ),
    });
    history
}

fn fail_applied(
    outcomes: &[Result<(), ApplyFailure>],
    failure: ApplyFailure,
) -> Vec<Result<(), ApplyFailure>> {
    outcomes
        .iter()
        .map(|outcome| match outcome {
            Ok(()) => Err(failure.clone()),
            Err(earlier) => Err(earlier.clone()),
        })
        .collect()
}

fn collect(
    document_id: &str,
    changes: &[ProposedChange],
    outcomes: &[Result<(), ApplyFailure>],
    new_version: Option<DocumentVersion>,
) -> Vec<ApplyResult> {
    changes
        .iter()
        .zip(outcomes)
        .map(|(change, outcome)| match (outcome, new_version) {
            (Ok(()), Some(version)) => ApplyResult::applied(document_id, change.id, version),
            (Err(failure), _) => ApplyResult::failed(document_id, change.id, failure.clone()),
            (Ok(()), None) => ApplyResult::failed(
                document_id,
                change.id,
                ApplyFailure::Persistence("document was not written".to_string()),
            ),
        })
        .collect()
}

fn fail_all(document_id: &str, ids: &[ChangeId], failure: ApplyFailure) -> Vec<ApplyResult> {
    ids.iter()
        .map(|id| ApplyResult::failed(document_id, *id, failure.clone()))
        .collect()
}
