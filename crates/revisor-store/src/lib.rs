//! Revisor Storage Layer
//!
//! Implements the DocumentStore trait using SQLite.
//!
//! # Architecture
//!
//! - `documents` holds the current content and version of each managed document
//! - `version_history` holds prior states, appended on every content update
//! - Updates are optimistic: the caller states the version it read, and the
//!   write only happens if the store still holds that version
//!
//! # Examples
//!
//! ```no_run
//! use revisor_store::SqliteStore;
//!
//! let store = SqliteStore::new(":memory:").unwrap();
//! // Store is now ready for document operations
//! ```

#![warn(missing_docs)]

use revisor_domain::traits::{DocumentStore, UpdateOutcome};
use revisor_domain::{
    CandidateDocument, DocumentUpdate, DocumentVersion, NewDocument, StoredDocument, VersionEntry,
};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Document not found
    #[error("Document not found: {0}")]
    NotFound(String),

    /// Invalid data format
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// SQLite-based implementation of DocumentStore
///
/// # Thread Safety
///
/// SQLite connections are not thread-safe. Share a store across tasks behind
/// a `Mutex`, or give each thread its own SqliteStore instance.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Create a new SqliteStore with the given database path
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let mut store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize the database schema
    fn initialize_schema(&mut self) -> Result<(), StoreError> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        self.conn.execute_batch(include_str!("schema.sql"))?;
        Ok(())
    }

    /// Number of stored documents in a project
    pub fn count_documents(&self, project_id: &str) -> Result<usize, StoreError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM documents WHERE project_id = ?1",
            params![project_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Insert a document under a caller-chosen id at version `1.0`
    ///
    /// Used when importing documents whose ids are owned by a host system.
    pub fn insert_document(&mut self, id: &str, document: NewDocument) -> Result<(), StoreError> {
        let now = now_secs();
        self.conn.execute(
            "INSERT INTO documents (id, project_id, title, content, version, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
            params![
                id,
                &document.project_id,
                &document.title,
                &document.content,
                DocumentVersion::initial().to_string(),
                now,
            ],
        )?;
        Ok(())
    }

    fn parse_version(raw: &str) -> Result<DocumentVersion, StoreError> {
        DocumentVersion::parse(raw).map_err(StoreError::InvalidData)
    }

    fn load_history(&self, id: &str) -> Result<Vec<VersionEntry>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT version, content, replaced_at, summary
             FROM version_history WHERE document_id = ?1 ORDER BY seq ASC",
        )?;

        let rows = stmt
            .query_map(params![id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(version, content, replaced_at, summary)| {
                Ok(VersionEntry {
                    version: Self::parse_version(&version)?,
                    content,
                    replaced_at: replaced_at as u64,
                    summary,
                })
            })
            .collect()
    }
}

impl DocumentStore for SqliteStore {
    type Error = StoreError;

    fn get_document(&self, id: &str) -> Result<Option<StoredDocument>, Self::Error> {
        let row = self
            .conn
            .query_row(
                "SELECT id, project_id, title, content, version FROM documents WHERE id = ?1",
                params![id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                },
            )
            .optional()?;

        let Some((id, project_id, title, content, version)) = row else {
            return Ok(None);
        };

        let version_history = self.load_history(&id)?;
        Ok(Some(StoredDocument {
            id,
            project_id,
            title,
            content,
            version: Self::parse_version(&version)?,
            version_history,
        }))
    }

    fn update_document(
        &mut self,
        id: &str,
        expected: DocumentVersion,
        update: DocumentUpdate,
    ) -> Result<UpdateOutcome, Self::Error> {
        let tx = self.conn.transaction()?;

        let current: Option<String> = tx
            .query_row(
                "SELECT version FROM documents WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;
        let current = match current {
            Some(raw) => Self::parse_version(&raw)?,
            None => return Err(StoreError::NotFound(id.to_string())),
        };

        if current != expected {
            return Ok(UpdateOutcome::VersionConflict { current });
        }

        tx.execute(
            "UPDATE documents SET content = ?1, version = ?2, updated_at = ?3 WHERE id = ?4",
            params![&update.content, update.version.to_string(), now_secs(), id],
        )?;

        tx.execute(
            "DELETE FROM version_history WHERE document_id = ?1",
            params![id],
        )?;
        for (seq, entry) in update.version_history.iter().enumerate() {
            tx.execute(
                "INSERT INTO version_history (document_id, seq, version, content, replaced_at, summary)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    id,
                    seq as i64,
                    entry.version.to_string(),
                    &entry.content,
                    entry.replaced_at as i64,
                    &entry.summary,
                ],
            )?;
        }

        tx.commit()?;
        Ok(UpdateOutcome::Updated)
    }

    fn list_documents(&self, project_id: &str) -> Result<Vec<CandidateDocument>, Self::Error> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, content FROM documents WHERE project_id = ?1 ORDER BY created_at, id",
        )?;

        let documents = stmt
            .query_map(params![project_id], |row| {
                Ok(CandidateDocument {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    content: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(documents)
    }

    fn create_document(&mut self, document: NewDocument) -> Result<String, Self::Error> {
        let id = uuid::Uuid::now_v7().to_string();
        self.insert_document(&id, document)?;
        Ok(id)
    }
}

fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_doc(title: &str, content: &str) -> NewDocument {
        NewDocument {
            project_id: "launch".to_string(),
            title: title.to_string(),
            content: content.to_string(),
        }
    }

    #[test]
    fn test_create_and_get() {
        let mut store = SqliteStore::new(":memory:").unwrap();
        let id = store.create_document(new_doc("Launch Plan", "rollout")).unwrap();

        let doc = store.get_document(&id).unwrap().unwrap();
        assert_eq!(doc.title, "Launch Plan");
        assert_eq!(doc.version, DocumentVersion::initial());
        assert!(doc.version_history.is_empty());
    }

    #[test]
    fn test_get_missing() {
        let store = SqliteStore::new(":memory:").unwrap();
        assert!(store.get_document("nope").unwrap().is_none());
    }

    #[test]
    fn test_update_missing_document() {
        let mut store = SqliteStore::new(":memory:").unwrap();
        let update = DocumentUpdate {
            content: "x".to_string(),
            version: DocumentVersion::new(1, 1),
            version_history: Vec::new(),
        };
        let result = store.update_document("nope", DocumentVersion::initial(), update);
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_list_scoped_to_project() {
        let mut store = SqliteStore::new(":memory:").unwrap();
        store.create_document(new_doc("A", "a")).unwrap();
        store
            .create_document(NewDocument {
                project_id: "other".to_string(),
                ..new_doc("B", "b")
            })
            .unwrap();

        let docs = store.list_documents("launch").unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].title, "A");
        assert_eq!(store.count_documents("other").unwrap(), 1);
    }
}
