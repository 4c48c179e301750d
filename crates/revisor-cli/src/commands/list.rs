//! List command implementation.

use crate::error::{CliError, Result};
use crate::output::Formatter;
use revisor_domain::traits::DocumentStore;
use revisor_store::SqliteStore;

/// Execute the list command.
pub fn execute_list(store: &SqliteStore, project_id: &str, formatter: &Formatter) -> Result<()> {
    let mut documents = Vec::new();
    for candidate in store.list_documents(project_id)? {
        let document = store
            .get_document(&candidate.id)?
            .ok_or_else(|| CliError::NotFound(candidate.id.clone()))?;
        documents.push(document);
    }

    println!("{}", formatter.format_documents(&documents)?);
    Ok(())
}
