//! Add command implementation.

use crate::cli::{AddArgs, CliFormat};
use crate::error::{CliError, Result};
use crate::output::Formatter;
use revisor_domain::traits::{ContentExtractor, DocumentStore};
use revisor_domain::NewDocument;
use revisor_session::PlainTextExtractor;
use revisor_store::SqliteStore;
use std::fs;

/// Execute the add command.
pub fn execute_add(
    args: AddArgs,
    store: &mut SqliteStore,
    project_id: &str,
    formatter: &Formatter,
) -> Result<String> {
    let file_name = args
        .file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| CliError::InvalidInput(format!("Not a file: {}", args.file.display())))?;
    let bytes = fs::read(&args.file)?;
    let content = PlainTextExtractor
        .extract(&file_name, None, &bytes)
        .map_err(|e| CliError::InvalidInput(e.to_string()))?;

    let title = args.title.unwrap_or_else(|| {
        args.file
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| file_name.clone())
    });
    let document = NewDocument {
        project_id: project_id.to_string(),
        title: title.clone(),
        content,
    };

    let id = match args.id {
        Some(id) => {
            store.insert_document(&id, document)?;
            id
        }
        None => store.create_document(document)?,
    };

    if formatter.format() == CliFormat::Quiet {
        println!("{}", id);
    } else {
        println!("{}", formatter.success(&format!("Added '{}' as {} (v1.0)", title, id)));
    }
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_uses_file_stem_as_title() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("launch-plan.md");
        fs::write(&path, "# Launch\nThe rollout will begin February 15.").unwrap();

        let mut store = SqliteStore::new(":memory:").unwrap();
        let formatter = Formatter::new(CliFormat::Quiet, false);
        let args = AddArgs {
            file: path,
            title: None,
            id: Some("launch-plan".to_string()),
        };

        let id = execute_add(args, &mut store, "launch", &formatter).unwrap();
        assert_eq!(id, "launch-plan");
        let doc = store.get_document("launch-plan").unwrap().unwrap();
        assert_eq!(doc.title, "launch-plan");
        assert_eq!(doc.project_id, "launch");
    }

    #[test]
    fn test_add_rejects_unsupported_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logo.png");
        fs::write(&path, [0x89, 0x50, 0x4e, 0x47]).unwrap();

        let mut store = SqliteStore::new(":memory:").unwrap();
        let formatter = Formatter::new(CliFormat::Quiet, false);
        let args = AddArgs { file: path, title: None, id: None };

        let result = execute_add(args, &mut store, "launch", &formatter);
        assert!(matches!(result, Err(CliError::InvalidInput(_))));
        assert_eq!(store.count_documents("launch").unwrap(), 0);
    }
}
