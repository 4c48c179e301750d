//! History command implementation.

use crate::cli::HistoryArgs;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use revisor_domain::traits::DocumentStore;
use revisor_store::SqliteStore;

/// Execute the history command.
pub fn execute_history(args: HistoryArgs, store: &SqliteStore, formatter: &Formatter) -> Result<()> {
    let document = store
        .get_document(&args.id)?
        .ok_or_else(|| CliError::NotFound(args.id.clone()))?;

    println!("{}", formatter.format_history(&document, args.show_content)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::CliFormat;

    #[test]
    fn test_history_unknown_document() {
        let store = SqliteStore::new(":memory:").unwrap();
        let formatter = Formatter::new(CliFormat::Table, false);
        let args = HistoryArgs {
            id: "missing".to_string(),
            show_content: false,
        };
        assert!(matches!(
            execute_history(args, &store, &formatter),
            Err(CliError::NotFound(_))
        ));
    }
}
