//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Revisor - propose and apply evidence-backed revisions to managed documents.
#[derive(Debug, Parser)]
#[command(name = "revisor")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true, default_value = "table")]
    pub format: CliFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path (defaults to ~/.revisor/config.toml)
    #[arg(short, long, global = true, env = "REVISOR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Document database path (defaults to ~/.revisor/revisor.db)
    #[arg(long, global = true, env = "REVISOR_DB")]
    pub db: Option<PathBuf>,

    /// Project whose documents are used
    #[arg(short, long, global = true, env = "REVISOR_PROJECT", default_value = "default")]
    pub project: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (IDs only)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Import a file as a managed document
    Add(AddArgs),

    /// List the project's documents
    List,

    /// Show a document's version history
    History(HistoryArgs),

    /// Analyze an upload against the project's documents
    Review(ReviewArgs),
}

/// Arguments for the add command.
#[derive(Debug, Parser)]
pub struct AddArgs {
    /// File to import
    pub file: PathBuf,

    /// Document title (defaults to the file name)
    #[arg(short, long)]
    pub title: Option<String>,

    /// Use this id instead of generating one
    #[arg(long)]
    pub id: Option<String>,
}

/// Arguments for the history command.
#[derive(Debug, Parser)]
pub struct HistoryArgs {
    /// Document id
    pub id: String,

    /// Print the content of every prior version
    #[arg(long)]
    pub show_content: bool,
}

/// Arguments for the review command.
#[derive(Debug, Parser)]
pub struct ReviewArgs {
    /// Uploaded file to analyze
    pub file: PathBuf,

    /// Media type of the file (detected from the extension when omitted)
    #[arg(long)]
    pub media_type: Option<String>,

    /// Ollama endpoint
    #[arg(long, env = "OLLAMA_HOST", default_value = revisor_llm::ollama::DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// Model used for analysis
    #[arg(short, long, default_value = "llama3.1")]
    pub model: String,

    /// Approve every change eligible for one-click approval
    #[arg(long)]
    pub approve_eligible: bool,

    /// Approve every change that is not flagged
    #[arg(long, conflicts_with = "approve_eligible")]
    pub approve_all: bool,

    /// Write approved changes back
    #[arg(long)]
    pub apply: bool,

    /// File the upload as a new document when nothing matches
    #[arg(long)]
    pub file_separately: bool,

    /// Also list proposals that were dropped, with reasons
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_review() {
        let cli = Cli::try_parse_from([
            "revisor",
            "--project",
            "launch",
            "review",
            "memo.txt",
            "--approve-eligible",
            "--apply",
        ])
        .unwrap();

        assert_eq!(cli.project, "launch");
        assert_eq!(cli.format, CliFormat::Table);
        match cli.command {
            Command::Review(args) => {
                assert_eq!(args.file, PathBuf::from("memo.txt"));
                assert!(args.approve_eligible);
                assert!(args.apply);
                assert!(!args.file_separately);
                assert_eq!(args.model, "llama3.1");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_approve_flags_conflict() {
        let result = Cli::try_parse_from([
            "revisor",
            "review",
            "memo.txt",
            "--approve-eligible",
            "--approve-all",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_add_with_global_after_subcommand() {
        let cli = Cli::try_parse_from(["revisor", "add", "plan.md", "-t", "Launch Plan", "-f", "json"])
            .unwrap();
        assert_eq!(cli.format, CliFormat::Json);
        match cli.command {
            Command::Add(args) => assert_eq!(args.title.as_deref(), Some("Launch Plan")),
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
