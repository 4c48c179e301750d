//! Review command implementation.

use crate::cli::{CliFormat, ReviewArgs};
use crate::error::{CliError, Result};
use crate::output::Formatter;
use revisor_llm::OllamaProvider;
use revisor_session::{RevisorConfig, SessionController, WorkflowStep};
use revisor_store::SqliteStore;
use std::fs;
use tracing::info;

/// Execute the review command.
///
/// Ctrl-C while the analysis runs cancels it and leaves every document
/// untouched.
pub async fn execute_review(
    args: ReviewArgs,
    store: SqliteStore,
    project_id: &str,
    config: &RevisorConfig,
    formatter: &Formatter,
) -> Result<()> {
    let file_name = args
        .file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| CliError::InvalidInput(format!("Not a file: {}", args.file.display())))?;
    let bytes = fs::read(&args.file)?;

    let llm = OllamaProvider::new(&args.endpoint, &args.model)
        .with_timeout(config.analyzer.analysis_timeout());
    let model = llm.model().to_string();
    let mut session =
        SessionController::from_config(llm, store, project_id, config)?.with_model_name(model);
    session.upload(&file_name, args.media_type.as_deref(), &bytes)?;

    let cancel = session.cancel_handle();
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });
    let step = session.run_analysis().await;
    watcher.abort();
    let step = step?;

    if args.verbose {
        if let Some(metadata) = session.analysis_metadata() {
            eprintln!(
                "{}",
                formatter.info(&format!(
                    "{}: {} proposal(s) over {} document(s) in {} ms",
                    metadata.model_name,
                    metadata.proposals_received,
                    metadata.candidates_considered,
                    metadata.processing_time_ms
                ))
            );
        }
        let dropped = formatter.format_rejected(session.rejected_proposals());
        if !dropped.is_empty() {
            eprintln!("{}", dropped);
        }
    }

    match step {
        WorkflowStep::Upload => {
            eprintln!("{}", formatter.warning("Analysis cancelled; nothing was changed"));
            return Ok(());
        }
        WorkflowStep::NoMatches => {
            if args.file_separately {
                let id = session.file_separately(None).await?;
                if formatter.format() == CliFormat::Quiet {
                    println!("{}", id);
                } else {
                    eprintln!("{}", formatter.success(&format!("Filed as new document {}", id)));
                }
            } else {
                eprintln!(
                    "{}",
                    formatter.info(
                        "No existing document needs changes. Use --file-separately to store the upload as a new document."
                    )
                );
            }
            return Ok(());
        }
        _ => {}
    }

    let documents = session.state().board().affected_documents();
    println!("{}", formatter.format_proposals(&documents)?);

    let board = session.review()?;
    let approved = if args.approve_eligible {
        board.approve_auto_eligible()
    } else if args.approve_all {
        board.approve_all()
    } else {
        0
    };
    info!("Approved {} change(s)", approved);

    if !args.apply {
        eprintln!(
            "{}",
            formatter.info(&format!(
                "{} change(s) approved; nothing written without --apply",
                approved
            ))
        );
        return Ok(());
    }
    if approved == 0 {
        eprintln!("{}", formatter.warning("No changes approved; nothing to apply"));
        return Ok(());
    }

    let report = session.run_apply().await?;
    println!("{}", formatter.format_report(&report)?);

    if session.state().current_step() == WorkflowStep::Error {
        return Err(CliError::ApplyFailed(
            session.state().error().unwrap_or("no document was updated").to_string(),
        ));
    }
    Ok(())
}
