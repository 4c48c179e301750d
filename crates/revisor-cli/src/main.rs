//! Revisor CLI - propose and apply evidence-backed document revisions.

use clap::Parser;
use revisor_cli::{commands, config, Cli, Command, Formatter};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let formatter = Formatter::new(cli.format, !cli.no_color);
    let mut store = config::open_store(cli.db.as_deref())?;

    match cli.command {
        Command::Add(args) => {
            commands::execute_add(args, &mut store, &cli.project, &formatter)?;
        }
        Command::List => {
            commands::execute_list(&store, &cli.project, &formatter)?;
        }
        Command::History(args) => {
            commands::execute_history(args, &store, &formatter)?;
        }
        Command::Review(args) => {
            let settings = config::load_config(cli.config.as_deref())?;
            commands::execute_review(args, store, &cli.project, &settings, &formatter).await?;
        }
    }

    Ok(())
}
