// reelstar/src/main.rs

mod cli;
mod commands;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env first so RUST_LOG and REELSTAR_* can come from it
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // 1. Setup Logging (Tracing): RUST_LOG wins, --verbose raises the default
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .context("Invalid log filter")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match cli.command {
        // --- USE CASE: RUN PIPELINE ---
        Commands::Run { project, source } => commands::run::execute(project, source).await?,

        // --- USE CASE: INSPECT TABLES ---
        Commands::Inspect {
            project,
            table,
            limit,
        } => commands::inspect::execute(project, table, limit).await?,

        // --- USE CASE: VALIDATE LOADED DATABASE ---
        Commands::Validate { project } => commands::validate::execute(project).await?,
    }

    Ok(())
}
