// reelstar/src/cli.rs
//
// Single source of truth for all CLI definitions (Clap structs).

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "reelstar")]
#[command(about = "Turns a flat media catalog into a star schema in DuckDB", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Raise the default log level to debug (RUST_LOG still wins)
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Where the project lives and which file configures it.
#[derive(Args, Debug, Clone)]
pub struct ProjectArgs {
    /// Project directory; relative paths in the configuration resolve against it
    #[arg(long, default_value = ".")]
    pub project_dir: PathBuf,

    /// Explicit project file (default: reelstar.yaml or reelstar_project.yaml)
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// DuckDB database file, or ":memory:" (overrides REELSTAR_DATABASE_PATH)
    #[arg(long)]
    pub database: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 🚀 Runs the pipeline (CSV -> clean -> normalize -> explode -> star schema -> DuckDB)
    Run {
        #[command(flatten)]
        project: ProjectArgs,

        /// Source CSV file (overrides REELSTAR_SOURCE_PATH)
        #[arg(long, short)]
        source: Option<String>,
    },

    /// 🔍 Shows schema and sample rows of the loaded tables
    Inspect {
        #[command(flatten)]
        project: ProjectArgs,

        /// Only this table (default: the three star-schema tables)
        #[arg(long, short)]
        table: Option<String>,

        /// Number of sample rows
        #[arg(long, short, default_value_t = 5)]
        limit: usize,
    },

    /// ✅ Re-checks keys and referential integrity of a loaded database
    Validate {
        #[command(flatten)]
        project: ProjectArgs,
    },
}
