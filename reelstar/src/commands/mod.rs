// reelstar/src/commands/mod.rs

pub mod inspect;
pub mod run;
pub mod validate;

use std::path::{Path, PathBuf};
use tracing::debug;

use reelstar_core::EtlError;
use reelstar_core::domain::project::{IN_MEMORY_DATABASE, PipelineConfig};
use reelstar_core::infrastructure::config::{ConfigOverrides, load_pipeline_config};

use crate::cli::ProjectArgs;

/// Paths given on the command line are relative to the working directory,
/// not to the project directory.
pub fn absolutize(path: &str) -> String {
    if path == IN_MEMORY_DATABASE {
        return path.to_string();
    }
    std::path::absolute(path)
        .unwrap_or_else(|_| PathBuf::from(path))
        .to_string_lossy()
        .into_owned()
}

pub fn load_config(
    project: &ProjectArgs,
    source: Option<&str>,
) -> Result<PipelineConfig, EtlError> {
    let overrides = ConfigOverrides {
        config_file: project.config.clone(),
        source: source.map(absolutize),
        database: project.database.as_deref().map(absolutize),
    };
    debug!(?overrides, "Command line overrides");
    load_pipeline_config(&project.project_dir, &overrides)
}

/// Prints the error and its remediation hint, then exits with status 1.
pub fn exit_with(headline: &str, err: &EtlError) -> ! {
    eprintln!("\n💥 {headline}: {err}");
    if let Some(help) = miette::Diagnostic::help(err) {
        eprintln!("   👉 {help}");
    }
    std::process::exit(1);
}

pub fn display_path(path: &Path) -> String {
    path.display().to_string()
}
