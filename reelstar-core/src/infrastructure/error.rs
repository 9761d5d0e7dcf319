// reelstar-core/src/infrastructure/error.rs

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum DatabaseError {
    #[error("DuckDB Engine Error: {0}")]
    #[diagnostic(
        code(reelstar::infra::database::duckdb),
        help("Check that the database file is writable and not locked by another process.")
    )]
    DuckDB(#[from] duckdb::Error),

    #[error("DuckDB connection lock poisoned")]
    #[diagnostic(code(reelstar::infra::database::poisoned))]
    LockPoisoned,
}

#[derive(Error, Debug, Diagnostic)]
pub enum InfrastructureError {
    // --- RECORD SOURCE ---
    #[error("Source unavailable: {path} does not exist")]
    #[diagnostic(
        code(reelstar::infra::source_unavailable),
        help("Place the CSV file at that path, set source.path in reelstar.yaml, or pass --source.")
    )]
    SourceUnavailable { path: String },

    #[error("Malformed source {path}: {reason}")]
    #[diagnostic(
        code(reelstar::infra::malformed_source),
        help("The source must be a delimited UTF-8 file with one header row and a constant column count.")
    )]
    MalformedSource { path: String, reason: String },

    // --- DATABASE (Abstracted) ---
    #[error("Persistence failure: {0}")]
    #[diagnostic(transparent)]
    Persistence(#[from] DatabaseError),

    // --- FILESYSTEM (IO) ---
    #[error("File System Error: {0}")]
    #[diagnostic(
        code(reelstar::infra::io),
        help("Check file permissions or path validity.")
    )]
    Io(#[from] std::io::Error),

    // --- CONFIG / YAML ---
    #[error("YAML Parsing Error: {0}")]
    #[diagnostic(
        code(reelstar::infra::yaml),
        help("Check your YAML syntax (indentation, types).")
    )]
    YamlError(#[from] serde_yaml::Error),

    #[error("Project configuration not found at '{0}'")]
    #[diagnostic(
        code(reelstar::infra::config_missing),
        help("Create the file or drop --config to use the built-in defaults.")
    )]
    ConfigNotFound(String),

    #[error("Serialization Error: {0}")]
    #[diagnostic(code(reelstar::infra::json))]
    Json(#[from] serde_json::Error),
}

// Manual implementation for shortcuts (e.g. `?` operator on duckdb calls)
impl From<duckdb::Error> for InfrastructureError {
    fn from(err: duckdb::Error) -> Self {
        InfrastructureError::Persistence(DatabaseError::DuckDB(err))
    }
}
