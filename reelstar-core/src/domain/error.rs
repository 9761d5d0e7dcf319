// reelstar-core/src/domain/error.rs

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum DomainError {
    #[error("Schema violation: source is missing field(s) {}", .missing.join(", "))]
    #[diagnostic(
        code(reelstar::domain::schema),
        help("The source header must contain the id, category and required fields declared in reelstar.yaml ({available})")
    )]
    SchemaViolation {
        missing: Vec<String>,
        available: String,
    },

    #[error("Invalid configuration: {0}")]
    #[diagnostic(
        code(reelstar::domain::config),
        help("Fix the offending entries in reelstar.yaml.")
    )]
    InvalidConfiguration(String),
}
