// reelstar-core/src/error.rs

use crate::domain::error::DomainError;
use crate::infrastructure::error::{DatabaseError, InfrastructureError};
use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum EtlError {
    // --- DOMAIN ERRORS (schema contract, configuration) ---
    #[error(transparent)]
    #[diagnostic(transparent)]
    Domain(#[from] DomainError),

    // --- INFRASTRUCTURE ERRORS (source, database, IO, parsing) ---
    #[error(transparent)]
    #[diagnostic(transparent)]
    Infrastructure(#[from] InfrastructureError),

    // --- GENERIC / APPLICATION ERRORS ---
    #[error("Internal Error: {0}")]
    #[diagnostic(code(reelstar::internal))]
    InternalError(String),
}

// Manual implementations for `?` shortcuts from the adapters
impl From<std::io::Error> for EtlError {
    fn from(err: std::io::Error) -> Self {
        EtlError::Infrastructure(InfrastructureError::Io(err))
    }
}

impl From<duckdb::Error> for EtlError {
    fn from(err: duckdb::Error) -> Self {
        EtlError::Infrastructure(InfrastructureError::Persistence(DatabaseError::DuckDB(err)))
    }
}

impl From<DatabaseError> for EtlError {
    fn from(err: DatabaseError) -> Self {
        EtlError::Infrastructure(InfrastructureError::Persistence(err))
    }
}
