// dbquery-core/src/error.rs

use crate::domain::error::DomainError;
use crate::infrastructure::error::InfrastructureError;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum DbQueryError {
    // --- DOMAIN ERRORS (arguments, options) ---
    #[error(transparent)]
    #[diagnostic(transparent)]
    Domain(#[from] DomainError),

    // --- INFRASTRUCTURE ERRORS (IO, drivers, config) ---
    #[error(transparent)]
    #[diagnostic(transparent)]
    Infrastructure(#[from] InfrastructureError),

    // --- EXECUTION ---
    #[error("Unable to execute query '{statement}': {reason}")]
    #[diagnostic(
        code(dbquery::execution::statement_failed),
        help("Query arguments: {arguments}. Remaining statements were not run.")
    )]
    StatementExecutionFailed {
        statement: String,
        arguments: String,
        reason: String,
    },

    #[error("Query '{statement}' reported affected rows but returned no result set")]
    #[diagnostic(
        code(dbquery::execution::fetch_failed),
        help("Disable `strict_fetch` to report an empty result instead.")
    )]
    ResultFetchFailed { statement: String },

    #[error("Internal Error: {0}")]
    InternalError(String),
}

// Manual implementation to avoid duplicate enum variant but keep ergonomics
impl From<std::io::Error> for DbQueryError {
    fn from(err: std::io::Error) -> Self {
        DbQueryError::Infrastructure(InfrastructureError::Io(err))
    }
}
