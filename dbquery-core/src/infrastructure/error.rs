// dbquery-core/src/infrastructure/error.rs

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum DatabaseError {
    #[error("PostgreSQL Error: {0}")]
    #[diagnostic(
        code(dbquery::infra::database::postgres),
        help("An error was returned by the PostgreSQL server or driver.")
    )]
    Postgres(#[from] sqlx::Error),

    #[cfg(feature = "impala")]
    #[error("ODBC Error: {0}")]
    #[diagnostic(
        code(dbquery::infra::database::odbc),
        help("An error was returned by the ODBC driver manager or the Impala driver.")
    )]
    Odbc(#[from] odbc_api::Error),
}

#[derive(Error, Debug, Diagnostic)]
pub enum InfrastructureError {
    // --- DATABASE (Abstracted) ---
    #[error(transparent)]
    #[diagnostic(transparent)]
    Database(#[from] DatabaseError),

    #[error("Unable to connect to {engine} database: {reason}")]
    #[diagnostic(
        code(dbquery::infra::connection),
        help("Check host, port, credentials and that the server accepts connections.")
    )]
    ConnectionFailed { engine: String, reason: String },

    #[error("{engine} support is not available in this build")]
    #[diagnostic(
        code(dbquery::infra::driver_unavailable),
        help("Rebuild with `--features impala` and install unixODBC plus the Impala ODBC driver.")
    )]
    DriverUnavailable { engine: String },

    // --- QUERY SOURCES ---
    #[error("Unable to find '{path}' in given path: {source}")]
    #[diagnostic(
        code(dbquery::infra::source_unavailable),
        help("The query ends with '.sql' so it is read as a file; check the path.")
    )]
    SourceUnavailable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    // --- REPLAY LOG ---
    #[error("Unable to use query log '{path}': {source}")]
    #[diagnostic(
        code(dbquery::infra::log_unavailable),
        help("The query log must be readable and writable; no statement was run without it.")
    )]
    LogUnavailable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    // --- FILESYSTEM (IO) ---
    #[error("File System Error: {0}")]
    #[diagnostic(
        code(dbquery::infra::io),
        help("Check file permissions or path validity.")
    )]
    Io(#[from] std::io::Error),

    // --- CONFIG / YAML ---
    #[error("YAML Parsing Error: {0}")]
    #[diagnostic(
        code(dbquery::infra::yaml),
        help("Check your YAML syntax (indentation, types).")
    )]
    YamlError(#[from] serde_yaml::Error),

    #[error("Configuration Error: {0}")]
    #[diagnostic(code(dbquery::infra::config))]
    ConfigError(String),

    #[error("Task file not found at '{0}'")]
    #[diagnostic(code(dbquery::infra::config_missing))]
    ConfigNotFound(String),
}

// Shortcut for `?` on sqlx calls
impl From<sqlx::Error> for InfrastructureError {
    fn from(err: sqlx::Error) -> Self {
        InfrastructureError::Database(DatabaseError::Postgres(err))
    }
}

#[cfg(feature = "impala")]
impl From<odbc_api::Error> for InfrastructureError {
    fn from(err: odbc_api::Error) -> Self {
        InfrastructureError::Database(DatabaseError::Odbc(err))
    }
}
