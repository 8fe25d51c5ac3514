// dbquery-core/src/ports/connector.rs

// What the application needs from a database, without knowing which driver
// sits behind it. PostgreSQL (sqlx) and Impala (ODBC) plug in here, and tests
// plug in DuckDB or scripted fakes.

use async_trait::async_trait;

use crate::domain::report::StatementOutcome;
use crate::domain::task::TaskConfig;
use crate::error::DbQueryError;

/// One exclusively owned connection.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Opens the unit of work that `commit`/`rollback` end.
    async fn begin(&self) -> Result<(), DbQueryError>;

    /// Submits one fully bound statement.
    async fn execute(&self, sql: &str) -> Result<StatementOutcome, DbQueryError>;

    async fn commit(&self) -> Result<(), DbQueryError>;

    async fn rollback(&self) -> Result<(), DbQueryError>;

    /// Releases the connection. Called once per run.
    async fn close(self: Box<Self>) -> Result<(), DbQueryError>;

    fn engine_name(&self) -> &str;
}

/// Builds connectors for one engine. Constructing the factory is the
/// capability check: an engine whose driver is not compiled in has no factory.
#[async_trait]
pub trait ConnectorFactory: Send + Sync {
    async fn connect(&self, task: &TaskConfig) -> Result<Box<dyn Connector>, DbQueryError>;
}
