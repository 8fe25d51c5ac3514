// dbquery-core/src/infrastructure/adapters/impala.rs
//
// Impala over ODBC (unixODBC + the Impala ODBC driver). Compiled only with the
// `impala` feature.

use async_trait::async_trait;
use odbc_api::buffers::TextRowSet;
use odbc_api::{Connection, ConnectionOptions, Cursor, Environment, ResultSetMetadata};
use serde_json::Value;
use std::sync::{Mutex, OnceLock};
use tracing::{info, instrument};

use crate::domain::binding::LiteralDialect;
use crate::domain::engine::Engine;
use crate::domain::report::{ResultSet, StatementOutcome};
use crate::domain::task::{Endpoint, TaskConfig};
use crate::error::DbQueryError;
use crate::infrastructure::adapters::command_tag::command_tag;
use crate::infrastructure::error::{DatabaseError, InfrastructureError};
use crate::ports::connector::{Connector, ConnectorFactory};

pub const DEFAULT_ODBC_DRIVER: &str = "Cloudera ODBC Driver for Impala";

const FETCH_BATCH_SIZE: usize = 1000;
const MAX_TEXT_LEN: usize = 64 * 1024;

fn odbc_environment() -> Result<&'static Environment, odbc_api::Error> {
    static ENV: OnceLock<Environment> = OnceLock::new();
    if let Some(env) = ENV.get() {
        return Ok(env);
    }
    let env = Environment::new()?;
    Ok(ENV.get_or_init(|| env))
}

/// Builds the ODBC connection string for the Impala driver.
pub fn connection_string(task: &TaskConfig) -> String {
    let settings = &task.connection;
    let driver = settings
        .odbc_driver
        .as_deref()
        .filter(|d| !d.is_empty())
        .unwrap_or(DEFAULT_ODBC_DRIVER);

    // A unix socket path goes where the host would.
    let (host, port) = match settings.endpoint_for(Engine::Impala) {
        Endpoint::Tcp { host, port } => (host, port),
        Endpoint::Socket { path, port } => (path.display().to_string(), port),
    };

    let mut parts = vec![
        format!("Driver={{{}}}", driver),
        format!("Host={}", host),
        format!("Port={}", port),
        format!("UID={}", settings.user_for(Engine::Impala)),
    ];
    if let Some(db) = settings.db.as_deref().filter(|d| !d.is_empty()) {
        parts.push(format!("Schema={}", db));
    }
    match settings.password.as_deref().filter(|p| !p.is_empty()) {
        // User name and password authentication
        Some(password) => {
            parts.push("AuthMech=3".to_string());
            parts.push(format!("PWD={{{}}}", password));
        }
        None => parts.push("AuthMech=0".to_string()),
    }
    parts.join(";")
}

fn odbc_error(e: odbc_api::Error) -> DbQueryError {
    DbQueryError::Infrastructure(InfrastructureError::Database(DatabaseError::Odbc(e)))
}

pub struct ImpalaConnector {
    conn: Mutex<Connection<'static>>,
}

impl ImpalaConnector {
    pub fn connect(task: &TaskConfig) -> Result<Self, InfrastructureError> {
        let failed = |reason: String| InfrastructureError::ConnectionFailed {
            engine: Engine::Impala.to_string(),
            reason,
        };
        let env = odbc_environment().map_err(|e| failed(e.to_string()))?;
        let conn = env
            .connect_with_connection_string(&connection_string(task), ConnectionOptions::default())
            .map_err(|e| failed(e.to_string()))?;
        info!(database = ?task.connection.db, "Connected to Impala");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection<'static>>, DbQueryError> {
        self.conn
            .lock()
            .map_err(|_| DbQueryError::InternalError("Impala connection mutex poisoned".into()))
    }
}

fn fetch_result_set(mut cursor: impl Cursor) -> Result<ResultSet, odbc_api::Error> {
    let columns = cursor.column_names()?.collect::<Result<Vec<String>, _>>()?;
    let buffer = TextRowSet::for_cursor(FETCH_BATCH_SIZE, &mut cursor, Some(MAX_TEXT_LEN))?;
    let mut block = cursor.bind_buffer(buffer)?;

    let mut rows = Vec::new();
    while let Some(batch) = block.fetch()? {
        for row in 0..batch.num_rows() {
            let values = (0..batch.num_cols())
                .map(|col| {
                    batch
                        .at_as_str(col, row)
                        .ok()
                        .flatten()
                        .map(|s| Value::String(s.to_string()))
                        .unwrap_or(Value::Null)
                })
                .collect();
            rows.push(values);
        }
    }
    Ok(ResultSet { columns, rows })
}

#[async_trait]
impl Connector for ImpalaConnector {
    // Impala runs in autocommit mode; there is no transaction to open.
    async fn begin(&self) -> Result<(), DbQueryError> {
        Ok(())
    }

    #[instrument(skip(self, sql), fields(sql.len = sql.len()))]
    async fn execute(&self, sql: &str) -> Result<StatementOutcome, DbQueryError> {
        let conn = self.lock()?;
        let mut statement = conn.preallocate().map_err(odbc_error)?;

        let result_set = match statement.execute(sql, ()).map_err(odbc_error)? {
            Some(cursor) => Some(fetch_result_set(cursor).map_err(odbc_error)?),
            None => None,
        };
        let rows_affected = match &result_set {
            Some(set) => set.rows.len() as u64,
            None => statement
                .row_count()
                .map_err(odbc_error)?
                .map(|n| n as u64)
                .unwrap_or(0),
        };

        Ok(StatementOutcome {
            status: command_tag(sql, rows_affected, LiteralDialect::Impala),
            rows_affected,
            result_set,
        })
    }

    async fn commit(&self) -> Result<(), DbQueryError> {
        self.lock()?.commit().map_err(odbc_error)
    }

    async fn rollback(&self) -> Result<(), DbQueryError> {
        self.lock()?.rollback().map_err(odbc_error)
    }

    async fn close(self: Box<Self>) -> Result<(), DbQueryError> {
        let conn = self
            .conn
            .into_inner()
            .map_err(|_| DbQueryError::InternalError("Impala connection mutex poisoned".into()))?;
        drop(conn);
        Ok(())
    }

    fn engine_name(&self) -> &str {
        "impala"
    }
}

/// Opens Impala connections through ODBC.
pub struct ImpalaFactory;

#[async_trait]
impl ConnectorFactory for ImpalaFactory {
    async fn connect(&self, task: &TaskConfig) -> Result<Box<dyn Connector>, DbQueryError> {
        Ok(Box::new(ImpalaConnector::connect(task)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_string_defaults() {
        let mut task = TaskConfig::new(Engine::Impala, "SELECT 1");
        task.connection.db = Some("acme".into());
        let cs = connection_string(&task);
        assert_eq!(
            cs,
            "Driver={Cloudera ODBC Driver for Impala};Host=localhost;Port=21050;UID=impala;Schema=acme;AuthMech=0"
        );
    }

    #[test]
    fn test_connection_string_with_password() {
        let mut task = TaskConfig::new(Engine::Impala, "SELECT 1");
        task.connection.host = Some("impala.internal".into());
        task.connection.password = Some("s3cret".into());
        let cs = connection_string(&task);
        assert!(cs.contains("Host=impala.internal"));
        assert!(cs.contains("AuthMech=3;PWD={s3cret}"));
    }
}
