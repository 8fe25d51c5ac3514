// dbquery-core/tests/common/mod.rs
//
// An in-process SQL engine behind the Connector port, so the runner can be
// exercised against real transactions without a database server.

#![allow(dead_code)]

use async_trait::async_trait;
use dbquery_core::DbQueryError;
use dbquery_core::domain::report::{ResultSet, StatementOutcome};
use dbquery_core::domain::task::TaskConfig;
use dbquery_core::ports::connector::{Connector, ConnectorFactory};
use duckdb::Connection;
use duckdb::types::Value as DuckValue;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Mutex;

pub struct DuckDBConnector {
    conn: Mutex<Connection>,
}

fn db_error(e: duckdb::Error) -> DbQueryError {
    DbQueryError::InternalError(e.to_string())
}

fn to_json(value: DuckValue) -> Value {
    match value {
        DuckValue::Null => Value::Null,
        DuckValue::Boolean(b) => Value::from(b),
        DuckValue::SmallInt(i) => Value::from(i),
        DuckValue::Int(i) => Value::from(i),
        DuckValue::BigInt(i) => Value::from(i),
        DuckValue::Double(f) => Value::from(f),
        DuckValue::Text(s) => Value::from(s),
        other => Value::String(format!("{:?}", other)),
    }
}

impl DuckDBConnector {
    pub fn in_memory() -> anyhow::Result<Self> {
        Ok(Self {
            conn: Mutex::new(Connection::open_in_memory()?),
        })
    }

    pub fn open(path: &std::path::Path) -> anyhow::Result<Self> {
        Ok(Self {
            conn: Mutex::new(Connection::open(path)?),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, DbQueryError> {
        self.conn
            .lock()
            .map_err(|_| DbQueryError::InternalError("DuckDB Mutex Poisoned".into()))
    }

    /// Runs setup SQL outside of any batch.
    pub fn setup(&self, sql: &str) -> anyhow::Result<()> {
        self.lock()?.execute_batch(sql)?;
        Ok(())
    }

    pub fn count(&self, table: &str) -> anyhow::Result<i64> {
        let conn = self.lock()?;
        let n = conn.query_row(&format!("SELECT count(*) FROM {}", table), [], |row| {
            row.get(0)
        })?;
        Ok(n)
    }

    fn control(&self, sql: &str) -> Result<(), DbQueryError> {
        self.lock()?.execute_batch(sql).map_err(db_error)
    }
}

#[async_trait]
impl Connector for DuckDBConnector {
    async fn begin(&self) -> Result<(), DbQueryError> {
        self.control("BEGIN TRANSACTION")
    }

    async fn execute(&self, sql: &str) -> Result<StatementOutcome, DbQueryError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(sql).map_err(db_error)?;

        if !sql.trim_start().to_uppercase().starts_with("SELECT") {
            let n = stmt.execute([]).map_err(db_error)? as u64;
            let verb = sql.split_whitespace().next().unwrap_or_default().to_uppercase();
            let status = if verb == "INSERT" {
                format!("INSERT 0 {}", n)
            } else {
                format!("{} {}", verb, n)
            };
            return Ok(StatementOutcome::without_rows(status, n));
        }

        let mut values = Vec::new();
        {
            let mut rows = stmt.query([]).map_err(db_error)?;
            while let Some(row) = rows.next().map_err(db_error)? {
                let width = row.as_ref().column_count();
                let mut current = Vec::with_capacity(width);
                for idx in 0..width {
                    current.push(to_json(row.get::<_, DuckValue>(idx).map_err(db_error)?));
                }
                values.push(current);
            }
        }
        let columns = stmt.column_names();
        let n = values.len() as u64;
        Ok(StatementOutcome {
            status: format!("SELECT {}", n),
            rows_affected: n,
            result_set: Some(ResultSet {
                columns,
                rows: values,
            }),
        })
    }

    async fn commit(&self) -> Result<(), DbQueryError> {
        self.control("COMMIT")
    }

    async fn rollback(&self) -> Result<(), DbQueryError> {
        self.control("ROLLBACK")
    }

    async fn close(self: Box<Self>) -> Result<(), DbQueryError> {
        Ok(())
    }

    fn engine_name(&self) -> &str {
        "duckdb"
    }
}

/// Opens a fresh connection to one database file per run.
pub struct DuckDBFactory {
    pub path: PathBuf,
}

#[async_trait]
impl ConnectorFactory for DuckDBFactory {
    async fn connect(&self, _task: &TaskConfig) -> Result<Box<dyn Connector>, DbQueryError> {
        let conn = Connection::open(&self.path).map_err(db_error)?;
        Ok(Box::new(DuckDBConnector {
            conn: Mutex::new(conn),
        }))
    }
}
