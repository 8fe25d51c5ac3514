// dbquery-core/src/infrastructure/adapters/postgres.rs

use async_trait::async_trait;
use futures::TryStreamExt;
use serde_json::Value;
use sqlx::postgres::{PgConnectOptions, PgConnection, PgRow, PgSslMode};
use sqlx::{Column, Connection, Either, Executor, Row, TypeInfo};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

// Imports Hexagonaux
use crate::domain::binding::LiteralDialect;
use crate::domain::engine::Engine;
use crate::domain::report::{ResultSet, StatementOutcome};
use crate::domain::task::{Endpoint, SslMode, TaskConfig};
use crate::error::DbQueryError;
use crate::infrastructure::adapters::command_tag::command_tag;
use crate::infrastructure::error::{DatabaseError, InfrastructureError};
use crate::ports::connector::{Connector, ConnectorFactory};

pub struct PostgresConnector {
    conn: Mutex<PgConnection>,
}

impl PostgresConnector {
    pub async fn connect(task: &TaskConfig) -> Result<Self, InfrastructureError> {
        let options = connect_options(task);
        let conn = PgConnection::connect_with(&options).await.map_err(|e| {
            InfrastructureError::ConnectionFailed {
                engine: Engine::Postgres.to_string(),
                reason: e.to_string(),
            }
        })?;
        info!(database = ?task.connection.db, "Connected to PostgreSQL");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    async fn run_control(&self, sql: &str) -> Result<(), DbQueryError> {
        let mut conn = self.conn.lock().await;
        (&mut *conn)
            .execute(sql)
            .await
            .map(|_| ())
            .map_err(db_error)
    }
}

/// Maps task settings onto sqlx options. Empty values keep sqlx defaults.
pub fn connect_options(task: &TaskConfig) -> PgConnectOptions {
    let settings = &task.connection;
    let mut options = PgConnectOptions::new()
        .username(&settings.user_for(Engine::Postgres))
        .ssl_mode(pg_ssl_mode(settings.ssl_mode));

    options = match settings.endpoint_for(Engine::Postgres) {
        Endpoint::Tcp { host, port } => options.host(&host).port(port),
        Endpoint::Socket { path, port } => options.socket(path).port(port),
    };
    if let Some(password) = settings.password.as_deref().filter(|p| !p.is_empty()) {
        options = options.password(password);
    }
    if let Some(db) = settings.db.as_deref().filter(|d| !d.is_empty()) {
        options = options.database(db);
    }
    if let Some(root_cert) = &settings.ssl_rootcert {
        options = options.ssl_root_cert(root_cert);
    }
    options
}

fn pg_ssl_mode(mode: SslMode) -> PgSslMode {
    match mode {
        SslMode::Disable => PgSslMode::Disable,
        SslMode::Allow => PgSslMode::Allow,
        SslMode::Prefer => PgSslMode::Prefer,
        SslMode::Require => PgSslMode::Require,
        SslMode::VerifyCa => PgSslMode::VerifyCa,
        SslMode::VerifyFull => PgSslMode::VerifyFull,
    }
}

fn db_error(e: sqlx::Error) -> DbQueryError {
    DbQueryError::Infrastructure(InfrastructureError::Database(DatabaseError::Postgres(e)))
}

/// Decodes one column to JSON. Unknown types fall back to their text form.
fn column_value(row: &PgRow, idx: usize) -> Value {
    let type_name = row.columns()[idx].type_info().name().to_string();
    let decoded = match type_name.as_str() {
        "BOOL" => row
            .try_get::<Option<bool>, _>(idx)
            .map(|v| v.map(Value::from)),
        "INT2" => row
            .try_get::<Option<i16>, _>(idx)
            .map(|v| v.map(Value::from)),
        "INT4" => row
            .try_get::<Option<i32>, _>(idx)
            .map(|v| v.map(Value::from)),
        "INT8" => row
            .try_get::<Option<i64>, _>(idx)
            .map(|v| v.map(Value::from)),
        "FLOAT4" => row
            .try_get::<Option<f32>, _>(idx)
            .map(|v| v.map(|f| Value::from(f64::from(f)))),
        "FLOAT8" => row
            .try_get::<Option<f64>, _>(idx)
            .map(|v| v.map(Value::from)),
        "JSON" | "JSONB" => row.try_get::<Option<Value>, _>(idx),
        _ => row
            .try_get_unchecked::<Option<String>, _>(idx)
            .map(|v| v.map(Value::from)),
    };
    match decoded {
        Ok(value) => value.unwrap_or(Value::Null),
        Err(e) => {
            debug!(column = idx, pg_type = %type_name, error = %e, "Falling back to text decoding");
            row.try_get_unchecked::<Option<String>, _>(idx)
                .ok()
                .flatten()
                .map(Value::from)
                .unwrap_or(Value::Null)
        }
    }
}

#[async_trait]
impl Connector for PostgresConnector {
    async fn begin(&self) -> Result<(), DbQueryError> {
        self.run_control("BEGIN").await
    }

    #[instrument(skip(self, sql), fields(sql.len = sql.len()))]
    async fn execute(&self, sql: &str) -> Result<StatementOutcome, DbQueryError> {
        let mut conn = self.conn.lock().await;

        // No bind arguments: sqlx uses the simple query protocol, which returns
        // the affected count and every row in one stream.
        let mut stream = (&mut *conn).fetch_many(sql);
        let mut rows_affected = 0u64;
        let mut result_set: Option<ResultSet> = None;

        while let Some(item) = stream.try_next().await.map_err(db_error)? {
            match item {
                Either::Left(done) => rows_affected += done.rows_affected(),
                Either::Right(row) => {
                    let set = result_set.get_or_insert_with(|| ResultSet {
                        columns: row.columns().iter().map(|c| c.name().to_string()).collect(),
                        rows: Vec::new(),
                    });
                    set.rows
                        .push((0..row.len()).map(|idx| column_value(&row, idx)).collect());
                }
            }
        }

        Ok(StatementOutcome {
            status: command_tag(sql, rows_affected, LiteralDialect::Postgres),
            rows_affected,
            result_set,
        })
    }

    async fn commit(&self) -> Result<(), DbQueryError> {
        self.run_control("COMMIT").await
    }

    async fn rollback(&self) -> Result<(), DbQueryError> {
        self.run_control("ROLLBACK").await
    }

    async fn close(self: Box<Self>) -> Result<(), DbQueryError> {
        self.conn.into_inner().close().await.map_err(db_error)
    }

    fn engine_name(&self) -> &str {
        "postgres"
    }
}

/// Opens PostgreSQL connections with sqlx.
pub struct PostgresFactory;

#[async_trait]
impl ConnectorFactory for PostgresFactory {
    async fn connect(&self, task: &TaskConfig) -> Result<Box<dyn Connector>, DbQueryError> {
        Ok(Box::new(PostgresConnector::connect(task).await?))
    }
}
