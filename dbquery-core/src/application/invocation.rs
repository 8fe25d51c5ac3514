// dbquery-core/src/application/invocation.rs

use tracing::{info, instrument, warn};

use crate::application::runner::{Replay, RunOptions, run_statements};
use crate::domain::replay::ensure_loggable;
use crate::domain::report::ExecutionReport;
use crate::domain::task::TaskConfig;
use crate::error::DbQueryError;
use crate::infrastructure::replay_log::ReplayLog;
use crate::infrastructure::source::QuerySource;
use crate::ports::connector::ConnectorFactory;
use crate::ports::replay::ReplayStore;

/// One full invocation: validate, resolve the SQL, open the query log,
/// connect, run the batch, then release the connection and the log.
///
/// Everything that can be rejected without a database (conflicting
/// arguments, option rules, unreadable `.sql` files, an unusable or
/// unreadable log, statements the log cannot hold) is rejected before
/// `factory.connect` is called.
#[instrument(skip_all, fields(engine = %task.engine))]
pub async fn run_task(
    task: &TaskConfig,
    factory: &dyn ConnectorFactory,
) -> Result<ExecutionReport, DbQueryError> {
    // 1. VALIDATION
    task.check()?;
    let arguments = task.arguments()?;

    // 2. SOURCE
    let source = QuerySource::parse(&task.query);
    let statements = source.resolve()?;
    info!("📄 {} statement(s) from {}", statements.len(), source);

    // 3. JOURNAL DES REQUÊTES (lu en entier avant toute connexion)
    let mut log = match &task.query_log {
        Some(path) => {
            ensure_loggable(&statements)?;
            Some(ReplayLog::open(path)?)
        }
        None => None,
    };
    let replay = match log.as_mut() {
        Some(log) => Some(Replay::load(log as &mut dyn ReplayStore, task.replay_match)?),
        None => None,
    };

    // 4. CONNEXION
    let connector = factory.connect(task).await?;

    // 5. EXÉCUTION
    let options = RunOptions {
        fact: task.fact.clone(),
        check_mode: task.check_mode,
        strict_fetch: task.strict_fetch,
    };
    let outcome = run_statements(
        connector.as_ref(),
        replay,
        &statements,
        &arguments,
        task.engine,
        &options,
    )
    .await;

    // 6. LIBÉRATION (toujours, quel que soit le résultat)
    if let Err(e) = connector.close().await {
        warn!("⚠️  Closing the connection failed: {}", e);
    }
    if let Some(log) = log
        && let Err(e) = Box::new(log).close()
    {
        warn!("⚠️  Closing the query log failed: {}", e);
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::engine::Engine;
    use crate::domain::error::DomainError;
    use crate::domain::report::StatementOutcome;
    use crate::infrastructure::error::InfrastructureError;
    use crate::ports::connector::Connector;
    use anyhow::Result;
    use async_trait::async_trait;
    use serde_json::json;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    struct EchoConnector;

    #[async_trait]
    impl Connector for EchoConnector {
        async fn begin(&self) -> Result<(), DbQueryError> {
            Ok(())
        }

        async fn execute(&self, sql: &str) -> Result<StatementOutcome, DbQueryError> {
            Ok(StatementOutcome::without_rows(
                sql.split_whitespace().next().unwrap_or_default(),
                1,
            ))
        }

        async fn commit(&self) -> Result<(), DbQueryError> {
            Ok(())
        }

        async fn rollback(&self) -> Result<(), DbQueryError> {
            Ok(())
        }

        async fn close(self: Box<Self>) -> Result<(), DbQueryError> {
            Ok(())
        }

        fn engine_name(&self) -> &str {
            "echo"
        }
    }

    #[derive(Default)]
    struct CountingFactory {
        connects: AtomicUsize,
    }

    #[async_trait]
    impl ConnectorFactory for CountingFactory {
        async fn connect(&self, _task: &TaskConfig) -> Result<Box<dyn Connector>, DbQueryError> {
            self.connects.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(EchoConnector))
        }
    }

    #[tokio::test]
    async fn test_conflicting_arguments_never_connect() -> Result<()> {
        let factory = CountingFactory::default();
        let mut task = TaskConfig::new(Engine::Postgres, "SELECT %s");
        task.positional_args = Some(vec![json!(1)]);
        task.named_args = Some(serde_json::Map::new());

        let result = run_task(&task, &factory).await;
        assert!(matches!(
            result,
            Err(DbQueryError::Domain(DomainError::ConfigurationConflict))
        ));
        assert_eq!(factory.connects.load(Ordering::SeqCst), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_sql_file_never_connects() -> Result<()> {
        let factory = CountingFactory::default();
        let task = TaskConfig::new(Engine::Postgres, "/definitely/missing/script.sql");

        let result = run_task(&task, &factory).await;
        assert!(matches!(
            result,
            Err(DbQueryError::Infrastructure(
                InfrastructureError::SourceUnavailable { .. }
            ))
        ));
        assert_eq!(factory.connects.load(Ordering::SeqCst), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_impala_requires_query_log() -> Result<()> {
        let factory = CountingFactory::default();
        let task = TaskConfig::new(Engine::Impala, "SELECT 1");

        let result = run_task(&task, &factory).await;
        assert!(matches!(
            result,
            Err(DbQueryError::Domain(DomainError::MissingOption { .. }))
        ));
        assert_eq!(factory.connects.load(Ordering::SeqCst), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_literal_with_entry_terminator_is_rejected() -> Result<()> {
        let dir = tempdir()?;
        let log_path = dir.path().join("impala.log");
        let mut task = TaskConfig::new(
            Engine::Impala,
            "INSERT INTO t VALUES (1);\nINSERT INTO t VALUES (2)",
        );
        task.query_log = Some(log_path.clone());
        let factory = CountingFactory::default();

        for _ in 0..2 {
            let result = run_task(&task, &factory).await;
            assert!(matches!(
                result,
                Err(DbQueryError::Domain(DomainError::UnloggableStatement { .. }))
            ));
        }
        assert_eq!(factory.connects.load(Ordering::SeqCst), 0);
        assert!(!log_path.exists() || fs::read_to_string(&log_path)?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_unopenable_log_never_connects() -> Result<()> {
        let dir = tempdir()?;
        let mut task = TaskConfig::new(Engine::Impala, "SELECT 1");
        // A directory cannot be opened for appending.
        task.query_log = Some(dir.path().to_path_buf());
        let factory = CountingFactory::default();

        let result = run_task(&task, &factory).await;
        assert!(matches!(
            result,
            Err(DbQueryError::Infrastructure(
                InfrastructureError::LogUnavailable { .. }
            ))
        ));
        assert_eq!(factory.connects.load(Ordering::SeqCst), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_unreadable_log_never_connects() -> Result<()> {
        let dir = tempdir()?;
        let log_path = dir.path().join("impala.log");
        fs::write(&log_path, [0xff, 0xfe, b';', b'\n'])?;
        let mut task = TaskConfig::new(Engine::Impala, "SELECT 1");
        task.query_log = Some(log_path.clone());
        let factory = CountingFactory::default();

        let result = run_task(&task, &factory).await;
        assert!(matches!(
            result,
            Err(DbQueryError::Infrastructure(
                InfrastructureError::LogUnavailable { .. }
            ))
        ));
        assert_eq!(factory.connects.load(Ordering::SeqCst), 0);
        // The log is left as it was.
        assert_eq!(fs::read(&log_path)?, vec![0xff, 0xfe, b';', b'\n']);
        Ok(())
    }

    #[tokio::test]
    async fn test_impala_run_is_idempotent() -> Result<()> {
        let dir = tempdir()?;
        let script = dir.path().join("load.sql");
        let log_path = dir.path().join("impala.log");
        fs::write(
            &script,
            "INSERT INTO t VALUES (1);\nINSERT INTO t VALUES (2);\n",
        )?;

        let mut task = TaskConfig::new(Engine::Impala, script.display().to_string());
        task.query_log = Some(log_path.clone());
        let factory = CountingFactory::default();

        let first = run_task(&task, &factory).await?;
        assert_eq!((first.executed, first.skipped), (2, 0));

        let second = run_task(&task, &factory).await?;
        assert_eq!((second.executed, second.skipped), (0, 2));
        assert!(second.changed);

        assert_eq!(
            fs::read_to_string(&log_path)?,
            "INSERT INTO t VALUES (1);\nINSERT INTO t VALUES (2);\n"
        );
        assert_eq!(factory.connects.load(Ordering::SeqCst), 2);
        Ok(())
    }
}
