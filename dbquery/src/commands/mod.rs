// dbquery/src/commands/mod.rs

pub mod impala;
pub mod postgres;
pub mod run;

use dbquery_core::DbQueryError;
use dbquery_core::application::run_task;
use dbquery_core::domain::report::ExecutionReport;
use dbquery_core::domain::task::TaskConfig;
use dbquery_core::infrastructure::adapters::connector_factory;
use tracing::info;

/// Shared tail of every command: capability check, then the full run.
pub async fn execute_task(task: TaskConfig) -> Result<ExecutionReport, DbQueryError> {
    let factory = connector_factory(task.engine)?;
    info!("🔌 Engine: {}", task.engine);
    run_task(&task, factory.as_ref()).await
}
