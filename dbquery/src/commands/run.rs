// dbquery/src/commands/run.rs
//
// USE CASE: Run a YAML task file.

use std::path::Path;

use dbquery_core::DbQueryError;
use dbquery_core::domain::report::ExecutionReport;
use dbquery_core::infrastructure::config::load_task_config;
use tracing::info;

pub async fn execute(task_path: &Path) -> Result<ExecutionReport, DbQueryError> {
    info!("⚙️  Loading task {}", task_path.display());
    let task = load_task_config(task_path)?;
    super::execute_task(task).await
}
