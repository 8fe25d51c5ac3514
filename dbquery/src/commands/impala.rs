// dbquery/src/commands/impala.rs
//
// USE CASE: Run SQL against Impala from flags, guarded by the query log.

use std::path::PathBuf;

use dbquery_core::DbQueryError;
use dbquery_core::domain::report::ExecutionReport;

use crate::cli::{ConnectionArgs, QueryArgs, ReplayMatch, impala_task};

pub async fn execute(
    connection: ConnectionArgs,
    query: QueryArgs,
    query_log: Option<PathBuf>,
    odbc_driver: Option<String>,
    replay_match: ReplayMatch,
) -> Result<ExecutionReport, DbQueryError> {
    let task = impala_task(connection, query, query_log, odbc_driver, replay_match);
    super::execute_task(task).await
}
