// dbquery/src/commands/postgres.rs
//
// USE CASE: Run SQL against PostgreSQL from flags.

use dbquery_core::DbQueryError;
use dbquery_core::domain::report::ExecutionReport;

use crate::cli::{ConnectionArgs, QueryArgs, postgres_task};

pub async fn execute(
    connection: ConnectionArgs,
    query: QueryArgs,
    check: bool,
) -> Result<ExecutionReport, DbQueryError> {
    super::execute_task(postgres_task(connection, query, check)).await
}
