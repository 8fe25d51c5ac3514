// dbquery-core/src/application/engine.rs

use std::time::Instant;
use tracing::{debug, error, instrument};

use crate::domain::arguments::QueryArguments;
use crate::domain::report::StatementOutcome;
use crate::domain::statement::Statement;
use crate::error::DbQueryError;
use crate::ports::connector::Connector;

/// Exécute une requête déjà bindée avec instrumentation (Logs + Timing).
///
/// Any connector failure becomes `StatementExecutionFailed`, carrying the
/// statement text and the arguments it was bound with.
#[instrument(skip_all, fields(engine = connector.engine_name(), statement.len = statement.as_str().len()))]
pub async fn execute_statement(
    connector: &dyn Connector,
    statement: &Statement,
    bound_sql: &str,
    arguments: &QueryArguments,
) -> Result<StatementOutcome, DbQueryError> {
    let start = Instant::now();
    debug!("⚡ Executing Query: {}", statement);

    let result = connector.execute(bound_sql).await;
    let duration = start.elapsed();

    match result {
        Ok(outcome) => {
            debug!(status = %outcome.status, rows = outcome.rows_affected, "✅ Query finished in {:.2?}", duration);
            Ok(outcome)
        }
        Err(e) => {
            error!("❌ Query failed after {:.2?}: {}", duration, e);
            Err(DbQueryError::StatementExecutionFailed {
                statement: statement.to_string(),
                arguments: arguments.to_string(),
                reason: e.to_string(),
            })
        }
    }
}
