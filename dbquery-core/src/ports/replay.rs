// dbquery-core/src/ports/replay.rs

use crate::domain::replay::{ExecutedSet, MatchMode};
use crate::domain::statement::Statement;
use crate::error::DbQueryError;

/// Durable record of statements already executed.
pub trait ReplayStore: Send {
    /// Reads every recorded statement. Called once per run, before filtering.
    fn load_executed(&mut self, mode: MatchMode) -> Result<ExecutedSet, DbQueryError>;

    /// Appends `statement` and makes it durable before returning.
    fn record_executed(&mut self, statement: &Statement) -> Result<(), DbQueryError>;

    /// Flushes and releases the store.
    fn close(self: Box<Self>) -> Result<(), DbQueryError>;
}
