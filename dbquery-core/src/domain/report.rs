// dbquery-core/src/domain/report.rs

use serde::Serialize;
use serde_json::{Map, Value};

/// One result row, column name -> value, in column order.
pub type ResultRow = Map<String, Value>;

/// Rows returned by a statement, before shaping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl ResultSet {
    pub fn shape(&self) -> Vec<ResultRow> {
        self.rows
            .iter()
            .map(|values| {
                self.columns
                    .iter()
                    .cloned()
                    .zip(values.iter().cloned())
                    .collect::<ResultRow>()
            })
            .collect()
    }
}

/// What a connector reports for one submitted statement.
#[derive(Debug, Clone, PartialEq)]
pub struct StatementOutcome {
    /// Command-tag style summary, e.g. `SELECT 2` or `INSERT 0 1`.
    pub status: String,
    pub rows_affected: u64,
    /// `None` when the statement produced nothing fetchable.
    pub result_set: Option<ResultSet>,
}

impl StatementOutcome {
    pub fn without_rows(status: impl Into<String>, rows_affected: u64) -> Self {
        Self {
            status: status.into(),
            rows_affected,
            result_set: None,
        }
    }
}

/// Final, serialisable result of a run.
#[derive(Debug, Clone, Serialize, PartialEq, Default)]
pub struct ExecutionReport {
    pub changed: bool,
    pub status: String,
    pub query_results: Vec<ResultRow>,
    pub facts: Map<String, Value>,
    pub rowcount: u64,
    pub executed: usize,
    pub skipped: usize,
}
