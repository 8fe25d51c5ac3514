// dbquery-core/src/application/reporter.rs

use serde_json::{Map, Value};
use tracing::warn;

use crate::domain::engine::ChangePolicy;
use crate::domain::report::{ExecutionReport, ResultRow, StatementOutcome};
use crate::domain::statement::Statement;
use crate::error::DbQueryError;

#[derive(Debug, Clone, Copy)]
pub struct ReportOptions<'a> {
    pub fact: Option<&'a str>,
    pub policy: ChangePolicy,
    /// Fail instead of reporting no rows when a positive count comes with
    /// nothing to fetch.
    pub strict_fetch: bool,
}

/// Shapes the outcome of the final executed statement into the run report.
pub fn build_report(
    last: Option<(&Statement, &StatementOutcome)>,
    executed: usize,
    skipped: usize,
    options: ReportOptions<'_>,
) -> Result<ExecutionReport, DbQueryError> {
    let Some((statement, outcome)) = last else {
        return Ok(ExecutionReport {
            changed: options.policy == ChangePolicy::Always,
            facts: facts_for(options.fact, Vec::new()),
            executed,
            skipped,
            ..Default::default()
        });
    };

    let query_results = if outcome.rows_affected > 0 {
        match &outcome.result_set {
            Some(set) => set.shape(),
            None if options.strict_fetch => {
                return Err(DbQueryError::ResultFetchFailed {
                    statement: statement.to_string(),
                });
            }
            None => {
                warn!(status = %outcome.status, "No result set to fetch, reporting no rows");
                Vec::new()
            }
        }
    } else {
        Vec::new()
    };

    Ok(ExecutionReport {
        changed: options.policy.is_changed(&outcome.status),
        status: outcome.status.clone(),
        facts: facts_for(options.fact, query_results.clone()),
        query_results,
        rowcount: outcome.rows_affected,
        executed,
        skipped,
    })
}

fn facts_for(fact: Option<&str>, rows: Vec<ResultRow>) -> Map<String, Value> {
    let mut facts = Map::new();
    if let Some(name) = fact {
        facts.insert(
            name.to_string(),
            Value::Array(rows.into_iter().map(Value::Object).collect()),
        );
    }
    facts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::report::ResultSet;
    use anyhow::{Context, Result};
    use serde_json::json;

    fn options(fact: Option<&str>, policy: ChangePolicy) -> ReportOptions<'_> {
        ReportOptions {
            fact,
            policy,
            strict_fetch: false,
        }
    }

    fn two_rows() -> StatementOutcome {
        StatementOutcome {
            status: "SELECT 2".into(),
            rows_affected: 2,
            result_set: Some(ResultSet {
                columns: vec!["id".into(), "name".into()],
                rows: vec![
                    vec![json!(1), json!("a")],
                    vec![json!(2), json!("b")],
                ],
            }),
        }
    }

    #[test]
    fn test_empty_select_is_unchanged() -> Result<()> {
        let stmt = Statement::new("SELECT * FROM t").context("stmt")?;
        let outcome = StatementOutcome {
            status: "SELECT 0".into(),
            rows_affected: 0,
            result_set: None,
        };
        let report = build_report(
            Some((&stmt, &outcome)),
            1,
            0,
            options(None, ChangePolicy::StatusText),
        )?;
        assert!(!report.changed);
        assert!(report.query_results.is_empty());
        assert_eq!(report.rowcount, 0);
        assert!(report.facts.is_empty());
        Ok(())
    }

    #[test]
    fn test_fact_receives_rows() -> Result<()> {
        let stmt = Statement::new("SELECT id, name FROM t").context("stmt")?;
        let outcome = two_rows();
        let report = build_report(
            Some((&stmt, &outcome)),
            1,
            0,
            options(Some("my_key"), ChangePolicy::StatusText),
        )?;
        assert_eq!(report.query_results.len(), 2);
        assert_eq!(
            report.facts.get("my_key"),
            Some(&json!([{"id": 1, "name": "a"}, {"id": 2, "name": "b"}]))
        );
        Ok(())
    }

    #[test]
    fn test_no_fact_means_empty_facts() -> Result<()> {
        let stmt = Statement::new("SELECT id, name FROM t").context("stmt")?;
        let outcome = two_rows();
        let report = build_report(
            Some((&stmt, &outcome)),
            1,
            0,
            options(None, ChangePolicy::StatusText),
        )?;
        assert!(report.facts.is_empty());
        Ok(())
    }

    #[test]
    fn test_missing_result_set_is_swallowed() -> Result<()> {
        let stmt = Statement::new("INSERT INTO t VALUES (1)").context("stmt")?;
        let outcome = StatementOutcome::without_rows("INSERT 0 1", 1);
        let report = build_report(
            Some((&stmt, &outcome)),
            1,
            0,
            options(None, ChangePolicy::StatusText),
        )?;
        assert!(report.changed);
        assert!(report.query_results.is_empty());
        assert_eq!(report.rowcount, 1);
        Ok(())
    }

    #[test]
    fn test_strict_fetch_reports_missing_result_set() -> Result<()> {
        let stmt = Statement::new("INSERT INTO t VALUES (1)").context("stmt")?;
        let outcome = StatementOutcome::without_rows("INSERT 0 1", 1);
        let strict = ReportOptions {
            strict_fetch: true,
            ..options(None, ChangePolicy::StatusText)
        };
        let result = build_report(Some((&stmt, &outcome)), 1, 0, strict);
        assert!(matches!(result, Err(DbQueryError::ResultFetchFailed { .. })));
        Ok(())
    }

    #[test]
    fn test_all_skipped_report() -> Result<()> {
        let report = build_report(None, 0, 3, options(Some("f"), ChangePolicy::Always))?;
        assert!(report.changed);
        assert_eq!(report.skipped, 3);
        assert_eq!(report.facts.get("f"), Some(&json!([])));
        Ok(())
    }
}
