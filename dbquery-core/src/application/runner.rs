// dbquery-core/src/application/runner.rs

use std::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::application::engine::execute_statement;
use crate::application::reporter::{ReportOptions, build_report};
use crate::domain::arguments::QueryArguments;
use crate::domain::binding::bind;
use crate::domain::engine::Engine;
use crate::domain::replay::{ExecutedSet, MatchMode, ensure_loggable};
use crate::domain::report::{ExecutionReport, StatementOutcome};
use crate::domain::statement::Statement;
use crate::error::DbQueryError;
use crate::ports::connector::Connector;
use crate::ports::replay::ReplayStore;

/// Per-run switches taken from the task.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub fact: Option<String>,
    pub check_mode: bool,
    pub strict_fetch: bool,
}

/// A replay store together with the entries it held when the run started.
pub struct Replay<'a> {
    pub executed: ExecutedSet,
    pub store: &'a mut dyn ReplayStore,
}

impl<'a> Replay<'a> {
    /// Reads the store once, before any connection is opened.
    pub fn load(store: &'a mut dyn ReplayStore, mode: MatchMode) -> Result<Self, DbQueryError> {
        let executed = store.load_executed(mode)?;
        debug!(entries = executed.len(), "📒 Replay state loaded");
        Ok(Self { executed, store })
    }
}

/// Runs `statements` in order on one connector, inside one unit of work.
///
/// With a replay, statements already recorded are skipped and every
/// statement that succeeds is recorded before the next one starts. The batch
/// stops at the first failure and the unit of work is rolled back.
#[instrument(skip_all, fields(engine = %engine, statements = statements.len()))]
pub async fn run_statements(
    connector: &dyn Connector,
    replay: Option<Replay<'_>>,
    statements: &[Statement],
    arguments: &QueryArguments,
    engine: Engine,
    options: &RunOptions,
) -> Result<ExecutionReport, DbQueryError> {
    let start = Instant::now();

    // 1. FILTRE DE REJEU
    let mut pending: Vec<&Statement> = Vec::with_capacity(statements.len());
    let mut skipped = 0usize;
    let mut store = match replay {
        Some(Replay {
            mut executed,
            store,
        }) => {
            ensure_loggable(statements)?;
            for statement in statements {
                // Inserting up front also drops repeats within this batch.
                if executed.insert(statement) {
                    pending.push(statement);
                } else {
                    debug!("⏭️  Skipping already executed query: {}", statement);
                    skipped += 1;
                }
            }
            Some(store)
        }
        None => {
            pending.extend(statements.iter());
            None
        }
    };

    // 2. BINDING (tout ou rien, avant tout envoi à la base)
    let dialect = engine.literal_dialect();
    let bound = pending
        .iter()
        .map(|statement| bind(statement, arguments, dialect))
        .collect::<Result<Vec<String>, _>>()?;

    // 3. EXÉCUTION
    connector.begin().await?;
    let mut last: Option<(&Statement, StatementOutcome)> = None;
    for (statement, sql) in pending.iter().copied().zip(bound.iter()) {
        let outcome = match execute_statement(connector, statement, sql, arguments).await {
            Ok(outcome) => outcome,
            Err(e) => {
                rollback_quietly(connector).await;
                return Err(e);
            }
        };
        if let Some(store) = store.as_deref_mut()
            && let Err(e) = store.record_executed(statement)
        {
            rollback_quietly(connector).await;
            return Err(e);
        }
        last = Some((statement, outcome));
    }

    // 4. RAPPORT
    let report = build_report(
        last.as_ref().map(|(statement, outcome)| (*statement, outcome)),
        pending.len(),
        skipped,
        ReportOptions {
            fact: options.fact.as_deref(),
            policy: engine.change_policy(),
            strict_fetch: options.strict_fetch,
        },
    );
    let report = match report {
        Ok(report) => report,
        Err(e) => {
            rollback_quietly(connector).await;
            return Err(e);
        }
    };

    // 5. FINALISATION
    if !report.changed {
        connector.rollback().await?;
    } else if options.check_mode {
        info!("🧪 Check mode: rolling back changes");
        connector.rollback().await?;
    } else {
        connector.commit().await?;
    }

    info!(
        executed = report.executed,
        skipped = report.skipped,
        "✨ Batch finished in {:.2?}",
        start.elapsed()
    );
    Ok(report)
}

async fn rollback_quietly(connector: &dyn Connector) {
    if let Err(e) = connector.rollback().await {
        warn!("⚠️  Rollback after failure did not complete: {}", e);
    }
}
