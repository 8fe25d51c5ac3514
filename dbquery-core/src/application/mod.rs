// dbquery-core/src/application/mod.rs

pub mod engine;
pub mod invocation;
pub mod reporter;
pub mod runner;

// --- RE-EXPORTS (FACADE PATTERN) ---
// Permet à la CLI d'écrire `use dbquery_core::application::run_task;`
// sans connaître l'arborescence.

pub use engine::execute_statement;
pub use invocation::run_task;
pub use reporter::{ReportOptions, build_report};
pub use runner::{Replay, RunOptions, run_statements};
