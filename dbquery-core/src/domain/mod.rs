pub mod arguments;
pub mod binding;
pub mod engine;
pub mod error;
pub mod replay;
pub mod report;
pub mod statement;
pub mod task;

// Chemins courts pour la CLI et la couche application
pub use arguments::QueryArguments;
pub use engine::{ChangePolicy, Engine};
pub use error::DomainError;
pub use replay::{ExecutedSet, MatchMode};
pub use report::{ExecutionReport, ResultRow, ResultSet, StatementOutcome};
pub use statement::Statement;
