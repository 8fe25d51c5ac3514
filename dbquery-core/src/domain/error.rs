// dbquery-core/src/domain/error.rs

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum DomainError {
    #[error("Positional and named arguments are mutually exclusive")]
    #[diagnostic(
        code(dbquery::domain::configuration_conflict),
        help("Pass either `positional_args` (--arg) or `named_args` (--named), not both.")
    )]
    ConfigurationConflict,

    #[error("Unable to bind arguments to '{statement}': {reason}")]
    #[diagnostic(
        code(dbquery::domain::binding),
        help("Placeholders are `%s` (positional) or `%(name)s` (named); use `%%` for a literal percent sign.")
    )]
    ArgumentBinding { statement: String, reason: String },

    #[error("Option '{option}' is not supported by the {engine} engine")]
    #[diagnostic(code(dbquery::domain::unsupported_option))]
    UnsupportedOption { engine: String, option: String },

    #[error("No {engine} {option} provided, can't continue the run")]
    #[diagnostic(code(dbquery::domain::missing_option))]
    MissingOption { engine: String, option: String },

    #[error("Query '{statement}' cannot be recorded in the query log")]
    #[diagnostic(
        code(dbquery::domain::unloggable_statement),
        help("Log entries end with `;` and a line break, so a statement cannot contain one. Put the statements in a `.sql` file so each one is split and logged on its own.")
    )]
    UnloggableStatement { statement: String },

    #[error("Invalid task configuration: {0}")]
    #[diagnostic(
        code(dbquery::domain::invalid_task),
        help("Check ports, names and the query field of the task.")
    )]
    InvalidTask(String),
}
