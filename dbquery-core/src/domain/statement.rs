// dbquery-core/src/domain/statement.rs

use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;

/// Entry terminator shared by multi-statement sources and the replay log.
pub const STATEMENT_DELIMITER: &str = ";\n";

// A `;` followed by any whitespace run ends a statement.
static STATEMENT_BOUNDARY: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r";\s+").expect("statement boundary regex is valid")
});

/// One SQL unit. Identity is its exact text once trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Statement(String);

impl Statement {
    /// Trims surrounding whitespace and a trailing `;` terminator.
    /// Returns `None` when nothing is left.
    pub fn new(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        let trimmed = trimmed.strip_suffix(';').unwrap_or(trimmed).trim_end();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Splits a multi-statement source into its statements.
///
/// Trailing line breaks are stripped first; boundaries are a `;` followed by
/// whitespace, so a final `;` with nothing after it stays attached to the last
/// fragment (and is then dropped by [`Statement::new`]).
pub fn split_statements(content: &str) -> Vec<Statement> {
    let content = content.trim_end_matches(['\n', '\r']);
    STATEMENT_BOUNDARY
        .replace_all(content, STATEMENT_DELIMITER)
        .split(STATEMENT_DELIMITER)
        .filter_map(Statement::new)
        .collect()
}

/// Inverse of [`split_statements`] for canonical sources.
pub fn join_statements(statements: &[Statement]) -> String {
    statements
        .iter()
        .map(Statement::as_str)
        .collect::<Vec<_>>()
        .join(STATEMENT_DELIMITER)
}
