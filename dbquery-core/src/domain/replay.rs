// dbquery-core/src/domain/replay.rs

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::domain::error::DomainError;
use crate::domain::statement::{STATEMENT_DELIMITER, Statement};

/// How a statement is compared with the replay log entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Byte-for-byte text. Textually different but equivalent statements
    /// both run.
    #[default]
    Exact,
    /// Whitespace runs collapse to one space before comparison.
    Normalized,
}

impl MatchMode {
    fn key(self, text: &str) -> String {
        match self {
            MatchMode::Exact => text.to_string(),
            MatchMode::Normalized => text.split_whitespace().collect::<Vec<_>>().join(" "),
        }
    }
}

/// Statements already executed by earlier runs.
#[derive(Debug, Clone, Default)]
pub struct ExecutedSet {
    mode: MatchMode,
    seen: HashSet<String>,
}

impl ExecutedSet {
    pub fn new(mode: MatchMode) -> Self {
        Self {
            mode,
            seen: HashSet::new(),
        }
    }

    /// Builds the set from raw log content.
    pub fn from_log_content(content: &str, mode: MatchMode) -> Self {
        let mut set = Self::new(mode);
        for entry in parse_log_entries(content) {
            set.seen.insert(mode.key(entry));
        }
        set
    }

    pub fn contains(&self, statement: &Statement) -> bool {
        self.seen.contains(&self.mode.key(statement.as_str()))
    }

    pub fn insert(&mut self, statement: &Statement) -> bool {
        self.seen.insert(self.mode.key(statement.as_str()))
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

/// Entries are `;\n`-terminated; empty ones are dropped.
pub fn parse_log_entries(content: &str) -> impl Iterator<Item = &str> {
    content
        .trim_end_matches('\n')
        .split(STATEMENT_DELIMITER)
        .filter(|entry| !entry.is_empty())
}

/// Rejects statements whose log entry would read back as several entries.
///
/// A statement holding the entry terminator would never match its own entry
/// on the next run, and would be executed and logged again each time.
pub fn ensure_loggable(statements: &[Statement]) -> Result<(), DomainError> {
    match statements
        .iter()
        .find(|s| s.as_str().contains(STATEMENT_DELIMITER))
    {
        Some(statement) => Err(DomainError::UnloggableStatement {
            statement: statement.to_string(),
        }),
        None => Ok(()),
    }
}

/// One log line for `statement`.
pub fn format_log_entry(statement: &Statement) -> String {
    format!("{}{}", statement.as_str(), STATEMENT_DELIMITER)
}
