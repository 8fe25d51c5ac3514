// dbquery-core/src/domain/engine.rs

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::binding::LiteralDialect;

/// Target database engine.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    Postgres,
    Impala,
}

/// How the run decides whether it changed database state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangePolicy {
    /// Unchanged when the final status line mentions `SELECT`.
    StatusText,
    /// No read-only detection is available; always changed.
    Always,
}

impl ChangePolicy {
    pub fn is_changed(self, status: &str) -> bool {
        match self {
            ChangePolicy::StatusText => !status.contains("SELECT"),
            ChangePolicy::Always => true,
        }
    }
}

impl Engine {
    pub fn default_port(self) -> u16 {
        match self {
            Engine::Postgres => 5432,
            Engine::Impala => 21050,
        }
    }

    pub fn default_user(self) -> &'static str {
        match self {
            Engine::Postgres => "postgres",
            Engine::Impala => "impala",
        }
    }

    pub fn change_policy(self) -> ChangePolicy {
        match self {
            Engine::Postgres => ChangePolicy::StatusText,
            Engine::Impala => ChangePolicy::Always,
        }
    }

    /// Only transactional engines can dry-run by rolling back.
    pub fn supports_check_mode(self) -> bool {
        matches!(self, Engine::Postgres)
    }

    /// Impala cannot safely re-apply statements, so it needs a replay log.
    pub fn requires_replay_log(self) -> bool {
        matches!(self, Engine::Impala)
    }

    pub fn literal_dialect(self) -> LiteralDialect {
        match self {
            Engine::Postgres => LiteralDialect::Postgres,
            Engine::Impala => LiteralDialect::Impala,
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Engine::Postgres => f.write_str("postgres"),
            Engine::Impala => f.write_str("impala"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_text_policy() {
        let policy = Engine::Postgres.change_policy();
        assert!(!policy.is_changed("SELECT 0"));
        assert!(policy.is_changed("INSERT 0 1"));
        assert!(policy.is_changed("CREATE TABLE"));
    }

    #[test]
    fn test_impala_always_changes() {
        assert!(Engine::Impala.change_policy().is_changed("SELECT 3"));
        assert!(Engine::Impala.requires_replay_log());
        assert!(!Engine::Impala.supports_check_mode());
    }
}
