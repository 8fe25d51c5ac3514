// dbquery-core/src/infrastructure/source.rs

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

use crate::domain::statement::{Statement, split_statements};
use crate::infrastructure::error::InfrastructureError;

const SQL_FILE_SUFFIX: &str = ".sql";

/// Where the SQL of a run comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuerySource {
    Literal(String),
    File(PathBuf),
}

impl QuerySource {
    /// A query ending in `.sql` names a file; anything else is SQL text.
    pub fn parse(query: &str) -> Self {
        if query.trim_end().ends_with(SQL_FILE_SUFFIX) {
            QuerySource::File(PathBuf::from(query.trim()))
        } else {
            QuerySource::Literal(query.to_string())
        }
    }

    /// Same as [`QuerySource::parse`], with relative file paths anchored at `base`.
    pub fn parse_relative_to(query: &str, base: &Path) -> Self {
        match Self::parse(query) {
            QuerySource::File(path) if path.is_relative() => QuerySource::File(base.join(path)),
            other => other,
        }
    }

    #[instrument(skip(self), fields(source = %self))]
    pub fn resolve(&self) -> Result<Vec<Statement>, InfrastructureError> {
        match self {
            QuerySource::Literal(sql) => Statement::new(sql)
                .map(|stmt| vec![stmt])
                .ok_or_else(|| InfrastructureError::ConfigError("query is empty".into())),
            QuerySource::File(path) => {
                let content = fs::read_to_string(path).map_err(|source| {
                    InfrastructureError::SourceUnavailable {
                        path: path.display().to_string(),
                        source,
                    }
                })?;
                let statements = split_statements(&content);
                info!(path = ?path, statements = statements.len(), "Loaded SQL file");
                Ok(statements)
            }
        }
    }
}

impl std::fmt::Display for QuerySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuerySource::Literal(_) => f.write_str("inline query"),
            QuerySource::File(path) => write!(f, "{}", path.display()),
        }
    }
}
