// dbquery-core/src/infrastructure/config/task.rs

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

use crate::domain::task::TaskConfig;
use crate::infrastructure::error::InfrastructureError;
use crate::infrastructure::source::QuerySource;

pub const PASSWORD_ENV: &str = "DBQUERY_PASSWORD";
pub const QUERY_LOG_ENV: &str = "DBQUERY_QUERY_LOG";

// --- CHARGEUR ---

/// Loads a YAML task file.
///
/// Relative `.sql` and query log paths are anchored at the task file's
/// directory, then environment overrides are applied.
#[instrument]
pub fn load_task_config(task_path: &Path) -> Result<TaskConfig, InfrastructureError> {
    if !task_path.exists() {
        return Err(InfrastructureError::ConfigNotFound(
            task_path.display().to_string(),
        ));
    }
    info!(path = ?task_path, "Loading task file");

    let content = fs::read_to_string(task_path)?;
    let mut task: TaskConfig = serde_yaml::from_str(&content)?;

    let base_dir = task_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    anchor_paths(&mut task, &base_dir);

    apply_env_overrides(&mut task);
    Ok(task)
}

fn anchor_paths(task: &mut TaskConfig, base_dir: &Path) {
    if let QuerySource::File(path) = QuerySource::parse_relative_to(&task.query, base_dir) {
        task.query = path.display().to_string();
    }
    if let Some(log) = task.query_log.as_mut()
        && log.is_relative()
    {
        *log = base_dir.join(&*log);
    }
}

/// Layers secrets and paths from the environment over the task.
pub fn apply_env_overrides(task: &mut TaskConfig) {
    apply_env_overrides_from(task, |key| std::env::var(key).ok());
}

/// Same as [`apply_env_overrides`], reading variables through `lookup`.
///
/// The query log only applies to engines that keep one; a postgres task
/// ignores it instead of failing its option check.
pub fn apply_env_overrides_from(task: &mut TaskConfig, lookup: impl Fn(&str) -> Option<String>) {
    if task.connection.password.is_none()
        && let Some(val) = lookup(PASSWORD_ENV)
    {
        info!("Using password from {}", PASSWORD_ENV);
        task.connection.password = Some(val);
    }
    if let Some(val) = lookup(QUERY_LOG_ENV) {
        if task.engine.requires_replay_log() {
            info!(old = ?task.query_log, new = ?val, "Overriding query log via ENV");
            task.query_log = Some(PathBuf::from(val));
        } else {
            debug!(engine = %task.engine, "Ignoring {}: engine keeps no query log", QUERY_LOG_ENV);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::engine::Engine;
    use crate::domain::replay::MatchMode;
    use crate::domain::task::SslMode;
    use anyhow::Result;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_load_full_task() -> Result<()> {
        let dir = tempdir()?;
        let task_path = dir.path().join("load_users.yaml");
        fs::write(
            &task_path,
            r#"
engine: impala
connection:
  db: acme
  host: impala.internal
  user: etl
  ssl_mode: verify-full
query: scripts/load.sql
named_args:
  a_value: "string value 1"
  b_value: 2
fact: my_key
query_log: logs/impala.log
replay_match: normalized
"#,
        )?;

        let task = load_task_config(&task_path)?;
        assert_eq!(task.engine, Engine::Impala);
        assert_eq!(task.connection.db.as_deref(), Some("acme"));
        assert_eq!(task.connection.ssl_mode, SslMode::VerifyFull);
        assert_eq!(
            task.query,
            dir.path().join("scripts/load.sql").display().to_string()
        );
        assert_eq!(task.fact.as_deref(), Some("my_key"));
        assert_eq!(task.replay_match, MatchMode::Normalized);
        assert_eq!(
            task.named_args.as_ref().and_then(|m| m.get("b_value")),
            Some(&json!(2))
        );
        if std::env::var(QUERY_LOG_ENV).is_err() {
            assert_eq!(task.query_log, Some(dir.path().join("logs/impala.log")));
        }
        Ok(())
    }

    #[test]
    fn test_literal_query_is_untouched() -> Result<()> {
        let dir = tempdir()?;
        let task_path = dir.path().join("task.yaml");
        fs::write(
            &task_path,
            "engine: postgres\nquery: SELECT * FROM t WHERE id = %s\npositional_args: [1]\n",
        )?;

        let task = load_task_config(&task_path)?;
        assert_eq!(task.query, "SELECT * FROM t WHERE id = %s");
        assert_eq!(task.positional_args, Some(vec![json!(1)]));
        assert!(!task.check_mode);
        Ok(())
    }

    fn env(vars: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |key| {
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn test_query_log_env_is_ignored_for_postgres() -> Result<()> {
        let mut task = TaskConfig::new(Engine::Postgres, "SELECT 1");
        apply_env_overrides_from(
            &mut task,
            env(&[(QUERY_LOG_ENV, "/tmp/pg.log"), (PASSWORD_ENV, "s3cret")]),
        );

        assert_eq!(task.query_log, None);
        assert_eq!(task.connection.password.as_deref(), Some("s3cret"));
        task.check()?;
        Ok(())
    }

    #[test]
    fn test_query_log_env_overrides_impala() {
        let mut task = TaskConfig::new(Engine::Impala, "SELECT 1");
        task.query_log = Some(PathBuf::from("/srv/old.log"));
        task.connection.password = Some("from-file".into());
        apply_env_overrides_from(
            &mut task,
            env(&[(QUERY_LOG_ENV, "/tmp/impala.log"), (PASSWORD_ENV, "s3cret")]),
        );

        assert_eq!(task.query_log, Some(PathBuf::from("/tmp/impala.log")));
        assert_eq!(task.connection.password.as_deref(), Some("from-file"));
    }

    #[test]
    fn test_missing_task_file() {
        let result = load_task_config(Path::new("/nope/task.yaml"));
        assert!(matches!(result, Err(InfrastructureError::ConfigNotFound(_))));
    }

    #[test]
    fn test_invalid_yaml_is_reported() -> Result<()> {
        let dir = tempdir()?;
        let task_path = dir.path().join("task.yaml");
        fs::write(&task_path, "engine: oracle\nquery: SELECT 1\n")?;
        assert!(matches!(
            load_task_config(&task_path),
            Err(InfrastructureError::YamlError(_))
        ));
        Ok(())
    }
}
