// dbquery-core/src/infrastructure/replay_log.rs

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

use crate::domain::replay::{ExecutedSet, MatchMode, format_log_entry};
use crate::domain::statement::Statement;
use crate::error::DbQueryError;
use crate::infrastructure::error::InfrastructureError;
use crate::ports::replay::ReplayStore;

/// Append-only file of executed statements, one `text;\n` entry each.
///
/// The file handle is held for the whole run. Dropping the log flushes it, so
/// the handle is released on every exit path even when [`ReplayStore::close`]
/// is never reached.
#[derive(Debug)]
pub struct ReplayLog {
    path: PathBuf,
    file: Option<File>,
}

impl ReplayLog {
    /// Opens (or creates) the log for reading and appending.
    #[instrument]
    pub fn open(path: &Path) -> Result<Self, InfrastructureError> {
        let file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(path)
            .map_err(|source| Self::unavailable(path, source))?;
        info!(path = ?path, "Opened query log");
        Ok(Self {
            path: path.to_path_buf(),
            file: Some(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn unavailable(path: &Path, source: std::io::Error) -> InfrastructureError {
        InfrastructureError::LogUnavailable {
            path: path.display().to_string(),
            source,
        }
    }

    fn file(&mut self) -> Result<&mut File, InfrastructureError> {
        let path = self.path.clone();
        self.file.as_mut().ok_or_else(|| {
            Self::unavailable(&path, std::io::Error::other("query log already closed"))
        })
    }
}

impl ReplayStore for ReplayLog {
    fn load_executed(&mut self, mode: MatchMode) -> Result<ExecutedSet, DbQueryError> {
        let path = self.path.clone();
        let file = self.file()?;
        let mut content = String::new();
        file.rewind()
            .and_then(|_| file.read_to_string(&mut content))
            .map_err(|source| Self::unavailable(&path, source))?;

        let executed = ExecutedSet::from_log_content(&content, mode);
        debug!(entries = executed.len(), "Loaded query log");
        Ok(executed)
    }

    fn record_executed(&mut self, statement: &Statement) -> Result<(), DbQueryError> {
        let path = self.path.clone();
        let file = self.file()?;
        file.write_all(format_log_entry(statement).as_bytes())
            .and_then(|_| file.sync_data())
            .map_err(|source| Self::unavailable(&path, source))?;
        Ok(())
    }

    fn close(mut self: Box<Self>) -> Result<(), DbQueryError> {
        if let Some(file) = self.file.take() {
            file.sync_all()
                .map_err(|source| Self::unavailable(&self.path, source))?;
        }
        debug!(path = ?self.path, "Closed query log");
        Ok(())
    }
}

impl Drop for ReplayLog {
    fn drop(&mut self) {
        if let Some(file) = self.file.take()
            && let Err(e) = file.sync_all()
        {
            warn!(path = ?self.path, error = %e, "Failed to flush query log on release");
        }
    }
}
