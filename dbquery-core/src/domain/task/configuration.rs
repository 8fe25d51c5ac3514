// dbquery-core/src/domain/task/configuration.rs

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;
use validator::Validate;

use crate::domain::arguments::QueryArguments;
use crate::domain::engine::Engine;
use crate::domain::error::DomainError;
use crate::domain::replay::MatchMode;

/// libpq `sslmode` values.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum SslMode {
    Disable,
    Allow,
    #[default]
    Prefer,
    Require,
    VerifyCa,
    VerifyFull,
}

/// Where the connector should dial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Tcp { host: String, port: u16 },
    Socket { path: PathBuf, port: u16 },
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, Validate)]
pub struct ConnectionSettings {
    #[validate(length(min = 1, message = "Database name cannot be empty"))]
    pub db: Option<String>,

    pub host: Option<String>,

    #[validate(range(min = 1, message = "Port must be between 1 and 65535"))]
    pub port: Option<u16>,

    pub user: Option<String>,

    #[serde(default, skip_serializing)]
    pub password: Option<String>,

    pub unix_socket: Option<PathBuf>,

    #[serde(default)]
    pub ssl_mode: SslMode,

    pub ssl_rootcert: Option<PathBuf>,

    /// ODBC driver name (Impala only).
    pub odbc_driver: Option<String>,
}

impl ConnectionSettings {
    pub fn port_for(&self, engine: Engine) -> u16 {
        self.port.unwrap_or_else(|| engine.default_port())
    }

    pub fn user_for(&self, engine: Engine) -> String {
        self.user
            .clone()
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| engine.default_user().to_string())
    }

    /// A unix socket only replaces a local host.
    pub fn endpoint_for(&self, engine: Engine) -> Endpoint {
        let port = self.port_for(engine);
        let host = self.host.clone().unwrap_or_default();
        let is_localhost = host.is_empty() || host == "localhost";

        match &self.unix_socket {
            Some(path) if is_localhost && !path.as_os_str().is_empty() => Endpoint::Socket {
                path: path.clone(),
                port,
            },
            _ if host.is_empty() => Endpoint::Tcp {
                host: "localhost".to_string(),
                port,
            },
            _ => Endpoint::Tcp { host, port },
        }
    }
}

/// Every parameter of one invocation.
#[derive(Debug, Deserialize, Serialize, Clone, Validate)]
pub struct TaskConfig {
    pub engine: Engine,

    #[serde(default)]
    #[validate(nested)]
    pub connection: ConnectionSettings,

    /// Literal SQL, or a path ending in `.sql`.
    #[validate(length(min = 1, message = "Query cannot be empty"))]
    pub query: String,

    pub positional_args: Option<Vec<Value>>,

    pub named_args: Option<Map<String, Value>>,

    /// Receives the query results in the report's `facts`.
    #[validate(length(min = 1, message = "Fact name cannot be empty"))]
    pub fact: Option<String>,

    pub query_log: Option<PathBuf>,

    #[serde(default)]
    pub check_mode: bool,

    #[serde(default)]
    pub strict_fetch: bool,

    #[serde(default)]
    pub replay_match: MatchMode,
}

impl TaskConfig {
    pub fn new(engine: Engine, query: impl Into<String>) -> Self {
        Self {
            engine,
            connection: ConnectionSettings::default(),
            query: query.into(),
            positional_args: None,
            named_args: None,
            fact: None,
            query_log: None,
            check_mode: false,
            strict_fetch: false,
            replay_match: MatchMode::default(),
        }
    }

    pub fn arguments(&self) -> Result<QueryArguments, DomainError> {
        QueryArguments::from_parts(self.positional_args.clone(), self.named_args.clone())
    }

    /// Field rules plus the per-engine option rules.
    pub fn check(&self) -> Result<(), DomainError> {
        self.validate()
            .map_err(|e| DomainError::InvalidTask(e.to_string()))?;

        let engine = self.engine.to_string();
        if self.check_mode && !self.engine.supports_check_mode() {
            return Err(DomainError::UnsupportedOption {
                engine,
                option: "check_mode".into(),
            });
        }
        match (&self.query_log, self.engine.requires_replay_log()) {
            (None, true) => Err(DomainError::MissingOption {
                engine,
                option: "query_log".into(),
            }),
            (Some(_), false) => Err(DomainError::UnsupportedOption {
                engine,
                option: "query_log".into(),
            }),
            _ => Ok(()),
        }
    }
}
