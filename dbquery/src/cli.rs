// dbquery/src/cli.rs
//
// Single source of truth for all CLI definitions (Clap structs).

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use serde_json::{Map, Value};
use std::path::PathBuf;

use dbquery_core::domain::engine::Engine;
use dbquery_core::domain::replay::MatchMode;
use dbquery_core::domain::task::{ConnectionSettings, SslMode, TaskConfig};
use dbquery_core::infrastructure::config::task::{PASSWORD_ENV, QUERY_LOG_ENV};

#[derive(Parser)]
#[command(name = "dbquery")]
#[command(about = "Runs SQL against PostgreSQL or Impala, with replay-safe query logs", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Log verbosity on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Report format on stdout
    #[arg(long, value_enum, default_value_t = OutputFormat::Json, global = true)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 🐘 Runs SQL against PostgreSQL in one transaction
    Postgres {
        #[command(flatten)]
        connection: ConnectionArgs,

        #[command(flatten)]
        query: QueryArgs,

        /// Roll back instead of committing
        #[arg(long)]
        check: bool,
    },

    /// 🦌 Runs SQL against Impala, skipping statements already in the query log
    Impala {
        #[command(flatten)]
        connection: ConnectionArgs,

        #[command(flatten)]
        query: QueryArgs,

        /// File recording executed statements (required)
        #[arg(long, env = QUERY_LOG_ENV)]
        query_log: Option<PathBuf>,

        /// ODBC driver name registered with the driver manager
        #[arg(long)]
        odbc_driver: Option<String>,

        /// How statements are compared with the query log
        #[arg(long, value_enum, default_value_t = ReplayMatch::Exact)]
        replay_match: ReplayMatch,
    },

    /// 📄 Runs a YAML task file
    Run {
        /// Path to the task file
        task: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReplayMatch {
    Exact,
    Normalized,
}

impl From<ReplayMatch> for MatchMode {
    fn from(value: ReplayMatch) -> Self {
        match value {
            ReplayMatch::Exact => MatchMode::Exact,
            ReplayMatch::Normalized => MatchMode::Normalized,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SslModeArg {
    Disable,
    Allow,
    Prefer,
    Require,
    VerifyCa,
    VerifyFull,
}

impl From<SslModeArg> for SslMode {
    fn from(value: SslModeArg) -> Self {
        match value {
            SslModeArg::Disable => SslMode::Disable,
            SslModeArg::Allow => SslMode::Allow,
            SslModeArg::Prefer => SslMode::Prefer,
            SslModeArg::Require => SslMode::Require,
            SslModeArg::VerifyCa => SslMode::VerifyCa,
            SslModeArg::VerifyFull => SslMode::VerifyFull,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ConnectionArgs {
    /// Database (PostgreSQL) or schema (Impala) to use
    #[arg(long)]
    pub db: Option<String>,

    /// Server host (default: localhost)
    #[arg(long)]
    pub host: Option<String>,

    /// Server port (default: 5432 for PostgreSQL, 21050 for Impala)
    #[arg(long)]
    pub port: Option<u16>,

    #[arg(long, short)]
    pub user: Option<String>,

    #[arg(long, env = PASSWORD_ENV, hide_env_values = true)]
    pub password: Option<String>,

    /// Unix socket directory, used when the host is local
    #[arg(long)]
    pub unix_socket: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = SslModeArg::Prefer)]
    pub ssl_mode: SslModeArg,

    /// CA certificate for verify-ca / verify-full
    #[arg(long)]
    pub ssl_rootcert: Option<PathBuf>,
}

impl ConnectionArgs {
    fn into_settings(self) -> ConnectionSettings {
        ConnectionSettings {
            db: self.db,
            host: self.host,
            port: self.port,
            user: self.user,
            password: self.password,
            unix_socket: self.unix_socket,
            ssl_mode: self.ssl_mode.into(),
            ssl_rootcert: self.ssl_rootcert,
            odbc_driver: None,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct QueryArgs {
    /// SQL text, or a path ending in `.sql`
    #[arg(long, short)]
    pub query: String,

    /// Positional argument for `%s` (JSON, or plain text). Repeatable.
    #[arg(long = "arg", value_name = "VALUE", value_parser = parse_value)]
    pub args: Vec<Value>,

    /// Named argument for `%(key)s`, as KEY=VALUE. Repeatable.
    #[arg(long = "named", value_name = "KEY=VALUE", value_parser = parse_named)]
    pub named: Vec<(String, Value)>,

    /// Publish the result rows under this fact name
    #[arg(long)]
    pub fact: Option<String>,

    /// Fail when a statement reports rows but none can be fetched
    #[arg(long)]
    pub strict_fetch: bool,
}

/// JSON when it parses (`3`, `null`, `[1,2]`), plain text otherwise.
fn parse_value(raw: &str) -> Result<Value, String> {
    Ok(serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string())))
}

fn parse_named(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", raw))?;
    if key.is_empty() {
        return Err(format!("empty argument name in '{}'", raw));
    }
    Ok((key.to_string(), parse_value(value)?))
}

impl QueryArgs {
    fn into_task(self, engine: Engine, connection: ConnectionSettings) -> TaskConfig {
        let mut task = TaskConfig::new(engine, self.query);
        task.connection = connection;
        task.positional_args = (!self.args.is_empty()).then_some(self.args);
        task.named_args =
            (!self.named.is_empty()).then(|| self.named.into_iter().collect::<Map<_, _>>());
        task.fact = self.fact;
        task.strict_fetch = self.strict_fetch;
        task
    }
}

/// Builds the task for `dbquery postgres`.
pub fn postgres_task(connection: ConnectionArgs, query: QueryArgs, check: bool) -> TaskConfig {
    let mut task = query.into_task(Engine::Postgres, connection.into_settings());
    task.check_mode = check;
    task
}

/// Builds the task for `dbquery impala`.
pub fn impala_task(
    connection: ConnectionArgs,
    query: QueryArgs,
    query_log: Option<PathBuf>,
    odbc_driver: Option<String>,
    replay_match: ReplayMatch,
) -> TaskConfig {
    let mut settings = connection.into_settings();
    settings.odbc_driver = odbc_driver;
    let mut task = query.into_task(Engine::Impala, settings);
    task.query_log = query_log;
    task.replay_match = replay_match.into();
    task
}
