// dbquery/src/main.rs

mod cli;
mod commands;
mod output;

use clap::Parser;
use miette::{IntoDiagnostic, Result};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};

fn init_tracing(verbose: u8) {
    // RUST_LOG wins over -v when set.
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        // --- USE CASE: POSTGRESQL ---
        Commands::Postgres {
            connection,
            query,
            check,
        } => commands::postgres::execute(connection, query, check).await,

        // --- USE CASE: IMPALA ---
        Commands::Impala {
            connection,
            query,
            query_log,
            odbc_driver,
            replay_match,
        } => {
            commands::impala::execute(connection, query, query_log, odbc_driver, replay_match)
                .await
        }

        // --- USE CASE: FICHIER DE TÂCHE ---
        Commands::Run { task } => commands::run::execute(&task).await,
    };

    match result {
        Ok(report) => {
            println!("{}", output::render_report(&report, cli.format).into_diagnostic()?);
            Ok(())
        }
        Err(e) => {
            println!("{}", output::render_failure(&e.to_string()));
            // miette renders the diagnostic on stderr and exits with status 1
            Err(e.into())
        }
    }
}
