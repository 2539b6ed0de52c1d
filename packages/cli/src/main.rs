//! IndexSync command line runner
//!
//! Reads the desired indexes from a JSON configuration file and reconciles
//! them against a MongoDB database.
//!
//! # Usage
//!
//! ```bash
//! # Create whatever is missing
//! indexsync --config indexes.json ensure
//!
//! # Show what would happen, without writing
//! indexsync --config indexes.json plan --output json
//!
//! # Show the indexes that exist today
//! MONGODB_URI=mongodb://db:27017 indexsync list
//! ```
//!
//! # Environment Variables
//!
//! - `INDEXSYNC_CONFIG`: configuration file (default: `indexsync.json`)
//! - `MONGODB_URI`: overrides `connection.uri`
//! - `INDEXSYNC_DATABASE`: overrides `connection.database`
//! - `RUST_LOG`: log filter (e.g. "info", "indexsync_core=debug")
//!
//! Exits with status 1 when the run fails or any index could not be created.

mod logging;
mod output;

use clap::{Parser, Subcommand};
use indexsync_core::{IndexManager, IndexServiceError, IndexSyncConfig, MongoIndexStore};
use logging::LogFormat;
use output::OutputFormat;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(name = "indexsync", version, about = "Reconcile declared MongoDB indexes")]
struct Cli {
    /// Configuration file with connection settings and desired indexes
    #[arg(short, long, env = "INDEXSYNC_CONFIG", default_value = "indexsync.json")]
    config: PathBuf,

    /// MongoDB connection string (overrides the configuration file)
    #[arg(long, env = "MONGODB_URI")]
    uri: Option<String>,

    /// Database name (overrides the configuration file)
    #[arg(long, env = "INDEXSYNC_DATABASE")]
    database: Option<String>,

    /// Log at debug level
    #[arg(long)]
    debug: bool,

    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create missing indexes
    Ensure {
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        output: OutputFormat,
    },
    /// Classify desired indexes without creating anything
    Plan {
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        output: OutputFormat,
    },
    /// List the indexes currently defined on configured collections
    List {
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        output: OutputFormat,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.debug, cli.log_format);

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            tracing::error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

/// Returns whether the run finished without failures
async fn run(cli: Cli) -> anyhow::Result<bool> {
    let mut config = IndexSyncConfig::load(&cli.config).await?;
    if let Some(uri) = cli.uri {
        config.connection.uri = uri;
    }
    if let Some(database) = cli.database {
        config.connection.database = database;
    }
    config.validate()?;

    tracing::info!(
        "Loaded {} collection(s) from {}",
        config.collections.len(),
        cli.config.display()
    );

    let store = Arc::new(MongoIndexStore::connect(&config.connection).await?);
    let mut settings = config.manager_settings();
    let timeout_secs = config.timeout_secs;
    let timeout = Duration::from_secs(timeout_secs);

    let (output, dry_run) = match cli.command {
        Command::Ensure { output } => (output, false),
        Command::Plan { output } => (output, true),
        Command::List { output } => {
            let manager = IndexManager::new(store, settings, config.collections);
            let catalogs = tokio::time::timeout(timeout, manager.list_catalogs())
                .await
                .map_err(|_| IndexServiceError::timeout(timeout_secs))??;
            output::print_catalogs(&catalogs, output)?;
            return Ok(true);
        }
    };

    settings.dry_run |= dry_run;
    let manager = IndexManager::new(store, settings, config.collections);
    let report = tokio::time::timeout(timeout, manager.ensure())
        .await
        .map_err(|_| IndexServiceError::timeout(timeout_secs))??;

    output::print_report(&report, output)?;
    Ok(!report.has_failures())
}
