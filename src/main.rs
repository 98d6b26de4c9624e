//! # Roster CLI (`roster`)
//!
//! Crawls the instructor roster, resolves names against it, and serves the
//! lookup API.
//!
//! ## Usage
//!
//! ```bash
//! roster --config ./config/roster.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `roster crawl` | Crawl the remote source and replace the snapshot |
//! | `roster resolve <NAME>...` | Resolve names against the snapshot |
//! | `roster sample` | Show the snapshot size and first records |
//! | `roster serve` | Start the HTTP server |
//!
//! `resolve` and `sample` crawl first when no snapshot exists. `serve` starts
//! immediately and crawls on the first data request that finds no snapshot.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::Level;

use roster_match::{acquire, config, lookup, server};

/// Roster — resolve instructor names against a harvested ratings roster.
#[derive(Parser)]
#[command(name = "roster", version, about)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/roster.toml`. A missing file is an error; an
    /// empty file uses all defaults.
    #[arg(long, global = true, default_value = "./config/roster.toml")]
    config: PathBuf,

    /// Log level: `error`, `warn`, `info`, `debug`, or `trace`.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl the remote roster and replace the snapshot.
    ///
    /// Walks every page of the configured source, pausing between pages,
    /// and writes the snapshot only if the whole crawl succeeds.
    Crawl,

    /// Resolve instructor names against the snapshot.
    ///
    /// Prints one row per resolved name. Names with no match are skipped.
    Resolve {
        /// Names to resolve, e.g. "Jane Smith".
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Show the snapshot size and its first records.
    Sample {
        /// Number of records to print.
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },

    /// Start the HTTP server on `[server].bind`.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = Level::from_str(&cli.log_level)
        .map_err(|_| anyhow::anyhow!("Unknown log level: '{}'", cli.log_level))?;
    let collector = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(collector)?;

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Crawl => {
            acquire::run_crawl(&cfg).await?;
        }
        Commands::Resolve { names } => {
            lookup::run_resolve(&cfg, &names).await?;
        }
        Commands::Sample { limit } => {
            lookup::run_sample(&cfg, limit).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
