//! marquee-ingest - populate the catalog database from dataset exports
//!
//! Runs once before the catalog is served: resolves configuration, opens the
//! database, and bulk-loads every dataset if the catalog is still empty.
//! Exits non-zero if the load fails.

use anyhow::{Context, Result};
use clap::Parser;
use marquee_common::config::{ConfigOverrides, GatePolicy, ResolvedConfig, TomlConfig};
use marquee_ingest::{BulkLoader, PopulationOutcome, SqliteStore};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Command-line arguments for marquee-ingest
#[derive(Parser, Debug)]
#[command(name = "marquee-ingest")]
#[command(about = "Populate the Marquee catalog from spreadsheet exports")]
#[command(version)]
struct Args {
    /// Config file (default: <config dir>/marquee/config.toml)
    #[arg(short, long, env = "MARQUEE_CONFIG")]
    config: Option<PathBuf>,

    /// Root folder holding the database and data directory
    #[arg(short, long)]
    root_folder: Option<PathBuf>,

    /// SQLite database file
    #[arg(long, env = "MARQUEE_DATABASE")]
    database: Option<PathBuf>,

    /// Directory holding the dataset exports
    #[arg(long, env = "MARQUEE_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Rows per bulk write
    #[arg(long)]
    batch_size: Option<usize>,

    /// Gate policy: primary-only or per-dataset
    #[arg(long, value_parser = parse_gate)]
    gate: Option<GatePolicy>,
}

fn parse_gate(value: &str) -> std::result::Result<GatePolicy, String> {
    match value.trim().to_ascii_lowercase().replace('_', "-").as_str() {
        "primary-only" => Ok(GatePolicy::PrimaryOnly),
        "per-dataset" => Ok(GatePolicy::PerDataset),
        other => Err(format!(
            "unknown gate policy '{}' (expected primary-only or per-dataset)",
            other
        )),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let (toml_config, source) = TomlConfig::load_or_default(args.config.as_deref())?;

    // RUST_LOG wins over the configured level
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&toml_config.logging.level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting marquee-ingest");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    source.log();

    let config = ResolvedConfig::resolve(
        toml_config,
        ConfigOverrides {
            root_folder: args.root_folder,
            database_path: args.database,
            data_dir: args.data_dir,
            batch_size: args.batch_size,
            gate: args.gate,
        },
    )?;
    info!("Root folder: {}", config.root_folder.display());
    info!("Database: {}", config.database_path.display());
    info!("Data directory: {}", config.data_dir.display());

    let pool = marquee_common::db::init_database(&config.database_path)
        .await
        .context("Failed to open catalog database")?;

    let loader = BulkLoader::from_config(SqliteStore::new(pool.clone()), &config)?;
    let outcome = loader.populate_if_empty().await;
    pool.close().await;

    match outcome {
        Ok(PopulationOutcome::AlreadyPopulated { movie_count }) => {
            info!(movie_count, "Nothing to load");
        }
        Ok(PopulationOutcome::Loaded(summary)) => {
            for report in &summary.datasets {
                info!(
                    kind = %report.kind,
                    rows = report.rows_read,
                    records = report.records_written,
                    skipped = report.rows_skipped,
                    "Dataset summary"
                );
            }
            info!(
                run_id = %summary.run_id,
                records = summary.records_written(),
                elapsed_ms = summary.elapsed_ms(),
                "Catalog populated"
            );
        }
        Err(e) => {
            error!(error = %e, "Bulk load failed");
            return Err(e.into());
        }
    }

    Ok(())
}
