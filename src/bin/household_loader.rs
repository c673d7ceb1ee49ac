//! household-loader
//!
//! Loads an export file into a document store and prints a run summary.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use household_loader::storage::DocumentStore;
use household_loader::{
    InMemoryDocumentStore, Loader, LoaderConfig, DEFAULT_COLLECTION, DEFAULT_PROGRESS_EVERY,
    LOG_LEVEL_ENV,
};

#[derive(Parser, Debug)]
#[command(name = "household-loader")]
#[command(about = "Load households, members and addresses into a document store", long_about = None)]
struct Cli {
    /// Export file (JSON with members, households and addresses)
    input: PathBuf,

    /// Destination collection; its previous contents are replaced
    #[arg(long, default_value = DEFAULT_COLLECTION)]
    collection: String,

    /// Log one progress line every N records
    #[arg(long, default_value_t = DEFAULT_PROGRESS_EVERY)]
    progress_every: usize,

    /// Log filter; PM_LOG_LEVEL takes precedence when set
    #[arg(long, default_value = "debug")]
    log_level: String,

    /// Directory of a file-backed store; without it the load runs in memory
    #[cfg(feature = "persistent")]
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Skip fsync after each journal write
    #[cfg(feature = "persistent")]
    #[arg(long)]
    no_sync: bool,
}

fn init_logging(flag: &str) -> Result<()> {
    let level = std::env::var(LOG_LEVEL_ENV)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| flag.to_string());
    let filter = EnvFilter::try_new(&level)
        .with_context(|| format!("invalid log level '{level}'"))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
    Ok(())
}

#[cfg(feature = "persistent")]
fn connect_store(cli: &Cli) -> Result<Arc<dyn DocumentStore>> {
    use household_loader::storage::{open_store, PersistentConfig};

    let Some(dir) = &cli.data_dir else {
        return Ok(Arc::new(InMemoryDocumentStore::new()));
    };
    let config = PersistentConfig {
        sync_on_write: !cli.no_sync,
    };
    let store = open_store(dir, Some(config))
        .with_context(|| format!("failed to open store at {}", dir.display()))?;
    Ok(Arc::new(store))
}

#[cfg(not(feature = "persistent"))]
#[allow(clippy::unnecessary_wraps)]
fn connect_store(_cli: &Cli) -> Result<Arc<dyn DocumentStore>> {
    Ok(Arc::new(InMemoryDocumentStore::new()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    let store = connect_store(&cli)?;
    let config = LoaderConfig::default()
        .collection(cli.collection.clone())
        .progress_every(cli.progress_every);
    let loader = Loader::new(store, config);

    let report = loader
        .run_file(&cli.input)
        .with_context(|| format!("load of {} failed", cli.input.display()))?;

    println!("households read:   {}", report.households_read);
    println!("documents stored:  {}", report.stored);
    println!("documents dropped: {}", report.dropped());
    println!("documents updated: {}", report.fixed_up);
    if !report.unmatched.is_empty() {
        println!("updates unmatched: {}", report.unmatched.len());
    }
    if !report.soft_errors.is_empty() {
        println!("unresolved optional references: {}", report.soft_errors.len());
        for soft in &report.soft_errors {
            println!("  {soft}");
        }
    }
    Ok(())
}
