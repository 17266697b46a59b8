//! Workdeck workspace engine
//!
//! Binary entry point: parses the CLI, sets up logging and configuration,
//! opens the sqlite-backed store and either runs the engine with its
//! background sync loop or executes a snapshot subcommand.

use anyhow::Result;
use clap::Parser;
use std::fs::OpenOptions;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;
use workdeck::cli::{Cli, Command};
use workdeck::config::Config;
use workdeck::defaults;
use workdeck::engine::Engine;
use workdeck::export::{export_snapshot, import_snapshot};
use workdeck::notify::LogNotifier;
use workdeck::session::SessionStore;
use workdeck::store::sqlite::default_notification_settings;
use workdeck::store::{SqliteStore, Store};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on --log option
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    match cli.log.as_str() {
        "0" | "off" => {
            // No logging
        }
        "1" | "stdout" => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(std::io::stdout)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        "2" | "stderr" => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        filename => {
            // Log to file (append mode)
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(filename)?;
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(file)
                .with_ansi(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }

    // An explicit --config flag takes priority over discovery.
    // SAFETY: set at startup before any other threads are spawned.
    if let Some(config_path) = &cli.config {
        unsafe {
            std::env::set_var("WORKDECK_CONFIG_PATH", config_path);
        }
    }
    let mut config = Config::load()?;
    if let Some(db) = &cli.database {
        config.storage.db_path = db.into();
    }
    if let Some(remote) = &cli.remote {
        config.storage.remote_path = Some(remote.into());
    }

    let mut store = SqliteStore::open(&config.storage.db_path)?;
    if let Some(remote) = &config.storage.remote_path {
        store = store.with_remote(remote.clone());
    }
    match cli.command.unwrap_or(Command::Run) {
        Command::Run => run(Arc::new(store), config).await,
        Command::Seed(args) => seed(&store, args.force),
        Command::Export(args) => export_snapshot(&store, &args.output, args.gzip),
        Command::Import(args) => import_snapshot(&store, &args.file, args.force),
    }
}

async fn run(store: Arc<dyn Store>, config: Config) -> Result<()> {
    let session = SessionStore::new(config.session.marker_path.clone());
    let engine = Arc::new(Engine::new(
        store,
        Arc::new(LogNotifier),
        session,
        Duration::from_millis(config.sync.poll_interval_ms),
    ));
    engine.init().await;
    let poller = engine.spawn_poller();
    info!(
        interval_ms = config.sync.poll_interval_ms,
        "Engine running; press Ctrl-C to stop"
    );

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    poller.abort();
    Ok(())
}

/// Seed an empty database with the built-in tables, statuses, priorities,
/// notification gates and the bootstrap admin account.
fn seed(store: &SqliteStore, force: bool) -> Result<()> {
    if !force && !store.collections().is_empty() {
        anyhow::bail!("Database is not empty; pass --force to reseed");
    }
    store.set_users(&[defaults::default_admin()])?;
    store.set_tables(&defaults::default_tables())?;
    store.set_statuses(&defaults::default_statuses())?;
    store.set_priorities(&defaults::default_priorities())?;
    store.set_notification_settings(&default_notification_settings())?;
    info!("Seeded database with default workspace data");
    Ok(())
}
