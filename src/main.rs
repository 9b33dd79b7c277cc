use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::sync::Semaphore;

mod clock;
mod commands;
mod config;
mod controllers;
mod envelope;
mod error;
mod expiry;
mod models;
mod pages;
mod store;

use clock::Clock;
use config::{Config, StoreKind};
pub(crate) use error::{AppError, AppResult};
use store::{AnyStore, MemoryStore, SqlStore};

/// Share text, optionally behind a password.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Path to the config file [default: platform config directory]
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the web server.
    Serve,
    /// Delete every paste whose expiry has passed, then exit.
    PurgeExpired,
}

#[derive(Clone)]
pub struct App {
    pub config: Config,
    pub store: AnyStore,
    pub clock: Clock,
    /// Bounds concurrent password key derivations.
    pub kdf_limit: Arc<Semaphore>,
}

impl App {
    async fn new(config: Config) -> anyhow::Result<Self> {
        let store = match config.store.kind {
            StoreKind::Database => {
                let database = config
                    .database
                    .as_ref()
                    .context("missing [database] config")?;
                SqlStore::connect(&database.url)
                    .await
                    .context("failed to connect to database")?
                    .into()
            }
            StoreKind::Memory => MemoryStore::new().into(),
        };

        Ok(App {
            kdf_limit: Arc::new(Semaphore::new(config.limits.kdf_workers)),
            config,
            store,
            clock: Clock::System,
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref())?;
    let app = App::new(config).await?;

    match cli.command {
        Command::Serve => commands::serve::run(app).await,
        Command::PurgeExpired => commands::purge_expired::run(app).await,
    }
}

/// An in-memory app on a clock that only moves when the test says so.
#[cfg(test)]
pub(crate) fn test_app() -> (App, Clock) {
    let config = Config::parse(
        r#"
        base_url = "http://paste.test"
        port = 3000
        store = { kind = "memory" }
        limits = { max_upload_size = 4096, kdf_workers = 2 }
        "#,
    )
    .unwrap();

    let clock = Clock::manual(chrono::Utc::now());
    let app = App {
        kdf_limit: Arc::new(Semaphore::new(config.limits.kdf_workers)),
        config,
        store: MemoryStore::new().into(),
        clock: clock.clone(),
    };
    (app, clock)
}
