//! Poster Shop server and catalog import tool

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use poster_shop::api::{self, AppState};
use poster_shop::auth::JwtService;
use poster_shop::bus::EventBus;
use poster_shop::services::{CatalogService, ImportRecord};
use poster_shop::store::{MemoryStore, PgStore, ShopStore};
use poster_shop::Config;
use sqlx::postgres::PgPoolOptions;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "poster-shop", version, about = "Poster storefront backend")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP API (default)
    Serve,
    /// Upsert products from a JSON array of catalog records, keyed by custom id
    Import { file: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    tracing::debug!(?config, "configuration loaded");

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let store = open_store(&config).await?;
            serve(config, store).await
        }
        Command::Import { file } => {
            let store = connect_postgres(config.require_database_url()?).await?;
            import(Arc::new(store), file).await
        }
    }
}

async fn connect_postgres(url: &str) -> Result<PgStore> {
    let pool = PgPoolOptions::new().max_connections(10).connect(url).await.context("connecting to PostgreSQL")?;
    let store = PgStore::new(pool);
    store.migrate().await?;
    Ok(store)
}

async fn open_store(config: &Config) -> Result<Arc<dyn ShopStore>> {
    match &config.database_url {
        Some(url) => Ok(Arc::new(connect_postgres(url).await?)),
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory store; data is lost on exit");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

async fn connect_bus(config: &Config) -> EventBus {
    let Some(url) = &config.nats_url else { return EventBus::disabled() };
    match async_nats::connect(url.as_str()).await {
        Ok(client) => EventBus::new(Some(client)),
        Err(e) => {
            tracing::warn!(error = %e, "NATS unavailable, domain events will only be logged");
            EventBus::disabled()
        }
    }
}

async fn serve(config: Config, store: Arc<dyn ShopStore>) -> Result<()> {
    let jwt = JwtService::new(config.jwt_secret()?, config.jwt_ttl_minutes);
    let bus = connect_bus(&config).await;
    let app = api::router(AppState::new(store, bus, jwt));

    let addr = config.bind_addr();
    tracing::info!("Poster Shop listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await.with_context(|| format!("binding {addr}"))?;
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    tracing::info!("server stopped");
    Ok(())
}

async fn import(store: Arc<dyn ShopStore>, file: PathBuf) -> Result<()> {
    let raw = tokio::fs::read_to_string(&file).await.with_context(|| format!("reading {}", file.display()))?;
    let records: Vec<ImportRecord> = serde_json::from_str(&raw).with_context(|| format!("parsing {}", file.display()))?;
    let report = CatalogService::new(store, EventBus::disabled()).import(records).await?;
    tracing::info!(created = report.created, updated = report.updated, "import complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}
