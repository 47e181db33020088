//! TradeLab Adapter - Main Application Entry Point
//!
//! Internal REST API in front of the TradeLab brokerage back office. It
//! exposes funds, IPO and profile operations for a client identified by its
//! UCC, normalising TradeLab payloads and errors.
//!
//! # Architecture
//!
//! - **Web Framework**: Axum (async HTTP server)
//! - **Vendor**: TradeLab REST API via reqwest
//! - **Cache**: Redis (funds, IPO listing, profile, freeze OTP)
//! - **Database**: PostgreSQL with sqlx (payout ledger, IPO metadata, freezes)
//! - **Authentication**: internal API key with SHA-256 hashing
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment variables
//! 2. Create database connection pool and run migrations
//! 3. Connect to Redis
//! 4. Build the TradeLab and notification clients
//! 5. Build HTTP router and start server on configured port

mod alert;
mod cache;
mod config;
mod db;
mod error;
mod handlers;
mod mask;
mod middleware;
mod models;
mod routes;
mod services;
mod state;
mod store;
mod tradelab;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::cache::RedisCache;
use crate::services::notification_service::HttpNotifier;
use crate::state::AppState;
use crate::store::PgStore;
use crate::tradelab::{HttpTransport, TradelabClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG, defaults to "info"
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = config::Config::from_env()?;
    tracing::info!("Configuration loaded");

    let pool = db::create_pool(&config.database_url).await?;
    tracing::info!("Database pool created");

    db::run_migrations(&pool).await?;
    tracing::info!("Database migrations complete");

    let cache = RedisCache::connect(&config.redis_url).await?;
    tracing::info!("Redis connected");

    let transport = HttpTransport::new(
        &config.tradelab_base_url,
        &config.tradelab_api_token,
        config.http_timeout(),
    )?;
    let notifier = HttpNotifier::new(&config.notification_base_url)?;

    let addr = format!("0.0.0.0:{}", config.server_port);

    let state = AppState {
        config: Arc::new(config),
        tradelab: TradelabClient::new(Arc::new(transport)),
        cache: Arc::new(cache),
        store: Arc::new(PgStore::new(pool)),
        notifier: Arc::new(notifier),
    };
    let app = routes::build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
