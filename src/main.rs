use std::sync::Arc;

use actix_web::{middleware, App, HttpServer};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod api;
mod config;
mod domain;
mod error;
mod metrics;
mod projection;
mod query;
mod store;
mod utils;

use api::AppState;
use config::Config;
use store::{PgCatalog, PgOrderStore};
use utils::RetryConfig;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured logging with environment-based filtering
    // Default to INFO level, can be overridden with RUST_LOG env var
    // Example: RUST_LOG=debug cargo run
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,catering_orders=debug")),
        )
        .init();

    tracing::info!("🚀 Starting catering order service");

    let config = Config::from_env()?;

    // === 1. Connect to PostgreSQL and bring the schema up to date ===
    tracing::info!(max_connections = config.database_max_connections, "Connecting to PostgreSQL...");
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await?;

    sqlx::migrate!().run(&pool).await?;
    tracing::info!("✅ Database migrations applied");

    // === 2. Initialize Prometheus metrics ===
    let metrics = Arc::new(metrics::Metrics::new()?);
    tracing::info!("📊 Metrics registry created with {} metrics", metrics.registry().gather().len());

    // === 3. Wire stores and command handler ===
    let state = AppState::new(
        Arc::new(PgOrderStore::new(pool.clone())),
        Arc::new(PgCatalog::new(pool)),
        metrics,
        RetryConfig::for_conflicts(config.order_number_attempts),
    );

    // === 4. Serve the order API, /metrics and /health ===
    tracing::info!(
        "🌐 Listening on http://{}:{} (metrics at /metrics)",
        config.bind_address,
        config.port
    );

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .configure(api::configure(state.clone()))
    })
    .bind((config.bind_address.as_str(), config.port))?
    .run()
    .await?;

    tracing::info!("👋 Server stopped");

    Ok(())
}
