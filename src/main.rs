//! Report Builder Server - Main entry point.
//!
//! Serves the report builder HTTP API: data source and report records,
//! schema discovery and safe queries against PostgreSQL and SQL Server, and
//! AI-generated mock data.

use clap::Parser;
use report_builder::ai::{AiGateway, GeminiGateway};
use report_builder::api::{AppState, CorsConfig, HttpServer};
use report_builder::config::Config;
use report_builder::db::{Connector, DriverConnector};
use report_builder::store::Store;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the tracing subscriber for logging.
fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        subscriber.with(fmt::layer().json()).init();
    } else {
        subscriber
            .with(fmt::layer().with_target(true).with_thread_ids(false))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::parse();

    init_tracing(&config);

    info!(
        addr = %config.http_bind_addr(),
        ai_timeout_ms = config.ai_timeout_ms,
        "Starting Report Builder Server v{}",
        env!("CARGO_PKG_VERSION")
    );

    let store = Store::open(&config.store_url).await?;

    let connector: Arc<dyn Connector> =
        Arc::new(DriverConnector::new(config.connect_timeout_duration()));
    let ai: Arc<dyn AiGateway> = Arc::new(GeminiGateway::new(config.gemini_config())?);

    let state = AppState::new(
        store.clone(),
        connector,
        ai,
        config.ai_timeout_duration(),
    );
    let server = HttpServer::new(state, &config.http_host, config.http_port)
        .with_cors(CorsConfig::new(&config.cors_origin));

    let result = server.run().await;

    store.close().await;

    if let Err(e) = result {
        error!(error = %e, "Server error");
        return Err(e.into());
    }

    info!("Server shutdown complete");
    Ok(())
}
