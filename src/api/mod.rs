//! HTTP API.
//!
//! Routes:
//! - `/api/health`
//! - `/api/datasources` CRUD, `test-connection` (schema discovery) and `query`
//! - `/api/reports` CRUD, per-user views and recent views
//! - `/api/ai/generate` and `/api/ai/discover`

pub mod ai;
pub mod cors;
pub mod datasources;
pub mod reports;
pub mod server;

pub use cors::CorsConfig;
pub use server::HttpServer;

use crate::ai::AiGateway;
use crate::db::Connector;
use crate::service::{SafeQueryExecutor, SchemaDiscovery};
use crate::store::Store;
use axum::routing::{get, post};
use axum::{Json, Router, middleware};
use serde_json::{Value as JsonValue, json};
use std::sync::Arc;
use std::time::Duration;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub discovery: SchemaDiscovery,
    pub executor: SafeQueryExecutor,
    pub ai: Arc<dyn AiGateway>,
    /// Budget for each AI call
    pub ai_timeout: Duration,
}

impl AppState {
    pub fn new(
        store: Store,
        connector: Arc<dyn Connector>,
        ai: Arc<dyn AiGateway>,
        ai_timeout: Duration,
    ) -> Self {
        Self {
            discovery: SchemaDiscovery::new(connector.clone()),
            executor: SafeQueryExecutor::new(connector, store.clone()),
            store,
            ai,
            ai_timeout,
        }
    }
}

pub async fn health() -> Json<JsonValue> {
    Json(json!({ "ok": true }))
}

/// Build the application router.
pub fn router(state: AppState, cors: CorsConfig) -> Router {
    let datasources = Router::new()
        .route("/", get(datasources::list).post(datasources::create))
        .route("/test-connection", post(datasources::test_connection))
        .route("/query", post(datasources::query))
        .route(
            "/{id}",
            get(datasources::get)
                .put(datasources::update)
                .delete(datasources::delete),
        );

    let reports = Router::new()
        .route("/", get(reports::list).post(reports::create))
        .route("/recent", get(reports::recent))
        .route(
            "/{id}",
            get(reports::get).put(reports::update).delete(reports::delete),
        )
        .route("/{id}/views", post(reports::record_view));

    let ai = Router::new()
        .route("/generate", post(ai::generate))
        .route("/discover", post(ai::discover));

    Router::new()
        .route("/api/health", get(health))
        .nest("/api/datasources", datasources)
        .nest("/api/reports", reports)
        .nest("/api/ai", ai)
        .layer(middleware::from_fn_with_state(
            Arc::new(cors),
            cors::cors_middleware,
        ))
        .with_state(state)
}
