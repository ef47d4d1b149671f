//! `/api/datasources` handlers.

use crate::api::AppState;
use crate::db::RowSet;
use crate::error::{AppError, AppResult};
use crate::models::{ConnectionDetails, DataSource, QueryRequest, SchemaDocument};
use axum::Json;
use axum::extract::{Path, State};
use serde::Deserialize;
use serde_json::{Value as JsonValue, json};
use tracing::info;

/// Body of `POST /api/datasources/test-connection`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestConnectionInput {
    #[serde(default, rename = "type")]
    pub source_type: Option<String>,
    #[serde(default)]
    pub connection_details: Option<ConnectionDetails>,
}

pub async fn list(State(state): State<AppState>) -> AppResult<Json<Vec<DataSource>>> {
    Ok(Json(state.store.data_sources().find().await?))
}

pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<JsonValue>,
) -> AppResult<Json<DataSource>> {
    let repo = state.store.data_sources();
    let data_source = repo.create(payload)?;
    repo.save(&data_source).await?;
    info!(id = %data_source.id, name = %data_source.name, "Data source created");
    Ok(Json(data_source))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<DataSource>> {
    Ok(Json(state.store.data_sources().get(&id).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<JsonValue>,
) -> AppResult<Json<DataSource>> {
    Ok(Json(state.store.data_sources().merge(&id, patch).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<JsonValue>> {
    state.store.data_sources().delete(&id).await?;
    info!(id = %id, "Data source deleted");
    Ok(Json(json!({ "success": true })))
}

/// Probe a live database and return its schema. Nothing is persisted.
pub async fn test_connection(
    State(state): State<AppState>,
    Json(input): Json<TestConnectionInput>,
) -> AppResult<Json<SchemaDocument>> {
    let source_type = input
        .source_type
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| AppError::validation("type and connectionDetails required"))?;
    let details = input
        .connection_details
        .ok_or_else(|| AppError::validation("type and connectionDetails required"))?;

    let schema = state
        .discovery
        .discover(&source_type, Some(&details))
        .await?;
    Ok(Json(schema))
}

pub async fn query(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> AppResult<Json<RowSet>> {
    let source = request
        .schema_source()
        .ok_or_else(|| AppError::validation("dataSourceId or dataSource required"))?;

    let rows = state
        .executor
        .query(source, &request.table, &request.columns, request.limit.as_ref())
        .await?;
    Ok(Json(rows))
}
