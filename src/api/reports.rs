//! `/api/reports` handlers.

use crate::api::AppState;
use crate::error::{AppError, AppResult};
use crate::models::{Report, ReportView};
use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use serde_json::{Value as JsonValue, json};
use tracing::info;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInput {
    #[serde(default)]
    pub user_id: Option<String>,
}

impl UserInput {
    fn require(self) -> AppResult<String> {
        self.user_id
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| AppError::validation("userId required"))
    }
}

pub async fn list(State(state): State<AppState>) -> AppResult<Json<Vec<Report>>> {
    Ok(Json(state.store.reports().find().await?))
}

pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<JsonValue>,
) -> AppResult<Json<Report>> {
    let repo = state.store.reports();
    let report = repo.create(payload)?;
    repo.save(&report).await?;
    info!(id = %report.id, data_source_id = %report.data_source_id, "Report created");
    Ok(Json(report))
}

pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> AppResult<Json<Report>> {
    Ok(Json(state.store.reports().get(&id).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<JsonValue>,
) -> AppResult<Json<Report>> {
    Ok(Json(state.store.reports().merge(&id, patch).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<JsonValue>> {
    state.store.reports().delete(&id).await?;
    info!(id = %id, "Report deleted");
    Ok(Json(json!({ "success": true })))
}

pub async fn record_view(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UserInput>,
) -> AppResult<Json<ReportView>> {
    let user_id = input.require()?;
    state.store.reports().get(&id).await?;
    Ok(Json(state.store.record_view(&id, &user_id).await?))
}

pub async fn recent(
    State(state): State<AppState>,
    Query(input): Query<UserInput>,
) -> AppResult<Json<Vec<ReportView>>> {
    let user_id = input.require()?;
    Ok(Json(state.store.recent_views(&user_id).await?))
}
