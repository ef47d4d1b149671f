//! `/api/ai` handlers.

use crate::ai::{DEFAULT_ROW_COUNT, with_timeout};
use crate::api::AppState;
use crate::error::{AppError, AppResult};
use axum::Json;
use axum::extract::State;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use tracing::error;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateInput {
    #[serde(default)]
    pub report_id: Option<String>,
    #[serde(default)]
    pub data_source_id: Option<String>,
    #[serde(default)]
    pub row_count: Option<JsonValue>,
}

impl GenerateInput {
    /// Positive row count, or the default.
    pub fn row_count(&self) -> u32 {
        self.row_count
            .as_ref()
            .and_then(JsonValue::as_u64)
            .filter(|n| *n > 0)
            .map_or(DEFAULT_ROW_COUNT, |n| u32::try_from(n).unwrap_or(u32::MAX))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoverInput {
    #[serde(default, rename = "type")]
    pub db_type: Option<String>,
    #[serde(default)]
    pub db_name: Option<String>,
    #[serde(default)]
    pub context: Option<String>,
}

/// Mock rows for a report. The data source comes from `dataSourceId` or,
/// failing that, from the report itself.
pub async fn generate(
    State(state): State<AppState>,
    Json(input): Json<GenerateInput>,
) -> AppResult<Json<Vec<JsonValue>>> {
    let row_count = input.row_count();
    let data_sources = state.store.data_sources();

    let mut data_source = match non_empty(input.data_source_id.as_deref()) {
        Some(id) => data_sources.find_one(id).await?,
        None => None,
    };
    let report = match non_empty(input.report_id.as_deref()) {
        Some(id) => state.store.reports().find_one(id).await?,
        None => None,
    };
    if data_source.is_none() {
        if let Some(report) = &report {
            data_source = data_sources.find_one(&report.data_source_id).await?;
        }
    }

    let (Some(data_source), Some(report)) = (data_source, report) else {
        return Err(AppError::validation("dataSource and report required"));
    };

    let gateway = state.ai.clone();
    let rows = with_timeout("AI generate", state.ai_timeout, async move {
        gateway.generate_rows(&data_source, &report, row_count).await
    })
    .await
    .map_err(|e| gateway_failure(e, "AI generation failed"))?;

    Ok(Json(rows))
}

/// An invented schema for a new data source.
pub async fn discover(
    State(state): State<AppState>,
    Json(input): Json<DiscoverInput>,
) -> AppResult<Json<JsonValue>> {
    let (Some(db_type), Some(db_name)) = (
        non_empty(input.db_type.as_deref()).map(str::to_string),
        non_empty(input.db_name.as_deref()).map(str::to_string),
    ) else {
        return Err(AppError::validation("type and dbName required"));
    };
    let context = input.context.unwrap_or_default();

    let gateway = state.ai.clone();
    let schema = with_timeout("AI discover", state.ai_timeout, async move {
        gateway.generate_schema(&db_type, &db_name, &context).await
    })
    .await
    .map_err(|e| gateway_failure(e, "AI discover failed"))?;

    Ok(Json(schema))
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Timeouts keep their own status. Anything else is logged and reported with
/// a fixed message.
fn gateway_failure(err: AppError, message: &str) -> AppError {
    match err {
        AppError::Timeout { .. } => err,
        other => {
            error!(error = %other, "{message}");
            AppError::ai(message)
        }
    }
}
