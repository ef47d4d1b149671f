//! Query-related data models.
//!
//! This module defines the safe query request and its row-limit rules.

use crate::models::connection::ConnectionDetails;
use crate::models::schema::{SchemaDocument, Table, View};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Default row limit for query results.
pub const DEFAULT_ROW_LIMIT: u32 = 50;

/// Maximum allowed row limit.
pub const MAX_ROW_LIMIT: u32 = 10000;

/// A data source described inline in the request instead of persisted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdHocSource {
    #[serde(default, rename = "type")]
    pub source_type: String,
    #[serde(default)]
    pub connection_details: Option<ConnectionDetails>,
    #[serde(default)]
    pub tables: Vec<Table>,
    #[serde(default)]
    pub views: Vec<View>,
}

impl AdHocSource {
    pub fn schema(&self) -> SchemaDocument {
        SchemaDocument::new(self.tables.clone(), self.views.clone())
    }
}

/// Where the executor gets its schema document and connection details.
#[derive(Debug, Clone)]
pub enum SchemaSource {
    Stored(String),
    AdHoc(AdHocSource),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    #[serde(default)]
    pub data_source_id: Option<String>,
    #[serde(default)]
    pub data_source: Option<AdHocSource>,
    /// Table or view, by name or id
    #[serde(default)]
    pub table: String,
    #[serde(default)]
    pub columns: Vec<String>,
    /// Anything; coerced by [`coerce_limit`]
    #[serde(default)]
    pub limit: Option<JsonValue>,
}

impl QueryRequest {
    /// Pick the schema source. A persisted id wins over an inline source.
    pub fn schema_source(&self) -> Option<SchemaSource> {
        match (&self.data_source_id, &self.data_source) {
            (Some(id), _) if !id.trim().is_empty() => Some(SchemaSource::Stored(id.clone())),
            (_, Some(ad_hoc)) => Some(SchemaSource::AdHoc(ad_hoc.clone())),
            _ => None,
        }
    }
}

/// Coerce a requested limit into `1..=MAX_ROW_LIMIT`.
///
/// Missing, non-numeric and non-positive values fall back to
/// [`DEFAULT_ROW_LIMIT`]. Numeric strings and fractional numbers are accepted
/// and truncated.
pub fn coerce_limit(raw: Option<&JsonValue>) -> u32 {
    let parsed = match raw {
        Some(JsonValue::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Some(JsonValue::String(s)) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
        }
        _ => None,
    };

    match parsed {
        Some(n) if n > 0 => n.min(MAX_ROW_LIMIT as i64) as u32,
        _ => DEFAULT_ROW_LIMIT,
    }
}
