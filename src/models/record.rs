//! Persisted records: data sources, reports and report views.

use crate::error::{AppError, AppResult};
use crate::models::connection::ConnectionDetails;
use crate::models::schema::{SchemaDocument, Table, View};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// A record kind kept by the repository as a JSON document.
pub trait Record: Serialize + DeserializeOwned + Send + Sync + Unpin + 'static {
    /// Human-readable entity name used in errors and logs.
    const ENTITY: &'static str;
    /// Backing store table.
    const TABLE: &'static str;
    /// JSON fields that must be present and non-empty on creation.
    const REQUIRED: &'static [&'static str];

    fn id(&self) -> &str;

    /// Reject a creation payload that lacks a required field.
    fn validate_new(payload: &JsonValue) -> AppResult<()> {
        let missing = Self::REQUIRED.iter().any(|field| {
            payload
                .get(*field)
                .and_then(JsonValue::as_str)
                .is_none_or(|v| v.trim().is_empty())
        });
        if missing {
            return Err(AppError::validation(format!(
                "{} required",
                Self::REQUIRED.join(" and ")
            )));
        }
        Ok(())
    }
}

/// Current time in the format stored in `createdAt`.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSource {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Free text at rest; parsed to a dialect only when one is needed
    #[serde(default, rename = "type")]
    pub source_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_details: Option<ConnectionDetails>,
    #[serde(default)]
    pub tables: Vec<Table>,
    #[serde(default)]
    pub views: Vec<View>,
    #[serde(default)]
    pub created_at: String,
}

impl DataSource {
    /// Snapshot of the tables and views chosen for this source.
    pub fn schema(&self) -> SchemaDocument {
        SchemaDocument::new(self.tables.clone(), self.views.clone())
    }

    /// Look up a table by id.
    pub fn table_by_id(&self, id: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.id == id)
    }
}

impl Record for DataSource {
    const ENTITY: &'static str = "data source";
    const TABLE: &'static str = "data_sources";
    const REQUIRED: &'static [&'static str] = &["name"];

    fn id(&self) -> &str {
        &self.id
    }
}

/// A column picked for a report, by table and column id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedColumn {
    pub table_id: String,
    pub column_id: String,
}

fn default_visibility() -> String {
    "private".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    #[serde(default)]
    pub id: String,
    /// Weak reference; deleting the data source leaves the report in place
    pub data_source_id: String,
    #[serde(default)]
    pub owner_id: String,
    #[serde(default = "default_visibility")]
    pub visibility: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub selected_columns: Vec<SelectedColumn>,
    #[serde(default)]
    pub filters: Vec<JsonValue>,
    #[serde(default)]
    pub sorts: Vec<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_by: Option<Vec<JsonValue>>,
    #[serde(default)]
    pub visualization: String,
    #[serde(default)]
    pub schedule: JsonValue,
    #[serde(default)]
    pub created_at: String,
}

impl Record for Report {
    const ENTITY: &'static str = "report";
    const TABLE: &'static str = "reports";
    const REQUIRED: &'static [&'static str] = &["name", "dataSourceId"];

    fn id(&self) -> &str {
        &self.id
    }
}

/// One user's most recent view of one report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportView {
    pub id: String,
    pub report_id: String,
    pub user_id: String,
    pub viewed_at: DateTime<Utc>,
}
