//! Generative AI gateway.
//!
//! Handlers talk to the [`AiGateway`] trait and wrap every call in
//! [`with_timeout`]. [`GeminiGateway`] is the production implementation.

pub mod gemini;
pub mod prompt;
pub mod timeout;

pub use gemini::{GeminiConfig, GeminiGateway};
pub use timeout::with_timeout;

use crate::error::AppResult;
use crate::models::{DataSource, Report};
use async_trait::async_trait;
use serde_json::Value as JsonValue;

/// Rows requested when a caller does not say how many.
pub const DEFAULT_ROW_COUNT: u32 = 20;

#[async_trait]
pub trait AiGateway: Send + Sync {
    /// Mock rows for `report`, shaped by the schema of `data_source`.
    async fn generate_rows(
        &self,
        data_source: &DataSource,
        report: &Report,
        row_count: u32,
    ) -> AppResult<Vec<JsonValue>>;

    /// An invented schema for a database named `db_name`.
    async fn generate_schema(
        &self,
        db_type: &str,
        db_name: &str,
        context: &str,
    ) -> AppResult<JsonValue>;
}
