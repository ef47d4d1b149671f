//! Gemini `generateContent` client.

use crate::ai::AiGateway;
use crate::ai::prompt::{rows_prompt, schema_prompt};
use crate::error::{AppError, AppResult};
use crate::models::{DataSource, Report};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value as JsonValue, json};
use std::time::Duration;
use tracing::{debug, error, info};
use url::Url;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

const ROWS_TEMPERATURE: f64 = 0.2;
const SCHEMA_TEMPERATURE: f64 = 0.1;

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    /// Hard ceiling on one HTTP exchange, independent of the caller's race budget
    pub request_timeout: Duration,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_GEMINI_MODEL.to_string(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl GeminiConfig {
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|k| !k.trim().is_empty());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f64,
    response_mime_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<JsonValue>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate.
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        (!text.is_empty()).then_some(text)
    }
}

pub struct GeminiGateway {
    client: reqwest::Client,
    endpoint: Url,
    api_key: Option<String>,
    model: String,
}

impl GeminiGateway {
    pub fn new(config: GeminiConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {e}")))?;

        let base = Url::parse(&config.base_url)
            .map_err(|e| AppError::internal(format!("Invalid Gemini base URL: {e}")))?;
        let endpoint = base
            .join(&format!("v1beta/models/{}:generateContent", config.model))
            .map_err(|e| AppError::internal(format!("Invalid Gemini endpoint: {e}")))?;

        info!(
            model = %config.model,
            endpoint = %endpoint,
            api_key_set = config.api_key.is_some(),
            "Gemini gateway initialized"
        );

        Ok(Self {
            client,
            endpoint,
            api_key: config.api_key,
            model: config.model,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// The API key, or `None` after logging that it is missing.
    fn api_key(&self) -> Option<&str> {
        if self.api_key.is_none() {
            error!("GEMINI_API_KEY is not configured");
        }
        self.api_key.as_deref()
    }

    /// Send one prompt and parse the model's text answer as JSON.
    async fn generate(
        &self,
        api_key: &str,
        prompt: String,
        generation_config: GenerationConfig,
    ) -> AppResult<JsonValue> {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: Some(prompt) }],
            }],
            generation_config,
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::ai(format!("Gemini request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(model = %self.model, status = %status, body = %body, "Gemini returned an error");
            return Err(AppError::ai(format!("Gemini returned {status}")));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| AppError::ai(format!("Malformed Gemini response: {e}")))?;

        let Some(text) = parsed.text() else {
            debug!(model = %self.model, "Gemini returned no text");
            return Ok(JsonValue::Array(Vec::new()));
        };

        serde_json::from_str(&text)
            .map_err(|e| AppError::ai(format!("Gemini answer is not JSON: {e}")))
    }
}

#[async_trait]
impl AiGateway for GeminiGateway {
    async fn generate_rows(
        &self,
        data_source: &DataSource,
        report: &Report,
        row_count: u32,
    ) -> AppResult<Vec<JsonValue>> {
        let Some(api_key) = self.api_key() else {
            return Ok(Vec::new());
        };

        let prompt = rows_prompt(data_source, report, row_count);
        let answer = self
            .generate(
                api_key,
                prompt,
                GenerationConfig {
                    temperature: ROWS_TEMPERATURE,
                    response_mime_type: "application/json",
                    response_schema: None,
                },
            )
            .await?;

        match answer {
            JsonValue::Array(rows) => {
                info!(report = %report.id, count = rows.len(), "Mock rows generated");
                Ok(rows)
            }
            other => Err(AppError::ai(format!(
                "expected a JSON array of rows, got {}",
                json_kind(&other)
            ))),
        }
    }

    async fn generate_schema(
        &self,
        db_type: &str,
        db_name: &str,
        context: &str,
    ) -> AppResult<JsonValue> {
        let Some(api_key) = self.api_key() else {
            return Ok(JsonValue::Array(Vec::new()));
        };

        let prompt = schema_prompt(db_type, db_name, context);
        let answer = self
            .generate(
                api_key,
                prompt,
                GenerationConfig {
                    temperature: SCHEMA_TEMPERATURE,
                    response_mime_type: "application/json",
                    response_schema: Some(json!({
                        "type": "ARRAY",
                        "items": { "type": "OBJECT" }
                    })),
                },
            )
            .await?;

        info!(db_type = %db_type, db_name = %db_name, "Schema generated");
        Ok(answer)
    }
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}
