//! Configuration handling for the report builder server.
//!
//! Every option is a CLI flag with an environment variable fallback.

use crate::ai::GeminiConfig;
use crate::ai::gemini::DEFAULT_GEMINI_MODEL;
use clap::Parser;
use std::time::Duration;

pub const DEFAULT_HTTP_HOST: &str = "127.0.0.1";
pub const DEFAULT_HTTP_PORT: u16 = 4000;
pub const DEFAULT_STORE_URL: &str = "sqlite://report_builder.db?mode=rwc";
pub const DEFAULT_AI_TIMEOUT_MS: u64 = 5000;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_CORS_ORIGIN: &str = "*";

/// Configuration for the report builder server.
#[derive(Clone, Parser)]
#[command(
    name = "report-builder-server",
    about = "Report builder backend - schema discovery, safe queries and AI-generated data",
    version,
    author
)]
pub struct Config {
    /// HTTP host to bind to
    #[arg(long, default_value = DEFAULT_HTTP_HOST, env = "HOST")]
    pub http_host: String,

    /// HTTP port to bind to
    #[arg(long, default_value_t = DEFAULT_HTTP_PORT, env = "PORT")]
    pub http_port: u16,

    /// Record store URL (SQLite)
    #[arg(long, default_value = DEFAULT_STORE_URL, env = "STORE_URL")]
    pub store_url: String,

    /// Budget for each AI call, in milliseconds
    #[arg(long, default_value_t = DEFAULT_AI_TIMEOUT_MS, env = "AI_TIMEOUT_MS")]
    pub ai_timeout_ms: u64,

    /// Gemini API key. AI endpoints return empty results without it.
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    /// Gemini model name
    #[arg(long, default_value = DEFAULT_GEMINI_MODEL, env = "GEMINI_MODEL")]
    pub gemini_model: String,

    /// Connection timeout for external databases, in seconds
    #[arg(long, default_value_t = DEFAULT_CONNECT_TIMEOUT_SECS, env = "CONNECT_TIMEOUT")]
    pub connect_timeout: u64,

    /// Value of Access-Control-Allow-Origin
    #[arg(long, default_value = DEFAULT_CORS_ORIGIN, env = "CORS_ORIGIN")]
    pub cors_origin: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "LOG_LEVEL")]
    pub log_level: String,

    /// Enable JSON logging format
    #[arg(long, env = "JSON_LOGS")]
    pub json_logs: bool,
}

impl Config {
    /// Create a default configuration (useful for testing).
    pub fn default_config() -> Self {
        Self {
            http_host: DEFAULT_HTTP_HOST.to_string(),
            http_port: DEFAULT_HTTP_PORT,
            store_url: DEFAULT_STORE_URL.to_string(),
            ai_timeout_ms: DEFAULT_AI_TIMEOUT_MS,
            gemini_api_key: None,
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT_SECS,
            cors_origin: DEFAULT_CORS_ORIGIN.to_string(),
            log_level: "info".to_string(),
            json_logs: false,
        }
    }

    pub fn http_bind_addr(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }

    pub fn ai_timeout_duration(&self) -> Duration {
        Duration::from_millis(self.ai_timeout_ms)
    }

    pub fn connect_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }

    pub fn gemini_config(&self) -> GeminiConfig {
        GeminiConfig::default()
            .with_api_key(self.gemini_api_key.clone())
            .with_model(self.gemini_model.clone())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("http_host", &self.http_host)
            .field("http_port", &self.http_port)
            .field("store_url", &self.store_url)
            .field("ai_timeout_ms", &self.ai_timeout_ms)
            .field("gemini_api_key", &self.gemini_api_key.as_ref().map(|_| "****"))
            .field("gemini_model", &self.gemini_model)
            .field("connect_timeout", &self.connect_timeout)
            .field("cors_origin", &self.cors_origin)
            .field("log_level", &self.log_level)
            .field("json_logs", &self.json_logs)
            .finish()
    }
}
