//! Error types for the report builder server.
//!
//! All fallible operations return [`AppResult`]. Each variant maps to one HTTP
//! status class; driver detail stays in the `Display` output for logs and never
//! reaches a response body.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        /// Offending identifiers, e.g. unknown column names
        invalid: Vec<String>,
    },

    #[error("Unsupported data source type: {db_type}")]
    UnsupportedType { db_type: String },

    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    #[error("Connection failed: {message}")]
    Connection { message: String },

    #[error("Query failed: {message}")]
    Query { message: String },

    #[error("Timeout: {operation} exceeded {elapsed_ms}ms")]
    Timeout { operation: String, elapsed_ms: u64 },

    #[error("AI gateway error: {message}")]
    Ai { message: String },

    #[error("Store error: {message}")]
    Store { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl AppError {
    /// Create a validation error without offending identifiers.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            invalid: Vec::new(),
        }
    }

    /// Create a validation error that lists the offending identifiers.
    pub fn invalid_identifiers(message: impl Into<String>, invalid: Vec<String>) -> Self {
        Self::Validation {
            message: message.into(),
            invalid,
        }
    }

    pub fn unsupported_type(db_type: impl Into<String>) -> Self {
        Self::UnsupportedType {
            db_type: db_type.into(),
        }
    }

    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }

    pub fn timeout(operation: impl Into<String>, elapsed_ms: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            elapsed_ms,
        }
    }

    pub fn ai(message: impl Into<String>) -> Self {
        Self::Ai {
            message: message.into(),
        }
    }

    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// True for errors raised before any I/O because the input was rejected.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. } | Self::UnsupportedType { .. })
    }

    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation { .. } | Self::UnsupportedType { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Connection { .. } | Self::Query { .. } => StatusCode::BAD_GATEWAY,
            Self::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            Self::Ai { .. } | Self::Store { .. } | Self::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message safe to return to a client.
    pub fn public_message(&self) -> String {
        match self {
            Self::Validation { message, .. } => message.clone(),
            Self::UnsupportedType { db_type } => format!("unsupported data source type: {db_type}"),
            Self::NotFound { .. } => "not found".to_string(),
            Self::Connection { .. } => "could not connect to data source".to_string(),
            Self::Query { .. } => "could not connect or execute query".to_string(),
            Self::Timeout { .. } => "AI timeout".to_string(),
            Self::Ai { message } => message.clone(),
            Self::Store { .. } | Self::Internal { .. } => "internal error".to_string(),
        }
    }
}

/// Record store errors. External Postgres sessions map their sqlx errors
/// explicitly, so this conversion only serves the store.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AppError::store("No rows returned"),
            sqlx::Error::PoolTimedOut => AppError::store("Store pool acquire timed out"),
            sqlx::Error::PoolClosed => AppError::store("Store is closed"),
            sqlx::Error::Database(db_err) => AppError::store(db_err.message().to_string()),
            other => AppError::store(other.to_string()),
        }
    }
}

impl From<tiberius::error::Error> for AppError {
    fn from(err: tiberius::error::Error) -> Self {
        match err {
            tiberius::error::Error::Io { kind, message } => {
                AppError::connection(format!("I/O error ({kind:?}): {message}"))
            }
            tiberius::error::Error::Tls(msg) => AppError::connection(format!("TLS error: {msg}")),
            tiberius::error::Error::Server(token) => {
                AppError::query(format!("{} (code {})", token.message(), token.code()))
            }
            other => AppError::query(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::internal(format!("JSON error: {err}"))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut body = serde_json::json!({ "error": self.public_message() });
        if let Self::Validation { invalid, .. } = &self {
            if !invalid.is_empty() {
                body["invalid"] = serde_json::json!(invalid);
            }
        }
        (status, Json(body)).into_response()
    }
}

/// Result type alias for server operations.
pub type AppResult<T> = Result<T, AppError>;
