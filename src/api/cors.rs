//! Cross-origin headers for browser clients.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderValue, Method, Request, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::warn;

const ALLOWED_METHODS: &str = "GET,HEAD,PUT,PATCH,POST,DELETE";
const ALLOWED_HEADERS: &str = "Content-Type,Authorization";

/// Allowed origin, sent back verbatim in `Access-Control-Allow-Origin`.
#[derive(Debug, Clone)]
pub struct CorsConfig {
    origin: HeaderValue,
}

impl CorsConfig {
    pub fn new(origin: &str) -> Self {
        let origin = HeaderValue::from_str(origin.trim()).unwrap_or_else(|_| {
            warn!(origin = %origin, "Invalid CORS origin, allowing any origin");
            HeaderValue::from_static("*")
        });
        Self { origin }
    }

    pub fn any() -> Self {
        Self {
            origin: HeaderValue::from_static("*"),
        }
    }

    pub fn origin(&self) -> &HeaderValue {
        &self.origin
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self::any()
    }
}

/// Answer preflight requests and tag every response with CORS headers.
pub async fn cors_middleware(
    State(config): State<Arc<CorsConfig>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let is_preflight = request.method() == Method::OPTIONS
        && request
            .headers()
            .contains_key(header::ACCESS_CONTROL_REQUEST_METHOD);

    let mut response = if is_preflight {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(request).await
    };

    let headers = response.headers_mut();
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, config.origin.clone());
    if is_preflight {
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOWED_METHODS),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOWED_HEADERS),
        );
    }
    response
}
