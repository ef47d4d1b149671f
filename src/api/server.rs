//! Serving the report API over TCP.
//!
//! [`HttpServer::bind`] claims the socket up front so a bad address fails
//! before anything is logged as listening. [`BoundServer::serve_until`] then
//! runs the router until the given shutdown future resolves, and gives open
//! requests a drain window before returning.

use crate::api::{AppState, CorsConfig, router};
use crate::error::{AppError, AppResult};
use axum::Router;
use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::oneshot;
use tracing::{error, info, warn};

/// Drain window for in-flight requests after shutdown begins.
pub const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

pub struct HttpServer {
    state: AppState,
    cors: CorsConfig,
    host: String,
    port: u16,
    drain_timeout: Duration,
}

impl HttpServer {
    pub fn new(state: AppState, host: impl Into<String>, port: u16) -> Self {
        Self {
            state,
            cors: CorsConfig::any(),
            host: host.into(),
            port,
            drain_timeout: DEFAULT_DRAIN_TIMEOUT,
        }
    }

    pub fn with_cors(mut self, cors: CorsConfig) -> Self {
        self.cors = cors;
        self
    }

    pub fn with_drain_timeout(mut self, drain_timeout: Duration) -> Self {
        self.drain_timeout = drain_timeout;
        self
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub async fn bind(self) -> AppResult<BoundServer> {
        let bind_addr = self.bind_addr();
        let listener = TcpListener::bind(&bind_addr)
            .await
            .map_err(|e| AppError::internal(format!("Failed to bind to {bind_addr}: {e}")))?;

        Ok(BoundServer {
            listener,
            app: router(self.state, self.cors),
            drain_timeout: self.drain_timeout,
        })
    }

    /// Serve until SIGINT or SIGTERM.
    pub async fn run(self) -> AppResult<()> {
        self.bind().await?.serve_until(wait_for_signal()).await
    }
}

pub struct BoundServer {
    listener: TcpListener,
    app: Router,
    drain_timeout: Duration,
}

impl BoundServer {
    pub fn local_addr(&self) -> AppResult<SocketAddr> {
        self.listener
            .local_addr()
            .map_err(|e| AppError::internal(format!("No local address: {e}")))
    }

    /// Serve until `shutdown` resolves. Once it has, a second OS signal or the
    /// drain timeout stops waiting for open requests.
    pub async fn serve_until<F>(self, shutdown: F) -> AppResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.local_addr()?;
        info!(%addr, "Report API listening");

        let (began_tx, began_rx) = oneshot::channel::<()>();
        let trigger = async move {
            shutdown.await;
            let _ = began_tx.send(());
        };
        let server = axum::serve(self.listener, self.app).with_graceful_shutdown(trigger);

        let drain_timeout = self.drain_timeout;
        let drain = async move {
            if began_rx.await.is_err() {
                // server ended on its own
                std::future::pending::<()>().await;
            }
            info!(
                drain_secs = drain_timeout.as_secs(),
                "Draining open requests (signal again to stop now)"
            );
            tokio::select! {
                _ = tokio::time::sleep(drain_timeout) => warn!("Drain timeout reached, stopping"),
                _ = wait_for_signal() => warn!("Second signal received, stopping"),
            }
        };

        tokio::select! {
            result = server => match result {
                Ok(()) => info!("Report API stopped"),
                Err(e) => {
                    error!(error = %e, "Report API failed");
                    return Err(AppError::internal(format!("HTTP server error: {e}")));
                }
            },
            _ = drain => {}
        }

        Ok(())
    }
}

async fn wait_for_signal() {
    let ctrl_c = signal::ctrl_c();

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{AiGateway, GeminiConfig, GeminiGateway};
    use crate::db::{Connector, DriverConnector};
    use crate::store::Store;
    use serde_json::{Value as JsonValue, json};
    use std::sync::Arc;

    async fn state() -> AppState {
        let store = Store::open("sqlite::memory:").await.unwrap();
        let connector: Arc<dyn Connector> = Arc::new(DriverConnector::new(Duration::from_secs(1)));
        let ai: Arc<dyn AiGateway> = Arc::new(GeminiGateway::new(GeminiConfig::default()).unwrap());
        AppState::new(store, connector, ai, Duration::from_secs(1))
    }

    #[tokio::test]
    async fn test_bind_addr() {
        let server = HttpServer::new(state().await, "0.0.0.0", 8787);
        assert_eq!(server.bind_addr(), "0.0.0.0:8787");
        assert_eq!(server.drain_timeout, DEFAULT_DRAIN_TIMEOUT);
    }

    #[tokio::test]
    async fn test_serves_until_shutdown() {
        let bound = HttpServer::new(state().await, "127.0.0.1", 0)
            .with_cors(CorsConfig::new("https://reports.example.com"))
            .with_drain_timeout(Duration::from_secs(1))
            .bind()
            .await
            .unwrap();
        let addr = bound.local_addr().unwrap();
        assert_ne!(addr.port(), 0);

        let (stop, stopped) = oneshot::channel::<()>();
        let task = tokio::spawn(bound.serve_until(async {
            let _ = stopped.await;
        }));

        let response = reqwest::get(format!("http://{addr}/api/health")).await.unwrap();
        assert_eq!(
            response.headers()["access-control-allow-origin"],
            "https://reports.example.com"
        );
        let body: JsonValue = response.json().await.unwrap();
        assert_eq!(body, json!({ "ok": true }));

        stop.send(()).unwrap();
        let result = tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_bind_reports_taken_port() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = taken.local_addr().unwrap().port();

        let err = match HttpServer::new(state().await, "127.0.0.1", port).bind().await {
            Ok(_) => panic!("port {port} should be in use"),
            Err(e) => e,
        };
        assert!(err.to_string().contains(&format!("127.0.0.1:{port}")));
    }
}
