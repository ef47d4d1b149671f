//! Driver sessions and the connector that opens them.
//!
//! A [`Session`] is one live connection to an external database. Every result
//! leaves it as a [`RowSet`], whatever the driver. Sessions are opened per
//! discovery or query call and closed on every exit path by the caller.

use crate::db::dialect::{Dialect, SqlParam};
use crate::db::types::RowSet;
use crate::db::{mssql, postgres};
use crate::error::{AppError, AppResult};
use crate::models::ConnectionDetails;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, error};

#[async_trait]
pub trait Session: Send {
    /// Run one statement with positional parameters.
    async fn query(&mut self, sql: &str, params: &[SqlParam]) -> AppResult<RowSet>;

    /// Release the connection. Calling it twice is a no-op.
    async fn close(&mut self) -> AppResult<()>;
}

/// Opens sessions. Swapped out in tests for a scripted in-process driver.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn open(
        &self,
        dialect: Dialect,
        details: &ConnectionDetails,
    ) -> AppResult<Box<dyn Session>>;
}

/// Connector backed by the real drivers: sqlx for Postgres, tiberius for SQL Server.
#[derive(Debug, Clone)]
pub struct DriverConnector {
    connect_timeout: Duration,
}

impl DriverConnector {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

#[async_trait]
impl Connector for DriverConnector {
    async fn open(
        &self,
        dialect: Dialect,
        details: &ConnectionDetails,
    ) -> AppResult<Box<dyn Session>> {
        debug!(dialect = %dialect, target = %details.masked(), "Opening connection");

        let connect = async {
            match dialect {
                Dialect::Postgres => postgres::PgSession::connect(details)
                    .await
                    .map(|s| Box::new(s) as Box<dyn Session>),
                Dialect::SqlServer => mssql::TdsSession::connect(details)
                    .await
                    .map(|s| Box::new(s) as Box<dyn Session>),
            }
        };

        match tokio::time::timeout(self.connect_timeout, connect).await {
            Ok(Ok(session)) => Ok(session),
            Ok(Err(e)) => {
                error!(dialect = %dialect, target = %details.masked(), error = %e, "Connection failed");
                Err(e)
            }
            Err(_) => {
                error!(
                    dialect = %dialect,
                    target = %details.masked(),
                    timeout_secs = self.connect_timeout.as_secs(),
                    "Connection timed out"
                );
                Err(AppError::connection(format!(
                    "connection timed out after {}s",
                    self.connect_timeout.as_secs()
                )))
            }
        }
    }
}
