//! SQLite-backed record store.
//!
//! Data sources and reports are kept as JSON documents keyed by id. Report
//! views live in their own table so the per-user ring buffer can be pruned
//! with plain SQL.

mod repository;
mod views;

pub use repository::Repository;
pub use views::RECENT_VIEWS_LIMIT;

use crate::error::{AppError, AppResult};
use crate::models::{DataSource, Record, Report};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS data_sources (
        id TEXT PRIMARY KEY NOT NULL,
        body TEXT NOT NULL,
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS reports (
        id TEXT PRIMARY KEY NOT NULL,
        body TEXT NOT NULL,
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS report_views (
        id TEXT PRIMARY KEY NOT NULL,
        report_id TEXT NOT NULL,
        user_id TEXT NOT NULL,
        viewed_at INTEGER NOT NULL,
        seq INTEGER NOT NULL,
        UNIQUE (report_id, user_id)
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_report_views_user
    ON report_views (user_id, viewed_at)
    "#,
];

/// Handle to the record store. Cheap to clone; all clones share one pool.
#[derive(Debug, Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Open the store at `url` and create its tables if needed.
    ///
    /// The pool holds a single long-lived connection, which also keeps
    /// `sqlite::memory:` databases alive for the lifetime of the store.
    pub async fn open(url: &str) -> AppResult<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| AppError::store(format!("Invalid store URL: {e}")))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(1)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        for statement in SCHEMA {
            sqlx::query(statement).execute(&pool).await?;
        }

        info!(url = %url, "Record store opened");
        Ok(Self { pool })
    }

    pub async fn close(&self) {
        self.pool.close().await;
        info!("Record store closed");
    }

    pub fn data_sources(&self) -> Repository<DataSource> {
        self.repository()
    }

    pub fn reports(&self) -> Repository<Report> {
        self.repository()
    }

    pub fn repository<R: Record>(&self) -> Repository<R> {
        Repository::new(self.pool.clone())
    }

    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
