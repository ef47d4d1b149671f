//! PostgreSQL session over a single sqlx connection.

use crate::db::dialect::{Dialect, SqlParam};
use crate::db::session::Session;
use crate::db::types::{RowSet, RowToJson};
use crate::error::{AppError, AppResult};
use crate::models::ConnectionDetails;
use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgSslMode};
use sqlx::{Connection, PgConnection};

pub struct PgSession {
    conn: Option<PgConnection>,
}

impl PgSession {
    pub async fn connect(details: &ConnectionDetails) -> AppResult<Self> {
        let options = connect_options(details)?;
        let conn = PgConnection::connect_with(&options)
            .await
            .map_err(|e| AppError::connection(e.to_string()))?;
        Ok(Self { conn: Some(conn) })
    }
}

fn connect_options(details: &ConnectionDetails) -> AppResult<PgConnectOptions> {
    let dialect = Dialect::Postgres;
    let host = details
        .host()
        .ok_or_else(|| AppError::validation("connection host required"))?;

    let mut options = PgConnectOptions::new()
        .host(host)
        .port(details.port.unwrap_or(dialect.default_port()))
        .database(
            details
                .database
                .as_deref()
                .unwrap_or(dialect.default_database()),
        )
        .ssl_mode(if details.encrypt.unwrap_or(false) {
            PgSslMode::Require
        } else {
            PgSslMode::Prefer
        });

    if let Some(user) = &details.username {
        options = options.username(user);
    }
    if let Some(password) = &details.password {
        options = options.password(password);
    }
    Ok(options)
}

#[async_trait]
impl Session for PgSession {
    async fn query(&mut self, sql: &str, params: &[SqlParam]) -> AppResult<RowSet> {
        let conn = self
            .conn
            .as_mut()
            .ok_or_else(|| AppError::query("session is closed"))?;

        let mut query = sqlx::query(sql);
        for param in params {
            query = match param {
                SqlParam::Text(s) => query.bind(s.clone()),
                SqlParam::Int(n) => query.bind(*n),
            };
        }

        let rows = query
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| AppError::query(e.to_string()))?;

        Ok(rows.iter().map(RowToJson::to_json_map).collect())
    }

    async fn close(&mut self) -> AppResult<()> {
        match self.conn.take() {
            Some(conn) => conn
                .close()
                .await
                .map_err(|e| AppError::connection(e.to_string())),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_options_defaults() {
        let options = connect_options(&ConnectionDetails::new("db.internal")).unwrap();
        assert_eq!(options.get_host(), "db.internal");
        assert_eq!(options.get_port(), 5432);
        assert_eq!(options.get_database(), Some("postgres"));
    }

    #[test]
    fn test_connect_options_requires_host() {
        let err = connect_options(&ConnectionDetails::default()).unwrap_err();
        assert!(err.is_validation());
    }
}
