//! SQL Server session over a single tiberius client.

use crate::db::dialect::{Dialect, SqlParam};
use crate::db::session::Session;
use crate::db::types::{Row, RowSet, decode_binary_value, float_value, scaled_decimal_text};
use crate::error::{AppError, AppResult};
use crate::models::ConnectionDetails;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use futures_util::TryStreamExt;
use serde_json::Value as JsonValue;
use tiberius::{AuthMethod, Client, ColumnData, Config, EncryptionLevel, FromSql, Query};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

pub struct TdsSession {
    client: Option<Client<Compat<TcpStream>>>,
}

impl TdsSession {
    pub async fn connect(details: &ConnectionDetails) -> AppResult<Self> {
        let config = client_config(details)?;

        let tcp = TcpStream::connect(config.get_addr())
            .await
            .map_err(|e| AppError::connection(e.to_string()))?;
        tcp.set_nodelay(true)
            .map_err(|e| AppError::connection(e.to_string()))?;

        let client = Client::connect(config, tcp.compat_write())
            .await
            .map_err(|e| AppError::connection(e.to_string()))?;
        Ok(Self {
            client: Some(client),
        })
    }
}

fn client_config(details: &ConnectionDetails) -> AppResult<Config> {
    let dialect = Dialect::SqlServer;
    let host = details
        .host()
        .ok_or_else(|| AppError::validation("connection host required"))?;

    let mut config = Config::new();
    config.host(host);
    config.port(details.port.unwrap_or(dialect.default_port()));
    config.database(
        details
            .database
            .as_deref()
            .unwrap_or(dialect.default_database()),
    );
    config.authentication(AuthMethod::sql_server(
        details.username.as_deref().unwrap_or_default(),
        details.password.as_deref().unwrap_or_default(),
    ));
    config.encryption(if details.encrypt.unwrap_or(false) {
        EncryptionLevel::Required
    } else {
        EncryptionLevel::Off
    });
    if details.trust_server_certificate.unwrap_or(true) {
        config.trust_cert();
    }
    Ok(config)
}

#[async_trait]
impl Session for TdsSession {
    async fn query(&mut self, sql: &str, params: &[SqlParam]) -> AppResult<RowSet> {
        let client = self
            .client
            .as_mut()
            .ok_or_else(|| AppError::query("session is closed"))?;

        let mut query = Query::new(sql);
        for param in params {
            match param {
                SqlParam::Text(s) => query.bind(s.clone()),
                SqlParam::Int(n) => query.bind(*n),
            }
        }

        let stream = query.query(client).await?;
        let rows: Vec<tiberius::Row> = stream.into_row_stream().try_collect().await?;

        Ok(rows.iter().map(row_to_json).collect())
    }

    async fn close(&mut self) -> AppResult<()> {
        match self.client.take() {
            Some(client) => client.close().await.map_err(AppError::from),
            None => Ok(()),
        }
    }
}

fn row_to_json(row: &tiberius::Row) -> Row {
    row.cells()
        .map(|(col, data)| (col.name().to_string(), cell_to_json(data)))
        .collect()
}

fn cell_to_json(data: &ColumnData<'static>) -> JsonValue {
    let value = match data {
        ColumnData::U8(v) => v.map(JsonValue::from),
        ColumnData::I16(v) => v.map(JsonValue::from),
        ColumnData::I32(v) => v.map(JsonValue::from),
        ColumnData::I64(v) => v.map(JsonValue::from),
        ColumnData::F32(v) => v.map(|f| float_value(f as f64)),
        ColumnData::F64(v) => v.map(float_value),
        ColumnData::Bit(v) => v.map(JsonValue::Bool),
        ColumnData::String(v) => v.as_ref().map(|s| JsonValue::String(s.to_string())),
        ColumnData::Guid(v) => v.map(|g| JsonValue::String(g.to_string())),
        ColumnData::Binary(v) => v.as_ref().map(|b| decode_binary_value(b)),
        ColumnData::Numeric(v) => v
            .as_ref()
            .map(|n| JsonValue::String(scaled_decimal_text(n.value(), n.scale()))),
        ColumnData::Xml(v) => v
            .as_ref()
            .map(|x| JsonValue::String((**x).clone().into_string())),
        other => return temporal_to_json(other),
    };
    value.unwrap_or(JsonValue::Null)
}

/// Date and time cells, rendered as ISO-8601 text.
fn temporal_to_json(data: &ColumnData<'static>) -> JsonValue {
    if let Ok(Some(v)) = DateTime::<FixedOffset>::from_sql(data) {
        return JsonValue::String(v.to_rfc3339());
    }
    if let Ok(Some(v)) = NaiveDateTime::from_sql(data) {
        return JsonValue::String(v.format("%Y-%m-%dT%H:%M:%S%.f").to_string());
    }
    if let Ok(Some(v)) = NaiveDate::from_sql(data) {
        return JsonValue::String(v.to_string());
    }
    if let Ok(Some(v)) = NaiveTime::from_sql(data) {
        return JsonValue::String(v.to_string());
    }
    JsonValue::Null
}
