//! Shared test doubles: a scripted database driver and fake AI gateways.

#![allow(dead_code)]

use async_trait::async_trait;
use report_builder::ai::AiGateway;
use report_builder::db::{Connector, Dialect, RowSet, Session, SqlParam};
use report_builder::error::{AppError, AppResult};
use report_builder::models::{ConnectionDetails, DataSource, Report};
use serde_json::{Value as JsonValue, json};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One scripted reply to a statement.
#[derive(Debug, Clone)]
pub enum Reply {
    Rows(RowSet),
    Fail(String),
}

/// Rows from a JSON array of objects.
pub fn rows(value: JsonValue) -> RowSet {
    value
        .as_array()
        .expect("rows fixture must be an array")
        .iter()
        .map(|row| row.as_object().expect("row must be an object").clone())
        .collect()
}

pub fn reply(value: JsonValue) -> Reply {
    Reply::Rows(rows(value))
}

pub fn empty() -> Reply {
    Reply::Rows(RowSet::new())
}

pub fn fail(message: &str) -> Reply {
    Reply::Fail(message.to_string())
}

#[derive(Default)]
struct Shared {
    replies: Mutex<VecDeque<Reply>>,
    statements: Mutex<Vec<(String, Vec<SqlParam>)>>,
    connects: AtomicUsize,
    closes: AtomicUsize,
}

/// In-process driver that answers statements from a queue of replies.
///
/// A statement with no reply left gets an empty row set. When the last
/// parameter is an integer the reply is truncated to it, like `LIMIT`.
#[derive(Clone, Default)]
pub struct ScriptedConnector {
    shared: Arc<Shared>,
    refuse: bool,
}

impl ScriptedConnector {
    pub fn new(replies: Vec<Reply>) -> Self {
        let connector = Self::default();
        connector.push(replies);
        connector
    }

    /// A connector whose every connection attempt fails.
    pub fn refusing() -> Self {
        Self {
            refuse: true,
            ..Self::default()
        }
    }

    pub fn push(&self, replies: Vec<Reply>) {
        self.shared.replies.lock().unwrap().extend(replies);
    }

    pub fn connects(&self) -> usize {
        self.shared.connects.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.shared.closes.load(Ordering::SeqCst)
    }

    pub fn statements(&self) -> Vec<(String, Vec<SqlParam>)> {
        self.shared.statements.lock().unwrap().clone()
    }

    pub fn remaining(&self) -> usize {
        self.shared.replies.lock().unwrap().len()
    }

    pub fn arc(&self) -> Arc<dyn Connector> {
        Arc::new(self.clone())
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    async fn open(
        &self,
        _dialect: Dialect,
        details: &ConnectionDetails,
    ) -> AppResult<Box<dyn Session>> {
        self.shared.connects.fetch_add(1, Ordering::SeqCst);
        if self.refuse {
            return Err(AppError::connection(format!(
                "conn fail: {}",
                details.host().unwrap_or_default()
            )));
        }
        Ok(Box::new(ScriptedSession {
            shared: self.shared.clone(),
            closed: false,
        }))
    }
}

struct ScriptedSession {
    shared: Arc<Shared>,
    closed: bool,
}

#[async_trait]
impl Session for ScriptedSession {
    async fn query(&mut self, sql: &str, params: &[SqlParam]) -> AppResult<RowSet> {
        assert!(!self.closed, "query on a closed session");
        self.shared
            .statements
            .lock()
            .unwrap()
            .push((sql.to_string(), params.to_vec()));

        let next = self.shared.replies.lock().unwrap().pop_front();
        match next {
            None => Ok(RowSet::new()),
            Some(Reply::Fail(message)) => Err(AppError::query(message)),
            Some(Reply::Rows(mut rows)) => {
                if let Some(SqlParam::Int(limit)) = params.last() {
                    rows.truncate(*limit as usize);
                }
                Ok(rows)
            }
        }
    }

    async fn close(&mut self) -> AppResult<()> {
        if !self.closed {
            self.closed = true;
            self.shared.closes.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

/// Gateway that answers after `delay` with canned data.
pub struct FakeGateway {
    pub delay: Duration,
    pub rows: Vec<JsonValue>,
    pub fail: bool,
}

impl FakeGateway {
    pub fn answering(rows: Vec<JsonValue>) -> Self {
        Self {
            delay: Duration::ZERO,
            rows,
            fail: false,
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            delay,
            rows: Vec::new(),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            delay: Duration::ZERO,
            rows: Vec::new(),
            fail: true,
        }
    }
}

#[async_trait]
impl AiGateway for FakeGateway {
    async fn generate_rows(
        &self,
        data_source: &DataSource,
        report: &Report,
        row_count: u32,
    ) -> AppResult<Vec<JsonValue>> {
        tokio::time::sleep(self.delay).await;
        if self.fail {
            return Err(AppError::ai("upstream exploded"));
        }
        let mut rows = self.rows.clone();
        rows.push(json!({
            "dataSource": data_source.id,
            "report": report.id,
            "rowCount": row_count
        }));
        Ok(rows)
    }

    async fn generate_schema(
        &self,
        db_type: &str,
        db_name: &str,
        context: &str,
    ) -> AppResult<JsonValue> {
        tokio::time::sleep(self.delay).await;
        if self.fail {
            return Err(AppError::ai("upstream exploded"));
        }
        Ok(json!([{ "name": db_name, "type": db_type, "context": context }]))
    }
}

/// Catalog replies for a Postgres database holding `T(id int primary key, name varchar)`.
pub fn single_table_catalog() -> Vec<Reply> {
    vec![
        reply(json!([{ "table_name": "T" }])),
        reply(json!([
            { "column_name": "id", "data_type": "integer", "is_nullable": "NO", "is_primary_key": true, "is_unique": false },
            { "column_name": "name", "data_type": "character varying", "is_nullable": "YES", "is_primary_key": false, "is_unique": false }
        ])),
        empty(),
        reply(json!([
            { "index_name": "T_pkey", "column_name": "id", "is_unique": true, "is_primary": true }
        ])),
        reply(json!([
            { "constraint_name": "T_pkey", "constraint_type": "PRIMARY KEY", "column_name": "id", "check_clause": null }
        ])),
        empty(),
    ]
}

pub fn local_details() -> ConnectionDetails {
    ConnectionDetails::new("localhost")
        .with_port(5432)
        .with_database("db")
        .with_credentials("u", "p")
}
