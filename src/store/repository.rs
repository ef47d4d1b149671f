//! Generic JSON-document repository.

use crate::error::{AppError, AppResult};
use crate::models::{Record, new_id, now_timestamp};
use serde_json::{Map, Value as JsonValue};
use sqlx::SqlitePool;
use std::marker::PhantomData;
use tracing::debug;

pub struct Repository<R> {
    pool: SqlitePool,
    _record: PhantomData<R>,
}

impl<R: Record> Repository<R> {
    pub(crate) fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            _record: PhantomData,
        }
    }

    /// All records, oldest first.
    pub async fn find(&self) -> AppResult<Vec<R>> {
        let sql = format!("SELECT body FROM {} ORDER BY created_at, rowid", R::TABLE);
        let bodies: Vec<String> = sqlx::query_scalar(&sql).fetch_all(&self.pool).await?;
        bodies.iter().map(|body| decode::<R>(body)).collect()
    }

    pub async fn find_one(&self, id: &str) -> AppResult<Option<R>> {
        let sql = format!("SELECT body FROM {} WHERE id = ?", R::TABLE);
        let body: Option<String> = sqlx::query_scalar(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        body.as_deref().map(decode::<R>).transpose()
    }

    /// Like [`find_one`](Self::find_one) but a missing record is an error.
    pub async fn get(&self, id: &str) -> AppResult<R> {
        self.find_one(id)
            .await?
            .ok_or_else(|| AppError::not_found(R::ENTITY, id))
    }

    /// Build a new record from a client payload. Assigns a fresh id and a
    /// `createdAt` when none is given. Nothing is written.
    pub fn create(&self, payload: JsonValue) -> AppResult<R> {
        R::validate_new(&payload)?;
        let JsonValue::Object(mut fields) = payload else {
            return Err(AppError::validation(format!("{} must be an object", R::ENTITY)));
        };

        fields.insert("id".to_string(), JsonValue::String(new_id()));
        let has_created_at = fields
            .get("createdAt")
            .and_then(JsonValue::as_str)
            .is_some_and(|s| !s.is_empty());
        if !has_created_at {
            fields.insert("createdAt".to_string(), JsonValue::String(now_timestamp()));
        }

        from_fields(fields)
    }

    /// Insert or replace a record by id.
    pub async fn save(&self, record: &R) -> AppResult<()> {
        let body = serde_json::to_value(record)?;
        let created_at = body
            .get("createdAt")
            .and_then(JsonValue::as_str)
            .map(str::to_string)
            .unwrap_or_else(now_timestamp);

        let sql = format!(
            "INSERT INTO {} (id, body, created_at) VALUES (?, ?, ?) \
             ON CONFLICT(id) DO UPDATE SET body = excluded.body, created_at = excluded.created_at",
            R::TABLE
        );
        sqlx::query(&sql)
            .bind(record.id())
            .bind(body.to_string())
            .bind(created_at)
            .execute(&self.pool)
            .await?;

        debug!(entity = R::ENTITY, id = %record.id(), "Record saved");
        Ok(())
    }

    /// Shallow-merge `patch` into the stored record and save it. The id is
    /// never overwritten.
    pub async fn merge(&self, id: &str, patch: JsonValue) -> AppResult<R> {
        let existing = self.get(id).await?;
        let JsonValue::Object(patch) = patch else {
            return Err(AppError::validation(format!("{} patch must be an object", R::ENTITY)));
        };

        let JsonValue::Object(mut fields) = serde_json::to_value(&existing)? else {
            return Err(AppError::internal(format!("{} did not serialize to an object", R::ENTITY)));
        };
        for (key, value) in patch {
            if key != "id" {
                fields.insert(key, value);
            }
        }

        let merged: R = from_fields(fields)?;
        self.save(&merged).await?;
        Ok(merged)
    }

    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let sql = format!("DELETE FROM {} WHERE id = ?", R::TABLE);
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found(R::ENTITY, id));
        }
        debug!(entity = R::ENTITY, id = %id, "Record deleted");
        Ok(())
    }
}

fn from_fields<R: Record>(fields: Map<String, JsonValue>) -> AppResult<R> {
    serde_json::from_value(JsonValue::Object(fields))
        .map_err(|e| AppError::validation(format!("invalid {}: {e}", R::ENTITY)))
}

fn decode<R: Record>(body: &str) -> AppResult<R> {
    serde_json::from_str(body)
        .map_err(|e| AppError::store(format!("corrupt {} document: {e}", R::ENTITY)))
}
