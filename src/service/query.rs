//! Safe bounded reads against an external database.
//!
//! Every identifier in a request is checked against a schema document before
//! any connection is opened. Only names the document knows about reach the
//! statement builder, and they are quoted there as well.

use crate::db::{Connector, Dialect, DialectAdapter, RowSet, build_select};
use crate::error::{AppError, AppResult};
use crate::models::{ConnectionDetails, SchemaDocument, SchemaSource, coerce_limit};
use crate::store::Store;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Clone)]
pub struct SafeQueryExecutor {
    connector: Arc<dyn Connector>,
    store: Store,
}

/// Everything the executor needs once a schema source is resolved.
struct ResolvedSource {
    source_type: String,
    details: Option<ConnectionDetails>,
    schema: SchemaDocument,
}

impl SafeQueryExecutor {
    pub fn new(connector: Arc<dyn Connector>, store: Store) -> Self {
        Self { connector, store }
    }

    /// Read up to `limit` rows of `columns` from `table` (a table or view, by
    /// name or id).
    pub async fn query(
        &self,
        source: SchemaSource,
        table: &str,
        columns: &[String],
        limit: Option<&JsonValue>,
    ) -> AppResult<RowSet> {
        let resolved = self.resolve(source).await?;

        let dialect = Dialect::require(&resolved.source_type)?;
        let details = resolved
            .details
            .as_ref()
            .ok_or_else(|| AppError::validation("connectionDetails required"))?;

        let relation = resolved
            .schema
            .find_relation(table)
            .ok_or_else(|| AppError::validation(format!("unknown table: {table}")))?;
        if columns.is_empty() {
            return Err(AppError::validation("columns required"));
        }

        let known = relation.columns();
        let invalid: Vec<String> = columns
            .iter()
            .filter(|requested| !known.iter().any(|c| &c.name == *requested))
            .cloned()
            .collect();
        if !invalid.is_empty() {
            return Err(AppError::invalid_identifiers("invalid columns", invalid));
        }

        let host = details
            .host()
            .ok_or_else(|| AppError::validation("connection host required"))?;

        let limit = coerce_limit(limit);
        let statement = build_select(dialect, relation.name(), columns, limit);

        info!(
            dialect = %dialect,
            host = %host,
            table = %relation.name(),
            columns = columns.len(),
            limit,
            "Executing bounded query"
        );

        let mut adapter = DialectAdapter::connect(self.connector.as_ref(), dialect, details)
            .await
            .map_err(|e| {
                error!(dialect = %dialect, target = %details.masked(), error = %e, "Query connect failed");
                AppError::query(e.to_string())
            })?;

        let result = adapter.fetch(&statement).await;
        adapter.disconnect().await;

        let rows = result.map_err(|e| {
            error!(dialect = %dialect, table = %relation.name(), error = %e, "Query failed");
            AppError::query(e.to_string())
        })?;

        info!(
            dialect = %dialect,
            table = %relation.name(),
            count = rows.len(),
            "Query completed"
        );
        Ok(rows)
    }

    async fn resolve(&self, source: SchemaSource) -> AppResult<ResolvedSource> {
        match source {
            SchemaSource::Stored(id) => {
                let data_source = self.store.data_sources().get(&id).await?;
                Ok(ResolvedSource {
                    schema: data_source.schema(),
                    source_type: data_source.source_type,
                    details: data_source.connection_details,
                })
            }
            SchemaSource::AdHoc(ad_hoc) => Ok(ResolvedSource {
                schema: ad_hoc.schema(),
                source_type: ad_hoc.source_type,
                details: ad_hoc.connection_details,
            }),
        }
    }
}
