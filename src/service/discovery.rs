//! Schema discovery over a live external database.

use crate::db::{Connector, Dialect, DialectAdapter};
use crate::error::{AppError, AppResult};
use crate::models::{ConnectionDetails, SchemaDocument, Table, View};
use std::sync::Arc;
use tracing::{debug, error, info};

#[derive(Clone)]
pub struct SchemaDiscovery {
    connector: Arc<dyn Connector>,
}

impl SchemaDiscovery {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self { connector }
    }

    /// Walk the catalog of the database behind `details` and assemble its
    /// tables and views. Ids are fresh on every call.
    ///
    /// The type and host are checked before any connection is attempted.
    pub async fn discover(
        &self,
        source_type: &str,
        details: Option<&ConnectionDetails>,
    ) -> AppResult<SchemaDocument> {
        let dialect = Dialect::require(source_type)?;
        let details =
            details.ok_or_else(|| AppError::validation("type and connectionDetails required"))?;
        let host = details
            .host()
            .ok_or_else(|| AppError::validation("connection host required"))?;

        info!(dialect = %dialect, host = %host, "Discovering schema");

        let mut adapter = DialectAdapter::connect(self.connector.as_ref(), dialect, details)
            .await
            .map_err(|e| {
                error!(dialect = %dialect, target = %details.masked(), error = %e, "Discovery connect failed");
                match e {
                    AppError::Connection { .. } => e,
                    other => AppError::connection(other.to_string()),
                }
            })?;

        let result = walk_catalog(&mut adapter).await;
        adapter.disconnect().await;

        let schema = result.inspect_err(|e| {
            error!(dialect = %dialect, host = %host, error = %e, "Schema discovery failed");
        })?;

        info!(
            dialect = %dialect,
            host = %host,
            tables = schema.tables.len(),
            views = schema.views.len(),
            "Schema discovered"
        );
        Ok(schema)
    }
}

async fn walk_catalog(adapter: &mut DialectAdapter) -> AppResult<SchemaDocument> {
    let mut tables = Vec::new();
    for name in adapter.list_base_tables().await? {
        let columns = adapter.get_columns(&name).await?;
        let foreign_keys = adapter.get_foreign_keys(&name).await?;
        let indexes = adapter.get_indexes(&name).await?;
        let constraints = adapter.get_constraints(&name).await?;

        debug!(
            table = %name,
            columns = columns.len(),
            foreign_keys = foreign_keys.len(),
            indexes = indexes.len(),
            constraints = constraints.len(),
            "Table introspected"
        );

        tables.push(
            Table::new(name)
                .with_columns(columns)
                .with_foreign_keys(foreign_keys)
                .with_indexes(indexes)
                .with_constraints(constraints),
        );
    }

    let mut views = Vec::new();
    for entry in adapter.list_views().await? {
        let columns = adapter.get_view_columns(&entry.name).await?;
        views.push(
            View::new(entry.name)
                .with_columns(columns)
                .with_definition(entry.definition),
        );
    }

    Ok(SchemaDocument::new(tables, views))
}
