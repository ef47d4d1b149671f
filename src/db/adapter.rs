//! Dialect adapter: catalog introspection and bounded reads over one session.

use crate::db::catalog::{self, CatalogQuery, ViewEntry};
use crate::db::dialect::{Dialect, SelectStatement, SqlParam};
use crate::db::session::{Connector, Session};
use crate::db::types::RowSet;
use crate::error::AppResult;
use crate::models::{Column, Constraint, ConnectionDetails, ForeignKey, Index};
use tracing::{debug, warn};

/// One open connection plus the dialect that drives its catalog queries.
///
/// Callers own the adapter for a single discovery or query call and must
/// [`disconnect`](Self::disconnect) it on every path.
pub struct DialectAdapter {
    dialect: Dialect,
    session: Box<dyn Session>,
}

impl DialectAdapter {
    pub async fn connect(
        connector: &dyn Connector,
        dialect: Dialect,
        details: &ConnectionDetails,
    ) -> AppResult<Self> {
        let session = connector.open(dialect, details).await?;
        Ok(Self { dialect, session })
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub async fn list_base_tables(&mut self) -> AppResult<Vec<String>> {
        let rows = self.catalog(CatalogQuery::BaseTables, None).await?;
        Ok(catalog::parse_relation_names(&rows))
    }

    pub async fn list_views(&mut self) -> AppResult<Vec<ViewEntry>> {
        let rows = self.catalog(CatalogQuery::Views, None).await?;
        Ok(catalog::parse_views(&rows))
    }

    pub async fn get_columns(&mut self, table: &str) -> AppResult<Vec<Column>> {
        let rows = self.catalog(CatalogQuery::Columns, Some(table)).await?;
        Ok(catalog::parse_columns(self.dialect, &rows))
    }

    pub async fn get_view_columns(&mut self, view: &str) -> AppResult<Vec<Column>> {
        let rows = self.catalog(CatalogQuery::ViewColumns, Some(view)).await?;
        Ok(catalog::parse_columns(self.dialect, &rows))
    }

    pub async fn get_foreign_keys(&mut self, table: &str) -> AppResult<Vec<ForeignKey>> {
        let rows = self.metadata(CatalogQuery::ForeignKeys, table).await?;
        Ok(catalog::parse_foreign_keys(&rows))
    }

    pub async fn get_indexes(&mut self, table: &str) -> AppResult<Vec<Index>> {
        let rows = self.metadata(CatalogQuery::Indexes, table).await?;
        Ok(catalog::parse_indexes(&rows))
    }

    pub async fn get_constraints(&mut self, table: &str) -> AppResult<Vec<Constraint>> {
        let rows = self.metadata(CatalogQuery::Constraints, table).await?;
        Ok(catalog::parse_constraints(&rows))
    }

    /// Run a statement built by [`build_select`](crate::db::build_select).
    pub async fn fetch(&mut self, statement: &SelectStatement) -> AppResult<RowSet> {
        debug!(dialect = %self.dialect, sql = %statement.sql, "Executing select");
        self.session.query(&statement.sql, &statement.params).await
    }

    /// Close the session. A close failure is logged and swallowed.
    pub async fn disconnect(mut self) {
        if let Err(e) = self.session.close().await {
            warn!(dialect = %self.dialect, error = %e, "Failed to close connection");
        }
    }

    async fn catalog(&mut self, query: CatalogQuery, relation: Option<&str>) -> AppResult<RowSet> {
        let mut params = vec![SqlParam::from(self.dialect.default_schema())];
        if let Some(relation) = relation {
            params.push(SqlParam::from(relation));
        }

        let rows = self.session.query(query.sql(self.dialect), &params).await?;
        debug!(
            dialect = %self.dialect,
            query = query.label(),
            relation = relation.unwrap_or_default(),
            count = rows.len(),
            "Catalog fetch"
        );
        Ok(rows)
    }

    /// Foreign key, index and constraint fetches. SQL Server degrades a
    /// failure to no rows; Postgres propagates it.
    async fn metadata(&mut self, query: CatalogQuery, table: &str) -> AppResult<RowSet> {
        match self.catalog(query, Some(table)).await {
            Ok(rows) => Ok(rows),
            Err(e) if self.dialect.tolerates_metadata_errors() => {
                warn!(
                    dialect = %self.dialect,
                    table = %table,
                    query = query.label(),
                    error = %e,
                    "Catalog fetch failed, continuing without it"
                );
                Ok(RowSet::new())
            }
            Err(e) => Err(e),
        }
    }
}
