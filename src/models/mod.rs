//! Data models for the report builder server.
//!
//! This module re-exports all model types used throughout the application.

pub mod connection;
pub mod query;
pub mod record;
pub mod schema;

// Re-export commonly used types
pub use connection::ConnectionDetails;
pub use query::{
    AdHocSource, DEFAULT_ROW_LIMIT, MAX_ROW_LIMIT, QueryRequest, SchemaSource, coerce_limit,
};
pub use record::{DataSource, Record, Report, ReportView, SelectedColumn, now_timestamp};
pub use schema::{
    CanonicalType, Column, Constraint, ConstraintKind, ForeignKey, ForeignKeyAction, Index,
    Relation, SchemaDocument, Table, View, new_id,
};
