//! Core operations: schema discovery and safe querying.

pub mod discovery;
pub mod query;

pub use discovery::SchemaDiscovery;
pub use query::SafeQueryExecutor;
