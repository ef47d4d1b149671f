//! External database access.
//!
//! - Dialects, identifier quoting and bounded statement building
//! - Driver sessions (sqlx for Postgres, tiberius for SQL Server)
//! - Catalog queries and the dialect adapter that runs them
//! - Raw type mapping and row decoding

pub mod adapter;
pub mod catalog;
pub mod dialect;
pub mod mssql;
pub mod postgres;
pub mod session;
pub mod types;

pub use adapter::DialectAdapter;
pub use catalog::ViewEntry;
pub use dialect::{Dialect, SelectStatement, SqlParam, build_select};
pub use session::{Connector, DriverConnector, Session};
pub use types::{Row, RowSet, map_type};
