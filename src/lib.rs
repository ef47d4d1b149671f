//! Report Builder Server Library
//!
//! Backend for a report builder: persists data sources and reports,
//! discovers the schema of external PostgreSQL and SQL Server databases,
//! runs bounded whitelisted reads against them, and asks a generative model
//! for mock data.

pub mod ai;
pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod service;
pub mod store;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use service::{SafeQueryExecutor, SchemaDiscovery};
pub use store::Store;
