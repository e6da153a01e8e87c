//! sd-db - Database transport layer for sqldeploy
//!
//! This crate provides the transactional `Database` trait, a DuckDB backend
//! for local targets and tests, a Redshift backend (behind the default
//! `redshift` feature), and connection establishment with bounded retry.

pub mod connect;
pub mod duckdb;
pub mod error;
#[cfg(feature = "redshift")]
pub mod redshift;
pub mod traits;

pub use connect::{connect, connect_with_retry, open_target};
pub use duckdb::DuckDbBackend;
pub use error::{DbError, DbResult};
#[cfg(feature = "redshift")]
pub use redshift::RedshiftBackend;
pub use traits::Database;
