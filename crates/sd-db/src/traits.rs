//! Database trait definition

use crate::error::DbResult;
use async_trait::async_trait;

/// Transactional connection to a warehouse target
///
/// A batch opens one connection, calls [`begin`](Database::begin) once,
/// executes every statement of every script in order, then either commits or
/// rolls back. Implementations must be Send + Sync for async operation.
#[async_trait]
pub trait Database: Send + Sync {
    /// Open an explicit transaction (autocommit off)
    async fn begin(&self) -> DbResult<()>;

    /// Execute one statement, returning the affected-row count when the
    /// driver reports one
    async fn execute(&self, sql: &str) -> DbResult<Option<u64>>;

    /// Commit the open transaction
    async fn commit(&self) -> DbResult<()>;

    /// Roll back the open transaction
    async fn rollback(&self) -> DbResult<()>;

    /// Release the connection. Later calls fail with `ConnectionClosed`.
    async fn close(&self) -> DbResult<()>;

    /// Database type identifier for logging
    fn db_type(&self) -> &'static str;
}
