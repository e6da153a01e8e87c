//! Redshift database backend over the Postgres wire protocol

use crate::error::{DbError, DbResult};
use crate::traits::Database;
use async_trait::async_trait;
use sd_core::ConnectionSettings;
use sqlx::postgres::{PgConnectOptions, PgConnection, PgSslMode};
use sqlx::Connection as _;
use tokio::sync::Mutex;

/// Redshift backend holding a single connection for the whole batch
///
/// Statements go through the simple-query protocol so DDL, DML and
/// transaction control all behave as they would in `psql`.
pub struct RedshiftBackend {
    conn: Mutex<Option<PgConnection>>,
}

impl RedshiftBackend {
    /// Open one TLS connection using the given settings
    pub async fn connect(settings: &ConnectionSettings) -> DbResult<Self> {
        let options = PgConnectOptions::new()
            .host(&settings.host)
            .port(settings.port)
            .database(&settings.database)
            .username(&settings.user)
            .password(&settings.password)
            .ssl_mode(PgSslMode::Require);

        let conn = PgConnection::connect_with(&options).await.map_err(|e| {
            DbError::ConnectionError(format!("{}:{}: {}", settings.host, settings.port, e))
        })?;

        Ok(Self {
            conn: Mutex::new(Some(conn)),
        })
    }

    /// Backend with no connection, as left behind by `close`
    #[cfg(test)]
    fn detached() -> Self {
        Self {
            conn: Mutex::new(None),
        }
    }

    /// Run `sql` on the held connection, mapping driver errors with `on_error`.
    async fn run(
        &self,
        sql: &str,
        on_error: impl FnOnce(sqlx::Error) -> DbError,
    ) -> DbResult<u64> {
        let mut guard = self.conn.lock().await;
        let conn = guard.as_mut().ok_or(DbError::ConnectionClosed)?;
        let result = sqlx::Executor::execute(&mut *conn, sqlx::raw_sql(sql))
            .await
            .map_err(on_error)?;
        Ok(result.rows_affected())
    }

    async fn transaction_control(&self, operation: &str) -> DbResult<()> {
        self.run(operation, |e| DbError::TransactionError {
            operation: operation.to_string(),
            message: e.to_string(),
        })
        .await
        .map(|_| ())
    }
}

#[async_trait]
impl Database for RedshiftBackend {
    async fn begin(&self) -> DbResult<()> {
        self.transaction_control("BEGIN").await
    }

    async fn execute(&self, sql: &str) -> DbResult<Option<u64>> {
        self.run(sql, |e| DbError::ExecutionError(format!("{}: {}", e, sql)))
            .await
            .map(Some)
    }

    async fn commit(&self) -> DbResult<()> {
        self.transaction_control("COMMIT").await
    }

    async fn rollback(&self) -> DbResult<()> {
        self.transaction_control("ROLLBACK").await
    }

    async fn close(&self) -> DbResult<()> {
        let conn = self.conn.lock().await.take();
        match conn {
            Some(conn) => conn
                .close()
                .await
                .map_err(|e| DbError::ConnectionError(format!("close failed: {}", e))),
            None => Ok(()),
        }
    }

    fn db_type(&self) -> &'static str {
        "redshift"
    }
}

#[cfg(test)]
#[path = "redshift_test.rs"]
mod tests;
