//! Connection establishment with bounded retry

use crate::duckdb::DuckDbBackend;
use crate::error::DbResult;
use crate::traits::Database;
use sd_core::{RetryPolicy, TargetConfig};
use std::future::Future;
use std::sync::Arc;

/// Call `connect` until it succeeds or `policy.attempts` is exhausted.
///
/// Sleeps `policy.delay` between attempts. The error from the last attempt
/// is returned. `connect` receives the 1-based attempt number.
pub async fn connect_with_retry<T, F, Fut>(policy: &RetryPolicy, mut connect: F) -> DbResult<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = DbResult<T>>,
{
    let attempts = policy.attempts.max(1);
    let mut attempt = 1;

    loop {
        match connect(attempt).await {
            Ok(conn) => {
                if attempt > 1 {
                    log::info!("Connected on attempt {}/{}", attempt, attempts);
                }
                return Ok(conn);
            }
            Err(e) if attempt < attempts => {
                log::warn!(
                    "Connection attempt {}/{} failed: {}. Retrying in {:.1}s",
                    attempt,
                    attempts,
                    e,
                    policy.delay.as_secs_f64()
                );
                tokio::time::sleep(policy.delay).await;
                attempt += 1;
            }
            Err(e) => {
                log::warn!("Connection attempt {}/{} failed: {}", attempt, attempts, e);
                return Err(e);
            }
        }
    }
}

/// Open one connection to the configured target.
pub async fn open_target(target: &TargetConfig) -> DbResult<Arc<dyn Database>> {
    match target {
        TargetConfig::DuckDb { path } => {
            let db: Arc<dyn Database> = Arc::new(DuckDbBackend::new(path)?);
            Ok(db)
        }
        #[cfg(feature = "redshift")]
        TargetConfig::Redshift(settings) => {
            let db: Arc<dyn Database> =
                Arc::new(crate::redshift::RedshiftBackend::connect(settings).await?);
            Ok(db)
        }
        #[cfg(not(feature = "redshift"))]
        TargetConfig::Redshift(_) => Err(crate::error::DbError::NotImplemented {
            backend: "redshift".to_string(),
            feature: "built without the `redshift` feature".to_string(),
        }),
    }
}

/// Open a connection to `target`, retrying per `policy`.
pub async fn connect(target: &TargetConfig, policy: &RetryPolicy) -> DbResult<Arc<dyn Database>> {
    connect_with_retry(policy, |attempt| {
        log::debug!("Opening {} connection (attempt {})", target.kind(), attempt);
        open_target(target)
    })
    .await
}

#[cfg(test)]
#[path = "connect_test.rs"]
mod tests;
