use std::{future::Future, time::Duration};

use thiserror::Error;
use tracing::warn;

pub mod memory;

pub use memory::MemoryStore;

/// Failure of a persistence round-trip.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write.
    #[error("duplicate value violates {0}")]
    Duplicate(String),
    #[error("storage operation timed out")]
    Timeout,
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        if let Some(db) = e.as_database_error() {
            // 23505 = unique_violation
            if db.code().as_deref() == Some("23505") {
                return StoreError::Duplicate(db.constraint().unwrap_or("unique constraint").to_string());
            }
        }
        StoreError::Backend(anyhow::Error::new(e))
    }
}

/// Runs a store call under a deadline. An elapsed deadline says nothing about
/// whether the write committed; callers have to re-read to find out.
pub async fn bounded<T, F>(limit: Duration, op: F) -> StoreResult<T>
where
    F: Future<Output = StoreResult<T>>,
{
    match tokio::time::timeout(limit, op).await {
        Ok(res) => res,
        Err(_) => {
            warn!(timeout_ms = limit.as_millis() as u64, "storage deadline elapsed");
            Err(StoreError::Timeout)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn bounded_passes_through_fast_results() {
        let res = bounded(Duration::from_secs(1), async { Ok::<_, StoreError>(7) }).await;
        assert_eq!(res.unwrap(), 7);
    }

    #[tokio::test]
    async fn bounded_reports_timeout() {
        let res = bounded(Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, StoreError>(())
        })
        .await;
        assert!(matches!(res, Err(StoreError::Timeout)));
    }
}
