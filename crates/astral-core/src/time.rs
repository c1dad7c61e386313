//! Deadline helper for backend calls.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::result::AppResult;

/// Run `fut` with a deadline. Expiry surfaces as an internal error; there is
/// no retry.
pub async fn with_timeout<T, F>(limit: Duration, operation: &'static str, fut: F) -> AppResult<T>
where
    F: Future<Output = AppResult<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(elapsed) => {
            warn!(operation, timeout_ms = limit.as_millis() as u64, "Backend call timed out");
            Err(elapsed.into())
        }
    }
}
