//! The two cache coordination patterns used by the file engine.
//!
//! Writes run the cache task beside the backend call and wait for it;
//! read repopulation and invalidation are detached.

use std::future::Future;

use tokio::sync::oneshot;
use tracing::{debug, warn};

use astral_core::result::AppResult;

/// Runs `op` while `cache_task` runs on its own task, then waits for the
/// cache task to settle before returning `op`'s result.
///
/// The cache outcome is logged and never changes the returned value.
pub async fn write_through_blocking<T, F, C>(
    label: &'static str,
    op: F,
    cache_task: C,
) -> AppResult<T>
where
    F: Future<Output = AppResult<T>>,
    C: Future<Output = AppResult<()>> + Send + 'static,
{
    let (done_tx, done_rx) = oneshot::channel();
    tokio::spawn(async move {
        // The receiver is awaited below; a send error means it was dropped.
        let _ = done_tx.send(cache_task.await);
    });

    let result = op.await;

    match done_rx.await {
        Ok(Ok(())) => debug!(task = label, "Cache task completed"),
        Ok(Err(e)) => warn!(task = label, error = %e, "Cache task failed"),
        Err(_) => warn!(task = label, "Cache task aborted"),
    }

    result
}

/// Spawns `task` and returns immediately. There is no return path: a
/// failure is logged and goes nowhere else.
pub fn read_through_detached<C>(label: &'static str, task: C)
where
    C: Future<Output = AppResult<()>> + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(e) = task.await {
            warn!(task = label, error = %e, "Detached cache task failed");
        }
    });
}
