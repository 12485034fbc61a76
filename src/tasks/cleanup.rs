//! TTL Cleanup Task
//!
//! Background task that periodically removes expired cache entries.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::SharedCache;
use crate::config::DEFAULT_CLEANUP_INTERVAL;

/// Spawns a background task that periodically cleans up expired cache entries.
///
/// Expired entries are never served even without this task; sweeping only
/// releases their memory before they would otherwise be evicted or looked up.
///
/// # Arguments
/// * `cache` - shared cache to sweep
/// * `interval` - time between sweeps; zero selects the default of one second
///
/// # Returns
/// A JoinHandle for the spawned task; abort it to stop sweeping.
pub fn spawn_cleanup_task<V>(cache: SharedCache<V>, interval: Duration) -> JoinHandle<()>
where
    V: Clone + Send + 'static,
{
    let interval = if interval.is_zero() {
        Duration::from_secs(DEFAULT_CLEANUP_INTERVAL)
    } else {
        interval
    };

    tokio::spawn(async move {
        info!(
            interval_ms = interval.as_millis() as u64,
            "Starting TTL cleanup task"
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = cache.lock().await.cleanup_expired();

            if removed > 0 {
                info!("TTL cleanup: removed {} expired entries", removed);
            } else {
                debug!("TTL cleanup: no expired entries found");
            }
        }
    })
}
