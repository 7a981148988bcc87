//! TTL Sweep Task
//!
//! Background task that periodically removes expired cache entries so keys
//! that are never read again still get reclaimed.
//!
//! The sweep never holds the store exclusively for a whole pass: it collects
//! candidates under a read lock, then removes them in small batches through
//! the same removal path a `delete` takes.

use std::sync::Weak;
use std::time::Duration;

use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::StoreInner;

/// Upper bound on removals per write-lock acquisition.
const SWEEP_BATCH: usize = 64;

// == Purge Pass ==
/// Removes every currently-expired entry, returning the number purged.
///
/// Expiry is rechecked under the write lock; a concurrent overwrite between
/// collection and removal keeps its entry.
pub(crate) async fn purge_expired(store: &RwLock<StoreInner>) -> usize {
    let candidates = store.read().await.expired_keys();

    let mut removed = 0;
    for batch in candidates.chunks(SWEEP_BATCH) {
        let mut guard = store.write().await;
        for key in batch {
            if guard.purge_if_expired(key) {
                removed += 1;
            }
        }
    }
    removed
}

// == Sweep Task ==
/// Spawns a background task that purges expired entries every `interval`.
///
/// The task stops when the shutdown signal flips (`close()` awaits the
/// returned handle) or when every cache handle has been dropped; it holds
/// only a weak reference to the store.
pub(crate) fn spawn_sweep_task(
    store: Weak<RwLock<StoreInner>>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            interval_secs = interval.as_secs(),
            "TTL sweep task started"
        );

        loop {
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = shutdown.changed() => {
                    info!("TTL sweep task stopping");
                    break;
                }
            }

            let Some(store) = store.upgrade() else {
                debug!("Cache dropped, TTL sweep task exiting");
                break;
            };

            let removed = purge_expired(&store).await;
            if removed > 0 {
                info!(removed, "TTL sweep removed expired entries");
            } else {
                debug!("TTL sweep found no expired entries");
            }
        }
    })
}
