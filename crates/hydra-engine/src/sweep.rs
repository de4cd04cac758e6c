//! Periodic purge of expired distributed-tier entries held in process.

use std::time::Duration;

use hydra_cache::DynDistributedCache;
use tokio::sync::watch;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::task::TaskTracker;

pub struct ExpirySweeper {
    tracker: TaskTracker,
    shutdown_tx: watch::Sender<bool>,
}

impl ExpirySweeper {
    /// Start sweeping `cache` every `period`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(cache: DynDistributedCache, period: Duration) -> Self {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let tracker = TaskTracker::new();

        tracker.spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let removed = cache.purge_expired();
                        if removed > 0 {
                            tracing::debug!(
                                removed,
                                backend = cache.backend_name(),
                                "purged expired distributed cache entries"
                            );
                        }
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }
        });
        tracker.close();

        Self {
            tracker,
            shutdown_tx,
        }
    }

    /// Stop the sweep and wait for the task to exit. Idempotent.
    pub async fn stop(&self) {
        let _ = self.shutdown_tx.send(true);
        self.tracker.wait().await;
    }

    pub fn is_running(&self) -> bool {
        !self.tracker.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hydra_cache::{DistributedCache, InMemoryCache};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_sweep_reclaims_expired_entries() {
        let memory = Arc::new(InMemoryCache::new());
        for i in 0..50 {
            memory
                .set_string(&format!("image:small:{i}"), "u", Duration::from_millis(10))
                .await
                .unwrap();
        }
        memory
            .set_string("account:1", "{}", Duration::from_secs(60))
            .await
            .unwrap();

        let sweeper = ExpirySweeper::start(memory.clone(), Duration::from_millis(20));
        tokio::time::sleep(Duration::from_millis(120)).await;

        assert_eq!(memory.len(), 1);
        sweeper.stop().await;
    }

    #[tokio::test]
    async fn test_stop_ends_the_task() {
        let sweeper = ExpirySweeper::start(Arc::new(InMemoryCache::new()), Duration::from_secs(60));
        assert!(sweeper.is_running());

        sweeper.stop().await;
        assert!(!sweeper.is_running());

        // Second stop returns immediately.
        sweeper.stop().await;
    }
}
