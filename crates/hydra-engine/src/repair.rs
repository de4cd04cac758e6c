//! Stale image reference repair.
//!
//! When an account points at an image the image origin reports as failed or
//! missing, the account origin is asked to drop the reference. The request
//! runs on its own task so a caller that disconnects, or a hydration future
//! that is dropped, does not cancel it.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use hydra_core::{DynAccountOrigin, Identifier};
use tokio_util::task::TaskTracker;

use crate::stats::HydrationStats;

pub struct StaleReferenceRepairer {
    origin: DynAccountOrigin,
    tracker: TaskTracker,
    timeout: Duration,
    stats: Arc<HydrationStats>,
}

impl StaleReferenceRepairer {
    pub fn new(origin: DynAccountOrigin, timeout: Duration, stats: Arc<HydrationStats>) -> Self {
        Self {
            origin,
            tracker: TaskTracker::new(),
            timeout,
            stats,
        }
    }

    /// Submit permanently unresolvable image identifiers. Returns immediately.
    ///
    /// Failures are logged; there is no retry beyond what the origin does.
    pub fn repair(&self, image_ids: BTreeSet<Identifier>) {
        if image_ids.is_empty() {
            return;
        }

        let ids: Vec<Identifier> = image_ids.into_iter().collect();
        let origin = Arc::clone(&self.origin);
        let timeout = self.timeout;
        self.stats.record_repair();

        self.tracker.spawn(async move {
            let raw: Vec<i64> = ids.iter().map(|id| id.get()).collect();
            match tokio::time::timeout(timeout, origin.remove_broken_image_references(&ids)).await
            {
                Ok(Ok(())) => {
                    tracing::info!(image_ids = ?raw, "removed broken image references");
                }
                Ok(Err(e)) => {
                    tracing::warn!(
                        image_ids = ?raw,
                        error = %e,
                        "failed to remove broken image references"
                    );
                }
                Err(_) => {
                    tracing::warn!(
                        image_ids = ?raw,
                        timeout_ms = timeout.as_millis() as u64,
                        "timed out removing broken image references"
                    );
                }
            }
        });
    }

    /// Number of repair calls still running.
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Wait for every submitted repair to finish.
    ///
    /// Repairs submitted after this call are still spawned but no longer awaited.
    pub async fn drain(&self) {
        self.tracker.close();
        self.tracker.wait().await;
    }
}
