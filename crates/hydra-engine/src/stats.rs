//! Hydration counters for monitoring.

use std::sync::atomic::{AtomicU64, Ordering};

/// Engine-wide counters. Updated with relaxed ordering; values are for
/// dashboards and tests, not for synchronisation.
#[derive(Debug, Default)]
pub struct HydrationStats {
    local_hits: AtomicU64,
    distributed_hits: AtomicU64,
    distributed_errors: AtomicU64,
    origin_calls: AtomicU64,
    origin_resolved: AtomicU64,
    repairs_submitted: AtomicU64,
}

/// Point-in-time copy of [`HydrationStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub local_hits: u64,
    pub distributed_hits: u64,
    pub distributed_errors: u64,
    pub origin_calls: u64,
    pub origin_resolved: u64,
    pub repairs_submitted: u64,
}

impl StatsSnapshot {
    /// Share of lookups served by either cache tier, as a percentage of all
    /// identifiers that reached a tier or the origin.
    pub fn cache_hit_rate(&self) -> f64 {
        let hits = self.local_hits + self.distributed_hits;
        let total = hits + self.origin_resolved;
        if total == 0 {
            0.0
        } else {
            (hits as f64 / total as f64) * 100.0
        }
    }
}

impl HydrationStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_local_hit(&self) {
        self.local_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_distributed_hit(&self) {
        self.distributed_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_distributed_error(&self) {
        self.distributed_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_origin_call(&self, resolved: usize) {
        self.origin_calls.fetch_add(1, Ordering::Relaxed);
        self.origin_resolved
            .fetch_add(resolved as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_repair(&self) {
        self.repairs_submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            local_hits: self.local_hits.load(Ordering::Relaxed),
            distributed_hits: self.distributed_hits.load(Ordering::Relaxed),
            distributed_errors: self.distributed_errors.load(Ordering::Relaxed),
            origin_calls: self.origin_calls.load(Ordering::Relaxed),
            origin_resolved: self.origin_resolved.load(Ordering::Relaxed),
            repairs_submitted: self.repairs_submitted.load(Ordering::Relaxed),
        }
    }
}
