//! Engine composition.
//!
//! All components are constructed here and injected into each other. There
//! is no global state: two engines in one process have independent caches.

use std::collections::HashMap;
use std::sync::Arc;

use hydra_cache::{
    DistributedCache, DynDistributedCache, LocalCache, LocalCacheStats, create_distributed_cache,
};
use hydra_core::{
    Account, DynAccountOrigin, DynImageOrigin, HydrationResult, Identifier, Variant,
};

use crate::account::AccountHydrator;
use crate::config::HydraConfig;
use crate::image::{ImageHydration, ImageHydrator};
use crate::repair::StaleReferenceRepairer;
use crate::observability;
use crate::resolver::OriginBatchResolver;
use crate::stats::{HydrationStats, StatsSnapshot};
use crate::sweep::ExpirySweeper;
use crate::tiers::{CacheTiers, Snapshot};

pub struct HydrationEngine {
    accounts: Arc<AccountHydrator>,
    images: Arc<ImageHydrator>,
    repair: Arc<StaleReferenceRepairer>,
    sweeper: ExpirySweeper,
    local: Arc<LocalCache<Snapshot>>,
    distributed: DynDistributedCache,
    stats: Arc<HydrationStats>,
}

impl HydrationEngine {
    /// Wire an engine around an existing distributed cache.
    ///
    /// Starts the expiry sweep, so it must be called from within a Tokio
    /// runtime.
    pub fn new(
        config: &HydraConfig,
        account_origin: DynAccountOrigin,
        image_origin: DynImageOrigin,
        distributed: DynDistributedCache,
    ) -> Self {
        let stats = Arc::new(HydrationStats::new());
        let local = Arc::new(LocalCache::new(&config.local_cache));
        let settings = &config.hydration;

        let tiers = Arc::new(CacheTiers::new(
            Arc::clone(&local),
            Arc::clone(&distributed),
            settings.account_ttls(),
            settings.image_ttls(),
            Arc::clone(&stats),
        ));
        let resolver = Arc::new(OriginBatchResolver::new(
            Arc::clone(&account_origin),
            image_origin,
            Arc::clone(&stats),
        ));
        let repair = Arc::new(StaleReferenceRepairer::new(
            account_origin,
            settings.repair_timeout(),
            Arc::clone(&stats),
        ));
        let images = Arc::new(ImageHydrator::new(Arc::clone(&tiers), Arc::clone(&resolver)));
        let accounts = Arc::new(AccountHydrator::new(
            tiers,
            resolver,
            Arc::clone(&images),
            Arc::clone(&repair),
            settings.account_image_variant,
        ));

        let sweeper =
            ExpirySweeper::start(Arc::clone(&distributed), settings.expiry_sweep_interval());

        tracing::info!(
            local_cache = local.is_enabled(),
            distributed_cache = distributed.backend_name(),
            account_image_variant = %settings.account_image_variant,
            "hydration engine ready"
        );

        Self {
            accounts,
            images,
            repair,
            sweeper,
            local,
            distributed,
            stats,
        }
    }

    /// Wire an engine from loaded configuration.
    ///
    /// Installs tracing from `config.logging` unless the process already has
    /// a subscriber, then creates the distributed cache from `config.redis`.
    pub async fn from_config(
        config: &HydraConfig,
        account_origin: DynAccountOrigin,
        image_origin: DynImageOrigin,
    ) -> Self {
        observability::init_tracing(&config.logging);
        let distributed = create_distributed_cache(&config.redis).await;
        Self::new(config, account_origin, image_origin, distributed)
    }

    pub fn accounts(&self) -> &Arc<AccountHydrator> {
        &self.accounts
    }

    pub fn images(&self) -> &Arc<ImageHydrator> {
        &self.images
    }

    pub async fn resolve_accounts(
        &self,
        raw_ids: &[i64],
    ) -> HydrationResult<HashMap<Identifier, Account>> {
        self.accounts.resolve_accounts(raw_ids).await
    }

    pub async fn resolve_account(&self, raw_id: i64) -> HydrationResult<Account> {
        self.accounts.resolve_account(raw_id).await
    }

    pub async fn resolve_images(
        &self,
        raw_ids: &[i64],
        variant: Variant,
    ) -> HydrationResult<ImageHydration> {
        self.images.resolve_images(raw_ids, variant).await
    }

    pub async fn resolve_image(&self, raw_id: i64, variant: Variant) -> HydrationResult<String> {
        self.images.resolve_image(raw_id, variant).await
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Local cache counters, after flushing pending maintenance.
    pub async fn local_cache_stats(&self) -> LocalCacheStats {
        self.local.sync().await;
        self.local.stats()
    }

    pub fn distributed_backend(&self) -> &'static str {
        self.distributed.backend_name()
    }

    /// Stop the expiry sweep, wait for queued repairs, then drop and disable
    /// the local cache.
    ///
    /// Hydration calls made afterwards still work but bypass the local tier.
    pub async fn shutdown(&self) {
        let pending = self.repair.in_flight();
        self.sweeper.stop().await;
        self.repair.drain().await;
        self.local.shutdown().await;
        tracing::info!(drained_repairs = pending, "hydration engine shut down");
    }
}
