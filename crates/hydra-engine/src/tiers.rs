//! Cache-aside access to the local and distributed tiers.
//!
//! ## Lookup Order
//!
//! 1. L1 (local) - hit returns immediately, L2 is not touched
//! 2. L2 (distributed) - hit is promoted into L1
//! 3. miss
//!
//! L2 errors are logged and treated as misses. Write-back failures are logged
//! and otherwise ignored.

use std::sync::Arc;

use hydra_cache::{DistributedCache, DistributedCacheExt, DynDistributedCache, LocalCache};
use hydra_core::{Account, CacheKey, Identifier, Variant, url_cache_cost};

use crate::config::TierTtls;
use crate::stats::HydrationStats;

/// Value stored in the process-local cache.
///
/// Account and image entries share one cost budget; their keys never collide.
#[derive(Debug, Clone, PartialEq)]
pub enum Snapshot {
    Account(Account),
    ImageUrl(String),
}

pub struct CacheTiers {
    local: Arc<LocalCache<Snapshot>>,
    distributed: DynDistributedCache,
    account_ttls: TierTtls,
    image_ttls: TierTtls,
    stats: Arc<HydrationStats>,
}

impl CacheTiers {
    pub fn new(
        local: Arc<LocalCache<Snapshot>>,
        distributed: DynDistributedCache,
        account_ttls: TierTtls,
        image_ttls: TierTtls,
        stats: Arc<HydrationStats>,
    ) -> Self {
        Self {
            local,
            distributed,
            account_ttls,
            image_ttls,
            stats,
        }
    }

    pub async fn account(&self, id: Identifier) -> Option<Account> {
        let key = CacheKey::account(id);

        if let Some(Snapshot::Account(account)) = self.local.get(&key).await {
            tracing::debug!(key = %key, "cache hit (L1)");
            self.stats.record_local_hit();
            return Some(account);
        }

        match self.distributed.get_object::<Account>(key.as_str()).await {
            Ok(Some(account)) => {
                tracing::debug!(key = %key, "cache hit (L2)");
                self.stats.record_distributed_hit();
                self.local
                    .put(
                        key,
                        Snapshot::Account(account.clone()),
                        account.cache_cost(),
                        self.account_ttls.local,
                    )
                    .await;
                Some(account)
            }
            Ok(None) => {
                tracing::debug!(key = %key, "cache miss");
                None
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "distributed cache GET error");
                self.stats.record_distributed_error();
                None
            }
        }
    }

    pub async fn store_account(&self, account: &Account) {
        let key = CacheKey::account(account.id);
        self.local
            .put(
                key.clone(),
                Snapshot::Account(account.clone()),
                account.cache_cost(),
                self.account_ttls.local,
            )
            .await;

        if let Err(e) = self
            .distributed
            .set_object(key.as_str(), account, self.account_ttls.distributed)
            .await
        {
            tracing::warn!(key = %key, error = %e, "distributed cache SET error");
            self.stats.record_distributed_error();
        }
    }

    pub async fn image_url(&self, id: Identifier, variant: Variant) -> Option<String> {
        let key = CacheKey::image(id, variant);

        if let Some(Snapshot::ImageUrl(url)) = self.local.get(&key).await {
            tracing::debug!(key = %key, "cache hit (L1)");
            self.stats.record_local_hit();
            return Some(url);
        }

        match self.distributed.get_string(key.as_str()).await {
            Ok(Some(url)) => {
                tracing::debug!(key = %key, "cache hit (L2)");
                self.stats.record_distributed_hit();
                let cost = url_cache_cost(&url);
                self.local
                    .put(key, Snapshot::ImageUrl(url.clone()), cost, self.image_ttls.local)
                    .await;
                Some(url)
            }
            Ok(None) => {
                tracing::debug!(key = %key, "cache miss");
                None
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "distributed cache GET error");
                self.stats.record_distributed_error();
                None
            }
        }
    }

    pub async fn store_image_url(&self, id: Identifier, variant: Variant, url: &str) {
        let key = CacheKey::image(id, variant);
        self.local
            .put(
                key.clone(),
                Snapshot::ImageUrl(url.to_string()),
                url_cache_cost(url),
                self.image_ttls.local,
            )
            .await;

        if let Err(e) = self
            .distributed
            .set_string(key.as_str(), url, self.image_ttls.distributed)
            .await
        {
            tracing::warn!(key = %key, error = %e, "distributed cache SET error");
            self.stats.record_distributed_error();
        }
    }
}
