//! Account hydration.
//!
//! Accounts are consistency-critical: if the account origin cannot be reached
//! for the cache misses, the whole call fails. Embedded image references are
//! best effort and are resolved through the [`ImageHydrator`].

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use futures_util::future::join_all;
use hydra_core::{
    Account, EntityKind, HydrationError, HydrationResult, Identifier, Variant, validate_batch,
};

use crate::image::{ImageHydrator, Unresolved};
use crate::repair::StaleReferenceRepairer;
use crate::resolver::OriginBatchResolver;
use crate::tiers::CacheTiers;

pub struct AccountHydrator {
    tiers: Arc<CacheTiers>,
    resolver: Arc<OriginBatchResolver>,
    images: Arc<ImageHydrator>,
    repair: Arc<StaleReferenceRepairer>,
    image_variant: Variant,
}

impl AccountHydrator {
    pub fn new(
        tiers: Arc<CacheTiers>,
        resolver: Arc<OriginBatchResolver>,
        images: Arc<ImageHydrator>,
        repair: Arc<StaleReferenceRepairer>,
        image_variant: Variant,
    ) -> Self {
        Self {
            tiers,
            resolver,
            images,
            repair,
            image_variant,
        }
    }

    /// Resolve a batch of account identifiers.
    ///
    /// Accounts unknown to the origin are absent from the returned map. An
    /// empty batch returns an empty map without touching any tier.
    ///
    /// # Errors
    ///
    /// - [`HydrationError::InvalidIdentifier`] for the first identifier `<= 0`,
    ///   before any I/O.
    /// - [`HydrationError::Origin`] when the account origin call fails; no
    ///   partial result is returned.
    pub async fn resolve_accounts(
        &self,
        raw_ids: &[i64],
    ) -> HydrationResult<HashMap<Identifier, Account>> {
        if raw_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let ids = validate_batch(raw_ids)?;

        let lookups = join_all(
            ids.iter()
                .map(|&id| async move { (id, self.tiers.account(id).await) }),
        )
        .await;

        let mut accounts = HashMap::with_capacity(ids.len());
        let mut missing = Vec::new();
        for (id, cached) in lookups {
            match cached {
                Some(account) => {
                    accounts.insert(id, account);
                }
                None => missing.push(id),
            }
        }

        let mut fetched = Vec::new();
        if !missing.is_empty() {
            let batch = self.resolver.resolve_accounts(missing).await?;
            if !batch.unresolved.is_empty() {
                tracing::debug!(
                    ids = ?batch.unresolved.keys().map(|id| id.get()).collect::<Vec<_>>(),
                    "accounts not found at origin"
                );
            }
            fetched.extend(batch.resolved.keys().copied());
            accounts.extend(batch.resolved);
        }

        self.attach_images(&mut accounts).await;

        join_all(
            fetched
                .iter()
                .filter_map(|id| accounts.get(id))
                .map(|account| self.tiers.store_account(account)),
        )
        .await;

        Ok(accounts)
    }

    /// Resolve one account using the single-identifier origin call.
    ///
    /// # Errors
    ///
    /// [`HydrationError::NotFound`] when the origin has no such account, plus
    /// the errors of [`resolve_accounts`](Self::resolve_accounts).
    pub async fn resolve_account(&self, raw_id: i64) -> HydrationResult<Account> {
        let id = Identifier::new(raw_id)?;

        let (account, fetched) = match self.tiers.account(id).await {
            Some(account) => (account, false),
            None => {
                let account = self
                    .resolver
                    .resolve_account(id)
                    .await?
                    .ok_or_else(|| HydrationError::not_found(EntityKind::Account, raw_id))?;
                (account, true)
            }
        };

        let mut accounts = HashMap::from([(id, account)]);
        self.attach_images(&mut accounts).await;
        let account = accounts
            .remove(&id)
            .ok_or_else(|| HydrationError::internal(format!("account {id} lost during hydration")))?;

        if fetched {
            self.tiers.store_account(&account).await;
        }
        Ok(account)
    }

    /// Resolve embedded image references and queue repairs for broken ones.
    ///
    /// An image origin failure never fails the account call: freshly fetched
    /// accounts keep an empty URL and cached ones keep the URL they had.
    async fn attach_images(&self, accounts: &mut HashMap<Identifier, Account>) {
        let image_ids: BTreeSet<Identifier> =
            accounts.values().filter_map(|account| account.image_id).collect();
        if image_ids.is_empty() {
            return;
        }

        let hydration = self.images.hydrate(&image_ids, self.image_variant).await;
        if let Some(e) = &hydration.origin_error {
            tracing::warn!(
                count = image_ids.len(),
                error = %e,
                "embedded image lookup failed; returning accounts without URLs"
            );
        }

        for account in accounts.values_mut() {
            let Some(image_id) = account.image_id else {
                continue;
            };
            match (hydration.urls.get(&image_id), hydration.unresolved.get(&image_id)) {
                (Some(url), _) => account.image_url.clone_from(url),
                // Nothing new is known; a cached snapshot keeps its URL.
                (None, Some(Unresolved::Unavailable)) => {}
                (None, _) => account.image_url.clear(),
            }
        }

        self.repair.repair(hydration.failed_ids);
    }
}
