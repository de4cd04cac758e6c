//! Batched origin lookups.
//!
//! Each method issues at most one remote call, after deduplicating its input,
//! and folds the response into a [`BatchResult`] in which every requested
//! identifier is either resolved or carries a status.

use std::collections::BTreeSet;
use std::sync::Arc;

use hydra_core::{
    Account, BatchResult, DynAccountOrigin, DynImageOrigin, HydrationResult, Identifier,
    ImageLookup, ResolutionStatus, Variant,
};

use crate::stats::HydrationStats;

pub struct OriginBatchResolver {
    accounts: DynAccountOrigin,
    images: DynImageOrigin,
    stats: Arc<HydrationStats>,
}

impl OriginBatchResolver {
    pub fn new(
        accounts: DynAccountOrigin,
        images: DynImageOrigin,
        stats: Arc<HydrationStats>,
    ) -> Self {
        Self {
            accounts,
            images,
            stats,
        }
    }

    /// Fetch accounts in one call. Identifiers the origin does not return are
    /// reported as [`ResolutionStatus::NotFound`].
    pub async fn resolve_accounts(
        &self,
        ids: impl IntoIterator<Item = Identifier>,
    ) -> HydrationResult<BatchResult<Account>> {
        let requested: BTreeSet<Identifier> = ids.into_iter().collect();
        if requested.is_empty() {
            return Ok(BatchResult::default());
        }

        let batch: Vec<Identifier> = requested.iter().copied().collect();
        tracing::debug!(count = batch.len(), "fetching accounts from origin");
        let records = self.accounts.get_accounts(&batch).await?;

        let mut result = BatchResult::default();
        for record in records {
            let raw_id = record.id;
            match record.into_account() {
                Some(account) if requested.contains(&account.id) => {
                    result.resolved.insert(account.id, account);
                }
                _ => tracing::debug!(id = raw_id, "ignoring unrequested account record"),
            }
        }
        for id in requested {
            if !result.resolved.contains_key(&id) {
                result.unresolved.insert(id, ResolutionStatus::NotFound);
            }
        }

        self.stats.record_origin_call(result.resolved.len());
        Ok(result)
    }

    pub async fn resolve_account(&self, id: Identifier) -> HydrationResult<Option<Account>> {
        let record = self.accounts.get_account(id).await?;
        let account = record
            .and_then(|r| r.into_account())
            .filter(|account| account.id == id);
        self.stats.record_origin_call(usize::from(account.is_some()));
        Ok(account)
    }

    /// Fetch image URLs for one rendition in one call.
    ///
    /// A URL wins over a status reported for the same identifier. Requested
    /// identifiers the origin says nothing about are `NotFound`.
    pub async fn resolve_images(
        &self,
        ids: impl IntoIterator<Item = Identifier>,
        variant: Variant,
    ) -> HydrationResult<BatchResult<String>> {
        let requested: BTreeSet<Identifier> = ids.into_iter().collect();
        if requested.is_empty() {
            return Ok(BatchResult::default());
        }

        let batch: Vec<Identifier> = requested.iter().copied().collect();
        tracing::debug!(count = batch.len(), variant = %variant, "fetching image URLs from origin");
        let response = self.images.get_image_urls(&batch, variant).await?;

        let mut result = BatchResult::default();
        for (raw_id, url) in response.urls {
            match Identifier::from_reference(raw_id) {
                Some(id) if requested.contains(&id) => {
                    result.resolved.insert(id, url);
                }
                _ => tracing::debug!(id = raw_id, "ignoring unrequested image URL"),
            }
        }
        for entry in response.statuses {
            let Some(id) = Identifier::from_reference(entry.id) else {
                continue;
            };
            if requested.contains(&id) && !result.resolved.contains_key(&id) {
                result.unresolved.insert(id, entry.status);
            }
        }
        for id in requested {
            if !result.resolved.contains_key(&id) {
                result
                    .unresolved
                    .entry(id)
                    .or_insert(ResolutionStatus::NotFound);
            }
        }

        self.stats.record_origin_call(result.resolved.len());
        Ok(result)
    }

    pub async fn resolve_image(
        &self,
        id: Identifier,
        variant: Variant,
    ) -> HydrationResult<ImageLookup> {
        let lookup = self.images.get_image_url(id, variant).await?;
        self.stats
            .record_origin_call(usize::from(matches!(lookup, ImageLookup::Url(_))));
        Ok(lookup)
    }
}
