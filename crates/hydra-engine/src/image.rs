//! Image URL hydration.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use futures_util::future::join_all;
use hydra_core::{
    EntityKind, HydrationError, HydrationResult, Identifier, ImageLookup, ResolutionStatus,
    Variant, validate_batch,
};

use crate::resolver::OriginBatchResolver;
use crate::tiers::CacheTiers;

/// Why an image identifier has no URL in an [`ImageHydration`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unresolved {
    /// The origin answered with this status.
    Status(ResolutionStatus),
    /// The origin call failed; nothing is known about the identifier.
    Unavailable,
}

impl Unresolved {
    fn is_permanent_failure(self) -> bool {
        match self {
            Self::Status(status) => status.is_permanent_failure(),
            Self::Unavailable => false,
        }
    }
}

/// Result of a batched image hydration.
///
/// Every requested identifier is a key of exactly one of `urls` or
/// `unresolved`. `failed_ids` is the subset of `unresolved` that will never
/// resolve and is safe to submit for stale reference repair.
#[derive(Debug, Default)]
pub struct ImageHydration {
    pub urls: HashMap<Identifier, String>,
    pub unresolved: BTreeMap<Identifier, Unresolved>,
    pub failed_ids: BTreeSet<Identifier>,
    /// Set when the origin call for the cache misses failed.
    pub origin_error: Option<HydrationError>,
}

pub struct ImageHydrator {
    tiers: Arc<CacheTiers>,
    resolver: Arc<OriginBatchResolver>,
}

impl ImageHydrator {
    pub fn new(tiers: Arc<CacheTiers>, resolver: Arc<OriginBatchResolver>) -> Self {
        Self { tiers, resolver }
    }

    /// Resolve a batch of image identifiers for one rendition.
    ///
    /// Only invalid input is an error. Origin failures are reported through
    /// [`ImageHydration::origin_error`] while cached URLs are still returned.
    pub async fn resolve_images(
        &self,
        raw_ids: &[i64],
        variant: Variant,
    ) -> HydrationResult<ImageHydration> {
        if raw_ids.is_empty() {
            return Ok(ImageHydration::default());
        }
        let ids = validate_batch(raw_ids)?;
        Ok(self.hydrate(&ids, variant).await)
    }

    /// Resolve one image identifier.
    ///
    /// Failed or missing images map to [`HydrationError::NotFound`]; images
    /// still being processed map to [`HydrationError::Unavailable`].
    pub async fn resolve_image(&self, raw_id: i64, variant: Variant) -> HydrationResult<String> {
        let id = Identifier::new(raw_id)?;
        if let Some(url) = self.tiers.image_url(id, variant).await {
            return Ok(url);
        }

        match self.resolver.resolve_image(id, variant).await? {
            ImageLookup::Url(url) => {
                self.tiers.store_image_url(id, variant, &url).await;
                Ok(url)
            }
            ImageLookup::Status(status) if status.is_permanent_failure() => {
                Err(HydrationError::not_found(EntityKind::Image, raw_id))
            }
            ImageLookup::Status(status) => Err(HydrationError::unavailable(format!(
                "image {id} ({variant}) is {status:?}"
            ))),
        }
    }

    /// Hydrate already validated, deduplicated identifiers.
    pub(crate) async fn hydrate(
        &self,
        ids: &BTreeSet<Identifier>,
        variant: Variant,
    ) -> ImageHydration {
        let lookups = join_all(
            ids.iter()
                .map(|&id| async move { (id, self.tiers.image_url(id, variant).await) }),
        )
        .await;

        let mut hydration = ImageHydration::default();
        let mut missing = Vec::new();
        for (id, cached) in lookups {
            match cached {
                Some(url) => {
                    hydration.urls.insert(id, url);
                }
                None => missing.push(id),
            }
        }

        if !missing.is_empty() {
            match self.resolver.resolve_images(missing.iter().copied(), variant).await {
                Ok(batch) => {
                    join_all(
                        batch
                            .resolved
                            .iter()
                            .map(|(&id, url)| self.tiers.store_image_url(id, variant, url)),
                    )
                    .await;
                    hydration.urls.extend(batch.resolved);
                    hydration.unresolved.extend(
                        batch
                            .unresolved
                            .into_iter()
                            .map(|(id, status)| (id, Unresolved::Status(status))),
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        count = missing.len(),
                        variant = %variant,
                        error = %e,
                        "image origin lookup failed; serving cached URLs only"
                    );
                    hydration
                        .unresolved
                        .extend(missing.iter().map(|&id| (id, Unresolved::Unavailable)));
                    hydration.origin_error = Some(e);
                }
            }
        }

        hydration.failed_ids = failed_ids(ids, &hydration.urls, &hydration.unresolved);
        hydration
    }
}

/// Requested identifiers that never resolved and never will.
///
/// Starts from everything requested, drops whatever resolved, then drops any
/// identifier whose reported outcome is transient.
fn failed_ids(
    requested: &BTreeSet<Identifier>,
    urls: &HashMap<Identifier, String>,
    unresolved: &BTreeMap<Identifier, Unresolved>,
) -> BTreeSet<Identifier> {
    requested
        .iter()
        .filter(|id| !urls.contains_key(*id))
        .filter(|id| {
            unresolved
                .get(*id)
                .is_none_or(|outcome| outcome.is_permanent_failure())
        })
        .copied()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: i64) -> Identifier {
        Identifier::new(raw).unwrap()
    }

    #[test]
    fn test_failed_ids_keeps_only_permanent_failures() {
        let requested: BTreeSet<_> = [1, 2, 3, 4, 5, 6].into_iter().map(id).collect();
        let urls: HashMap<_, _> = [(id(1), "https://cdn/1.jpg".to_string())].into();
        let unresolved: BTreeMap<_, _> = [
            (id(2), Unresolved::Status(ResolutionStatus::Failed)),
            (id(3), Unresolved::Status(ResolutionStatus::Processing)),
            (id(4), Unresolved::Status(ResolutionStatus::Pending)),
            (id(5), Unresolved::Status(ResolutionStatus::NotFound)),
            (id(6), Unresolved::Unavailable),
        ]
        .into();

        let failed = failed_ids(&requested, &urls, &unresolved);
        assert_eq!(failed, BTreeSet::from([id(2), id(5)]));
    }

    #[test]
    fn test_failed_ids_empty_when_everything_resolved() {
        let requested: BTreeSet<_> = [id(1)].into();
        let urls: HashMap<_, _> = [(id(1), "u".to_string())].into();
        assert!(failed_ids(&requested, &urls, &BTreeMap::new()).is_empty());
    }
}
