//! Shared fixtures: counting stub origins and an instrumented distributed cache.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use hydra_cache::{CacheError, CacheResult, DistributedCache, InMemoryCache};
use hydra_core::{
    AccountOrigin, AccountRecord, Identifier, ImageBatch, ImageLookup, ImageOrigin,
    ImageStatusEntry, OriginError, ResolutionStatus, Variant,
};
use hydra_engine::{HydraConfig, HydrationEngine};
use parking_lot::Mutex;

fn raw(ids: &[Identifier]) -> Vec<i64> {
    ids.iter().map(|id| id.get()).collect()
}

// -------------------------------------------------------------------------
// Account origin
// -------------------------------------------------------------------------

#[derive(Default)]
pub struct StubAccountOrigin {
    records: HashMap<i64, AccountRecord>,
    pub batch_calls: Mutex<Vec<Vec<i64>>>,
    pub single_calls: Mutex<Vec<i64>>,
    pub repair_calls: Mutex<Vec<Vec<i64>>>,
    pub fail: AtomicBool,
}

impl StubAccountOrigin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_account(mut self, id: i64, name: &str, image_id: i64) -> Self {
        self.records.insert(
            id,
            AccountRecord {
                id,
                display_name: name.to_string(),
                image_id,
            },
        );
        self
    }

    pub fn batch_call_count(&self) -> usize {
        self.batch_calls.lock().len()
    }

    pub fn repairs(&self) -> Vec<Vec<i64>> {
        self.repair_calls.lock().clone()
    }
}

#[async_trait]
impl AccountOrigin for StubAccountOrigin {
    async fn get_accounts(&self, ids: &[Identifier]) -> Result<Vec<AccountRecord>, OriginError> {
        self.batch_calls.lock().push(raw(ids));
        if self.fail.load(Ordering::SeqCst) {
            return Err(OriginError::transport("account service unavailable"));
        }
        Ok(ids
            .iter()
            .filter_map(|id| self.records.get(&id.get()).cloned())
            .collect())
    }

    async fn get_account(&self, id: Identifier) -> Result<Option<AccountRecord>, OriginError> {
        self.single_calls.lock().push(id.get());
        if self.fail.load(Ordering::SeqCst) {
            return Err(OriginError::transport("account service unavailable"));
        }
        Ok(self.records.get(&id.get()).cloned())
    }

    async fn remove_broken_image_references(
        &self,
        image_ids: &[Identifier],
    ) -> Result<(), OriginError> {
        self.repair_calls.lock().push(raw(image_ids));
        Ok(())
    }
}

// -------------------------------------------------------------------------
// Image origin
// -------------------------------------------------------------------------

#[derive(Default)]
pub struct StubImageOrigin {
    urls: HashMap<i64, String>,
    statuses: HashMap<i64, ResolutionStatus>,
    pub batch_calls: Mutex<Vec<(Vec<i64>, Variant)>>,
    pub single_calls: Mutex<Vec<i64>>,
    pub fail: AtomicBool,
}

impl StubImageOrigin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_url(mut self, id: i64, url: &str) -> Self {
        self.urls.insert(id, url.to_string());
        self
    }

    pub fn with_status(mut self, id: i64, status: ResolutionStatus) -> Self {
        self.statuses.insert(id, status);
        self
    }

    pub fn batch_call_count(&self) -> usize {
        self.batch_calls.lock().len()
    }
}

#[async_trait]
impl ImageOrigin for StubImageOrigin {
    async fn get_image_urls(
        &self,
        ids: &[Identifier],
        variant: Variant,
    ) -> Result<ImageBatch, OriginError> {
        self.batch_calls.lock().push((raw(ids), variant));
        if self.fail.load(Ordering::SeqCst) {
            return Err(OriginError::transport("image service unavailable"));
        }

        let mut batch = ImageBatch::default();
        for id in ids.iter().map(|id| id.get()) {
            if let Some(url) = self.urls.get(&id) {
                batch.urls.insert(id, url.clone());
            } else if let Some(&status) = self.statuses.get(&id) {
                batch.statuses.push(ImageStatusEntry { id, status });
            }
        }
        Ok(batch)
    }

    async fn get_image_url(
        &self,
        id: Identifier,
        _variant: Variant,
    ) -> Result<ImageLookup, OriginError> {
        self.single_calls.lock().push(id.get());
        if self.fail.load(Ordering::SeqCst) {
            return Err(OriginError::transport("image service unavailable"));
        }
        let id = id.get();
        Ok(match (self.urls.get(&id), self.statuses.get(&id)) {
            (Some(url), _) => ImageLookup::Url(url.clone()),
            (None, Some(&status)) => ImageLookup::Status(status),
            (None, None) => ImageLookup::Status(ResolutionStatus::NotFound),
        })
    }
}

// -------------------------------------------------------------------------
// Distributed cache
// -------------------------------------------------------------------------

/// In-memory distributed cache that counts calls and can simulate outages.
#[derive(Default)]
pub struct CountingCache {
    inner: InMemoryCache,
    pub gets: AtomicUsize,
    pub sets: AtomicUsize,
    pub fail: AtomicBool,
}

impl CountingCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_count(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn set_count(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }

    /// Entries held by the wrapped store, expired or not.
    pub fn stored_entries(&self) -> usize {
        self.inner.len()
    }

    pub fn reset_counts(&self) {
        self.gets.store(0, Ordering::SeqCst);
        self.sets.store(0, Ordering::SeqCst);
    }
}

#[async_trait]
impl DistributedCache for CountingCache {
    async fn get_string(&self, key: &str) -> CacheResult<Option<String>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(CacheError::Connection("connection refused".into()));
        }
        self.inner.get_string(key).await
    }

    async fn set_string(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(CacheError::Connection("connection refused".into()));
        }
        self.inner.set_string(key, value, ttl).await
    }

    async fn ping(&self) -> CacheResult<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "counting"
    }

    fn purge_expired(&self) -> usize {
        self.inner.purge_expired()
    }
}

// -------------------------------------------------------------------------
// Harness
// -------------------------------------------------------------------------

pub struct Harness {
    pub engine: Arc<HydrationEngine>,
    pub accounts: Arc<StubAccountOrigin>,
    pub images: Arc<StubImageOrigin>,
    pub cache: Arc<CountingCache>,
}

impl Harness {
    pub fn new(accounts: StubAccountOrigin, images: StubImageOrigin) -> Self {
        Self::with_config(&HydraConfig::default(), accounts, images)
    }

    pub fn with_config(
        config: &HydraConfig,
        accounts: StubAccountOrigin,
        images: StubImageOrigin,
    ) -> Self {
        let accounts = Arc::new(accounts);
        let images = Arc::new(images);
        let cache = Arc::new(CountingCache::new());
        let engine = Arc::new(HydrationEngine::new(
            config,
            accounts.clone(),
            images.clone(),
            cache.clone(),
        ));
        Self {
            engine,
            accounts,
            images,
            cache,
        }
    }

    /// Total calls recorded against any collaborator.
    pub fn io_count(&self) -> usize {
        self.accounts.batch_call_count()
            + self.accounts.single_calls.lock().len()
            + self.images.batch_call_count()
            + self.images.single_calls.lock().len()
            + self.cache.get_count()
            + self.cache.set_count()
    }
}

pub fn id(raw: i64) -> Identifier {
    Identifier::new(raw).unwrap()
}
