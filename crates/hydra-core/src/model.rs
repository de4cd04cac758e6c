//! Entity snapshots and batch resolution results.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::id::Identifier;

/// Fixed overhead charged per cached snapshot on top of its heap strings.
const SNAPSHOT_BASE_COST: u32 = 64;

/// A hydrated account.
///
/// Values are plain copies: a snapshot read from a cache is never shared
/// mutable state with another caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: Identifier,
    pub display_name: String,
    /// Embedded image reference; `None` when the origin reports `0`.
    #[serde(default)]
    pub image_id: Option<Identifier>,
    /// Empty until the image reference has been resolved.
    #[serde(default)]
    pub image_url: String,
}

impl Account {
    #[must_use]
    pub fn new(id: Identifier, display_name: impl Into<String>, image_id: Option<Identifier>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            image_id,
            image_url: String::new(),
        }
    }

    /// Admission cost of this snapshot in the local cache, in bytes.
    #[must_use]
    pub fn cache_cost(&self) -> u32 {
        let heap = self.display_name.len() + self.image_url.len();
        SNAPSHOT_BASE_COST.saturating_add(u32::try_from(heap).unwrap_or(u32::MAX))
    }
}

/// Admission cost of a cached image URL, in bytes.
#[must_use]
pub fn url_cache_cost(url: &str) -> u32 {
    SNAPSHOT_BASE_COST.saturating_add(u32::try_from(url.len()).unwrap_or(u32::MAX))
}

/// Status of an identifier the origin did not resolve to a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStatus {
    Pending,
    Processing,
    Complete,
    Failed,
    NotFound,
}

impl ResolutionStatus {
    /// Failed and NotFound references will never resolve and may be repaired.
    /// Every other status is transient.
    #[must_use]
    pub fn is_permanent_failure(self) -> bool {
        matches!(self, Self::Failed | Self::NotFound)
    }
}

/// Outcome of one batched origin lookup.
///
/// Every requested identifier lands in exactly one of `resolved` or
/// `unresolved`.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchResult<V> {
    pub resolved: HashMap<Identifier, V>,
    pub unresolved: BTreeMap<Identifier, ResolutionStatus>,
}

impl<V> BatchResult<V> {
    #[must_use]
    pub fn len(&self) -> usize {
        self.resolved.len() + self.unresolved.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resolved.is_empty() && self.unresolved.is_empty()
    }
}

impl<V> Default for BatchResult<V> {
    fn default() -> Self {
        Self {
            resolved: HashMap::new(),
            unresolved: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permanent_failures() {
        assert!(ResolutionStatus::Failed.is_permanent_failure());
        assert!(ResolutionStatus::NotFound.is_permanent_failure());
        assert!(!ResolutionStatus::Pending.is_permanent_failure());
        assert!(!ResolutionStatus::Processing.is_permanent_failure());
        assert!(!ResolutionStatus::Complete.is_permanent_failure());
    }

    #[test]
    fn test_account_cost_grows_with_payload() {
        let id = Identifier::new(1).unwrap();
        let mut account = Account::new(id, "Ada", None);
        let before = account.cache_cost();
        account.image_url = "https://cdn.example.com/img/1/thumbnail.jpg".to_string();
        assert!(account.cache_cost() > before);
        assert_eq!(url_cache_cost(""), SNAPSHOT_BASE_COST);
    }

    #[test]
    fn test_account_serde_defaults() {
        let account: Account =
            serde_json::from_str(r#"{"id":3,"display_name":"Grace"}"#).unwrap();
        assert_eq!(account.image_id, None);
        assert!(account.image_url.is_empty());
    }
}
