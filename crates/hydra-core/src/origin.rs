//! Contracts for the authoritative origin services.
//!
//! The engine never talks to a transport directly. Deployments provide
//! implementations of these traits (gRPC, HTTP, in-process) and inject them.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::OriginError;
use crate::id::{Identifier, Variant};
use crate::model::{Account, ResolutionStatus};

/// Account record as returned by the account origin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRecord {
    pub id: i64,
    pub display_name: String,
    /// `0` means the account has no image.
    #[serde(default)]
    pub image_id: i64,
}

impl AccountRecord {
    /// Converts into a snapshot. Returns `None` for a record with an invalid id.
    #[must_use]
    pub fn into_account(self) -> Option<Account> {
        let id = Identifier::new(self.id).ok()?;
        Some(Account::new(
            id,
            self.display_name,
            Identifier::from_reference(self.image_id),
        ))
    }
}

/// Status the image origin reports for an identifier it did not satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageStatusEntry {
    pub id: i64,
    pub status: ResolutionStatus,
}

/// Response of a batched image lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageBatch {
    #[serde(default)]
    pub urls: HashMap<i64, String>,
    #[serde(default)]
    pub statuses: Vec<ImageStatusEntry>,
}

/// Response of a single image lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageLookup {
    Url(String),
    Status(ResolutionStatus),
}

/// Authoritative source of account records.
#[async_trait]
pub trait AccountOrigin: Send + Sync {
    /// Fetches accounts by identifier in one call.
    ///
    /// Identifiers with no account are simply absent from the response.
    async fn get_accounts(&self, ids: &[Identifier]) -> Result<Vec<AccountRecord>, OriginError>;

    /// Fetches a single account. `Ok(None)` when it does not exist.
    async fn get_account(&self, id: Identifier) -> Result<Option<AccountRecord>, OriginError>;

    /// Clears references to images that will never resolve.
    async fn remove_broken_image_references(
        &self,
        image_ids: &[Identifier],
    ) -> Result<(), OriginError>;
}

/// Authoritative source of image URLs.
#[async_trait]
pub trait ImageOrigin: Send + Sync {
    /// Fetches URLs for a rendition in one call.
    async fn get_image_urls(
        &self,
        ids: &[Identifier],
        variant: Variant,
    ) -> Result<ImageBatch, OriginError>;

    async fn get_image_url(
        &self,
        id: Identifier,
        variant: Variant,
    ) -> Result<ImageLookup, OriginError>;
}

pub type DynAccountOrigin = Arc<dyn AccountOrigin>;

pub type DynImageOrigin = Arc<dyn ImageOrigin>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_into_account() {
        let account = AccountRecord {
            id: 2,
            display_name: "Linus".into(),
            image_id: 50,
        }
        .into_account()
        .unwrap();
        assert_eq!(account.id.get(), 2);
        assert_eq!(account.image_id.map(Identifier::get), Some(50));
        assert!(account.image_url.is_empty());

        let no_image = AccountRecord {
            id: 3,
            display_name: "Ken".into(),
            image_id: 0,
        }
        .into_account()
        .unwrap();
        assert_eq!(no_image.image_id, None);

        let invalid = AccountRecord {
            id: 0,
            display_name: "ghost".into(),
            image_id: 0,
        };
        assert!(invalid.into_account().is_none());
    }

    #[test]
    fn test_image_batch_wire_shape() {
        let batch: ImageBatch = serde_json::from_str(
            r#"{"urls":{"50":"https://cdn/50.jpg"},"statuses":[{"id":51,"status":"processing"}]}"#,
        )
        .unwrap();
        assert_eq!(batch.urls.get(&50).map(String::as_str), Some("https://cdn/50.jpg"));
        assert_eq!(batch.statuses[0].status, ResolutionStatus::Processing);
    }
}
