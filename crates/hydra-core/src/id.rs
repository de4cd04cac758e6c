//! Identifier, entity kind and image variant types.
//!
//! Raw identifiers arrive as signed integers from callers and origins. They are
//! validated into [`Identifier`] before any cache or network access happens.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{HydrationError, HydrationResult};

/// A validated, strictly positive entity identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Identifier(i64);

impl Identifier {
    /// Validates a raw identifier.
    ///
    /// # Errors
    ///
    /// Returns [`HydrationError::InvalidIdentifier`] when `raw <= 0`.
    pub fn new(raw: i64) -> HydrationResult<Self> {
        if raw <= 0 {
            return Err(HydrationError::InvalidIdentifier(raw));
        }
        Ok(Self(raw))
    }

    /// Interprets `0` (and anything non-positive) as "no reference".
    ///
    /// Used for embedded references such as an account's image identifier,
    /// where `0` is the origin's encoding of "none".
    #[must_use]
    pub fn from_reference(raw: i64) -> Option<Self> {
        (raw > 0).then_some(Self(raw))
    }

    #[must_use]
    pub fn get(self) -> i64 {
        self.0
    }
}

impl TryFrom<i64> for Identifier {
    type Error = HydrationError;

    fn try_from(raw: i64) -> Result<Self, Self::Error> {
        Self::new(raw)
    }
}

impl From<Identifier> for i64 {
    fn from(id: Identifier) -> Self {
        id.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validates and deduplicates a batch of raw identifiers.
///
/// Fails on the first invalid identifier in input order, so a malformed
/// request never reaches a cache or origin.
pub fn validate_batch(raw_ids: &[i64]) -> HydrationResult<BTreeSet<Identifier>> {
    raw_ids.iter().map(|&raw| Identifier::new(raw)).collect()
}

/// The entity kinds the engine hydrates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Account,
    Image,
}

impl EntityKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Account => "account",
            Self::Image => "image",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Image rendition. The set is closed; unknown tags are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    #[default]
    Thumbnail,
    Small,
    Medium,
    Large,
    Original,
}

impl Variant {
    pub const ALL: [Variant; 5] = [
        Variant::Thumbnail,
        Variant::Small,
        Variant::Medium,
        Variant::Large,
        Variant::Original,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Thumbnail => "thumbnail",
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
            Self::Original => "original",
        }
    }
}

impl FromStr for Variant {
    type Err = HydrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| HydrationError::InvalidVariant(s.to_string()))
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
