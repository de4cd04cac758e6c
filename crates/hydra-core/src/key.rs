//! Cache key encoding.
//!
//! Key format is part of the distributed cache contract shared by every engine
//! instance and must stay stable across releases:
//!
//! ```text
//! account:{id}
//! image:{variant}:{id}
//! ```

use std::fmt;

use crate::error::{HydrationError, HydrationResult};
use crate::id::{EntityKind, Identifier, Variant};

/// A cache key derived from (kind, identifier, variant).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    #[must_use]
    pub fn account(id: Identifier) -> Self {
        Self(format!("{}:{}", EntityKind::Account.as_str(), id))
    }

    #[must_use]
    pub fn image(id: Identifier, variant: Variant) -> Self {
        Self(format!(
            "{}:{}:{}",
            EntityKind::Image.as_str(),
            variant.as_str(),
            id
        ))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Encodes a cache key from unvalidated input.
///
/// # Errors
///
/// - [`HydrationError::InvalidIdentifier`] when `raw_id <= 0`.
/// - [`HydrationError::InvalidVariant`] when an image key has no variant or an
///   unknown one, or when an account key is given a variant.
pub fn encode(kind: EntityKind, raw_id: i64, variant: Option<&str>) -> HydrationResult<CacheKey> {
    let id = Identifier::new(raw_id)?;
    match (kind, variant) {
        (EntityKind::Account, None) => Ok(CacheKey::account(id)),
        (EntityKind::Account, Some(v)) => Err(HydrationError::InvalidVariant(format!(
            "account keys take no variant, got '{v}'"
        ))),
        (EntityKind::Image, Some(v)) => Ok(CacheKey::image(id, v.parse()?)),
        (EntityKind::Image, None) => Err(HydrationError::InvalidVariant(
            "image keys require a variant".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_key_format() {
        assert_eq!(
            encode(EntityKind::Account, 42, None).unwrap().as_str(),
            "account:42"
        );
        assert_eq!(
            encode(EntityKind::Image, 42, Some("thumbnail"))
                .unwrap()
                .as_str(),
            "image:thumbnail:42"
        );
    }

    #[test]
    fn test_encode_rejects_bad_input() {
        assert!(matches!(
            encode(EntityKind::Account, 0, None),
            Err(HydrationError::InvalidIdentifier(0))
        ));
        assert!(matches!(
            encode(EntityKind::Image, -3, Some("small")),
            Err(HydrationError::InvalidIdentifier(-3))
        ));
        assert!(matches!(
            encode(EntityKind::Image, 1, Some("poster")),
            Err(HydrationError::InvalidVariant(_))
        ));
        assert!(matches!(
            encode(EntityKind::Image, 1, None),
            Err(HydrationError::InvalidVariant(_))
        ));
        assert!(matches!(
            encode(EntityKind::Account, 1, Some("small")),
            Err(HydrationError::InvalidVariant(_))
        ));
    }

    #[test]
    fn test_keys_are_collision_free_across_kinds_and_variants() {
        let mut seen = HashSet::new();
        for raw in 1..=50 {
            let id = Identifier::new(raw).unwrap();
            assert!(seen.insert(CacheKey::account(id)));
            for variant in Variant::ALL {
                assert!(seen.insert(CacheKey::image(id, variant)));
            }
        }
        assert_eq!(seen.len(), 50 * (1 + Variant::ALL.len()));
    }

    #[test]
    fn test_encode_matches_typed_constructors() {
        let id = Identifier::new(7).unwrap();
        assert_eq!(
            encode(EntityKind::Image, 7, Some("large")).unwrap(),
            CacheKey::image(id, Variant::Large)
        );
        assert_eq!(
            encode(EntityKind::Account, 7, None).unwrap(),
            CacheKey::account(id)
        );
    }
}
