//! # hydra-core
//!
//! Shared vocabulary of the Hydra hydration engine:
//! - validated identifiers, entity kinds and image variants
//! - the cache key encoder
//! - account snapshots and batch resolution results
//! - origin service contracts
//! - the error taxonomy
//!
//! This crate performs no I/O.

mod error;
pub mod id;
pub mod key;
mod model;
pub mod origin;

pub use error::{ErrorCategory, HydrationError, HydrationResult, OriginError};
pub use id::{EntityKind, Identifier, Variant, validate_batch};
pub use key::{CacheKey, encode};
pub use model::{Account, BatchResult, ResolutionStatus, url_cache_cost};
pub use origin::{
    AccountOrigin, AccountRecord, DynAccountOrigin, DynImageOrigin, ImageBatch, ImageLookup,
    ImageOrigin, ImageStatusEntry,
};
