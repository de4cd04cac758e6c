//! # hydra-engine
//!
//! Resolves account and image identifiers into hydrated values through three
//! tiers:
//!
//! ```text
//! resolve → L1 (moka) → L2 (Redis) → origin (one batched call)
//!                                        ↓
//!                         write back to L1 + L2, repair broken references
//! ```
//!
//! - Invalid identifiers and variants fail before any I/O.
//! - Cache errors degrade to misses.
//! - Account origin failures fail the call; image origin failures degrade to
//!   a partial result.
//! - References to permanently failed images are repaired on a detached task.
//!
//! Concurrent calls for the same missing identifier may each reach the origin.
//! Origin responses are deterministic per identifier, so the duplicate writes
//! are equivalent.

pub mod account;
pub mod config;
mod engine;
pub mod image;
pub mod observability;
pub mod repair;
pub mod resolver;
pub mod stats;
pub mod sweep;
pub mod tiers;

pub use account::AccountHydrator;
pub use config::{HydraConfig, HydrationSettings, LoggingConfig, TierTtls};
pub use engine::HydrationEngine;
pub use image::{ImageHydration, ImageHydrator, Unresolved};
pub use observability::{init_tracing, installed_filter};
pub use repair::StaleReferenceRepairer;
pub use resolver::OriginBatchResolver;
pub use stats::{HydrationStats, StatsSnapshot};
pub use sweep::ExpirySweeper;
pub use tiers::{CacheTiers, Snapshot};
