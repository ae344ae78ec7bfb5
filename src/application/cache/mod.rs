//! Runtime cache shared by application services.
//!
//! - [`CacheService`]: TTL key/value store with tag invalidation, LRU
//!   eviction, and background refresh
//! - [`domain`]: typed wrappers with fixed keys, TTLs, and tags

pub mod domain;

mod entry;
mod service;

pub use entry::{CacheConfig, CacheEntry, CacheStats};
pub use service::{CacheHandle, CacheService, KeyGuard};
