//! Error recovery: retries and tiered fallbacks.

mod service;

pub use service::{rank_by_popularity, ErrorRecoveryService, Fallback, FallbackTier, RecoveryConfig};
