//! Cross-section deduplication.
//!
//! - [`engine`]: first-writer-wins dedup, relevance-ranked backfill

mod engine;

pub use engine::{DedupStats, DeduplicationEngine, DeduplicationResult};
