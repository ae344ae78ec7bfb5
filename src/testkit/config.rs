//! Canonical test configurations.
//!
//! Single source of truth for config structs used across tests.
//! Avoids each test module defining its own slightly-different defaults.

use crate::application::cache::CacheConfig;
use crate::application::grouping::GroupingConfig;
use crate::application::recovery::RecoveryConfig;

/// Recovery config with two attempts and zero retry delay.
pub fn fast_recovery() -> RecoveryConfig {
    RecoveryConfig {
        max_retries: 2,
        retry_delay_ms: 0,
        fallback_ttl_secs: 300,
    }
}

/// Cache config holding at most `max_memory_items` entries.
pub fn cache(max_memory_items: usize) -> CacheConfig {
    CacheConfig {
        max_memory_items,
        ..CacheConfig::default()
    }
}

/// Grouping config returning at most `max_sections` sections.
pub fn grouping(max_sections: usize) -> GroupingConfig {
    GroupingConfig {
        max_sections,
        ..GroupingConfig::default()
    }
}
