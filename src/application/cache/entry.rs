//! Cache entries and configuration.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use serde::Deserialize;
use serde_json::Value;

/// Tunables for [`CacheService`](super::CacheService).
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Entry count above which the least recently accessed 10% are evicted.
    #[serde(default = "default_max_memory_items")]
    pub max_memory_items: usize,
    /// TTL used when refreshing a key that has no live entry.
    #[serde(default = "default_ttl_secs")]
    pub default_ttl_secs: u64,
    /// Period of the expired-entry sweep.
    #[serde(default = "default_cleanup_interval_secs")]
    pub cleanup_interval_secs: u64,
    /// Period of the background refresh of registered keys.
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
}

const fn default_max_memory_items() -> usize {
    1000
}

const fn default_ttl_secs() -> u64 {
    1800
}

const fn default_cleanup_interval_secs() -> u64 {
    600
}

const fn default_refresh_interval_secs() -> u64 {
    300
}

impl CacheConfig {
    #[must_use]
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_secs)
    }

    #[must_use]
    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs)
    }

    #[must_use]
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_memory_items: default_max_memory_items(),
            default_ttl_secs: default_ttl_secs(),
            cleanup_interval_secs: default_cleanup_interval_secs(),
            refresh_interval_secs: default_refresh_interval_secs(),
        }
    }
}

/// A stored value with its expiry and access bookkeeping.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub(super) data: Value,
    pub(super) inserted_at: Instant,
    pub(super) ttl: Duration,
    pub(super) access_count: u64,
    pub(super) last_accessed: Instant,
    pub(super) tags: HashSet<String>,
}

impl CacheEntry {
    pub(super) fn new(data: Value, ttl: Duration, tags: HashSet<String>) -> Self {
        let now = Instant::now();
        Self {
            data,
            inserted_at: now,
            ttl,
            access_count: 0,
            last_accessed: now,
            tags,
        }
    }

    /// An entry is valid while its age is strictly below its TTL.
    #[must_use]
    pub fn is_valid_at(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.inserted_at) < self.ttl
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    #[must_use]
    pub fn access_count(&self) -> u64 {
        self.access_count
    }

    #[must_use]
    pub fn tags(&self) -> &HashSet<String> {
        &self.tags
    }

    pub(super) fn touch(&mut self, now: Instant) {
        self.access_count += 1;
        self.last_accessed = now;
    }
}

/// Point-in-time cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

impl CacheStats {
    /// Fraction of lookups that hit, or 0 with no lookups.
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
