use std::time::Duration;

use serde::Deserialize;

/// Grouping and section resolution tunables.
#[derive(Debug, Clone, Deserialize)]
pub struct GroupingConfig {
    /// Sections returned when a request does not ask for a count.
    #[serde(default = "default_max_sections")]
    pub max_sections: usize,
    /// Lifetime of a cached generation result.
    #[serde(default = "default_sections_ttl_secs")]
    pub sections_ttl_secs: u64,
    /// Lifetime of resolved configs per user and location.
    #[serde(default = "default_config_ttl_secs")]
    pub config_ttl_secs: u64,
    /// Whether dynamic rules are applied during resolution.
    #[serde(default = "default_dynamic_sections")]
    pub dynamic_sections: bool,
    /// Engagement events retained per section.
    #[serde(default = "default_engagement_history")]
    pub engagement_history: usize,
}

const fn default_max_sections() -> usize {
    8
}

const fn default_sections_ttl_secs() -> u64 {
    600
}

const fn default_config_ttl_secs() -> u64 {
    1800
}

const fn default_dynamic_sections() -> bool {
    true
}

const fn default_engagement_history() -> usize {
    1000
}

impl Default for GroupingConfig {
    fn default() -> Self {
        Self {
            max_sections: default_max_sections(),
            sections_ttl_secs: default_sections_ttl_secs(),
            config_ttl_secs: default_config_ttl_secs(),
            dynamic_sections: default_dynamic_sections(),
            engagement_history: default_engagement_history(),
        }
    }
}

impl GroupingConfig {
    #[must_use]
    pub fn sections_ttl(&self) -> Duration {
        Duration::from_secs(self.sections_ttl_secs)
    }

    #[must_use]
    pub fn config_ttl(&self) -> Duration {
        Duration::from_secs(self.config_ttl_secs)
    }
}
