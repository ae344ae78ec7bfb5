//! Generated marketplace sections.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{ScreenId, SectionId, UserId};
use super::screen::EnhancedScreen;
use super::section_config::{AlgorithmType, SectionConfig};

/// How a section is laid out by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayType {
    #[default]
    Carousel,
    Grid,
    List,
    Banner,
}

/// Who and where a section was generated for.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserContext {
    pub user_id: Option<UserId>,
    pub location: Option<String>,
}

/// Generation details attached to every section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionMetadata {
    pub algorithm: AlgorithmType,
    /// Confidence in the section's content, in [0, 1].
    pub confidence: f64,
    pub refresh_interval_secs: u64,
    pub generated_at: DateTime<Utc>,
    pub user_context: UserContext,
}

/// A titled, ordered group of screens.
///
/// Sections are built fresh per generation request and are not mutated once
/// deduplication and backfill have completed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: SectionId,
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    pub screens: Vec<EnhancedScreen>,
    pub display_type: DisplayType,
    /// Higher is more important.
    pub priority: i32,
    pub min_screens: usize,
    pub max_screens: usize,
    pub metadata: SectionMetadata,
}

impl Section {
    /// Build an empty section from its config.
    #[must_use]
    pub fn from_config(config: &SectionConfig, context: UserContext) -> Self {
        Self {
            id: config.id.clone(),
            title: config.name.clone(),
            subtitle: (!config.description.is_empty()).then(|| config.description.clone()),
            screens: Vec::new(),
            display_type: config.display.display_type,
            priority: config.priority,
            min_screens: config.min_screens,
            max_screens: config.max_screens,
            metadata: SectionMetadata {
                algorithm: config.algorithm,
                confidence: 0.0,
                refresh_interval_secs: config.refresh_interval_secs,
                generated_at: Utc::now(),
                user_context: context,
            },
        }
    }

    #[must_use]
    pub fn with_screens(mut self, screens: Vec<EnhancedScreen>) -> Self {
        self.screens = screens;
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.screens.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.screens.is_empty()
    }

    #[must_use]
    pub fn contains(&self, screen_id: &ScreenId) -> bool {
        self.screens.iter().any(|s| &s.id == screen_id)
    }

    /// Number of screens needed to reach the minimum, bounded by the maximum.
    #[must_use]
    pub fn shortfall(&self) -> usize {
        let current = self.screens.len();
        if current >= self.min_screens {
            return 0;
        }
        (self.min_screens - current).min(self.max_screens.saturating_sub(current))
    }
}
