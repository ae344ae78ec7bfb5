//! Declarative section definitions.

use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::id::SectionId;
use super::profile::UserProfile;
use super::section::DisplayType;

/// Screen generation algorithm backing a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AlgorithmType {
    MlPersonalized,
    TrendingAnalysis,
    GeographicPopularity,
    RecentActivity,
    PurchaseHistory,
    NewDiscovery,
    CollaborativeFiltering,
    ContentBased,
    FallbackPopular,
    OtherUsersBuying,
}

impl AlgorithmType {
    /// Stable kebab-case name, as used in analytics and cache keys.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MlPersonalized => "ml-personalized",
            Self::TrendingAnalysis => "trending-analysis",
            Self::GeographicPopularity => "geographic-popularity",
            Self::RecentActivity => "recent-activity",
            Self::PurchaseHistory => "purchase-history",
            Self::NewDiscovery => "new-discovery",
            Self::CollaborativeFiltering => "collaborative-filtering",
            Self::ContentBased => "content-based",
            Self::FallbackPopular => "fallback-popular",
            Self::OtherUsersBuying => "other-users-buying",
        }
    }

    /// Whether the algorithm needs a known user to produce anything.
    #[must_use]
    pub const fn needs_user(self) -> bool {
        matches!(
            self,
            Self::MlPersonalized
                | Self::RecentActivity
                | Self::PurchaseHistory
                | Self::NewDiscovery
                | Self::CollaborativeFiltering
                | Self::ContentBased
        )
    }
}

impl std::fmt::Display for AlgorithmType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Presentation hints passed through to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayConfig {
    pub display_type: DisplayType,
    pub show_metrics: bool,
    pub show_trending_badge: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            display_type: DisplayType::Carousel,
            show_metrics: false,
            show_trending_badge: false,
        }
    }
}

/// Preconditions a user must meet for a section to be generated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionConditions {
    #[serde(default)]
    pub requires_login: bool,
    #[serde(default)]
    pub min_user_interactions: u32,
    #[serde(default)]
    pub min_purchase_history: u32,
}

impl SectionConditions {
    /// Check the conditions against a user profile.
    #[must_use]
    pub fn is_satisfied_by(&self, profile: &UserProfile) -> bool {
        if self.requires_login && profile.is_anonymous() {
            return false;
        }
        profile.total_interactions >= self.min_user_interactions
            && profile.purchase_count >= self.min_purchase_history
    }
}

/// Declarative definition of a marketplace section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionConfig {
    pub id: SectionId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub algorithm: AlgorithmType,
    /// Higher is more important.
    pub priority: i32,
    pub min_screens: usize,
    pub max_screens: usize,
    /// Seconds between refreshes of the section content.
    pub refresh_interval_secs: u64,
    pub enabled: bool,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub conditions: SectionConditions,
}

impl SectionConfig {
    /// Create a validated, enabled config with default display and conditions.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::EmptyId`] for an empty id and
    /// [`DomainError::InvalidScreenBounds`] when `min_screens > max_screens`.
    pub fn try_new(
        id: impl Into<SectionId>,
        name: impl Into<String>,
        algorithm: AlgorithmType,
        priority: i32,
        min_screens: usize,
        max_screens: usize,
    ) -> Result<Self, DomainError> {
        let id = id.into();
        if id.as_str().is_empty() {
            return Err(DomainError::EmptyId { kind: "section" });
        }
        if min_screens > max_screens {
            return Err(DomainError::InvalidScreenBounds {
                min: min_screens,
                max: max_screens,
            });
        }
        Ok(Self {
            id,
            name: name.into(),
            description: String::new(),
            algorithm,
            priority,
            min_screens,
            max_screens,
            refresh_interval_secs: 1800,
            enabled: true,
            display: DisplayConfig::default(),
            conditions: SectionConditions::default(),
        })
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn with_conditions(mut self, conditions: SectionConditions) -> Self {
        self.conditions = conditions;
        self
    }

    #[must_use]
    pub fn with_display(mut self, display: DisplayConfig) -> Self {
        self.display = display;
        self
    }

    #[must_use]
    pub fn with_refresh_interval(mut self, secs: u64) -> Self {
        self.refresh_interval_secs = secs;
        self
    }

    /// Apply a patch, rejecting it if the resulting bounds are invalid.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidScreenBounds`] and leaves `self`
    /// untouched if the patched `min_screens` exceeds `max_screens`.
    pub fn apply(&mut self, patch: &SectionPatch) -> Result<(), DomainError> {
        let min = patch.min_screens.unwrap_or(self.min_screens);
        let max = patch.max_screens.unwrap_or(self.max_screens);
        if min > max {
            return Err(DomainError::InvalidScreenBounds { min, max });
        }

        if let Some(name) = &patch.name {
            self.name.clone_from(name);
        }
        if let Some(description) = &patch.description {
            self.description.clone_from(description);
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        self.min_screens = min;
        self.max_screens = max;
        if let Some(secs) = patch.refresh_interval_secs {
            self.refresh_interval_secs = secs;
        }
        if let Some(enabled) = patch.enabled {
            self.enabled = enabled;
        }
        Ok(())
    }
}

/// Partial update to a [`SectionConfig`]. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Option<i32>,
    #[serde(default)]
    pub min_screens: Option<usize>,
    #[serde(default)]
    pub max_screens: Option<usize>,
    #[serde(default)]
    pub refresh_interval_secs: Option<u64>,
    #[serde(default)]
    pub enabled: Option<bool>,
}

impl SectionPatch {
    /// Patch that only flips the enabled flag.
    #[must_use]
    pub fn enabled(enabled: bool) -> Self {
        Self {
            enabled: Some(enabled),
            ..Self::default()
        }
    }

    /// Fill every unset field of `self` from `lower`.
    ///
    /// Used when folding rule actions: `self` holds the decisions of
    /// higher-priority rules, which are never overwritten.
    pub fn fill_from(&mut self, lower: &SectionPatch) {
        if self.name.is_none() {
            self.name.clone_from(&lower.name);
        }
        if self.description.is_none() {
            self.description.clone_from(&lower.description);
        }
        self.priority = self.priority.or(lower.priority);
        self.min_screens = self.min_screens.or(lower.min_screens);
        self.max_screens = self.max_screens.or(lower.max_screens);
        self.refresh_interval_secs = self.refresh_interval_secs.or(lower.refresh_interval_secs);
        self.enabled = self.enabled.or(lower.enabled);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
