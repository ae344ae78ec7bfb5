//! Domain-specific cache wrappers.
//!
//! Each wrapper derives a deterministic key, a fixed TTL, and a tag set from
//! its arguments, then delegates to the generic primitives.

use tracing::debug;

use super::service::CacheService;
use crate::domain::{
    EnhancedScreen, MarketInsights, PerformanceMetrics, ScreenId, TrendingScreen, UserId,
    UserInteraction, UserProfile,
};

/// Fixed TTLs per kind of cached data.
pub mod ttl {
    use std::time::Duration;

    pub const USER_RECOMMENDATIONS: Duration = Duration::from_secs(30 * 60);
    pub const MARKET_DATA: Duration = Duration::from_secs(15 * 60);
    pub const SCREEN_METRICS: Duration = Duration::from_secs(60 * 60);
    pub const USER_PROFILE: Duration = Duration::from_secs(60 * 60);
    pub const MARKET_INSIGHTS: Duration = Duration::from_secs(2 * 60 * 60);
}

/// Well-known tags.
pub mod tags {
    pub const MARKET_DATA: &str = "market-data";
    pub const TRENDING: &str = "trending";
    pub const RECOMMENDATIONS: &str = "recommendations";
    pub const METRICS: &str = "metrics";
    pub const PROFILES: &str = "profiles";
    pub const MARKET_INSIGHTS: &str = "market-insights";
    pub const SECTIONS: &str = "sections";
    pub const SECTION_CONFIGS: &str = "section-configs";
    pub const FALLBACK: &str = "fallback";
}

#[must_use]
pub fn user_tag(user_id: &UserId) -> String {
    format!("user:{}", user_id.as_str())
}

#[must_use]
pub fn screen_tag(screen_id: &ScreenId) -> String {
    format!("screen:{}", screen_id.as_str())
}

/// Location tags are normalized to trimmed lowercase.
#[must_use]
pub fn location_tag(location: &str) -> String {
    format!("location:{}", location.trim().to_lowercase())
}

/// Key segment for an optional location.
#[must_use]
pub fn location_key(location: Option<&str>) -> String {
    location.map_or_else(|| "all".to_string(), |l| l.trim().to_lowercase())
}

impl CacheService {
    pub fn cache_user_recommendations(
        &self,
        user_id: &UserId,
        kind: &str,
        screens: &[EnhancedScreen],
    ) {
        self.set_tagged(
            recommendations_key(user_id, kind),
            screens,
            ttl::USER_RECOMMENDATIONS,
            [user_tag(user_id), tags::RECOMMENDATIONS.to_string()],
        );
    }

    #[must_use]
    pub fn user_recommendations(
        &self,
        user_id: &UserId,
        kind: &str,
    ) -> Option<Vec<EnhancedScreen>> {
        self.get(&recommendations_key(user_id, kind))
    }

    pub fn cache_trending(
        &self,
        location: Option<&str>,
        timeframe_days: u32,
        screens: &[TrendingScreen],
    ) {
        self.set_tagged(
            trending_key(location, timeframe_days),
            screens,
            ttl::MARKET_DATA,
            market_tags(location, &[tags::MARKET_DATA, tags::TRENDING]),
        );
    }

    #[must_use]
    pub fn trending(
        &self,
        location: Option<&str>,
        timeframe_days: u32,
    ) -> Option<Vec<TrendingScreen>> {
        self.get(&trending_key(location, timeframe_days))
    }

    pub fn cache_screen_metrics(&self, screen_id: &ScreenId, metrics: &PerformanceMetrics) {
        self.set_tagged(
            format!("screen-metrics:{}", screen_id.as_str()),
            metrics,
            ttl::SCREEN_METRICS,
            [screen_tag(screen_id), tags::METRICS.to_string()],
        );
    }

    #[must_use]
    pub fn screen_metrics(&self, screen_id: &ScreenId) -> Option<PerformanceMetrics> {
        self.get(&format!("screen-metrics:{}", screen_id.as_str()))
    }

    /// Cache a profile. Anonymous profiles are not cached.
    pub fn cache_user_profile(&self, profile: &UserProfile) {
        let Some(user_id) = &profile.user_id else {
            return;
        };
        self.set_tagged(
            format!("user-profile:{}", user_id.as_str()),
            profile,
            ttl::USER_PROFILE,
            [user_tag(user_id), tags::PROFILES.to_string()],
        );
    }

    #[must_use]
    pub fn user_profile(&self, user_id: &UserId) -> Option<UserProfile> {
        self.get(&format!("user-profile:{}", user_id.as_str()))
    }

    pub fn cache_market_insights(&self, location: Option<&str>, insights: &MarketInsights) {
        self.set_tagged(
            format!("market-insights:{}", location_key(location)),
            insights,
            ttl::MARKET_INSIGHTS,
            market_tags(location, &[tags::MARKET_INSIGHTS, tags::MARKET_DATA]),
        );
    }

    #[must_use]
    pub fn market_insights(&self, location: Option<&str>) -> Option<MarketInsights> {
        self.get(&format!("market-insights:{}", location_key(location)))
    }

    /// Invalidate everything an interaction may have made stale.
    ///
    /// - always: `user:{id}`
    /// - purchase, favorite, share: also `screen:{id}`
    /// - purchase: also `market-data`, `trending`, and the location tag
    pub fn invalidate_on_user_interaction(&self, interaction: &UserInteraction) -> usize {
        let mut stale = vec![user_tag(&interaction.user_id)];

        if interaction.action.touches_screen() {
            stale.push(screen_tag(&interaction.screen_id));
        }

        if interaction.action == crate::domain::InteractionAction::Purchase {
            stale.push(tags::MARKET_DATA.to_string());
            stale.push(tags::TRENDING.to_string());
            if let Some(location) = &interaction.context.location {
                stale.push(location_tag(location));
            }
        }

        let removed = self.invalidate_by_tags(&stale);
        debug!(
            user = %interaction.user_id,
            action = ?interaction.action,
            removed,
            "Invalidated cache after user interaction"
        );
        removed
    }
}

fn recommendations_key(user_id: &UserId, kind: &str) -> String {
    format!("recommendations:{kind}:{}", user_id.as_str())
}

fn trending_key(location: Option<&str>, timeframe_days: u32) -> String {
    format!("market-data:trending:{}:{timeframe_days}", location_key(location))
}

fn market_tags(location: Option<&str>, base: &[&str]) -> Vec<String> {
    let mut tags: Vec<String> = base.iter().map(|t| (*t).to_string()).collect();
    if let Some(location) = location {
        tags.push(location_tag(location));
    }
    tags
}
