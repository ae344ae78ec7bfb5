//! Collaborator doubles for testing.
//!
//! - [`ScriptedRecommender`]: Fixed results per method, optional failure
//!   script, and a shared call counter.
//!   Best for: retry counts, fallback tiers, top-pick caching.
//!
//! - [`ScriptedMarket`]: Fixed trending list, or always failing.
//!
//! - [`FailingCatalog`] / [`FailingAnalytics`]: Every call fails with an
//!   upstream error. Best for: degraded-pipeline tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::domain::{
    EnhancedScreen, MarketInsights, PerformanceMetrics, Screen, ScreenId, TrendingScreen, UserId,
    UserProfile,
};
use crate::error::{Error, Result, Service};
use crate::port::outbound::{
    MarketDataService, RecommendationService, ScreenCatalog, UserBehaviorAnalytics,
};

// ---------------------------------------------------------------------------
// ScriptedRecommender
// ---------------------------------------------------------------------------

/// A recommender returning pre-loaded screens.
///
/// Each call first pops the next scripted outcome from the failure queue
/// (`true` means fail); once the queue is exhausted calls succeed.
#[derive(Default)]
pub struct ScriptedRecommender {
    top_picks: Vec<EnhancedScreen>,
    discoveries: Vec<EnhancedScreen>,
    similar: Vec<EnhancedScreen>,
    trending: Vec<EnhancedScreen>,
    failures: Mutex<VecDeque<bool>>,
    always_fail: bool,
    latency: Duration,
    calls: Arc<AtomicU32>,
}

impl ScriptedRecommender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_top_picks(mut self, screens: Vec<EnhancedScreen>) -> Self {
        self.top_picks = screens;
        self
    }

    pub fn with_discoveries(mut self, screens: Vec<EnhancedScreen>) -> Self {
        self.discoveries = screens;
        self
    }

    pub fn with_similar(mut self, screens: Vec<EnhancedScreen>) -> Self {
        self.similar = screens;
        self
    }

    pub fn with_trending(mut self, screens: Vec<EnhancedScreen>) -> Self {
        self.trending = screens;
        self
    }

    /// Fail the first `n` calls, then succeed.
    pub fn failing_first(self, n: usize) -> Self {
        *self.failures.lock() = std::iter::repeat(true).take(n).collect();
        self
    }

    /// Fail every call.
    pub fn always_failing(mut self) -> Self {
        self.always_fail = true;
        self
    }

    /// Delay every response by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Shared counter of calls across all methods.
    pub fn calls(&self) -> Arc<AtomicU32> {
        Arc::clone(&self.calls)
    }

    async fn pause(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    fn respond(&self, screens: &[EnhancedScreen], limit: usize) -> Result<Vec<EnhancedScreen>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let scripted_failure = self.failures.lock().pop_front().unwrap_or(false);
        if self.always_fail || scripted_failure {
            return Err(Error::upstream(Service::Recommendation, "scripted failure"));
        }
        Ok(screens.iter().take(limit).cloned().collect())
    }
}

#[async_trait]
impl RecommendationService for ScriptedRecommender {
    async fn top_picks(&self, _user_id: &UserId, limit: usize) -> Result<Vec<EnhancedScreen>> {
        self.pause().await;
        self.respond(&self.top_picks, limit)
    }

    async fn new_discoveries(
        &self,
        _user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<EnhancedScreen>> {
        self.pause().await;
        self.respond(&self.discoveries, limit)
    }

    async fn similar_screens(
        &self,
        _screen_id: &ScreenId,
        _user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<EnhancedScreen>> {
        self.pause().await;
        self.respond(&self.similar, limit)
    }

    async fn trending_screens(
        &self,
        _location: Option<&str>,
        limit: usize,
    ) -> Result<Vec<EnhancedScreen>> {
        self.pause().await;
        self.respond(&self.trending, limit)
    }
}

// ---------------------------------------------------------------------------
// ScriptedMarket
// ---------------------------------------------------------------------------

/// Market data with a fixed trending list.
#[derive(Default)]
pub struct ScriptedMarket {
    trending: Vec<TrendingScreen>,
    fail: bool,
    calls: Arc<AtomicU32>,
}

impl ScriptedMarket {
    pub fn with_trending(trending: Vec<TrendingScreen>) -> Self {
        Self {
            trending,
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Arc<AtomicU32> {
        Arc::clone(&self.calls)
    }

    fn check(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Error::upstream(Service::MarketData, "scripted failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl MarketDataService for ScriptedMarket {
    async fn trending_screens(
        &self,
        _location: Option<&str>,
        _timeframe_days: u32,
    ) -> Result<Vec<TrendingScreen>> {
        self.check()?;
        Ok(self.trending.clone())
    }

    async fn screen_performance(&self, screen_id: &ScreenId) -> Result<PerformanceMetrics> {
        self.check()?;
        Err(Error::NotFound {
            kind: "screen",
            id: screen_id.to_string(),
        })
    }

    async fn market_insights(&self, location: Option<&str>) -> Result<MarketInsights> {
        self.check()?;
        Ok(MarketInsights::empty(location.map(str::to_string)))
    }
}

/// A trending entry for `screen` with the given velocity and trend score.
pub fn trending(
    screen: EnhancedScreen,
    purchase_velocity: f64,
    trend_score: f64,
) -> TrendingScreen {
    TrendingScreen {
        screen,
        booking_velocity: purchase_velocity,
        purchase_velocity,
        trend_score,
        growth_rate: 0.0,
        rank_change: 0,
    }
}

// ---------------------------------------------------------------------------
// Failing doubles
// ---------------------------------------------------------------------------

/// A catalog whose every call fails.
pub struct FailingCatalog;

#[async_trait]
impl ScreenCatalog for FailingCatalog {
    async fn all_screens(&self) -> Result<Vec<Screen>> {
        Err(Error::upstream(Service::Catalog, "catalog unavailable"))
    }

    async fn screen(&self, _screen_id: &ScreenId) -> Result<Option<Screen>> {
        Err(Error::upstream(Service::Catalog, "catalog unavailable"))
    }
}

/// Profile lookups that always fail.
pub struct FailingAnalytics;

#[async_trait]
impl UserBehaviorAnalytics for FailingAnalytics {
    async fn user_profile(&self, _user_id: &UserId) -> Result<UserProfile> {
        Err(Error::upstream(Service::UserProfile, "analytics unavailable"))
    }
}
