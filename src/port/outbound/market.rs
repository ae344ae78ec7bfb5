//! Market data port.

use async_trait::async_trait;

use crate::domain::{MarketInsights, PerformanceMetrics, ScreenId, TrendingScreen};
use crate::error::Result;

/// Market-wide trends and per-screen performance.
#[async_trait]
pub trait MarketDataService: Send + Sync {
    /// Screens with the strongest momentum over the last `timeframe_days`.
    async fn trending_screens(
        &self,
        location: Option<&str>,
        timeframe_days: u32,
    ) -> Result<Vec<TrendingScreen>>;

    /// Current performance metrics for one screen.
    async fn screen_performance(&self, screen_id: &ScreenId) -> Result<PerformanceMetrics>;

    /// Aggregate insights for a location, or the whole market.
    async fn market_insights(&self, location: Option<&str>) -> Result<MarketInsights>;
}
