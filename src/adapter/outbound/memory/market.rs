//! Market data derived from catalog records.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;

use crate::domain::{
    EnhancedScreen, MarketInsights, PerformanceMetrics, Screen, ScreenId, TrendingScreen,
};
use crate::error::{Error, Result};
use crate::port::outbound::{MarketDataService, ScreenCatalog};

/// Views at which the reach component of the trend score saturates.
const VIEWS_CEILING: f64 = 10_000.0;
/// Categories listed in market insights.
const TOP_CATEGORIES: usize = 3;

/// Market data computed from the catalog's views, ratings, and reviews.
///
/// Reviews stand in for bookings: velocity is reviews per day over the
/// requested timeframe.
pub struct CatalogMarketData {
    catalog: Arc<dyn ScreenCatalog>,
}

impl CatalogMarketData {
    pub fn new(catalog: Arc<dyn ScreenCatalog>) -> Self {
        Self { catalog }
    }
}

fn trend_of(screen: &Screen, timeframe_days: u32) -> TrendingScreen {
    let days = f64::from(timeframe_days.max(1));
    let booking_velocity = f64::from(screen.reviews) / days;
    let quality = (screen.rating / 5.0).clamp(0.0, 1.0);
    let reach = ((screen.views as f64 + 1.0).ln() / (VIEWS_CEILING + 1.0).ln()).min(1.0);

    TrendingScreen {
        screen: EnhancedScreen::from_catalog(screen),
        booking_velocity,
        purchase_velocity: booking_velocity * quality,
        trend_score: reach * 0.5 + quality * 0.5,
        growth_rate: (screen.rating - 3.0) / 10.0,
        rank_change: 0,
    }
}

#[async_trait]
impl MarketDataService for CatalogMarketData {
    async fn trending_screens(
        &self,
        location: Option<&str>,
        timeframe_days: u32,
    ) -> Result<Vec<TrendingScreen>> {
        let catalog = self.catalog.all_screens().await?;
        let mut trending: Vec<TrendingScreen> = catalog
            .iter()
            .filter(|s| location.map_or(true, |l| s.matches_location(l)))
            .map(|s| trend_of(s, timeframe_days))
            .collect();
        trending.sort_by(|a, b| b.trend_score.total_cmp(&a.trend_score));
        Ok(trending)
    }

    async fn screen_performance(&self, screen_id: &ScreenId) -> Result<PerformanceMetrics> {
        self.catalog
            .screen(screen_id)
            .await?
            .and_then(|s| EnhancedScreen::from_catalog(&s).performance_metrics)
            .ok_or_else(|| Error::NotFound {
                kind: "screen",
                id: screen_id.to_string(),
            })
    }

    async fn market_insights(&self, location: Option<&str>) -> Result<MarketInsights> {
        let catalog = self.catalog.all_screens().await?;
        let screens: Vec<&Screen> = catalog
            .iter()
            .filter(|s| location.map_or(true, |l| s.matches_location(l)))
            .collect();

        let mut insights = MarketInsights::empty(location.map(str::to_string));
        if screens.is_empty() {
            return Ok(insights);
        }

        let count = screens.len();
        let total_price: Decimal = screens.iter().map(|s| s.price).sum();
        insights.total_screens = count;
        insights.average_price = (total_price / Decimal::from(count)).round_dp(2);
        insights.average_rating = screens.iter().map(|s| s.rating).sum::<f64>() / count as f64;

        let mut by_category: HashMap<&str, usize> = HashMap::new();
        for s in &screens {
            *by_category.entry(s.category.as_str()).or_insert(0) += 1;
        }
        let mut categories: Vec<(&str, usize)> = by_category.into_iter().collect();
        categories.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        insights.top_categories = categories
            .into_iter()
            .take(TOP_CATEGORIES)
            .map(|(c, _)| c.to_string())
            .collect();
        insights.generated_at = Utc::now();
        Ok(insights)
    }
}
