//! Market-level data returned by the market data service.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::screen::EnhancedScreen;

/// A screen with its recent momentum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendingScreen {
    pub screen: EnhancedScreen,
    /// Bookings per day over the timeframe.
    pub booking_velocity: f64,
    /// Purchases per day over the timeframe.
    pub purchase_velocity: f64,
    /// 0-1.
    pub trend_score: f64,
    pub growth_rate: f64,
    /// Positive means the screen climbed the ranking.
    pub rank_change: i32,
}

impl TrendingScreen {
    /// The wrapped screen with its trend score attached.
    #[must_use]
    pub fn into_scored(self) -> EnhancedScreen {
        let mut screen = self.screen;
        screen.trending_score = Some(self.trend_score);
        screen
    }
}

/// Aggregate view of one market (location).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketInsights {
    pub location: Option<String>,
    pub total_screens: usize,
    pub average_price: Decimal,
    pub average_rating: f64,
    pub top_categories: Vec<String>,
    pub generated_at: DateTime<Utc>,
}

impl MarketInsights {
    /// Insights with no data, used as the static fallback.
    #[must_use]
    pub fn empty(location: Option<String>) -> Self {
        Self {
            location,
            total_screens: 0,
            average_price: Decimal::ZERO,
            average_rating: 0.0,
            top_categories: Vec::new(),
            generated_at: Utc::now(),
        }
    }
}
