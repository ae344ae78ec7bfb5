//! Screen inventory records.
//!
//! [`Screen`] is the raw catalog record as it arrives from the inventory
//! source. [`EnhancedScreen`] is the scored form that flows through section
//! generation, deduplication, and backfill.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{ScreenId, SectionId};

/// Where a screen is installed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Indoor,
    Outdoor,
}

/// Physical display characteristics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScreenSpecs {
    pub resolution: String,
    pub size: String,
    #[serde(default)]
    pub brightness: Option<String>,
}

/// A priced bundle of display time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingBundle {
    pub name: String,
    pub price: Decimal,
    /// Length of the bundle in hours.
    pub hours: u32,
}

/// Daily operating window, as `HH:MM` strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatingHours {
    pub start: String,
    pub end: String,
}

impl Default for OperatingHours {
    fn default() -> Self {
        Self {
            start: "06:00".into(),
            end: "23:00".into(),
        }
    }
}

/// Raw screen record from the inventory catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Screen {
    pub id: ScreenId,
    pub name: String,
    pub location: String,
    pub price: Decimal,
    pub category: String,
    #[serde(default)]
    pub environment: Environment,
    #[serde(default)]
    pub specs: ScreenSpecs,
    /// Average daily views.
    #[serde(default)]
    pub views: u64,
    /// Average rating on a 0-5 scale.
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub reviews: u32,
    #[serde(default)]
    pub pricing_bundles: Vec<PricingBundle>,
    #[serde(default)]
    pub operating_hours: OperatingHours,
}

impl Screen {
    /// Heuristic popularity used when no upstream scoring is available.
    ///
    /// `rating * 0.6 + ln(views + 1) * 0.4`
    #[must_use]
    pub fn popularity_score(&self) -> f64 {
        self.rating * 0.6 + ((self.views as f64) + 1.0).ln() * 0.4
    }

    /// Case-insensitive substring match on the screen's location.
    #[must_use]
    pub fn matches_location(&self, location: &str) -> bool {
        self.location
            .to_lowercase()
            .contains(&location.trim().to_lowercase())
    }
}

/// Direction of a screen's recent performance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
    #[default]
    Stable,
}

/// Booking frequency bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BookingFrequency {
    VeryHigh,
    High,
    Medium,
    Low,
    VeryLow,
}

impl BookingFrequency {
    /// Discrete relevance bonus for this bucket.
    #[must_use]
    pub const fn bonus(self) -> f64 {
        match self {
            Self::VeryHigh => 10.0,
            Self::High => 8.0,
            Self::Medium => 5.0,
            Self::Low => 3.0,
            Self::VeryLow => 1.0,
        }
    }

    /// Whether this bucket counts as "frequently booked".
    #[must_use]
    pub const fn is_frequent(self) -> bool {
        matches!(self, Self::VeryHigh | Self::High)
    }

    /// Bucket a daily view count.
    #[must_use]
    pub fn from_daily_views(views: u64) -> Self {
        match views {
            5000.. => Self::VeryHigh,
            2000..=4999 => Self::High,
            500..=1999 => Self::Medium,
            100..=499 => Self::Low,
            _ => Self::VeryLow,
        }
    }
}

/// Observed performance of a screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetrics {
    /// Fraction of impressions that turned into bookings (0-1).
    pub booking_rate: f64,
    /// Average rating on a 0-5 scale.
    pub average_rating: f64,
    /// Engagement score (0-1).
    pub engagement_score: f64,
    pub revenue: Decimal,
    pub impressions: u64,
    pub conversion_rate: f64,
    pub last_updated: DateTime<Utc>,
    pub trend: TrendDirection,
}

/// Screen enriched with performance data and scores.
///
/// `section_assignment` is owned by the deduplication pass: it is set only
/// there and names the single section currently holding the screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhancedScreen {
    pub id: ScreenId,
    pub name: String,
    pub location: String,
    pub price: Decimal,
    pub category: String,
    #[serde(default)]
    pub performance_metrics: Option<PerformanceMetrics>,
    #[serde(default)]
    pub booking_frequency: Option<BookingFrequency>,
    #[serde(default)]
    pub personalized_score: Option<f64>,
    #[serde(default)]
    pub trending_score: Option<f64>,
    #[serde(default)]
    pub recommendation_score: Option<f64>,
    #[serde(default)]
    pub section_assignment: Option<SectionId>,
    #[serde(default)]
    pub last_booking_date: Option<DateTime<Utc>>,
}

impl EnhancedScreen {
    /// Create a bare screen with no metrics or scores.
    pub fn new(
        id: impl Into<ScreenId>,
        name: impl Into<String>,
        location: impl Into<String>,
        price: Decimal,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            location: location.into(),
            price,
            category: category.into(),
            performance_metrics: None,
            booking_frequency: None,
            personalized_score: None,
            trending_score: None,
            recommendation_score: None,
            section_assignment: None,
            last_booking_date: None,
        }
    }

    /// Derive an enhanced screen from a raw catalog record.
    ///
    /// Metrics are estimated from the record's rating, reviews, and views;
    /// no upstream scores are attached.
    #[must_use]
    pub fn from_catalog(screen: &Screen) -> Self {
        let views = screen.views;
        let booking_rate = if views == 0 {
            0.0
        } else {
            (f64::from(screen.reviews) / views as f64).min(1.0)
        };
        let engagement_score = (screen.rating / 5.0).clamp(0.0, 1.0);

        let metrics = PerformanceMetrics {
            booking_rate,
            average_rating: screen.rating,
            engagement_score,
            revenue: screen.price * Decimal::from(screen.reviews),
            impressions: views,
            conversion_rate: booking_rate,
            last_updated: Utc::now(),
            trend: TrendDirection::Stable,
        };

        Self {
            performance_metrics: Some(metrics),
            booking_frequency: Some(BookingFrequency::from_daily_views(views)),
            ..Self::new(
                screen.id.clone(),
                screen.name.clone(),
                screen.location.clone(),
                screen.price,
                screen.category.clone(),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn raw(views: u64, rating: f64, reviews: u32) -> Screen {
        Screen {
            id: ScreenId::new("s1"),
            name: "Plaza LED".into(),
            location: "Bogotá, Chapinero".into(),
            price: dec!(120),
            category: "mall".into(),
            environment: Environment::Indoor,
            specs: ScreenSpecs::default(),
            views,
            rating,
            reviews,
            pricing_bundles: vec![],
            operating_hours: OperatingHours::default(),
        }
    }

    #[test]
    fn popularity_score_blends_rating_and_views() {
        let screen = raw(0, 5.0, 0);
        assert!((screen.popularity_score() - 3.0).abs() < 1e-9);

        let busier = raw(1000, 5.0, 0);
        assert!(busier.popularity_score() > screen.popularity_score());
    }

    #[test]
    fn location_match_is_case_insensitive_substring() {
        let screen = raw(10, 4.0, 1);
        assert!(screen.matches_location("bogotá"));
        assert!(screen.matches_location("CHAPINERO"));
        assert!(!screen.matches_location("Medellín"));
    }

    #[test]
    fn booking_frequency_buckets() {
        assert_eq!(BookingFrequency::from_daily_views(9000), BookingFrequency::VeryHigh);
        assert_eq!(BookingFrequency::from_daily_views(2000), BookingFrequency::High);
        assert_eq!(BookingFrequency::from_daily_views(600), BookingFrequency::Medium);
        assert_eq!(BookingFrequency::from_daily_views(100), BookingFrequency::Low);
        assert_eq!(BookingFrequency::from_daily_views(3), BookingFrequency::VeryLow);
    }

    #[test]
    fn from_catalog_estimates_metrics() {
        let enhanced = EnhancedScreen::from_catalog(&raw(200, 4.0, 50));
        let metrics = enhanced.performance_metrics.expect("metrics");
        assert!((metrics.booking_rate - 0.25).abs() < 1e-9);
        assert!((metrics.engagement_score - 0.8).abs() < 1e-9);
        assert_eq!(metrics.impressions, 200);
        assert_eq!(enhanced.booking_frequency, Some(BookingFrequency::Low));
        assert!(enhanced.section_assignment.is_none());
    }

    #[test]
    fn from_catalog_handles_zero_views() {
        let enhanced = EnhancedScreen::from_catalog(&raw(0, 0.0, 0));
        let metrics = enhanced.performance_metrics.expect("metrics");
        assert_eq!(metrics.booking_rate, 0.0);
    }

    #[test]
    fn booking_frequency_serializes_kebab_case() {
        let json = serde_json::to_string(&BookingFrequency::VeryHigh).unwrap();
        assert_eq!(json, "\"very-high\"");
    }
}
