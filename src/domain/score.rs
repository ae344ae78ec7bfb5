//! Screen-to-section relevance scoring.
//!
//! A screen's relevance to a section combines several factors:
//! - **Section weight**: base importance of the section type, resolved from
//!   the section id prefix (unknown types weigh 1)
//! - **Performance**: engagement score, booking rate, and average rating
//! - **Upstream scores**: personalized, trending, and recommendation scores
//! - **Booking frequency**: a discrete bonus per bucket
//! - **Recency**: a flat bonus for a booking within the recent window
//!
//! Missing metrics contribute nothing; the total is floored at zero.
//!
//! # Examples
//!
//! ```
//! use section_grouping::domain::score::RelevanceScorer;
//! use section_grouping::domain::{EnhancedScreen, SectionId};
//! use rust_decimal_macros::dec;
//!
//! let scorer = RelevanceScorer::default();
//! let screen = EnhancedScreen::new("s1", "Plaza", "Bogotá", dec!(100), "mall");
//!
//! // Unknown section types weigh 1, times the section multiplier of 10.
//! assert_eq!(scorer.score(&screen, &SectionId::from("sec-a")), 10.0);
//! ```

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::id::{ScreenId, SectionId};
use super::screen::EnhancedScreen;

/// Score at which confidence saturates: a very high performing screen.
pub const CONFIDENCE_CALIBRATION: f64 = 300.0;

/// Base weight for section ids matching no known type.
pub const DEFAULT_SECTION_WEIGHT: f64 = 1.0;

/// Canonical section-type prefixes and their base weights.
const SECTION_TYPE_WEIGHTS: &[(&str, f64)] = &[
    ("top-picks", 10.0),
    ("trending", 9.0),
    ("recently-viewed", 8.0),
    ("buy-again", 8.0),
    ("near-you", 7.0),
    ("similar-users", 6.0),
    ("because-you-viewed", 6.0),
    ("others-buying", 5.0),
    ("new-discoveries", 5.0),
    ("popular", 3.0),
];

/// Resolve the base weight of a section from its id prefix.
#[must_use]
pub fn section_type_weight(section_id: &SectionId) -> f64 {
    SECTION_TYPE_WEIGHTS
        .iter()
        .find(|(prefix, _)| section_id.as_str().starts_with(prefix))
        .map_or(DEFAULT_SECTION_WEIGHT, |(_, weight)| *weight)
}

/// Multipliers for each relevance factor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelevanceWeights {
    pub section: f64,
    pub engagement: f64,
    pub booking_rate: f64,
    pub rating: f64,
    pub personalized: f64,
    pub trending: f64,
    pub recommendation: f64,
    pub recent_booking_bonus: f64,
    /// Bookings newer than this earn the recency bonus.
    pub recent_booking_window: Duration,
}

impl Default for RelevanceWeights {
    fn default() -> Self {
        Self {
            section: 10.0,
            engagement: 5.0,
            booking_rate: 3.0,
            rating: 2.0,
            personalized: 8.0,
            trending: 6.0,
            recommendation: 4.0,
            recent_booking_bonus: 5.0,
            recent_booking_window: Duration::days(7),
        }
    }
}

/// Computes screen relevance per section.
#[derive(Debug, Clone, Default)]
pub struct RelevanceScorer {
    weights: RelevanceWeights,
}

impl RelevanceScorer {
    #[must_use]
    pub const fn new(weights: RelevanceWeights) -> Self {
        Self { weights }
    }

    #[must_use]
    pub const fn weights(&self) -> &RelevanceWeights {
        &self.weights
    }

    /// Relevance of `screen` to `section_id` as of now.
    #[must_use]
    pub fn score(&self, screen: &EnhancedScreen, section_id: &SectionId) -> f64 {
        self.score_at(screen, section_id, Utc::now())
    }

    /// Relevance of `screen` to `section_id` as of `now`.
    #[must_use]
    pub fn score_at(
        &self,
        screen: &EnhancedScreen,
        section_id: &SectionId,
        now: DateTime<Utc>,
    ) -> f64 {
        let w = &self.weights;
        let mut score = section_type_weight(section_id) * w.section;

        if let Some(m) = &screen.performance_metrics {
            score += m.engagement_score * w.engagement
                + m.booking_rate * w.booking_rate
                + m.average_rating * w.rating;
        }

        score += screen.personalized_score.unwrap_or(0.0) * w.personalized
            + screen.trending_score.unwrap_or(0.0) * w.trending
            + screen.recommendation_score.unwrap_or(0.0) * w.recommendation;

        if let Some(frequency) = screen.booking_frequency {
            score += frequency.bonus();
        }

        if let Some(last) = screen.last_booking_date {
            let age = now.signed_duration_since(last);
            if age >= Duration::zero() && age <= w.recent_booking_window {
                score += w.recent_booking_bonus;
            }
        }

        // f64::max drops NaN in favor of the floor.
        score.max(0.0)
    }
}

/// Relevance breakdown of one screen across candidate sections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenPriority {
    pub screen_id: ScreenId,
    /// Score per candidate section, in input order.
    pub section_priorities: Vec<(SectionId, f64)>,
    pub final_assignment: Option<SectionId>,
    /// `min(max_score / 300, 1)`.
    pub confidence: f64,
    pub reasons: Vec<String>,
}

/// Human-readable reasons a screen ranks well.
#[must_use]
pub fn priority_reasons(screen: &EnhancedScreen) -> Vec<String> {
    let mut reasons = Vec::new();
    if screen.personalized_score.is_some_and(|s| s > 0.7) {
        reasons.push("High personalization score".to_string());
    }
    if screen.trending_score.is_some_and(|s| s > 0.7) {
        reasons.push("Currently trending".to_string());
    }
    if screen
        .performance_metrics
        .as_ref()
        .is_some_and(|m| m.booking_rate > 0.5)
    {
        reasons.push("High booking rate".to_string());
    }
    if screen.booking_frequency.is_some_and(|f| f.is_frequent()) {
        reasons.push("Frequently booked".to_string());
    }
    reasons
}

/// Map a best score onto [0, 1].
#[must_use]
pub fn confidence_from_score(max_score: f64) -> f64 {
    (max_score / CONFIDENCE_CALIBRATION).clamp(0.0, 1.0)
}
