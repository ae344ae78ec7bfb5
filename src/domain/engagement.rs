//! Section engagement events and derived performance metrics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{SectionId, UserId};

/// View time (seconds) that earns full marks in the satisfaction score.
const FULL_VIEW_SECS: f64 = 30.0;
/// Click count that earns full marks in the satisfaction score.
const FULL_CLICKS: f64 = 3.0;

/// One user's interaction with one section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionEngagement {
    pub section_id: SectionId,
    #[serde(default)]
    pub user_id: Option<UserId>,
    /// Seconds the section was visible.
    pub view_time: f64,
    pub click_count: u32,
    /// Fraction of the section scrolled through (0-1).
    pub scroll_depth: f64,
    pub conversion_rate: f64,
    pub timestamp: DateTime<Utc>,
}

/// Aggregated section performance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionPerformanceMetrics {
    pub section_id: Option<SectionId>,
    pub impressions: u64,
    pub clicks: u64,
    pub conversions: u64,
    /// Mean view time in seconds.
    pub average_engagement_time: f64,
    pub conversion_rate: f64,
    /// 0-100.
    pub user_satisfaction_score: f64,
}

impl SectionPerformanceMetrics {
    /// Recompute metrics from the retained engagement history.
    #[must_use]
    pub fn from_events(section_id: &SectionId, events: &[SectionEngagement]) -> Self {
        if events.is_empty() {
            return Self {
                section_id: Some(section_id.clone()),
                ..Self::default()
            };
        }

        let n = events.len() as f64;
        let clicks: u64 = events.iter().map(|e| u64::from(e.click_count)).sum();
        let conversions = events.iter().filter(|e| e.conversion_rate > 0.0).count() as u64;
        let avg_view = events
            .iter()
            .map(|e| finite_or_zero(e.view_time).max(0.0))
            .sum::<f64>()
            / n;
        let avg_scroll = events
            .iter()
            .map(|e| finite_or_zero(e.scroll_depth).clamp(0.0, 1.0))
            .sum::<f64>()
            / n;
        let avg_clicks = clicks as f64 / n;

        let satisfaction = (avg_view / FULL_VIEW_SECS).min(1.0) * 40.0
            + avg_scroll * 30.0
            + (avg_clicks / FULL_CLICKS).min(1.0) * 30.0;

        Self {
            section_id: Some(section_id.clone()),
            impressions: events.len() as u64,
            clicks,
            conversions,
            average_engagement_time: avg_view,
            conversion_rate: conversions as f64 / n,
            user_satisfaction_score: satisfaction.clamp(0.0, 100.0),
        }
    }
}

/// Non-finite measurements count as zero.
fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(view: f64, clicks: u32, scroll: f64, conversion: f64) -> SectionEngagement {
        SectionEngagement {
            section_id: SectionId::from("top-picks"),
            user_id: None,
            view_time: view,
            click_count: clicks,
            scroll_depth: scroll,
            conversion_rate: conversion,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn non_finite_measurements_count_as_zero() {
        let events = [
            event(f64::NAN, 2, f64::NAN, 0.0),
            event(f64::INFINITY, 2, 0.5, 0.0),
            event(20.0, 2, 0.5, 0.0),
        ];
        let m = SectionPerformanceMetrics::from_events(&SectionId::from("x"), &events);

        assert!(m.user_satisfaction_score.is_finite());
        assert!((0.0..=100.0).contains(&m.user_satisfaction_score));
        assert!((m.average_engagement_time - 20.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn empty_history_yields_zeroes() {
        let m = SectionPerformanceMetrics::from_events(&SectionId::from("x"), &[]);
        assert_eq!(m.impressions, 0);
        assert_eq!(m.user_satisfaction_score, 0.0);
    }

    #[test]
    fn aggregates_counts_and_rates() {
        let events = vec![event(10.0, 1, 0.5, 0.0), event(20.0, 3, 1.0, 0.2)];
        let m = SectionPerformanceMetrics::from_events(&SectionId::from("top-picks"), &events);

        assert_eq!(m.impressions, 2);
        assert_eq!(m.clicks, 4);
        assert_eq!(m.conversions, 1);
        assert!((m.average_engagement_time - 15.0).abs() < 1e-9);
        assert!((m.conversion_rate - 0.5).abs() < 1e-9);

        // 15/30*40 + 0.75*30 + (2/3)*30
        let expected = 20.0 + 22.5 + 20.0;
        assert!((m.user_satisfaction_score - expected).abs() < 1e-9);
    }

    #[test]
    fn satisfaction_caps_at_full_marks() {
        let events = vec![event(120.0, 10, 1.0, 1.0)];
        let m = SectionPerformanceMetrics::from_events(&SectionId::from("x"), &events);
        assert!((m.user_satisfaction_score - 100.0).abs() < 1e-9);
    }
}
