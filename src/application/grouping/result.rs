//! Request options and results of section generation.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::dedup::DedupStats;
use crate::domain::{AlgorithmType, Section, UserId};

/// What to generate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationOptions {
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub location: Option<String>,
    /// Overrides the configured section count.
    #[serde(default)]
    pub max_sections: Option<usize>,
    /// Bypass the cached result for this user and location.
    #[serde(default)]
    pub force_refresh: bool,
}

impl GenerationOptions {
    #[must_use]
    pub fn for_user(user_id: impl Into<UserId>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn at_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    #[must_use]
    pub const fn with_max_sections(mut self, max: usize) -> Self {
        self.max_sections = Some(max);
        self
    }

    #[must_use]
    pub const fn force_refresh(mut self) -> Self {
        self.force_refresh = true;
        self
    }
}

/// Summary of one generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupingAnalytics {
    pub request_id: Uuid,
    pub total_sections: usize,
    pub total_screens: usize,
    /// Distinct algorithms behind the returned sections, in section order.
    pub algorithms_used: Vec<AlgorithmType>,
    pub average_confidence: f64,
    pub duplicates_removed: usize,
    pub screens_reassigned: usize,
    pub backfills_applied: usize,
    pub dedup_time_ms: u64,
    pub generated_at: DateTime<Utc>,
}

impl GroupingAnalytics {
    pub(crate) fn summarize(sections: &[Section], dedup: &DedupStats) -> Self {
        let mut algorithms_used = Vec::new();
        for section in sections {
            if !algorithms_used.contains(&section.metadata.algorithm) {
                algorithms_used.push(section.metadata.algorithm);
            }
        }

        let average_confidence = if sections.is_empty() {
            0.0
        } else {
            sections.iter().map(|s| s.metadata.confidence).sum::<f64>() / sections.len() as f64
        };

        Self {
            request_id: Uuid::new_v4(),
            total_sections: sections.len(),
            total_screens: sections.iter().map(Section::len).sum(),
            algorithms_used,
            average_confidence,
            duplicates_removed: dedup.duplicates_removed,
            screens_reassigned: dedup.screens_reassigned,
            backfills_applied: dedup.backfills_applied,
            dedup_time_ms: duration_ms(dedup.processing_time),
            generated_at: Utc::now(),
        }
    }
}

/// Sections generated for one request.
///
/// Always well-formed: failures surface as fewer sections, `fallback_used`,
/// and entries in `errors`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupingResult {
    pub sections: Vec<Section>,
    pub analytics: GroupingAnalytics,
    pub fallback_used: bool,
    pub processing_time_ms: u64,
    pub cache_hit: bool,
    /// Pipeline-level degradations, such as an unavailable backfill pool.
    pub errors: Vec<String>,
}

impl GroupingResult {
    #[must_use]
    pub fn total_screens(&self) -> usize {
        self.sections.iter().map(Section::len).sum()
    }
}

pub(crate) fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
