//! Cross-section deduplication and backfill.
//!
//! Sections are walked in descending priority order (stable, so equal
//! priorities keep their input order). The first section to hold a screen
//! keeps it; later occurrences are dropped. Sections that end up below
//! their minimum are then topped up from the pool of screens no section
//! uses, best relevance first.

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, trace};

use crate::domain::score::{
    confidence_from_score, priority_reasons, RelevanceScorer, ScreenPriority,
};
use crate::domain::{EnhancedScreen, ScreenId, Section, SectionId};

/// Counters reported by a full deduplication run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DedupStats {
    pub duplicates_removed: usize,
    /// Kept screens whose incoming assignment named a different section.
    pub screens_reassigned: usize,
    pub backfills_applied: usize,
    #[serde(serialize_with = "serialize_millis")]
    pub processing_time: Duration,
}

fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u128(d.as_millis())
}

/// Output of [`DeduplicationEngine::process_deduplication`].
#[derive(Debug, Clone)]
pub struct DeduplicationResult {
    pub sections: Vec<Section>,
    pub stats: DedupStats,
}

/// Resolves screens claimed by several sections and backfills short sections.
#[derive(Debug, Clone, Default)]
pub struct DeduplicationEngine {
    scorer: RelevanceScorer,
}

impl DeduplicationEngine {
    #[must_use]
    pub const fn new(scorer: RelevanceScorer) -> Self {
        Self { scorer }
    }

    #[must_use]
    pub const fn scorer(&self) -> &RelevanceScorer {
        &self.scorer
    }

    /// Keep each screen only in the highest-priority section containing it.
    ///
    /// The result is ordered by descending priority. Sections left without
    /// screens are kept.
    #[must_use]
    pub fn remove_duplicates(&self, sections: Vec<Section>) -> Vec<Section> {
        self.dedup_pass(sections).0
    }

    /// The candidate section `screen` is most relevant to.
    ///
    /// Ties go to the earliest candidate. Returns `None` with no candidates.
    #[must_use]
    pub fn assign_screen_priority(
        &self,
        screen: &EnhancedScreen,
        section_ids: &[SectionId],
    ) -> Option<SectionId> {
        let now = Utc::now();
        let mut best: Option<(&SectionId, f64)> = None;
        for id in section_ids {
            let score = self.scorer.score_at(screen, id, now);
            if best.map_or(true, |(_, top)| score > top) {
                best = Some((id, score));
            }
        }
        best.map(|(id, _)| id.clone())
    }

    /// Full relevance breakdown of `screen` across `section_ids`.
    #[must_use]
    pub fn create_screen_priority(
        &self,
        screen: &EnhancedScreen,
        section_ids: &[SectionId],
    ) -> ScreenPriority {
        let now = Utc::now();
        let section_priorities: Vec<(SectionId, f64)> = section_ids
            .iter()
            .map(|id| (id.clone(), self.scorer.score_at(screen, id, now)))
            .collect();

        let mut best: Option<&(SectionId, f64)> = None;
        for entry in &section_priorities {
            if best.map_or(true, |top| entry.1 > top.1) {
                best = Some(entry);
            }
        }

        let max_score = best.map_or(0.0, |(_, score)| *score);
        let final_assignment = best.map(|(id, _)| id.clone());

        ScreenPriority {
            screen_id: screen.id.clone(),
            section_priorities,
            final_assignment,
            confidence: confidence_from_score(max_score),
            reasons: priority_reasons(screen),
        }
    }

    /// Top up sections below their minimum from screens no section uses.
    ///
    /// Each short section takes up to `min - len` screens (never past its
    /// maximum), ranked by relevance to that section with ties broken by
    /// pool order. A screen taken by one section is gone for the rest.
    #[must_use]
    pub fn backfill_sections(
        &self,
        mut sections: Vec<Section>,
        available: &[EnhancedScreen],
    ) -> Vec<Section> {
        let used: HashSet<&ScreenId> = sections
            .iter()
            .flat_map(|s| s.screens.iter().map(|screen| &screen.id))
            .collect();

        let mut seen = HashSet::new();
        let mut pool: Vec<EnhancedScreen> = available
            .iter()
            .filter(|s| !used.contains(&s.id) && seen.insert(s.id.clone()))
            .cloned()
            .collect();
        drop(used);

        let now = Utc::now();
        for section in &mut sections {
            let needed = section.shortfall();
            if needed == 0 || pool.is_empty() {
                continue;
            }

            let mut ranked: Vec<(usize, f64)> = pool
                .iter()
                .enumerate()
                .map(|(i, s)| (i, self.scorer.score_at(s, &section.id, now)))
                .collect();
            // Stable: equal scores keep pool order.
            ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

            let picked: Vec<usize> = ranked.into_iter().take(needed).map(|(i, _)| i).collect();
            let picked_ids: HashSet<ScreenId> =
                picked.iter().map(|&i| pool[i].id.clone()).collect();

            let mut additions: Vec<EnhancedScreen> =
                picked.iter().map(|&i| pool[i].clone()).collect();
            for screen in &mut additions {
                screen.section_assignment = Some(section.id.clone());
            }
            pool.retain(|s| !picked_ids.contains(&s.id));

            trace!(
                section = %section.id,
                added = additions.len(),
                remaining_pool = pool.len(),
                "Backfilled section"
            );
            section.screens.extend(additions);
        }

        sections
    }

    /// Deduplicate, then backfill, reporting what changed.
    #[must_use]
    pub fn process_deduplication(
        &self,
        sections: Vec<Section>,
        available: &[EnhancedScreen],
    ) -> DeduplicationResult {
        let started = Instant::now();
        let original = screen_count(&sections);

        let (deduped, screens_reassigned) = self.dedup_pass(sections);
        let after_dedup = screen_count(&deduped);

        let sections = self.backfill_sections(deduped, available);
        let final_count = screen_count(&sections);

        let stats = DedupStats {
            duplicates_removed: original.saturating_sub(after_dedup),
            screens_reassigned,
            backfills_applied: final_count.saturating_sub(after_dedup),
            processing_time: started.elapsed(),
        };

        debug!(
            sections = sections.len(),
            duplicates_removed = stats.duplicates_removed,
            reassigned = stats.screens_reassigned,
            backfilled = stats.backfills_applied,
            "Deduplication complete"
        );

        DeduplicationResult { sections, stats }
    }

    /// First-writer-wins pass over sections sorted by descending priority.
    fn dedup_pass(&self, mut sections: Vec<Section>) -> (Vec<Section>, usize) {
        sections.sort_by(|a, b| b.priority.cmp(&a.priority));

        let mut claimed: HashMap<ScreenId, SectionId> = HashMap::new();
        let mut reassigned = 0;

        for section in &mut sections {
            let candidates = std::mem::take(&mut section.screens);
            let mut kept = Vec::with_capacity(candidates.len());

            for mut screen in candidates {
                if let Some(owner) = claimed.get(&screen.id) {
                    trace!(
                        screen = %screen.id,
                        owner = %owner,
                        dropped_from = %section.id,
                        "Duplicate screen removed"
                    );
                    continue;
                }

                claimed.insert(screen.id.clone(), section.id.clone());
                if screen
                    .section_assignment
                    .as_ref()
                    .is_some_and(|prev| prev != &section.id)
                {
                    reassigned += 1;
                }
                screen.section_assignment = Some(section.id.clone());
                kept.push(screen);
            }

            section.screens = kept;
        }

        (sections, reassigned)
    }
}

fn screen_count(sections: &[Section]) -> usize {
    sections.iter().map(Section::len).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AlgorithmType, SectionConfig, UserContext};
    use rust_decimal_macros::dec;

    fn screen(id: &str) -> EnhancedScreen {
        EnhancedScreen::new(id, id, "Bogotá", dec!(100), "mall")
    }

    fn scored(id: &str, personalized: f64) -> EnhancedScreen {
        let mut s = screen(id);
        s.personalized_score = Some(personalized);
        s
    }

    fn section(id: &str, priority: i32, min: usize, max: usize, screens: &[&str]) -> Section {
        let cfg =
            SectionConfig::try_new(id, id, AlgorithmType::FallbackPopular, priority, min, max)
                .unwrap();
        Section::from_config(&cfg, UserContext::default())
            .with_screens(screens.iter().map(|s| screen(s)).collect())
    }

    fn ids(section: &Section) -> Vec<&str> {
        section.screens.iter().map(|s| s.id.as_str()).collect()
    }

    #[test]
    fn higher_priority_section_keeps_shared_screen() {
        let engine = DeduplicationEngine::default();
        let out = engine.remove_duplicates(vec![
            section("A", 10, 0, 10, &["s1", "s2"]),
            section("B", 5, 0, 10, &["s1", "s3"]),
        ]);

        assert_eq!(ids(&out[0]), vec!["s1", "s2"]);
        assert_eq!(ids(&out[1]), vec!["s3"]);
        assert_eq!(
            out[0].screens[0].section_assignment,
            Some(SectionId::from("A"))
        );
    }

    #[test]
    fn input_order_does_not_matter_for_priority() {
        let engine = DeduplicationEngine::default();
        let out = engine.remove_duplicates(vec![
            section("low", 1, 0, 10, &["s1"]),
            section("high", 9, 0, 10, &["s1"]),
        ]);

        assert_eq!(out[0].id.as_str(), "high");
        assert_eq!(ids(&out[0]), vec!["s1"]);
        assert!(out[1].is_empty());
    }

    #[test]
    fn equal_priority_first_section_wins() {
        let engine = DeduplicationEngine::default();
        let out = engine.remove_duplicates(vec![
            section("first", 5, 0, 10, &["s1"]),
            section("second", 5, 0, 10, &["s1", "s2"]),
        ]);
        assert_eq!(ids(&out[0]), vec!["s1"]);
        assert_eq!(ids(&out[1]), vec!["s2"]);
    }

    #[test]
    fn repeated_screen_within_one_section_is_dropped() {
        let engine = DeduplicationEngine::default();
        let out = engine.remove_duplicates(vec![section("A", 1, 0, 10, &["s1", "s1", "s2"])]);
        assert_eq!(ids(&out[0]), vec!["s1", "s2"]);
    }

    #[test]
    fn empty_input_yields_empty_output() {
        let engine = DeduplicationEngine::default();
        assert!(engine.remove_duplicates(vec![]).is_empty());
        let result = engine.process_deduplication(vec![], &[]);
        assert!(result.sections.is_empty());
        assert_eq!(result.stats.duplicates_removed, 0);
    }

    #[test]
    fn assign_priority_ties_resolve_to_first_candidate() {
        let engine = DeduplicationEngine::default();
        let ids = [SectionId::from("sec-a"), SectionId::from("sec-b")];
        assert_eq!(
            engine.assign_screen_priority(&screen("s1"), &ids),
            Some(SectionId::from("sec-a"))
        );
        assert_eq!(engine.assign_screen_priority(&screen("s1"), &[]), None);
    }

    #[test]
    fn assign_priority_prefers_heavier_section_type() {
        let engine = DeduplicationEngine::default();
        let ids = [SectionId::from("popular"), SectionId::from("top-picks")];
        assert_eq!(
            engine.assign_screen_priority(&screen("s1"), &ids),
            Some(SectionId::from("top-picks"))
        );
    }

    #[test]
    fn screen_priority_reports_confidence_and_reasons() {
        let engine = DeduplicationEngine::default();
        let mut s = scored("s1", 0.9);
        s.trending_score = Some(0.8);
        let priority = engine.create_screen_priority(
            &s,
            &[SectionId::from("sec-a"), SectionId::from("top-picks")],
        );

        assert_eq!(priority.final_assignment, Some(SectionId::from("top-picks")));
        // top-picks: 100 + 0.9*8 + 0.8*6 = 112
        assert!((priority.confidence - 112.0 / 300.0).abs() < 1e-9);
        assert_eq!(
            priority.reasons,
            vec!["High personalization score", "Currently trending"]
        );
        assert_eq!(priority.section_priorities.len(), 2);
    }

    #[test]
    fn screen_priority_without_candidates_has_zero_confidence() {
        let engine = DeduplicationEngine::default();
        let priority = engine.create_screen_priority(&screen("s1"), &[]);
        assert_eq!(priority.confidence, 0.0);
        assert!(priority.final_assignment.is_none());
    }

    #[test]
    fn backfill_takes_top_scored_screens_up_to_minimum() {
        let engine = DeduplicationEngine::default();
        let pool: Vec<EnhancedScreen> = [
            ("p1", 1.0),
            ("p2", 0.25),
            ("p3", 0.75),
            ("p4", 0.5),
            ("p5", 0.0),
        ]
        .iter()
        .map(|(id, score)| scored(id, *score))
        .collect();

        let out = engine.backfill_sections(vec![section("X", 1, 3, 6, &[])], &pool);
        assert_eq!(ids(&out[0]), vec!["p1", "p3", "p4"]);
        assert!(out[0]
            .screens
            .iter()
            .all(|s| s.section_assignment == Some(SectionId::from("X"))));
    }

    #[test]
    fn backfill_never_exceeds_maximum() {
        let engine = DeduplicationEngine::default();
        let mut short = section("X", 1, 5, 5, &["a", "b", "c", "d"]);
        short.max_screens = 5;
        let pool: Vec<EnhancedScreen> = (0..10).map(|i| screen(&format!("p{i}"))).collect();

        let out = engine.backfill_sections(vec![short], &pool);
        assert_eq!(out[0].len(), 5);
    }

    #[test]
    fn backfill_skips_screens_already_in_any_section() {
        let engine = DeduplicationEngine::default();
        let pool = vec![screen("s1"), screen("s9")];
        let out = engine.backfill_sections(
            vec![
                section("A", 2, 0, 5, &["s1"]),
                section("B", 1, 2, 5, &[]),
            ],
            &pool,
        );
        assert_eq!(ids(&out[1]), vec!["s9"]);
    }

    #[test]
    fn backfill_does_not_reuse_screens_across_sections() {
        let engine = DeduplicationEngine::default();
        let pool: Vec<EnhancedScreen> = (0..3).map(|i| screen(&format!("p{i}"))).collect();
        let out = engine.backfill_sections(
            vec![section("A", 2, 2, 5, &[]), section("B", 1, 2, 5, &[])],
            &pool,
        );

        assert_eq!(ids(&out[0]), vec!["p0", "p1"]);
        assert_eq!(ids(&out[1]), vec!["p2"]);
    }

    #[test]
    fn sections_meeting_minimum_are_unchanged() {
        let engine = DeduplicationEngine::default();
        let full = section("A", 1, 1, 5, &["s1"]);
        let out = engine.backfill_sections(vec![full.clone()], &[screen("p1")]);
        assert_eq!(out[0], full);
    }

    #[test]
    fn process_reports_counts() {
        let engine = DeduplicationEngine::default();
        let mut moved = screen("s3");
        moved.section_assignment = Some(SectionId::from("elsewhere"));

        let mut b = section("B", 5, 3, 5, &["s1"]);
        b.screens.push(moved);

        let result = engine.process_deduplication(
            vec![section("A", 10, 0, 5, &["s1", "s2"]), b],
            &[screen("p1"), screen("p2")],
        );

        assert_eq!(result.stats.duplicates_removed, 1);
        assert_eq!(result.stats.screens_reassigned, 1);
        assert_eq!(result.stats.backfills_applied, 2);
        assert_eq!(ids(&result.sections[1]), vec!["s3", "p1", "p2"]);
    }
}
