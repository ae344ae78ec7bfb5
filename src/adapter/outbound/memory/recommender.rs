//! Heuristic recommendations computed from the catalog and user profiles.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;

use crate::domain::{EnhancedScreen, Screen, ScreenId, UserId, UserProfile};
use crate::error::{Error, Result, Service};
use crate::port::outbound::{RecommendationService, ScreenCatalog, UserBehaviorAnalytics};

/// Popularity at which a screen's base score saturates.
const POPULARITY_CEILING: f64 = 6.5;

/// Deterministic recommender over an in-memory catalog.
///
/// Personal scores blend catalog popularity with the user's preferred
/// categories and locations. Screens the user already purchased are never
/// recommended as top picks.
pub struct CatalogRecommender {
    catalog: Arc<dyn ScreenCatalog>,
    analytics: Arc<dyn UserBehaviorAnalytics>,
}

impl CatalogRecommender {
    pub fn new(catalog: Arc<dyn ScreenCatalog>, analytics: Arc<dyn UserBehaviorAnalytics>) -> Self {
        Self { catalog, analytics }
    }

    async fn profile(&self, user_id: &UserId) -> UserProfile {
        self.analytics
            .user_profile(user_id)
            .await
            .unwrap_or_else(|_| UserProfile::new(user_id.clone()))
    }
}

fn base_score(screen: &Screen) -> f64 {
    (screen.popularity_score() / POPULARITY_CEILING).clamp(0.0, 1.0)
}

fn affinity(screen: &Screen, profile: &UserProfile) -> f64 {
    let mut score = base_score(screen) * 0.5;
    if profile
        .preferred_categories
        .iter()
        .any(|c| c.eq_ignore_ascii_case(&screen.category))
    {
        score += 0.3;
    }
    if profile
        .preferred_locations
        .iter()
        .any(|l| screen.matches_location(l))
    {
        score += 0.2;
    }
    score
}

fn similarity(seed: &Screen, candidate: &Screen) -> f64 {
    let mut score = 0.0;
    if seed.category.eq_ignore_ascii_case(&candidate.category) {
        score += 0.5;
    }
    if candidate.matches_location(&seed.location) {
        score += 0.3;
    }
    let (a, b) = (
        seed.price.to_f64().unwrap_or(0.0),
        candidate.price.to_f64().unwrap_or(0.0),
    );
    let spread = a.max(b);
    if spread > 0.0 {
        score += 0.2 * (1.0 - (a - b).abs() / spread);
    } else {
        score += 0.2;
    }
    score
}

/// Sort by score descending (stable) and keep `limit`.
fn top(mut scored: Vec<(&Screen, f64)>, limit: usize) -> Vec<(&Screen, f64)> {
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored.truncate(limit);
    scored
}

#[async_trait]
impl RecommendationService for CatalogRecommender {
    async fn top_picks(&self, user_id: &UserId, limit: usize) -> Result<Vec<EnhancedScreen>> {
        let profile = self.profile(user_id).await;
        let catalog = self.catalog.all_screens().await?;
        let purchased: HashSet<&ScreenId> = profile.purchased.iter().collect();

        let scored = catalog
            .iter()
            .filter(|s| !purchased.contains(&s.id))
            .map(|s| (s, affinity(s, &profile)))
            .collect();

        Ok(top(scored, limit)
            .into_iter()
            .map(|(s, score)| {
                let mut screen = EnhancedScreen::from_catalog(s);
                screen.personalized_score = Some(score);
                screen
            })
            .collect())
    }

    async fn new_discoveries(&self, user_id: &UserId, limit: usize) -> Result<Vec<EnhancedScreen>> {
        let profile = self.profile(user_id).await;
        let catalog = self.catalog.all_screens().await?;
        let seen: HashSet<&ScreenId> = profile
            .recently_viewed
            .iter()
            .chain(&profile.purchased)
            .collect();

        let scored = catalog
            .iter()
            .filter(|s| !seen.contains(&s.id))
            .map(|s| (s, affinity(s, &profile)))
            .collect();

        Ok(top(scored, limit)
            .into_iter()
            .map(|(s, score)| {
                let mut screen = EnhancedScreen::from_catalog(s);
                screen.recommendation_score = Some(score);
                screen
            })
            .collect())
    }

    async fn similar_screens(
        &self,
        screen_id: &ScreenId,
        _user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<EnhancedScreen>> {
        let catalog = self.catalog.all_screens().await?;
        let seed = catalog
            .iter()
            .find(|s| &s.id == screen_id)
            .ok_or_else(|| Error::NotFound {
                kind: "screen",
                id: screen_id.to_string(),
            })?;

        let scored = catalog
            .iter()
            .filter(|s| &s.id != screen_id)
            .map(|s| (s, similarity(seed, s)))
            .filter(|(_, score)| *score >= 0.5)
            .collect();

        Ok(top(scored, limit)
            .into_iter()
            .map(|(s, score)| {
                let mut screen = EnhancedScreen::from_catalog(s);
                screen.recommendation_score = Some(score);
                screen
            })
            .collect())
    }

    async fn trending_screens(
        &self,
        location: Option<&str>,
        limit: usize,
    ) -> Result<Vec<EnhancedScreen>> {
        let catalog = self.catalog.all_screens().await?;
        if catalog.is_empty() {
            return Err(Error::upstream(Service::Recommendation, "catalog is empty"));
        }

        let scored = catalog
            .iter()
            .filter(|s| location.map_or(true, |l| s.matches_location(l)))
            .map(|s| (s, base_score(s)))
            .collect();

        Ok(top(scored, limit)
            .into_iter()
            .map(|(s, score)| {
                let mut screen = EnhancedScreen::from_catalog(s);
                screen.trending_score = Some(score);
                screen
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::outbound::memory::{InMemoryBehaviorAnalytics, StaticCatalog};
    use crate::testkit::domain::raw_screen;

    fn recommender(profile: Option<UserProfile>) -> CatalogRecommender {
        let mut cheap = raw_screen("cheap", "Bogotá", 4.0, 500);
        cheap.category = "billboard".into();
        let catalog = StaticCatalog::new(vec![
            raw_screen("plaza", "Bogotá", 4.8, 3000),
            raw_screen("mall", "Medellín", 4.0, 800),
            cheap,
        ]);
        let analytics = InMemoryBehaviorAnalytics::new();
        if let Some(profile) = profile {
            analytics.insert(profile);
        }
        CatalogRecommender::new(Arc::new(catalog), Arc::new(analytics))
    }

    #[tokio::test]
    async fn top_picks_skip_purchases_and_favor_preferences() {
        let mut profile = UserProfile::new(UserId::from("u1"));
        profile.purchased = vec![ScreenId::from("plaza")];
        profile.preferred_categories = vec!["billboard".into()];

        let picks = recommender(Some(profile))
            .top_picks(&UserId::from("u1"), 5)
            .await
            .unwrap();
        let ids: Vec<_> = picks.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["cheap", "mall"]);
        assert!(picks.iter().all(|s| s.personalized_score.is_some()));
    }

    #[tokio::test]
    async fn similar_screens_exclude_seed() {
        let similar = recommender(None)
            .similar_screens(&ScreenId::from("plaza"), &UserId::from("u1"), 5)
            .await
            .unwrap();
        assert!(similar.iter().all(|s| s.id.as_str() != "plaza"));
        assert_eq!(similar[0].id.as_str(), "mall");
    }

    #[tokio::test]
    async fn similar_to_unknown_screen_is_not_found() {
        let err = recommender(None)
            .similar_screens(&ScreenId::from("ghost"), &UserId::from("u1"), 5)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[tokio::test]
    async fn trending_filters_by_location() {
        let trending = recommender(None)
            .trending_screens(Some("medellín"), 5)
            .await
            .unwrap();
        assert_eq!(trending.len(), 1);
        assert_eq!(trending[0].id.as_str(), "mall");
    }
}
