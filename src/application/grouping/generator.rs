//! Per-algorithm screen generation.
//!
//! Upstream-backed algorithms go through [`ErrorRecoveryService`]: retried
//! on failure, and replaced by a fallback when retries run out or the
//! upstream returns nothing. History-backed algorithms read the user's
//! profile against the catalog and have no fallback, since an empty history
//! is a legitimate answer.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;

use futures_util::future::join_all;
use tracing::{debug, trace};

use crate::application::cache::CacheService;
use crate::application::recovery::{rank_by_popularity, ErrorRecoveryService, FallbackTier};
use crate::domain::{
    AlgorithmType, EnhancedScreen, MarketInsights, PerformanceMetrics, ScreenId, Section,
    SectionConfig, TrendingScreen, UserId, UserProfile,
};
use crate::error::{Error, Result};
use crate::port::outbound::{MarketDataService, RecommendationService, ScreenCatalog};

/// Market trend window for the trending section.
const TRENDING_TIMEFRAME_DAYS: u32 = 7;
/// Market trend window for the "others are booking" section.
const VELOCITY_TIMEFRAME_DAYS: u32 = 1;
/// History entries used as seeds for similarity lookups.
const SIMILARITY_SEEDS: usize = 3;

/// Collaborators consulted during generation.
#[derive(Clone)]
pub struct Collaborators {
    pub recommendations: Arc<dyn RecommendationService>,
    pub market: Arc<dyn MarketDataService>,
    pub catalog: Arc<dyn ScreenCatalog>,
}

/// Per-request inputs shared by every section.
#[derive(Debug, Clone)]
pub struct GenerationContext {
    pub user_id: Option<UserId>,
    pub location: Option<String>,
    pub profile: UserProfile,
}

impl GenerationContext {
    /// Requested location, else the user's first preferred location.
    fn effective_location(&self) -> Option<&str> {
        self.location
            .as_deref()
            .filter(|l| !l.trim().is_empty())
            .or_else(|| self.profile.preferred_locations.first().map(String::as_str))
    }
}

/// Screens generated for one section.
#[derive(Debug, Clone, Default)]
pub struct Generated {
    pub screens: Vec<EnhancedScreen>,
    /// Set when a fallback tier supplied the screens.
    pub fallback: Option<FallbackTier>,
}

impl Generated {
    fn direct(screens: Vec<EnhancedScreen>) -> Self {
        Self {
            screens,
            fallback: None,
        }
    }
}

/// Produces candidate screens for a section config.
pub struct SectionGenerator {
    services: Collaborators,
    cache: Arc<CacheService>,
    recovery: Arc<ErrorRecoveryService>,
}

impl SectionGenerator {
    pub fn new(
        services: Collaborators,
        cache: Arc<CacheService>,
        recovery: Arc<ErrorRecoveryService>,
    ) -> Self {
        Self {
            services,
            cache,
            recovery,
        }
    }

    /// Generate up to `config.max_screens` candidates for `config`.
    ///
    /// # Errors
    ///
    /// Returns an error when a history-backed lookup fails or when an
    /// upstream call and its fallback both fail.
    pub async fn generate(
        &self,
        config: &SectionConfig,
        ctx: &GenerationContext,
    ) -> Result<Generated> {
        let limit = config.max_screens;
        if limit == 0 {
            return Ok(Generated::default());
        }
        if config.algorithm.needs_user() && ctx.user_id.is_none() {
            trace!(section = %config.id, "Skipping personalized section for anonymous user");
            return Ok(Generated::default());
        }

        let generated = match config.algorithm {
            AlgorithmType::MlPersonalized => self.top_picks(ctx, limit).await?,
            AlgorithmType::TrendingAnalysis => self.trending(ctx, limit).await?,
            AlgorithmType::GeographicPopularity => self.near_you(ctx, limit).await?,
            AlgorithmType::RecentActivity => {
                Generated::direct(self.from_history(&ctx.profile.recently_viewed, limit).await?)
            }
            AlgorithmType::PurchaseHistory => {
                Generated::direct(self.from_history(&ctx.profile.purchased, limit).await?)
            }
            AlgorithmType::NewDiscovery => self.new_discoveries(ctx, limit).await?,
            AlgorithmType::CollaborativeFiltering => {
                self.similar_to(ctx, &ctx.profile.purchased, "similar-users", limit)
                    .await?
            }
            AlgorithmType::ContentBased => {
                self.similar_to(ctx, &ctx.profile.recently_viewed, "because-you-viewed", limit)
                    .await?
            }
            AlgorithmType::FallbackPopular => self.popular(ctx, limit).await?,
            AlgorithmType::OtherUsersBuying => self.others_buying(ctx, limit).await?,
        };

        debug!(
            section = %config.id,
            algorithm = %config.algorithm,
            screens = generated.screens.len(),
            fallback = ?generated.fallback,
            "Generated section candidates"
        );
        Ok(generated)
    }

    async fn top_picks(&self, ctx: &GenerationContext, limit: usize) -> Result<Generated> {
        let Some(user_id) = &ctx.user_id else {
            return Ok(Generated::default());
        };
        if let Some(cached) = self.cache.user_recommendations(user_id, "top-picks") {
            return Ok(Generated::direct(truncate(cached, limit)));
        }

        let generated = self
            .with_recovery("top-picks", ctx.effective_location(), limit, || {
                self.services.recommendations.top_picks(user_id, limit)
            })
            .await?;
        if generated.fallback.is_none() {
            self.cache
                .cache_user_recommendations(user_id, "top-picks", &generated.screens);
        }
        Ok(generated)
    }

    async fn new_discoveries(&self, ctx: &GenerationContext, limit: usize) -> Result<Generated> {
        let Some(user_id) = &ctx.user_id else {
            return Ok(Generated::default());
        };
        let mut generated = self
            .with_recovery("new-discoveries", ctx.effective_location(), limit, || {
                self.services.recommendations.new_discoveries(user_id, limit)
            })
            .await?;

        let seen: HashSet<&ScreenId> = ctx
            .profile
            .recently_viewed
            .iter()
            .chain(&ctx.profile.purchased)
            .collect();
        generated.screens.retain(|s| !seen.contains(&s.id));
        Ok(generated)
    }

    async fn trending(&self, ctx: &GenerationContext, limit: usize) -> Result<Generated> {
        let location = ctx.location.as_deref();
        let mut generated = self
            .with_recovery("trending", location, limit, || async move {
                let trending = self.market_trending(location, TRENDING_TIMEFRAME_DAYS).await?;
                Ok(trending.into_iter().map(TrendingScreen::into_scored).collect())
            })
            .await?;

        generated.screens.sort_by(|a, b| {
            b.trending_score
                .unwrap_or(0.0)
                .total_cmp(&a.trending_score.unwrap_or(0.0))
        });
        generated.screens.truncate(limit);
        Ok(generated)
    }

    async fn others_buying(&self, ctx: &GenerationContext, limit: usize) -> Result<Generated> {
        let location = ctx.location.as_deref();
        self.with_recovery("others-buying", location, limit, || async move {
            let mut trending = self.market_trending(location, VELOCITY_TIMEFRAME_DAYS).await?;
            trending.retain(|t| t.purchase_velocity > 0.0);
            trending.sort_by(|a, b| b.purchase_velocity.total_cmp(&a.purchase_velocity));
            Ok(trending
                .into_iter()
                .take(limit)
                .map(TrendingScreen::into_scored)
                .collect())
        })
        .await
    }

    async fn near_you(&self, ctx: &GenerationContext, limit: usize) -> Result<Generated> {
        let Some(location) = ctx.effective_location() else {
            trace!("No location for geographic section");
            return Ok(Generated::default());
        };
        self.with_recovery("near-you", Some(location), limit, || async move {
            let catalog = self.services.catalog.all_screens().await?;
            Ok(rank_by_popularity(&catalog, Some(location), limit))
        })
        .await
    }

    async fn popular(&self, ctx: &GenerationContext, limit: usize) -> Result<Generated> {
        let catalog = self.services.catalog.all_screens().await?;
        let mut screens = rank_by_popularity(&catalog, ctx.location.as_deref(), limit);
        if screens.is_empty() {
            screens = rank_by_popularity(&catalog, None, limit);
        }
        Ok(Generated::direct(screens))
    }

    /// Catalog screens for history ids, in history order.
    async fn from_history(
        &self,
        history: &[ScreenId],
        limit: usize,
    ) -> Result<Vec<EnhancedScreen>> {
        if history.is_empty() {
            return Ok(Vec::new());
        }
        let catalog = self.services.catalog.all_screens().await?;
        let by_id: HashMap<&ScreenId, _> = catalog.iter().map(|s| (&s.id, s)).collect();

        let mut seen = HashSet::new();
        Ok(history
            .iter()
            .filter(|id| seen.insert(*id))
            .filter_map(|id| by_id.get(id).map(|s| EnhancedScreen::from_catalog(s)))
            .take(limit)
            .collect())
    }

    /// Screens similar to the first few history entries, excluding the history.
    async fn similar_to(
        &self,
        ctx: &GenerationContext,
        seeds: &[ScreenId],
        kind: &str,
        limit: usize,
    ) -> Result<Generated> {
        let Some(user_id) = &ctx.user_id else {
            return Ok(Generated::default());
        };
        if seeds.is_empty() {
            return Ok(Generated::default());
        }

        let seeds = &seeds[..seeds.len().min(SIMILARITY_SEEDS)];
        let mut generated = self
            .with_recovery(kind, ctx.effective_location(), limit, || async move {
                let mut merged = Vec::new();
                for seed in seeds {
                    merged.extend(
                        self.services
                            .recommendations
                            .similar_screens(seed, user_id, limit)
                            .await?,
                    );
                }
                Ok(merged)
            })
            .await?;

        let mut seen: HashSet<ScreenId> = seeds.iter().cloned().collect();
        generated.screens.retain(|s| seen.insert(s.id.clone()));
        generated.screens.sort_by(|a, b| {
            b.recommendation_score
                .unwrap_or(0.0)
                .total_cmp(&a.recommendation_score.unwrap_or(0.0))
        });
        generated.screens.truncate(limit);
        Ok(generated)
    }

    /// Performance metrics for a screen, from cache or the market data service.
    pub async fn screen_metrics(&self, screen_id: &ScreenId) -> Option<PerformanceMetrics> {
        if let Some(cached) = self.cache.screen_metrics(screen_id) {
            return Some(cached);
        }
        match self.services.market.screen_performance(screen_id).await {
            Ok(metrics) => {
                self.cache.cache_screen_metrics(screen_id, &metrics);
                Some(metrics)
            }
            Err(Error::NotFound { .. }) => None,
            Err(e) => {
                self.recovery.record_error(&e);
                debug!(screen = %screen_id, error = %e, "Screen metrics unavailable");
                None
            }
        }
    }

    /// Attach metrics to screens that arrived without any.
    ///
    /// Each distinct screen is looked up once; lookups run concurrently.
    pub async fn attach_metrics(&self, sections: &mut [Section]) {
        let missing: HashSet<ScreenId> = sections
            .iter()
            .flat_map(|s| &s.screens)
            .filter(|s| s.performance_metrics.is_none())
            .map(|s| s.id.clone())
            .collect();
        if missing.is_empty() {
            return;
        }

        let fetched: HashMap<ScreenId, PerformanceMetrics> =
            join_all(missing.into_iter().map(|id| async move {
                let metrics = self.screen_metrics(&id).await;
                (id, metrics)
            }))
            .await
            .into_iter()
            .filter_map(|(id, metrics)| metrics.map(|m| (id, m)))
            .collect();

        for screen in sections.iter_mut().flat_map(|s| s.screens.iter_mut()) {
            if screen.performance_metrics.is_none() {
                screen.performance_metrics = fetched.get(&screen.id).cloned();
            }
        }
    }

    /// Market insights for a location.
    ///
    /// Retried like any upstream call; once retries run out the empty
    /// fallback insights are returned and nothing is cached.
    pub async fn market_insights(&self, location: Option<&str>) -> MarketInsights {
        if let Some(cached) = self.cache.market_insights(location) {
            return cached;
        }
        let fetched = self
            .recovery
            .execute_with_retry(
                || async move { self.services.market.market_insights(location).await.map(Some) },
                || async { Ok(None) },
                "market-insights",
            )
            .await;

        match fetched {
            Ok(Some(insights)) => {
                self.cache.cache_market_insights(location, &insights);
                insights
            }
            Ok(None) | Err(_) => self.recovery.fallback_insights(location),
        }
    }

    async fn market_trending(
        &self,
        location: Option<&str>,
        timeframe_days: u32,
    ) -> Result<Vec<TrendingScreen>> {
        if let Some(cached) = self.cache.trending(location, timeframe_days) {
            return Ok(cached);
        }
        let trending = self
            .services
            .market
            .trending_screens(location, timeframe_days)
            .await?;
        self.cache.cache_trending(location, timeframe_days, &trending);
        Ok(trending)
    }

    /// Run an upstream fetch with retries, falling back when it fails or
    /// comes back empty. Successful non-empty results become the cached
    /// fallback for `kind`.
    async fn with_recovery<F, Fut>(
        &self,
        kind: &str,
        location: Option<&str>,
        limit: usize,
        mut fetch: F,
    ) -> Result<Generated>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Vec<EnhancedScreen>>>,
    {
        let (screens, tier) = self
            .recovery
            .execute_with_retry(
                || {
                    let attempt = fetch();
                    async move { attempt.await.map(|screens| (screens, None)) }
                },
                move || async move {
                    let fallback = self.recovery.fallback_screens(kind, location, limit).await;
                    Ok((fallback.value, Some(fallback.tier)))
                },
                kind,
            )
            .await?;

        if tier.is_some() {
            return Ok(Generated {
                screens,
                fallback: tier,
            });
        }

        if screens.is_empty() {
            debug!(kind, "Upstream returned nothing, using fallback");
            let fallback = self.recovery.fallback_screens(kind, location, limit).await;
            return Ok(Generated {
                screens: fallback.value,
                fallback: Some(fallback.tier),
            });
        }

        self.recovery.record_success(kind, location, &screens);
        Ok(Generated::direct(screens))
    }
}

fn truncate(mut screens: Vec<EnhancedScreen>, limit: usize) -> Vec<EnhancedScreen> {
    screens.truncate(limit);
    screens
}
