//! A wired grouping engine over in-memory collaborators.
//!
//! Defaults mirror production wiring (catalog-backed recommender and market
//! data) with zero retry delay. Any collaborator can be swapped for a double
//! from [`services`](super::services).

use std::sync::Arc;

use crate::adapter::outbound::memory::{
    CatalogMarketData, CatalogRecommender, InMemoryBehaviorAnalytics, StaticCatalog,
};
use crate::application::cache::{CacheConfig, CacheService};
use crate::application::grouping::{Collaborators, GroupingConfig, GroupingEngine};
use crate::application::recovery::{ErrorRecoveryService, RecoveryConfig};
use crate::application::section::{defaults, SectionConfigManager};
use crate::domain::{Screen, SectionConfig, UserProfile};
use crate::port::outbound::{
    MarketDataService, RecommendationService, ScreenCatalog, UserBehaviorAnalytics,
};

use super::config::fast_recovery;
use super::domain::profile;

/// Engine plus handles to its shared parts.
pub struct EngineFixture {
    pub engine: GroupingEngine,
    pub cache: Arc<CacheService>,
    pub recovery: Arc<ErrorRecoveryService>,
    pub sections: Arc<SectionConfigManager>,
    pub analytics: Arc<InMemoryBehaviorAnalytics>,
}

impl EngineFixture {
    /// Default wiring over `screens`.
    pub fn new(screens: Vec<Screen>) -> Self {
        Self::builder(screens).build()
    }

    pub fn builder(screens: Vec<Screen>) -> EngineFixtureBuilder {
        EngineFixtureBuilder {
            screens,
            recommender: None,
            market: None,
            catalog: None,
            profiles: None,
            users: Vec::new(),
            configs: None,
            cache: CacheConfig::default(),
            grouping: GroupingConfig::default(),
            recovery: fast_recovery(),
        }
    }
}

pub struct EngineFixtureBuilder {
    screens: Vec<Screen>,
    recommender: Option<Arc<dyn RecommendationService>>,
    market: Option<Arc<dyn MarketDataService>>,
    catalog: Option<Arc<dyn ScreenCatalog>>,
    profiles: Option<Arc<dyn UserBehaviorAnalytics>>,
    users: Vec<UserProfile>,
    configs: Option<Vec<SectionConfig>>,
    cache: CacheConfig,
    grouping: GroupingConfig,
    recovery: RecoveryConfig,
}

impl EngineFixtureBuilder {
    pub fn recommender(mut self, recommender: impl RecommendationService + 'static) -> Self {
        self.recommender = Some(Arc::new(recommender));
        self
    }

    pub fn market(mut self, market: impl MarketDataService + 'static) -> Self {
        self.market = Some(Arc::new(market));
        self
    }

    /// Replace the catalog used by every collaborator.
    pub fn catalog(mut self, catalog: impl ScreenCatalog + 'static) -> Self {
        self.catalog = Some(Arc::new(catalog));
        self
    }

    /// Replace the profile source used by the section manager.
    pub fn profiles(mut self, profiles: impl UserBehaviorAnalytics + 'static) -> Self {
        self.profiles = Some(Arc::new(profiles));
        self
    }

    /// Register a user with the given interaction and purchase counts.
    pub fn user(mut self, id: &str, interactions: u32, purchases: u32) -> Self {
        self.users.push(profile(id, interactions, purchases));
        self
    }

    pub fn user_profile(mut self, profile: UserProfile) -> Self {
        self.users.push(profile);
        self
    }

    /// Seed the section manager with `configs` instead of the defaults.
    pub fn configs(mut self, configs: Vec<SectionConfig>) -> Self {
        self.configs = Some(configs);
        self
    }

    pub fn cache_config(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }

    pub fn grouping(mut self, grouping: GroupingConfig) -> Self {
        self.grouping = grouping;
        self
    }

    pub fn recovery(mut self, recovery: RecoveryConfig) -> Self {
        self.recovery = recovery;
        self
    }

    pub fn build(self) -> EngineFixture {
        let analytics = Arc::new(InMemoryBehaviorAnalytics::new());
        for user in self.users {
            analytics.insert(user);
        }
        let analytics_port: Arc<dyn UserBehaviorAnalytics> = analytics.clone();
        let profiles = self.profiles.unwrap_or_else(|| Arc::clone(&analytics_port));

        let catalog: Arc<dyn ScreenCatalog> = self
            .catalog
            .unwrap_or_else(|| Arc::new(StaticCatalog::new(self.screens)));
        let recommendations = self.recommender.unwrap_or_else(|| {
            Arc::new(CatalogRecommender::new(
                Arc::clone(&catalog),
                Arc::clone(&analytics_port),
            ))
        });
        let market = self
            .market
            .unwrap_or_else(|| Arc::new(CatalogMarketData::new(Arc::clone(&catalog))));

        let cache = Arc::new(CacheService::new(self.cache));
        let recovery = Arc::new(ErrorRecoveryService::new(
            self.recovery,
            Arc::clone(&cache),
            Arc::clone(&catalog),
        ));
        let sections = Arc::new(SectionConfigManager::with_configs(
            self.grouping.clone(),
            Arc::clone(&cache),
            profiles,
            Arc::clone(&recovery),
            self.configs.unwrap_or_else(defaults::default_configs),
        ));
        let engine = GroupingEngine::new(
            self.grouping,
            Arc::clone(&cache),
            Arc::clone(&recovery),
            Arc::clone(&sections),
            Collaborators {
                recommendations,
                market,
                catalog,
            },
        );

        EngineFixture {
            engine,
            cache,
            recovery,
            sections,
            analytics,
        }
    }
}
