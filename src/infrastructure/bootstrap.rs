//! Composition root: builds the grouping engine graph from configuration.

use std::sync::Arc;

use tracing::{info, warn};

use crate::adapter::outbound::memory::{
    CatalogMarketData, CatalogRecommender, InMemoryBehaviorAnalytics, StaticCatalog,
};
use crate::application::cache::CacheService;
use crate::application::grouping::{Collaborators, GroupingEngine};
use crate::application::recovery::ErrorRecoveryService;
use crate::application::section::SectionConfigManager;
use crate::error::Result;
use crate::infrastructure::config::settings::Config;
use crate::port::outbound::{ScreenCatalog, UserBehaviorAnalytics};

/// The wired engine plus the adapters callers may want to feed directly.
pub struct Components {
    pub engine: Arc<GroupingEngine>,
    pub analytics: Arc<InMemoryBehaviorAnalytics>,
    pub catalog: Arc<StaticCatalog>,
}

/// Load the catalog named by the config; no path means an empty catalog.
pub fn load_catalog(config: &Config) -> Result<StaticCatalog> {
    match &config.catalog.path {
        Some(path) => StaticCatalog::load(path),
        None => {
            warn!("No catalog path configured, starting with an empty catalog");
            Ok(StaticCatalog::default())
        }
    }
}

/// Build the engine over the catalog named by the config.
pub fn build(config: &Config) -> Result<Components> {
    let catalog = load_catalog(config)?;
    Ok(build_with_catalog(config, catalog))
}

/// Build the engine over an already loaded catalog.
pub fn build_with_catalog(config: &Config, catalog: StaticCatalog) -> Components {
    let catalog = Arc::new(catalog);
    let analytics = Arc::new(InMemoryBehaviorAnalytics::new());
    let cache = Arc::new(CacheService::new(config.cache.clone()));

    let catalog_port: Arc<dyn ScreenCatalog> = catalog.clone();
    let analytics_port: Arc<dyn UserBehaviorAnalytics> = analytics.clone();

    let recovery = Arc::new(ErrorRecoveryService::new(
        config.recovery.clone(),
        Arc::clone(&cache),
        Arc::clone(&catalog_port),
    ));
    let sections = Arc::new(SectionConfigManager::new(
        config.grouping.clone(),
        Arc::clone(&cache),
        Arc::clone(&analytics_port),
        Arc::clone(&recovery),
    ));
    let services = Collaborators {
        recommendations: Arc::new(CatalogRecommender::new(
            Arc::clone(&catalog_port),
            analytics_port,
        )),
        market: Arc::new(CatalogMarketData::new(Arc::clone(&catalog_port))),
        catalog: catalog_port,
    };

    let engine = Arc::new(GroupingEngine::new(
        config.grouping.clone(),
        cache,
        recovery,
        sections,
        services,
    ));
    info!(
        screens = catalog.len(),
        max_sections = config.grouping.max_sections,
        "Grouping engine ready"
    );

    Components {
        engine,
        analytics,
        catalog,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::grouping::GenerationOptions;
    use crate::testkit::domain::raw_screen;

    #[tokio::test]
    async fn built_engine_generates_from_catalog() {
        let catalog = StaticCatalog::new(
            (0..12)
                .map(|i| raw_screen(&format!("s{i}"), "Bogotá", 4.0, 100 * (i + 1)))
                .collect(),
        );
        let components = build_with_catalog(&Config::default(), catalog);
        let result = components
            .engine
            .generate_sections(GenerationOptions::default().at_location("Bogotá"))
            .await
            .unwrap();
        assert!(!result.sections.is_empty());
        assert!(!result.fallback_used);
    }

    #[test]
    fn missing_catalog_file_is_an_error() {
        let mut config = Config::default();
        config.catalog.path = Some("/nonexistent/screens.json".into());
        assert!(build(&config).is_err());
    }
}
