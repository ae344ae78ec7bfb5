//! Section generation pipeline.
//!
//! ```text
//! options ──> cached result? ──yes──> return
//!                  │ no
//!                  v
//!      per-key write lock, cached result? ──yes──> return
//!                  │ no
//!                  v
//!      SectionConfigManager::get_section_configs
//!                  │  (conditions checked against the profile)
//!                  v
//!      SectionGenerator::generate   (all sections concurrently)
//!                  │  (failed sections dropped, missing metrics attached)
//!                  v
//!      DeduplicationEngine::process_deduplication (catalog as backfill pool)
//!                  │
//!                  v
//!      drop empty, truncate, cache, return
//! ```
//!
//! Every stage checks the request's [`CancellationToken`]; a cancelled
//! request stops at the next stage boundary or mid-generation.

use std::sync::Arc;
use std::time::Instant;

use futures_util::future::join_all;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::config::GroupingConfig;
use super::generator::{Collaborators, GenerationContext, SectionGenerator};
use super::result::{duration_ms, GenerationOptions, GroupingAnalytics, GroupingResult};
use crate::application::cache::domain::{location_key, location_tag, tags, user_tag};
use crate::application::cache::{CacheHandle, CacheService};
use crate::application::dedup::DeduplicationEngine;
use crate::application::recovery::{rank_by_popularity, ErrorRecoveryService};
use crate::application::section::SectionConfigManager;
use crate::domain::score::confidence_from_score;
use crate::domain::{
    DynamicSectionRule, EnhancedScreen, MarketInsights, PerformanceMetrics, RuleId, ScreenId,
    Section, SectionConfig, SectionEngagement, SectionId, SectionPatch,
    SectionPerformanceMetrics, UserContext, UserId, UserInteraction,
};
use crate::error::{Error, Result};
use crate::port::outbound::ScreenCatalog;

/// Groups screens into deduplicated, prioritized sections.
pub struct GroupingEngine {
    config: GroupingConfig,
    cache: Arc<CacheService>,
    recovery: Arc<ErrorRecoveryService>,
    sections: Arc<SectionConfigManager>,
    generator: SectionGenerator,
    dedup: DeduplicationEngine,
    catalog: Arc<dyn ScreenCatalog>,
    shutdown: CancellationToken,
    background: Mutex<Option<CacheHandle>>,
}

impl GroupingEngine {
    pub fn new(
        config: GroupingConfig,
        cache: Arc<CacheService>,
        recovery: Arc<ErrorRecoveryService>,
        sections: Arc<SectionConfigManager>,
        services: Collaborators,
    ) -> Self {
        let catalog = Arc::clone(&services.catalog);
        let generator = SectionGenerator::new(services, Arc::clone(&cache), Arc::clone(&recovery));
        Self {
            config,
            cache,
            recovery,
            sections,
            generator,
            dedup: DeduplicationEngine::default(),
            catalog,
            shutdown: CancellationToken::new(),
            background: Mutex::new(None),
        }
    }

    /// Start the cache's background sweep and refresh tasks.
    ///
    /// Calling this more than once has no further effect.
    pub fn start(&self) {
        let mut background = self.background.lock();
        if background.is_none() {
            *background = Some(self.cache.start());
        }
    }

    #[must_use]
    pub const fn cache(&self) -> &Arc<CacheService> {
        &self.cache
    }

    #[must_use]
    pub const fn recovery(&self) -> &Arc<ErrorRecoveryService> {
        &self.recovery
    }

    #[must_use]
    pub const fn sections(&self) -> &Arc<SectionConfigManager> {
        &self.sections
    }

    /// Generate sections for a user and location.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cancelled`] if the engine is shut down mid-request.
    pub async fn generate_sections(&self, options: GenerationOptions) -> Result<GroupingResult> {
        self.generate_sections_with_cancel(options, self.shutdown.child_token())
            .await
    }

    /// Generate sections, abandoning the request once `cancel` fires.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cancelled`] when `cancel` or the engine's shutdown
    /// fires before the result is ready.
    pub async fn generate_sections_with_cancel(
        &self,
        options: GenerationOptions,
        cancel: CancellationToken,
    ) -> Result<GroupingResult> {
        let started = Instant::now();
        let user_id = options.user_id.as_ref();
        let location = options
            .location
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty());
        let max_sections = options.max_sections.unwrap_or(self.config.max_sections);
        let key = sections_key(user_id, location, max_sections);

        if !options.force_refresh {
            if let Some(cached) = self.cached_result(&key, started) {
                return Ok(cached);
            }
        }

        // Held until the result is stored so concurrent requests for the
        // same key run the pipeline once.
        let _writer = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(Error::Cancelled),
            guard = self.cache.lock_key(&key) => guard,
        };
        if !options.force_refresh {
            if let Some(cached) = self.cached_result(&key, started) {
                return Ok(cached);
            }
        }

        ensure_live(&cancel, self)?;
        let mut fallback_used = false;
        let mut errors = Vec::new();

        let mut configs = self.sections.get_section_configs(user_id, location).await;
        if configs.is_empty() {
            warn!("No section configs resolved, using fallback configs");
            configs = self.recovery.fallback_section_configs();
            fallback_used = true;
        }

        let profile = self.sections.user_profile(user_id).await;
        let eligible: Vec<SectionConfig> = configs
            .into_iter()
            .filter(|c| c.conditions.is_satisfied_by(&profile))
            .collect();
        ensure_live(&cancel, self)?;

        let ctx = GenerationContext {
            user_id: options.user_id.clone(),
            location: location.map(str::to_string),
            profile,
        };
        let user_context = UserContext {
            user_id: options.user_id.clone(),
            location: ctx.location.clone(),
        };

        let generation = join_all(eligible.iter().map(|config| {
            let ctx = &ctx;
            async move { (config, self.generator.generate(config, ctx).await) }
        }));
        let outcomes = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                info!("Section generation cancelled");
                return Err(Error::Cancelled);
            }
            outcomes = generation => outcomes,
        };

        let mut generated = Vec::with_capacity(outcomes.len());
        for (config, outcome) in outcomes {
            match outcome {
                Ok(mut candidates) => {
                    fallback_used |= candidates.fallback.is_some();
                    candidates.screens.truncate(config.max_screens);
                    generated.push(
                        Section::from_config(config, user_context.clone())
                            .with_screens(candidates.screens),
                    );
                }
                Err(e) => {
                    self.recovery.record_error(&e);
                    warn!(
                        section = %config.id,
                        error = %e,
                        "Section generation failed, dropping section"
                    );
                }
            }
        }
        self.generator.attach_metrics(&mut generated).await;
        ensure_live(&cancel, self)?;

        let pool = match self.backfill_pool(location).await {
            Ok(pool) => pool,
            Err(e) => {
                self.recovery.record_error(&e);
                warn!(error = %e, "Backfill pool unavailable");
                errors.push(format!("backfill pool unavailable: {e}"));
                Vec::new()
            }
        };

        let deduped = self.dedup.process_deduplication(generated, &pool);
        let mut sections: Vec<Section> = deduped
            .sections
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect();
        sections.truncate(max_sections);
        for section in &mut sections {
            section.metadata.confidence = self.section_confidence(section);
        }

        let analytics = GroupingAnalytics::summarize(&sections, &deduped.stats);
        let result = GroupingResult {
            sections,
            analytics,
            fallback_used,
            processing_time_ms: duration_ms(started.elapsed()),
            cache_hit: false,
            errors,
        };

        if result.fallback_used {
            debug!("Not caching a result built from fallbacks");
        } else {
            let mut entry_tags = vec![tags::SECTIONS.to_string()];
            if let Some(user_id) = user_id {
                entry_tags.push(user_tag(user_id));
            }
            if let Some(location) = location {
                entry_tags.push(location_tag(location));
            }
            self.cache
                .set_tagged(key, &result, self.config.sections_ttl(), entry_tags);
        }

        info!(
            request = %result.analytics.request_id,
            user = user_id.map_or("anonymous", UserId::as_str),
            sections = result.sections.len(),
            screens = result.total_screens(),
            duplicates_removed = result.analytics.duplicates_removed,
            backfilled = result.analytics.backfills_applied,
            fallback_used = result.fallback_used,
            elapsed_ms = result.processing_time_ms,
            "Generated sections"
        );
        Ok(result)
    }

    /// Drop everything cached for `user_id` and regenerate.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cancelled`] if the engine shuts down meanwhile.
    pub async fn refresh_sections(&self, user_id: &UserId) -> Result<GroupingResult> {
        let removed = self.cache.invalidate_by_tags(&[user_tag(user_id)]);
        debug!(user = %user_id, removed, "Invalidated user cache for refresh");
        self.generate_sections(GenerationOptions::for_user(user_id.clone()).force_refresh())
            .await
    }

    pub fn track_section_engagement(&self, engagement: SectionEngagement) {
        self.sections.track_section_engagement(engagement);
    }

    #[must_use]
    pub fn section_performance_metrics(&self, section_id: &SectionId) -> SectionPerformanceMetrics {
        self.sections.section_performance_metrics(section_id)
    }

    /// Patch a section config and drop cached sections.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown section, or a domain error
    /// for a patch that inverts the screen bounds.
    pub fn update_section_config(
        &self,
        section_id: &SectionId,
        patch: &SectionPatch,
    ) -> Result<SectionConfig> {
        let updated = self.sections.update_section_config(section_id, patch)?;
        self.invalidate_sections();
        Ok(updated)
    }

    /// Enable or disable a section and drop cached sections.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown section.
    pub fn toggle_section(&self, section_id: &SectionId, enabled: bool) -> Result<SectionConfig> {
        let updated = self.sections.toggle_section(section_id, enabled)?;
        self.invalidate_sections();
        Ok(updated)
    }

    pub fn add_dynamic_rule(&self, rule: DynamicSectionRule) {
        self.sections.add_dynamic_rule(rule);
        self.invalidate_sections();
    }

    pub fn remove_dynamic_rule(&self, rule_id: &RuleId) -> bool {
        let removed = self.sections.remove_dynamic_rule(rule_id);
        if removed {
            self.invalidate_sections();
        }
        removed
    }

    /// Invalidate caches affected by an interaction without waiting.
    ///
    /// The returned handle resolves to the number of entries removed.
    pub fn record_interaction(&self, interaction: UserInteraction) -> JoinHandle<usize> {
        let cache = Arc::clone(&self.cache);
        tokio::spawn(async move { cache.invalidate_on_user_interaction(&interaction) })
    }

    /// Cancel in-flight requests and stop background tasks.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        let handle = self.background.lock().take();
        if let Some(handle) = handle {
            handle.shutdown().await;
        }
        info!("Grouping engine shut down");
    }

    /// Market insights for a location, empty when market data is down.
    pub async fn market_insights(&self, location: Option<&str>) -> MarketInsights {
        self.generator.market_insights(location).await
    }

    /// Performance metrics for one screen, if the market data service has any.
    pub async fn screen_performance_metrics(
        &self,
        screen_id: &ScreenId,
    ) -> Option<PerformanceMetrics> {
        self.generator.screen_metrics(screen_id).await
    }

    fn cached_result(&self, key: &str, started: Instant) -> Option<GroupingResult> {
        let mut cached = self.cache.get::<GroupingResult>(key)?;
        cached.cache_hit = true;
        cached.processing_time_ms = duration_ms(started.elapsed());
        debug!(key = %key, "Serving cached sections");
        Some(cached)
    }

    async fn backfill_pool(&self, location: Option<&str>) -> Result<Vec<EnhancedScreen>> {
        let catalog = self.catalog.all_screens().await?;
        let mut pool = rank_by_popularity(&catalog, location, catalog.len());
        if pool.is_empty() && location.is_some() {
            pool = rank_by_popularity(&catalog, None, catalog.len());
        }
        Ok(pool)
    }

    /// Mean confidence of the section's screens, 0 when empty.
    fn section_confidence(&self, section: &Section) -> f64 {
        if section.is_empty() {
            return 0.0;
        }
        let scorer = self.dedup.scorer();
        let total: f64 = section
            .screens
            .iter()
            .map(|s| confidence_from_score(scorer.score(s, &section.id)))
            .sum();
        total / section.len() as f64
    }

    fn invalidate_sections(&self) {
        let removed = self.cache.invalidate_by_tags(&[tags::SECTIONS]);
        debug!(removed, "Dropped cached sections");
    }
}

fn ensure_live(cancel: &CancellationToken, engine: &GroupingEngine) -> Result<()> {
    if cancel.is_cancelled() || engine.shutdown.is_cancelled() {
        return Err(Error::Cancelled);
    }
    Ok(())
}

fn sections_key(user_id: Option<&UserId>, location: Option<&str>, max_sections: usize) -> String {
    format!(
        "sections:{}:{}:{max_sections}",
        user_id.map_or("anonymous", UserId::as_str),
        location_key(location)
    )
}
