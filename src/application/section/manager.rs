//! Section config registry and per-request resolution.
//!
//! Resolution for a user and location:
//!
//! ```text
//! base configs ──> user variants / custom configs ──> dynamic rules
//!                                                         │
//!                        enabled only, priority desc <────┘
//! ```
//!
//! Results are cached per user and location. Every mutation drops the
//! cached resolutions.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use super::defaults;
use crate::application::cache::domain::{location_key, tags, user_tag};
use crate::application::cache::CacheService;
use crate::application::grouping::GroupingConfig;
use crate::application::recovery::ErrorRecoveryService;
use crate::domain::{
    DynamicSectionRule, RuleContext, RuleId, SectionConfig, SectionEngagement, SectionId,
    SectionPatch, SectionPerformanceMetrics, UserId, UserProfile,
};
use crate::error::{Error, Result};
use crate::port::outbound::UserBehaviorAnalytics;

#[derive(Default)]
struct Registry {
    /// Registration order is the tie-break for equal priorities.
    base: Vec<SectionConfig>,
    /// Per user: variants of base configs (same id) and custom configs.
    user: HashMap<UserId, Vec<SectionConfig>>,
    rules: Vec<DynamicSectionRule>,
}

impl Registry {
    /// Find a config by base id, or by `{id}-{user}` for user configs.
    fn find_mut(&mut self, id: &SectionId) -> Option<&mut SectionConfig> {
        let Self { base, user, .. } = self;
        if let Some(config) = base.iter_mut().find(|c| &c.id == id) {
            return Some(config);
        }
        user.iter_mut()
            .flat_map(|(user_id, configs)| {
                configs
                    .iter_mut()
                    .filter(move |c| &c.id.for_user(user_id) == id)
            })
            .next()
    }
}

/// Owns section configs, dynamic rules, and section engagement history.
pub struct SectionConfigManager {
    settings: GroupingConfig,
    cache: Arc<CacheService>,
    analytics: Arc<dyn UserBehaviorAnalytics>,
    recovery: Arc<ErrorRecoveryService>,
    registry: RwLock<Registry>,
    engagement: Mutex<HashMap<SectionId, VecDeque<SectionEngagement>>>,
}

impl SectionConfigManager {
    /// Create a manager seeded with the default configs.
    pub fn new(
        settings: GroupingConfig,
        cache: Arc<CacheService>,
        analytics: Arc<dyn UserBehaviorAnalytics>,
        recovery: Arc<ErrorRecoveryService>,
    ) -> Self {
        Self::with_configs(settings, cache, analytics, recovery, defaults::default_configs())
    }

    /// Create a manager with an explicit set of base configs.
    pub fn with_configs(
        settings: GroupingConfig,
        cache: Arc<CacheService>,
        analytics: Arc<dyn UserBehaviorAnalytics>,
        recovery: Arc<ErrorRecoveryService>,
        configs: Vec<SectionConfig>,
    ) -> Self {
        Self {
            settings,
            cache,
            analytics,
            recovery,
            registry: RwLock::new(Registry {
                base: configs,
                ..Registry::default()
            }),
            engagement: Mutex::new(HashMap::new()),
        }
    }

    /// Enabled configs for a user and location, highest priority first.
    pub async fn get_section_configs(
        &self,
        user_id: Option<&UserId>,
        location: Option<&str>,
    ) -> Vec<SectionConfig> {
        self.get_section_configs_at(user_id, location, Utc::now())
            .await
    }

    /// [`get_section_configs`](Self::get_section_configs) evaluated at `now`.
    pub async fn get_section_configs_at(
        &self,
        user_id: Option<&UserId>,
        location: Option<&str>,
        now: DateTime<Utc>,
    ) -> Vec<SectionConfig> {
        let key = configs_key(user_id, location);
        let mut entry_tags = vec![tags::SECTION_CONFIGS.to_string()];
        if let Some(user_id) = user_id {
            entry_tags.push(user_tag(user_id));
        }

        let resolved = self
            .cache
            .get_or_compute(&key, self.settings.config_ttl(), &entry_tags, || async move {
                let profile = self.user_profile(user_id).await;
                Ok(self.resolve(&profile, user_id, location, now))
            })
            .await;
        resolved.unwrap_or_default()
    }

    /// Profile for `user_id`, anonymous when absent or unavailable.
    pub async fn user_profile(&self, user_id: Option<&UserId>) -> UserProfile {
        let Some(user_id) = user_id else {
            return UserProfile::anonymous();
        };
        if let Some(profile) = self.cache.user_profile(user_id) {
            return profile;
        }

        match self.analytics.user_profile(user_id).await {
            Ok(profile) => {
                self.cache.cache_user_profile(&profile);
                profile
            }
            Err(e) => {
                self.recovery.record_error(&e);
                warn!(
                    user = %user_id,
                    error = %e,
                    "Profile lookup failed, using anonymous profile"
                );
                self.recovery.fallback_profile()
            }
        }
    }

    fn resolve(
        &self,
        profile: &UserProfile,
        user_id: Option<&UserId>,
        location: Option<&str>,
        now: DateTime<Utc>,
    ) -> Vec<SectionConfig> {
        let registry = self.registry.read();

        let user_configs = user_id
            .and_then(|u| registry.user.get(u))
            .map_or(&[][..], Vec::as_slice);

        let mut configs: Vec<SectionConfig> = registry
            .base
            .iter()
            .map(|base| {
                user_configs
                    .iter()
                    .find(|c| c.id == base.id)
                    .unwrap_or(base)
                    .clone()
            })
            .collect();
        configs.extend(
            user_configs
                .iter()
                .filter(|c| !registry.base.iter().any(|b| b.id == c.id))
                .cloned(),
        );

        if self.settings.dynamic_sections && !registry.rules.is_empty() {
            let ctx = RuleContext {
                profile,
                location,
                now,
            };
            apply_rules(&mut configs, &registry.rules, &ctx);
        }
        drop(registry);

        configs.retain(|c| c.enabled);
        configs.sort_by(|a, b| b.priority.cmp(&a.priority));
        configs
    }

    /// Apply `patch` to a base config or a user config (`{id}-{user}`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown id, or a domain error when
    /// the patch would invert the screen bounds.
    pub fn update_section_config(
        &self,
        section_id: &SectionId,
        patch: &SectionPatch,
    ) -> Result<SectionConfig> {
        let updated = {
            let mut registry = self.registry.write();
            let config = registry
                .find_mut(section_id)
                .ok_or_else(|| Error::NotFound {
                    kind: "section",
                    id: section_id.to_string(),
                })?;
            config.apply(patch)?;
            config.clone()
        };

        info!(section = %section_id, enabled = updated.enabled, "Section config updated");
        self.invalidate();
        Ok(updated)
    }

    /// Enable or disable a section.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown id.
    pub fn toggle_section(&self, section_id: &SectionId, enabled: bool) -> Result<SectionConfig> {
        self.update_section_config(section_id, &SectionPatch::enabled(enabled))
    }

    /// Register a rule, replacing any rule with the same id.
    pub fn add_dynamic_rule(&self, rule: DynamicSectionRule) {
        {
            let mut registry = self.registry.write();
            registry.rules.retain(|r| r.id != rule.id);
            info!(
                rule = %rule.id,
                priority = rule.priority,
                targets = rule.targets.len(),
                "Dynamic rule added"
            );
            registry.rules.push(rule);
        }
        self.invalidate();
    }

    /// Remove a rule. Returns whether it existed.
    pub fn remove_dynamic_rule(&self, rule_id: &RuleId) -> bool {
        let removed = {
            let mut registry = self.registry.write();
            let before = registry.rules.len();
            registry.rules.retain(|r| &r.id != rule_id);
            registry.rules.len() != before
        };
        if removed {
            info!(rule = %rule_id, "Dynamic rule removed");
            self.invalidate();
        }
        removed
    }

    /// Add or replace a base config.
    pub fn register_config(&self, config: SectionConfig) {
        {
            let mut registry = self.registry.write();
            match registry.base.iter_mut().find(|c| c.id == config.id) {
                Some(existing) => *existing = config,
                None => registry.base.push(config),
            }
        }
        self.invalidate();
    }

    /// Add or replace a config for one user.
    ///
    /// A config whose id matches a base config replaces it for that user;
    /// any other id is appended as a custom section.
    pub fn register_user_config(&self, user_id: &UserId, config: SectionConfig) {
        {
            let mut registry = self.registry.write();
            let configs = registry.user.entry(user_id.clone()).or_default();
            match configs.iter_mut().find(|c| c.id == config.id) {
                Some(existing) => *existing = config,
                None => configs.push(config),
            }
        }
        debug!(user = %user_id, "User section config registered");
        self.invalidate();
    }

    #[must_use]
    pub fn section_config(&self, section_id: &SectionId) -> Option<SectionConfig> {
        self.registry
            .read()
            .base
            .iter()
            .find(|c| &c.id == section_id)
            .cloned()
    }

    /// Base configs in registration order, including disabled ones.
    #[must_use]
    pub fn all_configs(&self) -> Vec<SectionConfig> {
        self.registry.read().base.clone()
    }

    #[must_use]
    pub fn rules(&self) -> Vec<DynamicSectionRule> {
        self.registry.read().rules.clone()
    }

    /// Record an engagement event, keeping the most recent ones per section.
    pub fn track_section_engagement(&self, engagement: SectionEngagement) {
        let cap = self.settings.engagement_history.max(1);
        let mut history = self.engagement.lock();
        let events = history.entry(engagement.section_id.clone()).or_default();
        events.push_back(engagement);
        while events.len() > cap {
            events.pop_front();
        }
    }

    #[must_use]
    pub fn section_performance_metrics(&self, section_id: &SectionId) -> SectionPerformanceMetrics {
        let history = self.engagement.lock();
        let events: Vec<SectionEngagement> = history
            .get(section_id)
            .map(|e| e.iter().cloned().collect())
            .unwrap_or_default();
        drop(history);
        SectionPerformanceMetrics::from_events(section_id, &events)
    }

    fn invalidate(&self) {
        let removed = self.cache.invalidate_by_tags(&[tags::SECTION_CONFIGS]);
        if removed > 0 {
            debug!(removed, "Dropped cached section configs");
        }
    }
}

/// Apply matching rules, highest priority first.
///
/// Per target and field, the first rule to set it wins.
fn apply_rules(
    configs: &mut [SectionConfig],
    rules: &[DynamicSectionRule],
    ctx: &RuleContext<'_>,
) {
    let mut ordered: Vec<&DynamicSectionRule> = rules.iter().collect();
    ordered.sort_by(|a, b| b.priority.cmp(&a.priority));

    let mut patches: HashMap<&SectionId, SectionPatch> = HashMap::new();
    for rule in ordered.into_iter().filter(|r| r.condition.evaluate(ctx)) {
        let patch = rule.action.to_patch();
        for target in &rule.targets {
            patches.entry(target).or_default().fill_from(&patch);
        }
    }

    for config in configs.iter_mut() {
        let Some(patch) = patches.get(&config.id) else {
            continue;
        };
        if let Err(e) = config.apply(patch) {
            warn!(section = %config.id, error = %e, "Rule patch rejected");
        }
    }
}

fn configs_key(user_id: Option<&UserId>, location: Option<&str>) -> String {
    format!(
        "section-configs:{}:{}",
        user_id.map_or("anonymous", UserId::as_str),
        location_key(location)
    )
}
