//! Retry and fallback orchestration.
//!
//! When an upstream source fails or comes back empty, substitutes are tried
//! in order:
//!
//! 1. **Cached**: the last successful result for the same kind and location
//! 2. **Rule-based**: the catalog ranked by [`Screen::popularity_score`]
//! 3. **Static**: an empty result, which never fails

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::application::cache::domain::{location_key, location_tag, tags};
use crate::application::cache::CacheService;
use crate::application::section::defaults;
use crate::domain::{EnhancedScreen, MarketInsights, Screen, SectionConfig, UserProfile};
use crate::error::{Error, ErrorKind, Result};
use crate::port::outbound::ScreenCatalog;

/// Retry and fallback tunables.
#[derive(Debug, Clone, Deserialize)]
pub struct RecoveryConfig {
    /// Attempts before giving up on an operation.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Base delay; attempt `n` is followed by `n * retry_delay_ms`.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// How long a successful result stays usable as a cached fallback.
    #[serde(default = "default_fallback_ttl_secs")]
    pub fallback_ttl_secs: u64,
}

const fn default_max_retries() -> u32 {
    3
}

const fn default_retry_delay_ms() -> u64 {
    1000
}

const fn default_fallback_ttl_secs() -> u64 {
    300
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            fallback_ttl_secs: default_fallback_ttl_secs(),
        }
    }
}

impl RecoveryConfig {
    #[must_use]
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    #[must_use]
    pub fn fallback_ttl(&self) -> Duration {
        Duration::from_secs(self.fallback_ttl_secs)
    }
}

/// Which substitute produced a fallback value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FallbackTier {
    Cached,
    RuleBased,
    Static,
}

/// A fallback value and the tier it came from.
#[derive(Debug, Clone)]
pub struct Fallback<T> {
    pub value: T,
    pub tier: FallbackTier,
}

/// Retries operations and supplies substitutes when they fail.
pub struct ErrorRecoveryService {
    config: RecoveryConfig,
    cache: Arc<CacheService>,
    catalog: Arc<dyn ScreenCatalog>,
    error_counts: Mutex<BTreeMap<ErrorKind, u64>>,
}

impl ErrorRecoveryService {
    pub fn new(
        config: RecoveryConfig,
        cache: Arc<CacheService>,
        catalog: Arc<dyn ScreenCatalog>,
    ) -> Self {
        Self {
            config,
            cache,
            catalog,
            error_counts: Mutex::new(BTreeMap::new()),
        }
    }

    #[must_use]
    pub const fn config(&self) -> &RecoveryConfig {
        &self.config
    }

    /// Run `operation` up to `max_retries` times, then `fallback`.
    ///
    /// Attempt `n` that fails is followed by a `retry_delay * n` sleep
    /// unless it was the last one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FallbackFailed`] when every attempt and the fallback
    /// all failed.
    pub async fn execute_with_retry<T, Op, OpFut, Fb, FbFut>(
        &self,
        mut operation: Op,
        fallback: Fb,
        context: &str,
    ) -> Result<T>
    where
        Op: FnMut() -> OpFut,
        OpFut: Future<Output = Result<T>>,
        Fb: FnOnce() -> FbFut,
        FbFut: Future<Output = Result<T>>,
    {
        let max_retries = self.config.max_retries.max(1);

        for attempt in 1..=max_retries {
            match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(context, attempt, "Operation succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(e) => {
                    self.record_error(&e);
                    warn!(context, attempt, max_retries, error = %e, "Operation failed");
                    if attempt < max_retries {
                        tokio::time::sleep(self.config.retry_delay() * attempt).await;
                    }
                }
            }
        }

        self.bump(ErrorKind::RetryExhausted);
        info!(context, "Retries exhausted, running fallback");
        fallback().await.map_err(|source| {
            self.record_error(&source);
            Error::FallbackFailed {
                context: context.to_string(),
                source: Box::new(source),
            }
        })
    }

    /// Remember a successful result as the cached fallback for `kind`.
    pub fn record_success(&self, kind: &str, location: Option<&str>, screens: &[EnhancedScreen]) {
        if screens.is_empty() {
            return;
        }
        let mut entry_tags = vec![tags::FALLBACK.to_string()];
        if let Some(location) = location {
            entry_tags.push(location_tag(location));
        }
        self.cache.set_tagged(
            fallback_key(kind, location),
            screens,
            self.config.fallback_ttl(),
            entry_tags,
        );
    }

    /// Substitute screens for `kind`, trying each tier in order.
    pub async fn fallback_screens(
        &self,
        kind: &str,
        location: Option<&str>,
        limit: usize,
    ) -> Fallback<Vec<EnhancedScreen>> {
        if let Some(cached) = self
            .cache
            .get::<Vec<EnhancedScreen>>(&fallback_key(kind, location))
            .filter(|screens| !screens.is_empty())
        {
            debug!(kind, count = cached.len(), "Using cached fallback");
            return Fallback {
                value: cached.into_iter().take(limit).collect(),
                tier: FallbackTier::Cached,
            };
        }

        match self.catalog.all_screens().await {
            Ok(catalog) => {
                let ranked = rank_by_popularity(&catalog, location, limit);
                if !ranked.is_empty() {
                    debug!(kind, count = ranked.len(), "Using rule-based fallback");
                    return Fallback {
                        value: ranked,
                        tier: FallbackTier::RuleBased,
                    };
                }
            }
            Err(e) => {
                self.record_error(&e);
                warn!(kind, error = %e, "Catalog unavailable for rule-based fallback");
            }
        }

        debug!(kind, "Using static fallback");
        Fallback {
            value: Vec::new(),
            tier: FallbackTier::Static,
        }
    }

    /// Minimal section set used when config resolution is impossible.
    #[must_use]
    pub fn fallback_section_configs(&self) -> Vec<SectionConfig> {
        vec![defaults::fallback_popular()]
    }

    #[must_use]
    pub fn fallback_profile(&self) -> UserProfile {
        UserProfile::anonymous()
    }

    #[must_use]
    pub fn fallback_insights(&self, location: Option<&str>) -> MarketInsights {
        MarketInsights::empty(location.map(str::to_string))
    }

    /// Count a failure against its [`ErrorKind`].
    pub fn record_error(&self, error: &Error) {
        self.bump(error.kind());
    }

    /// Failure counts per kind since startup.
    #[must_use]
    pub fn error_counts(&self) -> BTreeMap<ErrorKind, u64> {
        self.error_counts.lock().clone()
    }

    fn bump(&self, kind: ErrorKind) {
        *self.error_counts.lock().entry(kind).or_insert(0) += 1;
    }
}

fn fallback_key(kind: &str, location: Option<&str>) -> String {
    format!("fallback:{kind}:{}", location_key(location))
}

/// Rank catalog screens by popularity, optionally within a location.
///
/// Equal scores keep catalog order.
#[must_use]
pub fn rank_by_popularity(
    catalog: &[Screen],
    location: Option<&str>,
    limit: usize,
) -> Vec<EnhancedScreen> {
    let location = location.filter(|l| !l.trim().is_empty());
    let mut scored: Vec<(&Screen, f64)> = catalog
        .iter()
        .filter(|s| location.map_or(true, |l| s.matches_location(l)))
        .map(|s| (s, s.popularity_score()))
        .collect();
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));

    scored
        .into_iter()
        .take(limit)
        .map(|(s, score)| {
            let mut screen = EnhancedScreen::from_catalog(s);
            screen.recommendation_score = Some(score / 5.0);
            screen
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Service;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FixedCatalog(Result<Vec<Screen>>);

    #[async_trait]
    impl ScreenCatalog for FixedCatalog {
        async fn all_screens(&self) -> Result<Vec<Screen>> {
            match &self.0 {
                Ok(screens) => Ok(screens.clone()),
                Err(_) => Err(Error::upstream(Service::Catalog, "offline")),
            }
        }

        async fn screen(&self, _: &crate::domain::ScreenId) -> Result<Option<Screen>> {
            Ok(None)
        }
    }

    fn raw(id: &str, location: &str, rating: f64, views: u64) -> Screen {
        Screen {
            id: id.into(),
            name: id.to_string(),
            location: location.to_string(),
            price: dec!(100),
            category: "mall".into(),
            environment: Default::default(),
            specs: Default::default(),
            views,
            rating,
            reviews: 0,
            pricing_bundles: vec![],
            operating_hours: Default::default(),
        }
    }

    fn service(catalog: Result<Vec<Screen>>) -> ErrorRecoveryService {
        let config = RecoveryConfig {
            max_retries: 3,
            retry_delay_ms: 1,
            fallback_ttl_secs: 60,
        };
        ErrorRecoveryService::new(
            config,
            Arc::new(CacheService::default()),
            Arc::new(FixedCatalog(catalog)),
        )
    }

    #[tokio::test]
    async fn retry_recovers_without_fallback() {
        let svc = service(Ok(vec![]));
        let (calls, fallback_called) = (AtomicU32::new(0), AtomicU32::new(0));
        let (calls, fallback_called) = (&calls, &fallback_called);

        let result = svc
            .execute_with_retry(
                move || async move {
                    if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(Error::upstream(Service::Recommendation, "flaky"))
                    } else {
                        Ok(42)
                    }
                },
                move || async move {
                    fallback_called.fetch_add(1, Ordering::SeqCst);
                    Ok(0)
                },
                "ctx",
            )
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(fallback_called.load(Ordering::SeqCst), 0);
        assert_eq!(svc.error_counts().get(&ErrorKind::Upstream), Some(&2));
    }

    #[tokio::test]
    async fn exhausted_retries_use_fallback() {
        let svc = service(Ok(vec![]));
        let result: Result<i32> = svc
            .execute_with_retry(
                || async { Err(Error::upstream(Service::MarketData, "down")) },
                || async { Ok(7) },
                "ctx",
            )
            .await;

        assert_eq!(result.unwrap(), 7);
        let counts = svc.error_counts();
        assert_eq!(counts.get(&ErrorKind::MarketData), Some(&3));
        assert_eq!(counts.get(&ErrorKind::RetryExhausted), Some(&1));
    }

    #[tokio::test]
    async fn failing_fallback_propagates() {
        let svc = service(Ok(vec![]));
        let result: Result<i32> = svc
            .execute_with_retry(
                || async { Err(Error::upstream(Service::Recommendation, "down")) },
                || async { Err(Error::Cache("empty".into())) },
                "top-picks",
            )
            .await;

        match result {
            Err(Error::FallbackFailed { context, source }) => {
                assert_eq!(context, "top-picks");
                assert!(matches!(*source, Error::Cache(_)));
            }
            other => panic!("expected FallbackFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn cached_tier_wins_when_present() {
        let svc = service(Ok(vec![raw("c1", "Bogotá", 5.0, 100)]));
        let remembered = EnhancedScreen::new("r1", "r1", "Bogotá", dec!(1), "mall");
        svc.record_success("top-picks", Some("Bogotá"), &[remembered]);

        let fallback = svc.fallback_screens("top-picks", Some("bogotá"), 5).await;
        assert_eq!(fallback.tier, FallbackTier::Cached);
        assert_eq!(fallback.value[0].id.as_str(), "r1");
    }

    #[tokio::test]
    async fn rule_based_tier_ranks_catalog_by_popularity() {
        let svc = service(Ok(vec![
            raw("low", "Bogotá", 2.0, 10),
            raw("high", "Bogotá Norte", 4.8, 5000),
            raw("elsewhere", "Medellín", 5.0, 9000),
        ]));

        let fallback = svc.fallback_screens("trending", Some("bogotá"), 10).await;
        assert_eq!(fallback.tier, FallbackTier::RuleBased);
        let ids: Vec<_> = fallback.value.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["high", "low"]);
    }

    #[tokio::test]
    async fn static_tier_when_catalog_fails() {
        let svc = service(Err(Error::Cache("unused".into())));
        let fallback = svc.fallback_screens("trending", None, 10).await;
        assert_eq!(fallback.tier, FallbackTier::Static);
        assert!(fallback.value.is_empty());
        assert_eq!(svc.error_counts().get(&ErrorKind::Upstream), Some(&1));
    }

    #[test]
    fn static_substitutes() {
        let svc = service(Ok(vec![]));
        let configs = svc.fallback_section_configs();
        assert_eq!(configs.len(), 1);
        assert_eq!(configs[0].id.as_str(), "popular");
        assert!(svc.fallback_profile().is_anonymous());
        assert_eq!(svc.fallback_insights(Some("Cali")).total_screens, 0);
    }
}
