//! Outbound ports (driven side): interfaces implemented by outbound adapters.
//!
//! These contracts describe the black-box services the grouping core
//! depends on: recommendations, market data, user behavior, and the raw
//! screen catalog.

mod analytics;
mod catalog;
mod market;
mod recommendation;

pub use analytics::UserBehaviorAnalytics;
pub use catalog::ScreenCatalog;
pub use market::MarketDataService;
pub use recommendation::RecommendationService;
