//! In-memory collaborators backed by a static screen catalog.
//!
//! - [`StaticCatalog`]: raw screen records, from a `Vec` or a JSON file
//! - [`CatalogRecommender`]: heuristic recommendations over the catalog
//! - [`CatalogMarketData`]: trends and insights derived from catalog records
//! - [`InMemoryBehaviorAnalytics`]: profiles updated from interactions

mod analytics;
mod catalog;
mod market;
mod recommender;

pub use analytics::InMemoryBehaviorAnalytics;
pub use catalog::StaticCatalog;
pub use market::CatalogMarketData;
pub use recommender::CatalogRecommender;
