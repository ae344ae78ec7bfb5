//! Section grouping for a digital-signage marketplace.
//!
//! Turns a catalog of advertising screens into the ordered, themed sections
//! shown on a marketplace home page ("Top picks", "Trending now",
//! "Near you", ...), with no screen shown twice.
//!
//! # Architecture
//!
//! - **`domain`** - Screens, sections, section configs, rules, and scoring
//! - **`port`** - Traits for the recommendation, market data, user behavior,
//!   and catalog collaborators
//! - **`application`** - The use cases:
//!   - `grouping::GroupingEngine` - Resolve configs, generate, deduplicate, cache
//!   - `dedup::DeduplicationEngine` - Cross-section deduplication and backfill
//!   - `section::SectionConfigManager` - Configs, dynamic rules, engagement
//!   - `cache::CacheService` - TTL cache with tags, eviction, and refresh
//!   - `recovery::ErrorRecoveryService` - Retries and tiered fallbacks
//! - **`adapter`** - In-memory collaborators and the `sectiond` CLI
//! - **`infrastructure`** - Configuration and wiring
//!
//! # Example
//!
//! ```no_run
//! use section_grouping::application::grouping::GenerationOptions;
//! use section_grouping::infrastructure::{bootstrap, config::Config};
//!
//! # async fn demo() -> section_grouping::error::Result<()> {
//! let config = Config::load("config.toml")?;
//! let components = bootstrap::build(&config)?;
//! let result = components
//!     .engine
//!     .generate_sections(GenerationOptions::for_user("u1").at_location("Bogotá"))
//!     .await?;
//! println!("{} sections", result.sections.len());
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
