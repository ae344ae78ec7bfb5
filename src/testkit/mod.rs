//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`domain`]: Builders for screens, sections, configs, and profiles.
//! - [`services`]: Scripted and failing collaborator doubles:
//!   `ScriptedRecommender`, `ScriptedMarket`, `FailingCatalog`, `FailingAnalytics`.
//! - [`config`]: Canonical test configurations (fast retries, small cache).
//! - [`fixture`]: A fully wired [`GroupingEngine`](crate::application::grouping::GroupingEngine)
//!   over an in-memory catalog.

pub mod config;
pub mod domain;
pub mod fixture;
pub mod services;
