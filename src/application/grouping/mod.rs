//! Section grouping: configs in, deduplicated sections out.
//!
//! [`GroupingEngine`] is the entry point. It resolves section configs,
//! runs one [`SectionGenerator`] call per eligible section, and hands the
//! results to deduplication before caching the [`GroupingResult`].

mod config;
mod engine;
mod generator;
mod result;

pub use config::GroupingConfig;
pub use engine::GroupingEngine;
pub use generator::{Collaborators, Generated, GenerationContext, SectionGenerator};
pub use result::{GenerationOptions, GroupingAnalytics, GroupingResult};
