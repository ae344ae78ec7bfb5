//! Section configuration.
//!
//! - [`defaults`]: the seeded config set
//! - [`manager`]: registry, dynamic rules, and engagement tracking

pub mod defaults;
mod manager;

pub use manager::SectionConfigManager;
