//! Application services (use cases).
//!
//! These services orchestrate domain logic and coordinate adapters
//! to implement section grouping.

pub mod cache;
pub mod dedup;
pub mod grouping;
pub mod recovery;
pub mod section;
