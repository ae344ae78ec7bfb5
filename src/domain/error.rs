//! Domain validation errors for core domain types.
//!
//! This module defines errors that occur when domain invariants are violated.
//! These errors are returned by `try_new` constructors and patch application.
//!
//! # Examples
//!
//! ```
//! use section_grouping::domain::error::DomainError;
//! use section_grouping::domain::{AlgorithmType, SectionConfig};
//!
//! let result =
//!     SectionConfig::try_new("top-picks", "Top picks", AlgorithmType::MlPersonalized, 10, 8, 4);
//! assert!(matches!(result, Err(DomainError::InvalidScreenBounds { min: 8, max: 4 })));
//! ```

use thiserror::Error;

/// Errors that occur when domain invariants are violated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A section must allow at least as many screens as it requires.
    #[error("min_screens {min} must not exceed max_screens {max}")]
    InvalidScreenBounds {
        /// The configured minimum.
        min: usize,
        /// The configured maximum.
        max: usize,
    },

    /// Section and rule identifiers must be non-empty.
    #[error("{kind} id cannot be empty")]
    EmptyId {
        /// What kind of identifier was empty.
        kind: &'static str,
    },

    /// A dynamic rule must target at least one section.
    #[error("rule {rule_id} has no target sections")]
    NoRuleTargets {
        /// The offending rule.
        rule_id: String,
    },
}
