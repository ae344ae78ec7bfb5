//! Marketplace domain types: screens, sections, configs, rules, and scoring.

pub mod error;
pub mod score;

mod engagement;
mod id;
mod interaction;
mod market;
mod profile;
mod rule;
mod screen;
mod section;
mod section_config;

pub use engagement::{SectionEngagement, SectionPerformanceMetrics};
pub use id::{RuleId, ScreenId, SectionId, UserId};
pub use interaction::{InteractionAction, InteractionContext, UserInteraction};
pub use market::{MarketInsights, TrendingScreen};
pub use profile::UserProfile;
pub use rule::{DynamicSectionRule, RuleAction, RuleCondition, RuleContext};
pub use screen::{
    BookingFrequency, EnhancedScreen, Environment, OperatingHours, PerformanceMetrics,
    PricingBundle, Screen, ScreenSpecs, TrendDirection,
};
pub use section::{DisplayType, Section, SectionMetadata, UserContext};
pub use section_config::{
    AlgorithmType, DisplayConfig, SectionConditions, SectionConfig, SectionPatch,
};
