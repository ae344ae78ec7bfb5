//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! The grouping core consumes its collaborators through these traits so
//! that recommendation, market data, profile, and catalog sources can be
//! swapped without touching the application layer.
//!
//! # Architecture
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │      Application        │
//!     ┌──────────────┤  (GroupingEngine, ...)  ├──────────────┐
//!     │              └─────────────────────────┘              │
//!     │                   │             │                     │
//!     ▼                   ▼             ▼                     ▼
//! ┌──────────────┐ ┌────────────┐ ┌────────────┐      ┌─────────────┐
//! │Recommendation│ │ MarketData │ │  Behavior  │      │   Catalog   │
//! │   Adapter    │ │  Adapter   │ │  Analytics │      │   Adapter   │
//! └──────────────┘ └────────────┘ └────────────┘      └─────────────┘
//! ```

pub mod outbound;

pub use outbound::{MarketDataService, RecommendationService, ScreenCatalog, UserBehaviorAnalytics};
