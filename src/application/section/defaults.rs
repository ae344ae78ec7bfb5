//! Seeded section configs, one per algorithm.

use crate::domain::{
    AlgorithmType, DisplayConfig, DisplayType, SectionConditions, SectionConfig, SectionId,
};

struct Seed {
    id: &'static str,
    name: &'static str,
    description: &'static str,
    algorithm: AlgorithmType,
    priority: i32,
    min_screens: usize,
    max_screens: usize,
    refresh_interval_secs: u64,
    display_type: DisplayType,
    conditions: SectionConditions,
}

impl Seed {
    fn build(self) -> SectionConfig {
        SectionConfig {
            id: SectionId::from(self.id),
            name: self.name.to_string(),
            description: self.description.to_string(),
            algorithm: self.algorithm,
            priority: self.priority,
            min_screens: self.min_screens,
            max_screens: self.max_screens,
            refresh_interval_secs: self.refresh_interval_secs,
            enabled: true,
            display: DisplayConfig {
                display_type: self.display_type,
                show_metrics: matches!(
                    self.algorithm,
                    AlgorithmType::TrendingAnalysis | AlgorithmType::OtherUsersBuying
                ),
                show_trending_badge: self.algorithm == AlgorithmType::TrendingAnalysis,
            },
            conditions: self.conditions,
        }
    }
}

const fn login(min_interactions: u32, min_purchases: u32) -> SectionConditions {
    SectionConditions {
        requires_login: true,
        min_user_interactions: min_interactions,
        min_purchase_history: min_purchases,
    }
}

const NONE: SectionConditions = SectionConditions {
    requires_login: false,
    min_user_interactions: 0,
    min_purchase_history: 0,
};

/// The section shown when nothing else can be resolved.
#[must_use]
pub fn fallback_popular() -> SectionConfig {
    Seed {
        id: "popular",
        name: "Popular screens",
        description: "Highest rated, most viewed screens",
        algorithm: AlgorithmType::FallbackPopular,
        priority: 3,
        min_screens: 6,
        max_screens: 20,
        refresh_interval_secs: 3600,
        display_type: DisplayType::Grid,
        conditions: NONE,
    }
    .build()
}

/// Every seeded config, in registration order.
#[must_use]
pub fn default_configs() -> Vec<SectionConfig> {
    let seeds = [
        Seed {
            id: "top-picks",
            name: "Top picks for you",
            description: "Personalized from your activity",
            algorithm: AlgorithmType::MlPersonalized,
            priority: 10,
            min_screens: 4,
            max_screens: 12,
            refresh_interval_secs: 1800,
            display_type: DisplayType::Carousel,
            conditions: login(0, 0),
        },
        Seed {
            id: "trending-now",
            name: "Trending now",
            description: "Screens booking fastest this week",
            algorithm: AlgorithmType::TrendingAnalysis,
            priority: 9,
            min_screens: 4,
            max_screens: 12,
            refresh_interval_secs: 900,
            display_type: DisplayType::Carousel,
            conditions: NONE,
        },
        Seed {
            id: "recently-viewed",
            name: "Recently viewed",
            description: "Pick up where you left off",
            algorithm: AlgorithmType::RecentActivity,
            priority: 8,
            min_screens: 1,
            max_screens: 10,
            refresh_interval_secs: 600,
            display_type: DisplayType::List,
            conditions: login(1, 0),
        },
        Seed {
            id: "buy-again",
            name: "Book again",
            description: "Screens you have booked before",
            algorithm: AlgorithmType::PurchaseHistory,
            priority: 8,
            min_screens: 1,
            max_screens: 8,
            refresh_interval_secs: 3600,
            display_type: DisplayType::Carousel,
            conditions: login(0, 1),
        },
        Seed {
            id: "near-you",
            name: "Near you",
            description: "Popular in your area",
            algorithm: AlgorithmType::GeographicPopularity,
            priority: 7,
            min_screens: 3,
            max_screens: 10,
            refresh_interval_secs: 1800,
            display_type: DisplayType::Grid,
            conditions: NONE,
        },
        Seed {
            id: "similar-users",
            name: "Advertisers like you booked",
            description: "Similar to your past bookings",
            algorithm: AlgorithmType::CollaborativeFiltering,
            priority: 6,
            min_screens: 3,
            max_screens: 10,
            refresh_interval_secs: 3600,
            display_type: DisplayType::Carousel,
            conditions: login(0, 1),
        },
        Seed {
            id: "because-you-viewed",
            name: "Because you viewed",
            description: "Similar to screens you looked at",
            algorithm: AlgorithmType::ContentBased,
            priority: 6,
            min_screens: 3,
            max_screens: 10,
            refresh_interval_secs: 1800,
            display_type: DisplayType::Carousel,
            conditions: login(1, 0),
        },
        Seed {
            id: "new-discoveries",
            name: "New discoveries",
            description: "Screens you have not seen yet",
            algorithm: AlgorithmType::NewDiscovery,
            priority: 5,
            min_screens: 4,
            max_screens: 12,
            refresh_interval_secs: 3600,
            display_type: DisplayType::Grid,
            conditions: login(0, 0),
        },
        Seed {
            id: "others-buying",
            name: "Others are booking",
            description: "Highest purchase velocity right now",
            algorithm: AlgorithmType::OtherUsersBuying,
            priority: 5,
            min_screens: 3,
            max_screens: 10,
            refresh_interval_secs: 900,
            display_type: DisplayType::Banner,
            conditions: NONE,
        },
    ];

    let mut configs: Vec<SectionConfig> = seeds.into_iter().map(Seed::build).collect();
    configs.push(fallback_popular());
    configs
}
