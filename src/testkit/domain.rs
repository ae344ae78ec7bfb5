//! Builders for domain primitives used across tests.
//!
//! Provides concise factory functions for [`Screen`], [`EnhancedScreen`],
//! [`Section`], [`SectionConfig`], and [`UserProfile`] so tests focus on
//! assertions rather than construction boilerplate.

use rust_decimal::Decimal;

use crate::domain::{
    AlgorithmType, EnhancedScreen, Environment, OperatingHours, Screen, ScreenId, ScreenSpecs,
    Section, SectionConfig, SectionConditions, UserContext, UserId, UserProfile,
};

/// Price shared by every builder, so price similarity never separates screens.
pub const PRICE: Decimal = Decimal::ONE_HUNDRED;

/// A raw catalog record in the `mall` category.
///
/// Reviews are a tenth of the views, so booking velocity is non-zero
/// whenever the screen has traffic.
pub fn raw_screen(id: &str, location: &str, rating: f64, views: u64) -> Screen {
    Screen {
        id: ScreenId::new(id),
        name: format!("Screen {id}"),
        location: location.to_string(),
        price: PRICE,
        category: "mall".into(),
        environment: Environment::Indoor,
        specs: ScreenSpecs::default(),
        views,
        rating,
        reviews: u32::try_from(views / 10).unwrap_or(u32::MAX),
        pricing_bundles: vec![],
        operating_hours: OperatingHours::default(),
    }
}

/// `n` raw screens `{prefix}0..{prefix}{n-1}` in `location`, busier as the index grows.
pub fn raw_screens(prefix: &str, location: &str, n: usize) -> Vec<Screen> {
    (0..n)
        .map(|i| raw_screen(&format!("{prefix}{i}"), location, 4.0, 100 * (i as u64 + 1)))
        .collect()
}

/// An unscored screen in Bogotá.
pub fn screen(id: &str) -> EnhancedScreen {
    EnhancedScreen::new(id, format!("Screen {id}"), "Bogotá", PRICE, "mall")
}

/// A screen carrying a personalized score.
pub fn scored_screen(id: &str, score: f64) -> EnhancedScreen {
    let mut screen = screen(id);
    screen.personalized_score = Some(score);
    screen
}

/// An enabled config with no conditions.
///
/// # Panics
///
/// Panics if `min > max`.
pub fn config(
    id: &str,
    algorithm: AlgorithmType,
    priority: i32,
    min: usize,
    max: usize,
) -> SectionConfig {
    SectionConfig::try_new(id, id, algorithm, priority, min, max).expect("valid screen bounds")
}

/// A config that only logged-in users with enough history see.
pub fn gated_config(
    id: &str,
    algorithm: AlgorithmType,
    interactions: u32,
    purchases: u32,
) -> SectionConfig {
    config(id, algorithm, 5, 0, 10).with_conditions(SectionConditions {
        requires_login: true,
        min_user_interactions: interactions,
        min_purchase_history: purchases,
    })
}

/// A section holding unscored screens with the given ids.
pub fn section(id: &str, priority: i32, min: usize, max: usize, screens: &[&str]) -> Section {
    Section::from_config(
        &config(id, AlgorithmType::FallbackPopular, priority, min, max),
        UserContext::default(),
    )
    .with_screens(screens.iter().map(|s| screen(s)).collect())
}

/// A known user's profile with the given history counts.
pub fn profile(user: &str, interactions: u32, purchases: u32) -> UserProfile {
    UserProfile {
        total_interactions: interactions,
        purchase_count: purchases,
        ..UserProfile::new(UserId::new(user))
    }
}
