//! Recommendation port.

use async_trait::async_trait;

use crate::domain::{EnhancedScreen, ScreenId, UserId};
use crate::error::Result;

/// Scored screen recommendations.
///
/// Implementations wrap a recommendation or ML backend. Every method may
/// fail or return an empty list; callers treat both as a signal to fall back.
///
/// # Thread Safety
///
/// Implementations must be thread-safe (`Send + Sync`) since sections are
/// generated concurrently.
#[async_trait]
pub trait RecommendationService: Send + Sync {
    /// Best personalized screens for a user.
    async fn top_picks(&self, user_id: &UserId, limit: usize) -> Result<Vec<EnhancedScreen>>;

    /// Screens the user has not seen that match their profile.
    async fn new_discoveries(&self, user_id: &UserId, limit: usize)
        -> Result<Vec<EnhancedScreen>>;

    /// Screens similar to `screen_id`, excluding it.
    async fn similar_screens(
        &self,
        screen_id: &ScreenId,
        user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<EnhancedScreen>>;

    /// Screens trending overall or in a location.
    async fn trending_screens(
        &self,
        location: Option<&str>,
        limit: usize,
    ) -> Result<Vec<EnhancedScreen>>;
}
