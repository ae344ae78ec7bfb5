//! User behavior port.

use async_trait::async_trait;

use crate::domain::{UserId, UserProfile};
use crate::error::Result;

/// Source of user behavior profiles.
///
/// Callers fall back to [`UserProfile::anonymous`] when this fails, so a
/// broken profile store never fails a whole request.
#[async_trait]
pub trait UserBehaviorAnalytics: Send + Sync {
    async fn user_profile(&self, user_id: &UserId) -> Result<UserProfile>;
}
