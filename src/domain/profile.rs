//! User behavior profiles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{ScreenId, UserId};

/// Aggregated behavior for one user.
///
/// An anonymous profile has no user id and zero history; it is the
/// fallback whenever profile lookup fails.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub user_id: Option<UserId>,
    pub total_interactions: u32,
    pub purchase_count: u32,
    /// Most recent first.
    pub recently_viewed: Vec<ScreenId>,
    /// Most recent first.
    pub purchased: Vec<ScreenId>,
    pub preferred_locations: Vec<String>,
    pub preferred_categories: Vec<String>,
    pub last_active: Option<DateTime<Utc>>,
}

impl UserProfile {
    /// An empty profile for a known user.
    #[must_use]
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            ..Self::default()
        }
    }

    /// An empty profile with no user.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_anonymous(&self) -> bool {
        self.user_id.is_none()
    }

    /// True for a known user with no recorded interactions.
    #[must_use]
    pub fn is_new_user(&self) -> bool {
        !self.is_anonymous() && self.total_interactions == 0
    }
}
