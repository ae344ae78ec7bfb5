//! User interactions that invalidate cached data.

use serde::{Deserialize, Serialize};

use super::id::{ScreenId, UserId};

/// Kind of interaction a user had with a screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionAction {
    View,
    Click,
    Favorite,
    Share,
    Purchase,
}

impl InteractionAction {
    /// Whether the interaction changes data cached for the screen itself.
    #[must_use]
    pub const fn touches_screen(self) -> bool {
        matches!(self, Self::Purchase | Self::Favorite | Self::Share)
    }
}

/// Where the interaction happened.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionContext {
    #[serde(default)]
    pub location: Option<String>,
}

/// A single user interaction with a screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInteraction {
    pub user_id: UserId,
    pub screen_id: ScreenId,
    pub action: InteractionAction,
    #[serde(default)]
    pub context: InteractionContext,
}

impl UserInteraction {
    pub fn new(
        user_id: impl Into<UserId>,
        screen_id: impl Into<ScreenId>,
        action: InteractionAction,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            screen_id: screen_id.into(),
            action,
            context: InteractionContext::default(),
        }
    }

    #[must_use]
    pub fn at_location(mut self, location: impl Into<String>) -> Self {
        self.context.location = Some(location.into());
        self
    }
}
