//! User profiles kept in memory and updated from interactions.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use crate::domain::{InteractionAction, ScreenId, UserId, UserInteraction, UserProfile};
use crate::error::Result;
use crate::port::outbound::UserBehaviorAnalytics;

/// History entries kept per list.
const HISTORY_LIMIT: usize = 50;

/// In-memory profile store.
///
/// Unknown users get an empty profile for their id, so a logged-in user
/// with no history still counts as logged in.
#[derive(Default)]
pub struct InMemoryBehaviorAnalytics {
    profiles: RwLock<HashMap<UserId, UserProfile>>,
}

impl InMemoryBehaviorAnalytics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a profile. Anonymous profiles are ignored.
    pub fn insert(&self, profile: UserProfile) {
        if let Some(user_id) = profile.user_id.clone() {
            self.profiles.write().insert(user_id, profile);
        }
    }

    /// Fold an interaction into the user's profile.
    pub fn record(&self, interaction: &UserInteraction) {
        let mut profiles = self.profiles.write();
        let profile = profiles
            .entry(interaction.user_id.clone())
            .or_insert_with(|| UserProfile::new(interaction.user_id.clone()));

        profile.total_interactions += 1;
        profile.last_active = Some(Utc::now());

        match interaction.action {
            InteractionAction::View | InteractionAction::Click => {
                push_recent(&mut profile.recently_viewed, &interaction.screen_id);
            }
            InteractionAction::Purchase => {
                profile.purchase_count += 1;
                push_recent(&mut profile.purchased, &interaction.screen_id);
            }
            InteractionAction::Favorite | InteractionAction::Share => {}
        }

        if let Some(location) = &interaction.context.location {
            if !profile
                .preferred_locations
                .iter()
                .any(|l| l.eq_ignore_ascii_case(location))
            {
                profile.preferred_locations.push(location.clone());
            }
        }
    }
}

/// Move `id` to the front, trimming the list to [`HISTORY_LIMIT`].
fn push_recent(list: &mut Vec<ScreenId>, id: &ScreenId) {
    list.retain(|existing| existing != id);
    list.insert(0, id.clone());
    list.truncate(HISTORY_LIMIT);
}

#[async_trait]
impl UserBehaviorAnalytics for InMemoryBehaviorAnalytics {
    async fn user_profile(&self, user_id: &UserId) -> Result<UserProfile> {
        Ok(self
            .profiles
            .read()
            .get(user_id)
            .cloned()
            .unwrap_or_else(|| UserProfile::new(user_id.clone())))
    }
}
