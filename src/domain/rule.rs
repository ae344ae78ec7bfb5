//! Dynamic section rules.
//!
//! A rule pairs a typed [`RuleCondition`] with a [`RuleAction`] applied to
//! one or more target sections. Conditions are evaluated against a
//! [`RuleContext`] built per resolution: the user's profile, the requested
//! location, and the current time.

use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::id::{RuleId, SectionId};
use super::profile::UserProfile;
use super::section_config::SectionPatch;

/// Everything a rule condition may look at.
#[derive(Debug, Clone)]
pub struct RuleContext<'a> {
    pub profile: &'a UserProfile,
    pub location: Option<&'a str>,
    pub now: DateTime<Utc>,
}

/// Predicate over a [`RuleContext`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum RuleCondition {
    Always,
    Anonymous,
    LoggedIn,
    MinPurchases(u32),
    MinInteractions(u32),
    LocationMissing,
    LocationPresent,
    /// Case-insensitive substring match on the requested location.
    LocationContains(String),
    /// UTC hour window `[start, end)`; wraps past midnight when `start > end`.
    HourBetween { start: u32, end: u32 },
    Weekend,
    All(Vec<RuleCondition>),
    Any(Vec<RuleCondition>),
    Not(Box<RuleCondition>),
}

impl RuleCondition {
    #[must_use]
    pub fn evaluate(&self, ctx: &RuleContext<'_>) -> bool {
        match self {
            Self::Always => true,
            Self::Anonymous => ctx.profile.is_anonymous(),
            Self::LoggedIn => !ctx.profile.is_anonymous(),
            Self::MinPurchases(n) => ctx.profile.purchase_count >= *n,
            Self::MinInteractions(n) => ctx.profile.total_interactions >= *n,
            Self::LocationMissing => ctx.location.map_or(true, |l| l.trim().is_empty()),
            Self::LocationPresent => ctx.location.is_some_and(|l| !l.trim().is_empty()),
            Self::LocationContains(needle) => ctx
                .location
                .is_some_and(|l| l.to_lowercase().contains(&needle.to_lowercase())),
            Self::HourBetween { start, end } => {
                let hour = ctx.now.hour();
                if start <= end {
                    hour >= *start && hour < *end
                } else {
                    hour >= *start || hour < *end
                }
            }
            Self::Weekend => matches!(ctx.now.weekday(), Weekday::Sat | Weekday::Sun),
            Self::All(conditions) => conditions.iter().all(|c| c.evaluate(ctx)),
            Self::Any(conditions) => conditions.iter().any(|c| c.evaluate(ctx)),
            Self::Not(inner) => !inner.evaluate(ctx),
        }
    }
}

/// What a matching rule does to its targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "patch", rename_all = "snake_case")]
pub enum RuleAction {
    Enable,
    Disable,
    Modify(SectionPatch),
}

impl RuleAction {
    /// The patch this action applies to each target.
    #[must_use]
    pub fn to_patch(&self) -> SectionPatch {
        match self {
            Self::Enable => SectionPatch::enabled(true),
            Self::Disable => SectionPatch::enabled(false),
            Self::Modify(patch) => patch.clone(),
        }
    }
}

/// Rule that enables, disables, or modifies sections when its condition holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DynamicSectionRule {
    pub id: RuleId,
    pub condition: RuleCondition,
    pub action: RuleAction,
    pub targets: Vec<SectionId>,
    /// Higher-priority rules override lower ones on the same target.
    pub priority: i32,
}

impl DynamicSectionRule {
    /// Create a rule with a generated id.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::NoRuleTargets`] when `targets` is empty.
    pub fn try_new(
        condition: RuleCondition,
        action: RuleAction,
        targets: Vec<SectionId>,
        priority: i32,
    ) -> Result<Self, DomainError> {
        let id = RuleId::new();
        if targets.is_empty() {
            return Err(DomainError::NoRuleTargets {
                rule_id: id.to_string(),
            });
        }
        Ok(Self {
            id,
            condition,
            action,
            targets,
            priority,
        })
    }

    /// Replace the generated id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<RuleId>) -> Self {
        self.id = id.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::id::UserId;
    use chrono::TimeZone;

    fn ctx<'a>(profile: &'a UserProfile, location: Option<&'a str>, hour: u32) -> RuleContext<'a> {
        // 2024-06-05 is a Wednesday
        let now = Utc.with_ymd_and_hms(2024, 6, 5, hour, 0, 0).unwrap();
        RuleContext {
            profile,
            location,
            now,
        }
    }

    #[test]
    fn purchase_and_interaction_thresholds() {
        let mut profile = UserProfile::new(UserId::from("u1"));
        profile.purchase_count = 2;
        profile.total_interactions = 10;
        let c = ctx(&profile, None, 12);

        assert!(RuleCondition::MinPurchases(2).evaluate(&c));
        assert!(!RuleCondition::MinPurchases(3).evaluate(&c));
        assert!(RuleCondition::MinInteractions(10).evaluate(&c));
        assert!(RuleCondition::LoggedIn.evaluate(&c));
        assert!(!RuleCondition::Anonymous.evaluate(&c));
    }

    #[test]
    fn location_conditions() {
        let profile = UserProfile::anonymous();
        assert!(RuleCondition::LocationMissing.evaluate(&ctx(&profile, None, 0)));
        assert!(RuleCondition::LocationMissing.evaluate(&ctx(&profile, Some("  "), 0)));
        assert!(RuleCondition::LocationPresent.evaluate(&ctx(&profile, Some("Bogotá"), 0)));
        assert!(RuleCondition::LocationContains("bogo".into())
            .evaluate(&ctx(&profile, Some("Bogotá"), 0)));
    }

    #[test]
    fn hour_window_wraps_midnight() {
        let profile = UserProfile::anonymous();
        let night = RuleCondition::HourBetween { start: 22, end: 6 };
        assert!(night.evaluate(&ctx(&profile, None, 23)));
        assert!(night.evaluate(&ctx(&profile, None, 2)));
        assert!(!night.evaluate(&ctx(&profile, None, 12)));

        let day = RuleCondition::HourBetween { start: 9, end: 17 };
        assert!(day.evaluate(&ctx(&profile, None, 9)));
        assert!(!day.evaluate(&ctx(&profile, None, 17)));
    }

    #[test]
    fn combinators() {
        let profile = UserProfile::anonymous();
        let c = ctx(&profile, None, 10);
        let cond = RuleCondition::All(vec![
            RuleCondition::Anonymous,
            RuleCondition::Not(Box::new(RuleCondition::Weekend)),
        ]);
        assert!(cond.evaluate(&c));
        assert!(RuleCondition::Any(vec![RuleCondition::LoggedIn, RuleCondition::Always])
            .evaluate(&c));
    }

    #[test]
    fn rule_requires_targets() {
        let result =
            DynamicSectionRule::try_new(RuleCondition::Always, RuleAction::Enable, vec![], 1);
        assert!(matches!(result, Err(DomainError::NoRuleTargets { .. })));
    }

    #[test]
    fn action_patches() {
        assert_eq!(RuleAction::Disable.to_patch().enabled, Some(false));
        assert_eq!(RuleAction::Enable.to_patch().enabled, Some(true));
    }
}
