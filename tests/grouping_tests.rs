//! End-to-end section generation through the wired engine.

mod support;

use chrono::Utc;
use section_grouping::application::grouping::GenerationOptions;
use section_grouping::domain::{
    DynamicSectionRule, InteractionAction, RuleAction, RuleCondition, ScreenId, SectionEngagement,
    SectionId, SectionPatch, UserId, UserInteraction, UserProfile,
};
use section_grouping::testkit::config::grouping;
use section_grouping::testkit::fixture::EngineFixture;

use support::assertions::{assert_no_duplicate_screens, assert_priority_order, section_ids};
use support::catalog::large_catalog;

fn returning_user() -> UserProfile {
    UserProfile {
        total_interactions: 12,
        purchase_count: 2,
        recently_viewed: vec![ScreenId::new("bog-3"), ScreenId::new("bog-7")],
        purchased: vec![ScreenId::new("bog-10"), ScreenId::new("med-2")],
        preferred_locations: vec!["Bogotá".into()],
        ..UserProfile::new(UserId::new("u1"))
    }
}

#[tokio::test]
async fn anonymous_request_yields_unique_public_sections() {
    let fixture = EngineFixture::new(large_catalog());

    let result = fixture
        .engine
        .generate_sections(GenerationOptions::default().at_location("Bogotá"))
        .await
        .unwrap();

    assert!(!result.sections.is_empty());
    assert!(!result.fallback_used);
    assert_no_duplicate_screens(&result);
    assert_priority_order(&result);

    let ids = section_ids(&result);
    for personalized in ["top-picks", "recently-viewed", "buy-again", "similar-users"] {
        assert!(
            !ids.iter().any(|id| id == personalized),
            "{personalized} served to anonymous user"
        );
    }
    assert!(ids.iter().any(|id| id == "near-you"));
}

#[tokio::test]
async fn returning_user_gets_history_sections() {
    let fixture = EngineFixture::builder(large_catalog())
        .user_profile(returning_user())
        .build();

    let result = fixture
        .engine
        .generate_sections(GenerationOptions::for_user("u1").at_location("Bogotá"))
        .await
        .unwrap();

    assert_no_duplicate_screens(&result);
    assert_priority_order(&result);
    let ids = section_ids(&result);
    assert_eq!(ids.first().map(String::as_str), Some("top-picks"));
    assert!(ids.iter().any(|id| id == "recently-viewed"), "sections: {ids:?}");
    assert!(ids.iter().any(|id| id == "buy-again"), "sections: {ids:?}");
    assert_eq!(result.analytics.total_sections, result.sections.len());
    assert_eq!(result.analytics.total_screens, result.total_screens());
}

#[tokio::test]
async fn every_section_meets_its_bounds() {
    let fixture = EngineFixture::builder(large_catalog())
        .user_profile(returning_user())
        .build();

    let result = fixture
        .engine
        .generate_sections(GenerationOptions::for_user("u1").at_location("Bogotá"))
        .await
        .unwrap();

    for section in &result.sections {
        let config = fixture.sections.section_config(&section.id).unwrap();
        assert!(section.len() <= config.max_screens, "{} over max", section.id);
        assert!(section.len() >= config.min_screens, "{} under min", section.id);
    }
}

#[tokio::test]
async fn section_count_respects_request_limit() {
    let fixture = EngineFixture::builder(large_catalog())
        .user_profile(returning_user())
        .build();

    let result = fixture
        .engine
        .generate_sections(GenerationOptions::for_user("u1").with_max_sections(3))
        .await
        .unwrap();

    assert_eq!(result.sections.len(), 3);
    assert_eq!(result.sections[0].id, SectionId::from("top-picks"));
}

#[tokio::test]
async fn configured_section_limit_applies_without_override() {
    let fixture = EngineFixture::builder(large_catalog())
        .user_profile(returning_user())
        .grouping(grouping(2))
        .build();

    let result = fixture
        .engine
        .generate_sections(GenerationOptions::for_user("u1").at_location("Bogotá"))
        .await
        .unwrap();

    assert_eq!(result.sections.len(), 2);
}

#[tokio::test]
async fn repeated_request_is_served_from_cache_until_forced() {
    let fixture = EngineFixture::new(large_catalog());
    let options = GenerationOptions::default().at_location("Medellín");

    let first = fixture.engine.generate_sections(options.clone()).await.unwrap();
    let second = fixture.engine.generate_sections(options.clone()).await.unwrap();
    let forced = fixture
        .engine
        .generate_sections(options.force_refresh())
        .await
        .unwrap();

    assert!(!first.cache_hit);
    assert!(second.cache_hit);
    assert_eq!(first.sections, second.sections);
    assert!(!forced.cache_hit);
}

#[tokio::test]
async fn refresh_sections_bypasses_cached_result() {
    let fixture = EngineFixture::builder(large_catalog())
        .user("u2", 3, 0)
        .build();
    let user = UserId::new("u2");

    fixture
        .engine
        .generate_sections(GenerationOptions::for_user("u2"))
        .await
        .unwrap();
    let refreshed = fixture.engine.refresh_sections(&user).await.unwrap();

    assert!(!refreshed.cache_hit);
    assert_no_duplicate_screens(&refreshed);
}

#[tokio::test]
async fn interaction_invalidates_user_cache() {
    let fixture = EngineFixture::builder(large_catalog())
        .user("u3", 4, 1)
        .build();
    let options = GenerationOptions::for_user("u3");

    fixture.engine.generate_sections(options.clone()).await.unwrap();
    let removed = fixture
        .engine
        .record_interaction(UserInteraction::new("u3", "bog-1", InteractionAction::Purchase))
        .await
        .unwrap();
    let after = fixture.engine.generate_sections(options).await.unwrap();

    assert!(removed > 0);
    assert!(!after.cache_hit);
}

#[tokio::test]
async fn disabling_a_section_removes_it_from_results() {
    let fixture = EngineFixture::new(large_catalog());
    let options = GenerationOptions::default().at_location("Bogotá");

    let before = fixture.engine.generate_sections(options.clone()).await.unwrap();
    assert!(section_ids(&before).iter().any(|id| id == "trending-now"));

    fixture
        .engine
        .toggle_section(&SectionId::from("trending-now"), false)
        .unwrap();
    let after = fixture.engine.generate_sections(options).await.unwrap();

    assert!(!after.cache_hit);
    assert!(!section_ids(&after).iter().any(|id| id == "trending-now"));
}

#[tokio::test]
async fn patched_priority_reorders_sections() {
    let fixture = EngineFixture::new(large_catalog());

    fixture
        .engine
        .update_section_config(
            &SectionId::from("popular"),
            &SectionPatch {
                priority: Some(50),
                ..SectionPatch::default()
            },
        )
        .unwrap();
    let result = fixture
        .engine
        .generate_sections(GenerationOptions::default().at_location("Bogotá"))
        .await
        .unwrap();

    assert_eq!(result.sections[0].id, SectionId::from("popular"));
}

#[tokio::test]
async fn dynamic_rule_hides_section_for_anonymous_users_only() {
    let fixture = EngineFixture::builder(large_catalog())
        .user("u4", 2, 0)
        .build();
    let rule = DynamicSectionRule::try_new(
        RuleCondition::Anonymous,
        RuleAction::Disable,
        vec![SectionId::from("near-you")],
        5,
    )
    .unwrap()
    .with_id("hide-near-you");
    fixture.engine.add_dynamic_rule(rule);

    let anonymous = fixture
        .engine
        .generate_sections(GenerationOptions::default().at_location("Bogotá"))
        .await
        .unwrap();
    let known = fixture
        .engine
        .generate_sections(GenerationOptions::for_user("u4").at_location("Bogotá"))
        .await
        .unwrap();

    assert!(!section_ids(&anonymous).iter().any(|id| id == "near-you"));
    assert!(section_ids(&known).iter().any(|id| id == "near-you"));
}

#[tokio::test]
async fn modify_rule_caps_section_size() {
    let fixture = EngineFixture::new(large_catalog());
    let rule = DynamicSectionRule::try_new(
        RuleCondition::LocationContains("bogot".into()),
        RuleAction::Modify(SectionPatch {
            min_screens: Some(1),
            max_screens: Some(2),
            ..SectionPatch::default()
        }),
        vec![SectionId::from("popular")],
        1,
    )
    .unwrap();
    fixture.engine.add_dynamic_rule(rule);

    let result = fixture
        .engine
        .generate_sections(GenerationOptions::default().at_location("Bogotá"))
        .await
        .unwrap();

    let popular = result
        .sections
        .iter()
        .find(|s| s.id == SectionId::from("popular"))
        .expect("popular section present");
    assert!(popular.len() <= 2);
}

#[tokio::test]
async fn removing_a_rule_restores_the_section() {
    let fixture = EngineFixture::new(large_catalog());
    let rule = DynamicSectionRule::try_new(
        RuleCondition::Always,
        RuleAction::Disable,
        vec![SectionId::from("popular")],
        1,
    )
    .unwrap()
    .with_id("no-popular");
    fixture.engine.add_dynamic_rule(rule);
    let options = GenerationOptions::default().at_location("Bogotá");

    let hidden = fixture.engine.generate_sections(options.clone()).await.unwrap();
    assert!(fixture.engine.remove_dynamic_rule(&"no-popular".into()));
    let restored = fixture.engine.generate_sections(options).await.unwrap();

    assert!(!section_ids(&hidden).iter().any(|id| id == "popular"));
    assert!(section_ids(&restored).iter().any(|id| id == "popular"));
}

#[tokio::test]
async fn engagement_feeds_section_metrics() {
    let fixture = EngineFixture::new(large_catalog());
    let section = SectionId::from("trending-now");

    for (clicks, conversion) in [(2, 0.0), (4, 0.5)] {
        fixture.engine.track_section_engagement(SectionEngagement {
            section_id: section.clone(),
            user_id: Some(UserId::new("u5")),
            view_time: 12.0,
            click_count: clicks,
            scroll_depth: 0.5,
            conversion_rate: conversion,
            timestamp: Utc::now(),
        });
    }

    let metrics = fixture.engine.section_performance_metrics(&section);
    assert_eq!(metrics.impressions, 2);
    assert_eq!(metrics.clicks, 6);
    assert_eq!(metrics.conversions, 1);
    assert!((metrics.conversion_rate - 0.5).abs() < f64::EPSILON);
    assert!(metrics.user_satisfaction_score > 0.0);
    assert!(metrics.user_satisfaction_score <= 100.0);
}

#[tokio::test]
async fn unknown_location_still_yields_sections() {
    let fixture = EngineFixture::new(large_catalog());

    let result = fixture
        .engine
        .generate_sections(GenerationOptions::default().at_location("Atlantis"))
        .await
        .unwrap();

    assert!(!result.sections.is_empty());
    assert_no_duplicate_screens(&result);
}
