//! Progress summary assembly: level naming, next-level arithmetic, strength
//! maturity display, and recent activity.

mod common;

use questforge::database::models::{MaturityLevel, StrengthId, UserId, XpSource};
use questforge::services::gamification::{award_strength_xp, award_xp};
use questforge::services::summary::progress_summary;

const USER: UserId = UserId(3);

#[tokio::test]
async fn summary_reflects_profile_and_strengths() {
    let h = common::harness();
    award_xp(&h.engine, USER, 450, XpSource::AssessmentComplete, true)
        .await
        .unwrap();
    award_strength_xp(&h.engine, USER, StrengthId(1), 550)
        .await
        .unwrap();
    award_strength_xp(&h.engine, USER, StrengthId(2), 5_250)
        .await
        .unwrap();

    let summary = progress_summary(&h.engine, USER).await.unwrap();
    assert_eq!(summary.xp_total, 450);
    assert_eq!(summary.level, 1);
    assert_eq!(summary.level_name, "Seedling");
    assert!((summary.progress_percentage - 90.0).abs() < 1e-9);
    // 51 XP to the level-2 floor at 501.
    assert_eq!(summary.xp_to_next_level, Some(51));
    assert_eq!(summary.current_streak, 1);
    assert_eq!(summary.streak_multiplier, 1.0);

    assert_eq!(summary.strengths.len(), 2);
    assert_eq!(summary.strengths[0].strength_id, 1);
    assert_eq!(summary.strengths[0].maturity_level, MaturityLevel::Connector);
    assert_eq!(summary.strengths[1].maturity_level, MaturityLevel::Alchemist);
    // Top tier progress runs against the rolling 1000-XP milestone.
    assert!((summary.strengths[1].progress_percentage - 25.0).abs() < 1e-9);

    assert_eq!(summary.recent_activity.len(), 1);
    assert_eq!(summary.recent_activity[0].source, XpSource::AssessmentComplete);
}

#[tokio::test]
async fn summary_creates_a_blank_profile_lazily() {
    let h = common::harness();
    let summary = progress_summary(&h.engine, USER).await.unwrap();
    assert_eq!(summary.xp_total, 0);
    assert_eq!(summary.level, 1);
    assert_eq!(summary.xp_to_next_level, Some(501));
    assert!(summary.strengths.is_empty());
    assert!(summary.recent_activity.is_empty());
}
