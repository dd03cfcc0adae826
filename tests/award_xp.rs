//! Orchestrator behavior: validation, streak application, level crossings,
//! counters, and the ledger.

mod common;

use chrono::Duration;
use questforge::database::models::{UserId, XpSource};
use questforge::database::GamificationStore;
use questforge::services::gamification::award_xp;
use questforge::EngineError;

const USER: UserId = UserId(7);

#[tokio::test]
async fn rejects_non_positive_amounts_before_mutation() {
    let h = common::harness();
    for amount in [0, -50] {
        let err = award_xp(&h.engine, USER, amount, XpSource::ModuleCompleted, false)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }
    // Nothing was created or written.
    assert!(h.store.get_profile(USER.get()).await.unwrap().is_none());
}

#[tokio::test]
async fn rejects_unauthenticated_callers() {
    let h = common::harness();
    let err = award_xp(&h.engine, UserId(0), 10, XpSource::FeedbackGiven, true)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Unauthenticated));
}

#[tokio::test]
async fn level_boundary_scenario() {
    let h = common::harness();
    award_xp(&h.engine, USER, 450, XpSource::AssessmentComplete, false)
        .await
        .unwrap();

    let result = award_xp(&h.engine, USER, 100, XpSource::FeedbackGiven, false)
        .await
        .unwrap();
    assert_eq!(result.base_xp, 100);
    assert_eq!(result.xp_awarded, 100);
    assert_eq!(result.total_xp, 550);
    assert_eq!(result.previous_level, 1);
    assert_eq!(result.new_level, 2);
    assert!(result.leveled_up);
    assert_eq!(result.levels_gained, vec![2]);
}

#[tokio::test]
async fn multi_level_jump_reports_every_crossing() {
    let h = common::harness();
    let result = award_xp(&h.engine, USER, 5_000, XpSource::AssessmentComplete, false)
        .await
        .unwrap();
    assert_eq!(result.new_level, 4);
    assert_eq!(result.levels_gained, vec![2, 3, 4]);
}

#[tokio::test]
async fn streak_grows_and_multiplies_daily_awards() {
    let h = common::harness();

    let first = award_xp(&h.engine, USER, 100, XpSource::ModuleCompleted, true)
        .await
        .unwrap();
    assert_eq!(first.current_streak, 1);
    assert_eq!(first.streak_multiplier, 1.0);
    assert_eq!(first.xp_awarded, 100);

    h.clock.advance(Duration::hours(24));
    let second = award_xp(&h.engine, USER, 100, XpSource::ModuleCompleted, true)
        .await
        .unwrap();
    assert_eq!(second.current_streak, 2);
    assert_eq!(second.xp_awarded, 100);

    h.clock.advance(Duration::hours(24));
    let third = award_xp(&h.engine, USER, 100, XpSource::ModuleCompleted, true)
        .await
        .unwrap();
    assert_eq!(third.current_streak, 3);
    assert_eq!(third.streak_multiplier, 1.10);
    assert_eq!(third.xp_awarded, 110);
    assert_eq!(third.total_xp, 310);

    // The bonus is recorded separately in the ledger entry.
    let ledger = h.store.recent_transactions(USER.get(), 1).await.unwrap();
    assert_eq!(ledger[0].amount, 110);
    assert_eq!(ledger[0].streak_bonus, 10);
    assert_eq!(ledger[0].source, XpSource::ModuleCompleted);

    // A 49h gap resets the streak.
    h.clock.advance(Duration::hours(49));
    let fourth = award_xp(&h.engine, USER, 100, XpSource::ModuleCompleted, true)
        .await
        .unwrap();
    assert_eq!(fourth.current_streak, 1);
    assert_eq!(fourth.streak_multiplier, 1.0);

    // Longest streak remembers the peak.
    let profile = h.store.get_profile(USER.get()).await.unwrap().unwrap();
    assert_eq!(profile.current_streak, 1);
    assert_eq!(profile.longest_streak, 3);
}

#[tokio::test]
async fn fixed_rewards_leave_streak_state_untouched() {
    let h = common::harness();
    award_xp(&h.engine, USER, 50, XpSource::FeedbackGiven, true)
        .await
        .unwrap();
    let before = h.store.get_profile(USER.get()).await.unwrap().unwrap();

    h.clock.advance(Duration::hours(1));
    let result = award_xp(&h.engine, USER, 25, XpSource::BadgeReward, false)
        .await
        .unwrap();
    assert_eq!(result.streak_multiplier, 1.0);

    let after = h.store.get_profile(USER.get()).await.unwrap().unwrap();
    assert_eq!(after.current_streak, before.current_streak);
    assert_eq!(after.last_activity_date, before.last_activity_date);
    assert_eq!(after.xp_total, before.xp_total + 25);
}

#[tokio::test]
async fn source_driven_counters() {
    let h = common::harness();
    award_xp(&h.engine, USER, 30, XpSource::ModuleCompleted, false)
        .await
        .unwrap();
    award_xp(&h.engine, USER, 30, XpSource::ModuleCompleted, false)
        .await
        .unwrap();
    award_xp(&h.engine, USER, 50, XpSource::ChallengeCompleted, false)
        .await
        .unwrap();
    award_xp(&h.engine, USER, 80, XpSource::CollaborativeBonus, false)
        .await
        .unwrap();
    award_xp(&h.engine, USER, 10, XpSource::FeedbackGiven, false)
        .await
        .unwrap();

    let profile = h.store.get_profile(USER.get()).await.unwrap().unwrap();
    assert_eq!(profile.modules_completed, 2);
    assert_eq!(profile.challenges_completed, 1);
    assert_eq!(profile.collaborative_challenges, 1);
    assert_eq!(profile.xp_total, 200);
}

#[tokio::test]
async fn concurrent_awards_never_lose_an_update() {
    let h = common::harness();
    let (a, b) = tokio::join!(
        award_xp(&h.engine, USER, 100, XpSource::FeedbackGiven, false),
        award_xp(&h.engine, USER, 200, XpSource::FeedbackReceived, false),
    );
    a.unwrap();
    b.unwrap();
    let profile = h.store.get_profile(USER.get()).await.unwrap().unwrap();
    assert_eq!(profile.xp_total, 300);
    let ledger = h.store.recent_transactions(USER.get(), 10).await.unwrap();
    assert_eq!(ledger.len(), 2);
}

#[tokio::test]
async fn ledger_is_append_only_and_ordered() {
    let h = common::harness();
    for (amount, source) in [
        (40, XpSource::AssessmentPhase1),
        (60, XpSource::AssessmentPhase2),
        (100, XpSource::AssessmentComplete),
    ] {
        award_xp(&h.engine, USER, amount, source, false).await.unwrap();
        h.clock.advance(Duration::minutes(5));
    }
    let ledger = h.store.recent_transactions(USER.get(), 10).await.unwrap();
    assert_eq!(ledger.len(), 3);
    // Most recent first.
    assert_eq!(ledger[0].source, XpSource::AssessmentComplete);
    assert_eq!(ledger[2].source, XpSource::AssessmentPhase1);
}
