//! Badge rule engine: exactly-once unlocks, fixed rewards, windowed criteria,
//! and ledger-ordering criteria.

mod common;

use chrono::Duration;
use questforge::database::models::{BadgeCriteria, UserId, XpSource};
use questforge::database::GamificationStore;
use questforge::services::badges::check_badge_unlocks;
use questforge::services::gamification::award_xp;

const USER: UserId = UserId(5);

#[tokio::test]
async fn unlocks_once_with_fixed_reward() {
    let h = common::harness();
    h.store
        .seed_badge(common::badge(
            1,
            "first_hundred",
            BadgeCriteria::Xp { threshold: 100 },
            25,
        ))
        .await;

    // Below threshold: nothing unlocks.
    award_xp(&h.engine, USER, 60, XpSource::ModuleCompleted, true)
        .await
        .unwrap();
    assert!(check_badge_unlocks(&h.engine, USER).await.unwrap().is_empty());

    award_xp(&h.engine, USER, 60, XpSource::ModuleCompleted, true)
        .await
        .unwrap();
    let unlocked = check_badge_unlocks(&h.engine, USER).await.unwrap();
    assert_eq!(unlocked.len(), 1);
    assert_eq!(unlocked[0].badge_key, "first_hundred");

    // The reward landed with no streak multiplier despite the active streak.
    let ledger = h.store.recent_transactions(USER.get(), 1).await.unwrap();
    assert_eq!(ledger[0].source, XpSource::BadgeReward);
    assert_eq!(ledger[0].amount, 25);
    assert_eq!(ledger[0].streak_bonus, 0);

    // Idempotent: re-running with no stat change unlocks nothing.
    assert!(check_badge_unlocks(&h.engine, USER).await.unwrap().is_empty());
    let profile = h.store.get_profile(USER.get()).await.unwrap().unwrap();
    assert_eq!(profile.xp_total, 145);
}

#[tokio::test]
async fn reward_chains_resolve_in_one_call() {
    let h = common::harness();
    h.store
        .seed_badge(common::badge(
            1,
            "centurion",
            BadgeCriteria::Xp { threshold: 100 },
            50,
        ))
        .await;
    h.store
        .seed_badge(common::badge(
            2,
            "momentum",
            BadgeCriteria::Xp { threshold: 140 },
            10,
        ))
        .await;

    award_xp(&h.engine, USER, 100, XpSource::AssessmentComplete, false)
        .await
        .unwrap();
    // centurion's 50 XP pushes the total to 150, satisfying momentum in the
    // same evaluation call.
    let unlocked = check_badge_unlocks(&h.engine, USER).await.unwrap();
    let mut keys: Vec<&str> = unlocked.iter().map(|b| b.badge_key.as_str()).collect();
    keys.sort();
    assert_eq!(keys, vec!["centurion", "momentum"]);

    let profile = h.store.get_profile(USER.get()).await.unwrap().unwrap();
    assert_eq!(profile.xp_total, 160);
}

#[tokio::test]
async fn period_days_is_a_real_window() {
    let h = common::harness();
    h.store
        .seed_badge(common::badge(
            1,
            "feedback_week",
            BadgeCriteria::FeedbacksGiven {
                threshold: 2,
                period_days: Some(7),
            },
            0,
        ))
        .await;

    award_xp(&h.engine, USER, 10, XpSource::FeedbackGiven, false)
        .await
        .unwrap();
    // Ten days later the first response has aged out of the window.
    h.clock.advance(Duration::days(10));
    award_xp(&h.engine, USER, 10, XpSource::FeedbackGiven, false)
        .await
        .unwrap();
    assert!(check_badge_unlocks(&h.engine, USER).await.unwrap().is_empty());

    // A second response inside the window unlocks it.
    h.clock.advance(Duration::days(1));
    award_xp(&h.engine, USER, 10, XpSource::FeedbackGiven, false)
        .await
        .unwrap();
    let unlocked = check_badge_unlocks(&h.engine, USER).await.unwrap();
    assert_eq!(unlocked.len(), 1);
}

#[tokio::test]
async fn unwindowed_feedbacks_count_forever() {
    let h = common::harness();
    h.store
        .seed_badge(common::badge(
            1,
            "feedback_all_time",
            BadgeCriteria::FeedbacksGiven {
                threshold: 2,
                period_days: None,
            },
            0,
        ))
        .await;

    award_xp(&h.engine, USER, 10, XpSource::FeedbackGiven, false)
        .await
        .unwrap();
    h.clock.advance(Duration::days(400));
    award_xp(&h.engine, USER, 10, XpSource::FeedbackGiven, false)
        .await
        .unwrap();
    assert_eq!(check_badge_unlocks(&h.engine, USER).await.unwrap().len(), 1);
}

#[tokio::test]
async fn retake_must_follow_the_second_feedback() {
    let h = common::harness();
    h.store
        .seed_badge(common::badge(
            1,
            "full_circle",
            BadgeCriteria::RetakeAfterFeedback,
            30,
        ))
        .await;

    // Retake first, then feedback: does not qualify.
    award_xp(&h.engine, USER, 100, XpSource::AssessmentRetake, false)
        .await
        .unwrap();
    h.clock.advance(Duration::hours(1));
    award_xp(&h.engine, USER, 10, XpSource::FeedbackReceived, false)
        .await
        .unwrap();
    h.clock.advance(Duration::hours(1));
    award_xp(&h.engine, USER, 10, XpSource::FeedbackReceived, false)
        .await
        .unwrap();
    assert!(check_badge_unlocks(&h.engine, USER).await.unwrap().is_empty());

    // A retake after the second feedback qualifies.
    h.clock.advance(Duration::hours(1));
    award_xp(&h.engine, USER, 100, XpSource::AssessmentRetake, false)
        .await
        .unwrap();
    assert_eq!(check_badge_unlocks(&h.engine, USER).await.unwrap().len(), 1);
}

#[tokio::test]
async fn streak_and_level_criteria_read_the_profile() {
    let h = common::harness();
    h.store
        .seed_badge(common::badge(
            1,
            "three_day_streak",
            BadgeCriteria::Streak { threshold: 3 },
            0,
        ))
        .await;
    h.store
        .seed_badge(common::badge(
            2,
            "level_two",
            BadgeCriteria::Level { threshold: 2 },
            0,
        ))
        .await;

    for _ in 0..3 {
        award_xp(&h.engine, USER, 200, XpSource::ModuleCompleted, true)
            .await
            .unwrap();
        h.clock.advance(Duration::hours(24));
    }
    // 3-day streak and 620 XP (200+200+220) -> both badges.
    let unlocked = check_badge_unlocks(&h.engine, USER).await.unwrap();
    assert_eq!(unlocked.len(), 2);
}

#[tokio::test]
async fn report_criteria_read_the_collaborator() {
    let h = common::harness();
    h.store
        .seed_badge(common::badge(
            1,
            "first_report",
            BadgeCriteria::ReportIndividualGenerated,
            0,
        ))
        .await;
    h.store
        .seed_badge(common::badge(
            2,
            "team_report",
            BadgeCriteria::ReportTeamGenerated,
            0,
        ))
        .await;

    assert!(check_badge_unlocks(&h.engine, USER).await.unwrap().is_empty());

    h.store.seed_report_counts(USER.get(), 1, 0).await;
    let unlocked = check_badge_unlocks(&h.engine, USER).await.unwrap();
    assert_eq!(unlocked.len(), 1);
    assert_eq!(unlocked[0].badge_key, "first_report");

    h.store.seed_report_counts(USER.get(), 1, 2).await;
    let unlocked = check_badge_unlocks(&h.engine, USER).await.unwrap();
    assert_eq!(unlocked.len(), 1);
    assert_eq!(unlocked[0].badge_key, "team_report");
}

#[tokio::test]
async fn counter_criteria_track_completions() {
    let h = common::harness();
    h.store
        .seed_badge(common::badge(
            1,
            "module_marathon",
            BadgeCriteria::Modules { threshold: 2 },
            0,
        ))
        .await;
    h.store
        .seed_badge(common::badge(
            2,
            "team_player",
            BadgeCriteria::Collaborative { threshold: 1 },
            0,
        ))
        .await;

    award_xp(&h.engine, USER, 30, XpSource::ModuleCompleted, false)
        .await
        .unwrap();
    assert!(check_badge_unlocks(&h.engine, USER).await.unwrap().is_empty());

    award_xp(&h.engine, USER, 30, XpSource::ModuleCompleted, false)
        .await
        .unwrap();
    award_xp(&h.engine, USER, 80, XpSource::CollaborativeBonus, false)
        .await
        .unwrap();
    let unlocked = check_badge_unlocks(&h.engine, USER).await.unwrap();
    assert_eq!(unlocked.len(), 2);
}
