//! Pure-calculator properties: threshold tables, level updates, streak
//! multipliers.

use questforge::database::models::MaturityLevel;
use questforge::progression::levels::{
    apply_maturity_delta, apply_user_delta, maturity_for_xp, maturity_progress_percentage,
    user_level_for_xp, user_progress_percentage, MATURITY_TIERS, USER_LEVELS,
};
use questforge::progression::streak::{advance, multiplier_for};

#[test]
fn user_table_is_contiguous() {
    assert_eq!(USER_LEVELS[0].min_xp, 0);
    for pair in USER_LEVELS.windows(2) {
        let max = pair[0].max_xp.expect("only the top tier is unbounded");
        assert_eq!(
            max + 1,
            pair[1].min_xp,
            "gap between level {} and {}",
            pair[0].level,
            pair[1].level
        );
    }
    assert!(USER_LEVELS[USER_LEVELS.len() - 1].max_xp.is_none());
}

#[test]
fn maturity_table_is_contiguous() {
    assert_eq!(MATURITY_TIERS[0].min_xp, 0);
    for pair in MATURITY_TIERS.windows(2) {
        assert_eq!(pair[0].max_xp.unwrap() + 1, pair[1].min_xp);
    }
    assert!(MATURITY_TIERS[3].max_xp.is_none());
}

#[test]
fn every_xp_lands_in_its_tier() {
    // Boundaries and a sweep across the whole table.
    let mut probes: Vec<i64> = (0..200_000).step_by(137).collect();
    for tier in USER_LEVELS.iter() {
        probes.push(tier.min_xp);
        if let Some(max) = tier.max_xp {
            probes.push(max);
        }
    }
    for xp in probes {
        let tier = user_level_for_xp(xp);
        assert!(tier.min_xp <= xp, "xp {xp} below tier {} floor", tier.level);
        if let Some(max) = tier.max_xp {
            assert!(xp <= max, "xp {xp} above tier {} ceiling", tier.level);
        }
    }
}

#[test]
fn named_anchor_levels() {
    assert_eq!(user_level_for_xp(0).level, 1);
    assert_eq!(user_level_for_xp(500).level, 1);
    assert_eq!(user_level_for_xp(501).level, 2);
    assert_eq!(user_level_for_xp(149_999).level, 19);
    assert_eq!(user_level_for_xp(150_000).level, 20);
    assert_eq!(user_level_for_xp(9_999_999).level, 20);
}

#[test]
fn update_is_monotonic_and_reports_crossings() {
    let update = apply_user_delta(450, 100);
    assert_eq!(update.new_xp, 550);
    assert_eq!(update.previous_level, 1);
    assert_eq!(update.new_level, 2);
    assert_eq!(update.levels_crossed, vec![2]);
    assert!(update.leveled_up);

    let update = apply_user_delta(0, 5_000);
    assert_eq!(update.new_level, 4);
    assert_eq!(update.levels_crossed, vec![2, 3, 4]);

    let update = apply_user_delta(700, 0);
    assert_eq!(update.new_xp, 700);
    assert!(!update.leveled_up);
    assert!(update.levels_crossed.is_empty());
}

#[test]
fn maturity_multi_boundary_jump() {
    let update = apply_maturity_delta(0, 5_000);
    assert_eq!(update.new_level, MaturityLevel::Alchemist);
    assert_eq!(
        update.levels_crossed,
        vec![
            MaturityLevel::Connector,
            MaturityLevel::Guide,
            MaturityLevel::Alchemist
        ]
    );
    assert_eq!(update.xp_overflow, 0);
}

#[test]
fn maturity_boss_reward_scenario() {
    // 400 XP strength takes a boss battle reward.
    let update = apply_maturity_delta(400, 150);
    assert_eq!(update.new_xp, 550);
    assert_eq!(update.previous_level, MaturityLevel::Sponge);
    assert_eq!(update.new_level, MaturityLevel::Connector);
    assert_eq!(update.xp_overflow, 50);
    assert!(update.leveled_up);
}

#[test]
fn maturity_tier_lookup() {
    assert_eq!(maturity_for_xp(0).level, MaturityLevel::Sponge);
    assert_eq!(maturity_for_xp(499).level, MaturityLevel::Sponge);
    assert_eq!(maturity_for_xp(500).level, MaturityLevel::Connector);
    assert_eq!(maturity_for_xp(1_500).level, MaturityLevel::Guide);
    assert_eq!(maturity_for_xp(5_000).level, MaturityLevel::Alchemist);
}

#[test]
fn progress_percentages() {
    // Level 1 spans 0..=500.
    assert!((user_progress_percentage(250) - 50.0).abs() < 1e-9);
    // The top tier always reads 100%.
    assert_eq!(user_progress_percentage(200_000), 100.0);
    // Maturity top tier rolls over a 1000-XP milestone.
    assert!((maturity_progress_percentage(5_250) - 25.0).abs() < 1e-9);
    assert!((maturity_progress_percentage(6_250) - 25.0).abs() < 1e-9);
    // Below the top tier it behaves like the user scale.
    assert!((maturity_progress_percentage(0) - 0.0).abs() < 1e-9);
}

#[test]
fn streak_multiplier_tiers() {
    assert_eq!(multiplier_for(1), 1.0);
    assert_eq!(multiplier_for(2), 1.0);
    assert_eq!(multiplier_for(3), 1.10);
    assert_eq!(multiplier_for(7), 1.25);
    assert_eq!(multiplier_for(14), 1.50);
    assert_eq!(multiplier_for(30), 2.00);
    assert_eq!(multiplier_for(90), 2.00);
}

#[test]
fn streak_advance_and_reset() {
    use chrono::{Duration, TimeZone, Utc};
    let now = Utc.with_ymd_and_hms(2025, 6, 2, 9, 0, 0).unwrap();

    // First ever activity.
    let update = advance(None, 0, now);
    assert_eq!(update.streak, 1);
    assert_eq!(update.multiplier, 1.0);

    // Inside the 48h window the streak extends.
    let update = advance(Some(now - Duration::hours(47)), 2, now);
    assert_eq!(update.streak, 3);
    assert_eq!(update.multiplier, 1.10);

    // Exactly 48h still counts.
    let update = advance(Some(now - Duration::hours(48)), 6, now);
    assert_eq!(update.streak, 7);
    assert_eq!(update.multiplier, 1.25);

    // Past the window the streak resets.
    let update = advance(Some(now - Duration::hours(49)), 29, now);
    assert_eq!(update.streak, 1);
    assert_eq!(update.multiplier, 1.0);
}
