//! Contains the business logic for activity streaks and their XP multiplier.

use chrono::{DateTime, Duration, Utc};

use crate::constants::STREAK_WINDOW_HOURS;

/// Result of advancing a streak for one qualifying activity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreakUpdate {
    pub streak: i32,
    pub multiplier: f64,
}

/// Multiplier is a non-decreasing step function of streak length.
pub fn multiplier_for(streak: i32) -> f64 {
    if streak >= 30 {
        2.00
    } else if streak >= 14 {
        1.50
    } else if streak >= 7 {
        1.25
    } else if streak >= 3 {
        1.10
    } else {
        1.0
    }
}

/// Advances a streak for an activity happening at `now`.
///
/// No prior activity starts a fresh streak. Activity within the 48h window
/// extends the streak; a longer gap resets it to 1. Pure function; the caller
/// persists the result.
pub fn advance(
    last_activity: Option<DateTime<Utc>>,
    current_streak: i32,
    now: DateTime<Utc>,
) -> StreakUpdate {
    let streak = match last_activity {
        Some(last) if now - last <= Duration::hours(STREAK_WINDOW_HOURS) => current_streak + 1,
        _ => 1,
    };
    StreakUpdate {
        streak,
        multiplier: multiplier_for(streak),
    }
}
