//! Pure time-window arithmetic for quest cooldowns, daily expiration, and the
//! cooperative confirmation deadline. All functions take `now` explicitly so
//! they stay deterministic under a fixed clock.

use chrono::{DateTime, Duration, Utc};

use crate::constants::{
    BOSS_BATTLE_COOLDOWN_HOURS, COMBO_BREAKER_COOLDOWN_HOURS, COOP_CONFIRMATION_HOURS,
    COOPERATIVE_COOLDOWN_HOURS, DAILY_EXPIRY_HOURS,
};
use crate::database::models::QuestType;

/// Post-completion cooldown for a quest type. Daily quests have none.
pub fn cooldown_hours(quest_type: QuestType) -> Option<i64> {
    match quest_type {
        QuestType::Daily => None,
        QuestType::BossBattle => Some(BOSS_BATTLE_COOLDOWN_HOURS),
        QuestType::ComboBreaker => Some(COMBO_BREAKER_COOLDOWN_HOURS),
        QuestType::Cooperative => Some(COOPERATIVE_COOLDOWN_HOURS),
    }
}

/// Cooldown actually in force for a template: a catalog override when the
/// template carries one, the type default otherwise.
pub fn effective_cooldown_hours(quest_type: QuestType, override_hours: Option<i32>) -> Option<i64> {
    override_hours.map(i64::from).or_else(|| cooldown_hours(quest_type))
}

/// Decomposed view of a cooldown window, suitable for direct display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CooldownStatus {
    pub in_cooldown: bool,
    pub ends_at: Option<DateTime<Utc>>,
    pub remaining_hours: i64,
    pub remaining_minutes: i64,
    pub remaining_seconds: i64,
    /// How much of the cooldown has elapsed, 0..=100.
    pub percent_elapsed: f64,
}

impl CooldownStatus {
    fn clear() -> Self {
        Self {
            in_cooldown: false,
            ends_at: None,
            remaining_hours: 0,
            remaining_minutes: 0,
            remaining_seconds: 0,
            percent_elapsed: 100.0,
        }
    }
}

/// True iff the type has a configured cooldown, a completion exists, and the
/// window has not yet elapsed.
pub fn is_in_cooldown(
    quest_type: QuestType,
    last_completed_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> bool {
    match (cooldown_hours(quest_type), last_completed_at) {
        (Some(hours), Some(last)) => now < last + Duration::hours(hours),
        _ => false,
    }
}

/// Full cooldown status, including the remaining window broken into
/// hours/minutes/seconds and the percentage already elapsed.
pub fn status(
    quest_type: QuestType,
    last_completed_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> CooldownStatus {
    let (hours, last) = match (cooldown_hours(quest_type), last_completed_at) {
        (Some(hours), Some(last)) => (hours, last),
        _ => return CooldownStatus::clear(),
    };
    let duration = Duration::hours(hours);
    let ends_at = last + duration;
    if now >= ends_at {
        return CooldownStatus::clear();
    }
    let remaining = ends_at - now;
    let elapsed = now - last;
    CooldownStatus {
        in_cooldown: true,
        ends_at: Some(ends_at),
        remaining_hours: remaining.num_hours(),
        remaining_minutes: remaining.num_minutes() % 60,
        remaining_seconds: remaining.num_seconds() % 60,
        percent_elapsed: (elapsed.num_seconds() as f64 / duration.num_seconds() as f64 * 100.0)
            .clamp(0.0, 100.0),
    }
}

/// Daily quests expire 24h after assignment, regardless of status.
pub fn daily_expires_at(started_at: DateTime<Utc>) -> DateTime<Utc> {
    started_at + Duration::hours(DAILY_EXPIRY_HOURS)
}

/// Cooperative quests must be confirmed within 48h of being requested. This
/// window is independent of the post-completion cooldown.
pub fn confirmation_deadline(requested_at: DateTime<Utc>) -> DateTime<Utc> {
    requested_at + Duration::hours(COOP_CONFIRMATION_HOURS)
}

/// Lazy expiry check against a stored deadline.
pub fn is_past_deadline(expires_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    matches!(expires_at, Some(deadline) if now > deadline)
}
