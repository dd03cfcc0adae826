//! Central constants for game balance and timing windows.

/// Base XP reward for a daily quest.
pub const DAILY_QUEST_XP: i64 = 50;
/// Boss battles pay out at 3x the daily base.
pub const BOSS_BATTLE_XP: i64 = 150;

/// How many daily quests a single generation pass hands out.
pub const DAILY_BATCH_SIZE: usize = 3;

/// A streak survives as long as consecutive activity stays within this window.
pub const STREAK_WINDOW_HOURS: i64 = 48;

/// Daily quests expire this long after they are handed out.
pub const DAILY_EXPIRY_HOURS: i64 = 24;
/// Cooperative quests must be confirmed within this window of being requested.
pub const COOP_CONFIRMATION_HOURS: i64 = 48;

// Post-completion cooldowns per quest type (hours). Daily quests have none.
pub const BOSS_BATTLE_COOLDOWN_HOURS: i64 = 168;
pub const COMBO_BREAKER_COOLDOWN_HOURS: i64 = 72;
pub const COOPERATIVE_COOLDOWN_HOURS: i64 = 48;

/// Attempts before an optimistic profile/maturity update gives up.
pub const AWARD_RETRY_ATTEMPTS: u32 = 3;
