//! Read-only progress views for profile display: level, progress toward the
//! next threshold, streak state, per-strength maturity, and recent ledger
//! activity.

use tracing::instrument;

use super::ensure_user;
use crate::database::models::{MaturityLevel, UserId, XpTransaction};
use crate::error::EngineResult;
use crate::model::Engine;
use crate::progression::{levels, streak};

const RECENT_ACTIVITY_LIMIT: i64 = 10;

#[derive(Debug, Clone)]
pub struct StrengthProgress {
    pub strength_id: i32,
    pub maturity_level: MaturityLevel,
    pub xp_current: i64,
    /// Progress within the current tier; rolls over a 1000-XP milestone in
    /// the top tier.
    pub progress_percentage: f64,
}

#[derive(Debug, Clone)]
pub struct ProfileSummary {
    pub user_id: i64,
    pub xp_total: i64,
    pub level: i32,
    pub level_name: &'static str,
    pub progress_percentage: f64,
    /// XP still needed to reach the next tier; `None` at the top.
    pub xp_to_next_level: Option<i64>,
    pub current_streak: i32,
    pub longest_streak: i32,
    /// Multiplier the current streak earns.
    pub streak_multiplier: f64,
    pub modules_completed: i32,
    pub challenges_completed: i32,
    pub collaborative_challenges: i32,
    pub strengths: Vec<StrengthProgress>,
    pub recent_activity: Vec<XpTransaction>,
}

#[instrument(level = "debug", skip(engine, user), fields(user_id = user.get()))]
pub async fn progress_summary(engine: &Engine, user: UserId) -> EngineResult<ProfileSummary> {
    ensure_user(user)?;
    let profile = engine.store.get_or_create_profile(user.get()).await?;
    let tier = levels::user_level_for_xp(profile.xp_total);

    let strengths = engine
        .store
        .maturities_for_user(user.get())
        .await?
        .into_iter()
        .map(|row| StrengthProgress {
            strength_id: row.strength_id,
            maturity_level: row.maturity_level,
            progress_percentage: levels::maturity_progress_percentage(row.xp_current),
            xp_current: row.xp_current,
        })
        .collect();
    let recent_activity = engine
        .store
        .recent_transactions(user.get(), RECENT_ACTIVITY_LIMIT)
        .await?;

    Ok(ProfileSummary {
        user_id: profile.user_id,
        xp_total: profile.xp_total,
        level: tier.level,
        level_name: tier.name,
        progress_percentage: levels::user_progress_percentage(profile.xp_total),
        xp_to_next_level: tier.max_xp.map(|max| max + 1 - profile.xp_total),
        current_streak: profile.current_streak,
        longest_streak: profile.longest_streak,
        streak_multiplier: streak::multiplier_for(profile.current_streak),
        modules_completed: profile.modules_completed,
        challenges_completed: profile.challenges_completed,
        collaborative_challenges: profile.collaborative_challenges,
        strengths,
        recent_activity,
    })
}
