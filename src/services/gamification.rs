//! The gamification orchestrator: sole writer of profile XP/level/streak
//! state and of the per-strength maturity rows. Every award path in the
//! engine funnels through `award_xp` or `award_strength_xp`.

use tracing::{debug, instrument};

use super::ensure_user;
use crate::database::models::{
    MaturityLevel, NewXpTransaction, ProfileAward, StrengthId, UserId, XpSource,
};
use crate::error::{EngineError, EngineResult};
use crate::model::Engine;
use crate::progression::{levels, round_half_up, streak};

/// Outcome of a user-level XP award.
#[derive(Debug, Clone, PartialEq)]
pub struct XpUpdateResult {
    /// XP actually credited, streak bonus included.
    pub xp_awarded: i64,
    /// The pre-multiplier amount the caller asked for.
    pub base_xp: i64,
    pub streak_multiplier: f64,
    pub current_streak: i32,
    pub total_xp: i64,
    pub previous_level: i32,
    pub new_level: i32,
    /// Every level boundary crossed by this award, in order.
    pub levels_gained: Vec<i32>,
    pub leveled_up: bool,
}

/// Outcome of a per-strength maturity award. No multiplier ever applies in
/// this namespace; the streak bonus lives in the user-level scale only.
#[derive(Debug, Clone, PartialEq)]
pub struct StrengthXpResult {
    pub strength_id: i32,
    pub xp_current: i64,
    pub previous_level: MaturityLevel,
    pub new_level: MaturityLevel,
    pub levels_gained: Vec<MaturityLevel>,
    /// XP carried past the floor of the resulting tier.
    pub xp_overflow: i64,
    pub leveled_up: bool,
}

/// Awards XP to a user's profile.
///
/// Ensures the profile exists, applies the streak multiplier when asked,
/// recomputes the level from the threshold table, and commits the profile
/// update together with its ledger entry. The commit is an optimistic
/// check-and-set on the profile row; on a lost race the whole computation is
/// redone from fresh state.
#[instrument(
    level = "debug",
    skip(engine, user, source),
    fields(user_id = user.get(), source = source.as_str())
)]
pub async fn award_xp(
    engine: &Engine,
    user: UserId,
    amount: i64,
    source: XpSource,
    apply_streak_bonus: bool,
) -> EngineResult<XpUpdateResult> {
    ensure_user(user)?;
    if amount <= 0 {
        return Err(EngineError::Validation(format!(
            "xp amount must be positive, got {amount}"
        )));
    }

    let now = engine.clock.now();
    for attempt in 0..engine.config.award_retry_attempts {
        let profile = engine.store.get_or_create_profile(user.get()).await?;

        let (current_streak, multiplier, last_activity_date) = if apply_streak_bonus {
            let update = streak::advance(profile.last_activity_date, profile.current_streak, now);
            (update.streak, update.multiplier, Some(now))
        } else {
            // Fixed rewards (badges) leave the streak state untouched.
            (profile.current_streak, 1.0, profile.last_activity_date)
        };

        let xp_with_bonus = round_half_up(amount as f64 * multiplier);
        let update = levels::apply_user_delta(profile.xp_total, xp_with_bonus);

        let mut modules = profile.modules_completed;
        let mut challenges = profile.challenges_completed;
        let mut collaborative = profile.collaborative_challenges;
        match source {
            XpSource::ModuleCompleted => modules += 1,
            XpSource::ChallengeCompleted => challenges += 1,
            XpSource::CollaborativeBonus => collaborative += 1,
            _ => {}
        }

        let award = ProfileAward {
            user_id: user.get(),
            xp_total: update.new_xp,
            current_level: update.new_level,
            current_streak,
            longest_streak: profile.longest_streak.max(current_streak),
            last_activity_date,
            modules_completed: modules,
            challenges_completed: challenges,
            collaborative_challenges: collaborative,
            transaction: NewXpTransaction {
                user_id: user.get(),
                amount: xp_with_bonus,
                source,
                streak_bonus: xp_with_bonus - amount,
                created_at: now,
            },
        };

        if engine.store.commit_award(&award, profile.xp_total).await? {
            if update.leveled_up {
                debug!(
                    previous = update.previous_level,
                    new = update.new_level,
                    "level up"
                );
            }
            return Ok(XpUpdateResult {
                xp_awarded: xp_with_bonus,
                base_xp: amount,
                streak_multiplier: multiplier,
                current_streak,
                total_xp: update.new_xp,
                previous_level: update.previous_level,
                new_level: update.new_level,
                levels_gained: update.levels_crossed,
                leveled_up: update.leveled_up,
            });
        }
        debug!(attempt, "profile award lost optimistic race, retrying");
    }
    Err(EngineError::StateConflict(
        "concurrent profile updates exhausted retries".into(),
    ))
}

/// Awards XP in the per-strength maturity namespace. Independent from the
/// user scale; the two are never conflated.
#[instrument(
    level = "debug",
    skip(engine, user, strength),
    fields(user_id = user.get(), strength_id = strength.get())
)]
pub async fn award_strength_xp(
    engine: &Engine,
    user: UserId,
    strength: StrengthId,
    amount: i64,
) -> EngineResult<StrengthXpResult> {
    ensure_user(user)?;
    if strength.get() <= 0 {
        return Err(EngineError::Validation(format!(
            "malformed strength id {}",
            strength.get()
        )));
    }
    if amount <= 0 {
        return Err(EngineError::Validation(format!(
            "xp amount must be positive, got {amount}"
        )));
    }

    for attempt in 0..engine.config.award_retry_attempts {
        let row = engine
            .store
            .get_or_create_maturity(user.get(), strength.get())
            .await?;
        let update = levels::apply_maturity_delta(row.xp_current, amount);
        let committed = engine
            .store
            .commit_maturity(
                user.get(),
                strength.get(),
                update.new_xp,
                update.new_level,
                row.xp_current,
            )
            .await?;
        if committed {
            if update.leveled_up {
                debug!(
                    previous = update.previous_level.display_name(),
                    new = update.new_level.display_name(),
                    "maturity level up"
                );
            }
            return Ok(StrengthXpResult {
                strength_id: strength.get(),
                xp_current: update.new_xp,
                previous_level: update.previous_level,
                new_level: update.new_level,
                levels_gained: update.levels_crossed,
                xp_overflow: update.xp_overflow,
                leveled_up: update.leveled_up,
            });
        }
        debug!(attempt, "maturity award lost optimistic race, retrying");
    }
    Err(EngineError::StateConflict(
        "concurrent maturity updates exhausted retries".into(),
    ))
}
