//! Profile reads/writes. The profile row is the unit of contention for user
//! level awards; `commit_award` is an optimistic check-and-set guarded by the
//! prior `xp_total`, with the ledger append in the same transaction.

use super::super::models::{GamificationProfile, ProfileAward};
use super::super::DbPool;

const PROFILE_COLUMNS: &str = "user_id, xp_total, current_level, current_streak, longest_streak, \
     last_activity_date, modules_completed, challenges_completed, collaborative_challenges";

/// Fetches a user's profile, creating it with zero defaults if absent.
/// Insert-returning first, select fallback: guarantees we observe either the
/// freshly inserted row or the existing one, even under concurrent creation.
pub async fn get_or_create(
    pool: &DbPool,
    user_id: i64,
) -> Result<GamificationProfile, sqlx::Error> {
    let inserted = sqlx::query_as::<_, GamificationProfile>(&format!(
        "INSERT INTO gamification_profiles (user_id) VALUES ($1) \
         ON CONFLICT (user_id) DO NOTHING RETURNING {PROFILE_COLUMNS}"
    ))
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    if let Some(profile) = inserted {
        return Ok(profile);
    }
    sqlx::query_as::<_, GamificationProfile>(&format!(
        "SELECT {PROFILE_COLUMNS} FROM gamification_profiles WHERE user_id = $1"
    ))
    .bind(user_id)
    .fetch_one(pool)
    .await
}

pub async fn get(
    pool: &DbPool,
    user_id: i64,
) -> Result<Option<GamificationProfile>, sqlx::Error> {
    sqlx::query_as::<_, GamificationProfile>(&format!(
        "SELECT {PROFILE_COLUMNS} FROM gamification_profiles WHERE user_id = $1"
    ))
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

/// Profile update + ledger append in one transaction. Returns false (writing
/// nothing) when `expected_xp_total` no longer matches: the caller lost an
/// optimistic race and should recompute from fresh state.
pub async fn commit_award(
    pool: &DbPool,
    award: &ProfileAward,
    expected_xp_total: i64,
) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let updated = sqlx::query(
        "UPDATE gamification_profiles SET \
            xp_total = $1, current_level = $2, current_streak = $3, longest_streak = $4, \
            last_activity_date = $5, modules_completed = $6, challenges_completed = $7, \
            collaborative_challenges = $8 \
         WHERE user_id = $9 AND xp_total = $10",
    )
    .bind(award.xp_total)
    .bind(award.current_level)
    .bind(award.current_streak)
    .bind(award.longest_streak)
    .bind(award.last_activity_date)
    .bind(award.modules_completed)
    .bind(award.challenges_completed)
    .bind(award.collaborative_challenges)
    .bind(award.user_id)
    .bind(expected_xp_total)
    .execute(&mut *tx)
    .await?;
    if updated.rows_affected() == 0 {
        tx.rollback().await?;
        return Ok(false);
    }
    let t = &award.transaction;
    sqlx::query(
        "INSERT INTO xp_transactions (user_id, amount, source, streak_bonus, created_at) \
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(t.user_id)
    .bind(t.amount)
    .bind(t.source.as_str())
    .bind(t.streak_bonus)
    .bind(t.created_at)
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;
    Ok(true)
}

/// The strengths the user selected during assessment (collaborator-owned rows).
pub async fn user_strengths(pool: &DbPool, user_id: i64) -> Result<Vec<i32>, sqlx::Error> {
    sqlx::query_scalar::<_, i32>(
        "SELECT strength_id FROM user_strengths WHERE user_id = $1 ORDER BY strength_id",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}
