//! Strength maturity reads/writes. Each (user, strength) row is its own unit
//! of contention, guarded the same way as the profile row.

use super::super::models::{MaturityLevel, StrengthMaturity};
use super::super::DbPool;

const MATURITY_COLUMNS: &str = "user_id, strength_id, xp_current, maturity_level";

pub async fn get_or_create(
    pool: &DbPool,
    user_id: i64,
    strength_id: i32,
) -> Result<StrengthMaturity, sqlx::Error> {
    let inserted = sqlx::query_as::<_, StrengthMaturity>(&format!(
        "INSERT INTO strength_maturities (user_id, strength_id) VALUES ($1, $2) \
         ON CONFLICT (user_id, strength_id) DO NOTHING RETURNING {MATURITY_COLUMNS}"
    ))
    .bind(user_id)
    .bind(strength_id)
    .fetch_optional(pool)
    .await?;
    if let Some(row) = inserted {
        return Ok(row);
    }
    sqlx::query_as::<_, StrengthMaturity>(&format!(
        "SELECT {MATURITY_COLUMNS} FROM strength_maturities \
         WHERE user_id = $1 AND strength_id = $2"
    ))
    .bind(user_id)
    .bind(strength_id)
    .fetch_one(pool)
    .await
}

pub async fn commit(
    pool: &DbPool,
    user_id: i64,
    strength_id: i32,
    xp_current: i64,
    maturity_level: MaturityLevel,
    expected_xp_current: i64,
) -> Result<bool, sqlx::Error> {
    let updated = sqlx::query(
        "UPDATE strength_maturities SET xp_current = $1, maturity_level = $2 \
         WHERE user_id = $3 AND strength_id = $4 AND xp_current = $5",
    )
    .bind(xp_current)
    .bind(maturity_level)
    .bind(user_id)
    .bind(strength_id)
    .bind(expected_xp_current)
    .execute(pool)
    .await?;
    Ok(updated.rows_affected() == 1)
}

pub async fn for_user(pool: &DbPool, user_id: i64) -> Result<Vec<StrengthMaturity>, sqlx::Error> {
    sqlx::query_as::<_, StrengthMaturity>(&format!(
        "SELECT {MATURITY_COLUMNS} FROM strength_maturities \
         WHERE user_id = $1 ORDER BY strength_id"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await
}
