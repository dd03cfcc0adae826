//! Append-only XP ledger reads. Writes happen inside `profile::commit_award`
//! so the ledger entry and the profile update share one transaction.

use chrono::{DateTime, Utc};
use tracing::warn;

use super::super::models::{XpSource, XpTransaction};
use super::super::DbPool;

#[derive(sqlx::FromRow)]
struct LedgerRow {
    transaction_id: i64,
    user_id: i64,
    amount: i64,
    source: String,
    streak_bonus: i64,
    created_at: DateTime<Utc>,
}

pub async fn count(
    pool: &DbPool,
    user_id: i64,
    source: XpSource,
    since: Option<DateTime<Utc>>,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM xp_transactions \
         WHERE user_id = $1 AND source = $2 \
           AND ($3::timestamptz IS NULL OR created_at >= $3)",
    )
    .bind(user_id)
    .bind(source.as_str())
    .bind(since)
    .fetch_one(pool)
    .await
}

pub async fn nth_at(
    pool: &DbPool,
    user_id: i64,
    source: XpSource,
    n: u32,
) -> Result<Option<DateTime<Utc>>, sqlx::Error> {
    if n == 0 {
        return Ok(None);
    }
    sqlx::query_scalar::<_, DateTime<Utc>>(
        "SELECT created_at FROM xp_transactions \
         WHERE user_id = $1 AND source = $2 \
         ORDER BY created_at ASC, transaction_id ASC OFFSET $3 LIMIT 1",
    )
    .bind(user_id)
    .bind(source.as_str())
    .bind(i64::from(n) - 1)
    .fetch_optional(pool)
    .await
}

pub async fn has_after(
    pool: &DbPool,
    user_id: i64,
    source: XpSource,
    after: DateTime<Utc>,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(\
            SELECT 1 FROM xp_transactions \
            WHERE user_id = $1 AND source = $2 AND created_at > $3)",
    )
    .bind(user_id)
    .bind(source.as_str())
    .bind(after)
    .fetch_one(pool)
    .await
}

pub async fn recent(
    pool: &DbPool,
    user_id: i64,
    limit: i64,
) -> Result<Vec<XpTransaction>, sqlx::Error> {
    let rows = sqlx::query_as::<_, LedgerRow>(
        "SELECT transaction_id, user_id, amount, source, streak_bonus, created_at \
         FROM xp_transactions WHERE user_id = $1 \
         ORDER BY created_at DESC, transaction_id DESC LIMIT $2",
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows
        .into_iter()
        .filter_map(|row| match XpSource::parse(&row.source) {
            Some(source) => Some(XpTransaction {
                transaction_id: row.transaction_id,
                user_id: row.user_id,
                amount: row.amount,
                source,
                streak_bonus: row.streak_bonus,
                created_at: row.created_at,
            }),
            None => {
                warn!(
                    transaction_id = row.transaction_id,
                    source = %row.source,
                    "ledger row with unrecognized source label"
                );
                None
            }
        })
        .collect())
}
