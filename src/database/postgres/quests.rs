//! Quest catalog and quest instance persistence. Status transitions are
//! check-and-set updates so two racing writers can never both succeed.

use chrono::{DateTime, Utc};

use super::super::models::{NewQuestCompletion, QuestCompletion, QuestTemplate, QuestType};
use super::super::DbPool;

const TEMPLATE_COLUMNS: &str = "template_id, strength_id, quest_type, title, difficulty, \
     xp_reward, requires_partner, cooldown_hours";

const COMPLETION_COLUMNS: &str = "completion_id, user_id, template_id, strength_id, quest_type, \
     status, started_at, expires_at, completed_at, confirmed_by, confirmed_at, xp_awarded";

pub async fn templates_for_strengths(
    pool: &DbPool,
    strength_ids: &[i32],
    quest_type: Option<QuestType>,
) -> Result<Vec<QuestTemplate>, sqlx::Error> {
    let ids = strength_ids.to_vec();
    match quest_type {
        Some(quest_type) => {
            sqlx::query_as::<_, QuestTemplate>(&format!(
                "SELECT {TEMPLATE_COLUMNS} FROM quest_templates \
                 WHERE strength_id = ANY($1) AND quest_type = $2 ORDER BY template_id"
            ))
            .bind(ids)
            .bind(quest_type)
            .fetch_all(pool)
            .await
        }
        None => {
            sqlx::query_as::<_, QuestTemplate>(&format!(
                "SELECT {TEMPLATE_COLUMNS} FROM quest_templates \
                 WHERE strength_id = ANY($1) ORDER BY template_id"
            ))
            .bind(ids)
            .fetch_all(pool)
            .await
        }
    }
}

pub async fn get_template(
    pool: &DbPool,
    template_id: i32,
) -> Result<Option<QuestTemplate>, sqlx::Error> {
    sqlx::query_as::<_, QuestTemplate>(&format!(
        "SELECT {TEMPLATE_COLUMNS} FROM quest_templates WHERE template_id = $1"
    ))
    .bind(template_id)
    .fetch_optional(pool)
    .await
}

pub async fn insert_completion(
    pool: &DbPool,
    new: NewQuestCompletion,
) -> Result<QuestCompletion, sqlx::Error> {
    sqlx::query_as::<_, QuestCompletion>(&format!(
        "INSERT INTO quest_completions \
            (user_id, template_id, strength_id, quest_type, status, started_at, expires_at) \
         VALUES ($1, $2, $3, $4, 'available', $5, $6) \
         RETURNING {COMPLETION_COLUMNS}"
    ))
    .bind(new.user_id)
    .bind(new.template_id)
    .bind(new.strength_id)
    .bind(new.quest_type)
    .bind(new.started_at)
    .bind(new.expires_at)
    .fetch_one(pool)
    .await
}

pub async fn get_completion(
    pool: &DbPool,
    completion_id: i64,
) -> Result<Option<QuestCompletion>, sqlx::Error> {
    sqlx::query_as::<_, QuestCompletion>(&format!(
        "SELECT {COMPLETION_COLUMNS} FROM quest_completions WHERE completion_id = $1"
    ))
    .bind(completion_id)
    .fetch_optional(pool)
    .await
}

pub async fn active_for_user(
    pool: &DbPool,
    user_id: i64,
) -> Result<Vec<QuestCompletion>, sqlx::Error> {
    sqlx::query_as::<_, QuestCompletion>(&format!(
        "SELECT {COMPLETION_COLUMNS} FROM quest_completions \
         WHERE user_id = $1 AND status IN ('available', 'in_progress') \
         ORDER BY completion_id"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn daily_generated_between(
    pool: &DbPool,
    user_id: i64,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(\
            SELECT 1 FROM quest_completions \
            WHERE user_id = $1 AND quest_type = 'daily' \
              AND started_at >= $2 AND started_at < $3)",
    )
    .bind(user_id)
    .bind(from)
    .bind(to)
    .fetch_one(pool)
    .await
}

pub async fn try_start(pool: &DbPool, completion_id: i64) -> Result<bool, sqlx::Error> {
    let updated = sqlx::query(
        "UPDATE quest_completions SET status = 'in_progress' \
         WHERE completion_id = $1 AND status = 'available'",
    )
    .bind(completion_id)
    .execute(pool)
    .await?;
    Ok(updated.rows_affected() == 1)
}

pub async fn try_complete(
    pool: &DbPool,
    completion_id: i64,
    completed_at: DateTime<Utc>,
    confirmed_by: Option<i64>,
    confirmed_at: Option<DateTime<Utc>>,
    xp_awarded: i64,
) -> Result<bool, sqlx::Error> {
    let updated = sqlx::query(
        "UPDATE quest_completions SET \
            status = 'completed', completed_at = $2, confirmed_by = $3, \
            confirmed_at = $4, xp_awarded = $5 \
         WHERE completion_id = $1 AND status IN ('available', 'in_progress')",
    )
    .bind(completion_id)
    .bind(completed_at)
    .bind(confirmed_by)
    .bind(confirmed_at)
    .bind(xp_awarded)
    .execute(pool)
    .await?;
    Ok(updated.rows_affected() == 1)
}

pub async fn try_expire(pool: &DbPool, completion_id: i64) -> Result<bool, sqlx::Error> {
    let updated = sqlx::query(
        "UPDATE quest_completions SET status = 'expired' \
         WHERE completion_id = $1 AND status IN ('available', 'in_progress')",
    )
    .bind(completion_id)
    .execute(pool)
    .await?;
    Ok(updated.rows_affected() == 1)
}

pub async fn last_completed_at(
    pool: &DbPool,
    user_id: i64,
    strength_id: i32,
    quest_type: QuestType,
) -> Result<Option<DateTime<Utc>>, sqlx::Error> {
    sqlx::query_scalar::<_, Option<DateTime<Utc>>>(
        "SELECT MAX(completed_at) FROM quest_completions \
         WHERE user_id = $1 AND strength_id = $2 AND quest_type = $3 \
           AND status = 'completed'",
    )
    .bind(user_id)
    .bind(strength_id)
    .bind(quest_type)
    .fetch_one(pool)
    .await
}
