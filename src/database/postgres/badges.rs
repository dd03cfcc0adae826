//! Badge catalog, unlock records, and the collaborator-owned report counts.
//! The criteria string tag lives only here; it is mapped into the
//! `BadgeCriteria` sum type before anything else sees it.

use chrono::{DateTime, Utc};
use tracing::warn;

use super::super::models::{Badge, BadgeCriteria, BadgeTier};
use super::super::DbPool;

/// Raw catalog row; `criteria_type`/`threshold`/`period_days` are the
/// persistence encoding of `BadgeCriteria`.
#[derive(sqlx::FromRow)]
struct BadgeRow {
    badge_id: i32,
    badge_key: String,
    tier: BadgeTier,
    criteria_type: String,
    threshold: Option<i64>,
    period_days: Option<i32>,
    xp_reward: i64,
    active: bool,
}

fn criteria_from_row(row: &BadgeRow) -> Option<BadgeCriteria> {
    let threshold = row.threshold;
    Some(match row.criteria_type.as_str() {
        "xp" => BadgeCriteria::Xp { threshold: threshold? },
        "modules" => BadgeCriteria::Modules { threshold: threshold? },
        "challenges" => BadgeCriteria::Challenges { threshold: threshold? },
        "streak" => BadgeCriteria::Streak {
            threshold: threshold? as i32,
        },
        "collaborative" => BadgeCriteria::Collaborative { threshold: threshold? },
        "level" => BadgeCriteria::Level {
            threshold: threshold? as i32,
        },
        "assessment_completed" => BadgeCriteria::AssessmentCompleted,
        "feedbacks_given" => BadgeCriteria::FeedbacksGiven {
            threshold: threshold?,
            period_days: row.period_days.map(|d| d as u32),
        },
        "feedbacks_received" => BadgeCriteria::FeedbacksReceived { threshold: threshold? },
        "retake_after_feedback" => BadgeCriteria::RetakeAfterFeedback,
        "report_individual_generated" => BadgeCriteria::ReportIndividualGenerated,
        "report_team_generated" => BadgeCriteria::ReportTeamGenerated,
        _ => return None,
    })
}

/// Active badge catalog. Rows with an unknown criteria type are skipped with a
/// warning rather than failing the whole evaluation pass.
pub async fn active(pool: &DbPool) -> Result<Vec<Badge>, sqlx::Error> {
    let rows = sqlx::query_as::<_, BadgeRow>(
        "SELECT badge_id, badge_key, tier, criteria_type, threshold, period_days, \
                xp_reward, active \
         FROM badges WHERE active = TRUE ORDER BY badge_id",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows
        .into_iter()
        .filter_map(|row| match criteria_from_row(&row) {
            Some(criteria) => Some(Badge {
                badge_id: row.badge_id,
                key: row.badge_key,
                tier: row.tier,
                criteria,
                xp_reward: row.xp_reward,
                active: row.active,
            }),
            None => {
                warn!(
                    badge_id = row.badge_id,
                    criteria_type = %row.criteria_type,
                    "skipping badge with unrecognized criteria"
                );
                None
            }
        })
        .collect())
}

pub async fn unlocked_ids(pool: &DbPool, user_id: i64) -> Result<Vec<i32>, sqlx::Error> {
    sqlx::query_scalar::<_, i32>(
        "SELECT badge_id FROM unlocked_badges WHERE user_id = $1 ORDER BY badge_id",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// First-writer-wins unlock insert; the unique (user_id, badge_id) constraint
/// makes the duplicate a no-op.
pub async fn try_unlock(
    pool: &DbPool,
    user_id: i64,
    badge_id: i32,
    unlocked_at: DateTime<Utc>,
) -> Result<bool, sqlx::Error> {
    let inserted = sqlx::query(
        "INSERT INTO unlocked_badges (user_id, badge_id, unlocked_at) VALUES ($1, $2, $3) \
         ON CONFLICT (user_id, badge_id) DO NOTHING",
    )
    .bind(user_id)
    .bind(badge_id)
    .bind(unlocked_at)
    .execute(pool)
    .await?;
    Ok(inserted.rows_affected() == 1)
}

/// (individual, team) report counts from the reporting collaborator.
pub async fn report_counts(pool: &DbPool, user_id: i64) -> Result<(i64, i64), sqlx::Error> {
    sqlx::query_as::<_, (i64, i64)>(
        "SELECT COUNT(*) FILTER (WHERE report_type = 'individual'), \
                COUNT(*) FILTER (WHERE report_type = 'team') \
         FROM generated_reports WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await
}
