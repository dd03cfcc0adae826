//! Quest lifecycle: daily generation, on-demand requests, starting, and
//! completion. Expiry is never pushed by a scheduler; it is derived lazily by
//! comparing stored deadlines against the injected clock whenever a quest is
//! read or acted on.

use chrono::{Duration, NaiveTime};
use rand::seq::SliceRandom;
use tracing::{debug, instrument, warn};

use super::badges;
use super::ensure_user;
use super::gamification::{self, StrengthXpResult, XpUpdateResult};
use crate::database::models::{
    MaturityLevel, NewQuestCompletion, QuestCompletion, QuestTemplate, QuestType, StrengthId,
    UnlockedBadge, UserId, XpSource,
};
use crate::error::{EngineError, EngineResult};
use crate::model::Engine;
use crate::progression::cooldown::{self, CooldownStatus};

/// Result of a daily generation pass. Generation is idempotent per calendar
/// day: a second call the same day reports `AlreadyGenerated` rather than
/// erroring.
#[derive(Debug, Clone)]
pub enum DailyQuestBatch {
    Generated(Vec<QuestCompletion>),
    AlreadyGenerated,
}

/// Everything a caller needs to present a finished quest: the quest's fixed
/// reward, the maturity movement for its strength, the user-level award (the
/// only layer where the streak multiplier applies), and any badges that
/// unlocked as a consequence.
#[derive(Debug, Clone)]
pub struct QuestCompletionOutcome {
    pub completion_id: i64,
    pub xp_awarded: i64,
    pub strength: StrengthXpResult,
    pub profile: XpUpdateResult,
    pub unlocked_badges: Vec<UnlockedBadge>,
}

/// Generates today's daily quest batch for a user.
///
/// Strengths that already carry a non-terminal quest are excluded; among the
/// rest, selection prefers strengths not yet represented in today's picks
/// before allowing a second quest for the same strength.
#[instrument(level = "debug", skip(engine, user), fields(user_id = user.get()))]
pub async fn generate_daily_quests(engine: &Engine, user: UserId) -> EngineResult<DailyQuestBatch> {
    ensure_user(user)?;
    let now = engine.clock.now();
    let day_start = now.date_naive().and_time(NaiveTime::MIN).and_utc();
    let day_end = day_start + Duration::hours(24);

    if engine
        .store
        .daily_generated_between(user.get(), day_start, day_end)
        .await?
    {
        debug!("daily batch already generated today");
        return Ok(DailyQuestBatch::AlreadyGenerated);
    }

    let strengths = engine.store.user_strengths(user.get()).await?;
    if strengths.is_empty() {
        return Ok(DailyQuestBatch::Generated(Vec::new()));
    }

    // Expire lapsed instances lazily; live ones block their strength.
    let mut blocked: Vec<i32> = Vec::new();
    for quest in engine.store.active_quests(user.get()).await? {
        if cooldown::is_past_deadline(quest.expires_at, now) {
            engine.store.try_expire_quest(quest.completion_id).await?;
        } else {
            blocked.push(quest.strength_id);
        }
    }

    let mut pool = engine
        .store
        .templates_for_strengths(&strengths, Some(QuestType::Daily))
        .await?;
    pool.retain(|t| !blocked.contains(&t.strength_id));
    pool.shuffle(&mut rand::thread_rng());

    let selected = pick_with_variety(&pool, engine.config.daily_quest_count);
    let mut created = Vec::with_capacity(selected.len());
    for template in selected {
        let completion = engine
            .store
            .insert_quest_completion(NewQuestCompletion {
                user_id: user.get(),
                template_id: template.template_id,
                strength_id: template.strength_id,
                quest_type: QuestType::Daily,
                started_at: now,
                expires_at: Some(cooldown::daily_expires_at(now)),
            })
            .await?;
        created.push(completion);
    }
    debug!(count = created.len(), "daily quests generated");
    Ok(DailyQuestBatch::Generated(created))
}

/// Variety-first pick: one pass taking only unrepresented strengths, then a
/// second pass filling the remaining slots with repeats.
fn pick_with_variety<'a>(pool: &'a [QuestTemplate], count: usize) -> Vec<&'a QuestTemplate> {
    let mut selected: Vec<&QuestTemplate> = Vec::new();
    for template in pool {
        if selected.len() == count {
            break;
        }
        if !selected.iter().any(|s| s.strength_id == template.strength_id) {
            selected.push(template);
        }
    }
    for template in pool {
        if selected.len() == count {
            break;
        }
        if !selected.iter().any(|s| s.template_id == template.template_id) {
            selected.push(template);
        }
    }
    selected
}

/// Requests an on-demand quest instance (boss battle, combo breaker,
/// cooperative) from a catalog template. Daily quests normally arrive through
/// `generate_daily_quests` instead.
#[instrument(level = "debug", skip(engine, user), fields(user_id = user.get()))]
pub async fn request_quest(
    engine: &Engine,
    user: UserId,
    template_id: i32,
) -> EngineResult<QuestCompletion> {
    ensure_user(user)?;
    let template = engine
        .store
        .get_template(template_id)
        .await?
        .ok_or(EngineError::NotFound {
            what: "quest template",
            id: template_id as i64,
        })?;

    let strengths = engine.store.user_strengths(user.get()).await?;
    if !strengths.contains(&template.strength_id) {
        return Err(EngineError::Validation(format!(
            "strength {} is not configured for this user",
            template.strength_id
        )));
    }

    let now = engine.clock.now();
    for quest in engine.store.active_quests(user.get()).await? {
        if cooldown::is_past_deadline(quest.expires_at, now) {
            engine.store.try_expire_quest(quest.completion_id).await?;
        } else if quest.strength_id == template.strength_id {
            return Err(EngineError::StateConflict(format!(
                "strength {} already has an active quest",
                template.strength_id
            )));
        }
    }

    // Cooldown-bound types cannot be re-earned for the same strength until
    // the window since the last completion has elapsed.
    if let Some(hours) = cooldown::effective_cooldown_hours(template.quest_type, template.cooldown_hours) {
        let last = engine
            .store
            .last_completed_at(user.get(), template.strength_id, template.quest_type)
            .await?;
        if let Some(last) = last {
            let ends_at = last + Duration::hours(hours);
            if now < ends_at {
                return Err(EngineError::StateConflict(format!(
                    "quest type is cooling down until {ends_at}"
                )));
            }
        }
    }

    // Boss battles need a strength the user has grown past the entry tier.
    if template.quest_type == QuestType::BossBattle {
        let maturity = engine
            .store
            .get_or_create_maturity(user.get(), template.strength_id)
            .await?;
        if maturity.maturity_level < MaturityLevel::Connector {
            return Err(EngineError::StateConflict(format!(
                "boss battles unlock at Connector maturity; strength {} is still {}",
                template.strength_id,
                maturity.maturity_level.display_name()
            )));
        }
    }

    let expires_at = match template.quest_type {
        QuestType::Daily => Some(cooldown::daily_expires_at(now)),
        // The cooperative confirmation deadline doubles as the instance's
        // expiry; it is independent of the post-completion cooldown.
        QuestType::Cooperative => Some(cooldown::confirmation_deadline(now)),
        QuestType::BossBattle | QuestType::ComboBreaker => None,
    };
    engine
        .store
        .insert_quest_completion(NewQuestCompletion {
            user_id: user.get(),
            template_id: template.template_id,
            strength_id: template.strength_id,
            quest_type: template.quest_type,
            started_at: now,
            expires_at,
        })
        .await
}

/// Marks an Available quest as InProgress.
#[instrument(level = "debug", skip(engine, user), fields(user_id = user.get()))]
pub async fn start_quest(
    engine: &Engine,
    user: UserId,
    completion_id: i64,
) -> EngineResult<QuestCompletion> {
    ensure_user(user)?;
    let quest = fetch_owned(engine, user, completion_id).await?;
    let now = engine.clock.now();
    if quest.status.is_terminal() {
        return Err(EngineError::StateConflict(
            "quest is already finished".into(),
        ));
    }
    if cooldown::is_past_deadline(quest.expires_at, now) {
        engine.store.try_expire_quest(completion_id).await?;
        return Err(EngineError::StateConflict("quest has expired".into()));
    }
    if !engine.store.try_start_quest(completion_id).await? {
        return Err(EngineError::StateConflict(
            "quest is not available to start".into(),
        ));
    }
    engine
        .store
        .get_quest_completion(completion_id)
        .await?
        .ok_or(EngineError::NotFound {
            what: "quest",
            id: completion_id,
        })
}

/// Completes a quest and pays out its reward.
///
/// The reward raises the quest strength's maturity XP as-is, and the same
/// base amount goes through the user-level orchestrator where the streak
/// multiplier applies. That is the only layer that ever applies it. Badge
/// evaluation runs afterwards, best-effort: a failure there never rolls back
/// the award.
#[instrument(level = "debug", skip(engine, user), fields(user_id = user.get()))]
pub async fn complete_quest(
    engine: &Engine,
    user: UserId,
    completion_id: i64,
    confirmed_by: Option<UserId>,
) -> EngineResult<QuestCompletionOutcome> {
    ensure_user(user)?;
    let quest = fetch_owned(engine, user, completion_id).await?;
    if quest.status.is_terminal() {
        return Err(EngineError::StateConflict(
            "quest is already finished".into(),
        ));
    }
    let now = engine.clock.now();
    if cooldown::is_past_deadline(quest.expires_at, now) {
        engine.store.try_expire_quest(completion_id).await?;
        return Err(EngineError::StateConflict("quest has expired".into()));
    }
    let template = engine
        .store
        .get_template(quest.template_id)
        .await?
        .ok_or(EngineError::NotFound {
            what: "quest template",
            id: quest.template_id as i64,
        })?;

    let confirmed_by = match quest.quest_type {
        QuestType::Cooperative => {
            let partner = confirmed_by.ok_or_else(|| {
                EngineError::StateConflict(
                    "cooperative quest needs a confirming partner".into(),
                )
            })?;
            if partner.get() <= 0 {
                return Err(EngineError::Validation(format!(
                    "malformed partner id {}",
                    partner.get()
                )));
            }
            if partner == user {
                return Err(EngineError::Validation(
                    "a cooperative quest cannot be self-confirmed".into(),
                ));
            }
            Some(partner.get())
        }
        _ => None,
    };
    let confirmed_at = confirmed_by.map(|_| now);

    let xp = template.xp_reward;
    // Exactly one of two racing completions flips the row; the loser sees a
    // terminal state here and nothing below runs for it.
    let won = engine
        .store
        .try_complete_quest(completion_id, now, confirmed_by, confirmed_at, xp)
        .await?;
    if !won {
        return Err(EngineError::StateConflict(
            "quest was completed or expired concurrently".into(),
        ));
    }

    let strength =
        gamification::award_strength_xp(engine, user, StrengthId(quest.strength_id), xp).await?;
    let source = match quest.quest_type {
        QuestType::Cooperative => XpSource::CollaborativeBonus,
        _ => XpSource::ChallengeCompleted,
    };
    let profile = gamification::award_xp(engine, user, xp, source, true).await?;

    let unlocked_badges = match badges::check_badge_unlocks(engine, user).await {
        Ok(unlocked) => unlocked,
        Err(error) => {
            warn!(%error, "badge evaluation failed after quest completion");
            Vec::new()
        }
    };

    Ok(QuestCompletionOutcome {
        completion_id,
        xp_awarded: xp,
        strength,
        profile,
        unlocked_badges,
    })
}

/// Cooldown window for a quest type given its last completion, against the
/// engine clock.
pub fn cooldown_status(
    engine: &Engine,
    quest_type: QuestType,
    last_completed_at: Option<chrono::DateTime<chrono::Utc>>,
) -> CooldownStatus {
    cooldown::status(quest_type, last_completed_at, engine.clock.now())
}

async fn fetch_owned(
    engine: &Engine,
    user: UserId,
    completion_id: i64,
) -> EngineResult<QuestCompletion> {
    let quest = engine
        .store
        .get_quest_completion(completion_id)
        .await?
        .ok_or(EngineError::NotFound {
            what: "quest",
            id: completion_id,
        })?;
    // Someone else's quest id is indistinguishable from a missing one.
    if quest.user_id != user.get() {
        return Err(EngineError::NotFound {
            what: "quest",
            id: completion_id,
        });
    }
    Ok(quest)
}
