//! In-memory `GamificationStore` used by tests and lightweight embeddings.
//! Check-and-set semantics mirror the Postgres implementation: every guarded
//! write happens under one write lock, so exactly one racing writer wins.

use ahash::AHashMap;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::models::{
    Badge, GamificationProfile, MaturityLevel, NewQuestCompletion, ProfileAward, QuestCompletion,
    QuestStatus, QuestTemplate, QuestType, StrengthMaturity, XpSource, XpTransaction,
};
use super::GamificationStore;
use crate::error::EngineResult;

#[derive(Default)]
struct MemoryInner {
    profiles: AHashMap<i64, GamificationProfile>,
    maturities: AHashMap<(i64, i32), StrengthMaturity>,
    strengths: AHashMap<i64, Vec<i32>>,
    templates: AHashMap<i32, QuestTemplate>,
    completions: AHashMap<i64, QuestCompletion>,
    next_completion_id: i64,
    badges: Vec<Badge>,
    unlocked: AHashMap<i64, Vec<(i32, DateTime<Utc>)>>,
    reports: AHashMap<i64, (i64, i64)>,
    transactions: Vec<XpTransaction>,
    next_transaction_id: i64,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<MemoryInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // Catalog and collaborator fixtures. These rows are owned by other
    // services in production; tests seed them directly.

    pub async fn seed_template(&self, template: QuestTemplate) {
        let mut inner = self.inner.write().await;
        inner.templates.insert(template.template_id, template);
    }

    pub async fn seed_user_strengths(&self, user_id: i64, strengths: Vec<i32>) {
        let mut inner = self.inner.write().await;
        inner.strengths.insert(user_id, strengths);
    }

    pub async fn seed_badge(&self, badge: Badge) {
        let mut inner = self.inner.write().await;
        inner.badges.push(badge);
    }

    pub async fn seed_report_counts(&self, user_id: i64, individual: i64, team: i64) {
        let mut inner = self.inner.write().await;
        inner.reports.insert(user_id, (individual, team));
    }
}

fn blank_profile(user_id: i64) -> GamificationProfile {
    GamificationProfile {
        user_id,
        xp_total: 0,
        current_level: 1,
        current_streak: 0,
        longest_streak: 0,
        last_activity_date: None,
        modules_completed: 0,
        challenges_completed: 0,
        collaborative_challenges: 0,
    }
}

fn blank_maturity(user_id: i64, strength_id: i32) -> StrengthMaturity {
    StrengthMaturity {
        user_id,
        strength_id,
        xp_current: 0,
        maturity_level: MaturityLevel::Sponge,
    }
}

#[async_trait]
impl GamificationStore for MemoryStore {
    async fn get_or_create_profile(&self, user_id: i64) -> EngineResult<GamificationProfile> {
        let mut inner = self.inner.write().await;
        Ok(inner
            .profiles
            .entry(user_id)
            .or_insert_with(|| blank_profile(user_id))
            .clone())
    }

    async fn get_profile(&self, user_id: i64) -> EngineResult<Option<GamificationProfile>> {
        let inner = self.inner.read().await;
        Ok(inner.profiles.get(&user_id).cloned())
    }

    async fn commit_award(
        &self,
        award: &ProfileAward,
        expected_xp_total: i64,
    ) -> EngineResult<bool> {
        let mut inner = self.inner.write().await;
        match inner.profiles.get_mut(&award.user_id) {
            Some(profile) if profile.xp_total == expected_xp_total => {
                profile.xp_total = award.xp_total;
                profile.current_level = award.current_level;
                profile.current_streak = award.current_streak;
                profile.longest_streak = award.longest_streak;
                profile.last_activity_date = award.last_activity_date;
                profile.modules_completed = award.modules_completed;
                profile.challenges_completed = award.challenges_completed;
                profile.collaborative_challenges = award.collaborative_challenges;
            }
            _ => return Ok(false),
        }
        inner.next_transaction_id += 1;
        let transaction_id = inner.next_transaction_id;
        let t = &award.transaction;
        inner.transactions.push(XpTransaction {
            transaction_id,
            user_id: t.user_id,
            amount: t.amount,
            source: t.source,
            streak_bonus: t.streak_bonus,
            created_at: t.created_at,
        });
        Ok(true)
    }

    async fn get_or_create_maturity(
        &self,
        user_id: i64,
        strength_id: i32,
    ) -> EngineResult<StrengthMaturity> {
        let mut inner = self.inner.write().await;
        Ok(inner
            .maturities
            .entry((user_id, strength_id))
            .or_insert_with(|| blank_maturity(user_id, strength_id))
            .clone())
    }

    async fn commit_maturity(
        &self,
        user_id: i64,
        strength_id: i32,
        xp_current: i64,
        maturity_level: MaturityLevel,
        expected_xp_current: i64,
    ) -> EngineResult<bool> {
        let mut inner = self.inner.write().await;
        match inner.maturities.get_mut(&(user_id, strength_id)) {
            Some(row) if row.xp_current == expected_xp_current => {
                row.xp_current = xp_current;
                row.maturity_level = maturity_level;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn maturities_for_user(&self, user_id: i64) -> EngineResult<Vec<StrengthMaturity>> {
        let inner = self.inner.read().await;
        let mut rows: Vec<StrengthMaturity> = inner
            .maturities
            .values()
            .filter(|m| m.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by_key(|m| m.strength_id);
        Ok(rows)
    }

    async fn user_strengths(&self, user_id: i64) -> EngineResult<Vec<i32>> {
        let inner = self.inner.read().await;
        Ok(inner.strengths.get(&user_id).cloned().unwrap_or_default())
    }

    async fn templates_for_strengths(
        &self,
        strength_ids: &[i32],
        quest_type: Option<QuestType>,
    ) -> EngineResult<Vec<QuestTemplate>> {
        let inner = self.inner.read().await;
        let mut rows: Vec<QuestTemplate> = inner
            .templates
            .values()
            .filter(|t| strength_ids.contains(&t.strength_id))
            .filter(|t| quest_type.map_or(true, |q| t.quest_type == q))
            .cloned()
            .collect();
        rows.sort_by_key(|t| t.template_id);
        Ok(rows)
    }

    async fn get_template(&self, template_id: i32) -> EngineResult<Option<QuestTemplate>> {
        let inner = self.inner.read().await;
        Ok(inner.templates.get(&template_id).cloned())
    }

    async fn insert_quest_completion(
        &self,
        new: NewQuestCompletion,
    ) -> EngineResult<QuestCompletion> {
        let mut inner = self.inner.write().await;
        inner.next_completion_id += 1;
        let completion = QuestCompletion {
            completion_id: inner.next_completion_id,
            user_id: new.user_id,
            template_id: new.template_id,
            strength_id: new.strength_id,
            quest_type: new.quest_type,
            status: QuestStatus::Available,
            started_at: new.started_at,
            expires_at: new.expires_at,
            completed_at: None,
            confirmed_by: None,
            confirmed_at: None,
            xp_awarded: None,
        };
        inner
            .completions
            .insert(completion.completion_id, completion.clone());
        Ok(completion)
    }

    async fn get_quest_completion(
        &self,
        completion_id: i64,
    ) -> EngineResult<Option<QuestCompletion>> {
        let inner = self.inner.read().await;
        Ok(inner.completions.get(&completion_id).cloned())
    }

    async fn active_quests(&self, user_id: i64) -> EngineResult<Vec<QuestCompletion>> {
        let inner = self.inner.read().await;
        let mut rows: Vec<QuestCompletion> = inner
            .completions
            .values()
            .filter(|c| c.user_id == user_id && !c.status.is_terminal())
            .cloned()
            .collect();
        rows.sort_by_key(|c| c.completion_id);
        Ok(rows)
    }

    async fn daily_generated_between(
        &self,
        user_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> EngineResult<bool> {
        let inner = self.inner.read().await;
        Ok(inner.completions.values().any(|c| {
            c.user_id == user_id
                && c.quest_type == QuestType::Daily
                && c.started_at >= from
                && c.started_at < to
        }))
    }

    async fn try_start_quest(&self, completion_id: i64) -> EngineResult<bool> {
        let mut inner = self.inner.write().await;
        match inner.completions.get_mut(&completion_id) {
            Some(c) if c.status == QuestStatus::Available => {
                c.status = QuestStatus::InProgress;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn try_complete_quest(
        &self,
        completion_id: i64,
        completed_at: DateTime<Utc>,
        confirmed_by: Option<i64>,
        confirmed_at: Option<DateTime<Utc>>,
        xp_awarded: i64,
    ) -> EngineResult<bool> {
        let mut inner = self.inner.write().await;
        match inner.completions.get_mut(&completion_id) {
            Some(c) if !c.status.is_terminal() => {
                c.status = QuestStatus::Completed;
                c.completed_at = Some(completed_at);
                c.confirmed_by = confirmed_by;
                c.confirmed_at = confirmed_at;
                c.xp_awarded = Some(xp_awarded);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn try_expire_quest(&self, completion_id: i64) -> EngineResult<bool> {
        let mut inner = self.inner.write().await;
        match inner.completions.get_mut(&completion_id) {
            Some(c) if !c.status.is_terminal() => {
                c.status = QuestStatus::Expired;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn last_completed_at(
        &self,
        user_id: i64,
        strength_id: i32,
        quest_type: QuestType,
    ) -> EngineResult<Option<DateTime<Utc>>> {
        let inner = self.inner.read().await;
        Ok(inner
            .completions
            .values()
            .filter(|c| {
                c.user_id == user_id
                    && c.strength_id == strength_id
                    && c.quest_type == quest_type
                    && c.status == QuestStatus::Completed
            })
            .filter_map(|c| c.completed_at)
            .max())
    }

    async fn active_badges(&self) -> EngineResult<Vec<Badge>> {
        let inner = self.inner.read().await;
        Ok(inner.badges.iter().filter(|b| b.active).cloned().collect())
    }

    async fn unlocked_badge_ids(&self, user_id: i64) -> EngineResult<Vec<i32>> {
        let inner = self.inner.read().await;
        Ok(inner
            .unlocked
            .get(&user_id)
            .map(|rows| rows.iter().map(|(id, _)| *id).collect())
            .unwrap_or_default())
    }

    async fn try_unlock_badge(
        &self,
        user_id: i64,
        badge_id: i32,
        unlocked_at: DateTime<Utc>,
    ) -> EngineResult<bool> {
        let mut inner = self.inner.write().await;
        let rows = inner.unlocked.entry(user_id).or_default();
        if rows.iter().any(|(id, _)| *id == badge_id) {
            return Ok(false);
        }
        rows.push((badge_id, unlocked_at));
        Ok(true)
    }

    async fn report_counts(&self, user_id: i64) -> EngineResult<(i64, i64)> {
        let inner = self.inner.read().await;
        Ok(inner.reports.get(&user_id).copied().unwrap_or((0, 0)))
    }

    async fn count_transactions(
        &self,
        user_id: i64,
        source: XpSource,
        since: Option<DateTime<Utc>>,
    ) -> EngineResult<i64> {
        let inner = self.inner.read().await;
        Ok(inner
            .transactions
            .iter()
            .filter(|t| t.user_id == user_id && t.source == source)
            .filter(|t| since.map_or(true, |s| t.created_at >= s))
            .count() as i64)
    }

    async fn nth_transaction_at(
        &self,
        user_id: i64,
        source: XpSource,
        n: u32,
    ) -> EngineResult<Option<DateTime<Utc>>> {
        if n == 0 {
            return Ok(None);
        }
        let inner = self.inner.read().await;
        let mut stamps: Vec<DateTime<Utc>> = inner
            .transactions
            .iter()
            .filter(|t| t.user_id == user_id && t.source == source)
            .map(|t| t.created_at)
            .collect();
        stamps.sort();
        Ok(stamps.get(n as usize - 1).copied())
    }

    async fn has_transaction_after(
        &self,
        user_id: i64,
        source: XpSource,
        after: DateTime<Utc>,
    ) -> EngineResult<bool> {
        let inner = self.inner.read().await;
        Ok(inner
            .transactions
            .iter()
            .any(|t| t.user_id == user_id && t.source == source && t.created_at > after))
    }

    async fn recent_transactions(
        &self,
        user_id: i64,
        limit: i64,
    ) -> EngineResult<Vec<XpTransaction>> {
        let inner = self.inner.read().await;
        let mut rows: Vec<XpTransaction> = inner
            .transactions
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.transaction_id.cmp(&a.transaction_id)));
        rows.truncate(limit.max(0) as usize);
        Ok(rows)
    }
}
