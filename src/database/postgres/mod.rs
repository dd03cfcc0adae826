//! Postgres-backed `GamificationStore`. Queries are bound at runtime so the
//! crate builds without a live database; the schema (owned by the persistence
//! collaborator) is expected to provide: `gamification_profiles`,
//! `strength_maturities`, `user_strengths`, `quest_templates`,
//! `quest_completions`, `badges`, `unlocked_badges`, `generated_reports`, and
//! `xp_transactions`.

mod badges;
mod ledger;
mod maturity;
mod profile;
mod quests;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::models::{
    Badge, GamificationProfile, MaturityLevel, NewQuestCompletion, ProfileAward, QuestCompletion,
    QuestTemplate, QuestType, StrengthMaturity, XpSource, XpTransaction,
};
use super::{DbPool, GamificationStore};
use crate::error::EngineResult;

pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GamificationStore for PgStore {
    async fn get_or_create_profile(&self, user_id: i64) -> EngineResult<GamificationProfile> {
        Ok(profile::get_or_create(&self.pool, user_id).await?)
    }

    async fn get_profile(&self, user_id: i64) -> EngineResult<Option<GamificationProfile>> {
        Ok(profile::get(&self.pool, user_id).await?)
    }

    async fn commit_award(
        &self,
        award: &ProfileAward,
        expected_xp_total: i64,
    ) -> EngineResult<bool> {
        Ok(profile::commit_award(&self.pool, award, expected_xp_total).await?)
    }

    async fn get_or_create_maturity(
        &self,
        user_id: i64,
        strength_id: i32,
    ) -> EngineResult<StrengthMaturity> {
        Ok(maturity::get_or_create(&self.pool, user_id, strength_id).await?)
    }

    async fn commit_maturity(
        &self,
        user_id: i64,
        strength_id: i32,
        xp_current: i64,
        maturity_level: MaturityLevel,
        expected_xp_current: i64,
    ) -> EngineResult<bool> {
        Ok(maturity::commit(
            &self.pool,
            user_id,
            strength_id,
            xp_current,
            maturity_level,
            expected_xp_current,
        )
        .await?)
    }

    async fn maturities_for_user(&self, user_id: i64) -> EngineResult<Vec<StrengthMaturity>> {
        Ok(maturity::for_user(&self.pool, user_id).await?)
    }

    async fn user_strengths(&self, user_id: i64) -> EngineResult<Vec<i32>> {
        Ok(profile::user_strengths(&self.pool, user_id).await?)
    }

    async fn templates_for_strengths(
        &self,
        strength_ids: &[i32],
        quest_type: Option<QuestType>,
    ) -> EngineResult<Vec<QuestTemplate>> {
        Ok(quests::templates_for_strengths(&self.pool, strength_ids, quest_type).await?)
    }

    async fn get_template(&self, template_id: i32) -> EngineResult<Option<QuestTemplate>> {
        Ok(quests::get_template(&self.pool, template_id).await?)
    }

    async fn insert_quest_completion(
        &self,
        new: NewQuestCompletion,
    ) -> EngineResult<QuestCompletion> {
        Ok(quests::insert_completion(&self.pool, new).await?)
    }

    async fn get_quest_completion(
        &self,
        completion_id: i64,
    ) -> EngineResult<Option<QuestCompletion>> {
        Ok(quests::get_completion(&self.pool, completion_id).await?)
    }

    async fn active_quests(&self, user_id: i64) -> EngineResult<Vec<QuestCompletion>> {
        Ok(quests::active_for_user(&self.pool, user_id).await?)
    }

    async fn daily_generated_between(
        &self,
        user_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> EngineResult<bool> {
        Ok(quests::daily_generated_between(&self.pool, user_id, from, to).await?)
    }

    async fn try_start_quest(&self, completion_id: i64) -> EngineResult<bool> {
        Ok(quests::try_start(&self.pool, completion_id).await?)
    }

    async fn try_complete_quest(
        &self,
        completion_id: i64,
        completed_at: DateTime<Utc>,
        confirmed_by: Option<i64>,
        confirmed_at: Option<DateTime<Utc>>,
        xp_awarded: i64,
    ) -> EngineResult<bool> {
        Ok(quests::try_complete(
            &self.pool,
            completion_id,
            completed_at,
            confirmed_by,
            confirmed_at,
            xp_awarded,
        )
        .await?)
    }

    async fn try_expire_quest(&self, completion_id: i64) -> EngineResult<bool> {
        Ok(quests::try_expire(&self.pool, completion_id).await?)
    }

    async fn last_completed_at(
        &self,
        user_id: i64,
        strength_id: i32,
        quest_type: QuestType,
    ) -> EngineResult<Option<DateTime<Utc>>> {
        Ok(quests::last_completed_at(&self.pool, user_id, strength_id, quest_type).await?)
    }

    async fn active_badges(&self) -> EngineResult<Vec<Badge>> {
        Ok(badges::active(&self.pool).await?)
    }

    async fn unlocked_badge_ids(&self, user_id: i64) -> EngineResult<Vec<i32>> {
        Ok(badges::unlocked_ids(&self.pool, user_id).await?)
    }

    async fn try_unlock_badge(
        &self,
        user_id: i64,
        badge_id: i32,
        unlocked_at: DateTime<Utc>,
    ) -> EngineResult<bool> {
        Ok(badges::try_unlock(&self.pool, user_id, badge_id, unlocked_at).await?)
    }

    async fn report_counts(&self, user_id: i64) -> EngineResult<(i64, i64)> {
        Ok(badges::report_counts(&self.pool, user_id).await?)
    }

    async fn count_transactions(
        &self,
        user_id: i64,
        source: XpSource,
        since: Option<DateTime<Utc>>,
    ) -> EngineResult<i64> {
        Ok(ledger::count(&self.pool, user_id, source, since).await?)
    }

    async fn nth_transaction_at(
        &self,
        user_id: i64,
        source: XpSource,
        n: u32,
    ) -> EngineResult<Option<DateTime<Utc>>> {
        Ok(ledger::nth_at(&self.pool, user_id, source, n).await?)
    }

    async fn has_transaction_after(
        &self,
        user_id: i64,
        source: XpSource,
        after: DateTime<Utc>,
    ) -> EngineResult<bool> {
        Ok(ledger::has_after(&self.pool, user_id, source, after).await?)
    }

    async fn recent_transactions(
        &self,
        user_id: i64,
        limit: i64,
    ) -> EngineResult<Vec<XpTransaction>> {
        Ok(ledger::recent(&self.pool, user_id, limit).await?)
    }
}
