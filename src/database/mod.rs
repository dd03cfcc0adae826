//! Persistence port for the engine. `GamificationStore` is the read/write
//! contract every component depends on; the schema behind it belongs to the
//! persistence collaborator. Two implementations live here: `postgres` for
//! production and `memory` for tests and embedding.

pub mod memory;
pub mod models;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};

use crate::error::EngineResult;
use models::{
    Badge, GamificationProfile, MaturityLevel, NewQuestCompletion, ProfileAward, QuestCompletion,
    QuestTemplate, QuestType, StrengthMaturity, XpSource, XpTransaction,
};

/// A type alias for the database connection pool (`Pool<Postgres>`).
pub type DbPool = Pool<Postgres>;

/// Read/write contract with the persistence collaborator. Row-level atomicity
/// is assumed: the `try_*` and `commit_*` methods are check-and-set operations
/// where exactly one of two racing writers succeeds.
#[async_trait]
pub trait GamificationStore: Send + Sync {
    // --- Gamification profiles ---

    /// Fetches a user's profile, creating it with zero defaults if absent.
    async fn get_or_create_profile(&self, user_id: i64) -> EngineResult<GamificationProfile>;

    async fn get_profile(&self, user_id: i64) -> EngineResult<Option<GamificationProfile>>;

    /// Commits a profile update together with its ledger entry in one unit,
    /// guarded by the expected prior `xp_total`. Returns false when the guard
    /// fails (a concurrent award won the race); nothing is written then.
    async fn commit_award(&self, award: &ProfileAward, expected_xp_total: i64)
        -> EngineResult<bool>;

    // --- Strength maturity ---

    async fn get_or_create_maturity(
        &self,
        user_id: i64,
        strength_id: i32,
    ) -> EngineResult<StrengthMaturity>;

    /// Check-and-set update of a maturity row, guarded by the expected prior
    /// `xp_current`.
    async fn commit_maturity(
        &self,
        user_id: i64,
        strength_id: i32,
        xp_current: i64,
        maturity_level: MaturityLevel,
        expected_xp_current: i64,
    ) -> EngineResult<bool>;

    async fn maturities_for_user(&self, user_id: i64) -> EngineResult<Vec<StrengthMaturity>>;

    // --- User configuration (collaborator-owned) ---

    /// The strengths the user selected during assessment.
    async fn user_strengths(&self, user_id: i64) -> EngineResult<Vec<i32>>;

    // --- Quest catalog ---

    async fn templates_for_strengths(
        &self,
        strength_ids: &[i32],
        quest_type: Option<QuestType>,
    ) -> EngineResult<Vec<QuestTemplate>>;

    async fn get_template(&self, template_id: i32) -> EngineResult<Option<QuestTemplate>>;

    // --- Quest instances ---

    async fn insert_quest_completion(
        &self,
        new: NewQuestCompletion,
    ) -> EngineResult<QuestCompletion>;

    async fn get_quest_completion(
        &self,
        completion_id: i64,
    ) -> EngineResult<Option<QuestCompletion>>;

    /// Non-terminal quest instances for a user (possibly including ones whose
    /// deadline has lapsed; callers expire those lazily).
    async fn active_quests(&self, user_id: i64) -> EngineResult<Vec<QuestCompletion>>;

    /// Whether any daily quest was assigned to the user in `[from, to)`.
    async fn daily_generated_between(
        &self,
        user_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> EngineResult<bool>;

    /// Available -> InProgress. False if the row was not Available.
    async fn try_start_quest(&self, completion_id: i64) -> EngineResult<bool>;

    /// Non-terminal -> Completed, stamping completion fields. False if the row
    /// was already terminal; exactly one of two racing completions succeeds.
    async fn try_complete_quest(
        &self,
        completion_id: i64,
        completed_at: DateTime<Utc>,
        confirmed_by: Option<i64>,
        confirmed_at: Option<DateTime<Utc>>,
        xp_awarded: i64,
    ) -> EngineResult<bool>;

    /// Non-terminal -> Expired. False if already terminal.
    async fn try_expire_quest(&self, completion_id: i64) -> EngineResult<bool>;

    /// Most recent completion time for (user, strength, type); drives cooldowns.
    async fn last_completed_at(
        &self,
        user_id: i64,
        strength_id: i32,
        quest_type: QuestType,
    ) -> EngineResult<Option<DateTime<Utc>>>;

    // --- Badges ---

    async fn active_badges(&self) -> EngineResult<Vec<Badge>>;

    async fn unlocked_badge_ids(&self, user_id: i64) -> EngineResult<Vec<i32>>;

    /// First-writer-wins insert of an unlock record. False when the badge was
    /// already unlocked for the user.
    async fn try_unlock_badge(
        &self,
        user_id: i64,
        badge_id: i32,
        unlocked_at: DateTime<Utc>,
    ) -> EngineResult<bool>;

    /// (individual, team) report counts, read from the reporting collaborator.
    async fn report_counts(&self, user_id: i64) -> EngineResult<(i64, i64)>;

    // --- XP ledger ---

    async fn count_transactions(
        &self,
        user_id: i64,
        source: XpSource,
        since: Option<DateTime<Utc>>,
    ) -> EngineResult<i64>;

    /// Timestamp of the user's `n`-th (1-based, oldest first) entry with the
    /// given source.
    async fn nth_transaction_at(
        &self,
        user_id: i64,
        source: XpSource,
        n: u32,
    ) -> EngineResult<Option<DateTime<Utc>>>;

    /// Whether any entry with the given source exists strictly after `after`.
    async fn has_transaction_after(
        &self,
        user_id: i64,
        source: XpSource,
        after: DateTime<Utc>,
    ) -> EngineResult<bool>;

    async fn recent_transactions(
        &self,
        user_id: i64,
        limit: i64,
    ) -> EngineResult<Vec<XpTransaction>>;
}
