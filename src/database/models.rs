//! Contains all the data structures that map to database tables or query results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Type;

/// Identifier of an end user, assigned by the authentication collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub i64);

impl UserId {
    pub fn get(self) -> i64 {
        self.0
    }
}

/// Identifier of a strength from the assessment catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StrengthId(pub i32);

impl StrengthId {
    pub fn get(self) -> i32 {
        self.0
    }
}

/// Per-user gamification state. Created lazily with zero defaults on the first
/// award; mutated only by the orchestrator in `services::gamification`.
#[derive(sqlx::FromRow, Debug, Clone)]
pub struct GamificationProfile {
    pub user_id: i64,
    pub xp_total: i64,
    pub current_level: i32,
    pub current_streak: i32,
    pub longest_streak: i32,
    pub last_activity_date: Option<DateTime<Utc>>,
    pub modules_completed: i32,
    pub challenges_completed: i32,
    pub collaborative_challenges: i32,
}

/// The 4-tier per-strength maturity scale. An independent leveling namespace
/// from the 20-tier user scale; the two must never be conflated.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Type, Serialize, Deserialize,
)]
#[sqlx(type_name = "maturity_level_enum", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MaturityLevel {
    Sponge,
    Connector,
    Guide,
    Alchemist,
}

impl MaturityLevel {
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Sponge => "Sponge",
            Self::Connector => "Connector",
            Self::Guide => "Guide",
            Self::Alchemist => "Alchemist",
        }
    }
}

/// Per-(user, strength) leveling state.
#[derive(sqlx::FromRow, Debug, Clone)]
pub struct StrengthMaturity {
    pub user_id: i64,
    pub strength_id: i32,
    pub xp_current: i64,
    pub maturity_level: MaturityLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(type_name = "quest_type_enum", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum QuestType {
    Daily,
    BossBattle,
    ComboBreaker,
    Cooperative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(type_name = "quest_status_enum", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum QuestStatus {
    Available,
    InProgress,
    Completed,
    Expired,
}

impl QuestStatus {
    /// Completed and Expired are final; no transition leaves them.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Expired)
    }
}

/// Catalog entry describing a quest that can be instantiated for a user.
/// Immutable at runtime.
#[derive(sqlx::FromRow, Debug, Clone)]
pub struct QuestTemplate {
    pub template_id: i32,
    pub strength_id: i32,
    pub quest_type: QuestType,
    pub title: String,
    pub difficulty: String,
    pub xp_reward: i64,
    pub requires_partner: bool,
    pub cooldown_hours: Option<i32>,
}

/// One assignment of a quest template to a user. Terminal once Completed or
/// Expired; no further mutation afterwards.
#[derive(sqlx::FromRow, Debug, Clone)]
pub struct QuestCompletion {
    pub completion_id: i64,
    pub user_id: i64,
    pub template_id: i32,
    pub strength_id: i32,
    pub quest_type: QuestType,
    pub status: QuestStatus,
    pub started_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub confirmed_by: Option<i64>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub xp_awarded: Option<i64>,
}

/// Insert payload for a new quest assignment.
#[derive(Debug, Clone)]
pub struct NewQuestCompletion {
    pub user_id: i64,
    pub template_id: i32,
    pub strength_id: i32,
    pub quest_type: QuestType,
    pub started_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Badge rarity tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(type_name = "badge_tier_enum", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BadgeTier {
    Bronze,
    Silver,
    Gold,
    Platinum,
}

/// Unlock criteria as a closed sum type with exhaustive matching; the string
/// tag only exists at the persistence boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BadgeCriteria {
    /// Total profile XP reached `threshold`.
    Xp { threshold: i64 },
    /// Learning modules completed.
    Modules { threshold: i64 },
    /// Challenges (quests) completed.
    Challenges { threshold: i64 },
    /// Longest streak ever seen.
    Streak { threshold: i32 },
    /// Collaborative challenges completed.
    Collaborative { threshold: i64 },
    /// User-scale level reached.
    Level { threshold: i32 },
    /// At least one completed assessment.
    AssessmentCompleted,
    /// Feedback responses given, optionally windowed to the last `period_days`.
    FeedbacksGiven {
        threshold: i64,
        period_days: Option<u32>,
    },
    /// Feedback responses received.
    FeedbacksReceived { threshold: i64 },
    /// A completed assessment retake that happened after receiving at least
    /// two feedback responses.
    RetakeAfterFeedback,
    /// An individual report was generated for the user.
    ReportIndividualGenerated,
    /// A team report was generated for the user.
    ReportTeamGenerated,
}

/// Catalog entry for a one-time achievement.
#[derive(Debug, Clone)]
pub struct Badge {
    pub badge_id: i32,
    pub key: String,
    pub tier: BadgeTier,
    pub criteria: BadgeCriteria,
    pub xp_reward: i64,
    pub active: bool,
}

/// A badge a user has unlocked. Immutable once created; at most one per
/// (user, badge) pair.
#[derive(sqlx::FromRow, Debug, Clone)]
pub struct UnlockedBadge {
    pub user_id: i64,
    pub badge_id: i32,
    pub badge_key: String,
    pub unlocked_at: DateTime<Utc>,
}

/// Fixed vocabulary labeling every ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum XpSource {
    #[serde(rename = "assessment_phase_1")]
    AssessmentPhase1,
    #[serde(rename = "assessment_phase_2")]
    AssessmentPhase2,
    #[serde(rename = "assessment_complete")]
    AssessmentComplete,
    #[serde(rename = "assessment_retake")]
    AssessmentRetake,
    #[serde(rename = "feedback_given")]
    FeedbackGiven,
    #[serde(rename = "feedback_received")]
    FeedbackReceived,
    #[serde(rename = "feedback_insights")]
    FeedbackInsights,
    #[serde(rename = "feedback_applied")]
    FeedbackApplied,
    #[serde(rename = "challenge_completed")]
    ChallengeCompleted,
    #[serde(rename = "module_completed")]
    ModuleCompleted,
    #[serde(rename = "collaborative_bonus")]
    CollaborativeBonus,
    #[serde(rename = "badge_reward")]
    BadgeReward,
    #[serde(rename = "streak_bonus")]
    StreakBonus,
}

impl XpSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AssessmentPhase1 => "assessment_phase_1",
            Self::AssessmentPhase2 => "assessment_phase_2",
            Self::AssessmentComplete => "assessment_complete",
            Self::AssessmentRetake => "assessment_retake",
            Self::FeedbackGiven => "feedback_given",
            Self::FeedbackReceived => "feedback_received",
            Self::FeedbackInsights => "feedback_insights",
            Self::FeedbackApplied => "feedback_applied",
            Self::ChallengeCompleted => "challenge_completed",
            Self::ModuleCompleted => "module_completed",
            Self::CollaborativeBonus => "collaborative_bonus",
            Self::BadgeReward => "badge_reward",
            Self::StreakBonus => "streak_bonus",
        }
    }

    pub fn parse(label: &str) -> Option<Self> {
        Some(match label {
            "assessment_phase_1" => Self::AssessmentPhase1,
            "assessment_phase_2" => Self::AssessmentPhase2,
            "assessment_complete" => Self::AssessmentComplete,
            "assessment_retake" => Self::AssessmentRetake,
            "feedback_given" => Self::FeedbackGiven,
            "feedback_received" => Self::FeedbackReceived,
            "feedback_insights" => Self::FeedbackInsights,
            "feedback_applied" => Self::FeedbackApplied,
            "challenge_completed" => Self::ChallengeCompleted,
            "module_completed" => Self::ModuleCompleted,
            "collaborative_bonus" => Self::CollaborativeBonus,
            "badge_reward" => Self::BadgeReward,
            "streak_bonus" => Self::StreakBonus,
            _ => return None,
        })
    }
}

/// Append-only audit ledger entry. Never mutated or deleted by this engine.
#[derive(Debug, Clone)]
pub struct XpTransaction {
    pub transaction_id: i64,
    pub user_id: i64,
    pub amount: i64,
    pub source: XpSource,
    pub streak_bonus: i64,
    pub created_at: DateTime<Utc>,
}

/// Ledger entry to append alongside a profile update.
#[derive(Debug, Clone)]
pub struct NewXpTransaction {
    pub user_id: i64,
    pub amount: i64,
    pub source: XpSource,
    /// Portion of `amount` contributed by the streak multiplier.
    pub streak_bonus: i64,
    pub created_at: DateTime<Utc>,
}

/// Full profile state to commit after an award, paired with its ledger entry.
/// Committed atomically, guarded by the expected prior `xp_total`.
#[derive(Debug, Clone)]
pub struct ProfileAward {
    pub user_id: i64,
    pub xp_total: i64,
    pub current_level: i32,
    pub current_streak: i32,
    pub longest_streak: i32,
    pub last_activity_date: Option<DateTime<Utc>>,
    pub modules_completed: i32,
    pub challenges_completed: i32,
    pub collaborative_challenges: i32,
    pub transaction: NewXpTransaction,
}
