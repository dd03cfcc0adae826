//! Badge rule engine: evaluates unlock criteria against a fresh stats
//! snapshot and hands newly earned rewards to the orchestrator. Unlocks are
//! exactly-once by construction: the already-unlocked set is checked first
//! and the insert itself is first-writer-wins.

use std::collections::HashSet;

use chrono::Duration;
use tracing::{debug, instrument};

use super::ensure_user;
use super::gamification;
use crate::database::models::{
    BadgeCriteria, GamificationProfile, UnlockedBadge, UserId, XpSource,
};
use crate::error::EngineResult;
use crate::model::Engine;

/// Evaluates every active badge the user has not yet unlocked; returns the
/// badges newly unlocked by this call.
///
/// Rewards are fixed: they go through `award_xp` with the streak bonus
/// disabled. Because a reward can itself satisfy an XP or level criterion,
/// evaluation repeats until a pass unlocks nothing; each badge unlocks at
/// most once, so the loop is bounded by the catalog size. With no intervening
/// stat change a re-run returns an empty list.
#[instrument(level = "debug", skip(engine, user), fields(user_id = user.get()))]
pub async fn check_badge_unlocks(engine: &Engine, user: UserId) -> EngineResult<Vec<UnlockedBadge>> {
    ensure_user(user)?;
    let catalog = engine.store.active_badges().await?;
    let mut all_new: Vec<UnlockedBadge> = Vec::new();
    loop {
        let unlocked_ids: HashSet<i32> = engine
            .store
            .unlocked_badge_ids(user.get())
            .await?
            .into_iter()
            .collect();
        let profile = engine.store.get_or_create_profile(user.get()).await?;

        let mut newly = Vec::new();
        for badge in catalog.iter().filter(|b| !unlocked_ids.contains(&b.badge_id)) {
            if !satisfies(engine, user, &profile, &badge.criteria).await? {
                continue;
            }
            let now = engine.clock.now();
            if !engine
                .store
                .try_unlock_badge(user.get(), badge.badge_id, now)
                .await?
            {
                // A racing evaluation got there first; not ours to reward.
                continue;
            }
            debug!(badge = %badge.key, "badge unlocked");
            if badge.xp_reward > 0 {
                gamification::award_xp(engine, user, badge.xp_reward, XpSource::BadgeReward, false)
                    .await?;
            }
            newly.push(UnlockedBadge {
                user_id: user.get(),
                badge_id: badge.badge_id,
                badge_key: badge.key.clone(),
                unlocked_at: now,
            });
        }
        if newly.is_empty() {
            break;
        }
        all_new.extend(newly);
    }
    Ok(all_new)
}

/// One criterion against the current snapshot. Profile-backed criteria read
/// the row passed in; event-shaped criteria count ledger entries so windowed
/// checks honor `period_days` as a real parameter; report criteria read the
/// reporting collaborator through the store port.
async fn satisfies(
    engine: &Engine,
    user: UserId,
    profile: &GamificationProfile,
    criteria: &BadgeCriteria,
) -> EngineResult<bool> {
    let store = &engine.store;
    Ok(match criteria {
        BadgeCriteria::Xp { threshold } => profile.xp_total >= *threshold,
        BadgeCriteria::Modules { threshold } => i64::from(profile.modules_completed) >= *threshold,
        BadgeCriteria::Challenges { threshold } => {
            i64::from(profile.challenges_completed) >= *threshold
        }
        BadgeCriteria::Streak { threshold } => profile.longest_streak >= *threshold,
        BadgeCriteria::Collaborative { threshold } => {
            i64::from(profile.collaborative_challenges) >= *threshold
        }
        BadgeCriteria::Level { threshold } => profile.current_level >= *threshold,
        BadgeCriteria::AssessmentCompleted => {
            store
                .count_transactions(user.get(), XpSource::AssessmentComplete, None)
                .await?
                > 0
        }
        BadgeCriteria::FeedbacksGiven {
            threshold,
            period_days,
        } => {
            let since = period_days
                .map(|days| engine.clock.now() - Duration::days(i64::from(days)));
            store
                .count_transactions(user.get(), XpSource::FeedbackGiven, since)
                .await?
                >= *threshold
        }
        BadgeCriteria::FeedbacksReceived { threshold } => {
            store
                .count_transactions(user.get(), XpSource::FeedbackReceived, None)
                .await?
                >= *threshold
        }
        BadgeCriteria::RetakeAfterFeedback => {
            // A retake counts only after the second feedback response landed.
            match store
                .nth_transaction_at(user.get(), XpSource::FeedbackReceived, 2)
                .await?
            {
                Some(second_feedback) => {
                    store
                        .has_transaction_after(
                            user.get(),
                            XpSource::AssessmentRetake,
                            second_feedback,
                        )
                        .await?
                }
                None => false,
            }
        }
        BadgeCriteria::ReportIndividualGenerated => {
            store.report_counts(user.get()).await?.0 > 0
        }
        BadgeCriteria::ReportTeamGenerated => store.report_counts(user.get()).await?.1 > 0,
    })
}
