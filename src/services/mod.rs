//! Service layer: the orchestrated flows that compose the pure calculators
//! with the persistence port. `gamification::award_xp` is the single writer
//! of profile XP/level/streak state; quest completion and badge rewards both
//! route through it.

pub mod badges;
pub mod gamification;
pub mod quests;
pub mod summary;

use crate::database::models::UserId;
use crate::error::{EngineError, EngineResult};

/// Callers must present a resolved, authenticated user id. A non-positive id
/// means the session lookup upstream failed; short-circuit before touching
/// persistence.
pub(crate) fn ensure_user(user: UserId) -> EngineResult<()> {
    if user.get() <= 0 {
        return Err(EngineError::Unauthenticated);
    }
    Ok(())
}
