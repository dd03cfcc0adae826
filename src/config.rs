//! Engine configuration with defaults mirroring `constants`.

use serde::{Deserialize, Serialize};

use crate::constants::{AWARD_RETRY_ATTEMPTS, DAILY_BATCH_SIZE};

/// Tunable engine knobs. The defaults are the production balance values;
/// tests and staging environments override individual fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// How many daily quests one generation pass hands out.
    pub daily_quest_count: usize,
    /// Attempts before an optimistic row update gives up.
    pub award_retry_attempts: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            daily_quest_count: DAILY_BATCH_SIZE,
            award_retry_attempts: AWARD_RETRY_ATTEMPTS,
        }
    }
}
