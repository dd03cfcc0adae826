//! The central, shared state of the engine. An `Engine` is cheap to clone and
//! is passed by reference into every service function, the single place the
//! persistence port and the clock are wired together.

use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::database::postgres::PgStore;
use crate::database::{DbPool, GamificationStore};

#[derive(Clone)]
pub struct Engine {
    /// The persistence port. All reads/writes of gamification state go
    /// through this trait object.
    pub store: Arc<dyn GamificationStore>,
    /// The single time source; nothing in the engine calls `Utc::now()`
    /// directly.
    pub clock: Arc<dyn Clock>,
    pub config: EngineConfig,
}

impl Engine {
    pub fn new(store: Arc<dyn GamificationStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            config: EngineConfig::default(),
        }
    }

    pub fn with_config(
        store: Arc<dyn GamificationStore>,
        clock: Arc<dyn Clock>,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            clock,
            config,
        }
    }

    /// Production wiring: Postgres persistence and the system clock.
    pub fn postgres(pool: DbPool) -> Self {
        Self::new(Arc::new(PgStore::new(pool)), Arc::new(SystemClock))
    }
}
