//! Shared test fixtures: an engine wired to the in-memory store and a fixed
//! clock, plus catalog seed helpers.

// Each test binary uses its own subset of these helpers.
#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use questforge::clock::FixedClock;
use questforge::database::memory::MemoryStore;
use questforge::database::models::{Badge, BadgeCriteria, BadgeTier, QuestTemplate, QuestType};
use questforge::Engine;

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 2, 9, 0, 0).unwrap()
}

pub struct TestHarness {
    pub engine: Engine,
    pub store: Arc<MemoryStore>,
    pub clock: Arc<FixedClock>,
}

pub fn harness() -> TestHarness {
    // Ignore the error when a previous test in the binary already installed one.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(FixedClock::new(start_time()));
    let engine = Engine::new(store.clone(), clock.clone());
    TestHarness {
        engine,
        store,
        clock,
    }
}

pub fn daily_template(template_id: i32, strength_id: i32) -> QuestTemplate {
    QuestTemplate {
        template_id,
        strength_id,
        quest_type: QuestType::Daily,
        title: format!("Daily drill {template_id}"),
        difficulty: "Normal".into(),
        xp_reward: 50,
        requires_partner: false,
        cooldown_hours: None,
    }
}

pub fn boss_template(template_id: i32, strength_id: i32) -> QuestTemplate {
    QuestTemplate {
        template_id,
        strength_id,
        quest_type: QuestType::BossBattle,
        title: format!("Boss battle {template_id}"),
        difficulty: "Hard".into(),
        xp_reward: 150,
        requires_partner: false,
        cooldown_hours: None,
    }
}

pub fn combo_template(template_id: i32, strength_id: i32) -> QuestTemplate {
    QuestTemplate {
        template_id,
        strength_id,
        quest_type: QuestType::ComboBreaker,
        title: format!("Combo breaker {template_id}"),
        difficulty: "Normal".into(),
        xp_reward: 75,
        requires_partner: false,
        cooldown_hours: None,
    }
}

pub fn coop_template(template_id: i32, strength_id: i32) -> QuestTemplate {
    QuestTemplate {
        template_id,
        strength_id,
        quest_type: QuestType::Cooperative,
        title: format!("Team-up {template_id}"),
        difficulty: "Normal".into(),
        xp_reward: 80,
        requires_partner: true,
        cooldown_hours: None,
    }
}

pub fn badge(badge_id: i32, key: &str, criteria: BadgeCriteria, xp_reward: i64) -> Badge {
    Badge {
        badge_id,
        key: key.into(),
        tier: BadgeTier::Bronze,
        criteria,
        xp_reward,
        active: true,
    }
}
