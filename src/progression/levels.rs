//! Static level threshold tables and the XP/level calculator for both
//! leveling namespaces: the 20-tier user scale and the 4-tier per-strength
//! maturity scale. The tables are the single source of truth; stored level
//! columns are always recomputable from XP through them.

use crate::database::models::MaturityLevel;

/// One tier of the user scale. `max_xp` is `None` only for the top tier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelTier {
    pub level: i32,
    pub name: &'static str,
    pub min_xp: i64,
    pub max_xp: Option<i64>,
}

/// The 20-tier user scale. Ordered, contiguous, non-overlapping; ranges widen
/// roughly exponentially toward the top.
pub const USER_LEVELS: [LevelTier; 20] = [
    LevelTier { level: 1, name: "Seedling", min_xp: 0, max_xp: Some(500) },
    LevelTier { level: 2, name: "Explorer", min_xp: 501, max_xp: Some(1_200) },
    LevelTier { level: 3, name: "Apprentice", min_xp: 1_201, max_xp: Some(2_200) },
    LevelTier { level: 4, name: "Pathfinder", min_xp: 2_201, max_xp: Some(3_500) },
    LevelTier { level: 5, name: "Practitioner", min_xp: 3_501, max_xp: Some(5_200) },
    LevelTier { level: 6, name: "Specialist", min_xp: 5_201, max_xp: Some(7_500) },
    LevelTier { level: 7, name: "Achiever", min_xp: 7_501, max_xp: Some(10_500) },
    LevelTier { level: 8, name: "Strategist", min_xp: 10_501, max_xp: Some(14_000) },
    LevelTier { level: 9, name: "Catalyst", min_xp: 14_001, max_xp: Some(18_500) },
    LevelTier { level: 10, name: "Trailblazer", min_xp: 18_501, max_xp: Some(24_000) },
    LevelTier { level: 11, name: "Mentor", min_xp: 24_001, max_xp: Some(30_500) },
    LevelTier { level: 12, name: "Innovator", min_xp: 30_501, max_xp: Some(38_000) },
    LevelTier { level: 13, name: "Architect", min_xp: 38_001, max_xp: Some(47_000) },
    LevelTier { level: 14, name: "Visionary", min_xp: 47_001, max_xp: Some(57_500) },
    LevelTier { level: 15, name: "Luminary", min_xp: 57_501, max_xp: Some(70_000) },
    LevelTier { level: 16, name: "Vanguard", min_xp: 70_001, max_xp: Some(85_000) },
    LevelTier { level: 17, name: "Virtuoso", min_xp: 85_001, max_xp: Some(102_500) },
    LevelTier { level: 18, name: "Sage", min_xp: 102_501, max_xp: Some(123_000) },
    LevelTier { level: 19, name: "Legend", min_xp: 123_001, max_xp: Some(149_999) },
    LevelTier { level: 20, name: "Paragon", min_xp: 150_000, max_xp: None },
];

/// One tier of the per-strength maturity scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaturityTier {
    pub level: MaturityLevel,
    pub min_xp: i64,
    pub max_xp: Option<i64>,
}

pub const MATURITY_TIERS: [MaturityTier; 4] = [
    MaturityTier { level: MaturityLevel::Sponge, min_xp: 0, max_xp: Some(499) },
    MaturityTier { level: MaturityLevel::Connector, min_xp: 500, max_xp: Some(1_499) },
    MaturityTier { level: MaturityLevel::Guide, min_xp: 1_500, max_xp: Some(4_999) },
    MaturityTier { level: MaturityLevel::Alchemist, min_xp: 5_000, max_xp: None },
];

/// Rolling milestone width used only for top-tier maturity progress display.
pub const ALCHEMIST_MILESTONE_XP: i64 = 1_000;

/// Highest user tier whose `min_xp <= xp`. Negative XP clamps to level 1.
pub fn user_level_for_xp(xp: i64) -> &'static LevelTier {
    USER_LEVELS
        .iter()
        .rev()
        .find(|tier| tier.min_xp <= xp)
        .unwrap_or(&USER_LEVELS[0])
}

/// Highest maturity tier whose `min_xp <= xp`.
pub fn maturity_for_xp(xp: i64) -> &'static MaturityTier {
    MATURITY_TIERS
        .iter()
        .rev()
        .find(|tier| tier.min_xp <= xp)
        .unwrap_or(&MATURITY_TIERS[0])
}

/// Result of applying an XP delta on the user scale. `levels_crossed` lists
/// every boundary crossed, in order, so callers can sequence level-up
/// presentation when one delta spans several tiers.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelUpdate {
    pub new_xp: i64,
    pub previous_level: i32,
    pub new_level: i32,
    pub levels_crossed: Vec<i32>,
    pub leveled_up: bool,
}

pub fn apply_user_delta(current_xp: i64, delta: i64) -> LevelUpdate {
    let new_xp = current_xp + delta;
    let previous = user_level_for_xp(current_xp).level;
    let new = user_level_for_xp(new_xp).level;
    let levels_crossed = if new >= previous {
        (previous + 1..=new).collect()
    } else {
        (new..previous).rev().collect()
    };
    LevelUpdate {
        new_xp,
        previous_level: previous,
        new_level: new,
        levels_crossed,
        leveled_up: new > previous,
    }
}

/// Result of applying an XP delta on the maturity scale. `xp_overflow` is the
/// XP carried past the floor of the resulting tier.
#[derive(Debug, Clone, PartialEq)]
pub struct MaturityUpdate {
    pub new_xp: i64,
    pub previous_level: MaturityLevel,
    pub new_level: MaturityLevel,
    pub levels_crossed: Vec<MaturityLevel>,
    pub xp_overflow: i64,
    pub leveled_up: bool,
}

pub fn apply_maturity_delta(current_xp: i64, delta: i64) -> MaturityUpdate {
    let new_xp = current_xp + delta;
    let previous = maturity_for_xp(current_xp).level;
    let new_tier = maturity_for_xp(new_xp);
    let levels_crossed: Vec<MaturityLevel> = MATURITY_TIERS
        .iter()
        .filter(|t| t.min_xp > current_xp && t.min_xp <= new_xp)
        .map(|t| t.level)
        .collect();
    MaturityUpdate {
        new_xp,
        previous_level: previous,
        new_level: new_tier.level,
        levels_crossed,
        xp_overflow: new_xp - new_tier.min_xp,
        leveled_up: new_tier.level > previous,
    }
}

/// Percentage of the way through the tier that owns `xp`, clamped to 100 at
/// the top of the user scale.
pub fn user_progress_percentage(xp: i64) -> f64 {
    let tier = user_level_for_xp(xp);
    match tier.max_xp {
        Some(max) => ((xp - tier.min_xp) as f64 / (max - tier.min_xp) as f64 * 100.0).clamp(0.0, 100.0),
        None => 100.0,
    }
}

/// Maturity progress display. Inside the top tier, progress rolls over a
/// 1000-XP milestone instead of clamping.
pub fn maturity_progress_percentage(xp: i64) -> f64 {
    let tier = maturity_for_xp(xp);
    match tier.max_xp {
        Some(max) => ((xp - tier.min_xp) as f64 / (max - tier.min_xp) as f64 * 100.0).clamp(0.0, 100.0),
        None => {
            let into_milestone = (xp - tier.min_xp) % ALCHEMIST_MILESTONE_XP;
            into_milestone as f64 / ALCHEMIST_MILESTONE_XP as f64 * 100.0
        }
    }
}
