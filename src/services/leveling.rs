// src/services/leveling.rs

//! Experience rewards and level transitions.

use serde::Serialize;

use crate::models::user::Level;

pub const COMPLETE_TEST: &str = "complete_test";

/// Experience awarded per action. Unknown actions award nothing.
const REWARDS: &[(&str, i32)] = &[(COMPLETE_TEST, 10)];

/// The tier after `level` and the experience needed to reach it.
/// `Lead` is terminal and maps onto itself.
pub fn next_tier(level: Level) -> (Level, i32) {
    match level {
        Level::Trainee => (Level::Junior, 40),
        Level::Junior => (Level::Middle, 60),
        Level::Middle => (Level::Senior, 80),
        Level::Senior => (Level::Lead, 100),
        Level::Lead => (Level::Lead, 100),
    }
}

/// Experience required to be promoted into `level`.
pub fn entry_threshold(level: Level) -> i32 {
    match level {
        Level::Trainee => 0,
        Level::Junior => next_tier(Level::Trainee).1,
        Level::Middle => next_tier(Level::Junior).1,
        Level::Senior => next_tier(Level::Middle).1,
        Level::Lead => next_tier(Level::Senior).1,
    }
}

pub fn reward_for(action: &str) -> i32 {
    REWARDS
        .iter()
        .find(|(name, _)| *name == action)
        .map(|(_, exp)| *exp)
        .unwrap_or(0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LevelProgress {
    pub level: Level,
    pub exp: i32,
    pub leveled_up: bool,
}

/// Adds the reward for `action` and promotes at most one tier.
///
/// Experience accumulates and is compared against the current tier's
/// cut-off only, so a large reward never skips tiers.
pub fn award_experience(level: Level, exp: i32, action: &str) -> LevelProgress {
    let exp = exp.saturating_add(reward_for(action));
    let (next, threshold) = next_tier(level);

    if exp >= threshold {
        LevelProgress {
            level: next,
            exp,
            leveled_up: next != level,
        }
    } else {
        LevelProgress {
            level,
            exp,
            leveled_up: false,
        }
    }
}

/// One row of the public level table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LevelInfo {
    pub level: Level,
    pub exp: i32,
}

/// All levels in order with their entry thresholds.
pub fn level_table() -> Vec<LevelInfo> {
    [
        Level::Trainee,
        Level::Junior,
        Level::Middle,
        Level::Senior,
        Level::Lead,
    ]
    .into_iter()
    .map(|level| LevelInfo {
        level,
        exp: entry_threshold(level),
    })
    .collect()
}
