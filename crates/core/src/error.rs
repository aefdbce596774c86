use std::result;

use thiserror::Error;

use crate::hooks::Hook;
use crate::types::{CombatantId, Pos};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BattleError {
    #[error("combatant not found: {0:?}")]
    UnknownCombatant(CombatantId),

    #[error("position ({}, {}) is outside the grid", .0.x, .0.y)]
    OutOfBounds(Pos),

    #[error("footprint anchored at ({}, {}) is blocked", .0.x, .0.y)]
    Blocked(Pos),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = result::Result<T, BattleError>;

/// Failure reported by a single hook handler. The dispatcher logs and skips it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HookError {
    #[error("handler `{handler}` received an unexpected context for {hook:?}")]
    UnexpectedContext { handler: String, hook: Hook },

    #[error("handler `{handler}` failed: {reason}")]
    Failed { handler: String, reason: String },
}
