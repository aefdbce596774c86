//! Battle tuning knobs shared by the orchestrator and its drivers.

use serde::{Deserialize, Serialize};

use crate::error::{BattleError, Result};

pub const DEFAULT_TURN_ITERATION_CAP: u32 = 32;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BattleConfig {
    /// Hard limit on actions a strategy may issue in one turn.
    pub turn_iteration_cap: u32,
    /// `false` restricts movement to the four orthogonal neighbours.
    pub diagonal_movement: bool,
    pub move_hint_ms: u32,
    pub attack_hint_ms: u32,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            turn_iteration_cap: DEFAULT_TURN_ITERATION_CAP,
            diagonal_movement: true,
            move_hint_ms: 120,
            attack_hint_ms: 350,
        }
    }
}

impl BattleConfig {
    pub fn validate(&self) -> Result<()> {
        if self.turn_iteration_cap == 0 {
            return Err(BattleError::InvalidConfig(
                "turn_iteration_cap must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
