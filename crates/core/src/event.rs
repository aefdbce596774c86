//! Presentation-facing descriptors yielded by the battle loop.
//! This module exists so drivers can replay a battle without touching rules state.
//! It does not own timing; `hint_ms` values are suggestions for an animator.

use serde::{Deserialize, Serialize};

use crate::attack::{AttackOutcome, TripOutcome};
use crate::types::{CombatantId, Effect, HealthState, Pos};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BattleEvent {
    RoundStarted {
        round: u32,
    },
    TurnStarted {
        round: u32,
        combatant: CombatantId,
    },
    /// One uninterrupted stretch of movement; provoked attacks split a walk into segments.
    Moved {
        combatant: CombatantId,
        path: Vec<Pos>,
        hint_ms: u32,
    },
    AttackStarted {
        attacker: CombatantId,
        target: CombatantId,
        opportunity: bool,
        hint_ms: u32,
    },
    AttackFinished {
        outcome: AttackOutcome,
    },
    ManeuverResolved {
        outcome: TripOutcome,
    },
    EffectStarted {
        combatant: CombatantId,
        effect: Effect,
    },
    EffectEnded {
        combatant: CombatantId,
        effect: Effect,
    },
    HealthChanged {
        combatant: CombatantId,
        health: i32,
        state: HealthState,
    },
    TurnEnded {
        combatant: CombatantId,
        /// The turn hit the iteration cap.
        truncated: bool,
    },
    RoundEnded {
        round: u32,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdvanceStopReason {
    BudgetExhausted,
    PausedAtBoundary { round: u32 },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvanceResult {
    pub events: Vec<BattleEvent>,
    pub stop_reason: AdvanceStopReason,
}
