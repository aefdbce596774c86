//! The contract between the battle loop and decision makers, plus two simple deciders.
//! This module exists so the orchestrator can ask "what next?" without knowing how the
//! answer is chosen. It does not validate actions; the battle treats illegal ones as no-ops.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::battle::Battle;
use crate::pathfinding::Path;
use crate::turn::TurnState;
use crate::types::{CombatantId, Effect, Pos};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    /// Walk along `path`, stopping early when movement runs out or a step becomes illegal.
    Move { path: Vec<Pos> },
    Attack { target: CombatantId },
    Trip { target: CombatantId },
    Charge { target: CombatantId },
    StandUp,
    EndTurn,
}

impl Action {
    pub fn walk(path: Path) -> Self {
        Action::Move { path: path.steps }
    }
}

pub trait Strategy: fmt::Debug {
    /// Next action for `me`, or `None` when the turn should end.
    fn next_action(
        &mut self,
        me: CombatantId,
        turn: &TurnState,
        battle: &Battle,
    ) -> Option<Action>;
}

/// Never acts.
#[derive(Clone, Copy, Debug, Default)]
pub struct Idle;

impl Strategy for Idle {
    fn next_action(
        &mut self,
        _me: CombatantId,
        _turn: &TurnState,
        _battle: &Battle,
    ) -> Option<Action> {
        None
    }
}

/// Stands up, hits the best reachable enemy, charges when a lane opens, otherwise closes in.
#[derive(Clone, Copy, Debug, Default)]
pub struct Skirmisher {
    /// Try to trip standing targets before striking them.
    pub prefer_trip: bool,
}

impl Strategy for Skirmisher {
    fn next_action(
        &mut self,
        me: CombatantId,
        turn: &TurnState,
        battle: &Battle,
    ) -> Option<Action> {
        let this = battle.combatant(me)?;

        let prone = this.has_effect(Effect::Prone);
        if prone && turn.move_actions() > 0 && !turn.has_moved() && !turn.attack_started() {
            return Some(Action::StandUp);
        }

        if turn.can_attack()
            && let Some(target) = battle.best_target(me)
        {
            let standing = battle.combatant(target).is_some_and(|t| !t.has_effect(Effect::Prone));
            if self.prefer_trip && standing && !this.main_weapon().is_ranged() {
                return Some(Action::Trip { target });
            }
            return Some(Action::Attack { target });
        }

        if prone {
            return None;
        }
        let target = battle.find_enemy(me)?;
        if turn.full_round_available() && battle.charge_lane(me, target).is_some() {
            return Some(Action::Charge { target });
        }
        if turn.can_move() {
            let path = battle.path_to_range(me, target)?;
            if !path.is_empty() {
                return Some(Action::walk(path));
            }
        }
        None
    }
}
