//! Phase machine for rounds and turns.
//! Each `step` does one unit of work: open a round, open a turn, run one strategy action,
//! or close the round. The per-turn iteration cap bounds the acting phase.

use tracing::warn;

use super::*;
use crate::strategy::Action;

impl Battle {
    pub(super) fn step(&mut self) {
        match self.phase {
            Phase::RoundStart => {
                self.round += 1;
                self.bury_dead();
                self.pending.push_back(BattleEvent::RoundStarted { round: self.round });
                self.phase = Phase::TurnStart { slot: 0 };
            }
            Phase::TurnStart { slot } => {
                let Some(&id) = self.order.get(slot) else {
                    self.phase = Phase::RoundEnd;
                    return;
                };
                if !self.combatants.get(id).is_some_and(Combatant::is_conscious) {
                    self.phase = Phase::TurnStart { slot: slot + 1 };
                    return;
                }
                self.start_turn(id);
                self.phase = Phase::Acting { slot, iterations: 0 };
            }
            Phase::Acting { slot, iterations } => self.act(slot, iterations),
            Phase::RoundEnd => {
                for &id in &self.order {
                    if let Some(combatant) = self.combatants.get(id)
                        && !combatant.is_dead()
                    {
                        combatant.end_round(self.round);
                    }
                }
                self.pending.push_back(BattleEvent::RoundEnded { round: self.round });
                self.phase = Phase::RoundStart;
            }
        }
    }

    fn start_turn(&mut self, id: CombatantId) {
        let round = self.round;
        let Some(combatant) = self.combatants.get_mut(id) else {
            return;
        };
        let was_charging = combatant.has_effect(Effect::Charging);
        combatant.begin_turn(round);
        self.pending.push_back(BattleEvent::TurnStarted { round, combatant: id });
        if was_charging {
            let ended = BattleEvent::EffectEnded { combatant: id, effect: Effect::Charging };
            self.pending.push_back(ended);
        }
    }

    fn act(&mut self, slot: usize, iterations: u32) {
        let Some(&id) = self.order.get(slot) else {
            self.phase = Phase::RoundEnd;
            return;
        };
        let Some(actor) = self.combatants.get(id) else {
            self.phase = Phase::TurnStart { slot: slot + 1 };
            return;
        };
        if !actor.is_conscious() || actor.turn.complete() {
            self.finish_turn(slot, false);
            return;
        }
        if iterations >= self.config.turn_iteration_cap {
            warn!(
                combatant = %actor.name,
                cap = self.config.turn_iteration_cap,
                "turn hit the iteration cap; truncating"
            );
            self.finish_turn(slot, true);
            return;
        }

        self.phase = Phase::Acting { slot, iterations: iterations + 1 };
        match self.decide(id) {
            None | Some(Action::EndTurn) => self.finish_turn(slot, false),
            Some(action) => self.execute(id, action),
        }
    }

    fn decide(&mut self, id: CombatantId) -> Option<Action> {
        let mut brain = self.brains.remove(id)?;
        let action = self
            .combatants
            .get(id)
            .and_then(|actor| brain.next_action(id, &actor.turn, self));
        self.brains.insert(id, brain);
        action
    }

    fn finish_turn(&mut self, slot: usize, truncated: bool) {
        let round = self.round;
        if let Some(&id) = self.order.get(slot) {
            if let Some(combatant) = self.combatants.get_mut(id) {
                combatant.end_turn(round);
            }
            self.pending.push_back(BattleEvent::TurnEnded { combatant: id, truncated });
        }
        self.phase = Phase::TurnStart { slot: slot + 1 };
    }

    /// Dead combatants stop occupying the grid.
    fn bury_dead(&mut self) {
        let dead: Vec<CombatantId> = self
            .order
            .iter()
            .copied()
            .filter(|id| self.combatants.get(*id).is_some_and(Combatant::is_dead))
            .collect();
        for id in dead {
            self.unregister(id);
        }
    }
}
