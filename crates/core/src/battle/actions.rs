//! Executes strategy actions against the turn state, the grid and the attack pipeline.
//! Illegal requests are dropped without spending anything.

use std::collections::BTreeSet;
use std::mem;

use super::queries::apply_situational;
use super::*;
use crate::attack::{AttackDesc, resolve_attack, resolve_trip};
use crate::content::keys::FEAT_IMPROVED_TRIP;
use crate::hooks::{HitReport, Hook, HookContext};
use crate::strategy::Action;
use crate::types::{Pos, VisualPos};

impl Battle {
    pub(super) fn execute(&mut self, id: CombatantId, action: Action) {
        debug!(?id, ?action, "executing action");
        match action {
            Action::Move { path } => self.walk(id, path, true),
            Action::Attack { target } => self.attack(id, target),
            Action::Trip { target } => self.trip(id, target),
            Action::Charge { target } => self.charge(id, target),
            Action::StandUp => self.stand_up(id),
            Action::EndTurn => {}
        }
    }

    /// Walks tile by tile. Budgeted walks pay from the movement allowance and stop when it
    /// cannot cover the next step; a charge has already paid with its full-round action.
    fn walk(&mut self, id: CombatantId, path: Vec<Pos>, budgeted: bool) {
        let mut segment = Vec::new();
        let mut reacted = BTreeSet::new();
        for step in path {
            let Some(actor) = self.combatants.get(id) else {
                break;
            };
            if !actor.is_conscious() || actor.has_effect(Effect::Prone) {
                break;
            }
            if budgeted && !actor.turn.can_move() {
                break;
            }
            let moves_left = actor.turn.moves_left();
            let Some(mover) = self.mover(id) else {
                break;
            };
            let Some(cost) = self.pathfinder.get_mut().step_cost(&self.grid, mover, step) else {
                break;
            };
            if budgeted && cost > moves_left {
                if let Some(actor) = self.combatants.get_mut(id) {
                    actor.turn.forfeit_movement();
                }
                break;
            }

            if !self.provokers(id, None, &reacted).is_empty() {
                self.flush_segment(id, &mut segment);
                if !self.provoke(id, None, &mut reacted) {
                    break;
                }
            }

            if budgeted
                && let Some(actor) = self.combatants.get_mut(id)
                && !actor.turn.use_move_distance(cost)
            {
                break;
            }
            self.relocate(id, step);
            segment.push(step);
        }
        self.flush_segment(id, &mut segment);
    }

    fn flush_segment(&mut self, id: CombatantId, segment: &mut Vec<Pos>) {
        if segment.is_empty() {
            return;
        }
        let path = mem::take(segment);
        let hint_ms = self.config.move_hint_ms.saturating_mul(path.len() as u32);
        debug!(?id, tiles = path.len(), "moved");
        self.pending.push_back(BattleEvent::Moved { combatant: id, path, hint_ms });
    }

    fn relocate(&mut self, id: CombatantId, to: Pos) {
        self.unregister(id);
        if let Some(combatant) = self.combatants.get_mut(id) {
            combatant.pos = to;
            combatant.visual = VisualPos::from(to);
        }
        self.register(id);
    }

    /// A living enemy of `id`, within reach of its main weapon.
    fn valid_target(&self, id: CombatantId, target: CombatantId) -> bool {
        id != target
            && self.is_enemy(id, target)
            && self.combatants.get(target).is_some_and(|t| !t.is_dead())
            && self.can_reach(id, target)
    }

    fn attack(&mut self, id: CombatantId, target: CombatantId) {
        if !self.valid_target(id, target) {
            return;
        }
        let Some(actor) = self.combatants.get(id) else {
            return;
        };
        if !actor.turn.can_attack() {
            return;
        }
        let ranged = actor.turn.peek_attack().is_some_and(|desc| desc.ranged);
        if ranged && !self.provoke(id, None, &mut BTreeSet::new()) {
            return;
        }
        let Some(desc) = self.combatants.get_mut(id).and_then(|actor| actor.turn.take_attack())
        else {
            return;
        };
        self.strike(id, target, desc);
    }

    fn trip(&mut self, id: CombatantId, target: CombatantId) {
        if !self.valid_target(id, target) {
            return;
        }
        let Some(actor) = self.combatants.get(id) else {
            return;
        };
        if !actor.turn.can_attack() || actor.turn.peek_attack().is_none_or(|desc| desc.ranged) {
            return;
        }
        let provokes = !actor.knows(FEAT_IMPROVED_TRIP);
        if provokes && !self.provoke(id, Some(target), &mut BTreeSet::new()) {
            return;
        }
        let Some(desc) = self.combatants.get_mut(id).and_then(|actor| actor.turn.take_attack())
        else {
            return;
        };

        let (Some(attacker), Some(defender)) =
            (self.combatants.get(id), self.combatants.get(target))
        else {
            return;
        };
        if defender.is_dead() {
            return;
        }
        let desc = desc.into_trip(attacker);
        let facts = self.target_facts(attacker, defender, &desc);
        let mut bound = desc.bind(facts);
        attacker.events.fire(Hook::TargetSelection, attacker, &mut HookContext::Target(&mut bound));
        let outcome = resolve_trip(&bound, defender, self.dice.as_mut());
        let success = outcome.success;
        self.pending.push_back(BattleEvent::ManeuverResolved { outcome });
        if success {
            self.add_effect(target, Effect::Prone);
        }
    }

    fn charge(&mut self, id: CombatantId, target: CombatantId) {
        if id == target || !self.is_enemy(id, target) {
            return;
        }
        let Some(lane) = self.charge_lane(id, target) else {
            return;
        };
        let Some(mut desc) =
            self.combatants.get_mut(id).and_then(|actor| actor.turn.begin_charge())
        else {
            return;
        };
        desc.charge = true;
        desc.attack_bonus += 2;
        self.add_effect(id, Effect::Charging);
        self.walk(id, lane, false);

        let still_up = self.combatants.get(id).is_some_and(Combatant::is_conscious);
        if still_up && self.valid_target(id, target) {
            self.strike(id, target, desc);
        }
    }

    fn stand_up(&mut self, id: CombatantId) {
        let Some(actor) = self.combatants.get(id) else {
            return;
        };
        let turn = &actor.turn;
        let can_spend = turn.move_actions() > 0 && !turn.has_moved() && !turn.attack_started();
        if !actor.has_effect(Effect::Prone) || !can_spend {
            return;
        }
        if !self.provoke(id, None, &mut BTreeSet::new()) {
            return;
        }
        let spent = self.combatants.get_mut(id).is_some_and(|actor| actor.turn.use_move_action());
        if spent {
            self.remove_effect(id, Effect::Prone);
        }
    }

    /// Binds, rolls and applies one attack. Used for turn attacks and reactions alike.
    pub(super) fn strike(
        &mut self,
        attacker: CombatantId,
        target: CombatantId,
        mut desc: AttackDesc,
    ) {
        let (Some(a), Some(t)) = (self.combatants.get(attacker), self.combatants.get(target))
        else {
            return;
        };
        if !a.is_conscious() || t.is_dead() {
            return;
        }
        let facts = self.target_facts(a, t, &desc);
        apply_situational(a, &mut desc, &facts);
        let mut bound = desc.bind(facts);
        a.events.fire(Hook::TargetSelection, a, &mut HookContext::Target(&mut bound));
        self.pending.push_back(BattleEvent::AttackStarted {
            attacker,
            target,
            opportunity: bound.opportunity,
            hint_ms: self.config.attack_hint_ms,
        });

        let outcome = resolve_attack(a, bound, self.dice.as_mut());
        if outcome.hit {
            let report =
                HitReport { target, damage: outcome.damage, critical: outcome.critical };
            a.events.fire(Hook::OnHit, a, &mut HookContext::Hit(&report));
        }
        let (hit, damage) = (outcome.hit, outcome.damage);
        self.pending.push_back(BattleEvent::AttackFinished { outcome });
        if hit {
            self.apply_damage(target, damage);
        }
    }
}
