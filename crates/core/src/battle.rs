//! Battle orchestration: the round/turn loop and the world it runs over.
//! This module exists so one owner sequences turns, executes actions and queues the
//! events a driver consumes. It does not decide what combatants do; strategies do.
//!
//! The loop is an explicit phase machine. `next_event` pumps it until at least one event
//! is queued, so a driver can stop and resume between any two events.

use std::cell::RefCell;
use std::cmp::Reverse;
use std::collections::VecDeque;

use slotmap::{SecondaryMap, SlotMap};
use tracing::debug;

use crate::combatant::Combatant;
use crate::config::BattleConfig;
use crate::dice::DiceRoller;
use crate::error::{BattleError, Result};
use crate::event::{AdvanceResult, AdvanceStopReason, BattleEvent};
use crate::grid::{Footprint, Grid};
use crate::pathfinding::{Mover, Pathfinder};
use crate::strategy::Strategy;
use crate::types::{Ability, CombatantId, Effect, HealthState};

mod actions;
mod hash;
mod opportunity;
mod queries;
mod round;

#[cfg(test)]
pub(crate) mod test_support;
#[cfg(test)]
mod tests;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    RoundStart,
    TurnStart { slot: usize },
    Acting { slot: usize, iterations: u32 },
    RoundEnd,
}

pub struct Battle {
    config: BattleConfig,
    grid: Grid,
    pathfinder: RefCell<Pathfinder>,
    combatants: SlotMap<CombatantId, Combatant>,
    order: Vec<CombatantId>,
    brains: SecondaryMap<CombatantId, Box<dyn Strategy>>,
    dice: Box<dyn DiceRoller>,
    round: u32,
    phase: Phase,
    pending: VecDeque<BattleEvent>,
    pause_requested: bool,
}

impl Battle {
    pub fn new(grid: Grid, config: BattleConfig, dice: Box<dyn DiceRoller>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            pathfinder: RefCell::new(Pathfinder::new(config.diagonal_movement)),
            config,
            grid,
            combatants: SlotMap::with_key(),
            order: Vec::new(),
            brains: SecondaryMap::new(),
            dice,
            round: 0,
            phase: Phase::RoundStart,
            pending: VecDeque::new(),
            pause_requested: false,
        })
    }

    /// Places a combatant on the grid and appends it to the turn order.
    pub fn add_combatant(
        &mut self,
        mut combatant: Combatant,
        strategy: Box<dyn Strategy>,
    ) -> Result<CombatantId> {
        if !self.grid.in_bounds(combatant.pos) {
            return Err(BattleError::OutOfBounds(combatant.pos));
        }
        if !self.grid.footprint_clear(combatant.pos, combatant.size, None) {
            return Err(BattleError::Blocked(combatant.pos));
        }
        combatant.footprint = Footprint::default();
        let id = self.combatants.insert(combatant);
        self.combatants[id].id = id;
        self.combatants[id].refresh_reactions();
        self.register(id);
        self.order.push(id);
        self.brains.insert(id, strategy);
        debug!(?id, name = %self.combatants[id].name, "combatant joined");
        Ok(id)
    }

    /// Replaces the decision maker for `id`.
    pub fn set_strategy(&mut self, id: CombatantId, strategy: Box<dyn Strategy>) -> Result<()> {
        if !self.combatants.contains_key(id) {
            return Err(BattleError::UnknownCombatant(id));
        }
        self.brains.insert(id, strategy);
        Ok(())
    }

    /// Orders combatants by d20 + Dexterity modifier, highest first; ties keep join order.
    pub fn roll_initiative(&mut self) {
        for &id in &self.order {
            if let Some(combatant) = self.combatants.get_mut(id) {
                let dex = combatant.modifier(Ability::Dexterity);
                combatant.initiative = self.dice.d20() + dex;
            }
        }
        let combatants = &self.combatants;
        self.order
            .sort_by_key(|id| Reverse(combatants.get(*id).map_or(i32::MIN, |c| c.initiative)));
    }

    /// Pumps the loop until one event is available.
    pub fn next_event(&mut self) -> BattleEvent {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return event;
            }
            self.step();
        }
    }

    /// Collects up to `max_events` events, stopping early at a round boundary after
    /// `request_pause`.
    pub fn advance(&mut self, max_events: usize) -> AdvanceResult {
        let mut events = Vec::new();
        while events.len() < max_events {
            if self.pause_requested && self.at_round_boundary() {
                self.pause_requested = false;
                return AdvanceResult {
                    events,
                    stop_reason: AdvanceStopReason::PausedAtBoundary { round: self.round },
                };
            }
            events.push(self.next_event());
        }
        AdvanceResult { events, stop_reason: AdvanceStopReason::BudgetExhausted }
    }

    pub fn request_pause(&mut self) {
        self.pause_requested = true;
    }

    pub fn at_round_boundary(&self) -> bool {
        self.phase == Phase::RoundStart && self.pending.is_empty()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn config(&self) -> &BattleConfig {
        &self.config
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn order(&self) -> &[CombatantId] {
        &self.order
    }

    pub fn combatant(&self, id: CombatantId) -> Option<&Combatant> {
        self.combatants.get(id)
    }

    pub fn combatants(&self) -> impl Iterator<Item = &Combatant> {
        self.order.iter().filter_map(|id| self.combatants.get(*id))
    }

    fn register(&mut self, id: CombatantId) {
        let Some(combatant) = self.combatants.get_mut(id) else {
            return;
        };
        let placement = combatant.placement();
        self.grid.register(id, placement, &mut combatant.footprint);
        self.grid.template(combatant.attack_template_key());
    }

    fn unregister(&mut self, id: CombatantId) {
        let Some(combatant) = self.combatants.get_mut(id) else {
            return;
        };
        if !combatant.footprint.is_empty() {
            self.grid.unregister(id, &mut combatant.footprint);
        }
    }

    fn mover(&self, id: CombatantId) -> Option<Mover> {
        self.combatants.get(id).map(|c| Mover { id, anchor: c.pos, size: c.size })
    }

    /// Subtracts damage and keeps grid registration in step with the new health state.
    fn apply_damage(&mut self, id: CombatantId, amount: i32) {
        let Some(combatant) = self.combatants.get_mut(id) else {
            return;
        };
        let before = combatant.health_state();
        let after = combatant.take_damage(amount);
        let health = combatant.health;
        self.pending.push_back(BattleEvent::HealthChanged { combatant: id, health, state: after });
        if before == after {
            return;
        }
        debug!(?id, ?before, ?after, "health state changed");
        match after {
            HealthState::Dead => self.unregister(id),
            _ => self.register(id),
        }
    }

    fn add_effect(&mut self, id: CombatantId, effect: Effect) {
        if let Some(combatant) = self.combatants.get_mut(id)
            && combatant.add_effect(effect)
        {
            self.pending.push_back(BattleEvent::EffectStarted { combatant: id, effect });
        }
    }

    fn remove_effect(&mut self, id: CombatantId, effect: Effect) {
        if let Some(combatant) = self.combatants.get_mut(id)
            && combatant.remove_effect(effect)
        {
            self.pending.push_back(BattleEvent::EffectEnded { combatant: id, effect });
        }
    }
}
