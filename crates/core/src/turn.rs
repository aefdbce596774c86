//! Per-turn action economy.
//! This module exists so every action spends resources through one set of checked
//! transitions. It does not own the attacks it queues; the attack pipeline builds them.
//!
//! Illegal transitions are no-ops that return `false` (or `None`). Counters are unsigned and
//! only ever decrease through saturating or guarded paths.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::attack::AttackDesc;

/// Cost units per tile walked straight; see `pathfinding::STRAIGHT_STEP_COST`.
pub const DEFAULT_SPEED: u32 = 600;

/// Per-turn maximums restored at turn start.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnAllowance {
    /// Movement budget in pathfinding cost units.
    pub speed: u32,
    pub move_actions: u8,
    pub standard_actions: u8,
    pub swift_actions: u8,
    pub opportunity_attacks: u8,
}

impl Default for TurnAllowance {
    fn default() -> Self {
        Self {
            speed: DEFAULT_SPEED,
            move_actions: 1,
            standard_actions: 1,
            swift_actions: 1,
            opportunity_attacks: 1,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct TurnState {
    moves_left: u32,
    move_actions: u8,
    standard_actions: u8,
    swift_actions: u8,
    full_round: bool,
    opportunity_attacks: u8,
    opportunity_template: Option<AttackDesc>,
    attacks: VecDeque<AttackDesc>,
    attacks_taken: u8,
    has_moved: bool,
}

impl TurnState {
    /// Restores every counter and replaces the attack queue.
    pub fn on_turn_start(&mut self, allowance: TurnAllowance, attacks: Vec<AttackDesc>) {
        self.moves_left = allowance.speed;
        self.move_actions = allowance.move_actions;
        self.standard_actions = allowance.standard_actions;
        self.swift_actions = allowance.swift_actions;
        self.full_round = true;
        self.attacks_taken = 0;
        self.has_moved = false;
        self.arm_reactions(allowance.opportunity_attacks, attacks.first().cloned());
        self.attacks = attacks.into();
    }

    /// Refreshes opportunity attacks without touching the rest of the turn.
    pub fn arm_reactions(&mut self, count: u8, template: Option<AttackDesc>) {
        self.opportunity_attacks = count;
        self.opportunity_template = template.map(|mut attack| {
            attack.opportunity = true;
            attack
        });
    }

    /// Zeroes the acting resources; opportunity attacks carry over until the next turn start.
    pub fn end_turn(&mut self) {
        self.moves_left = 0;
        self.move_actions = 0;
        self.standard_actions = 0;
        self.swift_actions = 0;
        self.full_round = false;
        self.attacks.clear();
    }

    pub fn moves_left(&self) -> u32 {
        self.moves_left
    }

    pub fn move_actions(&self) -> u8 {
        self.move_actions
    }

    pub fn standard_actions(&self) -> u8 {
        self.standard_actions
    }

    pub fn swift_actions(&self) -> u8 {
        self.swift_actions
    }

    pub fn opportunity_attacks(&self) -> u8 {
        self.opportunity_attacks
    }

    pub fn full_round_available(&self) -> bool {
        self.full_round
            && self.standard_actions > 0
            && self.move_actions > 0
            && !self.has_moved
            && !self.attack_started()
    }

    pub fn attack_started(&self) -> bool {
        self.attacks_taken > 0
    }

    pub fn has_moved(&self) -> bool {
        self.has_moved
    }

    pub fn queued_attacks(&self) -> usize {
        self.attacks.len()
    }

    pub fn peek_attack(&self) -> Option<&AttackDesc> {
        self.attacks.front()
    }

    pub fn can_move(&self) -> bool {
        self.move_actions > 0 && self.moves_left > 0 && !self.attack_started()
    }

    pub fn can_attack(&self) -> bool {
        !self.attacks.is_empty()
            && (self.standard_actions > 0 || self.attack_started())
            && self.next_attack_affordable()
    }

    pub fn complete(&self) -> bool {
        !self.can_attack() && !self.can_move()
    }

    /// Spends `cost` movement units. An unaffordable step forfeits the remaining movement
    /// and returns `false`.
    pub fn use_move_distance(&mut self, cost: u32) -> bool {
        if !self.can_move() {
            return false;
        }
        if cost > self.moves_left {
            self.forfeit_movement();
            return false;
        }
        self.moves_left -= cost;
        self.has_moved = true;
        self.full_round = false;
        if self.moves_left == 0 {
            self.move_actions = 0;
        }
        true
    }

    /// Spends the whole move action on something other than walking, such as standing up.
    pub fn use_move_action(&mut self) -> bool {
        if self.move_actions == 0 || self.has_moved || self.attack_started() {
            return false;
        }
        self.move_actions -= 1;
        self.moves_left = 0;
        self.full_round = false;
        true
    }

    pub fn use_standard(&mut self) -> bool {
        if self.standard_actions == 0 {
            return false;
        }
        self.standard_actions -= 1;
        self.full_round = false;
        true
    }

    pub fn use_swift(&mut self) -> bool {
        if self.swift_actions == 0 {
            return false;
        }
        self.swift_actions -= 1;
        true
    }

    /// Consumes both the standard and the move action.
    pub fn use_full_round(&mut self) -> bool {
        if !self.full_round_available() {
            return false;
        }
        self.standard_actions -= 1;
        self.move_actions -= 1;
        self.moves_left = 0;
        self.full_round = false;
        true
    }

    pub fn forfeit_movement(&mut self) {
        self.moves_left = 0;
        if !self.attack_started() {
            self.move_actions = 0;
        }
    }

    /// Pops the next attack of the chain, paying for it. The first attack costs the
    /// standard action and revokes movement; the second costs the move action; later
    /// attacks are free. A combatant that already moved cannot continue past the first.
    pub fn take_attack(&mut self) -> Option<AttackDesc> {
        if !self.can_attack() {
            if self.attack_started() {
                self.attacks.clear();
            }
            return None;
        }
        match self.attacks_taken {
            0 => {
                self.standard_actions -= 1;
                self.moves_left = 0;
                self.full_round = false;
            }
            1 => self.move_actions -= 1,
            _ => {}
        }
        self.attacks_taken = self.attacks_taken.saturating_add(1);
        self.attacks.pop_front()
    }

    /// Spends a full-round action and keeps only the first attack of the chain.
    pub fn begin_charge(&mut self) -> Option<AttackDesc> {
        if self.attacks.is_empty() || !self.use_full_round() {
            return None;
        }
        let first = self.attacks.pop_front();
        self.attacks.clear();
        self.attacks_taken = 1;
        first
    }

    pub fn can_make_opportunity(&self) -> bool {
        self.opportunity_attacks > 0 && self.opportunity_template.is_some()
    }

    pub fn take_opportunity(&mut self) -> Option<AttackDesc> {
        if !self.can_make_opportunity() {
            return None;
        }
        self.opportunity_attacks -= 1;
        self.opportunity_template.clone()
    }

    fn next_attack_affordable(&self) -> bool {
        match self.attacks_taken {
            0 => self.standard_actions > 0,
            1 => self.move_actions > 0 && !self.has_moved,
            _ => true,
        }
    }
}
