//! Attack descriptors and the roll/hit/critical/damage pipeline.
//! This module exists so one prospective attack moves through explicit stages: generated
//! from the attack chain, bound to a target, then resolved exactly once.
//! It does not own health changes; the orchestrator applies an outcome to the target.

use serde::{Deserialize, Serialize};

use crate::combatant::Weapon;
use crate::dice::Dice;
use crate::types::{CombatantId, Hand, Maneuver};

mod chain;
mod estimate;
mod maneuver;
mod resolve;

pub use chain::{MAX_ITERATIVE_ATTACKS, generate_chain, iterative_bonuses};
pub use estimate::{estimate_damage, hit_probability};
pub use maneuver::{TripOutcome, resolve_trip, trip_defense};
pub use resolve::{attack_hits, resolve_attack};

/// Stage marker: built from the attack chain, no target yet.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Generated;

/// Stage marker: situational facts about the chosen target.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TargetBound {
    pub target: CombatantId,
    /// Armor class already adjusted for touch, prone and charging.
    pub armor_class: i32,
    /// Euclidean distance between anchors, in tiles.
    pub distance: f32,
    pub prone: bool,
    pub flanked: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AttackDesc<S = Generated> {
    pub attacker: CombatantId,
    pub base_attack_bonus: i32,
    /// Everything added to the d20 besides the base attack bonus.
    pub attack_bonus: i32,
    pub weapon: Weapon,
    pub hand: Hand,
    pub damage: Dice,
    pub damage_bonus: i32,
    /// Extra dice added after any critical multiplier.
    pub bonus_damage: Vec<Dice>,
    pub touch: bool,
    pub ranged: bool,
    pub opportunity: bool,
    pub bonus_strike: bool,
    pub dual_wield: bool,
    pub charge: bool,
    pub critical_confirm_bonus: i32,
    /// Modifier for opposed maneuver checks.
    pub opposed_check: i32,
    pub maneuver: Option<Maneuver>,
    stage: S,
}

impl AttackDesc {
    pub fn new(attacker: CombatantId, base_attack_bonus: i32, weapon: Weapon, hand: Hand) -> Self {
        Self {
            attacker,
            base_attack_bonus,
            attack_bonus: 0,
            damage: weapon.damage,
            touch: weapon.touch,
            ranged: weapon.is_ranged(),
            weapon,
            hand,
            damage_bonus: 0,
            bonus_damage: Vec::new(),
            opportunity: false,
            bonus_strike: false,
            dual_wield: false,
            charge: false,
            critical_confirm_bonus: 0,
            opposed_check: 0,
            maneuver: None,
            stage: Generated,
        }
    }

    pub fn bind(self, target: TargetBound) -> AttackDesc<TargetBound> {
        AttackDesc {
            attacker: self.attacker,
            base_attack_bonus: self.base_attack_bonus,
            attack_bonus: self.attack_bonus,
            weapon: self.weapon,
            hand: self.hand,
            damage: self.damage,
            damage_bonus: self.damage_bonus,
            bonus_damage: self.bonus_damage,
            touch: self.touch,
            ranged: self.ranged,
            opportunity: self.opportunity,
            bonus_strike: self.bonus_strike,
            dual_wield: self.dual_wield,
            charge: self.charge,
            critical_confirm_bonus: self.critical_confirm_bonus,
            opposed_check: self.opposed_check,
            maneuver: self.maneuver,
            stage: target,
        }
    }
}

impl<S> AttackDesc<S> {
    pub fn total_bonus(&self) -> i32 {
        self.base_attack_bonus + self.attack_bonus
    }

    pub fn is_melee(&self) -> bool {
        !self.ranged
    }

    /// Expected damage of a normal hit.
    pub fn mean_damage(&self) -> f32 {
        let base = (self.damage.mean() + self.damage_bonus as f32).max(1.0);
        base + self.bonus_damage.iter().map(|dice| dice.mean()).sum::<f32>()
    }
}

impl AttackDesc<TargetBound> {
    pub fn target(&self) -> &TargetBound {
        &self.stage
    }
}

/// Critical parameters, adjustable by the critical-roll hook before the roll.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CriticalCheck {
    /// Lowest natural roll that threatens.
    pub threat_min: i32,
    pub multiplier: i32,
    pub confirm_bonus: i32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackOutcome {
    pub attacker: CombatantId,
    pub target: CombatantId,
    pub hand: Hand,
    pub opportunity: bool,
    pub roll: i32,
    pub confirm_roll: Option<i32>,
    pub total: i32,
    pub armor_class: i32,
    pub hit: bool,
    pub critical: bool,
    pub damage: i32,
}
