//! Built-in rule extensions (feats and fighting styles).
//! This module exists so extensions attach to a combatant through one apply-once contract:
//! adjust stats and subscribe hook handlers. It does not load extension data from files.

use std::fmt;
use std::sync::Arc;

use crate::combatant::Combatant;
use crate::content::keys;
use crate::dice::Dice;
use crate::error::HookError;
use crate::hooks::{Handler, Hook, HookContext};
use crate::types::{Ability, Hand, Maneuver, SaveKind};

/// Distance in tiles within which point-blank bonuses apply.
pub const POINT_BLANK_RANGE: f32 = 6.0;

/// Anything that can be attached to a combatant once.
pub trait RuleExtension: fmt::Debug {
    fn key(&self) -> String;

    fn apply(&self, combatant: &mut Combatant);
}

fn unexpected(handler: &str, hook: Hook) -> HookError {
    HookError::UnexpectedContext { handler: handler.to_string(), hook }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WeaponFocus {
    pub weapon: String,
    key: String,
}

impl WeaponFocus {
    pub fn new(weapon: impl Into<String>) -> Self {
        let weapon = weapon.into();
        let key = format!("{}:{weapon}", keys::FEAT_WEAPON_FOCUS);
        Self { weapon, key }
    }
}

impl RuleExtension for WeaponFocus {
    fn key(&self) -> String {
        self.key.clone()
    }

    fn apply(&self, combatant: &mut Combatant) {
        combatant.events.subscribe(Hook::AttackCalculation, Arc::new(self.clone()));
    }
}

impl Handler for WeaponFocus {
    fn name(&self) -> &str {
        &self.key
    }

    fn handle(
        &self,
        hook: Hook,
        _owner: &Combatant,
        ctx: &mut HookContext<'_>,
    ) -> Result<(), HookError> {
        let HookContext::Attack(desc) = ctx else {
            return Err(unexpected(self.name(), hook));
        };
        if desc.weapon.name == self.weapon {
            desc.attack_bonus += 1;
        }
        Ok(())
    }
}

/// Trades accuracy for melee damage: −(1 + BAB/4) to hit, the same to damage, doubled
/// for two-handed weapons.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PowerAttack;

impl RuleExtension for PowerAttack {
    fn key(&self) -> String {
        keys::FEAT_POWER_ATTACK.to_string()
    }

    fn apply(&self, combatant: &mut Combatant) {
        combatant.events.subscribe(Hook::AttackCalculation, Arc::new(*self));
    }
}

impl Handler for PowerAttack {
    fn name(&self) -> &str {
        keys::FEAT_POWER_ATTACK
    }

    fn handle(
        &self,
        hook: Hook,
        owner: &Combatant,
        ctx: &mut HookContext<'_>,
    ) -> Result<(), HookError> {
        let HookContext::Attack(desc) = ctx else {
            return Err(unexpected(self.name(), hook));
        };
        if desc.ranged {
            return Ok(());
        }
        let trade = 1 + owner.base_attack_bonus.max(0) / 4;
        desc.attack_bonus -= trade;
        desc.damage_bonus += if desc.weapon.two_handed { trade * 2 } else { trade };
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PointBlankShot;

impl RuleExtension for PointBlankShot {
    fn key(&self) -> String {
        keys::FEAT_POINT_BLANK_SHOT.to_string()
    }

    fn apply(&self, combatant: &mut Combatant) {
        combatant.events.subscribe(Hook::TargetSelection, Arc::new(*self));
    }
}

impl Handler for PointBlankShot {
    fn name(&self) -> &str {
        keys::FEAT_POINT_BLANK_SHOT
    }

    fn handle(
        &self,
        hook: Hook,
        _owner: &Combatant,
        ctx: &mut HookContext<'_>,
    ) -> Result<(), HookError> {
        let HookContext::Target(desc) = ctx else {
            return Err(unexpected(self.name(), hook));
        };
        if desc.ranged && desc.target().distance <= POINT_BLANK_RANGE {
            desc.attack_bonus += 1;
            desc.damage_bonus += 1;
        }
        Ok(())
    }
}

/// Doubles the weapon's threat range.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ImprovedCritical;

impl RuleExtension for ImprovedCritical {
    fn key(&self) -> String {
        keys::FEAT_IMPROVED_CRITICAL.to_string()
    }

    fn apply(&self, combatant: &mut Combatant) {
        combatant.events.subscribe(Hook::CriticalRoll, Arc::new(*self));
    }
}

impl Handler for ImprovedCritical {
    fn name(&self) -> &str {
        keys::FEAT_IMPROVED_CRITICAL
    }

    fn handle(
        &self,
        hook: Hook,
        _owner: &Combatant,
        ctx: &mut HookContext<'_>,
    ) -> Result<(), HookError> {
        let HookContext::Critical(check) = ctx else {
            return Err(unexpected(self.name(), hook));
        };
        let width = 21 - check.threat_min;
        check.threat_min = (21 - width * 2).max(2);
        Ok(())
    }
}

/// Reduces dual-wield penalties to −4/−4, or −2/−2 with a light off-hand weapon.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TwoWeaponFighting;

impl RuleExtension for TwoWeaponFighting {
    fn key(&self) -> String {
        keys::FEAT_TWO_WEAPON_FIGHTING.to_string()
    }

    fn apply(&self, combatant: &mut Combatant) {
        combatant.events.subscribe(Hook::AttackCalculation, Arc::new(*self));
    }
}

impl Handler for TwoWeaponFighting {
    fn name(&self) -> &str {
        keys::FEAT_TWO_WEAPON_FIGHTING
    }

    fn handle(
        &self,
        hook: Hook,
        _owner: &Combatant,
        ctx: &mut HookContext<'_>,
    ) -> Result<(), HookError> {
        let HookContext::Attack(desc) = ctx else {
            return Err(unexpected(self.name(), hook));
        };
        if desc.dual_wield {
            desc.attack_bonus += match desc.hand {
                Hand::Main => 2,
                Hand::Off => 6,
            };
        }
        Ok(())
    }
}

/// One extra full-BAB strike per turn, paid for with −2 on every melee attack.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FlurryStyle;

impl RuleExtension for FlurryStyle {
    fn key(&self) -> String {
        keys::STYLE_FLURRY.to_string()
    }

    fn apply(&self, combatant: &mut Combatant) {
        combatant.bonus_strikes = combatant.bonus_strikes.saturating_add(1);
        combatant.events.subscribe(Hook::AttackCalculation, Arc::new(*self));
    }
}

impl Handler for FlurryStyle {
    fn name(&self) -> &str {
        keys::STYLE_FLURRY
    }

    fn handle(
        &self,
        hook: Hook,
        _owner: &Combatant,
        ctx: &mut HookContext<'_>,
    ) -> Result<(), HookError> {
        let HookContext::Attack(desc) = ctx else {
            return Err(unexpected(self.name(), hook));
        };
        if desc.is_melee() {
            desc.attack_bonus -= 2;
        }
        Ok(())
    }
}

/// +4 on trip checks; also lets trips skip provoking, which the battle checks by key.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ImprovedTrip;

impl RuleExtension for ImprovedTrip {
    fn key(&self) -> String {
        keys::FEAT_IMPROVED_TRIP.to_string()
    }

    fn apply(&self, combatant: &mut Combatant) {
        combatant.events.subscribe(Hook::TargetSelection, Arc::new(*self));
    }
}

impl Handler for ImprovedTrip {
    fn name(&self) -> &str {
        keys::FEAT_IMPROVED_TRIP
    }

    fn handle(
        &self,
        hook: Hook,
        _owner: &Combatant,
        ctx: &mut HookContext<'_>,
    ) -> Result<(), HookError> {
        let HookContext::Target(desc) = ctx else {
            return Err(unexpected(self.name(), hook));
        };
        if desc.maneuver == Some(Maneuver::Trip) {
            desc.opposed_check += 4;
        }
        Ok(())
    }
}

/// Extra d6s on melee strikes against flanked targets, never multiplied on a critical.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SneakAttack {
    pub dice: u8,
}

impl Default for SneakAttack {
    fn default() -> Self {
        Self { dice: 1 }
    }
}

impl RuleExtension for SneakAttack {
    fn key(&self) -> String {
        keys::FEAT_SNEAK_ATTACK.to_string()
    }

    fn apply(&self, combatant: &mut Combatant) {
        combatant.events.subscribe(Hook::TargetSelection, Arc::new(*self));
    }
}

impl Handler for SneakAttack {
    fn name(&self) -> &str {
        keys::FEAT_SNEAK_ATTACK
    }

    fn handle(
        &self,
        hook: Hook,
        _owner: &Combatant,
        ctx: &mut HookContext<'_>,
    ) -> Result<(), HookError> {
        let HookContext::Target(desc) = ctx else {
            return Err(unexpected(self.name(), hook));
        };
        if desc.target().flanked && desc.is_melee() && desc.maneuver.is_none() {
            desc.bonus_damage.push(Dice::new(self.dice, 6));
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Toughness;

impl RuleExtension for Toughness {
    fn key(&self) -> String {
        keys::FEAT_TOUGHNESS.to_string()
    }

    fn apply(&self, combatant: &mut Combatant) {
        combatant.health_max += 3;
        combatant.health += 3;
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Dodge;

impl RuleExtension for Dodge {
    fn key(&self) -> String {
        keys::FEAT_DODGE.to_string()
    }

    fn apply(&self, combatant: &mut Combatant) {
        combatant.armor_class.dodge += 1;
    }
}

/// Extra opportunity attacks per round equal to the Dexterity modifier at the time learned.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CombatReflexes;

impl RuleExtension for CombatReflexes {
    fn key(&self) -> String {
        keys::FEAT_COMBAT_REFLEXES.to_string()
    }

    fn apply(&self, combatant: &mut Combatant) {
        let extra = combatant.modifier(Ability::Dexterity).clamp(0, i32::from(u8::MAX)) as u8;
        combatant.allowance.opportunity_attacks =
            combatant.allowance.opportunity_attacks.saturating_add(extra);
    }
}

/// +2 on one kind of saving throw.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SaveFocus {
    pub kind: SaveKind,
}

impl SaveFocus {
    pub fn great_fortitude() -> Self {
        Self { kind: SaveKind::Fortitude }
    }

    pub fn lightning_reflexes() -> Self {
        Self { kind: SaveKind::Reflex }
    }

    pub fn iron_will() -> Self {
        Self { kind: SaveKind::Will }
    }

    fn static_key(&self) -> &'static str {
        match self.kind {
            SaveKind::Fortitude => keys::FEAT_GREAT_FORTITUDE,
            SaveKind::Reflex => keys::FEAT_LIGHTNING_REFLEXES,
            SaveKind::Will => keys::FEAT_IRON_WILL,
        }
    }
}

impl RuleExtension for SaveFocus {
    fn key(&self) -> String {
        self.static_key().to_string()
    }

    fn apply(&self, combatant: &mut Combatant) {
        combatant.events.subscribe(Hook::Save(self.kind), Arc::new(*self));
    }
}

impl Handler for SaveFocus {
    fn name(&self) -> &str {
        self.static_key()
    }

    fn handle(
        &self,
        hook: Hook,
        _owner: &Combatant,
        ctx: &mut HookContext<'_>,
    ) -> Result<(), HookError> {
        let HookContext::Save(check) = ctx else {
            return Err(unexpected(self.name(), hook));
        };
        if check.kind == self.kind {
            check.bonus += 2;
        }
        Ok(())
    }
}
