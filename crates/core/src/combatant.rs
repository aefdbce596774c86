//! The combatant record: stats, equipment, effects, hooks and turn state in one value.
//! This module exists so rules read and write a single flat record instead of a class
//! hierarchy. It does not own grid registration; the battle keeps that in sync.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::attack::{AttackDesc, generate_chain};
use crate::dice::DiceRoller;
use crate::feats::RuleExtension;
use crate::grid::{Footprint, Placement, TemplateKey};
use crate::hooks::{
    EffectChange, EventManager, Hook, HookContext, SaveCheck, StatChange, TurnContext,
};
use crate::turn::{TurnAllowance, TurnState};
use crate::types::{
    Ability, CombatantId, Effect, Faction, HealthState, Pos, SaveKind, Size, VisualPos,
};

mod equipment;

pub use equipment::{Armor, Item, MAX_RANGE_INCREMENTS, Slot, Weapon};

/// The six ability scores, indexed by `Ability::index`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityScores(pub [i32; 6]);

impl Default for AbilityScores {
    fn default() -> Self {
        Self([10; 6])
    }
}

impl AbilityScores {
    pub fn get(&self, ability: Ability) -> i32 {
        self.0[ability.index()]
    }

    pub fn modifier(&self, ability: Ability) -> i32 {
        (self.get(ability) - 10).div_euclid(2)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArmorClass {
    pub base: i32,
    pub dodge: i32,
    pub natural: i32,
    pub armor: i32,
    pub deflection: i32,
    pub max_dex: Option<i32>,
}

impl Default for ArmorClass {
    fn default() -> Self {
        Self { base: 10, dodge: 0, natural: 0, armor: 0, deflection: 0, max_dex: None }
    }
}

#[derive(Clone, Debug)]
pub struct Combatant {
    pub id: CombatantId,
    pub name: String,
    pub faction: Faction,
    pub pos: Pos,
    pub visual: VisualPos,
    pub size: Size,
    pub footprint: Footprint,
    pub health: i32,
    pub health_max: i32,
    pub abilities: AbilityScores,
    pub armor_class: ArmorClass,
    pub base_attack_bonus: i32,
    pub base_saves: [i32; 3],
    pub equipment: BTreeMap<Slot, Item>,
    pub known_feats: BTreeSet<String>,
    /// Extra full-BAB main-hand attacks appended to every chain.
    pub bonus_strikes: u8,
    pub effects: BTreeSet<Effect>,
    pub events: EventManager,
    pub turn: TurnState,
    pub allowance: TurnAllowance,
    pub initiative: i32,
}

impl Combatant {
    pub fn new(name: impl Into<String>, faction: Faction) -> Self {
        Self {
            id: CombatantId::default(),
            name: name.into(),
            faction,
            pos: Pos { y: 0, x: 0 },
            visual: VisualPos::default(),
            size: Size::Medium,
            footprint: Footprint::default(),
            health: 10,
            health_max: 10,
            abilities: AbilityScores::default(),
            armor_class: ArmorClass::default(),
            base_attack_bonus: 0,
            base_saves: [0; 3],
            equipment: BTreeMap::new(),
            known_feats: BTreeSet::new(),
            bonus_strikes: 0,
            effects: BTreeSet::new(),
            events: EventManager::default(),
            turn: TurnState::default(),
            allowance: TurnAllowance::default(),
            initiative: 0,
        }
    }

    pub fn at(mut self, pos: Pos) -> Self {
        self.pos = pos;
        self.visual = VisualPos::from(pos);
        self
    }

    pub fn with_size(mut self, size: Size) -> Self {
        self.size = size;
        self
    }

    pub fn with_health(mut self, health: i32) -> Self {
        self.health = health;
        self.health_max = health;
        self
    }

    pub fn with_base_attack_bonus(mut self, bab: i32) -> Self {
        self.base_attack_bonus = bab;
        self
    }

    /// Sets a score directly, without firing stat-change hooks.
    pub fn with_ability(mut self, ability: Ability, score: i32) -> Self {
        self.abilities.0[ability.index()] = score;
        self
    }

    pub fn with_base_save(mut self, kind: SaveKind, bonus: i32) -> Self {
        self.base_saves[kind.index()] = bonus;
        self
    }

    pub fn with_item(mut self, slot: Slot, item: Item) -> Self {
        self.equip(slot, item);
        self
    }

    pub fn modifier(&self, ability: Ability) -> i32 {
        self.abilities.modifier(ability)
    }

    pub fn health_state(&self) -> HealthState {
        HealthState::from_health(self.health)
    }

    pub fn is_conscious(&self) -> bool {
        self.health_state() == HealthState::Conscious
    }

    pub fn is_dead(&self) -> bool {
        self.health_state() == HealthState::Dead
    }

    pub fn has_effect(&self, effect: Effect) -> bool {
        self.effects.contains(&effect)
    }

    pub fn equip(&mut self, slot: Slot, item: Item) -> Option<Item> {
        let previous = self.unequip(slot);
        if let Item::Armor(armor) = &item {
            self.armor_class.armor = armor.bonus;
            self.armor_class.max_dex = armor.max_dex;
        }
        self.equipment.insert(slot, item);
        previous
    }

    pub fn unequip(&mut self, slot: Slot) -> Option<Item> {
        let removed = self.equipment.remove(&slot);
        if matches!(removed, Some(Item::Armor(_))) {
            self.armor_class.armor = 0;
            self.armor_class.max_dex = None;
        }
        removed
    }

    /// Main-hand weapon, or an unarmed strike when the hand is empty.
    pub fn main_weapon(&self) -> Weapon {
        match self.equipment.get(&Slot::MainHand) {
            Some(Item::Weapon(weapon)) => weapon.clone(),
            _ => Weapon::unarmed(),
        }
    }

    pub fn off_hand_weapon(&self) -> Option<&Weapon> {
        match self.equipment.get(&Slot::OffHand) {
            Some(Item::Weapon(weapon)) => Some(weapon),
            _ => None,
        }
    }

    /// Armor class against an incoming attack.
    pub fn defense(&self, ranged: bool, touch: bool) -> i32 {
        let ac = &self.armor_class;
        let dex = self.modifier(Ability::Dexterity);
        let dex = ac.max_dex.map_or(dex, |cap| dex.min(cap));
        let mut total = ac.base + ac.deflection + ac.dodge + dex + self.size.attack_modifier();
        if !touch {
            total += ac.armor + ac.natural;
        }
        if self.has_effect(Effect::Prone) {
            total += if ranged { 4 } else { -4 };
        }
        if self.has_effect(Effect::Charging) {
            total -= 2;
        }
        total
    }

    pub fn melee_armor_class(&self) -> i32 {
        self.defense(false, false)
    }

    pub fn touch_armor_class(&self) -> i32 {
        self.defense(false, true)
    }

    /// Threat shape for the wielded weapon. Ranged weapons and non-conscious combatants
    /// occupy without threatening.
    pub fn template_key(&self) -> TemplateKey {
        let weapon = self.main_weapon();
        let natural = self.size.natural_reach();
        let threatens = self.is_conscious() && !weapon.is_ranged();
        if weapon.reach {
            TemplateKey { size: self.size, reach: natural * 2, near: false, far: threatens }
        } else {
            TemplateKey { size: self.size, reach: natural, near: threatens, far: false }
        }
    }

    /// Shape used to test whether a melee attack can reach a target, regardless of
    /// consciousness.
    pub fn attack_template_key(&self) -> TemplateKey {
        let weapon = self.main_weapon();
        let natural = self.size.natural_reach();
        if weapon.reach {
            TemplateKey { size: self.size, reach: natural * 2, near: false, far: true }
        } else {
            TemplateKey { size: self.size, reach: natural, near: true, far: false }
        }
    }

    pub fn placement(&self) -> Placement {
        Placement { anchor: self.pos, key: self.template_key() }
    }

    /// Applies a rule extension once; a second attempt with the same key is ignored.
    pub fn learn(&mut self, extension: &dyn RuleExtension) -> bool {
        let key = extension.key();
        if self.known_feats.contains(&key) {
            return false;
        }
        extension.apply(self);
        debug!(combatant = %self.name, feat = %key, "rule extension applied");
        self.known_feats.insert(key);
        true
    }

    pub fn knows(&self, key: &str) -> bool {
        self.known_feats.contains(key)
    }

    /// Resets the action economy, rebuilds the attack chain and fires the turn-start hook.
    pub fn begin_turn(&mut self, round: u32) {
        self.remove_effect(Effect::Charging);
        let attacks = generate_chain(self);
        self.turn.on_turn_start(self.allowance, attacks);
        let ctx = TurnContext { round };
        self.events.fire(Hook::TurnStart, self, &mut HookContext::Turn(&ctx));
    }

    pub fn end_turn(&mut self, round: u32) {
        self.turn.end_turn();
        let ctx = TurnContext { round };
        self.events.fire(Hook::TurnEnd, self, &mut HookContext::Turn(&ctx));
    }

    pub fn end_round(&self, round: u32) {
        let ctx = TurnContext { round };
        self.events.fire(Hook::RoundEnd, self, &mut HookContext::Turn(&ctx));
    }

    /// Arms opportunity attacks from the current chain without starting a turn.
    pub fn refresh_reactions(&mut self) {
        let template: Option<AttackDesc> = generate_chain(self).into_iter().next();
        self.turn.arm_reactions(self.allowance.opportunity_attacks, template);
    }

    pub fn take_damage(&mut self, amount: i32) -> HealthState {
        self.health -= amount.max(0);
        self.health_state()
    }

    /// d20 + base save + ability modifier against `dc`, after save handlers adjust the
    /// bonus. Natural 20 succeeds and natural 1 fails.
    pub fn saving_throw(&self, kind: SaveKind, dc: i32, dice: &mut dyn DiceRoller) -> bool {
        let mut check = SaveCheck {
            kind,
            bonus: self.base_saves[kind.index()] + self.modifier(kind.ability()),
            dc,
        };
        self.events.fire(Hook::Save(kind), self, &mut HookContext::Save(&mut check));
        let roll = dice.d20();
        match roll {
            20 => true,
            1 => false,
            _ => roll + check.bonus >= check.dc,
        }
    }

    /// Routes a score change through the stat-change hook; handlers may adjust the new value.
    pub fn set_ability(&mut self, ability: Ability, score: i32) -> i32 {
        let mut change = StatChange { ability, old: self.abilities.get(ability), new: score };
        self.events.fire(Hook::StatChange(ability), self, &mut HookContext::Stat(&mut change));
        self.abilities.0[ability.index()] = change.new;
        change.new
    }

    pub fn add_effect(&mut self, effect: Effect) -> bool {
        if !self.effects.insert(effect) {
            return false;
        }
        let change = EffectChange { effect };
        self.events.fire(Hook::EffectStart, self, &mut HookContext::Effect(&change));
        true
    }

    pub fn remove_effect(&mut self, effect: Effect) -> bool {
        if !self.effects.remove(&effect) {
            return false;
        }
        let change = EffectChange { effect };
        self.events.fire(Hook::EffectStop, self, &mut HookContext::Effect(&change));
        true
    }
}
