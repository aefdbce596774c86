use super::*;
use crate::combatant::Combatant;
use crate::hooks::{Hook, HookContext};
use crate::types::Ability;

pub const MAX_ITERATIVE_ATTACKS: usize = 4;

/// Main-hand bonuses: full BAB, then five less per swing while the bonus stays
/// non-negative. The first swing is always available.
pub fn iterative_bonuses(base_attack_bonus: i32) -> Vec<i32> {
    (0..MAX_ITERATIVE_ATTACKS as i32)
        .map(|step| base_attack_bonus - 5 * step)
        .enumerate()
        .take_while(|(index, bonus)| *index == 0 || *bonus >= 0)
        .map(|(_, bonus)| bonus)
        .collect()
}

/// Builds this turn's attack queue: iterative main-hand attacks, one off-hand attack when
/// dual wielding, then bonus strikes. The attack-calculation hook fires once per entry.
pub fn generate_chain(combatant: &Combatant) -> Vec<AttackDesc> {
    let main = combatant.main_weapon();
    let off = combatant.off_hand_weapon().cloned();
    let dual_wield = off.is_some();
    let (main_penalty, off_penalty) = match &off {
        Some(weapon) if weapon.light => (-4, -8),
        Some(_) => (-6, -10),
        None => (0, 0),
    };

    let mut chain = Vec::new();
    for bonus in iterative_bonuses(combatant.base_attack_bonus) {
        let mut desc = prepare(combatant, bonus, main.clone(), Hand::Main);
        desc.attack_bonus += main_penalty;
        desc.dual_wield = dual_wield;
        chain.push(desc);
    }
    if let Some(weapon) = off {
        let mut desc = prepare(combatant, combatant.base_attack_bonus, weapon, Hand::Off);
        desc.attack_bonus += off_penalty;
        desc.dual_wield = true;
        chain.push(desc);
    }
    for _ in 0..combatant.bonus_strikes {
        let mut desc = prepare(combatant, combatant.base_attack_bonus, main.clone(), Hand::Main);
        desc.bonus_strike = true;
        desc.attack_bonus += main_penalty;
        desc.dual_wield = dual_wield;
        chain.push(desc);
    }

    for desc in &mut chain {
        combatant.events.fire(Hook::AttackCalculation, combatant, &mut HookContext::Attack(desc));
    }
    chain
}

/// Bakes ability, size and grip modifiers into a fresh descriptor.
pub(crate) fn prepare(
    combatant: &Combatant,
    base_attack_bonus: i32,
    weapon: Weapon,
    hand: Hand,
) -> AttackDesc {
    let strength = combatant.modifier(Ability::Strength);
    let to_hit = if weapon.is_ranged() {
        combatant.modifier(Ability::Dexterity)
    } else {
        strength
    };
    let damage_bonus = if weapon.is_ranged() {
        0
    } else if hand == Hand::Off && strength > 0 {
        strength / 2
    } else if weapon.two_handed && strength > 0 {
        strength * 3 / 2
    } else {
        strength
    };

    let mut desc = AttackDesc::new(combatant.id, base_attack_bonus, weapon, hand);
    desc.attack_bonus = to_hit + combatant.size.attack_modifier();
    desc.damage_bonus = damage_bonus;
    desc
}
