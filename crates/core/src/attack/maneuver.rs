use tracing::debug;

use super::*;
use crate::combatant::Combatant;
use crate::dice::DiceRoller;
use crate::types::Ability;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripOutcome {
    pub attacker: CombatantId,
    pub target: CombatantId,
    pub attacker_roll: i32,
    pub attacker_total: i32,
    pub defender_roll: i32,
    pub defender_total: i32,
    pub success: bool,
}

impl AttackDesc {
    /// Turns a chain entry into a trip attempt; the opposed modifier is Strength plus the
    /// size maneuver modifier, adjusted later by target-selection handlers.
    pub fn into_trip(mut self, attacker: &Combatant) -> Self {
        self.maneuver = Some(Maneuver::Trip);
        self.touch = true;
        self.opposed_check =
            attacker.modifier(Ability::Strength) + attacker.size.maneuver_modifier();
        self
    }
}

/// Defender's opposed modifier: the better of Strength and Dexterity, plus size.
pub fn trip_defense(defender: &Combatant) -> i32 {
    defender.modifier(Ability::Strength).max(defender.modifier(Ability::Dexterity))
        + defender.size.maneuver_modifier()
}

/// Opposed d20 check. Ties go to the higher modifier, then to the defender.
pub fn resolve_trip(
    desc: &AttackDesc<TargetBound>,
    defender: &Combatant,
    dice: &mut dyn DiceRoller,
) -> TripOutcome {
    let attacker_roll = dice.d20();
    let defender_roll = dice.d20();
    let defense = trip_defense(defender);
    let attacker_total = attacker_roll + desc.opposed_check;
    let defender_total = defender_roll + defense;
    let success = attacker_total > defender_total
        || (attacker_total == defender_total && desc.opposed_check > defense);
    debug!(attacker_total, defender_total, success, "trip resolved");
    TripOutcome {
        attacker: desc.attacker,
        target: desc.target().target,
        attacker_roll,
        attacker_total,
        defender_roll,
        defender_total,
        success,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::ScriptedDice;
    use crate::types::{Faction, Size};

    fn attempt(attacker: &Combatant, defender: &Combatant) -> AttackDesc<TargetBound> {
        AttackDesc::new(attacker.id, attacker.base_attack_bonus, Weapon::unarmed(), Hand::Main)
            .into_trip(attacker)
            .bind(TargetBound {
                target: defender.id,
                armor_class: defender.touch_armor_class(),
                distance: 1.0,
                prone: false,
                flanked: false,
            })
    }

    #[test]
    fn larger_attacker_wins_ties_on_modifier() {
        let ogre = Combatant::new("ogre", Faction(1)).with_size(Size::Large);
        let elf = Combatant::new("elf", Faction(0));
        let desc = attempt(&ogre, &elf);
        assert_eq!(desc.opposed_check, 4);
        let outcome = resolve_trip(&desc, &elf, &mut ScriptedDice::new([10, 14]));
        assert_eq!(outcome.attacker_total, outcome.defender_total);
        assert!(outcome.success);
    }

    #[test]
    fn equal_modifiers_tie_to_the_defender() {
        let a = Combatant::new("a", Faction(0));
        let b = Combatant::new("b", Faction(1));
        let desc = attempt(&a, &b);
        let outcome = resolve_trip(&desc, &b, &mut ScriptedDice::new([12, 12]));
        assert!(!outcome.success);
        let outcome = resolve_trip(&desc, &b, &mut ScriptedDice::new([13, 12]));
        assert!(outcome.success);
    }

    #[test]
    fn defender_uses_the_better_of_strength_and_dexterity() {
        let nimble = Combatant::new("nimble", Faction(1))
            .with_ability(Ability::Strength, 8)
            .with_ability(Ability::Dexterity, 18);
        assert_eq!(trip_defense(&nimble), 4);
    }
}
