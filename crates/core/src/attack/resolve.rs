use tracing::debug;

use super::*;
use crate::combatant::Combatant;
use crate::dice::DiceRoller;
use crate::hooks::{Hook, HookContext};

/// Natural 20 always hits and natural 1 always misses; otherwise the total must meet the AC.
pub fn attack_hits(roll: i32, total_bonus: i32, armor_class: i32) -> bool {
    match roll {
        20 => true,
        1 => false,
        _ => roll + total_bonus >= armor_class,
    }
}

/// Fires the critical-roll hook on the attacker and rolls the bound attack.
pub fn resolve_attack(
    attacker: &Combatant,
    desc: AttackDesc<TargetBound>,
    dice: &mut dyn DiceRoller,
) -> AttackOutcome {
    let mut critical = desc.critical_check();
    attacker.events.fire(Hook::CriticalRoll, attacker, &mut HookContext::Critical(&mut critical));
    let outcome = desc.resolve(critical, dice);
    debug!(
        attacker = %attacker.name,
        roll = outcome.roll,
        total = outcome.total,
        ac = outcome.armor_class,
        hit = outcome.hit,
        critical = outcome.critical,
        damage = outcome.damage,
        "attack resolved"
    );
    outcome
}

impl AttackDesc<TargetBound> {
    pub fn critical_check(&self) -> CriticalCheck {
        CriticalCheck {
            threat_min: self.weapon.threat_min,
            multiplier: self.weapon.crit_multiplier,
            confirm_bonus: self.critical_confirm_bonus,
        }
    }

    /// Consumes the descriptor. Rolls in order: attack d20, confirmation d20 (only for a
    /// threatening hit), weapon dice, then bonus dice.
    pub fn resolve(self, critical: CriticalCheck, dice: &mut dyn DiceRoller) -> AttackOutcome {
        let roll = dice.d20();
        let total = self.total_bonus();
        let armor_class = self.stage.armor_class;
        let hit = attack_hits(roll, total, armor_class);

        let mut confirm_roll = None;
        let mut confirmed = false;
        if hit && roll >= critical.threat_min {
            let confirm = dice.d20();
            confirm_roll = Some(confirm);
            confirmed = attack_hits(confirm, total + critical.confirm_bonus, armor_class);
        }

        let damage = if hit {
            let base = (self.damage.roll(dice) + self.damage_bonus).max(1);
            let multiplier = if confirmed { critical.multiplier.max(1) } else { 1 };
            let extra: i32 = self.bonus_damage.iter().map(|bonus| bonus.roll(dice)).sum();
            base * multiplier + extra
        } else {
            0
        };

        AttackOutcome {
            attacker: self.attacker,
            target: self.stage.target,
            hand: self.hand,
            opportunity: self.opportunity,
            roll,
            confirm_roll,
            total,
            armor_class,
            hit,
            critical: confirmed,
            damage,
        }
    }
}

#[cfg(test)]
mod tests {
    use slotmap::SlotMap;

    use super::*;
    use crate::dice::ScriptedDice;

    fn bound(bonus: i32, armor_class: i32) -> AttackDesc<TargetBound> {
        let mut arena: SlotMap<CombatantId, ()> = SlotMap::with_key();
        let attacker = arena.insert(());
        let target = arena.insert(());
        let mut weapon = Weapon::unarmed();
        weapon.damage = Dice::new(1, 8);
        weapon.threat_min = 19;
        weapon.crit_multiplier = 2;
        AttackDesc::new(attacker, bonus, weapon, Hand::Main).bind(TargetBound {
            target,
            armor_class,
            distance: 1.0,
            prone: false,
            flanked: false,
        })
    }

    fn roll(desc: AttackDesc<TargetBound>, rolls: &[i32]) -> AttackOutcome {
        let critical = desc.critical_check();
        desc.resolve(critical, &mut ScriptedDice::new(rolls.iter().copied()))
    }

    #[test]
    fn ten_plus_five_meets_armor_class_fifteen() {
        assert!(attack_hits(10, 5, 15));
        assert!(!attack_hits(9, 5, 15));
        let outcome = roll(bound(5, 15), &[10, 6]);
        assert!(outcome.hit);
        assert_eq!(outcome.damage, 6);
        assert_eq!(outcome.confirm_roll, None);
    }

    #[test]
    fn natural_one_misses_regardless_of_bonus() {
        assert!(!attack_hits(1, 50, 15));
        let outcome = roll(bound(50, 15), &[1]);
        assert!(!outcome.hit);
        assert_eq!(outcome.damage, 0);
    }

    #[test]
    fn natural_twenty_hits_regardless_of_armor_class() {
        assert!(attack_hits(20, -5, 60));
        let outcome = roll(bound(0, 60), &[20, 2, 5]);
        assert!(outcome.hit);
        assert_eq!(outcome.confirm_roll, Some(2));
        assert!(!outcome.critical);
        assert_eq!(outcome.damage, 5);
    }

    #[test]
    fn confirmed_critical_multiplies_weapon_damage_but_not_bonus_dice() {
        let mut desc = bound(5, 15);
        desc.damage_bonus = 2;
        desc.bonus_damage.push(Dice::new(1, 6));
        let outcome = roll(desc, &[19, 12, 4, 3]);
        assert!(outcome.critical);
        assert_eq!(outcome.damage, (4 + 2) * 2 + 3);
    }

    #[test]
    fn missed_threat_never_rolls_confirmation() {
        let outcome = roll(bound(-10, 15), &[19, 20]);
        assert!(!outcome.hit);
        assert_eq!(outcome.confirm_roll, None);
    }

    #[test]
    fn damage_never_drops_below_one_on_a_hit() {
        let mut desc = bound(5, 10);
        desc.damage_bonus = -5;
        let outcome = roll(desc, &[15, 1]);
        assert_eq!(outcome.damage, 1);
    }
}
