use super::*;
use crate::combatant::Combatant;
use crate::hooks::{Hook, HookContext};

/// Chance that a d20 attack with `total_bonus` hits `armor_class`, natural 1 and 20 included.
pub fn hit_probability(total_bonus: i32, armor_class: i32) -> f32 {
    let needed = (armor_class - total_bonus).clamp(2, 20);
    (21 - needed) as f32 / 20.0
}

/// Expected damage of `desc` against `target`, without rolling or mutating anything.
/// Target-selection handlers see a scratch copy of the descriptor.
pub fn estimate_damage(attacker: &Combatant, desc: &AttackDesc, target: TargetBound) -> f32 {
    let mut scratch = desc.clone().bind(target);
    attacker.events.fire(Hook::TargetSelection, attacker, &mut HookContext::Target(&mut scratch));
    hit_probability(scratch.total_bonus(), target.armor_class) * scratch.mean_damage()
}
