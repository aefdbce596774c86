//! Read-only query surface shared by strategies and the action executor.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use super::*;
use crate::attack::{AttackDesc, TargetBound, estimate_damage, generate_chain};
use crate::pathfinding::{Goal, Path, octile_distance};
use crate::types::{Faction, Pos, Terrain};

impl Battle {
    pub fn is_enemy(&self, a: CombatantId, b: CombatantId) -> bool {
        match (self.combatants.get(a), self.combatants.get(b)) {
            (Some(a), Some(b)) => a.faction != b.faction,
            _ => false,
        }
    }

    /// Nearest conscious enemy by anchor distance; ties go to the earlier slot in turn order.
    pub fn find_enemy(&self, id: CombatantId) -> Option<CombatantId> {
        let me = self.combatants.get(id)?;
        let mut best: Option<(f32, CombatantId)> = None;
        for other in self.combatants() {
            if other.faction == me.faction || !other.is_conscious() {
                continue;
            }
            let distance = me.pos.euclidean(other.pos);
            if best.is_none_or(|(closest, _)| distance < closest) {
                best = Some((distance, other.id));
            }
        }
        best.map(|(_, enemy)| enemy)
    }

    /// Factions that still have at least one conscious member.
    pub fn standing_factions(&self) -> BTreeSet<Faction> {
        self.combatants().filter(|c| c.is_conscious()).map(|c| c.faction).collect()
    }

    /// `attacker` projects threat onto at least one tile `target` occupies.
    pub fn threatens(&self, attacker: CombatantId, target: CombatantId) -> bool {
        self.combatants.get(target).is_some_and(|target| {
            target
                .footprint
                .occupied()
                .iter()
                .any(|pos| self.grid.threatening(*pos).any(|id| id == attacker))
        })
    }

    /// Whether `attacker` could strike `target` with its main weapon from where it stands.
    pub fn can_reach(&self, attacker: CombatantId, target: CombatantId) -> bool {
        let (Some(a), Some(t)) = (self.combatants.get(attacker), self.combatants.get(target))
        else {
            return false;
        };
        reaches_from(&self.grid, a, a.pos, t)
    }

    pub fn distance(&self, a: CombatantId, b: CombatantId) -> Option<f32> {
        let a = self.combatants.get(a)?;
        let b = self.combatants.get(b)?;
        Some(a.pos.euclidean(b.pos))
    }

    pub fn path_to(&self, id: CombatantId, dest: Pos) -> Option<Path> {
        let mover = self.mover(id)?;
        self.pathfinder.borrow_mut().find_path(&self.grid, mover, Goal::Tile(dest))
    }

    /// Shortest path to a tile from which the main weapon can hit `target`.
    pub fn path_to_range(&self, id: CombatantId, target: CombatantId) -> Option<Path> {
        let me = self.combatants.get(id)?;
        let other = self.combatants.get(target)?;
        let goal = match me.main_weapon().range_increment {
            Some(increment) => {
                Goal::WithinRange { center: other.pos, min: 0.0, max: increment as f32 }
            }
            None => Goal::AnyOf(self.striking_anchors(me, other)),
        };
        let mover = self.mover(id)?;
        self.pathfinder.borrow_mut().find_path(&self.grid, mover, goal)
    }

    /// Every anchor from which `attacker`'s melee template covers a tile `target` occupies.
    fn striking_anchors(&self, attacker: &Combatant, target: &Combatant) -> Vec<Pos> {
        let template = self.grid.template_for(attacker.attack_template_key());
        let anchors: BTreeSet<Pos> = target
            .footprint
            .occupied()
            .iter()
            .flat_map(|pos| template.threatened().map(move |o| pos.offset(-o.dx, -o.dy)))
            .collect();
        anchors.into_iter().collect()
    }

    /// Straight lane for a charge at `target`, ending on the first tile from which the
    /// attacker reaches it. Needs at least two tiles of clear, normal terrain and at most
    /// double speed.
    pub fn charge_lane(&self, id: CombatantId, target: CombatantId) -> Option<Vec<Pos>> {
        let me = self.combatants.get(id)?;
        let other = self.combatants.get(target)?;
        if me.main_weapon().is_ranged() || !other.is_conscious() {
            return None;
        }
        let mover = self.mover(id)?;
        let walk = self.pathfinder.borrow_mut().straight_line(&self.grid, mover, other.pos);
        let end = walk.steps.iter().position(|pos| reaches_from(&self.grid, me, *pos, other))?;
        let lane = walk.steps[..=end].to_vec();
        if lane.len() < 2 {
            return None;
        }
        if lane.iter().any(|pos| self.grid.terrain(*pos) != Some(Terrain::Free)) {
            return None;
        }
        let last = *lane.last()?;
        (octile_distance(me.pos, last) <= me.allowance.speed * 2).then_some(lane)
    }

    /// Reachable conscious enemy with the best expected damage. Ties go to lower health,
    /// then to the earlier slot in turn order.
    pub fn best_target(&self, id: CombatantId) -> Option<CombatantId> {
        let mut best: Option<(f32, i32, CombatantId)> = None;
        for other in self.combatants() {
            if !self.is_enemy(id, other.id)
                || !other.is_conscious()
                || !self.can_reach(id, other.id)
            {
                continue;
            }
            let Some(expected) = self.estimate_damage(id, other.id) else {
                continue;
            };
            let better = best.is_none_or(|(score, health, _)| {
                match expected.partial_cmp(&score) {
                    Some(Ordering::Greater) => true,
                    Some(Ordering::Equal) => other.health < health,
                    _ => false,
                }
            });
            if better {
                best = Some((expected, other.health, other.id));
            }
        }
        best.map(|(_, _, target)| target)
    }

    /// Expected damage of the attacker's next queued attack (or the head of a fresh chain
    /// outside its turn) against `target`.
    pub fn estimate_damage(&self, id: CombatantId, target: CombatantId) -> Option<f32> {
        let me = self.combatants.get(id)?;
        let other = self.combatants.get(target)?;
        let mut desc = match me.turn.peek_attack() {
            Some(desc) => desc.clone(),
            None => generate_chain(me).into_iter().next()?,
        };
        let facts = self.target_facts(me, other, &desc);
        apply_situational(me, &mut desc, &facts);
        Some(estimate_damage(me, &desc, facts))
    }

    pub(super) fn target_facts(
        &self,
        attacker: &Combatant,
        target: &Combatant,
        desc: &AttackDesc,
    ) -> TargetBound {
        TargetBound {
            target: target.id,
            armor_class: target.defense(desc.ranged, desc.touch),
            distance: attacker.pos.euclidean(target.pos),
            prone: target.has_effect(Effect::Prone),
            flanked: desc.is_melee() && self.flanked(attacker.id, target),
        }
    }

    /// Another conscious enemy of `target` besides the attacker threatens it.
    fn flanked(&self, attacker: CombatantId, target: &Combatant) -> bool {
        target.footprint.occupied().iter().any(|pos| {
            self.grid.threatening(*pos).any(|id| {
                id != attacker
                    && id != target.id
                    && self
                        .combatants
                        .get(id)
                        .is_some_and(|ally| ally.is_conscious() && ally.faction != target.faction)
            })
        })
    }
}

/// Bonuses and penalties from the situation rather than the attacker's build.
pub(super) fn apply_situational(attacker: &Combatant, desc: &mut AttackDesc, facts: &TargetBound) {
    if desc.is_melee() {
        if facts.flanked {
            desc.attack_bonus += 2;
        }
        if attacker.has_effect(Effect::Prone) {
            desc.attack_bonus -= 4;
        }
    } else {
        desc.attack_bonus += desc.weapon.range_penalty(facts.distance);
    }
}

/// Whether `attacker`, standing at `anchor`, could hit `target` with its main weapon.
pub(super) fn reaches_from(
    grid: &Grid,
    attacker: &Combatant,
    anchor: Pos,
    target: &Combatant,
) -> bool {
    let weapon = attacker.main_weapon();
    if let Some(max) = weapon.max_range() {
        return !target.footprint.is_empty() && anchor.euclidean(target.pos) <= max;
    }
    let template = grid.template_for(attacker.attack_template_key());
    let occupied = target.footprint.occupied();
    template
        .threatened()
        .any(|offset| occupied.contains(&anchor.offset(offset.dx, offset.dy)))
}
