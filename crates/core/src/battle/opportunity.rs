//! Attacks of opportunity. A provoking action drains every reaction it triggers before it
//! commits, and gives up when the provoking combatant drops.

use std::collections::BTreeSet;

use super::*;

impl Battle {
    /// Enemies threatening any tile `mover` occupies that can still react and have not
    /// reacted during the current action, in turn order. `only` narrows the candidates to
    /// one combatant.
    pub(super) fn provokers(
        &self,
        mover: CombatantId,
        only: Option<CombatantId>,
        reacted: &BTreeSet<CombatantId>,
    ) -> Vec<CombatantId> {
        let Some(me) = self.combatants.get(mover) else {
            return Vec::new();
        };
        let threatening: BTreeSet<CombatantId> = me
            .footprint
            .occupied()
            .iter()
            .flat_map(|pos| self.grid.threatening(*pos))
            .collect();
        self.order
            .iter()
            .copied()
            .filter(|id| threatening.contains(id))
            .filter(|id| only.is_none_or(|only| only == *id))
            .filter(|id| !reacted.contains(id))
            .filter(|id| {
                self.combatants.get(*id).is_some_and(|enemy| {
                    enemy.faction != me.faction
                        && enemy.is_conscious()
                        && enemy.turn.can_make_opportunity()
                })
            })
            .collect()
    }

    /// Resolves provoked attacks one by one. Returns `false` once the provoking combatant is
    /// no longer conscious; its action must then be abandoned.
    pub(super) fn provoke(
        &mut self,
        mover: CombatantId,
        only: Option<CombatantId>,
        reacted: &mut BTreeSet<CombatantId>,
    ) -> bool {
        for enemy in self.provokers(mover, only, reacted) {
            reacted.insert(enemy);
            let Some(desc) = self
                .combatants
                .get_mut(enemy)
                .and_then(|combatant| combatant.turn.take_opportunity())
            else {
                continue;
            };
            debug!(?enemy, ?mover, "attack of opportunity");
            self.strike(enemy, mover, desc);
            if !self.combatants.get(mover).is_some_and(Combatant::is_conscious) {
                return false;
            }
        }
        self.combatants.get(mover).is_some_and(Combatant::is_conscious)
    }
}
