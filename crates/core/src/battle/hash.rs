//! Stable snapshot hashing for deterministic verification.
//! This module exists to keep hashing concerns separate from the round loop.
//! It does not cover presentation state such as visual positions or pending events.

use std::hash::Hasher;

use xxhash_rust::xxh3::Xxh3;

use super::*;

impl Battle {
    pub fn snapshot_hash(&self) -> u64 {
        let mut hasher = Xxh3::new();
        hasher.write_u32(self.round);
        match self.phase {
            Phase::RoundStart => hasher.write_u8(0),
            Phase::TurnStart { slot } => {
                hasher.write_u8(1);
                hasher.write_usize(slot);
            }
            Phase::Acting { slot, iterations } => {
                hasher.write_u8(2);
                hasher.write_usize(slot);
                hasher.write_u32(iterations);
            }
            Phase::RoundEnd => hasher.write_u8(3),
        }
        for combatant in self.combatants() {
            hasher.write_i32(combatant.pos.x);
            hasher.write_i32(combatant.pos.y);
            hasher.write_i32(combatant.health);
            hasher.write_u8(combatant.faction.0);
            hasher.write_usize(combatant.effects.len());
            for effect in &combatant.effects {
                hasher.write_u8(*effect as u8);
            }
        }
        hasher.finish()
    }
}
