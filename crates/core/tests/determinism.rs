use std::collections::BTreeSet;

use skirmish_core::content::{self, keys};
use skirmish_core::{
    AdvanceStopReason, Battle, BattleConfig, BattleEvent, Combatant, Faction, Grid, Item, Pos,
    SeededDice, Skirmisher, Slot,
};

const MAX_ROUNDS: u32 = 30;

fn fighter(name: &str, faction: u8, pos: Pos, weapon: &str) -> Combatant {
    let weapon = content::weapon(weapon).expect("catalogue weapon");
    Combatant::new(name, Faction(faction))
        .at(pos)
        .with_health(18)
        .with_base_attack_bonus(3)
        .with_item(Slot::MainHand, Item::Weapon(weapon))
}

fn seeded_battle(seed: u64) -> Battle {
    let dice = SeededDice::new(seed);
    let mut battle = Battle::new(Grid::new(10, 10), BattleConfig::default(), Box::new(dice))
        .expect("default config is valid");
    let roster = [
        fighter("ash", 0, Pos { y: 1, x: 1 }, keys::WEAPON_LONGSWORD),
        fighter("birch", 0, Pos { y: 2, x: 1 }, keys::WEAPON_SHORTBOW),
        fighter("cinder", 1, Pos { y: 8, x: 8 }, keys::WEAPON_GREATAXE),
        fighter("dusk", 1, Pos { y: 7, x: 8 }, keys::WEAPON_GLAIVE),
    ];
    for combatant in roster {
        battle.add_combatant(combatant, Box::new(Skirmisher::default())).expect("placed");
    }
    battle.roll_initiative();
    battle
}

/// Plays whole rounds until one faction stands or the round limit is hit.
fn skirmish(seed: u64) -> (u64, Vec<BattleEvent>) {
    let mut battle = seeded_battle(seed);
    let mut events = Vec::new();
    while battle.round() < MAX_ROUNDS && battle.standing_factions().len() > 1 {
        events.extend(battle.advance(1).events);
        battle.request_pause();
        let result = battle.advance(10_000);
        assert!(matches!(result.stop_reason, AdvanceStopReason::PausedAtBoundary { .. }));
        events.extend(result.events);
    }
    (battle.snapshot_hash(), events)
}

#[test]
fn test_determinism_identical_seeds_produce_same_hash() {
    let (hash1, events1) = skirmish(12345);
    let (hash2, events2) = skirmish(12345);

    assert_eq!(hash1, hash2, "Identical runs must produce identical hashes");
    assert_eq!(events1, events2, "Identical runs must produce identical event streams");
    assert!(!events1.is_empty());
}

#[test]
fn test_determinism_different_seeds_produce_different_hashes() {
    let hashes: BTreeSet<u64> = (1..=5).map(|seed| skirmish(seed).0).collect();
    assert!(hashes.len() > 1, "Different seeds should diverge");
}

#[test]
fn test_determinism_pause_points_do_not_change_the_outcome() {
    let (hash, events) = skirmish(777);

    let mut battle = seeded_battle(777);
    let mut stepped = Vec::with_capacity(events.len());
    while stepped.len() < events.len() {
        stepped.extend(battle.advance(1).events);
    }
    assert_eq!(stepped, events);
    assert_eq!(battle.snapshot_hash(), hash);
}
