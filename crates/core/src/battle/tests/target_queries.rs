//! Tests for the query surface strategies decide with.

use std::sync::Arc;

use super::support::*;

#[test]
fn find_enemy_picks_the_nearest_conscious_foe() {
    let mut battle = scripted_battle(8, 8, &[]);
    let hero = battle
        .add_combatant(swordsman("hero", 0, Pos { y: 0, x: 0 }), Box::new(Idle))
        .expect("placed");
    battle
        .add_combatant(swordsman("far", 1, Pos { y: 7, x: 7 }), Box::new(Idle))
        .expect("placed");
    let near = battle
        .add_combatant(swordsman("near", 1, Pos { y: 0, x: 3 }), Box::new(Idle))
        .expect("placed");
    let ally = battle
        .add_combatant(swordsman("ally", 0, Pos { y: 1, x: 1 }), Box::new(Idle))
        .expect("placed");

    assert_eq!(battle.find_enemy(hero), Some(near));
    assert!(battle.is_enemy(hero, near));
    assert!(!battle.is_enemy(hero, ally));
    assert_eq!(battle.distance(hero, near), Some(3.0));
}

#[test]
fn best_target_breaks_ties_toward_the_weaker_enemy() {
    let mut battle = scripted_battle(6, 6, &[]);
    let hero = battle
        .add_combatant(swordsman("hero", 0, Pos { y: 2, x: 2 }), Box::new(Idle))
        .expect("placed");
    battle
        .add_combatant(swordsman("healthy", 1, Pos { y: 2, x: 3 }), Box::new(Idle))
        .expect("placed");
    let wounded = battle
        .add_combatant(swordsman("wounded", 1, Pos { y: 3, x: 2 }).with_health(5), Box::new(Idle))
        .expect("placed");
    battle
        .add_combatant(swordsman("distant", 1, Pos { y: 5, x: 5 }).with_health(1), Box::new(Idle))
        .expect("placed");

    assert_eq!(battle.best_target(hero), Some(wounded));
}

#[test]
fn reach_weapons_strike_two_tiles_out_but_not_adjacent() {
    let mut battle = scripted_battle(6, 6, &[]);
    let glaive = content::weapon(keys::WEAPON_GLAIVE).expect("glaive");
    let guard = Combatant::new("guard", Faction(0))
        .at(Pos { y: 0, x: 0 })
        .with_item(Slot::MainHand, Item::Weapon(glaive));
    let guard = battle.add_combatant(guard, Box::new(Idle)).expect("placed");
    let adjacent = battle
        .add_combatant(swordsman("adjacent", 1, Pos { y: 0, x: 1 }), Box::new(Idle))
        .expect("placed");
    let spaced = battle
        .add_combatant(swordsman("spaced", 1, Pos { y: 2, x: 0 }), Box::new(Idle))
        .expect("placed");

    assert!(!battle.can_reach(guard, adjacent));
    assert!(battle.can_reach(guard, spaced));
    assert!(battle.threatens(guard, spaced));
}

#[test]
fn path_to_range_stops_adjacent_to_the_target() {
    let mut battle = scripted_battle(8, 3, &[]);
    let hero = battle
        .add_combatant(swordsman("hero", 0, Pos { y: 1, x: 0 }), Box::new(Idle))
        .expect("placed");
    let orc = battle
        .add_combatant(swordsman("orc", 1, Pos { y: 1, x: 6 }), Box::new(Idle))
        .expect("placed");

    let path = battle.path_to_range(hero, orc).expect("reachable");
    assert_eq!(path.destination(), Some(Pos { y: 1, x: 5 }));
    assert_eq!(path.cost, 500);

    let direct = battle.path_to(hero, Pos { y: 0, x: 2 }).expect("reachable");
    assert_eq!(direct.cost, 241);
}

#[test]
fn charge_lanes_need_room_and_clear_ground() {
    let mut battle = scripted_battle(8, 5, &[]);
    let hero = battle
        .add_combatant(swordsman("hero", 0, Pos { y: 1, x: 0 }), Box::new(Idle))
        .expect("placed");
    let close = battle
        .add_combatant(swordsman("close", 1, Pos { y: 3, x: 2 }), Box::new(Idle))
        .expect("placed");
    let far = battle
        .add_combatant(swordsman("far", 1, Pos { y: 1, x: 6 }), Box::new(Idle))
        .expect("placed");

    assert_eq!(battle.charge_lane(hero, close), None, "a one-tile approach is not a charge");
    assert_eq!(battle.charge_lane(hero, far).map(|lane| lane.len()), Some(5));

    battle.grid.set_terrain(Pos { y: 1, x: 3 }, Terrain::Wall);
    assert_eq!(battle.charge_lane(hero, far), None);
}

#[test]
fn a_second_enemy_threatening_the_target_grants_flanking() {
    let mut battle = scripted_battle(6, 6, &[10, 4]);
    let orc = battle
        .add_combatant(swordsman("orc", 1, Pos { y: 2, x: 3 }), Box::new(Idle))
        .expect("placed");
    battle
        .add_combatant(
            swordsman("hero", 0, Pos { y: 2, x: 2 }),
            Box::new(Scripted::new([Action::Attack { target: orc }])),
        )
        .expect("placed");
    battle
        .add_combatant(swordsman("ally", 0, Pos { y: 2, x: 4 }), Box::new(Idle))
        .expect("placed");

    let events = play_round(&mut battle);
    let outcome = events
        .iter()
        .find_map(|event| match event {
            BattleEvent::AttackFinished { outcome } => Some(outcome),
            _ => None,
        })
        .expect("attack resolved");
    assert_eq!(outcome.total, 3, "base attack bonus plus flanking");
}

#[test]
fn path_to_range_reaches_large_targets_from_the_near_side() {
    let mut battle = scripted_battle(12, 12, &[]);
    let ogre = battle
        .add_combatant(large_ogre(Pos { y: 5, x: 4 }), Box::new(Idle))
        .expect("placed");
    let left = battle
        .add_combatant(swordsman("left", 0, Pos { y: 5, x: 2 }), Box::new(Idle))
        .expect("placed");
    let above = battle
        .add_combatant(swordsman("above", 0, Pos { y: 2, x: 4 }), Box::new(Idle))
        .expect("placed");

    assert!(!battle.can_reach(left, ogre));
    let path = battle.path_to_range(left, ogre).expect("reachable");
    assert_eq!(path.steps, vec![Pos { y: 5, x: 3 }]);
    assert_eq!(path.cost, 100);

    let path = battle.path_to_range(above, ogre).expect("reachable");
    assert_eq!(path.destination(), Some(Pos { y: 4, x: 4 }));
    assert_eq!(path.cost, 200);
}

#[test]
fn skirmishers_close_in_on_large_targets_and_strike() {
    let mut battle = scripted_battle(12, 12, &[]);
    let hero = battle
        .add_combatant(swordsman("hero", 0, Pos { y: 5, x: 2 }), Box::new(Skirmisher::default()))
        .expect("placed");
    let ogre = battle
        .add_combatant(large_ogre(Pos { y: 5, x: 4 }), Box::new(Idle))
        .expect("placed");

    let events = play_round(&mut battle);
    assert!(events.iter().any(|event| matches!(
        event,
        BattleEvent::AttackStarted { attacker, target, opportunity: false, .. }
            if *attacker == hero && *target == ogre
    )));
    assert_eq!(battle.combatant(hero).map(|c| c.pos), Some(Pos { y: 5, x: 3 }));
    assert!(battle.can_reach(hero, ogre));
}

#[test]
fn joining_warms_the_attack_shape_for_reach_checks() {
    let mut battle = scripted_battle(8, 8, &[]);
    let bow = content::weapon(keys::WEAPON_SHORTBOW).expect("shortbow");
    let archer = Combatant::new("archer", Faction(0))
        .at(Pos { y: 1, x: 1 })
        .with_item(Slot::MainHand, Item::Weapon(bow));
    let archer = battle.add_combatant(archer, Box::new(Idle)).expect("placed");

    assert_eq!(battle.grid.cached_template_count(), 2, "footprint and melee shapes");
    let key = battle.combatant(archer).map(Combatant::attack_template_key).expect("known");
    let warm = battle.grid.template_for(key);
    assert!(Arc::ptr_eq(&warm, &battle.grid.template(key)));
    assert_eq!(battle.grid.cached_template_count(), 2);
}

fn large_ogre(pos: Pos) -> Combatant {
    swordsman("ogre", 1, pos).with_size(Size::Large)
}
