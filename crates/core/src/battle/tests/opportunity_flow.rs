//! Tests for provoked attacks interrupting movement, ranged shots and standing up.

use super::support::*;

fn attacks_started(events: &[BattleEvent]) -> Vec<(CombatantId, bool)> {
    events
        .iter()
        .filter_map(|event| match event {
            BattleEvent::AttackStarted { attacker, opportunity, .. } => {
                Some((*attacker, *opportunity))
            }
            _ => None,
        })
        .collect()
}

#[test]
fn leaving_a_threatened_tile_provokes_before_the_step_commits() {
    let mut battle = scripted_battle(6, 6, &[15, 3]);
    let path = vec![Pos { y: 2, x: 1 }, Pos { y: 2, x: 0 }];
    let runner = battle
        .add_combatant(
            swordsman("runner", 0, Pos { y: 2, x: 2 }),
            Box::new(Scripted::new([Action::Move { path: path.clone() }])),
        )
        .expect("placed");
    let guard = battle
        .add_combatant(swordsman("guard", 1, Pos { y: 2, x: 3 }), Box::new(Idle))
        .expect("placed");

    let events = play_round(&mut battle);
    assert_eq!(
        events[2],
        BattleEvent::AttackStarted {
            attacker: guard,
            target: runner,
            opportunity: true,
            hint_ms: 350
        }
    );
    assert_eq!(
        events[4],
        BattleEvent::HealthChanged { combatant: runner, health: 17, state: HealthState::Conscious }
    );
    assert_eq!(events[5], BattleEvent::Moved { combatant: runner, path, hint_ms: 240 });
    assert_eq!(attacks_started(&events), vec![(guard, true)]);

    let runner = battle.combatant(runner).expect("runner");
    assert_eq!(runner.pos, Pos { y: 2, x: 0 });
    assert_eq!(runner.turn.moves_left(), 0, "turn end zeroes leftover movement");
}

#[test]
fn dropping_to_a_reaction_abandons_the_move() {
    let mut battle = scripted_battle(6, 6, &[15, 3]);
    let path = vec![Pos { y: 2, x: 1 }];
    let runner = battle
        .add_combatant(
            swordsman("runner", 0, Pos { y: 2, x: 2 }).with_health(0),
            Box::new(Scripted::new([Action::Move { path }])),
        )
        .expect("placed");
    battle
        .add_combatant(swordsman("guard", 1, Pos { y: 2, x: 3 }), Box::new(Idle))
        .expect("placed");

    let events = play_round(&mut battle);
    assert!(!events.iter().any(|event| matches!(event, BattleEvent::Moved { .. })));
    let runner = battle.combatant(runner).expect("runner");
    assert_eq!(runner.health_state(), HealthState::Unconscious);
    assert_eq!(runner.pos, Pos { y: 2, x: 2 });
}

#[test]
fn one_enemy_reacts_at_most_once_per_action() {
    let mut battle = scripted_battle(6, 6, &[2]);
    let path = vec![Pos { y: 1, x: 3 }, Pos { y: 1, x: 4 }, Pos { y: 1, x: 5 }];
    let runner = battle
        .add_combatant(
            swordsman("runner", 0, Pos { y: 1, x: 2 }),
            Box::new(Scripted::new([Action::Move { path: path.clone() }])),
        )
        .expect("placed");
    let mut guard = swordsman("guard", 1, Pos { y: 2, x: 3 }).with_ability(Ability::Dexterity, 16);
    guard.learn(&CombatReflexes);
    let guard = battle.add_combatant(guard, Box::new(Idle)).expect("placed");
    assert_eq!(battle.combatant(guard).map(|g| g.turn.opportunity_attacks()), Some(4));

    let events = play_round(&mut battle);
    assert_eq!(attacks_started(&events), vec![(guard, true)]);
    assert!(events.contains(&BattleEvent::Moved { combatant: runner, path, hint_ms: 360 }));
}

#[test]
fn ranged_attacks_from_a_threatened_tile_provoke() {
    let mut battle = scripted_battle(6, 6, &[2, 15, 4]);
    let bow = content::weapon(keys::WEAPON_SHORTBOW).expect("shortbow");
    let archer = Combatant::new("archer", Faction(0))
        .at(Pos { y: 2, x: 2 })
        .with_base_attack_bonus(1)
        .with_item(Slot::MainHand, Item::Weapon(bow));
    let guard = battle
        .add_combatant(swordsman("guard", 1, Pos { y: 2, x: 3 }), Box::new(Idle))
        .expect("placed");
    let archer = battle
        .add_combatant(archer, Box::new(Scripted::new([Action::Attack { target: guard }])))
        .expect("placed");

    let events = play_round(&mut battle);
    assert_eq!(attacks_started(&events), vec![(guard, true), (archer, false)]);
    assert!(events.contains(&BattleEvent::HealthChanged {
        combatant: guard,
        health: 16,
        state: HealthState::Conscious,
    }));
}

#[test]
fn standing_up_provokes_then_clears_prone() {
    let mut battle = scripted_battle(6, 6, &[2]);
    let mut sprawled = swordsman("sprawled", 0, Pos { y: 2, x: 2 });
    sprawled.add_effect(Effect::Prone);
    let sprawled = battle
        .add_combatant(sprawled, Box::new(Scripted::new([Action::StandUp])))
        .expect("placed");
    let guard = battle
        .add_combatant(swordsman("guard", 1, Pos { y: 2, x: 3 }), Box::new(Idle))
        .expect("placed");

    let events = play_round(&mut battle);
    assert_eq!(attacks_started(&events), vec![(guard, true)]);
    let stood = BattleEvent::EffectEnded { combatant: sprawled, effect: Effect::Prone };
    assert!(events.contains(&stood));
    let sprawled = battle.combatant(sprawled).expect("sprawled");
    assert!(!sprawled.has_effect(Effect::Prone));
    assert_eq!(sprawled.turn.move_actions(), 0);
}
