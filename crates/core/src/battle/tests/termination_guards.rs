//! Tests for the guards that keep the loop finite and resumable.

use super::support::*;

/// Keeps asking for something that is never legal.
#[derive(Debug)]
struct Stubborn;

impl Strategy for Stubborn {
    fn next_action(
        &mut self,
        _me: CombatantId,
        _turn: &TurnState,
        _battle: &Battle,
    ) -> Option<Action> {
        Some(Action::StandUp)
    }
}

#[test]
fn a_strategy_that_never_finishes_is_truncated_at_the_cap() {
    let config = BattleConfig { turn_iteration_cap: 4, ..BattleConfig::default() };
    let mut battle = scripted_battle_with(6, 6, &[], config);
    let stubborn = battle
        .add_combatant(swordsman("stubborn", 0, Pos { y: 0, x: 0 }), Box::new(Stubborn))
        .expect("placed");

    let events = play_round(&mut battle);
    assert_eq!(
        events,
        vec![
            BattleEvent::RoundStarted { round: 1 },
            BattleEvent::TurnStarted { round: 1, combatant: stubborn },
            BattleEvent::TurnEnded { combatant: stubborn, truncated: true },
            BattleEvent::RoundEnded { round: 1 },
        ]
    );
}

#[test]
fn pause_requests_land_on_the_next_round_boundary() {
    let (mut battle, hero, _) = duel_fixture(&[]);
    battle.set_strategy(hero, Box::new(Idle)).expect("known");

    let first = battle.advance(3);
    assert_eq!(first.stop_reason, AdvanceStopReason::BudgetExhausted);
    assert_eq!(first.events.len(), 3);

    battle.request_pause();
    let rest = battle.advance(100);
    assert_eq!(rest.stop_reason, AdvanceStopReason::PausedAtBoundary { round: 1 });
    assert_eq!(rest.events.len(), 3);
    assert_eq!(rest.events.last(), Some(&BattleEvent::RoundEnded { round: 1 }));

    let resumed = battle.advance(1);
    assert_eq!(resumed.events, vec![BattleEvent::RoundStarted { round: 2 }]);
}

#[test]
fn a_pause_before_the_first_round_yields_nothing() {
    let (mut battle, _, _) = duel_fixture(&[]);
    battle.request_pause();
    let result = battle.advance(10);
    assert!(result.events.is_empty());
    assert_eq!(result.stop_reason, AdvanceStopReason::PausedAtBoundary { round: 0 });
}

#[test]
fn invalid_setup_is_reported() {
    let config = BattleConfig { turn_iteration_cap: 0, ..BattleConfig::default() };
    let built = Battle::new(Grid::new(4, 4), config, Box::new(ScriptedDice::new([])));
    assert!(matches!(built, Err(BattleError::InvalidConfig(_))));

    let (mut battle, _, _) = duel_fixture(&[]);
    assert!(matches!(
        battle.set_strategy(CombatantId::default(), Box::new(Idle)),
        Err(BattleError::UnknownCombatant(_))
    ));
}

#[test]
fn skirmishers_fight_to_a_finish() {
    let mut battle = scripted_battle(8, 8, &[]);
    battle
        .add_combatant(swordsman("left", 0, Pos { y: 1, x: 1 }), Box::new(Skirmisher::default()))
        .expect("placed");
    battle
        .add_combatant(swordsman("right", 1, Pos { y: 6, x: 6 }), Box::new(Skirmisher::default()))
        .expect("placed");

    for _ in 0..20 {
        play_round(&mut battle);
        if battle.standing_factions().len() < 2 {
            break;
        }
    }
    assert_eq!(battle.standing_factions().len(), 1, "fallback rolls of 10 always hit");
}
