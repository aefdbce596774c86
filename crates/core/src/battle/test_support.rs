//! Shared fixtures for the battle regression suites.
//! This module exists to avoid repeating grid and combatant setup across many tests.
//! It does not own production rules.

use super::*;
use crate::combatant::{Item, Slot};
use crate::content::{self, keys};
use crate::dice::ScriptedDice;
use crate::strategy::{Action, Idle, Skirmisher};
use crate::turn::TurnState;
use crate::types::{Faction, Pos};

/// Replays a fixed list of actions, then ends every turn.
#[derive(Debug, Default)]
pub(crate) struct Scripted {
    actions: VecDeque<Action>,
}

impl Scripted {
    pub(crate) fn new(actions: impl IntoIterator<Item = Action>) -> Self {
        Self { actions: actions.into_iter().collect() }
    }
}

impl Strategy for Scripted {
    fn next_action(
        &mut self,
        _me: CombatantId,
        _turn: &TurnState,
        _battle: &Battle,
    ) -> Option<Action> {
        self.actions.pop_front()
    }
}

/// An open grid whose dice replay `rolls`, then roll 10 forever.
pub(crate) fn scripted_battle(width: usize, height: usize, rolls: &[i32]) -> Battle {
    scripted_battle_with(width, height, rolls, BattleConfig::default())
}

pub(crate) fn scripted_battle_with(
    width: usize,
    height: usize,
    rolls: &[i32],
    config: BattleConfig,
) -> Battle {
    let dice = ScriptedDice::new(rolls.iter().copied()).with_fallback(10);
    Battle::new(Grid::new(width, height), config, Box::new(dice)).expect("valid config")
}

/// Medium longsword wielder with twenty health and a +1 base attack bonus.
pub(crate) fn swordsman(name: &str, faction: u8, pos: Pos) -> Combatant {
    let longsword = content::weapon(keys::WEAPON_LONGSWORD).expect("longsword");
    Combatant::new(name, Faction(faction))
        .at(pos)
        .with_health(20)
        .with_base_attack_bonus(1)
        .with_item(Slot::MainHand, Item::Weapon(longsword))
}

/// A skirmishing hero next to an idle orc on a 6x6 field.
pub(crate) fn duel_fixture(rolls: &[i32]) -> (Battle, CombatantId, CombatantId) {
    let mut battle = scripted_battle(6, 6, rolls);
    let hero = battle
        .add_combatant(swordsman("hero", 0, Pos { y: 2, x: 2 }), Box::new(Skirmisher::default()))
        .expect("hero placed");
    let orc = battle
        .add_combatant(swordsman("orc", 1, Pos { y: 2, x: 3 }), Box::new(Idle))
        .expect("orc placed");
    (battle, hero, orc)
}

/// Pulls events until the first `RoundEnded`, inclusive.
pub(crate) fn play_round(battle: &mut Battle) -> Vec<BattleEvent> {
    let mut events = Vec::new();
    loop {
        let event = battle.next_event();
        let done = matches!(event, BattleEvent::RoundEnded { .. });
        events.push(event);
        if done {
            return events;
        }
    }
}
