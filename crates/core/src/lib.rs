pub mod attack;
pub mod battle;
pub mod combatant;
pub mod config;
pub mod content;
pub mod dice;
pub mod error;
pub mod event;
pub mod feats;
pub mod grid;
pub mod hooks;
pub mod pathfinding;
pub mod strategy;
pub mod turn;
pub mod types;

pub use attack::{AttackDesc, AttackOutcome, TripOutcome};
pub use battle::{Battle, Phase};
pub use combatant::{Combatant, Item, Slot, Weapon};
pub use config::BattleConfig;
pub use dice::{Dice, DiceRoller, ScriptedDice, SeededDice};
pub use error::{BattleError, HookError, Result};
pub use event::{AdvanceResult, AdvanceStopReason, BattleEvent};
pub use grid::Grid;
pub use pathfinding::{Goal, Path, Pathfinder};
pub use strategy::{Action, Idle, Skirmisher, Strategy};
pub use turn::{TurnAllowance, TurnState};
pub use types::*;
