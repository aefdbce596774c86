//! Regression test module wiring for battle behaviors.

mod opportunity_flow;
mod target_queries;
mod termination_guards;

/// Shared imports for battle regression tests.
mod support {
    pub(super) use super::super::*;
    pub(super) use crate::battle::test_support::*;
    pub(super) use crate::combatant::{Item, Slot};
    pub(super) use crate::content::{self, keys};
    pub(super) use crate::dice::ScriptedDice;
    pub(super) use crate::feats::{CombatReflexes, ImprovedTrip};
    pub(super) use crate::strategy::{Action, Idle, Skirmisher};
    pub(super) use crate::turn::TurnState;
    pub(super) use crate::types::{Faction, Pos, Size, Terrain};
}
