//! Rule-extension hook points and their subscriber registry.
//! This module exists so feats and styles can adjust in-flight rule data without the
//! pipeline knowing which extensions exist.
//! It does not own the extensions themselves; see `feats`.

use std::fmt;
use std::sync::Arc;

use tracing::warn;

use crate::attack::{AttackDesc, CriticalCheck, TargetBound};
use crate::combatant::Combatant;
use crate::error::HookError;
use crate::types::{Ability, CombatantId, Effect, SaveKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Hook {
    AttackCalculation,
    TargetSelection,
    CriticalRoll,
    TurnStart,
    TurnEnd,
    RoundEnd,
    OnHit,
    EffectStart,
    EffectStop,
    Save(SaveKind),
    StatChange(Ability),
}

impl Hook {
    pub const COUNT: usize = 18;

    pub const ALL: [Hook; Hook::COUNT] = [
        Hook::AttackCalculation,
        Hook::TargetSelection,
        Hook::CriticalRoll,
        Hook::TurnStart,
        Hook::TurnEnd,
        Hook::RoundEnd,
        Hook::OnHit,
        Hook::EffectStart,
        Hook::EffectStop,
        Hook::Save(SaveKind::Fortitude),
        Hook::Save(SaveKind::Reflex),
        Hook::Save(SaveKind::Will),
        Hook::StatChange(Ability::Strength),
        Hook::StatChange(Ability::Dexterity),
        Hook::StatChange(Ability::Constitution),
        Hook::StatChange(Ability::Intelligence),
        Hook::StatChange(Ability::Wisdom),
        Hook::StatChange(Ability::Charisma),
    ];

    pub fn index(self) -> usize {
        match self {
            Hook::AttackCalculation => 0,
            Hook::TargetSelection => 1,
            Hook::CriticalRoll => 2,
            Hook::TurnStart => 3,
            Hook::TurnEnd => 4,
            Hook::RoundEnd => 5,
            Hook::OnHit => 6,
            Hook::EffectStart => 7,
            Hook::EffectStop => 8,
            Hook::Save(kind) => 9 + kind.index(),
            Hook::StatChange(ability) => 12 + ability.index(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TurnContext {
    pub round: u32,
}

/// Observational record of a landed attack, fired before damage is subtracted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HitReport {
    pub target: CombatantId,
    pub damage: i32,
    pub critical: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EffectChange {
    pub effect: Effect,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SaveCheck {
    pub kind: SaveKind,
    pub bonus: i32,
    pub dc: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatChange {
    pub ability: Ability,
    pub old: i32,
    pub new: i32,
}

/// Data a handler may inspect or adjust. Mutable variants are the ones rules read back.
#[derive(Debug)]
pub enum HookContext<'a> {
    Attack(&'a mut AttackDesc),
    Target(&'a mut AttackDesc<TargetBound>),
    Critical(&'a mut CriticalCheck),
    Turn(&'a TurnContext),
    Hit(&'a HitReport),
    Effect(&'a EffectChange),
    Save(&'a mut SaveCheck),
    Stat(&'a mut StatChange),
}

pub trait Handler: fmt::Debug + Send + Sync {
    /// Identity within a subscriber list; a list never holds two handlers with one name.
    fn name(&self) -> &str;

    fn handle(
        &self,
        hook: Hook,
        owner: &Combatant,
        ctx: &mut HookContext<'_>,
    ) -> Result<(), HookError>;
}

#[derive(Clone, Debug, Default)]
pub struct SubscriberList {
    handlers: Vec<Arc<dyn Handler>>,
}

impl SubscriberList {
    /// Returns `false` when a handler with the same name is already subscribed.
    pub fn add(&mut self, handler: Arc<dyn Handler>) -> bool {
        if self.contains(handler.name()) {
            return false;
        }
        self.handlers.push(handler);
        true
    }

    /// Removing an absent handler is a no-op.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|handler| handler.name() != name);
        self.handlers.len() != before
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.iter().any(|handler| handler.name() == name)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.handlers.iter().map(|handler| handler.name())
    }
}

#[derive(Clone, Debug)]
pub struct EventManager {
    lists: Vec<SubscriberList>,
}

impl Default for EventManager {
    fn default() -> Self {
        Self { lists: vec![SubscriberList::default(); Hook::COUNT] }
    }
}

impl EventManager {
    pub fn subscribe(&mut self, hook: Hook, handler: Arc<dyn Handler>) -> bool {
        self.lists[hook.index()].add(handler)
    }

    pub fn unsubscribe(&mut self, hook: Hook, name: &str) -> bool {
        self.lists[hook.index()].remove(name)
    }

    /// Drops `name` from every hook point.
    pub fn unsubscribe_all(&mut self, name: &str) -> usize {
        self.lists.iter_mut().filter_map(|list| list.remove(name).then_some(())).count()
    }

    pub fn subscribers(&self, hook: Hook) -> &SubscriberList {
        &self.lists[hook.index()]
    }

    /// Runs every handler for `hook` in subscription order. A failing handler is logged
    /// and skipped; the return value counts failures.
    pub fn fire(&self, hook: Hook, owner: &Combatant, ctx: &mut HookContext<'_>) -> usize {
        let mut failures = 0;
        for handler in &self.lists[hook.index()].handlers {
            if let Err(err) = handler.handle(hook, owner, ctx) {
                warn!(owner = %owner.name, ?hook, %err, "hook handler failed; skipping");
                failures += 1;
            }
        }
        failures
    }
}
