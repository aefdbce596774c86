//! TOML battle scenarios.
//! This module exists so the runner can build a battle from a data file instead of code.
//! It does not run the battle; `main` drives the loop.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use skirmish_core::content;
use skirmish_core::{
    Ability, Battle, BattleConfig, Combatant, Faction, Grid, Idle, Item, Pos, SeededDice,
    Skirmisher, Size, Slot, Strategy, Terrain,
};

/// Shipped with the binary so `tools` runs without arguments.
pub const DEMO: &str = r#"
width = 12
height = 8
seed = 7
walls = [{ y = 3, x = 5 }, { y = 4, x = 5 }]
difficult = [{ y = 1, x = 6 }, { y = 2, x = 6 }]

[[combatant]]
name = "Aldric"
faction = 0
pos = { y = 3, x = 1 }
health = 24
base_attack_bonus = 6
abilities = { strength = 16, dexterity = 12 }
armor = "chain_shirt"
main_hand = "longsword"
feats = ["weapon_focus:longsword", "power_attack"]

[[combatant]]
name = "Wren"
faction = 0
pos = { y = 5, x = 1 }
health = 16
base_attack_bonus = 4
abilities = { dexterity = 16 }
armor = "leather"
main_hand = "shortbow"
feats = ["point_blank_shot"]

[[combatant]]
name = "Grask"
faction = 1
pos = { y = 3, x = 10 }
size = "Large"
health = 30
base_attack_bonus = 5
abilities = { strength = 18 }
main_hand = "greataxe"
strategy = "tripper"
feats = ["improved_trip", "combat_reflexes"]

[[combatant]]
name = "Snik"
faction = 1
pos = { y = 6, x = 10 }
size = "Small"
health = 10
base_attack_bonus = 2
abilities = { dexterity = 16 }
main_hand = "dagger"
off_hand = "dagger"
feats = ["two_weapon_fighting", "sneak_attack"]
"#;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    pub width: usize,
    pub height: usize,
    #[serde(default)]
    pub seed: u64,
    #[serde(default)]
    pub walls: Vec<Pos>,
    /// Tiles that cost double to enter.
    #[serde(default)]
    pub difficult: Vec<Pos>,
    #[serde(default)]
    pub config: BattleConfig,
    #[serde(default, rename = "combatant")]
    pub combatants: Vec<CombatantSpec>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CombatantSpec {
    pub name: String,
    pub faction: u8,
    pub pos: Pos,
    #[serde(default)]
    pub size: Size,
    pub health: i32,
    #[serde(default)]
    pub base_attack_bonus: i32,
    #[serde(default)]
    pub abilities: AbilityBlock,
    pub armor: Option<String>,
    pub main_hand: Option<String>,
    pub off_hand: Option<String>,
    #[serde(default)]
    pub feats: Vec<String>,
    #[serde(default)]
    pub strategy: StrategyKind,
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AbilityBlock {
    pub strength: i32,
    pub dexterity: i32,
    pub constitution: i32,
    pub intelligence: i32,
    pub wisdom: i32,
    pub charisma: i32,
}

impl Default for AbilityBlock {
    fn default() -> Self {
        Self {
            strength: 10,
            dexterity: 10,
            constitution: 10,
            intelligence: 10,
            wisdom: 10,
            charisma: 10,
        }
    }
}

impl AbilityBlock {
    fn scores(self) -> [(Ability, i32); 6] {
        [
            (Ability::Strength, self.strength),
            (Ability::Dexterity, self.dexterity),
            (Ability::Constitution, self.constitution),
            (Ability::Intelligence, self.intelligence),
            (Ability::Wisdom, self.wisdom),
            (Ability::Charisma, self.charisma),
        ]
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Idle,
    #[default]
    Skirmisher,
    /// A skirmisher that trips standing targets first.
    Tripper,
}

impl StrategyKind {
    fn build(self) -> Box<dyn Strategy> {
        match self {
            StrategyKind::Idle => Box::new(Idle),
            StrategyKind::Skirmisher => Box::new(Skirmisher::default()),
            StrategyKind::Tripper => Box::new(Skirmisher { prefer_trip: true }),
        }
    }
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario file: {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Invalid scenario: {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).context("Failed to deserialize scenario TOML")
    }

    /// Builds the battle, seeding the dice from `seed` and rolling initiative.
    pub fn build(&self, seed: u64) -> Result<Battle> {
        let mut grid = Grid::new(self.width, self.height);
        for &pos in &self.walls {
            if !grid.set_terrain(pos, Terrain::Wall) {
                bail!("wall at ({}, {}) is outside the grid", pos.x, pos.y);
            }
        }
        for &pos in &self.difficult {
            if !grid.set_terrain(pos, Terrain::Other) {
                bail!("difficult tile at ({}, {}) is outside the grid", pos.x, pos.y);
            }
        }

        let mut battle = Battle::new(grid, self.config.clone(), Box::new(SeededDice::new(seed)))?;
        for spec in &self.combatants {
            let combatant =
                spec.build().with_context(|| format!("combatant `{}`", spec.name))?;
            battle
                .add_combatant(combatant, spec.strategy.build())
                .with_context(|| format!("Failed to place `{}`", spec.name))?;
        }
        battle.roll_initiative();
        Ok(battle)
    }
}

impl CombatantSpec {
    fn build(&self) -> Result<Combatant> {
        let mut combatant = Combatant::new(self.name.clone(), Faction(self.faction))
            .at(self.pos)
            .with_size(self.size)
            .with_health(self.health)
            .with_base_attack_bonus(self.base_attack_bonus);
        for (ability, score) in self.abilities.scores() {
            combatant = combatant.with_ability(ability, score);
        }

        if let Some(key) = &self.armor {
            let armor = content::armor(key).ok_or_else(|| anyhow!("unknown armor `{key}`"))?;
            combatant.equip(Slot::Body, Item::Armor(armor));
        }
        for (slot, key) in [(Slot::MainHand, &self.main_hand), (Slot::OffHand, &self.off_hand)] {
            let Some(key) = key else {
                continue;
            };
            let weapon = content::weapon(key).ok_or_else(|| anyhow!("unknown weapon `{key}`"))?;
            combatant.equip(slot, Item::Weapon(weapon));
        }
        for key in &self.feats {
            let extension =
                content::extension(key).ok_or_else(|| anyhow!("unknown feat `{key}`"))?;
            combatant.learn(extension.as_ref());
        }
        Ok(combatant)
    }
}
