use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    pub struct CombatantId;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Pos {
    pub y: i32,
    pub x: i32,
}

impl Pos {
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self { y: self.y + dy, x: self.x + dx }
    }

    /// Chebyshev distance; 1 means the tiles touch (including diagonally).
    pub fn chebyshev(self, other: Self) -> u32 {
        self.x.abs_diff(other.x).max(self.y.abs_diff(other.y))
    }

    pub fn euclidean(self, other: Self) -> f32 {
        let dx = (self.x - other.x) as f32;
        let dy = (self.y - other.y) as f32;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Continuous coordinates for presentation only; the rules never read them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VisualPos {
    pub x: f32,
    pub y: f32,
}

impl From<Pos> for VisualPos {
    fn from(pos: Pos) -> Self {
        Self { x: pos.x as f32, y: pos.y as f32 }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Faction(pub u8);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Terrain {
    #[default]
    Free,
    Wall,
    /// Passable but costs double to enter.
    Other,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Size {
    Small,
    #[default]
    Medium,
    Large,
    Huge,
}

impl Size {
    /// Edge length of the square footprint, in tiles.
    pub fn side(self) -> i32 {
        match self {
            Size::Small | Size::Medium => 1,
            Size::Large => 2,
            Size::Huge => 3,
        }
    }

    pub fn natural_reach(self) -> u8 {
        match self {
            Size::Small | Size::Medium => 1,
            Size::Large => 2,
            Size::Huge => 3,
        }
    }

    /// Applied to both attack rolls and armor class.
    pub fn attack_modifier(self) -> i32 {
        match self {
            Size::Small => 1,
            Size::Medium => 0,
            Size::Large => -1,
            Size::Huge => -2,
        }
    }

    pub fn maneuver_modifier(self) -> i32 {
        match self {
            Size::Small => -4,
            Size::Medium => 0,
            Size::Large => 4,
            Size::Huge => 8,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Ability {
    Strength,
    Dexterity,
    Constitution,
    Intelligence,
    Wisdom,
    Charisma,
}

impl Ability {
    pub const ALL: [Ability; 6] = [
        Ability::Strength,
        Ability::Dexterity,
        Ability::Constitution,
        Ability::Intelligence,
        Ability::Wisdom,
        Ability::Charisma,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SaveKind {
    Fortitude,
    Reflex,
    Will,
}

impl SaveKind {
    pub const ALL: [SaveKind; 3] = [SaveKind::Fortitude, SaveKind::Reflex, SaveKind::Will];

    pub fn ability(self) -> Ability {
        match self {
            SaveKind::Fortitude => Ability::Constitution,
            SaveKind::Reflex => Ability::Dexterity,
            SaveKind::Will => Ability::Wisdom,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HealthState {
    Conscious,
    Unconscious,
    Dead,
}

impl HealthState {
    pub fn from_health(health: i32) -> Self {
        if health <= -10 {
            HealthState::Dead
        } else if health < 0 {
            HealthState::Unconscious
        } else {
            HealthState::Conscious
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Effect {
    Prone,
    /// Lasts until the charger's next turn starts.
    Charging,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Hand {
    Main,
    Off,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Maneuver {
    Trip,
}
