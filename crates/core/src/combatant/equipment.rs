use serde::{Deserialize, Serialize};

use crate::dice::Dice;

/// Longest shot allowed, in range increments.
pub const MAX_RANGE_INCREMENTS: u32 = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Slot {
    MainHand,
    OffHand,
    Body,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Weapon {
    pub name: String,
    pub damage: Dice,
    pub threat_min: i32,
    pub crit_multiplier: i32,
    pub light: bool,
    pub two_handed: bool,
    /// Threatens beyond natural reach but not adjacent tiles.
    pub reach: bool,
    /// Tiles per range increment; `None` for melee weapons.
    pub range_increment: Option<u32>,
    pub touch: bool,
}

impl Weapon {
    pub fn unarmed() -> Self {
        Self {
            name: "unarmed".to_string(),
            damage: Dice::new(1, 3),
            threat_min: 20,
            crit_multiplier: 2,
            light: true,
            two_handed: false,
            reach: false,
            range_increment: None,
            touch: false,
        }
    }

    pub fn is_ranged(&self) -> bool {
        self.range_increment.is_some()
    }

    /// Maximum distance in tiles this weapon can fire, if ranged.
    pub fn max_range(&self) -> Option<f32> {
        self.range_increment.map(|increment| (increment * MAX_RANGE_INCREMENTS) as f32)
    }

    /// −2 per full increment beyond the first.
    pub fn range_penalty(&self, distance: f32) -> i32 {
        match self.range_increment {
            Some(increment) if increment > 0 => {
                let increments = (distance / increment as f32).ceil().max(1.0) as i32;
                -2 * (increments - 1)
            }
            _ => 0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Armor {
    pub name: String,
    pub bonus: i32,
    pub max_dex: Option<i32>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Item {
    Weapon(Weapon),
    Armor(Armor),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_penalty_grows_per_full_increment() {
        let mut bow = Weapon::unarmed();
        bow.range_increment = Some(20);
        assert_eq!(bow.range_penalty(5.0), 0);
        assert_eq!(bow.range_penalty(20.0), 0);
        assert_eq!(bow.range_penalty(21.0), -2);
        assert_eq!(bow.range_penalty(60.0), -4);
        assert_eq!(bow.max_range(), Some(200.0));
        assert_eq!(Weapon::unarmed().range_penalty(3.0), 0);
    }
}
