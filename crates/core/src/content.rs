use crate::combatant::{Armor, Weapon};
use crate::dice::Dice;
use crate::feats::{
    CombatReflexes, Dodge, FlurryStyle, ImprovedCritical, ImprovedTrip, PointBlankShot,
    PowerAttack, RuleExtension, SaveFocus, SneakAttack, Toughness, TwoWeaponFighting,
    WeaponFocus,
};

pub mod keys {
    pub const WEAPON_UNARMED: &str = "unarmed";
    pub const WEAPON_DAGGER: &str = "dagger";
    pub const WEAPON_SHORT_SWORD: &str = "short_sword";
    pub const WEAPON_LONGSWORD: &str = "longsword";
    pub const WEAPON_GREATSWORD: &str = "greatsword";
    pub const WEAPON_GREATAXE: &str = "greataxe";
    pub const WEAPON_GLAIVE: &str = "glaive";
    pub const WEAPON_SHORTBOW: &str = "shortbow";
    pub const WEAPON_LONGBOW: &str = "longbow";

    pub const ARMOR_LEATHER: &str = "leather";
    pub const ARMOR_CHAIN_SHIRT: &str = "chain_shirt";
    pub const ARMOR_BREASTPLATE: &str = "breastplate";
    pub const ARMOR_FULL_PLATE: &str = "full_plate";

    /// Parameterised as `weapon_focus:<weapon key>`.
    pub const FEAT_WEAPON_FOCUS: &str = "weapon_focus";
    pub const FEAT_POWER_ATTACK: &str = "power_attack";
    pub const FEAT_POINT_BLANK_SHOT: &str = "point_blank_shot";
    pub const FEAT_IMPROVED_CRITICAL: &str = "improved_critical";
    pub const FEAT_TWO_WEAPON_FIGHTING: &str = "two_weapon_fighting";
    pub const FEAT_IMPROVED_TRIP: &str = "improved_trip";
    pub const FEAT_SNEAK_ATTACK: &str = "sneak_attack";
    pub const FEAT_TOUGHNESS: &str = "toughness";
    pub const FEAT_DODGE: &str = "dodge";
    pub const FEAT_COMBAT_REFLEXES: &str = "combat_reflexes";
    pub const FEAT_GREAT_FORTITUDE: &str = "great_fortitude";
    pub const FEAT_LIGHTNING_REFLEXES: &str = "lightning_reflexes";
    pub const FEAT_IRON_WILL: &str = "iron_will";

    pub const STYLE_FLURRY: &str = "style_flurry";
}

struct WeaponRow {
    key: &'static str,
    damage: Dice,
    threat_min: i32,
    crit_multiplier: i32,
    light: bool,
    two_handed: bool,
    reach: bool,
    range_increment: Option<u32>,
}

const WEAPONS: &[WeaponRow] = &[
    WeaponRow {
        key: keys::WEAPON_DAGGER,
        damage: Dice::new(1, 4),
        threat_min: 19,
        crit_multiplier: 2,
        light: true,
        two_handed: false,
        reach: false,
        range_increment: None,
    },
    WeaponRow {
        key: keys::WEAPON_SHORT_SWORD,
        damage: Dice::new(1, 6),
        threat_min: 19,
        crit_multiplier: 2,
        light: true,
        two_handed: false,
        reach: false,
        range_increment: None,
    },
    WeaponRow {
        key: keys::WEAPON_LONGSWORD,
        damage: Dice::new(1, 8),
        threat_min: 19,
        crit_multiplier: 2,
        light: false,
        two_handed: false,
        reach: false,
        range_increment: None,
    },
    WeaponRow {
        key: keys::WEAPON_GREATSWORD,
        damage: Dice::new(2, 6),
        threat_min: 19,
        crit_multiplier: 2,
        light: false,
        two_handed: true,
        reach: false,
        range_increment: None,
    },
    WeaponRow {
        key: keys::WEAPON_GREATAXE,
        damage: Dice::new(1, 12),
        threat_min: 20,
        crit_multiplier: 3,
        light: false,
        two_handed: true,
        reach: false,
        range_increment: None,
    },
    WeaponRow {
        key: keys::WEAPON_GLAIVE,
        damage: Dice::new(1, 10),
        threat_min: 20,
        crit_multiplier: 3,
        light: false,
        two_handed: true,
        reach: true,
        range_increment: None,
    },
    WeaponRow {
        key: keys::WEAPON_SHORTBOW,
        damage: Dice::new(1, 6),
        threat_min: 20,
        crit_multiplier: 3,
        light: false,
        two_handed: true,
        reach: false,
        range_increment: Some(12),
    },
    WeaponRow {
        key: keys::WEAPON_LONGBOW,
        damage: Dice::new(1, 8),
        threat_min: 20,
        crit_multiplier: 3,
        light: false,
        two_handed: true,
        reach: false,
        range_increment: Some(20),
    },
];

pub fn weapon(key: &str) -> Option<Weapon> {
    if key == keys::WEAPON_UNARMED {
        return Some(Weapon::unarmed());
    }
    WEAPONS.iter().find(|row| row.key == key).map(|row| Weapon {
        name: row.key.to_string(),
        damage: row.damage,
        threat_min: row.threat_min,
        crit_multiplier: row.crit_multiplier,
        light: row.light,
        two_handed: row.two_handed,
        reach: row.reach,
        range_increment: row.range_increment,
        touch: false,
    })
}

pub fn armor(key: &str) -> Option<Armor> {
    let (bonus, max_dex) = match key {
        keys::ARMOR_LEATHER => (2, 6),
        keys::ARMOR_CHAIN_SHIRT => (4, 4),
        keys::ARMOR_BREASTPLATE => (5, 3),
        keys::ARMOR_FULL_PLATE => (8, 1),
        _ => return None,
    };
    Some(Armor { name: key.to_string(), bonus, max_dex: Some(max_dex) })
}

/// Maps a catalogue key to its rule extension, for data loaders.
pub fn extension(key: &str) -> Option<Box<dyn RuleExtension>> {
    if let Some((base, weapon_key)) = key.split_once(':') {
        return (base == keys::FEAT_WEAPON_FOCUS && weapon(weapon_key).is_some())
            .then(|| Box::new(WeaponFocus::new(weapon_key)) as Box<dyn RuleExtension>);
    }
    let extension: Box<dyn RuleExtension> = match key {
        keys::FEAT_POWER_ATTACK => Box::new(PowerAttack),
        keys::FEAT_POINT_BLANK_SHOT => Box::new(PointBlankShot),
        keys::FEAT_IMPROVED_CRITICAL => Box::new(ImprovedCritical),
        keys::FEAT_TWO_WEAPON_FIGHTING => Box::new(TwoWeaponFighting),
        keys::FEAT_IMPROVED_TRIP => Box::new(ImprovedTrip),
        keys::FEAT_SNEAK_ATTACK => Box::new(SneakAttack::default()),
        keys::FEAT_TOUGHNESS => Box::new(Toughness),
        keys::FEAT_DODGE => Box::new(Dodge),
        keys::FEAT_COMBAT_REFLEXES => Box::new(CombatReflexes),
        keys::FEAT_GREAT_FORTITUDE => Box::new(SaveFocus::great_fortitude()),
        keys::FEAT_LIGHTNING_REFLEXES => Box::new(SaveFocus::lightning_reflexes()),
        keys::FEAT_IRON_WILL => Box::new(SaveFocus::iron_will()),
        keys::STYLE_FLURRY => Box::new(FlurryStyle),
        _ => return None,
    };
    Some(extension)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_catalogue_weapon_resolves_under_its_own_name() {
        for row in WEAPONS {
            let weapon = weapon(row.key).expect("catalogue weapon");
            assert_eq!(weapon.name, row.key);
        }
        assert!(weapon("spork").is_none());
    }

    #[test]
    fn extension_keys_round_trip() {
        let all = [
            keys::FEAT_POWER_ATTACK,
            keys::FEAT_POINT_BLANK_SHOT,
            keys::FEAT_IMPROVED_CRITICAL,
            keys::FEAT_TWO_WEAPON_FIGHTING,
            keys::FEAT_IMPROVED_TRIP,
            keys::FEAT_SNEAK_ATTACK,
            keys::FEAT_TOUGHNESS,
            keys::FEAT_DODGE,
            keys::FEAT_COMBAT_REFLEXES,
            keys::FEAT_GREAT_FORTITUDE,
            keys::FEAT_LIGHTNING_REFLEXES,
            keys::FEAT_IRON_WILL,
            keys::STYLE_FLURRY,
        ];
        for key in all {
            let extension = extension(key).expect("known key");
            assert_eq!(extension.key(), key);
        }
        let focus = extension("weapon_focus:longsword").expect("focus");
        assert_eq!(focus.key(), "weapon_focus:longsword");
        assert!(extension("weapon_focus:spork").is_none());
        assert!(extension("flying").is_none());
    }

    #[test]
    fn armor_catalogue_caps_dexterity() {
        let plate = armor(keys::ARMOR_FULL_PLATE).expect("plate");
        assert_eq!(plate.max_dex, Some(1));
        assert!(armor("cardboard").is_none());
    }
}
