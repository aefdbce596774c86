use std::collections::BTreeSet;

use anyhow::{Result, bail};
use clap::Parser;
use rand_chacha::{
    ChaCha8Rng,
    rand_core::{Rng, SeedableRng},
};
use skirmish_core::content::{self, keys};
use skirmish_core::{
    Battle, BattleConfig, BattleError, BattleEvent, Combatant, Faction, Grid, Item, Pos,
    SeededDice, Size, Skirmisher, Slot, Terrain,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value_t = 42)]
    seed: u64,
    #[arg(short, long, default_value_t = 100)]
    battles: u32,
    #[arg(short, long, default_value_t = 40)]
    rounds: u32,
}

const WEAPONS: &[&str] = &[
    keys::WEAPON_UNARMED,
    keys::WEAPON_DAGGER,
    keys::WEAPON_SHORT_SWORD,
    keys::WEAPON_LONGSWORD,
    keys::WEAPON_GREATSWORD,
    keys::WEAPON_GREATAXE,
    keys::WEAPON_GLAIVE,
    keys::WEAPON_SHORTBOW,
    keys::WEAPON_LONGBOW,
];

const FEATS: &[&str] = &[
    keys::FEAT_POWER_ATTACK,
    keys::FEAT_POINT_BLANK_SHOT,
    keys::FEAT_IMPROVED_CRITICAL,
    keys::FEAT_IMPROVED_TRIP,
    keys::FEAT_SNEAK_ATTACK,
    keys::FEAT_TOUGHNESS,
    keys::FEAT_DODGE,
    keys::FEAT_COMBAT_REFLEXES,
    keys::STYLE_FLURRY,
];

const SIZES: &[Size] = &[Size::Small, Size::Medium, Size::Medium, Size::Large];

fn choose<T: Clone>(rng: &mut ChaCha8Rng, slice: &[T]) -> T {
    let p = rng.next_u64() as usize % slice.len();
    slice[p].clone()
}

fn below(rng: &mut ChaCha8Rng, bound: u64) -> u64 {
    rng.next_u64() % bound
}

fn random_grid(rng: &mut ChaCha8Rng) -> Grid {
    let width = 8 + below(rng, 9) as usize;
    let height = 8 + below(rng, 9) as usize;
    let mut grid = Grid::new(width, height);
    for y in 0..height as i32 {
        for x in 0..width as i32 {
            let terrain = match below(rng, 20) {
                0 | 1 => Terrain::Wall,
                2 => Terrain::Other,
                _ => continue,
            };
            grid.set_terrain(Pos { y, x }, terrain);
        }
    }
    grid
}

fn random_combatant(rng: &mut ChaCha8Rng, index: usize, faction: u8, grid: &Grid) -> Combatant {
    let pos = Pos {
        y: below(rng, grid.height() as u64) as i32,
        x: below(rng, grid.width() as u64) as i32,
    };
    let mut combatant = Combatant::new(format!("c{index}"), Faction(faction))
        .at(pos)
        .with_size(choose(rng, SIZES))
        .with_health(5 + below(rng, 30) as i32)
        .with_base_attack_bonus(below(rng, 16) as i32);
    if let Some(weapon) = content::weapon(choose(rng, WEAPONS)) {
        combatant.equip(Slot::MainHand, Item::Weapon(weapon));
    }
    for _ in 0..below(rng, 3) {
        if let Some(feat) = content::extension(choose(rng, FEATS)) {
            combatant.learn(feat.as_ref());
        }
    }
    combatant
}

fn populate(rng: &mut ChaCha8Rng, battle: &mut Battle) -> usize {
    let factions = 2 + below(rng, 2) as u8;
    let wanted = 2 + below(rng, 5) as usize;
    let mut placed = 0;
    for index in 0..wanted * 4 {
        if placed == wanted {
            break;
        }
        let faction = (placed % usize::from(factions)) as u8;
        let combatant = random_combatant(rng, index, faction, battle.grid());
        let strategy = Skirmisher { prefer_trip: below(rng, 3) == 0 };
        match battle.add_combatant(combatant, Box::new(strategy)) {
            Ok(_) => placed += 1,
            Err(BattleError::Blocked(_) | BattleError::OutOfBounds(_)) => {}
            Err(err) => warn!(%err, "unexpected placement failure"),
        }
    }
    placed
}

fn check_invariants(battle: &Battle) -> Result<(), String> {
    for combatant in battle.combatants() {
        let id = combatant.id;
        if combatant.health > combatant.health_max {
            return Err(format!("{} healed past its maximum", combatant.name));
        }
        if combatant.is_dead() {
            continue;
        }
        if combatant.footprint.is_empty() {
            return Err(format!("{} is alive but unregistered", combatant.name));
        }
        for pos in combatant.footprint.occupied() {
            if battle.grid().terrain(*pos) == Some(Terrain::Wall) {
                return Err(format!("{} stands inside a wall at {pos:?}", combatant.name));
            }
            if !battle.grid().occupants(*pos).any(|other| other == id) {
                return Err(format!("{} is missing from tile {pos:?}", combatant.name));
            }
            if battle.grid().occupants(*pos).count() > 1 {
                return Err(format!("tile {pos:?} is shared"));
            }
        }
        let threatening = battle.grid().tiles().any(|tile| tile.threaten().contains(&id));
        if !combatant.is_conscious() && threatening {
            return Err(format!("unconscious {} still threatens", combatant.name));
        }
    }
    Ok(())
}

fn run_fuzz_simulation(seed: u64, max_rounds: u32) -> Result<(), String> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let grid = random_grid(&mut rng);
    let mut battle = Battle::new(grid, BattleConfig::default(), Box::new(SeededDice::new(seed)))
        .map_err(|err| err.to_string())?;
    if populate(&mut rng, &mut battle) < 2 {
        return Ok(());
    }
    battle.roll_initiative();

    let mut truncated = BTreeSet::new();
    while battle.round() < max_rounds && battle.standing_factions().len() > 1 {
        let mut events = battle.advance(1).events;
        battle.request_pause();
        events.extend(battle.advance(usize::MAX).events);
        for event in &events {
            if let BattleEvent::TurnEnded { combatant, truncated: true } = event {
                truncated.insert(*combatant);
            }
        }
        check_invariants(&battle).map_err(|err| format!("seed {seed}: {err}"))?;
    }
    if !truncated.is_empty() {
        warn!(seed, count = truncated.len(), "turns hit the iteration cap");
    }
    Ok(())
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    let args = Args::parse();

    info!(seed = args.seed, battles = args.battles, "starting fuzz harness");
    for offset in 0..u64::from(args.battles) {
        if let Err(err) = run_fuzz_simulation(args.seed.wrapping_add(offset), args.rounds) {
            bail!("Invariant failed: {err}");
        }
    }
    info!("fuzzing completed successfully");
    Ok(())
}
