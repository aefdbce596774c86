use std::io;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use skirmish_core::{AdvanceStopReason, Battle, BattleEvent, CombatantId};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod scenario;

use scenario::{DEMO, Scenario};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a TOML scenario; the built-in demo runs when omitted
    #[arg(short, long)]
    scenario: Option<PathBuf>,
    /// Overrides the scenario's dice seed
    #[arg(long)]
    seed: Option<u64>,
    #[arg(short, long, default_value_t = 50)]
    max_rounds: u32,
    #[arg(short, long, value_enum, default_value_t = Format::Text)]
    format: Format,
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();

    let args = Args::parse();
    let scenario = match &args.scenario {
        Some(path) => Scenario::load(path)?,
        None => Scenario::parse(DEMO)?,
    };
    let seed = args.seed.unwrap_or(scenario.seed);
    let mut battle = scenario.build(seed)?;
    info!(seed, combatants = battle.order().len(), "battle ready");

    while battle.round() < args.max_rounds && battle.standing_factions().len() > 1 {
        // One event opens the round; the pause then lands on its far boundary.
        let mut events = battle.advance(1).events;
        battle.request_pause();
        let rest = battle.advance(usize::MAX);
        debug_assert!(matches!(rest.stop_reason, AdvanceStopReason::PausedAtBoundary { .. }));
        events.extend(rest.events);
        for event in &events {
            match args.format {
                Format::Text => println!("{}", describe(&battle, event)),
                Format::Json => println!("{}", serde_json::to_string(event)?),
            }
        }
    }

    let standing = battle.standing_factions();
    match standing.iter().next() {
        Some(faction) if standing.len() == 1 => {
            info!(faction = faction.0, rounds = battle.round(), "battle decided");
        }
        _ => info!(rounds = battle.round(), "no victor within the round limit"),
    }
    info!(hash = battle.snapshot_hash(), "final snapshot");
    Ok(())
}

fn name(battle: &Battle, id: CombatantId) -> &str {
    battle.combatant(id).map_or("?", |c| c.name.as_str())
}

fn describe(battle: &Battle, event: &BattleEvent) -> String {
    match event {
        BattleEvent::RoundStarted { round } => format!("== round {round} =="),
        BattleEvent::TurnStarted { combatant, .. } => {
            format!("{} acts", name(battle, *combatant))
        }
        BattleEvent::Moved { combatant, path, .. } => {
            let end = path.last().map_or(String::new(), |p| format!(" to ({}, {})", p.x, p.y));
            format!("  {} moves {} tiles{end}", name(battle, *combatant), path.len())
        }
        BattleEvent::AttackStarted { attacker, target, opportunity, .. } => {
            let kind = if *opportunity { "an opportunity attack" } else { "an attack" };
            format!("  {} makes {kind} on {}", name(battle, *attacker), name(battle, *target))
        }
        BattleEvent::AttackFinished { outcome } => {
            let verdict = match (outcome.hit, outcome.critical) {
                (true, true) => format!("critical hit for {}", outcome.damage),
                (true, false) => format!("hit for {}", outcome.damage),
                _ => "miss".to_string(),
            };
            format!(
                "    rolled {} + {} vs AC {}: {verdict}",
                outcome.roll, outcome.total, outcome.armor_class
            )
        }
        BattleEvent::ManeuverResolved { outcome } => format!(
            "  {} trips {} ({} vs {}): {}",
            name(battle, outcome.attacker),
            name(battle, outcome.target),
            outcome.attacker_total,
            outcome.defender_total,
            if outcome.success { "down" } else { "keeps footing" }
        ),
        BattleEvent::EffectStarted { combatant, effect } => {
            format!("  {} is now {effect:?}", name(battle, *combatant))
        }
        BattleEvent::EffectEnded { combatant, effect } => {
            format!("  {} is no longer {effect:?}", name(battle, *combatant))
        }
        BattleEvent::HealthChanged { combatant, health, state } => {
            format!("    {} at {health} health ({state:?})", name(battle, *combatant))
        }
        BattleEvent::TurnEnded { combatant, truncated } => {
            let note = if *truncated { " (cut short)" } else { "" };
            format!("{} is done{note}", name(battle, *combatant))
        }
        BattleEvent::RoundEnded { round } => format!("== end of round {round} =="),
    }
}
