//! Ability engine demo runner.
//!
//! Builds one actor from an actor configuration (INI or JSON), replays a
//! scripted sequence of input frames against it and logs the active abilities
//! after every tick.
//!
//! # Running
//!
//! ```sh
//! RUST_LOG=debug cargo run --release -- --config actor.ini --script demo.json
//! ```
//!
//! Without `--config` the built-in actor (every ability type) is used; without
//! `--script` a short jump/crouch/death sequence is replayed.

use std::path::PathBuf;

use abilityengine::abilities::default_actor_config;
use abilityengine::game::{Script, ScriptFrame, Simulation};
use abilityengine::resources::actorconfig::ActorConfig;
use clap::Parser;
use log::{error, info};

/// Per-actor ability arbitration demo
#[derive(Parser)]
#[command(version, about = "Replays scripted input against an actor's abilities")]
struct Cli {
    /// Actor configuration (.ini or .json).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// JSON script of input frames.
    #[arg(long, value_name = "PATH")]
    script: Option<PathBuf>,

    /// Tick length in seconds.
    #[arg(long, default_value_t = 1.0 / 60.0)]
    dt: f32,

    /// Print the per-tick reports as JSON lines.
    #[arg(long)]
    json: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match ActorConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                error!("{}", e);
                std::process::exit(1);
            }
        },
        None => default_actor_config(),
    };

    let script = match &cli.script {
        Some(path) => match Script::load(path) {
            Ok(script) => script,
            Err(e) => {
                error!("{}", e);
                std::process::exit(1);
            }
        },
        None => demo_script(),
    };

    let mut simulation = match Simulation::new(&config) {
        Ok(simulation) => simulation,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };
    if let Some(abilities) = simulation.abilities() {
        for err in abilities.config_errors() {
            error!("{}", err);
        }
    }

    let reports = simulation.run_script(&script, cli.dt);
    for report in &reports {
        if cli.json {
            match serde_json::to_string(report) {
                Ok(line) => println!("{}", line),
                Err(e) => error!("{}", e),
            }
        } else {
            info!(
                "#{:<4} t={:.3} y={:.3} grounded={:<5} active=[{}]",
                report.frame,
                report.time,
                report.position[1],
                report.grounded,
                report.active.join(", ")
            );
        }
    }
    info!("Replayed {} ticks", reports.len());
}

/// Jump, crouch, sprint, die and respawn.
fn demo_script() -> Script {
    let frame = |buttons: &[(&str, bool)], repeat: u32| ScriptFrame {
        buttons: buttons
            .iter()
            .map(|(channel, down)| (channel.to_string(), *down))
            .collect(),
        repeat: Some(repeat),
        ..ScriptFrame::default()
    };
    let mut died = frame(&[], 10);
    died.events.push(abilityengine::events::actor::ActorEvent::Died);
    let mut respawned = frame(&[], 5);
    respawned.events.push(abilityengine::events::actor::ActorEvent::Respawned);

    Script {
        frames: vec![
            frame(&[("jump", true)], 1),
            frame(&[("jump", false)], 60),
            frame(&[("crouch", true)], 20),
            frame(&[("crouch", false), ("sprint", true)], 20),
            frame(&[("sprint", false)], 1),
            died,
            respawned,
        ],
    }
}
