//! World assembly and scripted simulation.
//!
//! [`build_world`] creates an ECS world with the shared resources, the ability
//! observers and one actor built from an [`ActorConfig`]. [`build_schedule`]
//! returns the per-tick schedule:
//!
//! 1. [`update_input_state`] - edges and hold times for this tick
//! 2. [`ability_arbitration_system`] - stop and start passes
//! 3. [`ability_update_system`] - update phases
//! 4. [`motion_integration_system`] - apply the motion proposal
//!
//! [`Simulation`] drives both from a [`Script`]: a JSON list of frames giving
//! the raw input levels, the grounding override and the actor events of each
//! tick.
use std::path::Path;

use bevy_ecs::observer::Observer;
use bevy_ecs::prelude::*;
use glam::Vec3;
use log::{debug, info};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::abilities::build_abilities;
use crate::components::abilities::Abilities;
use crate::components::actortransform::ActorTransform;
use crate::components::animatorparams::AnimatorParams;
use crate::components::motion::MotionProposal;
use crate::components::physics::PhysicsSnapshot;
use crate::error::AbilityError;
use crate::events::ability::{AbilityLog, observe_ability_started, observe_ability_stopped};
use crate::events::actor::{ActorEnabledEvent, ActorEvent, ActorNotification, DestroyActorEvent};
use crate::resources::actorconfig::ActorConfig;
use crate::resources::input::InputState;
use crate::resources::worldtime::WorldTime;
use crate::systems::abilities::{
    ability_arbitration_system, ability_update_system, observe_actor_enabled,
    observe_actor_notification, observe_destroy_actor,
};
use crate::systems::input::update_input_state;
use crate::systems::motion::motion_integration_system;
use crate::systems::time::update_world_time;

/// Bundle of components making an entity an actor.
pub fn actor_bundle(
    abilities: Abilities,
    position: Vec3,
) -> (
    Abilities,
    MotionProposal,
    AnimatorParams,
    PhysicsSnapshot,
    ActorTransform,
) {
    (
        abilities,
        MotionProposal::default(),
        AnimatorParams::default(),
        PhysicsSnapshot::default(),
        ActorTransform::new(position),
    )
}

/// Create a world with resources and observers, and spawn one actor.
pub fn build_world(config: &ActorConfig) -> Result<(World, Entity), AbilityError> {
    let abilities = build_abilities(config)?;

    let mut world = World::new();
    world.insert_resource(WorldTime::default());
    world.insert_resource(config.input_state());
    world.insert_resource(AbilityLog::default());
    world.insert_resource(config.clone());

    world.spawn(Observer::new(observe_actor_notification));
    world.spawn(Observer::new(observe_actor_enabled));
    world.spawn(Observer::new(observe_destroy_actor));
    world.spawn(Observer::new(observe_ability_started));
    world.spawn(Observer::new(observe_ability_stopped));
    // Ensure the observers are registered before any event is triggered.
    world.flush();

    let actor = world.spawn(actor_bundle(abilities, Vec3::ZERO)).id();
    info!("Spawned actor {:?}", actor);
    Ok((world, actor))
}

/// Per-tick schedule; run after [`update_world_time`].
pub fn build_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.add_systems(
        (
            update_input_state,
            ability_arbitration_system,
            ability_update_system,
            motion_integration_system,
        )
            .chain(),
    );
    schedule
}

/// Input and events for one scripted tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptFrame {
    /// Raw button levels; channels not listed keep their previous level.
    pub buttons: FxHashMap<String, bool>,
    /// Axis values; axes not listed keep their previous value.
    pub axes: FxHashMap<String, f32>,
    /// Overrides the grounding reported by the motion consumer.
    pub grounded: Option<bool>,
    /// Actor events delivered before the tick.
    pub events: Vec<ActorEvent>,
    /// Enables or disables the actor before the tick.
    pub enabled: Option<bool>,
    /// Destroys the actor before the tick.
    pub destroy: bool,
    /// Number of ticks this frame lasts.
    pub repeat: Option<u32>,
}

/// Sequence of scripted frames.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Script {
    pub frames: Vec<ScriptFrame>,
}

impl Script {
    pub fn from_json_str(text: &str) -> Result<Self, AbilityError> {
        serde_json::from_str(text).map_err(|e| AbilityError::ConfigLoad(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, AbilityError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| AbilityError::ConfigLoad(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&text)
    }
}

/// State of the actor after one tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickReport {
    pub frame: u64,
    pub time: f32,
    pub active: Vec<&'static str>,
    pub position: [f32; 3],
    pub grounded: bool,
}

/// A world with one actor and the tick schedule.
pub struct Simulation {
    pub world: World,
    pub actor: Entity,
    schedule: Schedule,
}

impl Simulation {
    pub fn new(config: &ActorConfig) -> Result<Self, AbilityError> {
        let (world, actor) = build_world(config)?;
        Ok(Self {
            world,
            actor,
            schedule: build_schedule(),
        })
    }

    pub fn abilities(&self) -> Option<&Abilities> {
        self.world.get::<Abilities>(self.actor)
    }

    /// Apply `frame` and run one tick of `dt` seconds.
    ///
    /// Returns `None` once the actor no longer exists.
    pub fn step(&mut self, frame: &ScriptFrame, dt: f32) -> Option<TickReport> {
        {
            let mut input = self.world.resource_mut::<InputState>();
            for (channel, down) in &frame.buttons {
                input.set_button(channel.clone(), *down);
            }
            for (channel, value) in &frame.axes {
                input.set_axis(channel.clone(), *value);
            }
        }
        if let Some(grounded) = frame.grounded {
            if let Some(mut physics) = self.world.get_mut::<PhysicsSnapshot>(self.actor) {
                physics.grounded = grounded;
            }
        }
        if let Some(enabled) = frame.enabled {
            self.world.trigger(ActorEnabledEvent {
                entity: self.actor,
                enabled,
            });
        }
        for event in &frame.events {
            self.world
                .trigger(ActorNotification::new(self.actor, event.clone()));
        }
        if frame.destroy {
            self.world.trigger(DestroyActorEvent { entity: self.actor });
        }
        self.world.flush();

        update_world_time(&mut self.world, dt);
        self.schedule.run(&mut self.world);
        self.world.clear_trackers();

        let report = self.report();
        if let Some(report) = &report {
            debug!("{:?}", report);
        }
        report
    }

    /// Run every frame of `script`, honoring `repeat`.
    pub fn run_script(&mut self, script: &Script, dt: f32) -> Vec<TickReport> {
        let mut reports = Vec::new();
        for frame in &script.frames {
            for _ in 0..frame.repeat.unwrap_or(1).max(1) {
                match self.step(frame, dt) {
                    Some(report) => reports.push(report),
                    None => return reports,
                }
            }
        }
        reports
    }

    fn report(&self) -> Option<TickReport> {
        let abilities = self.world.get::<Abilities>(self.actor)?;
        let transform = self.world.get::<ActorTransform>(self.actor)?;
        let grounded = self
            .world
            .get::<PhysicsSnapshot>(self.actor)
            .map(|p| p.grounded)
            .unwrap_or(true);
        let time = self.world.resource::<WorldTime>();
        Some(TickReport {
            frame: time.frame_count,
            time: time.elapsed,
            active: abilities.active_names(),
            position: transform.position.to_array(),
            grounded,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abilities::default_actor_config;

    #[test]
    fn test_build_world_spawns_actor() {
        let (world, actor) = build_world(&default_actor_config()).unwrap();
        assert_eq!(world.get::<Abilities>(actor).map(|a| a.len()), Some(7));
        assert!(world.contains_resource::<InputState>());
        assert!(world.contains_resource::<ActorConfig>());
    }

    #[test]
    fn test_script_from_json() {
        let script = Script::from_json_str(
            r#"{ "frames": [
                { "buttons": { "jump": true } },
                { "buttons": { "jump": false }, "repeat": 3 },
                { "events": ["died", { "damaged": { "amount": 1.5 } }] }
            ] }"#,
        )
        .unwrap();
        assert_eq!(script.frames.len(), 3);
        assert_eq!(script.frames[1].repeat, Some(3));
        assert_eq!(script.frames[2].events[1], ActorEvent::Damaged { amount: 1.5 });
    }

    #[test]
    fn test_idle_actor_runs_always_on_abilities() {
        let mut sim = Simulation::new(&default_actor_config()).unwrap();
        let report = sim.step(&ScriptFrame::default(), 0.1).unwrap();
        assert_eq!(report.frame, 1);
        assert_eq!(report.active, vec!["locomotion", "restrict_position", "stored_input"]);
        assert!(report.grounded);
    }

    #[test]
    fn test_run_script_stops_after_destroy() {
        let mut sim = Simulation::new(&default_actor_config()).unwrap();
        let script = Script {
            frames: vec![
                ScriptFrame::default(),
                ScriptFrame {
                    destroy: true,
                    ..ScriptFrame::default()
                },
                ScriptFrame::default(),
            ],
        };
        let reports = sim.run_script(&script, 0.1);
        assert_eq!(reports.len(), 1);
        assert!(sim.abilities().is_none());
    }
}
