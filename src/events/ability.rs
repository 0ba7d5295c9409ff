//! Ability lifecycle events.
//!
//! [`AbilityStartedEvent`] and [`AbilityStoppedEvent`] are triggered by the
//! ability systems after every commit, in commit order. Observers can use them
//! for audio cues, UI, or replication without touching the
//! [`Abilities`](crate::components::abilities::Abilities) component.

use bevy_ecs::observer::On;
use bevy_ecs::prelude::*;
use log::info;

/// An ability became active.
#[derive(Event, Debug, Clone, Copy)]
pub struct AbilityStartedEvent {
    pub entity: Entity,
    /// Priority index of the ability.
    pub index: usize,
    /// Type name of the ability.
    pub name: &'static str,
}

/// An ability became inactive.
#[derive(Event, Debug, Clone, Copy)]
pub struct AbilityStoppedEvent {
    pub entity: Entity,
    pub index: usize,
    pub name: &'static str,
    /// Whether the stop bypassed the ability's own `can_stop`.
    pub forced: bool,
}

/// One entry of the [`AbilityLog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AbilityLogEntry {
    pub entity: Entity,
    pub name: &'static str,
    pub started: bool,
    pub forced: bool,
}

/// Optional resource recording every start and stop, oldest first.
#[derive(Resource, Debug, Default)]
pub struct AbilityLog {
    pub entries: Vec<AbilityLogEntry>,
}

impl AbilityLog {
    /// Take the recorded entries, leaving the log empty.
    pub fn drain(&mut self) -> Vec<AbilityLogEntry> {
        std::mem::take(&mut self.entries)
    }
}

/// Observer logging ability starts and recording them into [`AbilityLog`] if present.
pub fn observe_ability_started(trigger: On<AbilityStartedEvent>, log: Option<ResMut<AbilityLog>>) {
    let event = trigger.event();
    info!("{:?} started '{}'", event.entity, event.name);
    if let Some(mut log) = log {
        log.entries.push(AbilityLogEntry {
            entity: event.entity,
            name: event.name,
            started: true,
            forced: false,
        });
    }
}

/// Observer logging ability stops and recording them into [`AbilityLog`] if present.
pub fn observe_ability_stopped(trigger: On<AbilityStoppedEvent>, log: Option<ResMut<AbilityLog>>) {
    let event = trigger.event();
    if event.forced {
        info!("{:?} force stopped '{}'", event.entity, event.name);
    } else {
        info!("{:?} stopped '{}'", event.entity, event.name);
    }
    if let Some(mut log) = log {
        log.entries.push(AbilityLogEntry {
            entity: event.entity,
            name: event.name,
            started: false,
            forced: event.forced,
        });
    }
}
