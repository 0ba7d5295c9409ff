//! Typed actor notifications.
//!
//! Abilities coordinate through [`ActorEvent`]s instead of holding references
//! to each other. Each variant carries its own payload; [`ActorEventKind`] is
//! the key abilities subscribe with (see
//! [`Ability::subscriptions`](crate::components::ability::Ability::subscriptions)).
//!
//! Game code triggers an [`ActorNotification`] for a given actor entity;
//! [`observe_actor_notification`](crate::systems::abilities::observe_actor_notification)
//! forwards it to the abilities of that actor that subscribed to its kind.
//!
//! ```ignore
//! commands.trigger(ActorNotification::new(player, ActorEvent::Died));
//! ```

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

/// Subscription key, one per [`ActorEvent`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorEventKind {
    Died,
    Respawned,
    ItemEquipped,
    ItemUnequipped,
    Damaged,
    GroundedChanged,
}

/// A notification about the actor, with its payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorEvent {
    Died,
    Respawned,
    ItemEquipped { slot: u32, item: u32 },
    ItemUnequipped { slot: u32, item: u32 },
    Damaged { amount: f32 },
    GroundedChanged { grounded: bool },
}

impl ActorEvent {
    pub fn kind(&self) -> ActorEventKind {
        match self {
            ActorEvent::Died => ActorEventKind::Died,
            ActorEvent::Respawned => ActorEventKind::Respawned,
            ActorEvent::ItemEquipped { .. } => ActorEventKind::ItemEquipped,
            ActorEvent::ItemUnequipped { .. } => ActorEventKind::ItemUnequipped,
            ActorEvent::Damaged { .. } => ActorEventKind::Damaged,
            ActorEvent::GroundedChanged { .. } => ActorEventKind::GroundedChanged,
        }
    }
}

/// ECS event carrying an [`ActorEvent`] to one actor.
#[derive(Event, Debug, Clone)]
pub struct ActorNotification {
    /// The actor whose abilities should hear about it.
    pub entity: Entity,
    pub event: ActorEvent,
}

impl ActorNotification {
    pub fn new(entity: Entity, event: ActorEvent) -> Self {
        Self { entity, event }
    }
}

/// Request to enable or disable an actor.
///
/// Disabling force-stops every active ability and suspends arbitration until
/// the actor is enabled again.
#[derive(Event, Debug, Clone, Copy)]
pub struct ActorEnabledEvent {
    pub entity: Entity,
    pub enabled: bool,
}

/// Request to tear an actor down: every ability is force stopped, its event
/// subscriptions are dropped and the entity is despawned.
#[derive(Event, Debug, Clone, Copy)]
pub struct DestroyActorEvent {
    pub entity: Entity,
}
