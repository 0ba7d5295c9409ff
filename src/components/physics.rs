//! Read-only physics results for an actor.
//!
//! The physics layer is outside this crate. Whatever runs the casts writes a
//! [`PhysicsSnapshot`] on the actor before abilities run; abilities only read it.

use bevy_ecs::prelude::{Component, Entity};
use glam::Vec3;

/// Grounding and contact state of the current tick.
#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub struct PhysicsSnapshot {
    /// Whether the actor stands on something.
    pub grounded: bool,
    /// Normal of the ground or last contact.
    pub hit_normal: Vec3,
    /// Collider the actor is touching, if any.
    pub hit_collider: Option<Entity>,
}

impl Default for PhysicsSnapshot {
    fn default() -> Self {
        Self {
            grounded: true,
            hit_normal: Vec3::Y,
            hit_collider: None,
        }
    }
}

impl PhysicsSnapshot {
    pub fn airborne() -> Self {
        Self {
            grounded: false,
            ..Self::default()
        }
    }
}
