//! World-space placement of an actor.

use bevy_ecs::prelude::Component;
use glam::{Quat, Vec3};

/// Position and orientation of the actor's pivot.
#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub struct ActorTransform {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Default for ActorTransform {
    fn default() -> Self {
        Self::new(Vec3::ZERO)
    }
}

impl ActorTransform {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
        }
    }
}
