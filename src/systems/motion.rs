//! Kinematic motion consumer.
//!
//! [`motion_integration_system`] is the minimal stand-in for a character
//! controller: it applies each actor's [`MotionProposal`] to its
//! [`ActorTransform`] against a flat ground plane and writes the resulting
//! grounding into [`PhysicsSnapshot`] for the next tick. A
//! [`ActorEvent::GroundedChanged`] notification is triggered when the
//! grounding flips.
use bevy_ecs::prelude::*;
use log::trace;

use crate::components::actortransform::ActorTransform;
use crate::components::motion::MotionProposal;
use crate::components::physics::PhysicsSnapshot;
use crate::events::actor::{ActorEvent, ActorNotification};
use crate::resources::worldtime::WorldTime;

/// Height of the ground plane.
pub const GROUND_HEIGHT: f32 = 0.0;
/// Fall speed applied while airborne with gravity enabled, units per second.
pub const FALL_SPEED: f32 = 9.0;

/// Apply motion proposals and update grounding.
pub fn motion_integration_system(
    mut commands: Commands,
    time: Res<WorldTime>,
    mut query: Query<(Entity, &mut ActorTransform, &MotionProposal, Option<&mut PhysicsSnapshot>)>,
) {
    for (entity, mut transform, motion, physics) in query.iter_mut() {
        let was_grounded = physics.as_ref().map(|p| p.grounded).unwrap_or(true);

        let mut step = motion.translation;
        if motion.use_gravity && !was_grounded {
            step.y -= FALL_SPEED * time.delta;
        }
        transform.position += step;
        transform.rotation = (motion.rotation * transform.rotation).normalize();

        let mut grounded = transform.position.y <= GROUND_HEIGHT;
        if grounded && motion.detect_vertical_collisions {
            transform.position.y = GROUND_HEIGHT;
        } else if !motion.detect_vertical_collisions {
            grounded = false;
        }

        if let Some(mut physics) = physics {
            if physics.grounded != grounded {
                physics.grounded = grounded;
                trace!("{:?} grounded = {}", entity, grounded);
                commands.trigger(ActorNotification::new(
                    entity,
                    ActorEvent::GroundedChanged { grounded },
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;

    fn world_with_actor(position: Vec3, motion: MotionProposal, grounded: bool) -> (World, Entity) {
        let mut world = World::new();
        world.insert_resource(WorldTime {
            delta: 0.1,
            ..WorldTime::default()
        });
        let entity = world
            .spawn((
                ActorTransform::new(position),
                motion,
                PhysicsSnapshot {
                    grounded,
                    ..PhysicsSnapshot::default()
                },
            ))
            .id();
        (world, entity)
    }

    fn run(world: &mut World) {
        let mut schedule = Schedule::default();
        schedule.add_systems(motion_integration_system);
        schedule.run(world);
    }

    #[test]
    fn test_translation_applied_and_lifts_off() {
        let motion = MotionProposal {
            translation: Vec3::new(1.0, 0.5, 0.0),
            use_gravity: false,
            ..MotionProposal::default()
        };
        let (mut world, entity) = world_with_actor(Vec3::ZERO, motion, true);
        run(&mut world);
        assert_eq!(world.get::<ActorTransform>(entity).unwrap().position, Vec3::new(1.0, 0.5, 0.0));
        assert!(!world.get::<PhysicsSnapshot>(entity).unwrap().grounded);
    }

    #[test]
    fn test_gravity_lands_on_ground() {
        let (mut world, entity) = world_with_actor(Vec3::new(0.0, 0.5, 0.0), MotionProposal::default(), false);
        run(&mut world);
        let transform = world.get::<ActorTransform>(entity).unwrap();
        assert_eq!(transform.position.y, GROUND_HEIGHT);
        assert!(world.get::<PhysicsSnapshot>(entity).unwrap().grounded);
    }

    #[test]
    fn test_grounded_actor_stays_on_ground() {
        let (mut world, entity) = world_with_actor(Vec3::ZERO, MotionProposal::default(), true);
        run(&mut world);
        assert_eq!(world.get::<ActorTransform>(entity).unwrap().position, Vec3::ZERO);
        assert!(world.get::<PhysicsSnapshot>(entity).unwrap().grounded);
    }
}
