//! Per-tick motion proposal.
//!
//! The [`MotionProposal`] component is the value abilities hand to each other
//! through the update phases. It is reset at the start of every arbitration
//! tick, written phase by phase by active abilities, and read once by the
//! motion consumer (see [`crate::systems::motion`]).

use bevy_ecs::prelude::Component;
use glam::{Quat, Vec3};

/// Desired motion for the current tick.
///
/// # Fields
/// - `translation` - desired world-space displacement this tick
/// - `rotation` - desired rotation delta this tick
/// - `use_gravity` - whether the consumer should apply gravity
/// - `root_motion_position` / `root_motion_rotation` - defer to animation root motion
/// - `detect_horizontal_collisions` / `detect_vertical_collisions` - collision checks
#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub struct MotionProposal {
    pub translation: Vec3,
    pub rotation: Quat,
    pub use_gravity: bool,
    pub root_motion_position: bool,
    pub root_motion_rotation: bool,
    pub detect_horizontal_collisions: bool,
    pub detect_vertical_collisions: bool,
}

impl Default for MotionProposal {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            use_gravity: true,
            root_motion_position: false,
            root_motion_rotation: false,
            detect_horizontal_collisions: true,
            detect_vertical_collisions: true,
        }
    }
}

impl MotionProposal {
    /// Clear the proposal back to "stand still, physics as usual".
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Scale the horizontal (XZ) part of the translation.
    pub fn scale_horizontal(&mut self, factor: f32) {
        self.translation.x *= factor;
        self.translation.z *= factor;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_restores_defaults() {
        let mut motion = MotionProposal {
            translation: Vec3::ONE,
            use_gravity: false,
            ..MotionProposal::default()
        };
        motion.reset();
        assert_eq!(motion, MotionProposal::default());
    }

    #[test]
    fn test_scale_horizontal_keeps_vertical() {
        let mut motion = MotionProposal::default();
        motion.translation = Vec3::new(2.0, 1.0, 4.0);
        motion.scale_horizontal(0.5);
        assert_eq!(motion.translation, Vec3::new(1.0, 1.0, 2.0));
    }
}
