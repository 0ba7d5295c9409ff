//! Keeps the actor inside an axis-aligned area on the ground plane.
//!
//! Runs in the late phase, after every ability has proposed and scaled its
//! translation, and trims the proposal so the resulting position stays
//! within bounds. Its place in the priority order does not matter.

use glam::Vec3;
use log::trace;

use crate::abilities::base_from_config;
use crate::components::ability::{Ability, AbilityBase, AbilityContext};
use crate::components::inputgate::{StartTrigger, StopTrigger};
use crate::resources::actorconfig::AbilityConfig;

const DEFAULT_EXTENT: f32 = 50.0;

#[derive(Debug)]
pub struct RestrictPosition {
    base: AbilityBase,
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for RestrictPosition {
    fn default() -> Self {
        Self::from_config(&AbilityConfig::named("restrict_position"))
    }
}

impl RestrictPosition {
    pub fn from_config(config: &AbilityConfig) -> Self {
        Self {
            base: base_from_config(config, StartTrigger::Automatic, StopTrigger::Manual, &[]),
            min: Vec3::new(
                config.param("min_x", -DEFAULT_EXTENT),
                f32::NEG_INFINITY,
                config.param("min_z", -DEFAULT_EXTENT),
            ),
            max: Vec3::new(
                config.param("max_x", DEFAULT_EXTENT),
                f32::INFINITY,
                config.param("max_z", DEFAULT_EXTENT),
            ),
        }
    }

    /// Area limited to `min..=max` on the x and z axes.
    pub fn with_bounds(mut self, min_x: f32, max_x: f32, min_z: f32, max_z: f32) -> Self {
        self.min.x = min_x;
        self.max.x = max_x;
        self.min.z = min_z;
        self.max.z = max_z;
        self
    }
}

impl Ability for RestrictPosition {
    fn base(&self) -> &AbilityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut AbilityBase {
        &mut self.base
    }

    fn name(&self) -> &'static str {
        "restrict_position"
    }

    fn is_concurrent(&self) -> bool {
        true
    }

    fn late_update(&mut self, ctx: &mut AbilityContext) {
        let current = ctx.transform.position;
        let proposed = current + ctx.motion.translation;
        let clamped = proposed.clamp(self.min, self.max);
        if clamped != proposed {
            trace!("{:?} clamped {} to {}", ctx.entity, proposed, clamped);
            ctx.motion.translation = clamped - current;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abilities::test_support::Frame;
    use crate::abilities::{Locomotion, SpeedChange};
    use crate::components::abilities::Abilities;

    #[test]
    fn test_starts_automatically() {
        let mut abilities = Abilities::new().with(RestrictPosition::default());
        let mut frame = Frame::new();
        frame.step(&mut abilities);
        assert!(abilities.is_active(0));
        assert_eq!(abilities.exclusive(), None);
    }

    #[test]
    fn test_clamp_holds_when_registered_before_sprint() {
        let mut abilities = Abilities::new()
            .with(Locomotion::default())
            .with(RestrictPosition::default().with_bounds(-1.0, 1.0, -1.0, 1.0))
            .with(SpeedChange::default());
        let mut frame = Frame::new();
        frame.transform.position = Vec3::new(0.9, 2.0, 0.0);
        frame.input.set_axis("horizontal", 1.0);
        frame.button("sprint", true);
        frame.step(&mut abilities);

        let end = frame.transform.position + frame.motion.translation;
        assert!((end.x - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_clamp_registered_last_wins() {
        let mut abilities = Abilities::new()
            .with(Locomotion::default())
            .with(SpeedChange::default())
            .with(RestrictPosition::default().with_bounds(-1.0, 1.0, -1.0, 1.0));
        let mut frame = Frame::new();
        frame.transform.position = Vec3::new(0.9, 2.0, 0.0);
        frame.input.set_axis("horizontal", 1.0);
        frame.button("sprint", true);
        frame.step(&mut abilities);

        let end = frame.transform.position + frame.motion.translation;
        assert!((end.x - 1.0).abs() < 1e-5);
        assert_eq!(end.y, 2.0);
    }
}
