//! Planar movement from the two movement axes.
//!
//! Always running. Writes the base horizontal translation that the other
//! abilities scale or clamp later in the tick, and turns the actor to face
//! the direction of travel.

use glam::{Quat, Vec2};

use crate::abilities::base_from_config;
use crate::components::ability::{Ability, AbilityBase, AbilityContext};
use crate::components::inputgate::{StartTrigger, StopTrigger};
use crate::resources::actorconfig::AbilityConfig;

pub const SPEED_PARAM: &str = "speed";
const DEFAULT_SPEED: f32 = 4.0;

#[derive(Debug)]
pub struct Locomotion {
    base: AbilityBase,
    /// Units per second at full deflection.
    pub speed: f32,
    direction: Vec2,
}

impl Default for Locomotion {
    fn default() -> Self {
        Self::from_config(&AbilityConfig::named("locomotion"))
    }
}

impl Locomotion {
    pub fn from_config(config: &AbilityConfig) -> Self {
        Self {
            base: base_from_config(
                config,
                StartTrigger::Automatic,
                StopTrigger::Manual,
                &["horizontal", "vertical"],
            ),
            speed: config.param("speed", DEFAULT_SPEED),
            direction: Vec2::ZERO,
        }
    }

    fn read_direction(&self, ctx: &AbilityContext) -> Vec2 {
        let gate = &self.base.gate;
        let deadzone = gate.settings.axis_deadzone;
        let axis = |index: usize| {
            let value = gate.channel_name(index).map(|c| ctx.input.axis(c)).unwrap_or(0.0);
            if value.abs() > deadzone { value } else { 0.0 }
        };
        let direction = Vec2::new(axis(0), axis(1));
        if direction.length_squared() > 1.0 {
            direction.normalize()
        } else {
            direction
        }
    }
}

impl Ability for Locomotion {
    fn base(&self) -> &AbilityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut AbilityBase {
        &mut self.base
    }

    fn name(&self) -> &'static str {
        "locomotion"
    }

    fn is_concurrent(&self) -> bool {
        true
    }

    fn update_animator(&mut self, ctx: &mut AbilityContext) {
        self.direction = self.read_direction(ctx);
        ctx.animator.set_float(SPEED_PARAM, self.direction.length());
    }

    fn update_rotation(&mut self, ctx: &mut AbilityContext) {
        if self.direction != Vec2::ZERO {
            let facing = Quat::from_rotation_y(self.direction.x.atan2(self.direction.y));
            ctx.motion.rotation = facing * ctx.transform.rotation.inverse();
        }
    }

    fn update_position(&mut self, ctx: &mut AbilityContext) {
        let step = self.direction * self.speed * ctx.time.delta;
        ctx.motion.translation.x += step.x;
        ctx.motion.translation.z += step.y;
    }
}
