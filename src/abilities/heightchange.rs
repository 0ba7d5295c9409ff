//! Crouching.
//!
//! Active while the crouch button is held. Writes the reduced capsule height
//! to the animator and slows horizontal movement.

use crate::abilities::base_from_config;
use crate::components::ability::{Ability, AbilityBase, AbilityContext};
use crate::components::inputgate::{StartTrigger, StopTrigger};
use crate::resources::actorconfig::AbilityConfig;

pub const HEIGHT_CHANGE_ANIMATOR_INDEX: i32 = 3;
pub const HEIGHT_PARAM: &str = "height";
const DEFAULT_HEIGHT: f32 = 0.5;
const DEFAULT_SPEED_MULTIPLIER: f32 = 0.5;

#[derive(Debug)]
pub struct HeightChange {
    base: AbilityBase,
    animator_index: i32,
    /// Height relative to standing.
    pub height: f32,
    pub speed_multiplier: f32,
}

impl Default for HeightChange {
    fn default() -> Self {
        Self::from_config(&AbilityConfig::named("crouch"))
    }
}

impl HeightChange {
    pub fn from_config(config: &AbilityConfig) -> Self {
        Self {
            base: base_from_config(
                config,
                StartTrigger::ButtonDownContinuous,
                StopTrigger::ButtonUp,
                &["crouch"],
            ),
            animator_index: config.param("animator_index", HEIGHT_CHANGE_ANIMATOR_INDEX as f32) as i32,
            height: config.param("height", DEFAULT_HEIGHT),
            speed_multiplier: config.param("speed_multiplier", DEFAULT_SPEED_MULTIPLIER),
        }
    }
}

impl Ability for HeightChange {
    fn base(&self) -> &AbilityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut AbilityBase {
        &mut self.base
    }

    fn name(&self) -> &'static str {
        "height_change"
    }

    fn animator_index(&self) -> Option<i32> {
        Some(self.animator_index)
    }

    fn can_start(&self, ctx: &AbilityContext) -> bool {
        ctx.physics.grounded
    }

    fn on_start(&mut self, ctx: &mut AbilityContext) {
        ctx.animator.set_float(HEIGHT_PARAM, self.height);
    }

    fn on_stop(&mut self, ctx: &mut AbilityContext, _force: bool) {
        ctx.animator.set_float(HEIGHT_PARAM, 1.0);
    }

    fn apply_position(&mut self, ctx: &mut AbilityContext) {
        ctx.motion.scale_horizontal(self.speed_multiplier);
    }
}
