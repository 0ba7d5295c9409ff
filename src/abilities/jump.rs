//! Jumping.
//!
//! Applies a vertical impulse on start and integrates its own vertical
//! velocity while airborne. Stops automatically once the actor is back on the
//! ground after a minimum air time. Crouching is neither allowed to start
//! during a jump nor kept running when one begins.

use crate::abilities::base_from_config;
use crate::abilities::heightchange::HeightChange;
use crate::components::ability::{Ability, AbilityBase, AbilityContext};
use crate::components::inputgate::{StartTrigger, StopTrigger};
use crate::resources::actorconfig::AbilityConfig;

pub const JUMP_ANIMATOR_INDEX: i32 = 2;
const DEFAULT_FORCE: f32 = 6.0;
const DEFAULT_GRAVITY: f32 = -15.0;
const DEFAULT_MIN_AIR_TIME: f32 = 0.15;

#[derive(Debug)]
pub struct Jump {
    base: AbilityBase,
    animator_index: i32,
    /// Initial upward velocity, units per second.
    pub force: f32,
    pub gravity: f32,
    /// Landing is ignored until the jump has lasted this long.
    pub min_air_time: f32,
    vertical_velocity: f32,
    air_time: f32,
}

impl Default for Jump {
    fn default() -> Self {
        Self::from_config(&AbilityConfig::named("jump"))
    }
}

impl Jump {
    pub fn from_config(config: &AbilityConfig) -> Self {
        Self {
            base: base_from_config(config, StartTrigger::ButtonDown, StopTrigger::Automatic, &["jump"]),
            animator_index: config.param("animator_index", JUMP_ANIMATOR_INDEX as f32) as i32,
            force: config.param("force", DEFAULT_FORCE),
            gravity: config.param("gravity", DEFAULT_GRAVITY),
            min_air_time: config.param("min_air_time", DEFAULT_MIN_AIR_TIME),
            vertical_velocity: 0.0,
            air_time: 0.0,
        }
    }

    pub fn vertical_velocity(&self) -> f32 {
        self.vertical_velocity
    }
}

impl Ability for Jump {
    fn base(&self) -> &AbilityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut AbilityBase {
        &mut self.base
    }

    fn name(&self) -> &'static str {
        "jump"
    }

    fn animator_index(&self) -> Option<i32> {
        Some(self.animator_index)
    }

    fn can_start(&self, ctx: &AbilityContext) -> bool {
        ctx.physics.grounded
    }

    fn should_block_start(&self, candidate: &dyn Ability) -> bool {
        candidate.is::<HeightChange>()
    }

    fn should_stop_active_ability(&self, active: &dyn Ability) -> bool {
        active.is::<HeightChange>()
    }

    fn on_start(&mut self, ctx: &mut AbilityContext) {
        self.vertical_velocity = self.force;
        self.air_time = 0.0;
        ctx.animator.set_trigger("jump");
    }

    fn can_stop(&self, ctx: &AbilityContext) -> bool {
        self.air_time >= self.min_air_time && ctx.physics.grounded && self.vertical_velocity <= 0.0
    }

    fn on_stop(&mut self, ctx: &mut AbilityContext, _force: bool) {
        self.vertical_velocity = 0.0;
        self.air_time = 0.0;
        ctx.animator.set_float("vertical_velocity", 0.0);
    }

    fn update_animator(&mut self, ctx: &mut AbilityContext) {
        ctx.animator.set_float("vertical_velocity", self.vertical_velocity);
    }

    fn update_position(&mut self, ctx: &mut AbilityContext) {
        let dt = ctx.time.delta;
        self.air_time += dt;
        self.vertical_velocity += self.gravity * dt;
        ctx.motion.translation.y += self.vertical_velocity * dt;
        ctx.motion.use_gravity = false;
    }

    fn sync_data(&self) -> Option<Vec<u8>> {
        Some(self.vertical_velocity.to_le_bytes().to_vec())
    }

    fn apply_sync_data(&mut self, data: &[u8]) {
        if let Ok(bytes) = <[u8; 4]>::try_from(data) {
            self.vertical_velocity = f32::from_le_bytes(bytes);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abilities::test_support::Frame;
    use crate::components::abilities::Abilities;

    #[test]
    fn test_jump_needs_ground() {
        let mut abilities = Abilities::new().with(Jump::default());
        let mut frame = Frame::new();
        frame.physics.grounded = false;
        frame.button("jump", true);
        frame.step(&mut abilities);
        assert!(!abilities.is_active(0));
    }

    #[test]
    fn test_jump_proposes_upward_motion() {
        let mut abilities = Abilities::new().with(Jump::default());
        let mut frame = Frame::new();
        frame.button("jump", true);
        frame.step(&mut abilities);
        assert!(abilities.is_active(0));
        assert!(frame.motion.translation.y > 0.0);
        assert!(!frame.motion.use_gravity);
        assert!(frame.animator.has_trigger("jump"));
    }

    #[test]
    fn test_jump_ends_on_landing_after_min_air_time() {
        let mut abilities = Abilities::new().with(Jump::default());
        let mut frame = Frame::new();
        frame.button("jump", true);
        frame.step(&mut abilities);

        // Still grounded on the next frame but not long enough in the air.
        frame.step(&mut abilities);
        assert!(abilities.is_active(0));

        frame.physics.grounded = false;
        for _ in 0..8 {
            frame.step(&mut abilities);
        }
        assert!(abilities.is_active(0));
        assert!(abilities.first::<Jump>().is_some_and(|j| j.vertical_velocity() < 0.0));

        frame.physics.grounded = true;
        frame.step(&mut abilities);
        assert!(!abilities.is_active(0));
    }

    #[test]
    fn test_holding_jump_does_not_rejump() {
        let mut abilities = Abilities::new().with(Jump::default());
        let mut frame = Frame::new();
        frame.button("jump", true);
        frame.step(&mut abilities);
        frame.physics.grounded = false;
        for _ in 0..8 {
            frame.step(&mut abilities);
        }
        frame.physics.grounded = true;
        frame.step(&mut abilities);
        frame.step(&mut abilities);
        assert!(!abilities.is_active(0));
    }

    #[test]
    fn test_press_on_landing_tick_jumps_again() {
        let mut abilities = Abilities::new().with(Jump::default());
        let mut frame = Frame::new();
        frame.button("jump", true);
        frame.step(&mut abilities);

        frame.physics.grounded = false;
        frame.button("jump", false);
        for _ in 0..8 {
            frame.step(&mut abilities);
        }
        assert!(abilities.is_active(0));

        frame.physics.grounded = true;
        frame.button("jump", true);
        frame.step(&mut abilities);
        assert!(abilities.is_active(0));
        assert_eq!(
            abilities.get(0).and_then(|a| a.base().start_time()),
            Some(frame.time.elapsed)
        );
        assert!(frame.motion.translation.y > 0.0);
    }
}
