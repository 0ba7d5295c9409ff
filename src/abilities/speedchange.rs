//! Sprinting.
//!
//! Runs alongside the exclusive ability while the sprint button is held and
//! scales horizontal movement. With a positive `max_stamina` the sprint
//! drains stamina and stops itself when it runs out; stamina regenerates
//! while inactive and the sprint may start again once it reaches
//! `min_stamina_to_start` (half of `max_stamina` by default).

use crate::abilities::base_from_config;
use crate::components::ability::{Ability, AbilityBase, AbilityContext};
use crate::components::inputgate::{StartTrigger, StopTrigger};
use crate::resources::actorconfig::AbilityConfig;

pub const SPEED_MULTIPLIER_PARAM: &str = "speed_multiplier";
const DEFAULT_MULTIPLIER: f32 = 1.6;
const DEFAULT_DRAIN: f32 = 1.0;
const DEFAULT_REGEN: f32 = 0.5;
const DEFAULT_RECOVERY_FRACTION: f32 = 0.5;

#[derive(Debug)]
pub struct SpeedChange {
    base: AbilityBase,
    pub multiplier: f32,
    /// Zero means unlimited.
    pub max_stamina: f32,
    /// Stamina used per second of sprinting.
    pub drain: f32,
    /// Stamina recovered per second while not sprinting.
    pub regen: f32,
    pub min_stamina_to_start: f32,
    stamina: f32,
}

impl Default for SpeedChange {
    fn default() -> Self {
        Self::from_config(&AbilityConfig::named("speed_change"))
    }
}

impl SpeedChange {
    pub fn from_config(config: &AbilityConfig) -> Self {
        let max_stamina = config.param("max_stamina", 0.0).max(0.0);
        Self {
            base: base_from_config(
                config,
                StartTrigger::ButtonDownContinuous,
                StopTrigger::ButtonUp,
                &["sprint"],
            ),
            multiplier: config.param("multiplier", DEFAULT_MULTIPLIER),
            max_stamina,
            drain: config.param("drain", DEFAULT_DRAIN),
            regen: config.param("regen", DEFAULT_REGEN),
            min_stamina_to_start: config
                .param("min_stamina_to_start", max_stamina * DEFAULT_RECOVERY_FRACTION)
                .clamp(0.0, max_stamina),
            stamina: max_stamina,
        }
    }

    pub fn stamina(&self) -> f32 {
        self.stamina
    }

    fn limited(&self) -> bool {
        self.max_stamina > 0.0
    }
}

impl Ability for SpeedChange {
    fn base(&self) -> &AbilityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut AbilityBase {
        &mut self.base
    }

    fn name(&self) -> &'static str {
        "speed_change"
    }

    fn is_concurrent(&self) -> bool {
        true
    }

    fn can_start(&self, _ctx: &AbilityContext) -> bool {
        !self.limited() || (self.stamina > 0.0 && self.stamina >= self.min_stamina_to_start)
    }

    fn on_start(&mut self, ctx: &mut AbilityContext) {
        ctx.animator.set_float(SPEED_MULTIPLIER_PARAM, self.multiplier);
    }

    fn on_stop(&mut self, ctx: &mut AbilityContext, _force: bool) {
        ctx.animator.set_float(SPEED_MULTIPLIER_PARAM, 1.0);
    }

    fn inactive_update(&mut self, ctx: &mut AbilityContext) {
        if self.limited() {
            self.stamina = (self.stamina + self.regen * ctx.time.delta).min(self.max_stamina);
        }
    }

    fn apply_position(&mut self, ctx: &mut AbilityContext) {
        ctx.motion.scale_horizontal(self.multiplier);
    }

    fn late_update(&mut self, ctx: &mut AbilityContext) {
        if !self.limited() {
            return;
        }
        self.stamina = (self.stamina - self.drain * ctx.time.delta).max(0.0);
        if self.stamina <= 0.0 {
            ctx.requests.stop(self.base.index());
        }
    }

    fn sync_data(&self) -> Option<Vec<u8>> {
        self.limited().then(|| self.stamina.to_le_bytes().to_vec())
    }

    fn apply_sync_data(&mut self, data: &[u8]) {
        if let Ok(bytes) = <[u8; 4]>::try_from(data) {
            self.stamina = f32::from_le_bytes(bytes).clamp(0.0, self.max_stamina);
        }
    }
}
