//! Death.
//!
//! Starts when the actor receives [`ActorEvent::Died`] and stops on
//! [`ActorEvent::Respawned`]. While active it blocks every lower-precedence
//! exclusive ability and pins the actor in place. Starting it force stops
//! everything that is running.

use log::info;

use crate::abilities::base_from_config;
use crate::components::ability::{Ability, AbilityBase, AbilityContext, AbilityRequests};
use crate::components::inputgate::{StartTrigger, StopTrigger};
use crate::events::actor::{ActorEvent, ActorEventKind};
use crate::resources::actorconfig::AbilityConfig;

pub const DIE_ANIMATOR_INDEX: i32 = 1;

#[derive(Debug)]
pub struct Die {
    base: AbilityBase,
    animator_index: i32,
    deaths: u32,
}

impl Default for Die {
    fn default() -> Self {
        Self::from_config(&AbilityConfig::named("die"))
    }
}

impl Die {
    pub fn from_config(config: &AbilityConfig) -> Self {
        Self {
            base: base_from_config(config, StartTrigger::Manual, StopTrigger::Manual, &[]),
            animator_index: config.param("animator_index", DIE_ANIMATOR_INDEX as f32) as i32,
            deaths: 0,
        }
    }

    /// Number of times this actor died.
    pub fn deaths(&self) -> u32 {
        self.deaths
    }
}

impl Ability for Die {
    fn base(&self) -> &AbilityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut AbilityBase {
        &mut self.base
    }

    fn name(&self) -> &'static str {
        "die"
    }

    fn subscriptions(&self) -> &'static [ActorEventKind] {
        &[ActorEventKind::Died, ActorEventKind::Respawned]
    }

    fn animator_index(&self) -> Option<i32> {
        Some(self.animator_index)
    }

    fn should_block_start(&self, _candidate: &dyn Ability) -> bool {
        true
    }

    fn should_stop_active_ability(&self, _active: &dyn Ability) -> bool {
        true
    }

    fn on_actor_event(&mut self, event: &ActorEvent, requests: &mut AbilityRequests) {
        match event {
            ActorEvent::Died => requests.start(self.base.index()),
            ActorEvent::Respawned => requests.stop(self.base.index()),
            _ => {}
        }
    }

    fn on_start(&mut self, ctx: &mut AbilityContext) {
        self.deaths += 1;
        ctx.animator.set_trigger("die");
        info!("{:?} died ({} deaths)", ctx.entity, self.deaths);
    }

    fn on_stop(&mut self, ctx: &mut AbilityContext, _force: bool) {
        ctx.animator.set_trigger("respawn");
    }

    /// Runs after every ability has proposed and committed its position.
    fn late_update(&mut self, ctx: &mut AbilityContext) {
        ctx.motion.translation.x = 0.0;
        ctx.motion.translation.z = 0.0;
    }

    fn sync_data(&self) -> Option<Vec<u8>> {
        Some(self.deaths.to_le_bytes().to_vec())
    }

    fn apply_sync_data(&mut self, data: &[u8]) {
        if let Ok(bytes) = <[u8; 4]>::try_from(data) {
            self.deaths = u32::from_le_bytes(bytes);
        }
    }
}
