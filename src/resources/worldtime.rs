//! Simulation clock shared by every actor.
use bevy_ecs::prelude::Resource;

/// Scaled simulation time, advanced once per tick by
/// [`update_world_time`](crate::systems::time::update_world_time).
#[derive(Resource, Debug, Clone, Copy)]
pub struct WorldTime {
    /// Seconds elapsed since the world was created (scaled).
    pub elapsed: f32,
    /// Scaled delta of the current tick.
    pub delta: f32,
    pub time_scale: f32,
    /// Number of ticks processed so far.
    pub frame_count: u64,
}

impl Default for WorldTime {
    fn default() -> Self {
        WorldTime {
            elapsed: 0.0,
            delta: 0.0,
            time_scale: 1.0,
            frame_count: 0,
        }
    }
}

impl WorldTime {
    /// Seconds since `since`, or `None` if there is no start stamp.
    pub fn since(&self, since: Option<f32>) -> Option<f32> {
        since.map(|t| self.elapsed - t)
    }
}
