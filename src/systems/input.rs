//! Input systems.
//!
//! - [`update_input_state`] applies the raw samples written into
//!   [`InputState`] for this tick and triggers an [`InputEvent`] for every
//!   press or release.
use bevy_ecs::prelude::*;

use crate::events::input::InputEvent;
use crate::resources::input::InputState;
use crate::resources::worldtime::WorldTime;

/// Derive edges, hold times and double presses for the current tick.
pub fn update_input_state(
    mut input: ResMut<InputState>,
    time: Res<WorldTime>,
    mut commands: Commands,
) {
    let edges = input.advance(time.elapsed, time.delta);
    for (channel, pressed) in edges {
        commands.trigger(InputEvent { channel, pressed });
    }
}
