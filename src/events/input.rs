//! Input channel events.
//!
//! [`InputEvent`] is triggered by
//! [`update_input_state`](crate::systems::input::update_input_state) whenever a
//! named button channel is pressed or released. Observers can react to input
//! without reading the [`InputState`](crate::resources::input::InputState)
//! resource.

use bevy_ecs::prelude::*;

/// Event emitted when an input channel is pressed or released.
#[derive(Event, Debug, Clone)]
pub struct InputEvent {
    /// Name of the channel, as bound in ability configuration.
    pub channel: String,
    /// Whether the channel was pressed (true) or released (false).
    pub pressed: bool,
}
