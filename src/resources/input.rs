//! Per-frame input resource.
//!
//! Raw device polling is done elsewhere: whatever owns the device writes the
//! raw level of each named channel with [`InputState::set_button`] /
//! [`InputState::set_axis`], and
//! [`update_input_state`](crate::systems::input::update_input_state) turns
//! those samples into edges, hold times and double presses once per tick.
//!
//! Abilities never see [`InputState`] directly; they query it through the
//! [`InputSource`] trait, which is a pure function of the current frame.
use bevy_ecs::prelude::*;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

/// Default window between two presses to count as a double press, seconds.
pub const DEFAULT_DOUBLE_PRESS_WINDOW: f32 = 0.3;
/// Default maximum press length that still counts as a tap, seconds.
pub const DEFAULT_TAP_WINDOW: f32 = 0.2;

/// Read-only view of the current frame's input, as consumed by abilities.
///
/// Unknown channels read as released with a zero axis.
pub trait InputSource {
    /// Whether the channel is held this frame.
    fn is_down(&self, channel: &str) -> bool;
    /// Whether the channel went down this frame.
    fn just_pressed(&self, channel: &str) -> bool;
    /// Whether the channel went up this frame.
    fn just_released(&self, channel: &str) -> bool;
    /// Seconds the channel has been held; zero while released.
    fn held_duration(&self, channel: &str) -> f32;
    /// Length of the most recently completed press.
    fn last_press_duration(&self, channel: &str) -> f32;
    /// Whether this frame's press completed a double press.
    fn double_pressed(&self, channel: &str) -> bool;
    /// Whether this frame's release completed a quick tap.
    fn tapped(&self, channel: &str) -> bool;
    /// Raw axis value.
    fn axis(&self, channel: &str) -> f32;
}

#[derive(Debug, Clone, Copy, Default)]
/// Button state for one named channel.
pub struct ButtonState {
    /// Raw level written by the device layer, applied on the next update.
    pub raw: bool,
    /// Whether the button is held this frame.
    pub active: bool,
    /// Whether the button was just pressed this frame.
    pub just_pressed: bool,
    /// Whether the button was just released this frame.
    pub just_released: bool,
    /// Whether this frame's press followed another within the double press window.
    pub double_pressed: bool,
    /// Seconds held so far (zero when released).
    pub held_time: f32,
    /// Duration of the last completed press.
    pub last_press_duration: f32,
    /// Time of the last press that can still start a double press.
    pub last_press_at: Option<f32>,
}

/// Resource capturing the per-frame state of every named input channel.
#[derive(Resource, Debug, Clone)]
pub struct InputState {
    pub buttons: FxHashMap<String, ButtonState>,
    pub axes: FxHashMap<String, f32>,
    pub double_press_window: f32,
    pub tap_window: f32,
}

impl Default for InputState {
    fn default() -> Self {
        Self {
            buttons: FxHashMap::default(),
            axes: FxHashMap::default(),
            double_press_window: DEFAULT_DOUBLE_PRESS_WINDOW,
            tap_window: DEFAULT_TAP_WINDOW,
        }
    }
}

impl InputState {
    /// Create an input state with custom timing windows.
    pub fn with_windows(double_press_window: f32, tap_window: f32) -> Self {
        Self {
            double_press_window,
            tap_window,
            ..Self::default()
        }
    }

    /// Write the raw level of a button channel.
    pub fn set_button(&mut self, channel: impl Into<String>, down: bool) {
        self.buttons.entry(channel.into()).or_default().raw = down;
    }

    /// Write the raw value of an axis channel.
    pub fn set_axis(&mut self, channel: impl Into<String>, value: f32) {
        self.axes.insert(channel.into(), value);
    }

    /// Release every button and zero every axis on the next update.
    pub fn release_all(&mut self) {
        for button in self.buttons.values_mut() {
            button.raw = false;
        }
        for value in self.axes.values_mut() {
            *value = 0.0;
        }
    }

    /// Apply raw samples for the frame at time `now`.
    ///
    /// Returns the channels whose level changed, with `true` for presses.
    pub fn advance(&mut self, now: f32, delta: f32) -> SmallVec<[(String, bool); 4]> {
        let mut edges = SmallVec::new();
        for (name, button) in self.buttons.iter_mut() {
            let was_active = button.active;
            button.active = button.raw;
            button.just_pressed = !was_active && button.active;
            button.just_released = was_active && !button.active;
            button.double_pressed = false;

            if button.just_pressed {
                button.held_time = 0.0;
                match button.last_press_at {
                    Some(previous) if now - previous <= self.double_press_window => {
                        button.double_pressed = true;
                        // A third press starts a new pair.
                        button.last_press_at = None;
                    }
                    _ => button.last_press_at = Some(now),
                }
                edges.push((name.clone(), true));
            } else if button.active {
                button.held_time += delta;
            }

            if button.just_released {
                button.last_press_duration = button.held_time;
                button.held_time = 0.0;
                edges.push((name.clone(), false));
            }
        }
        edges
    }

    fn button(&self, channel: &str) -> Option<&ButtonState> {
        self.buttons.get(channel)
    }
}

impl InputSource for InputState {
    fn is_down(&self, channel: &str) -> bool {
        self.button(channel).map(|b| b.active).unwrap_or(false)
    }

    fn just_pressed(&self, channel: &str) -> bool {
        self.button(channel).map(|b| b.just_pressed).unwrap_or(false)
    }

    fn just_released(&self, channel: &str) -> bool {
        self.button(channel).map(|b| b.just_released).unwrap_or(false)
    }

    fn held_duration(&self, channel: &str) -> f32 {
        self.button(channel).map(|b| b.held_time).unwrap_or(0.0)
    }

    fn last_press_duration(&self, channel: &str) -> f32 {
        self.button(channel)
            .map(|b| b.last_press_duration)
            .unwrap_or(0.0)
    }

    fn double_pressed(&self, channel: &str) -> bool {
        self.button(channel).map(|b| b.double_pressed).unwrap_or(false)
    }

    fn tapped(&self, channel: &str) -> bool {
        self.button(channel)
            .map(|b| b.just_released && b.last_press_duration <= self.tap_window)
            .unwrap_or(false)
    }

    fn axis(&self, channel: &str) -> f32 {
        self.axes.get(channel).copied().unwrap_or(0.0)
    }
}
