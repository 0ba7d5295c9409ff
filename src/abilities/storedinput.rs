//! Bounded history of recent button presses.
//!
//! Game code reads it through `Abilities::first::<StoredInput>()` and
//! [`StoredInput::pressed_within`] to accept a press that arrived slightly
//! early. Presses are recorded whether or not the ability is active.

use std::collections::VecDeque;

use crate::abilities::base_from_config;
use crate::components::ability::{Ability, AbilityBase, AbilityContext};
use crate::components::inputgate::{StartTrigger, StopTrigger};
use crate::resources::actorconfig::AbilityConfig;

const DEFAULT_CAPACITY: usize = 8;

/// One recorded press.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredPress {
    pub channel: String,
    pub time: f32,
}

#[derive(Debug)]
pub struct StoredInput {
    base: AbilityBase,
    capacity: usize,
    history: VecDeque<StoredPress>,
    last_frame: Option<u64>,
}

impl Default for StoredInput {
    fn default() -> Self {
        Self::from_config(&AbilityConfig::named("stored_input"))
    }
}

impl StoredInput {
    pub fn from_config(config: &AbilityConfig) -> Self {
        let capacity = config.param("capacity", DEFAULT_CAPACITY as f32).max(1.0) as usize;
        Self {
            base: base_from_config(
                config,
                StartTrigger::Automatic,
                StopTrigger::Manual,
                &["jump", "crouch", "sprint"],
            ),
            capacity,
            history: VecDeque::with_capacity(capacity),
            last_frame: None,
        }
    }

    /// Oldest first.
    pub fn history(&self) -> impl Iterator<Item = &StoredPress> {
        self.history.iter()
    }

    /// Whether `channel` was pressed no earlier than `window` seconds before `now`.
    pub fn pressed_within(&self, channel: &str, window: f32, now: f32) -> bool {
        self.history
            .iter()
            .rev()
            .take_while(|p| now - p.time <= window)
            .any(|p| p.channel == channel)
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }

    fn record(&mut self, ctx: &AbilityContext) {
        if self.last_frame == Some(ctx.time.frame_count) {
            return;
        }
        self.last_frame = Some(ctx.time.frame_count);
        for binding in self.base.gate.channels() {
            if ctx.input.just_pressed(&binding.name) {
                if self.history.len() == self.capacity {
                    self.history.pop_front();
                }
                self.history.push_back(StoredPress {
                    channel: binding.name.clone(),
                    time: ctx.time.elapsed,
                });
            }
        }
    }
}

impl Ability for StoredInput {
    fn base(&self) -> &AbilityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut AbilityBase {
        &mut self.base
    }

    fn name(&self) -> &'static str {
        "stored_input"
    }

    fn is_concurrent(&self) -> bool {
        true
    }

    fn should_check_input(&self, _channel: usize) -> bool {
        false
    }

    fn inactive_update(&mut self, ctx: &mut AbilityContext) {
        self.record(ctx);
    }

    fn late_update(&mut self, ctx: &mut AbilityContext) {
        self.record(ctx);
    }

    fn on_destroy(&mut self) {
        self.history.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abilities::test_support::Frame;
    use crate::components::abilities::Abilities;

    fn tap(frame: &mut Frame, abilities: &mut Abilities, channel: &str) {
        frame.button(channel, true);
        frame.step(abilities);
        frame.button(channel, false);
        frame.step(abilities);
    }

    #[test]
    fn test_records_presses_in_order() {
        let mut abilities = Abilities::new().with(StoredInput::default());
        let mut frame = Frame::new();
        tap(&mut frame, &mut abilities, "jump");
        tap(&mut frame, &mut abilities, "crouch");
        tap(&mut frame, &mut abilities, "dash");

        let stored = abilities.first::<StoredInput>().unwrap();
        let channels: Vec<_> = stored.history().map(|p| p.channel.as_str()).collect();
        assert_eq!(channels, vec!["jump", "crouch"]);
        assert!(stored.pressed_within("crouch", 0.35, frame.time.elapsed));
        assert!(!stored.pressed_within("jump", 0.35, frame.time.elapsed));
    }

    #[test]
    fn test_records_while_inactive() {
        let mut config = AbilityConfig::named("stored_input");
        config.enabled = false;
        let mut abilities = Abilities::new().with(StoredInput::from_config(&config));
        let mut frame = Frame::new();
        tap(&mut frame, &mut abilities, "sprint");
        assert!(!abilities.is_active(0));
        assert_eq!(abilities.first::<StoredInput>().map(|s| s.history().count()), Some(1));
    }

    #[test]
    fn test_history_is_bounded() {
        let config = AbilityConfig::named("stored_input").with_param("capacity", 2.0);
        let mut abilities = Abilities::new().with(StoredInput::from_config(&config));
        let mut frame = Frame::new();
        for _ in 0..4 {
            tap(&mut frame, &mut abilities, "jump");
        }
        assert_eq!(abilities.first::<StoredInput>().map(|s| s.history().count()), Some(2));
    }
}
