//! Input gating for abilities.
//!
//! An [`InputGate`] turns the current frame of an
//! [`InputSource`](crate::resources::input::InputSource) into two answers:
//! "may this ability try to start?" and "may this ability try to stop?". The
//! answer depends on the configured [`StartTrigger`] / [`StopTrigger`] and on
//! a small amount of per-channel state:
//!
//! - `released_since_trigger` - a latch that edge-triggered kinds require to be
//!   set. It is re-armed whenever the channel is seen released and consumed
//!   when the ability actually starts or stops on that channel. Holding a
//!   button therefore never triggers twice.
//! - toggle tracking for [`StopTrigger::ButtonToggle`]: once the ability is
//!   active, a release of the channel arms it and the next press fires.
//!
//! The gate is a standalone value owned by each ability's
//! [`AbilityBase`](crate::components::ability::AbilityBase); the arbitration
//! engine calls [`InputGate::reset_edges`] once per tick before evaluating.

use std::fmt;
use std::str::FromStr;

use arrayvec::ArrayVec;
use serde::{Deserialize, Serialize};

use crate::error::AbilityError;
use crate::resources::input::InputSource;

/// Maximum number of input channels a single ability can bind.
pub const MAX_INPUT_CHANNELS: usize = 4;
/// Default dead zone for axis triggers.
pub const DEFAULT_AXIS_DEADZONE: f32 = 0.1;
/// Default hold time for long press triggers, seconds.
pub const DEFAULT_LONG_PRESS_DURATION: f32 = 0.5;

/// How an inactive ability becomes a start candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartTrigger {
    /// Always a candidate.
    Automatic,
    /// Only an explicit start request makes it a candidate.
    Manual,
    /// Pressed, and released since the last time it triggered.
    ButtonDown,
    /// Held, every frame.
    ButtonDownContinuous,
    DoublePress,
    /// Held for at least the configured duration.
    LongPress,
    /// Pressed and released within the tap window.
    Tap,
    /// Axis outside the dead zone.
    Axis,
    /// Decided by an injected [`StartPredicate`].
    Custom,
}

/// How an active ability becomes a stop candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopTrigger {
    /// Always a candidate; `can_stop` decides.
    Automatic,
    /// Only an explicit stop request (or a force stop).
    Manual,
    /// Channel released.
    ButtonUp,
    /// Pressed again after a release.
    ButtonDown,
    /// Press arms, release, press again fires.
    ButtonToggle,
    LongPress,
    /// Axis back inside the dead zone.
    Axis,
}

impl StartTrigger {
    /// Whether this kind reads input channels.
    pub fn needs_channel(self) -> bool {
        !matches!(
            self,
            StartTrigger::Automatic | StartTrigger::Manual | StartTrigger::Custom
        )
    }

    fn tracks_edges(self) -> bool {
        matches!(self, StartTrigger::ButtonDown | StartTrigger::LongPress)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StartTrigger::Automatic => "automatic",
            StartTrigger::Manual => "manual",
            StartTrigger::ButtonDown => "button_down",
            StartTrigger::ButtonDownContinuous => "button_down_continuous",
            StartTrigger::DoublePress => "double_press",
            StartTrigger::LongPress => "long_press",
            StartTrigger::Tap => "tap",
            StartTrigger::Axis => "axis",
            StartTrigger::Custom => "custom",
        }
    }
}

impl StopTrigger {
    /// Whether this kind reads input channels.
    pub fn needs_channel(self) -> bool {
        !matches!(self, StopTrigger::Automatic | StopTrigger::Manual)
    }

    fn tracks_edges(self) -> bool {
        matches!(
            self,
            StopTrigger::ButtonDown | StopTrigger::ButtonToggle | StopTrigger::LongPress
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StopTrigger::Automatic => "automatic",
            StopTrigger::Manual => "manual",
            StopTrigger::ButtonUp => "button_up",
            StopTrigger::ButtonDown => "button_down",
            StopTrigger::ButtonToggle => "button_toggle",
            StopTrigger::LongPress => "long_press",
            StopTrigger::Axis => "axis",
        }
    }
}

impl fmt::Display for StartTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for StopTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StartTrigger {
    type Err = AbilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s.trim().to_ascii_lowercase().as_str() {
            "automatic" => StartTrigger::Automatic,
            "manual" => StartTrigger::Manual,
            "button_down" => StartTrigger::ButtonDown,
            "button_down_continuous" => StartTrigger::ButtonDownContinuous,
            "double_press" => StartTrigger::DoublePress,
            "long_press" => StartTrigger::LongPress,
            "tap" => StartTrigger::Tap,
            "axis" => StartTrigger::Axis,
            "custom" => StartTrigger::Custom,
            other => return Err(AbilityError::UnknownTrigger(other.to_string())),
        };
        Ok(kind)
    }
}

impl FromStr for StopTrigger {
    type Err = AbilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s.trim().to_ascii_lowercase().as_str() {
            "automatic" => StopTrigger::Automatic,
            "manual" => StopTrigger::Manual,
            "button_up" => StopTrigger::ButtonUp,
            "button_down" => StopTrigger::ButtonDown,
            "button_toggle" => StopTrigger::ButtonToggle,
            "long_press" => StopTrigger::LongPress,
            "axis" => StopTrigger::Axis,
            other => return Err(AbilityError::UnknownTrigger(other.to_string())),
        };
        Ok(kind)
    }
}

/// Start predicate injected for [`StartTrigger::Custom`].
pub trait StartPredicate: Send + Sync {
    fn can_start(&self, input: &dyn InputSource) -> bool;
}

impl<F> StartPredicate for F
where
    F: Fn(&dyn InputSource) -> bool + Send + Sync,
{
    fn can_start(&self, input: &dyn InputSource) -> bool {
        self(input)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum TogglePhase {
    #[default]
    Idle,
    Released,
}

/// One bound input channel and its edge-tracking state.
#[derive(Debug, Clone)]
pub struct ChannelBinding {
    pub name: String,
    pub released_since_trigger: bool,
    toggle: TogglePhase,
}

impl ChannelBinding {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            released_since_trigger: true,
            toggle: TogglePhase::Idle,
        }
    }
}

/// Numeric tunables shared by the trigger kinds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateSettings {
    pub long_press_duration: f32,
    /// Long press fires on release instead of as soon as the duration is reached.
    pub wait_for_long_press_release: bool,
    pub axis_deadzone: f32,
}

impl Default for GateSettings {
    fn default() -> Self {
        Self {
            long_press_duration: DEFAULT_LONG_PRESS_DURATION,
            wait_for_long_press_release: false,
            axis_deadzone: DEFAULT_AXIS_DEADZONE,
        }
    }
}

/// Per-ability input state machine.
pub struct InputGate {
    pub start_trigger: StartTrigger,
    pub stop_trigger: StopTrigger,
    pub settings: GateSettings,
    channels: ArrayVec<ChannelBinding, MAX_INPUT_CHANNELS>,
    requested_channels: usize,
    custom: Option<Box<dyn StartPredicate>>,
}

impl Default for InputGate {
    fn default() -> Self {
        Self::new(StartTrigger::Manual, StopTrigger::Manual)
    }
}

impl InputGate {
    pub fn new(start_trigger: StartTrigger, stop_trigger: StopTrigger) -> Self {
        Self {
            start_trigger,
            stop_trigger,
            settings: GateSettings::default(),
            channels: ArrayVec::new(),
            requested_channels: 0,
            custom: None,
        }
    }

    /// Bind another input channel (builder pattern).
    ///
    /// Channels past [`MAX_INPUT_CHANNELS`] are dropped and reported by
    /// [`InputGate::validate`].
    pub fn with_channel(mut self, name: impl Into<String>) -> Self {
        self.bind(name);
        self
    }

    pub fn with_settings(mut self, settings: GateSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Install the predicate used by [`StartTrigger::Custom`].
    pub fn with_custom(mut self, predicate: impl StartPredicate + 'static) -> Self {
        self.custom = Some(Box::new(predicate));
        self
    }

    pub fn bind(&mut self, name: impl Into<String>) {
        self.requested_channels += 1;
        let _ = self.channels.try_push(ChannelBinding::new(name));
    }

    pub fn channels(&self) -> &[ChannelBinding] {
        &self.channels
    }

    pub fn channel_name(&self, index: usize) -> Option<&str> {
        self.channels.get(index).map(|c| c.name.as_str())
    }

    /// Check the trigger kinds against the bound channels.
    pub fn validate(&self, ability: &str) -> Result<(), AbilityError> {
        if self.requested_channels > MAX_INPUT_CHANNELS {
            return Err(AbilityError::TooManyChannels {
                ability: ability.to_string(),
                channels: self.requested_channels,
            });
        }
        if self.start_trigger.needs_channel() && self.channels.is_empty() {
            return Err(AbilityError::ChannelCountMismatch {
                ability: ability.to_string(),
                trigger: self.start_trigger.to_string(),
                channels: 0,
            });
        }
        if self.stop_trigger.needs_channel() && self.channels.is_empty() {
            return Err(AbilityError::ChannelCountMismatch {
                ability: ability.to_string(),
                trigger: self.stop_trigger.to_string(),
                channels: 0,
            });
        }
        if self.start_trigger == StartTrigger::Custom && self.custom.is_none() {
            return Err(AbilityError::MissingCustomPredicate(ability.to_string()));
        }
        Ok(())
    }

    /// Refresh the per-channel latches for this tick.
    ///
    /// `should_check(channel)` returning false leaves that channel untouched
    /// for the frame. When neither trigger kind tracks edges every latch is
    /// forced to released. Toggle tracking only advances while `active`.
    pub fn reset_edges(
        &mut self,
        input: &dyn InputSource,
        active: bool,
        should_check: impl Fn(usize) -> bool,
    ) {
        let tracks_edges = self.start_trigger.tracks_edges() || self.stop_trigger.tracks_edges();
        let toggles = active && self.stop_trigger == StopTrigger::ButtonToggle;

        for (index, channel) in self.channels.iter_mut().enumerate() {
            if !tracks_edges {
                channel.released_since_trigger = true;
                continue;
            }
            if !should_check(index) {
                continue;
            }
            let down = input.is_down(&channel.name);
            if !down {
                channel.released_since_trigger = true;
            }
            if toggles {
                if !down {
                    channel.toggle = TogglePhase::Released;
                }
            }
        }
    }

    /// Channel that makes the ability a start candidate this frame.
    ///
    /// Kinds that read no channel report channel 0.
    pub fn evaluate_start(&self, input: &dyn InputSource) -> Option<usize> {
        match self.start_trigger {
            StartTrigger::Automatic => Some(0),
            StartTrigger::Manual => None,
            StartTrigger::Custom => self
                .custom
                .as_ref()
                .filter(|predicate| predicate.can_start(input))
                .map(|_| 0),
            StartTrigger::ButtonDown => {
                self.find(|c| c.released_since_trigger && input.is_down(&c.name))
            }
            StartTrigger::ButtonDownContinuous => self.find(|c| input.is_down(&c.name)),
            StartTrigger::DoublePress => self.find(|c| input.double_pressed(&c.name)),
            StartTrigger::LongPress => self.find(|c| self.long_pressed(c, input)),
            StartTrigger::Tap => self.find(|c| input.tapped(&c.name)),
            StartTrigger::Axis => {
                self.find(|c| input.axis(&c.name).abs() > self.settings.axis_deadzone)
            }
        }
    }

    /// Channel that makes the ability a stop candidate this frame.
    pub fn evaluate_stop(&self, input: &dyn InputSource) -> Option<usize> {
        match self.stop_trigger {
            StopTrigger::Automatic => Some(0),
            StopTrigger::Manual => None,
            StopTrigger::ButtonUp => self.find(|c| !input.is_down(&c.name)),
            StopTrigger::ButtonDown => {
                self.find(|c| c.released_since_trigger && input.is_down(&c.name))
            }
            StopTrigger::ButtonToggle => {
                self.find(|c| c.toggle == TogglePhase::Released && input.is_down(&c.name))
            }
            StopTrigger::LongPress => self.find(|c| self.long_pressed(c, input)),
            StopTrigger::Axis => {
                self.find(|c| input.axis(&c.name).abs() <= self.settings.axis_deadzone)
            }
        }
    }

    /// The ability started or stopped on `channel`; require a release before
    /// the channel can trigger again.
    pub fn consume(&mut self, channel: usize) {
        if let Some(binding) = self.channels.get_mut(channel) {
            binding.released_since_trigger = false;
        }
    }

    /// Forget toggle progress; called on every start and stop commit.
    pub fn reset_toggles(&mut self) {
        for channel in self.channels.iter_mut() {
            channel.toggle = TogglePhase::Idle;
        }
    }

    fn long_pressed(&self, channel: &ChannelBinding, input: &dyn InputSource) -> bool {
        let duration = self.settings.long_press_duration;
        if self.settings.wait_for_long_press_release {
            input.just_released(&channel.name) && input.last_press_duration(&channel.name) >= duration
        } else {
            channel.released_since_trigger && input.held_duration(&channel.name) >= duration
        }
    }

    fn find(&self, predicate: impl Fn(&ChannelBinding) -> bool) -> Option<usize> {
        self.channels.iter().position(predicate)
    }
}

impl fmt::Debug for InputGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputGate")
            .field("start_trigger", &self.start_trigger)
            .field("stop_trigger", &self.stop_trigger)
            .field("settings", &self.settings)
            .field("channels", &self.channels)
            .field("custom", &self.custom.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::input::InputState;

    const DT: f32 = 0.1;

    struct Driver {
        input: InputState,
        frame: u32,
    }

    impl Driver {
        fn new() -> Self {
            Self {
                input: InputState::default(),
                frame: 0,
            }
        }

        fn frame(&mut self, gate: &mut InputGate, active: bool, channel: &str, down: bool) {
            self.input.set_button(channel, down);
            self.input.advance(self.frame as f32 * DT, DT);
            self.frame += 1;
            gate.reset_edges(&self.input, active, |_| true);
        }
    }

    #[test]
    fn test_automatic_and_manual_start() {
        let input = InputState::default();
        let automatic = InputGate::new(StartTrigger::Automatic, StopTrigger::Manual);
        let manual = InputGate::new(StartTrigger::Manual, StopTrigger::Manual);
        assert_eq!(automatic.evaluate_start(&input), Some(0));
        assert_eq!(manual.evaluate_start(&input), None);
        assert_eq!(manual.evaluate_stop(&input), None);
    }

    #[test]
    fn test_button_down_requires_release_after_consume() {
        let mut gate =
            InputGate::new(StartTrigger::ButtonDown, StopTrigger::Automatic).with_channel("jump");
        let mut driver = Driver::new();

        driver.frame(&mut gate, false, "jump", true);
        assert_eq!(gate.evaluate_start(&driver.input), Some(0));
        gate.consume(0);

        // Held: never triggers again.
        driver.frame(&mut gate, false, "jump", true);
        assert_eq!(gate.evaluate_start(&driver.input), None);

        driver.frame(&mut gate, false, "jump", false);
        assert_eq!(gate.evaluate_start(&driver.input), None);
        driver.frame(&mut gate, false, "jump", true);
        assert_eq!(gate.evaluate_start(&driver.input), Some(0));
    }

    #[test]
    fn test_button_down_continuous_level() {
        let mut gate = InputGate::new(StartTrigger::ButtonDownContinuous, StopTrigger::ButtonUp)
            .with_channel("crouch");
        let mut driver = Driver::new();
        driver.frame(&mut gate, false, "crouch", true);
        gate.consume(0);
        driver.frame(&mut gate, false, "crouch", true);
        assert_eq!(gate.evaluate_start(&driver.input), Some(0));
        assert_eq!(gate.evaluate_stop(&driver.input), None);
        driver.frame(&mut gate, true, "crouch", false);
        assert_eq!(gate.evaluate_stop(&driver.input), Some(0));
    }

    #[test]
    fn test_second_channel_reported() {
        let mut gate = InputGate::new(StartTrigger::ButtonDownContinuous, StopTrigger::Manual)
            .with_channel("a")
            .with_channel("b");
        let mut driver = Driver::new();
        driver.frame(&mut gate, false, "b", true);
        assert_eq!(gate.evaluate_start(&driver.input), Some(1));
    }

    #[test]
    fn test_toggle_needs_press_release_press() {
        let mut gate =
            InputGate::new(StartTrigger::Manual, StopTrigger::ButtonToggle).with_channel("aim");
        let mut driver = Driver::new();

        driver.frame(&mut gate, true, "aim", true);
        assert_eq!(gate.evaluate_stop(&driver.input), None);
        driver.frame(&mut gate, true, "aim", false);
        assert_eq!(gate.evaluate_stop(&driver.input), None);
        driver.frame(&mut gate, true, "aim", true);
        assert_eq!(gate.evaluate_stop(&driver.input), Some(0));

        gate.reset_toggles();
        driver.frame(&mut gate, true, "aim", true);
        assert_eq!(gate.evaluate_stop(&driver.input), None);
    }

    #[test]
    fn test_long_press_fires_after_duration() {
        let mut gate = InputGate::new(StartTrigger::LongPress, StopTrigger::Manual)
            .with_channel("use")
            .with_settings(GateSettings {
                long_press_duration: 0.25,
                ..GateSettings::default()
            });
        let mut driver = Driver::new();
        driver.frame(&mut gate, false, "use", true);
        driver.frame(&mut gate, false, "use", true);
        assert_eq!(gate.evaluate_start(&driver.input), None);
        driver.frame(&mut gate, false, "use", true);
        driver.frame(&mut gate, false, "use", true);
        assert_eq!(gate.evaluate_start(&driver.input), Some(0));
    }

    #[test]
    fn test_long_press_waiting_for_release() {
        let mut gate = InputGate::new(StartTrigger::LongPress, StopTrigger::Manual)
            .with_channel("use")
            .with_settings(GateSettings {
                long_press_duration: 0.25,
                wait_for_long_press_release: true,
                ..GateSettings::default()
            });
        let mut driver = Driver::new();
        for _ in 0..5 {
            driver.frame(&mut gate, false, "use", true);
            assert_eq!(gate.evaluate_start(&driver.input), None);
        }
        driver.frame(&mut gate, false, "use", false);
        assert_eq!(gate.evaluate_start(&driver.input), Some(0));
    }

    #[test]
    fn test_axis_start_and_stop() {
        let gate =
            InputGate::new(StartTrigger::Axis, StopTrigger::Axis).with_channel("horizontal");
        let mut input = InputState::default();
        input.set_axis("horizontal", 0.05);
        assert_eq!(gate.evaluate_start(&input), None);
        assert_eq!(gate.evaluate_stop(&input), Some(0));
        input.set_axis("horizontal", -0.8);
        assert_eq!(gate.evaluate_start(&input), Some(0));
        assert_eq!(gate.evaluate_stop(&input), None);
    }

    #[test]
    fn test_custom_predicate() {
        let gate = InputGate::new(StartTrigger::Custom, StopTrigger::Manual)
            .with_custom(|input: &dyn InputSource| input.axis("stamina") > 0.5);
        let mut input = InputState::default();
        assert_eq!(gate.evaluate_start(&input), None);
        input.set_axis("stamina", 1.0);
        assert_eq!(gate.evaluate_start(&input), Some(0));
    }

    #[test]
    fn test_suppressed_channel_keeps_latch() {
        let mut gate =
            InputGate::new(StartTrigger::ButtonDown, StopTrigger::Manual).with_channel("jump");
        let mut input = InputState::default();
        input.set_button("jump", true);
        input.advance(0.0, DT);
        gate.consume(0);
        input.set_button("jump", false);
        input.advance(DT, DT);
        gate.reset_edges(&input, false, |_| false);
        assert!(!gate.channels()[0].released_since_trigger);
        gate.reset_edges(&input, false, |_| true);
        assert!(gate.channels()[0].released_since_trigger);
    }

    #[test]
    fn test_validate_channel_mismatch() {
        let gate = InputGate::new(StartTrigger::ButtonDown, StopTrigger::Automatic);
        assert!(matches!(
            gate.validate("jump"),
            Err(AbilityError::ChannelCountMismatch { .. })
        ));
        let custom = InputGate::new(StartTrigger::Custom, StopTrigger::Manual);
        assert_eq!(
            custom.validate("x"),
            Err(AbilityError::MissingCustomPredicate("x".into()))
        );
    }

    #[test]
    fn test_validate_too_many_channels() {
        let mut gate = InputGate::new(StartTrigger::ButtonDown, StopTrigger::Manual);
        for i in 0..=MAX_INPUT_CHANNELS {
            gate.bind(format!("c{i}"));
        }
        assert_eq!(gate.channels().len(), MAX_INPUT_CHANNELS);
        assert!(matches!(
            gate.validate("busy"),
            Err(AbilityError::TooManyChannels { .. })
        ));
    }

    #[test]
    fn test_trigger_names_parse() {
        assert_eq!(
            "button_down_continuous".parse::<StartTrigger>().unwrap(),
            StartTrigger::ButtonDownContinuous
        );
        assert_eq!(
            " Button_Toggle ".parse::<StopTrigger>().unwrap(),
            StopTrigger::ButtonToggle
        );
        assert!("sideways".parse::<StopTrigger>().is_err());
    }
}
