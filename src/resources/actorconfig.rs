//! Actor configuration resource.
//!
//! Describes which abilities an actor has, in priority order, and how each of
//! them is triggered. Loaded from an INI file (or JSON), then turned into an
//! [`Abilities`](crate::components::abilities::Abilities) component by
//! [`build_abilities`](crate::abilities::build_abilities).
//!
//! # Configuration File Format
//!
//! ```ini
//! [actor]
//! abilities = die, jump, crouch, speed_change, restrict_position, stored_input
//!
//! [input]
//! double_press_window = 0.3
//! tap_window = 0.2
//! axis_deadzone = 0.1
//!
//! [ability.jump]
//! start_trigger = button_down
//! stop_trigger = automatic
//! channels = jump
//! force = 6.0
//!
//! [ability.sprint]
//! kind = speed_change
//! channels = sprint
//! multiplier = 1.8
//! ```
//!
//! The order of `[actor] abilities` is the priority order. Keys of an ability
//! section other than the ones listed on [`AbilityConfig`] are parsed as
//! numeric tunables and handed to the ability's constructor.

use std::path::{Path, PathBuf};

use bevy_ecs::prelude::*;
use configparser::ini::Ini;
use log::{info, warn};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::components::inputgate::{GateSettings, StartTrigger, StopTrigger};
use crate::error::AbilityError;
use crate::resources::input::{DEFAULT_DOUBLE_PRESS_WINDOW, DEFAULT_TAP_WINDOW, InputState};

const DEFAULT_CONFIG_PATH: &str = "./actor.ini";

/// Keys of an ability section that are not numeric tunables.
const RESERVED_KEYS: [&str; 9] = [
    "kind",
    "start_trigger",
    "stop_trigger",
    "channels",
    "enabled",
    "data_index",
    "long_press_duration",
    "wait_for_long_press_release",
    "axis_deadzone",
];

/// Authored settings for one ability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AbilityConfig {
    /// Unique name within the actor; also the section suffix in INI files.
    pub name: String,
    /// Ability type to instantiate; defaults to `name`.
    pub kind: Option<String>,
    /// Overrides the type's default start trigger.
    pub start_trigger: Option<StartTrigger>,
    /// Overrides the type's default stop trigger.
    pub stop_trigger: Option<StopTrigger>,
    /// Overrides the type's default input channels.
    pub channels: Vec<String>,
    pub enabled: bool,
    pub data_index: Option<u32>,
    pub settings: GateSettings,
    /// Type specific numeric tunables.
    pub params: FxHashMap<String, f32>,
}

impl Default for AbilityConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            kind: None,
            start_trigger: None,
            stop_trigger: None,
            channels: Vec::new(),
            enabled: true,
            data_index: None,
            settings: GateSettings::default(),
            params: FxHashMap::default(),
        }
    }
}

impl AbilityConfig {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Ability type to instantiate.
    pub fn kind(&self) -> &str {
        self.kind.as_deref().unwrap_or(&self.name)
    }

    /// Numeric tunable, or `default` when absent.
    pub fn param(&self, key: &str, default: f32) -> f32 {
        self.params.get(key).copied().unwrap_or(default)
    }

    /// Set a numeric tunable (builder pattern).
    pub fn with_param(mut self, key: impl Into<String>, value: f32) -> Self {
        self.params.insert(key.into(), value);
        self
    }

    pub fn with_channels(mut self, channels: &[&str]) -> Self {
        self.channels = channels.iter().map(|c| c.to_string()).collect();
        self
    }
}

/// Actor configuration resource.
#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ActorConfig {
    /// Window between two presses to count as a double press, seconds.
    pub double_press_window: f32,
    /// Longest press that still counts as a tap, seconds.
    pub tap_window: f32,
    /// Default axis dead zone for every ability.
    pub axis_deadzone: f32,
    /// Abilities in priority order.
    pub abilities: Vec<AbilityConfig>,
    /// Path to the configuration file.
    #[serde(skip)]
    pub config_path: PathBuf,
}

impl Default for ActorConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ActorConfig {
    /// Empty configuration with default input windows.
    pub fn new() -> Self {
        Self {
            double_press_window: DEFAULT_DOUBLE_PRESS_WINDOW,
            tap_window: DEFAULT_TAP_WINDOW,
            axis_deadzone: GateSettings::default().axis_deadzone,
            abilities: Vec::new(),
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }

    /// Create a configuration that will be loaded from `path`.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            ..Self::new()
        }
    }

    /// Append an ability (builder pattern).
    pub fn with_ability(mut self, ability: AbilityConfig) -> Self {
        self.abilities.push(ability);
        self
    }

    /// Settings of the ability called `name`.
    pub fn ability(&self, name: &str) -> Option<&AbilityConfig> {
        self.abilities.iter().find(|a| a.name == name)
    }

    /// Input resource using this actor's timing windows.
    pub fn input_state(&self) -> InputState {
        InputState::with_windows(self.double_press_window, self.tap_window)
    }

    /// Load configuration from the INI file at `config_path`.
    ///
    /// Missing input values retain their current values. The ability list is
    /// replaced by the one in the file.
    pub fn load_from_file(&mut self) -> Result<(), AbilityError> {
        let mut ini = Ini::new();
        ini.load(&self.config_path)
            .map_err(|e| AbilityError::ConfigLoad(format!("{}: {}", self.config_path.display(), e)))?;
        self.apply_ini(&ini)
    }

    /// Parse INI text.
    pub fn load_from_str(&mut self, text: &str) -> Result<(), AbilityError> {
        let mut ini = Ini::new();
        ini.read(text.to_string()).map_err(AbilityError::ConfigLoad)?;
        self.apply_ini(&ini)
    }

    /// Load a configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, AbilityError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| AbilityError::ConfigLoad(format!("{}: {}", path.display(), e)))?;
        let mut config = Self::from_json_str(&text)?;
        config.config_path = path.to_path_buf();
        Ok(config)
    }

    pub fn from_json_str(text: &str) -> Result<Self, AbilityError> {
        serde_json::from_str(text).map_err(|e| AbilityError::ConfigLoad(e.to_string()))
    }

    /// Load from `path`, picking the format from the extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AbilityError> {
        let path = path.as_ref();
        if path.extension().is_some_and(|ext| ext == "json") {
            return Self::from_json_file(path);
        }
        let mut config = Self::with_path(path);
        config.load_from_file()?;
        Ok(config)
    }

    fn apply_ini(&mut self, ini: &Ini) -> Result<(), AbilityError> {
        // [input] section
        if let Some(window) = getfloat(ini, "input", "double_press_window")? {
            self.double_press_window = window;
        }
        if let Some(window) = getfloat(ini, "input", "tap_window")? {
            self.tap_window = window;
        }
        if let Some(deadzone) = getfloat(ini, "input", "axis_deadzone")? {
            self.axis_deadzone = deadzone;
        }

        // [actor] section
        let names = ini
            .get("actor", "abilities")
            .ok_or_else(|| AbilityError::ConfigLoad("missing [actor] abilities".to_string()))?;
        self.abilities = split_list(&names)
            .map(|name| self.parse_ability(ini, name))
            .collect::<Result<Vec<_>, _>>()?;

        info!(
            "Loaded actor config: {} abilities ({}), double_press={}, tap={}, deadzone={}",
            self.abilities.len(),
            self.abilities
                .iter()
                .map(|a| a.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            self.double_press_window,
            self.tap_window,
            self.axis_deadzone
        );

        Ok(())
    }

    fn parse_ability(&self, ini: &Ini, name: &str) -> Result<AbilityConfig, AbilityError> {
        let section = format!("ability.{}", name);
        let mut ability = AbilityConfig::named(name);
        ability.settings.axis_deadzone = self.axis_deadzone;

        ability.kind = ini.get(&section, "kind");
        if let Some(trigger) = ini.get(&section, "start_trigger") {
            ability.start_trigger = Some(trigger.parse()?);
        }
        if let Some(trigger) = ini.get(&section, "stop_trigger") {
            ability.stop_trigger = Some(trigger.parse()?);
        }
        if let Some(channels) = ini.get(&section, "channels") {
            ability.channels = split_list(&channels).map(str::to_string).collect();
        }
        if let Some(enabled) = ini.getbool(&section, "enabled").map_err(AbilityError::ConfigLoad)? {
            ability.enabled = enabled;
        }
        if let Some(index) = ini.getuint(&section, "data_index").map_err(AbilityError::ConfigLoad)? {
            ability.data_index = Some(index as u32);
        }
        if let Some(duration) = getfloat(ini, &section, "long_press_duration")? {
            ability.settings.long_press_duration = duration;
        }
        if let Some(wait) = ini
            .getbool(&section, "wait_for_long_press_release")
            .map_err(AbilityError::ConfigLoad)?
        {
            ability.settings.wait_for_long_press_release = wait;
        }
        if let Some(deadzone) = getfloat(ini, &section, "axis_deadzone")? {
            ability.settings.axis_deadzone = deadzone;
        }

        if let Some(keys) = ini.get_map_ref().get(&section) {
            for (key, value) in keys {
                if RESERVED_KEYS.contains(&key.as_str()) {
                    continue;
                }
                match value.as_deref().map(|v| v.trim().parse::<f32>()) {
                    Some(Ok(number)) => {
                        ability.params.insert(key.clone(), number);
                    }
                    _ => warn!("[{}] ignoring non-numeric key '{}'", section, key),
                }
            }
        }

        Ok(ability)
    }
}

fn getfloat(ini: &Ini, section: &str, key: &str) -> Result<Option<f32>, AbilityError> {
    ini.getfloat(section, key)
        .map(|value| value.map(|v| v as f32))
        .map_err(AbilityError::ConfigLoad)
}

fn split_list(list: &str) -> impl Iterator<Item = &str> {
    list.split(',').map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "
[actor]
abilities = jump, sprint

[input]
double_press_window = 0.25
axis_deadzone = 0.2

[ability.jump]
start_trigger = button_down
stop_trigger = automatic
channels = jump
force = 7.5

[ability.sprint]
kind = speed_change
channels = sprint, run
enabled = false
multiplier = 1.8
";

    #[test]
    fn test_defaults() {
        let config = ActorConfig::new();
        assert_eq!(config.double_press_window, DEFAULT_DOUBLE_PRESS_WINDOW);
        assert_eq!(config.tap_window, DEFAULT_TAP_WINDOW);
        assert!(config.abilities.is_empty());
    }

    #[test]
    fn test_load_from_ini_text() {
        let mut config = ActorConfig::new();
        config.load_from_str(SAMPLE).unwrap();
        assert_eq!(config.double_press_window, 0.25);
        assert_eq!(config.tap_window, DEFAULT_TAP_WINDOW);
        assert_eq!(config.abilities.len(), 2);

        let jump = config.ability("jump").unwrap();
        assert_eq!(jump.kind(), "jump");
        assert_eq!(jump.start_trigger, Some(StartTrigger::ButtonDown));
        assert_eq!(jump.stop_trigger, Some(StopTrigger::Automatic));
        assert_eq!(jump.channels, vec!["jump".to_string()]);
        assert_eq!(jump.param("force", 0.0), 7.5);
        assert_eq!(jump.settings.axis_deadzone, 0.2);

        let sprint = config.ability("sprint").unwrap();
        assert_eq!(sprint.kind(), "speed_change");
        assert!(!sprint.enabled);
        assert_eq!(sprint.channels.len(), 2);
        assert_eq!(sprint.param("multiplier", 1.0), 1.8);
        assert!(!sprint.params.contains_key("kind"));
    }

    #[test]
    fn test_unknown_trigger_is_an_error() {
        let mut config = ActorConfig::new();
        let result = config.load_from_str("[actor]\nabilities = a\n[ability.a]\nstart_trigger = sometimes\n");
        assert_eq!(result, Err(AbilityError::UnknownTrigger("sometimes".to_string())));
    }

    #[test]
    fn test_missing_ability_list_is_an_error() {
        let mut config = ActorConfig::new();
        assert!(matches!(
            config.load_from_str("[input]\ntap_window = 0.1\n"),
            Err(AbilityError::ConfigLoad(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let mut config = ActorConfig::with_path("/nonexistent/actor.ini");
        assert!(matches!(config.load_from_file(), Err(AbilityError::ConfigLoad(_))));
    }

    #[test]
    fn test_from_json() {
        let json = r#"{
            "tap_window": 0.15,
            "abilities": [
                { "name": "die" },
                { "name": "crouch", "kind": "height_change", "stop_trigger": "button_toggle",
                  "params": { "height": 0.4 } }
            ]
        }"#;
        let config = ActorConfig::from_json_str(json).unwrap();
        assert_eq!(config.tap_window, 0.15);
        assert_eq!(config.double_press_window, DEFAULT_DOUBLE_PRESS_WINDOW);
        assert!(config.abilities[0].enabled);
        let crouch = &config.abilities[1];
        assert_eq!(crouch.kind(), "height_change");
        assert_eq!(crouch.stop_trigger, Some(StopTrigger::ButtonToggle));
        assert_eq!(crouch.param("height", 1.0), 0.4);
    }

    #[test]
    fn test_input_state_uses_windows() {
        let mut config = ActorConfig::new();
        config.double_press_window = 0.5;
        config.tap_window = 0.05;
        let input = config.input_state();
        assert_eq!(input.double_press_window, 0.5);
        assert_eq!(input.tap_window, 0.05);
    }
}
