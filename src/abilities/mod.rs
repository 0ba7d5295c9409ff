//! Concrete ability types.
//!
//! Each submodule provides one [`Ability`] implementation with sensible
//! defaults and a `from_config` constructor reading an [`AbilityConfig`].
//!
//! Submodules overview:
//! - [`die`] – takes over the actor when it dies, stops everything else
//! - [`heightchange`] – crouching; lowers the animator height and slows movement
//! - [`jump`] – vertical impulse, ends on landing
//! - [`locomotion`] – turns the movement axes into a planar translation
//! - [`restrictposition`] – clamps the proposed position inside an area
//! - [`speedchange`] – sprinting, optionally limited by stamina
//! - [`storedinput`] – short history of button presses for buffered input

pub mod die;
pub mod heightchange;
pub mod jump;
pub mod locomotion;
pub mod restrictposition;
pub mod speedchange;
pub mod storedinput;

use log::info;

use crate::components::abilities::Abilities;
use crate::components::ability::{Ability, AbilityBase};
use crate::components::inputgate::{InputGate, StartTrigger, StopTrigger};
use crate::error::AbilityError;
use crate::resources::actorconfig::{AbilityConfig, ActorConfig};

pub use die::Die;
pub use heightchange::HeightChange;
pub use jump::Jump;
pub use locomotion::Locomotion;
pub use restrictposition::RestrictPosition;
pub use speedchange::SpeedChange;
pub use storedinput::StoredInput;

/// Build the base of an ability, letting the config override the type's
/// default triggers and channels.
pub(crate) fn base_from_config(
    config: &AbilityConfig,
    start: StartTrigger,
    stop: StopTrigger,
    channels: &[&str],
) -> AbilityBase {
    let mut gate = InputGate::new(
        config.start_trigger.unwrap_or(start),
        config.stop_trigger.unwrap_or(stop),
    )
    .with_settings(config.settings);
    if config.channels.is_empty() {
        for channel in channels {
            gate.bind(*channel);
        }
    } else {
        for channel in &config.channels {
            gate.bind(channel.clone());
        }
    }

    let mut base = AbilityBase::with_gate(gate);
    base.enabled = config.enabled;
    base.data_index = config.data_index;
    base
}

/// Instantiate one ability from its settings.
pub fn build_ability(config: &AbilityConfig) -> Result<Box<dyn Ability>, AbilityError> {
    let ability: Box<dyn Ability> = match config.kind() {
        "die" => Box::new(Die::from_config(config)),
        "jump" => Box::new(Jump::from_config(config)),
        "crouch" | "height_change" => Box::new(HeightChange::from_config(config)),
        "locomotion" | "move" => Box::new(Locomotion::from_config(config)),
        "restrict_position" => Box::new(RestrictPosition::from_config(config)),
        "speed_change" | "sprint" => Box::new(SpeedChange::from_config(config)),
        "stored_input" => Box::new(StoredInput::from_config(config)),
        other => return Err(AbilityError::UnknownAbility(other.to_string())),
    };
    Ok(ability)
}

/// Build the ability component of an actor, in configured priority order.
pub fn build_abilities(config: &ActorConfig) -> Result<Abilities, AbilityError> {
    let mut abilities = Abilities::new();
    for ability in &config.abilities {
        abilities.register_boxed(build_ability(ability)?);
    }
    info!(
        "Built {} abilities: {}",
        abilities.len(),
        abilities.iter().map(|a| a.name()).collect::<Vec<_>>().join(", ")
    );
    Ok(abilities)
}

/// The default actor: every ability type in a sensible priority order.
pub fn default_actor_config() -> ActorConfig {
    [
        "die",
        "jump",
        "crouch",
        "locomotion",
        "speed_change",
        "restrict_position",
        "stored_input",
    ]
    .into_iter()
    .fold(ActorConfig::new(), |config, name| {
        config.with_ability(AbilityConfig::named(name))
    })
}
