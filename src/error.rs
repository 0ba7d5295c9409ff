//! Error types for ability registration and configuration.
//!
//! Configuration problems never abort actor construction: the registry logs
//! them, keeps a copy, and registers the offending ability in a degraded mode
//! where it can never become a start candidate.

use thiserror::Error;

use crate::components::inputgate::MAX_INPUT_CHANNELS;

/// Errors raised while building or configuring an actor's abilities.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AbilityError {
    /// The configured trigger kind needs a different number of input channels.
    #[error("ability '{ability}': trigger {trigger} needs at least one input channel, got {channels}")]
    ChannelCountMismatch {
        /// Ability type name.
        ability: String,
        /// Trigger kind that was configured.
        trigger: String,
        /// Number of channels actually bound.
        channels: usize,
    },

    /// More input channels than the gate can track.
    #[error("ability '{ability}': {channels} input channels bound, at most {max} supported", max = MAX_INPUT_CHANNELS)]
    TooManyChannels {
        /// Ability type name.
        ability: String,
        /// Number of channels requested.
        channels: usize,
    },

    /// A `Custom` start trigger was configured without a predicate object.
    #[error("ability '{0}': custom start trigger has no predicate")]
    MissingCustomPredicate(String),

    /// Trigger name in authored data that does not match any kind.
    #[error("unknown trigger kind: {0}")]
    UnknownTrigger(String),

    /// Ability name in authored data that no constructor is known for.
    #[error("unknown ability: {0}")]
    UnknownAbility(String),

    /// Priority index outside the registry.
    #[error("no ability registered at index {0}")]
    InvalidIndex(usize),

    /// Configuration file could not be read or parsed.
    #[error("failed to load config: {0}")]
    ConfigLoad(String),

    /// A collaborator the engine cannot run without is missing.
    #[error("missing mandatory collaborator: {0}")]
    MissingCollaborator(&'static str),
}
