//! ECS components for actors.
//!
//! Submodules overview:
//! - [`abilities`] – per-actor registry and arbitration engine
//! - [`ability`] – the ability contract, shared bookkeeping and tick context
//! - [`actortransform`] – world-space position and orientation of an actor
//! - [`animatorparams`] – named parameters handed to the animation layer
//! - [`inputgate`] – per-ability trigger state machine over input channels
//! - [`motion`] – motion proposal written by abilities each tick
//! - [`physics`] – grounding and contact results read by abilities

pub mod abilities;
pub mod ability;
pub mod actortransform;
pub mod animatorparams;
pub mod inputgate;
pub mod motion;
pub mod physics;
