//! Engine systems.
//!
//! Submodules overview
//! - [`abilities`] – arbitration and update phases, actor event observers
//! - [`input`] – derive edges and hold times in [`crate::resources::input::InputState`]
//! - [`motion`] – apply motion proposals to actor transforms
//! - [`time`] – update simulation time and delta

pub mod abilities;
pub mod input;
pub mod motion;
pub mod time;
