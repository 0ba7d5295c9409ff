//! Event types used by the engine.
//!
//! Submodules:
//! - [`ability`] – start/stop notifications emitted after every commit
//! - [`actor`] – typed actor notifications, enable/disable and destroy requests
//! - [`input`] – press/release of named input channels
pub mod ability;
pub mod actor;
pub mod input;
