//! ECS resources made available to systems.
//!
//! Overview
//! - `actorconfig` – authored ability lists and trigger settings (INI / JSON)
//! - `input` – per-frame state of every named input channel
//! - `worldtime` – simulation time and delta
pub mod actorconfig;
pub mod input;
pub mod worldtime;
