//! Ability engine library.
//!
//! Per-actor arbitration of competing behaviors ("abilities") on top of
//! `bevy_ecs`. Each actor carries an
//! [`Abilities`](components::abilities::Abilities) component holding its
//! abilities in priority order; once per tick the engine decides which of
//! them start and stop, then drives the active ones through a fixed sequence
//! of update phases.

pub mod abilities;
pub mod components;
pub mod error;
pub mod events;
pub mod game;
pub mod resources;
pub mod systems;
