//! Ability systems and observers.
//!
//! - [`ability_arbitration_system`] resets each actor's motion proposal and
//!   runs the stop and start passes.
//! - [`ability_update_system`] runs the update phases of every actor.
//! - [`observe_actor_notification`], [`observe_actor_enabled`] and
//!   [`observe_destroy_actor`] react to the actor events of
//!   [`crate::events::actor`].
//!
//! Every committed start or stop is re-emitted as an
//! [`AbilityStartedEvent`] / [`AbilityStoppedEvent`] through
//! `commands.trigger`, in commit order.
//!
//! Both systems need the [`InputState`] and [`WorldTime`] resources. When one
//! is missing they log an error once and do nothing.
use bevy_ecs::observer::On;
use bevy_ecs::prelude::*;
use log::{debug, error, warn};

use crate::components::abilities::Abilities;
use crate::components::ability::{AbilityContext, AbilityTransition};
use crate::components::actortransform::ActorTransform;
use crate::components::animatorparams::AnimatorParams;
use crate::components::motion::MotionProposal;
use crate::components::physics::PhysicsSnapshot;
use crate::error::AbilityError;
use crate::events::ability::{AbilityStartedEvent, AbilityStoppedEvent};
use crate::events::actor::{ActorEnabledEvent, ActorNotification, DestroyActorEvent};
use crate::resources::input::{InputSource, InputState};
use crate::resources::worldtime::WorldTime;

/// Components of an actor the ability systems work on.
pub type ActorData = (
    Entity,
    &'static mut Abilities,
    &'static mut MotionProposal,
    &'static mut AnimatorParams,
    Option<&'static PhysicsSnapshot>,
    Option<&'static ActorTransform>,
);

/// Run the stop and start passes for every actor.
pub fn ability_arbitration_system(
    mut commands: Commands,
    input: Option<Res<InputState>>,
    time: Option<Res<WorldTime>>,
    mut reported: Local<bool>,
    mut actors: Query<ActorData>,
) {
    let Some((input, time)) = collaborators(&input, &time, &mut reported) else {
        return;
    };
    for (entity, mut abilities, mut motion, mut animator, physics, transform) in actors.iter_mut() {
        motion.reset();
        let mut ctx = AbilityContext::new(entity, input, time, &mut motion, &mut animator)
            .with_physics(physics.copied().unwrap_or_default())
            .with_transform(transform.copied().unwrap_or_default());
        abilities.arbitrate(&mut ctx);
        emit_transitions(&mut commands, entity, ctx.take_transitions());
    }
}

/// Run the update phases for every actor.
pub fn ability_update_system(
    mut commands: Commands,
    input: Option<Res<InputState>>,
    time: Option<Res<WorldTime>>,
    mut reported: Local<bool>,
    mut actors: Query<ActorData>,
) {
    let Some((input, time)) = collaborators(&input, &time, &mut reported) else {
        return;
    };
    for (entity, mut abilities, mut motion, mut animator, physics, transform) in actors.iter_mut() {
        let mut ctx = AbilityContext::new(entity, input, time, &mut motion, &mut animator)
            .with_physics(physics.copied().unwrap_or_default())
            .with_transform(transform.copied().unwrap_or_default());
        abilities.run_phases(&mut ctx);
        emit_transitions(&mut commands, entity, ctx.take_transitions());
    }
}

/// Forward an [`ActorNotification`] to the subscribed abilities of its actor.
///
/// Start and stop requests made by the handlers apply on the next tick.
pub fn observe_actor_notification(
    trigger: On<ActorNotification>,
    mut actors: Query<&mut Abilities>,
) {
    let notification = trigger.event();
    match actors.get_mut(notification.entity) {
        Ok(mut abilities) => {
            let notified = abilities.dispatch_event(&notification.event);
            debug!(
                "{:?} delivered to {} abilities of {:?}",
                notification.event.kind(),
                notified,
                notification.entity
            );
        }
        Err(_) => warn!(
            "ActorNotification {:?} for {:?}, which has no abilities",
            notification.event, notification.entity
        ),
    }
}

/// Suspend or resume an actor. Suspending force stops every active ability.
pub fn observe_actor_enabled(
    trigger: On<ActorEnabledEvent>,
    mut commands: Commands,
    input: Option<Res<InputState>>,
    time: Option<Res<WorldTime>>,
    mut actors: Query<ActorData>,
) {
    let event = *trigger.event();
    let fallback = InputState::default();
    let input: &dyn InputSource = match input.as_deref() {
        Some(input) => input,
        None => &fallback,
    };
    let time = time.as_deref().copied().unwrap_or_default();

    let Ok((entity, mut abilities, mut motion, mut animator, physics, transform)) = actors.get_mut(event.entity) else {
        warn!("ActorEnabledEvent for {:?}, which has no abilities", event.entity);
        return;
    };
    let mut ctx = AbilityContext::new(entity, input, time, &mut motion, &mut animator)
        .with_physics(physics.copied().unwrap_or_default())
        .with_transform(transform.copied().unwrap_or_default());
    abilities.set_actor_enabled(event.enabled, &mut ctx);
    emit_transitions(&mut commands, entity, ctx.take_transitions());
}

/// Tear an actor down: force stop, destroy hooks, then despawn the entity.
pub fn observe_destroy_actor(
    trigger: On<DestroyActorEvent>,
    mut commands: Commands,
    input: Option<Res<InputState>>,
    time: Option<Res<WorldTime>>,
    mut actors: Query<ActorData>,
) {
    let target = trigger.event().entity;
    let fallback = InputState::default();
    let input: &dyn InputSource = match input.as_deref() {
        Some(input) => input,
        None => &fallback,
    };
    let time = time.as_deref().copied().unwrap_or_default();

    if let Ok((entity, mut abilities, mut motion, mut animator, physics, transform)) = actors.get_mut(target) {
        let mut ctx = AbilityContext::new(entity, input, time, &mut motion, &mut animator)
            .with_physics(physics.copied().unwrap_or_default())
            .with_transform(transform.copied().unwrap_or_default());
        abilities.destroy(&mut ctx);
        emit_transitions(&mut commands, entity, ctx.take_transitions());
    } else {
        debug!("Destroying {:?}, which has no abilities", target);
    }
    if let Ok(mut entity) = commands.get_entity(target) {
        entity.despawn();
    }
}

fn collaborators<'a>(
    input: &'a Option<Res<InputState>>,
    time: &Option<Res<WorldTime>>,
    reported: &mut Local<bool>,
) -> Option<(&'a InputState, WorldTime)> {
    match (input.as_deref(), time.as_deref()) {
        (Some(input), Some(time)) => Some((input, *time)),
        (input, _) => {
            if !**reported {
                let missing = if input.is_none() { "InputState" } else { "WorldTime" };
                error!("{}; abilities will not run", AbilityError::MissingCollaborator(missing));
                **reported = true;
            }
            None
        }
    }
}

fn emit_transitions(commands: &mut Commands, entity: Entity, transitions: Vec<AbilityTransition>) {
    for transition in transitions {
        if transition.started {
            commands.trigger(AbilityStartedEvent {
                entity,
                index: transition.index,
                name: transition.name,
            });
        } else {
            commands.trigger(AbilityStoppedEvent {
                entity,
                index: transition.index,
                name: transition.name,
                forced: transition.forced,
            });
        }
    }
}
