//! The ability contract.
//!
//! An ability is one behavior competing for control of an actor: jumping,
//! crouching, dying, clamping the actor inside an area. Every ability type
//! implements [`Ability`] and owns an [`AbilityBase`] holding the bookkeeping
//! the arbitration engine needs (priority index, active slot, enabled flag,
//! input gate, start time).
//!
//! # Lifecycle
//!
//! 1. **register** - [`Abilities::register`](crate::components::abilities::Abilities::register)
//!    assigns the priority index, validates the input configuration and
//!    subscribes to [`Ability::subscriptions`].
//! 2. **start** - once a start candidate passes [`Ability::can_start`] and
//!    conflict resolution, the ability is committed active and
//!    [`Ability::on_start`] runs.
//! 3. **active** - the update phases run every tick, in this order:
//!    `update_animator`, `update_rotation`, `apply_rotation`,
//!    `update_position`, `apply_position`, `late_update`.
//! 4. **stop** - [`Ability::will_try_stop`], then [`Ability::can_stop`]
//!    (skipped for force stops), then [`Ability::on_stop`].
//! 5. **destroy** - [`Ability::on_destroy`] when the actor goes away.
//!
//! Inactive abilities get [`Ability::inactive_update`] once per tick.
//!
//! # Requests
//!
//! Hooks never start or stop other abilities directly. They push requests into
//! [`AbilityContext::requests`]; the engine processes them after the current
//! commit completes.

use std::any::Any;
use std::collections::VecDeque;

use bevy_ecs::prelude::Entity;

use crate::components::actortransform::ActorTransform;
use crate::components::animatorparams::AnimatorParams;
use crate::components::inputgate::{InputGate, StartTrigger, StopTrigger};
use crate::components::motion::MotionProposal;
use crate::components::physics::PhysicsSnapshot;
use crate::events::actor::{ActorEvent, ActorEventKind};
use crate::resources::input::InputSource;
use crate::resources::worldtime::WorldTime;

/// Upcast helper so abilities can be looked up by concrete type.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Shared bookkeeping every ability carries.
#[derive(Debug)]
pub struct AbilityBase {
    pub(crate) index: usize,
    pub(crate) active_slot: Option<usize>,
    pub(crate) start_time: Option<f32>,
    pub(crate) misconfigured: bool,
    pub(crate) start_requested: bool,
    /// `Some(force)` while a stop request is pending.
    pub(crate) stop_requested: Option<bool>,
    /// Change through [`Abilities::set_enabled`](crate::components::abilities::Abilities::set_enabled),
    /// which stops an active ability.
    pub(crate) enabled: bool,
    /// Secondary tag for abilities that come in labeled variants.
    pub data_index: Option<u32>,
    pub gate: InputGate,
}

impl Default for AbilityBase {
    fn default() -> Self {
        Self::with_gate(InputGate::default())
    }
}

impl AbilityBase {
    pub fn new(start_trigger: StartTrigger, stop_trigger: StopTrigger) -> Self {
        Self::with_gate(InputGate::new(start_trigger, stop_trigger))
    }

    pub fn with_gate(gate: InputGate) -> Self {
        Self {
            index: 0,
            active_slot: None,
            start_time: None,
            misconfigured: false,
            start_requested: false,
            stop_requested: None,
            enabled: true,
            data_index: None,
            gate,
        }
    }

    /// Bind an input channel (builder pattern).
    pub fn with_channel(mut self, name: impl Into<String>) -> Self {
        self.gate.bind(name);
        self
    }

    pub fn with_data_index(mut self, data_index: u32) -> Self {
        self.data_index = Some(data_index);
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Priority index assigned at registration.
    pub fn index(&self) -> usize {
        self.index
    }

    /// `Some(0)` for the exclusive slot, `Some(n >= 1)` for a concurrent slot.
    pub fn active_slot(&self) -> Option<usize> {
        self.active_slot
    }

    pub fn is_active(&self) -> bool {
        self.active_slot.is_some()
    }

    /// World time of the current activation.
    pub fn start_time(&self) -> Option<f32> {
        self.start_time
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Whether registration found the configuration unusable.
    pub fn is_misconfigured(&self) -> bool {
        self.misconfigured
    }
}

/// A start or stop queued by a hook or an event handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbilityRequest {
    Start(usize),
    Stop { index: usize, force: bool },
}

/// FIFO of pending requests; duplicates coalesce.
#[derive(Debug, Clone, Default)]
pub struct AbilityRequests {
    queue: VecDeque<AbilityRequest>,
}

impl AbilityRequests {
    pub fn start(&mut self, index: usize) {
        self.push(AbilityRequest::Start(index));
    }

    pub fn stop(&mut self, index: usize) {
        self.push(AbilityRequest::Stop {
            index,
            force: false,
        });
    }

    pub fn force_stop(&mut self, index: usize) {
        self.push(AbilityRequest::Stop { index, force: true });
    }

    pub fn push(&mut self, request: AbilityRequest) {
        if !self.queue.contains(&request) {
            self.queue.push_back(request);
        }
    }

    pub fn pop(&mut self) -> Option<AbilityRequest> {
        self.queue.pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }
}

/// One committed start or stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AbilityTransition {
    pub index: usize,
    pub name: &'static str,
    pub started: bool,
    pub forced: bool,
}

/// Everything a hook may read or write during a tick.
///
/// `motion` and `animator` are the only shared mutable state; they are handed
/// to one hook at a time.
pub struct AbilityContext<'a> {
    pub entity: Entity,
    pub input: &'a dyn InputSource,
    pub time: WorldTime,
    pub physics: PhysicsSnapshot,
    pub transform: ActorTransform,
    pub motion: &'a mut MotionProposal,
    pub animator: &'a mut AnimatorParams,
    pub requests: AbilityRequests,
    pub(crate) transitions: Vec<AbilityTransition>,
}

impl<'a> AbilityContext<'a> {
    pub fn new(
        entity: Entity,
        input: &'a dyn InputSource,
        time: WorldTime,
        motion: &'a mut MotionProposal,
        animator: &'a mut AnimatorParams,
    ) -> Self {
        Self {
            entity,
            input,
            time,
            physics: PhysicsSnapshot::default(),
            transform: ActorTransform::default(),
            motion,
            animator,
            requests: AbilityRequests::default(),
            transitions: Vec::new(),
        }
    }

    pub fn with_physics(mut self, physics: PhysicsSnapshot) -> Self {
        self.physics = physics;
        self
    }

    pub fn with_transform(mut self, transform: ActorTransform) -> Self {
        self.transform = transform;
        self
    }

    /// Commits made since the last call, oldest first.
    pub fn take_transitions(&mut self) -> Vec<AbilityTransition> {
        std::mem::take(&mut self.transitions)
    }

    /// Seconds since `start_time`, zero if not started.
    pub fn time_since(&self, start_time: Option<f32>) -> f32 {
        self.time.since(start_time).unwrap_or(0.0)
    }
}

/// Contract implemented by every ability type.
///
/// Only [`Ability::base`], [`Ability::base_mut`] and [`Ability::name`] are
/// required; every other hook has a neutral default.
#[allow(unused_variables)]
pub trait Ability: AsAny + Send + Sync + 'static {
    fn base(&self) -> &AbilityBase;
    fn base_mut(&mut self) -> &mut AbilityBase;

    /// Type name used in logs, events and configuration.
    fn name(&self) -> &'static str;

    /// Concurrent abilities never take the exclusive slot.
    fn is_concurrent(&self) -> bool {
        false
    }

    /// Event kinds this ability wants delivered to [`Ability::on_actor_event`].
    fn subscriptions(&self) -> &'static [ActorEventKind] {
        &[]
    }

    /// Value written to the `ability_index` animator parameter while this
    /// ability holds the exclusive slot.
    fn animator_index(&self) -> Option<i32> {
        None
    }

    /// Return false to keep the input gate from tracking `channel` this tick.
    fn should_check_input(&self, channel: usize) -> bool {
        true
    }

    fn can_start(&self, ctx: &AbilityContext) -> bool {
        true
    }

    /// Asked of active abilities with a lower index when `candidate` tries to start.
    fn should_block_start(&self, candidate: &dyn Ability) -> bool {
        false
    }

    /// Asked of the starting ability for every active ability with an index
    /// greater than or equal to its own; true force-stops `active`.
    fn should_stop_active_ability(&self, active: &dyn Ability) -> bool {
        false
    }

    fn on_start(&mut self, ctx: &mut AbilityContext) {}

    /// Last chance for bookkeeping before `can_stop` is asked.
    fn will_try_stop(&mut self, ctx: &mut AbilityContext) {}

    fn can_stop(&self, ctx: &AbilityContext) -> bool {
        true
    }

    fn on_stop(&mut self, ctx: &mut AbilityContext, force: bool) {}

    fn on_destroy(&mut self) {}

    fn on_actor_event(&mut self, event: &ActorEvent, requests: &mut AbilityRequests) {}

    fn inactive_update(&mut self, ctx: &mut AbilityContext) {}

    fn update_animator(&mut self, ctx: &mut AbilityContext) {}

    fn update_rotation(&mut self, ctx: &mut AbilityContext) {}

    fn apply_rotation(&mut self, ctx: &mut AbilityContext) {}

    fn update_position(&mut self, ctx: &mut AbilityContext) {}

    fn apply_position(&mut self, ctx: &mut AbilityContext) {}

    fn late_update(&mut self, ctx: &mut AbilityContext) {}

    /// Opaque payload replicated alongside the active flag.
    fn sync_data(&self) -> Option<Vec<u8>> {
        None
    }

    fn apply_sync_data(&mut self, data: &[u8]) {}
}

impl dyn Ability {
    pub fn index(&self) -> usize {
        self.base().index
    }

    pub fn is_active(&self) -> bool {
        self.base().is_active()
    }

    pub fn is<T: Ability>(&self) -> bool {
        self.as_any().is::<T>()
    }

    pub fn downcast_ref<T: Ability>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn downcast_mut<T: Ability>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Probe {
        base: AbilityBase,
    }

    impl Ability for Probe {
        fn base(&self) -> &AbilityBase {
            &self.base
        }
        fn base_mut(&mut self) -> &mut AbilityBase {
            &mut self.base
        }
        fn name(&self) -> &'static str {
            "probe"
        }
    }

    #[test]
    fn test_base_defaults_inactive() {
        let base = AbilityBase::new(StartTrigger::Automatic, StopTrigger::Manual);
        assert!(base.is_enabled());
        assert!(!base.is_active());
        assert_eq!(base.active_slot(), None);
        assert_eq!(base.start_time(), None);
    }

    #[test]
    fn test_requests_coalesce() {
        let mut requests = AbilityRequests::default();
        requests.start(2);
        requests.start(2);
        requests.stop(1);
        requests.force_stop(1);
        assert_eq!(requests.len(), 3);
        assert_eq!(requests.pop(), Some(AbilityRequest::Start(2)));
    }

    #[test]
    fn test_downcast_through_dyn() {
        let probe: Box<dyn Ability> = Box::new(Probe {
            base: AbilityBase::default(),
        });
        let ability: &dyn Ability = probe.as_ref();
        assert!(ability.is::<Probe>());
        assert!(ability.downcast_ref::<Probe>().is_some());
    }
}
