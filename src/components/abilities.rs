//! Per-actor ability registry and arbitration engine.
//!
//! [`Abilities`] owns every ability of one actor in priority order (index 0
//! is evaluated first and wins conflicts) and decides, once per tick, which of
//! them are active.
//!
//! # Arbitration
//!
//! [`Abilities::arbitrate`] runs three steps:
//!
//! 1. refresh every input gate's edge latches
//! 2. **stop pass** - active abilities, ascending index. An ability with a
//!    pending stop request or a stop candidate from its gate gets
//!    `will_try_stop`, then stops if forced or `can_stop` agrees.
//! 3. **start pass** - inactive abilities, ascending index, including those
//!    stopped a moment ago. A start candidate that passes `can_start` goes
//!    through conflict resolution:
//!    - an exclusive candidate is rejected if any active ability with a lower
//!      index answers `should_block_start`
//!    - every active ability with a higher index that the candidate names in
//!      `should_stop_active_ability` is force stopped
//!    - an exclusive candidate displaces a lower-precedence exclusive occupant
//!      and is rejected by a higher-precedence one
//!
//! Block queries are always evaluated before force-stop queries, so a block
//! wins over a same-tick force stop. Requests queued by hooks are processed
//! after the commit that produced them.
//!
//! [`Abilities::run_phases`] then drives the per-tick update hooks.

use std::fmt;

use bevy_ecs::prelude::Component;
use log::{debug, info, warn};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::components::ability::{
    Ability, AbilityContext, AbilityRequest, AbilityRequests, AbilityTransition,
};
use crate::components::inputgate::MAX_INPUT_CHANNELS;
use crate::error::AbilityError;
use crate::events::actor::{ActorEvent, ActorEventKind};

/// Animator parameter holding the exclusive occupant's animator index.
pub const ABILITY_INDEX_PARAM: &str = "ability_index";

/// Upper bound on queued requests processed in one drain.
const MAX_REQUESTS_PER_DRAIN: usize = 64;

/// Replicated view of one ability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbilitySyncState {
    pub index: usize,
    pub name: String,
    pub active: bool,
    pub data: Option<Vec<u8>>,
}

#[derive(Debug, Clone, Copy)]
enum UpdatePhase {
    Animator,
    RotationProposal,
    RotationCommit,
    PositionProposal,
    PositionCommit,
    Late,
}

const UPDATE_PHASES: [UpdatePhase; 6] = [
    UpdatePhase::Animator,
    UpdatePhase::RotationProposal,
    UpdatePhase::RotationCommit,
    UpdatePhase::PositionProposal,
    UpdatePhase::PositionCommit,
    UpdatePhase::Late,
];

/// Ordered set of an actor's abilities plus the current active set.
#[derive(Component, Default)]
pub struct Abilities {
    abilities: Vec<Box<dyn Ability>>,
    exclusive: Option<usize>,
    concurrent: SmallVec<[usize; 4]>,
    subscriptions: FxHashMap<ActorEventKind, SmallVec<[usize; 4]>>,
    config_errors: Vec<AbilityError>,
    suspended: bool,
    destroyed: bool,
}

impl Abilities {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an ability (builder pattern).
    pub fn with(mut self, ability: impl Ability) -> Self {
        self.register(ability);
        self
    }

    /// Append an ability; returns its priority index.
    pub fn register(&mut self, ability: impl Ability) -> usize {
        self.register_boxed(Box::new(ability))
    }

    /// Append an already boxed ability; returns its priority index.
    ///
    /// A configuration problem is logged and recorded, and the ability is
    /// registered in a mode where it can never start.
    pub fn register_boxed(&mut self, mut ability: Box<dyn Ability>) -> usize {
        let index = self.abilities.len();
        let name = ability.name();
        ability.base_mut().index = index;

        if let Err(err) = ability.base().gate.validate(name) {
            warn!("Ability '{}' at priority {} disabled: {}", name, index, err);
            ability.base_mut().misconfigured = true;
            self.config_errors.push(err);
        }

        for kind in ability.subscriptions() {
            self.subscriptions.entry(*kind).or_default().push(index);
        }

        debug!("Registered ability '{}' at priority {}", name, index);
        self.abilities.push(ability);
        index
    }

    pub fn len(&self) -> usize {
        self.abilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.abilities.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&dyn Ability> {
        self.abilities.get(index).map(|a| &**a)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut dyn Ability> {
        match self.abilities.get_mut(index) {
            Some(ability) => Some(&mut **ability),
            None => None,
        }
    }

    /// All abilities in priority order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn Ability> + '_ {
        self.abilities.iter().map(|a| &**a)
    }

    /// Every registered ability of type `T`, in priority order.
    pub fn by_type<T: Ability>(&self) -> impl Iterator<Item = &T> + '_ {
        self.iter().filter_map(|a| a.downcast_ref::<T>())
    }

    /// Abilities of type `T` carrying the given data index.
    pub fn by_type_with_index<T: Ability>(&self, data_index: u32) -> impl Iterator<Item = &T> + '_ {
        self.iter()
            .filter(move |a| a.base().data_index == Some(data_index))
            .filter_map(|a| a.downcast_ref::<T>())
    }

    pub fn by_type_mut<T: Ability>(&mut self) -> impl Iterator<Item = &mut T> + '_ {
        self.abilities
            .iter_mut()
            .filter_map(|a| (**a).downcast_mut::<T>())
    }

    /// Highest-priority ability of type `T`.
    pub fn first<T: Ability>(&self) -> Option<&T> {
        self.by_type::<T>().next()
    }

    pub fn first_mut<T: Ability>(&mut self) -> Option<&mut T> {
        self.by_type_mut::<T>().next()
    }

    /// Priority index of the first ability of type `T`.
    pub fn index_of<T: Ability>(&self) -> Option<usize> {
        self.iter().find(|a| a.is::<T>()).map(|a| a.index())
    }

    pub fn is_active(&self, index: usize) -> bool {
        self.get(index).map(|a| a.is_active()).unwrap_or(false)
    }

    /// Index of the exclusive slot's occupant.
    pub fn exclusive(&self) -> Option<usize> {
        self.exclusive
    }

    /// Active concurrent abilities, unordered.
    pub fn concurrent_active(&self) -> &[usize] {
        &self.concurrent
    }

    /// Every active ability, ascending index.
    pub fn active_indices(&self) -> SmallVec<[usize; 8]> {
        let mut active: SmallVec<[usize; 8]> = self.concurrent.iter().copied().collect();
        active.extend(self.exclusive);
        active.sort_unstable();
        active
    }

    /// Names of the active abilities, ascending index.
    pub fn active_names(&self) -> Vec<&'static str> {
        self.active_indices()
            .iter()
            .map(|&i| self.abilities[i].name())
            .collect()
    }

    /// Configuration problems found at registration.
    pub fn config_errors(&self) -> &[AbilityError] {
        &self.config_errors
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    // ---------------------------------------------------------------------
    // Requests from outside a tick
    // ---------------------------------------------------------------------

    /// Make the ability a start candidate on the next start pass, bypassing
    /// its input gate. Returns false when it is already active.
    pub fn request_start(&mut self, index: usize) -> Result<bool, AbilityError> {
        let ability = self
            .abilities
            .get_mut(index)
            .ok_or(AbilityError::InvalidIndex(index))?;
        if ability.base().is_active() {
            return Ok(false);
        }
        ability.base_mut().start_requested = true;
        Ok(true)
    }

    /// Make the ability a stop candidate on the next stop pass. A forced
    /// request skips `can_stop`. Returns false when it is already inactive.
    pub fn request_stop(&mut self, index: usize, force: bool) -> Result<bool, AbilityError> {
        let ability = self
            .abilities
            .get_mut(index)
            .ok_or(AbilityError::InvalidIndex(index))?;
        let base = ability.base_mut();
        if !base.is_active() {
            return Ok(false);
        }
        let force = force || base.stop_requested.unwrap_or(false);
        base.stop_requested = Some(force);
        Ok(true)
    }

    fn queue_requests(&mut self, mut requests: AbilityRequests) {
        while let Some(request) = requests.pop() {
            let result = match request {
                AbilityRequest::Start(index) => self.request_start(index),
                AbilityRequest::Stop { index, force } => self.request_stop(index, force),
            };
            if let Err(err) = result {
                warn!("Dropped ability request {:?}: {}", request, err);
            }
        }
    }

    /// Deliver an actor event to the abilities subscribed to its kind.
    ///
    /// Start/stop requests made by the handlers are applied on the next tick.
    /// Returns the number of abilities notified.
    pub fn dispatch_event(&mut self, event: &ActorEvent) -> usize {
        if self.destroyed {
            return 0;
        }
        let Some(subscribers) = self.subscriptions.get(&event.kind()) else {
            return 0;
        };
        let mut requests = AbilityRequests::default();
        for &index in subscribers.iter() {
            self.abilities[index].on_actor_event(event, &mut requests);
        }
        let notified = subscribers.len();
        self.queue_requests(requests);
        notified
    }

    // ---------------------------------------------------------------------
    // Immediate operations
    // ---------------------------------------------------------------------

    /// Try to start an ability right now, bypassing its input gate.
    pub fn try_start(&mut self, index: usize, ctx: &mut AbilityContext) -> Result<bool, AbilityError> {
        if index >= self.abilities.len() {
            return Err(AbilityError::InvalidIndex(index));
        }
        let started = self.attempt_start(index, None, ctx);
        self.process_requests(ctx);
        Ok(started)
    }

    /// Try to stop an ability right now. `force` skips `can_stop`.
    pub fn try_stop(
        &mut self,
        index: usize,
        force: bool,
        ctx: &mut AbilityContext,
    ) -> Result<bool, AbilityError> {
        if index >= self.abilities.len() {
            return Err(AbilityError::InvalidIndex(index));
        }
        let stopped = self.attempt_stop(index, force, None, ctx);
        self.process_requests(ctx);
        Ok(stopped)
    }

    /// Enable or disable one ability. Disabling an active ability force stops it.
    pub fn set_enabled(
        &mut self,
        index: usize,
        enabled: bool,
        ctx: &mut AbilityContext,
    ) -> Result<(), AbilityError> {
        let ability = self
            .abilities
            .get_mut(index)
            .ok_or(AbilityError::InvalidIndex(index))?;
        ability.base_mut().enabled = enabled;
        if !enabled {
            ability.base_mut().start_requested = false;
            if ability.base().is_active() {
                self.commit_stop(index, true, None, ctx);
                self.process_requests(ctx);
            }
        }
        Ok(())
    }

    /// Force stop every active ability, lowest index first.
    pub fn force_stop_all(&mut self, ctx: &mut AbilityContext) {
        for index in self.active_indices() {
            if self.abilities[index].base().is_active() {
                self.commit_stop(index, true, None, ctx);
            }
        }
    }

    /// Suspend (force stopping everything) or resume arbitration for the actor.
    pub fn set_actor_enabled(&mut self, enabled: bool, ctx: &mut AbilityContext) {
        if enabled == !self.suspended {
            return;
        }
        self.suspended = !enabled;
        if self.suspended {
            info!("Actor {:?} disabled, stopping all abilities", ctx.entity);
            self.force_stop_all(ctx);
            ctx.requests.clear();
        } else {
            info!("Actor {:?} enabled", ctx.entity);
        }
    }

    /// Final teardown: force stop, destroy hooks, drop subscriptions.
    pub fn destroy(&mut self, ctx: &mut AbilityContext) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        self.force_stop_all(ctx);
        ctx.requests.clear();
        for ability in self.abilities.iter_mut() {
            ability.on_destroy();
        }
        self.subscriptions.clear();
        debug!("Destroyed {} abilities of {:?}", self.abilities.len(), ctx.entity);
    }

    // ---------------------------------------------------------------------
    // Per-tick
    // ---------------------------------------------------------------------

    /// Run the stop pass and the start pass for this tick.
    pub fn arbitrate(&mut self, ctx: &mut AbilityContext) {
        if self.destroyed || self.suspended {
            return;
        }
        self.reset_edges(ctx);

        for index in 0..self.abilities.len() {
            let base = self.abilities[index].base();
            if !base.is_active() {
                continue;
            }
            let (force, channel) = match base.stop_requested {
                Some(force) => (force || !base.enabled, None),
                None if !base.enabled => (true, None),
                // Only a stop read from input consumes its channel.
                None => match base.gate.evaluate_stop(ctx.input) {
                    Some(channel) if base.gate.stop_trigger.needs_channel() => {
                        (false, Some(channel))
                    }
                    Some(_) => (false, None),
                    None => continue,
                },
            };
            self.abilities[index].base_mut().stop_requested = None;
            self.attempt_stop(index, force, channel, ctx);
            self.process_requests(ctx);
        }

        for index in 0..self.abilities.len() {
            let base = self.abilities[index].base();
            if base.is_active() || !base.enabled || base.misconfigured {
                continue;
            }
            let requested = base.start_requested;
            let channel = base.gate.evaluate_start(ctx.input);
            if !requested && channel.is_none() {
                continue;
            }
            self.abilities[index].base_mut().start_requested = false;
            self.attempt_start(index, channel, ctx);
            self.process_requests(ctx);
        }
    }

    /// Run the update hooks for this tick.
    ///
    /// Inactive abilities get `inactive_update` first; then each phase runs
    /// over every active ability before the next phase begins, so a later
    /// phase can validate what an earlier one proposed.
    pub fn run_phases(&mut self, ctx: &mut AbilityContext) {
        if self.destroyed || self.suspended {
            return;
        }

        for ability in self.abilities.iter_mut() {
            if !ability.base().is_active() {
                ability.inactive_update(ctx);
            }
        }

        let animator_index = self
            .exclusive
            .and_then(|i| self.abilities[i].animator_index())
            .unwrap_or(0);
        ctx.animator.set_integer(ABILITY_INDEX_PARAM, animator_index);

        let active = self.active_indices();
        for phase in UPDATE_PHASES {
            for &index in active.iter() {
                let ability = &mut self.abilities[index];
                if !ability.base().is_active() {
                    continue;
                }
                match phase {
                    UpdatePhase::Animator => ability.update_animator(ctx),
                    UpdatePhase::RotationProposal => ability.update_rotation(ctx),
                    UpdatePhase::RotationCommit => ability.apply_rotation(ctx),
                    UpdatePhase::PositionProposal => ability.update_position(ctx),
                    UpdatePhase::PositionCommit => ability.apply_position(ctx),
                    UpdatePhase::Late => ability.late_update(ctx),
                }
            }
        }

        self.process_requests(ctx);
    }

    /// Replicated state of every ability.
    pub fn sync_snapshot(&self) -> Vec<AbilitySyncState> {
        self.abilities
            .iter()
            .map(|a| AbilitySyncState {
                index: a.base().index,
                name: a.name().to_string(),
                active: a.base().is_active(),
                data: a.sync_data(),
            })
            .collect()
    }

    /// Apply replicated state: payloads are handed to the abilities, active
    /// flags become start / forced stop requests for the next tick.
    pub fn apply_sync_snapshot(&mut self, states: &[AbilitySyncState]) -> Result<(), AbilityError> {
        for state in states {
            let ability = self
                .abilities
                .get_mut(state.index)
                .ok_or(AbilityError::InvalidIndex(state.index))?;
            if let Some(data) = &state.data {
                ability.apply_sync_data(data);
            }
            let active = ability.base().is_active();
            if state.active && !active {
                self.request_start(state.index)?;
            } else if !state.active && active {
                self.request_stop(state.index, true)?;
            }
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------------

    fn reset_edges(&mut self, ctx: &AbilityContext) {
        for ability in self.abilities.iter_mut() {
            let checks: SmallVec<[bool; MAX_INPUT_CHANNELS]> = (0..ability.base().gate.channels().len())
                .map(|channel| ability.should_check_input(channel))
                .collect();
            let active = ability.base().is_active();
            ability
                .base_mut()
                .gate
                .reset_edges(ctx.input, active, |channel| {
                    checks.get(channel).copied().unwrap_or(true)
                });
        }
    }

    fn process_requests(&mut self, ctx: &mut AbilityContext) {
        let mut processed = 0;
        while let Some(request) = ctx.requests.pop() {
            if processed == MAX_REQUESTS_PER_DRAIN {
                warn!(
                    "Ability requests of {:?} keep cascading, dropping {} pending",
                    ctx.entity,
                    ctx.requests.len() + 1
                );
                ctx.requests.clear();
                break;
            }
            processed += 1;
            match request {
                AbilityRequest::Start(index) if index < self.abilities.len() => {
                    self.attempt_start(index, None, ctx);
                }
                AbilityRequest::Stop { index, force } if index < self.abilities.len() => {
                    self.attempt_stop(index, force, None, ctx);
                }
                other => warn!("Dropped ability request {:?}: no such ability", other),
            }
        }
    }

    fn attempt_start(&mut self, index: usize, channel: Option<usize>, ctx: &mut AbilityContext) -> bool {
        if self.destroyed || self.suspended {
            return false;
        }
        let candidate: &dyn Ability = &*self.abilities[index];
        let base = candidate.base();
        if base.is_active() || !base.enabled || base.misconfigured {
            return false;
        }
        if !candidate.can_start(ctx) {
            return false;
        }

        let concurrent = candidate.is_concurrent();
        let active = self.active_indices();

        if !concurrent {
            for &other in active.iter().filter(|&&other| other < index) {
                if self.abilities[other].should_block_start(candidate) {
                    debug!(
                        "'{}' blocked by '{}'",
                        candidate.name(),
                        self.abilities[other].name()
                    );
                    return false;
                }
            }
        }

        let mut to_stop: SmallVec<[usize; 8]> = active
            .iter()
            .copied()
            .filter(|&other| other > index)
            .filter(|&other| candidate.should_stop_active_ability(&*self.abilities[other]))
            .collect();

        if !concurrent {
            if let Some(occupant) = self.exclusive {
                if occupant < index {
                    debug!(
                        "'{}' cannot take the exclusive slot from '{}'",
                        candidate.name(),
                        self.abilities[occupant].name()
                    );
                    return false;
                }
                if !to_stop.contains(&occupant) {
                    to_stop.push(occupant);
                }
            }
        }

        for other in to_stop {
            if self.abilities[other].base().is_active() {
                debug!(
                    "'{}' stops '{}'",
                    self.abilities[index].name(),
                    self.abilities[other].name()
                );
                self.commit_stop(other, true, None, ctx);
            }
        }

        self.commit_start(index, channel, ctx);
        true
    }

    fn attempt_stop(
        &mut self,
        index: usize,
        force: bool,
        channel: Option<usize>,
        ctx: &mut AbilityContext,
    ) -> bool {
        let ability = &mut self.abilities[index];
        if !ability.base().is_active() {
            return false;
        }
        ability.will_try_stop(ctx);
        if !force && !ability.can_stop(ctx) {
            return false;
        }
        self.commit_stop(index, force, channel, ctx);
        true
    }

    fn commit_start(&mut self, index: usize, channel: Option<usize>, ctx: &mut AbilityContext) {
        let concurrent = self.abilities[index].is_concurrent();
        let slot = if concurrent {
            self.free_concurrent_slot()
        } else {
            0
        };
        if concurrent {
            self.concurrent.push(index);
        } else {
            self.exclusive = Some(index);
        }

        let ability = &mut self.abilities[index];
        let base = ability.base_mut();
        base.active_slot = Some(slot);
        base.start_time = Some(ctx.time.elapsed);
        base.start_requested = false;
        base.stop_requested = None;
        if let Some(channel) = channel {
            base.gate.consume(channel);
        }
        base.gate.reset_toggles();

        debug!(
            "{:?} started '{}' (priority {}, slot {})",
            ctx.entity,
            ability.name(),
            index,
            slot
        );
        ability.on_start(ctx);
        ctx.transitions.push(AbilityTransition {
            index,
            name: ability.name(),
            started: true,
            forced: false,
        });
    }

    fn commit_stop(&mut self, index: usize, force: bool, channel: Option<usize>, ctx: &mut AbilityContext) {
        if self.exclusive == Some(index) {
            self.exclusive = None;
        }
        self.concurrent.retain(|&mut i| i != index);

        let ability = &mut self.abilities[index];
        let base = ability.base_mut();
        base.active_slot = None;
        base.start_time = None;
        base.stop_requested = None;
        if let Some(channel) = channel {
            base.gate.consume(channel);
        }
        base.gate.reset_toggles();

        debug!(
            "{:?} stopped '{}' (priority {}, forced {})",
            ctx.entity,
            ability.name(),
            index,
            force
        );
        ability.on_stop(ctx, force);
        ctx.transitions.push(AbilityTransition {
            index,
            name: ability.name(),
            started: false,
            forced: force,
        });
    }

    fn free_concurrent_slot(&self) -> usize {
        let taken: SmallVec<[usize; 4]> = self
            .concurrent
            .iter()
            .filter_map(|&i| self.abilities[i].base().active_slot)
            .collect();
        (1..).find(|slot| !taken.contains(slot)).unwrap_or(1)
    }
}

impl fmt::Debug for Abilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Abilities")
            .field(
                "abilities",
                &self.abilities.iter().map(|a| a.name()).collect::<Vec<_>>(),
            )
            .field("exclusive", &self.exclusive)
            .field("concurrent", &self.concurrent)
            .field("config_errors", &self.config_errors)
            .field("suspended", &self.suspended)
            .field("destroyed", &self.destroyed)
            .finish()
    }
}
