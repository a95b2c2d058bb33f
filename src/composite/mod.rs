//! Composite controller.
//!
//! A [`Composite`] groups independently configured machines under one handle.
//! Every operation is broadcast to all members in declaration order with
//! identical arguments. Members stay independent: an event only moves the
//! members whose active state defines it.

mod error;

pub use error::CompositeError;

use crate::config::{composite_signature, Config};
use crate::core::{Context, ContextPatch, Guard, MachineState};
use crate::listener::{Listener, Phase};
use crate::machine::Machine;
use std::sync::Arc;
use tracing::debug;

/// Broadcast handle over named machines.
///
/// # Example
///
/// ```rust
/// use rewind::{Composite, Config};
///
/// let lever = |id: &str| {
///     Config::builder()
///         .id(id)
///         .initial("off")
///         .context(())
///         .transition("off", "up", "low")
///         .transition("low", "up", "high")
///         .transition("high", "down", "low")
///         .transition("low", "down", "off")
///         .build()
///         .unwrap()
/// };
/// let pedals = Config::builder()
///     .id("pedals")
///     .initial("idle")
///     .context(())
///     .transition("idle", "gas", "accelerating")
///     .transition("accelerating", "release", "idle")
///     .build()
///     .unwrap();
///
/// let car = Composite::from_configs(
///     "car",
///     [("wipers", lever("wipers")), ("pedals", pedals)],
/// )
/// .unwrap();
///
/// assert!(car.send("up"));
/// assert_eq!(car.member("wipers").unwrap().value(), "low");
/// assert_eq!(car.member("pedals").unwrap().value(), "idle");
/// ```
#[derive(Clone, Debug)]
pub struct Composite<C: Context> {
    id: String,
    members: Vec<(String, Machine<C>)>,
    signature: String,
}

impl<C: Context> Composite<C> {
    /// Group existing machines. Member names must be unique.
    pub fn new<N>(
        id: impl Into<String>,
        members: impl IntoIterator<Item = (N, Machine<C>)>,
    ) -> Result<Self, CompositeError>
    where
        N: Into<String>,
    {
        let id = id.into();
        let mut named: Vec<(String, Machine<C>)> = Vec::new();
        for (name, machine) in members {
            let name = name.into();
            if named.iter().any(|(existing, _)| *existing == name) {
                return Err(CompositeError::DuplicateMember(name));
            }
            named.push((name, machine));
        }

        let signature = composite_signature(
            &id,
            named
                .iter()
                .map(|(name, machine)| (name.as_str(), machine.signature())),
        );
        debug!(composite = %id, members = named.len(), "composite created");

        Ok(Self {
            id,
            members: named,
            signature,
        })
    }

    /// Create one machine per configuration and group them.
    pub fn from_configs<N>(
        id: impl Into<String>,
        configs: impl IntoIterator<Item = (N, Config<C>)>,
    ) -> Result<Self, CompositeError>
    where
        N: Into<String>,
    {
        let machines: Vec<(N, Machine<C>)> = configs
            .into_iter()
            .map(|(name, config)| (name, Machine::create(config)))
            .collect();
        Self::new(id, machines)
    }

    /// Composite id, also the prefix of member persistence keys.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Derived from the id and each member's name and signature.
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Member registered under `name`.
    pub fn member(&self, name: &str) -> Option<&Machine<C>> {
        self.members
            .iter()
            .find(|(member, _)| member == name)
            .map(|(_, machine)| machine)
    }

    /// Members in registration order.
    pub fn members(&self) -> impl Iterator<Item = (&str, &Machine<C>)> {
        self.members
            .iter()
            .map(|(name, machine)| (name.as_str(), machine))
    }

    /// Member names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(|(name, _)| name.as_str())
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Snapshot of every member's active node.
    pub fn states(&self) -> Vec<(&str, MachineState<C>)> {
        self.members()
            .map(|(name, machine)| (name, machine.state()))
            .collect()
    }

    /// Persistence key of a member: `"{composite id}-{member signature}"`.
    pub fn member_key(&self, name: &str) -> Option<String> {
        self.member(name).map(|machine| self.key_for(machine))
    }

    pub(crate) fn key_for(&self, machine: &Machine<C>) -> String {
        format!("{}-{}", self.id, machine.signature())
    }

    /// Send `event` to every member. Returns `true` if any member moved.
    pub fn send(&self, event: &str) -> bool {
        self.broadcast(|machine| machine.send(event))
    }

    /// Like [`send`](Self::send), handing each member a clone of `patch`.
    pub fn send_with(&self, event: &str, patch: ContextPatch<C>) -> bool
    where
        C::Patch: Clone,
    {
        self.broadcast(|machine| machine.send_with(event, patch.clone()))
    }

    /// Start every member.
    pub fn start(&self) {
        for (_, machine) in &self.members {
            machine.start();
        }
    }

    /// Stop every member.
    pub fn stop(&self) {
        for (_, machine) in &self.members {
            machine.stop();
        }
    }

    /// Register the same listener on every member.
    pub fn add_event_listener(&self, phase: Phase, listener: Listener<C>) {
        for (_, machine) in &self.members {
            machine.add_event_listener(phase, Arc::clone(&listener));
        }
    }

    /// Unregister `listener` from every member.
    pub fn remove_event_listener(&self, phase: Phase, listener: &Listener<C>) {
        for (_, machine) in &self.members {
            machine.remove_event_listener(phase, listener);
        }
    }

    /// Destroy every member in turn.
    pub async fn destroy(&self) {
        for (_, machine) in &self.members {
            machine.destroy().await;
        }
    }

    /// Navigator that moves every member at once.
    pub fn history(&self) -> CompositeHistory<'_, C> {
        CompositeHistory { composite: self }
    }

    fn broadcast(&self, mut op: impl FnMut(&Machine<C>) -> bool) -> bool {
        let mut moved = false;
        for (_, machine) in &self.members {
            moved |= op(machine);
        }
        moved
    }
}

/// History navigation broadcast to every member.
///
/// Each method returns `true` if at least one member moved.
pub struct CompositeHistory<'a, C: Context> {
    composite: &'a Composite<C>,
}

impl<C: Context> CompositeHistory<'_, C> {
    /// Undo on every member.
    pub fn undo(&self) -> bool {
        self.composite.broadcast(|machine| machine.history().undo())
    }

    /// Undo on every member whose active node `guard` accepts.
    pub fn undo_when(&self, guard: &Guard<C>) -> bool {
        self.composite
            .broadcast(|machine| machine.history().undo_when(guard))
    }

    /// Redo on every member.
    pub fn redo(&self) -> bool {
        self.composite.broadcast(|machine| machine.history().redo())
    }

    /// Redo on every member whose active node `guard` accepts.
    pub fn redo_when(&self, guard: &Guard<C>) -> bool {
        self.composite
            .broadcast(|machine| machine.history().redo_when(guard))
    }

    /// Step every member back one node.
    pub fn rewind(&self) -> bool {
        self.composite.broadcast(|machine| machine.history().rewind())
    }

    /// Walk every member back to the first node `guard` accepts.
    pub fn rewind_when(&self, guard: &Guard<C>) -> bool {
        self.composite
            .broadcast(|machine| machine.history().rewind_when(guard))
    }

    /// Step every member forward one node.
    pub fn fast_forward(&self) -> bool {
        self.composite
            .broadcast(|machine| machine.history().fast_forward())
    }

    /// Walk every member forward to the first node `guard` accepts.
    pub fn fast_forward_when(&self, guard: &Guard<C>) -> bool {
        self.composite
            .broadcast(|machine| machine.history().fast_forward_when(guard))
    }

    /// Reset every member to its configured initial node.
    pub fn reset(&self) {
        for (_, machine) in &self.composite.members {
            machine.history().reset();
        }
    }
}
