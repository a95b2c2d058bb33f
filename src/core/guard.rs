//! Predicates for history navigation.
//!
//! Guards decide where `undo`, `redo`, `rewind` and `fast_forward` land.
//! They are pure functions of a node and its offset from the active node.

use super::context::Context;
use super::state::MachineState;
use std::fmt;
use std::sync::Arc;

/// Pure predicate over a history node and its signed offset from the active
/// node (`0` for the active node itself, negative behind it, positive ahead).
///
/// Cloning a guard shares the predicate, so the same guard can be handed to
/// several machines.
///
/// # Example
///
/// ```rust
/// use rewind::core::{Guard, MachineState, StateGraph};
///
/// let graph = StateGraph::new().with_transition("idle", "stop", "idle");
/// let stopped = Guard::new(|state: &MachineState<()>, _| state.event.as_deref() == Some("stop"));
///
/// let node = MachineState::initial("idle", (), &graph);
/// assert!(!stopped.check(&node, 0));
/// ```
pub struct Guard<C: Context> {
    predicate: Arc<dyn Fn(&MachineState<C>, isize) -> bool + Send + Sync>,
}

impl<C: Context> Guard<C> {
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&MachineState<C>, isize) -> bool + Send + Sync + 'static,
    {
        Guard {
            predicate: Arc::new(predicate),
        }
    }

    /// Guard that only looks at the node's state value.
    pub fn value(value: impl Into<String>) -> Self {
        let value = value.into();
        Self::new(move |state, _| state.value == value)
    }

    /// Guard that matches nodes produced by `event`.
    pub fn event(event: impl Into<String>) -> Self {
        let event = event.into();
        Self::new(move |state, _| state.event.as_deref() == Some(event.as_str()))
    }

    pub fn check(&self, state: &MachineState<C>, index: isize) -> bool {
        (self.predicate)(state, index)
    }
}

impl<C: Context> Clone for Guard<C> {
    fn clone(&self) -> Self {
        Self {
            predicate: Arc::clone(&self.predicate),
        }
    }
}

impl<C: Context> fmt::Debug for Guard<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Guard").finish_non_exhaustive()
    }
}
