//! History nodes.
//!
//! Every accepted transition produces a new [`MachineState`]. Nodes live in a
//! [`StateHistory`](super::StateHistory) arena and link to their neighbours by
//! arena index rather than by reference.

use super::context::Context;
use super::graph::StateGraph;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identity of a history node.
///
/// Identities are never reused, so comparing them tells whether the machine
/// has moved since a node was observed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(Uuid);

impl NodeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A node in the machine's history.
///
/// `done` is true iff the graph entry for `value` has no outgoing events.
/// `prev` is set once at creation; `next` is rewritten only when a new
/// transition is recorded from this node while it is not the tip.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct MachineState<C: Context> {
    /// Current state name, always a key of the graph
    pub value: String,
    pub context: C,
    /// Event that produced this node, `None` for the initial node
    pub event: Option<String>,
    pub done: bool,
    /// Arena index of the previous node
    pub prev: Option<usize>,
    /// Arena index of the next node, if any is still attached
    pub next: Option<usize>,
    pub id: NodeId,
}

impl<C: Context> MachineState<C> {
    /// Initial node for a fresh history.
    pub fn initial(value: impl Into<String>, context: C, graph: &StateGraph) -> Self {
        let mut node = Self {
            value: value.into(),
            context,
            event: None,
            done: false,
            prev: None,
            next: None,
            id: NodeId::new(),
        };
        node.refresh_done(graph);
        node
    }

    /// Recompute the terminal flag against `graph`.
    pub fn refresh_done(&mut self, graph: &StateGraph) {
        self.done = graph.is_terminal(&self.value);
    }

    pub fn is_initial(&self) -> bool {
        self.prev.is_none()
    }
}
