//! Bidirectional history ledger.
//!
//! The ledger is an arena of [`MachineState`] nodes plus a cursor naming the
//! active node. Nodes reference each other by arena index. Only one chain is
//! ever reachable: recording from a node that is not the tip discards the
//! forward branch, and the arena is truncated so discarded nodes are freed.

use super::context::Context;
use super::graph::StateGraph;
use super::state::{MachineState, NodeId};
use serde::{Deserialize, Serialize};

/// Arena of history nodes with an active cursor.
///
/// # Example
///
/// ```rust
/// use rewind::core::{MachineState, StateGraph, StateHistory};
///
/// let graph = StateGraph::new()
///     .with_transition("off", "toggle", "on")
///     .with_transition("on", "toggle", "off");
///
/// let mut history = StateHistory::new(MachineState::initial("off", (), &graph));
/// history.record("on", (), "toggle", &graph);
/// history.record("off", (), "toggle", &graph);
///
/// assert_eq!(history.get_path(), vec!["off", "on", "off"]);
/// assert_eq!(history.current().value, "off");
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "", try_from = "HistoryParts<C>")]
pub struct StateHistory<C: Context> {
    nodes: Vec<MachineState<C>>,
    cursor: usize,
}

#[derive(Deserialize)]
#[serde(bound = "")]
struct HistoryParts<C: Context> {
    nodes: Vec<MachineState<C>>,
    cursor: usize,
}

impl<C: Context> TryFrom<HistoryParts<C>> for StateHistory<C> {
    type Error = String;

    fn try_from(parts: HistoryParts<C>) -> Result<Self, Self::Error> {
        check_chain(&parts.nodes, parts.cursor)?;
        Ok(Self {
            nodes: parts.nodes,
            cursor: parts.cursor,
        })
    }
}

/// The arena is a single chain: node `i` links back to `i - 1` and forward
/// to `i + 1`, with open ends at the root and the tip.
fn check_chain<C: Context>(nodes: &[MachineState<C>], cursor: usize) -> Result<(), String> {
    if cursor >= nodes.len() {
        return Err(format!(
            "cursor {cursor} is out of range for {} nodes",
            nodes.len()
        ));
    }
    let last = nodes.len() - 1;
    for (index, node) in nodes.iter().enumerate() {
        let prev = index.checked_sub(1);
        let next = (index < last).then_some(index + 1);
        if node.prev != prev || node.next != next {
            return Err(format!("node {index} is not linked to its neighbours"));
        }
    }
    Ok(())
}

impl<C: Context> StateHistory<C> {
    /// Start a history from a root node. Any links on `root` are cleared.
    pub fn new(mut root: MachineState<C>) -> Self {
        root.prev = None;
        root.next = None;
        Self {
            nodes: vec![root],
            cursor: 0,
        }
    }

    /// Rebuild a ledger from previously captured parts. Returns `None` when
    /// the cursor does not address a node or the links do not form a chain.
    pub fn from_parts(nodes: Vec<MachineState<C>>, cursor: usize) -> Option<Self> {
        check_chain(&nodes, cursor).ok()?;
        Some(Self { nodes, cursor })
    }

    pub fn current(&self) -> &MachineState<C> {
        &self.nodes[self.cursor]
    }

    pub fn current_id(&self) -> NodeId {
        self.current().id
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn get(&self, index: usize) -> Option<&MachineState<C>> {
        self.nodes.get(index)
    }

    pub fn nodes(&self) -> &[MachineState<C>] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn is_tip(&self) -> bool {
        self.current().next.is_none()
    }

    /// Append a node after the cursor and move onto it.
    ///
    /// If the cursor is not at the tip, the forward branch from the cursor is
    /// discarded before the new node is linked in.
    pub fn record(
        &mut self,
        value: impl Into<String>,
        context: C,
        event: impl Into<String>,
        graph: &StateGraph,
    ) -> &MachineState<C> {
        let from = self.cursor;
        self.nodes.truncate(from + 1);

        let mut node = MachineState {
            value: value.into(),
            context,
            event: Some(event.into()),
            done: false,
            prev: Some(from),
            next: None,
            id: NodeId::new(),
        };
        node.refresh_done(graph);

        let index = self.nodes.len();
        self.nodes.push(node);
        self.nodes[from].next = Some(index);
        self.cursor = index;
        &self.nodes[index]
    }

    /// Move the cursor onto an existing node.
    ///
    /// Returns `false` and leaves the cursor unchanged if `index` is out of
    /// range.
    pub fn move_to(&mut self, index: usize, graph: &StateGraph) -> bool {
        match self.nodes.get_mut(index) {
            Some(node) => {
                node.refresh_done(graph);
                self.cursor = index;
                true
            }
            None => false,
        }
    }

    /// Nodes before the cursor, nearest first, paired with their arena index.
    pub fn backward(&self) -> impl Iterator<Item = (usize, &MachineState<C>)> {
        let mut at = self.current().prev;
        std::iter::from_fn(move || {
            let index = at?;
            let node = self.nodes.get(index)?;
            at = node.prev;
            Some((index, node))
        })
    }

    /// Nodes after the cursor, nearest first, paired with their arena index.
    pub fn forward(&self) -> impl Iterator<Item = (usize, &MachineState<C>)> {
        let mut at = self.current().next;
        std::iter::from_fn(move || {
            let index = at?;
            let node = self.nodes.get(index)?;
            at = node.next;
            Some((index, node))
        })
    }

    /// State values from the root of the chain to its tip.
    pub fn get_path(&self) -> Vec<&str> {
        self.nodes.iter().map(|node| node.value.as_str()).collect()
    }
}
