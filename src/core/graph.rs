//! Declarative transition graph.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// Event-to-target mapping for a single state.
pub type Transitions = BTreeMap<String, String>;

/// Mapping from state name to its outgoing transitions.
///
/// A state whose transition map is empty is terminal. Each (state, event)
/// pair has at most one static target.
///
/// # Example
///
/// ```rust
/// use rewind::core::StateGraph;
///
/// let graph = StateGraph::new()
///     .with_transition("off", "toggle", "on")
///     .with_transition("on", "toggle", "off");
///
/// assert_eq!(graph.target("off", "toggle"), Some("on"));
/// assert_eq!(graph.target("off", "spin"), None);
/// assert!(!graph.is_terminal("on"));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateGraph {
    states: BTreeMap<String, Transitions>,
}

impl StateGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a state with no outgoing events (terminal until transitions
    /// are added to it).
    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.insert_state(state);
        self
    }

    /// Declare `from --event--> to`. Only `from` is created implicitly;
    /// validation reports targets missing from the graph.
    pub fn with_transition(
        mut self,
        from: impl Into<String>,
        event: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        self.insert_transition(from, event, to);
        self
    }

    pub fn insert_state(&mut self, state: impl Into<String>) {
        self.states.entry(state.into()).or_default();
    }

    pub fn insert_transition(
        &mut self,
        from: impl Into<String>,
        event: impl Into<String>,
        to: impl Into<String>,
    ) {
        self.states
            .entry(from.into())
            .or_default()
            .insert(event.into(), to.into());
    }

    /// Target of `event` from `state`, if the graph defines one.
    pub fn target(&self, state: &str, event: &str) -> Option<&str> {
        self.states
            .get(state)
            .and_then(|events| events.get(event))
            .map(String::as_str)
    }

    pub fn contains(&self, state: &str) -> bool {
        self.states.contains_key(state)
    }

    /// A state is terminal when it is in the graph and has no outgoing events.
    pub fn is_terminal(&self, state: &str) -> bool {
        self.states.get(state).is_some_and(BTreeMap::is_empty)
    }

    pub fn transitions(&self, state: &str) -> Option<&Transitions> {
        self.states.get(state)
    }

    pub fn states(&self) -> impl Iterator<Item = &str> {
        self.states.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// States reachable from `start` by following transitions, `start`
    /// included when it is in the graph.
    pub fn reachable_from(&self, start: &str) -> BTreeSet<&str> {
        let mut seen = BTreeSet::new();
        let Some((first, _)) = self.states.get_key_value(start) else {
            return seen;
        };

        let mut queue = VecDeque::from([first.as_str()]);
        seen.insert(first.as_str());
        while let Some(state) = queue.pop_front() {
            for target in self.states[state].values() {
                if let Some((key, _)) = self.states.get_key_value(target.as_str()) {
                    if seen.insert(key.as_str()) {
                        queue.push_back(key.as_str());
                    }
                }
            }
        }
        seen
    }
}

impl FromIterator<(String, Transitions)> for StateGraph {
    fn from_iter<I: IntoIterator<Item = (String, Transitions)>>(iter: I) -> Self {
        Self {
            states: iter.into_iter().collect(),
        }
    }
}
