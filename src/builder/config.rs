//! Builder for constructing machine configurations.

use crate::builder::error::BuildError;
use crate::config::{Config, ConfigDocument};
use crate::core::{Context, MachineState, StateGraph};
use crate::listener::{listener, Cleanup, Listener, Phase, Sender};
use std::collections::BTreeMap;

/// Builder for [`Config`] with a fluent API.
///
/// # Example
///
/// ```rust
/// use rewind::builder::ConfigBuilder;
/// use rewind::listener::Cleanup;
/// use serde_json::json;
///
/// let config = ConfigBuilder::new()
///     .id("feed")
///     .initial("loading")
///     .context(json!({ "posts": [] }))
///     .transition("loading", "loaded", "ready")
///     .transition("ready", "loadMore", "loading")
///     .on_change(|state, _send| {
///         println!("feed is {}", state.value);
///         Cleanup::none()
///     })
///     .build()
///     .unwrap();
///
/// assert_eq!(config.signature(), config.signature());
/// ```
pub struct ConfigBuilder<C: Context> {
    id: Option<String>,
    initial: Option<String>,
    context: Option<C>,
    states: StateGraph,
    listeners: BTreeMap<Phase, Vec<Listener<C>>>,
}

impl<C: Context> ConfigBuilder<C> {
    pub fn new() -> Self {
        Self {
            id: None,
            initial: None,
            context: None,
            states: StateGraph::new(),
            listeners: BTreeMap::new(),
        }
    }

    /// Start from a parsed configuration document.
    pub fn from_document(document: ConfigDocument<C>) -> Self {
        Self {
            id: document.id,
            initial: Some(document.initial),
            context: Some(document.context),
            states: document.states,
            listeners: BTreeMap::new(),
        }
    }

    /// Start from the JSON configuration format.
    pub fn from_json(text: &str) -> Result<Self, BuildError> {
        let document: ConfigDocument<C> =
            serde_json::from_str(text).map_err(|e| BuildError::Document(e.to_string()))?;
        Ok(Self::from_document(document))
    }

    /// Set the id (optional, defaults to empty).
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the initial state (required).
    pub fn initial(mut self, state: impl Into<String>) -> Self {
        self.initial = Some(state.into());
        self
    }

    /// Set the initial context (required).
    pub fn context(mut self, context: C) -> Self {
        self.context = Some(context);
        self
    }

    /// Declare a state and its outgoing events.
    pub fn state<E, T>(mut self, name: impl Into<String>, transitions: impl IntoIterator<Item = (E, T)>) -> Self
    where
        E: Into<String>,
        T: Into<String>,
    {
        let name = name.into();
        self.states.insert_state(name.clone());
        for (event, target) in transitions {
            self.states.insert_transition(name.clone(), event, target);
        }
        self
    }

    /// Declare a single transition.
    pub fn transition(
        mut self,
        from: impl Into<String>,
        event: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        self.states.insert_transition(from, event, to);
        self
    }

    /// Declare a state with no outgoing events.
    pub fn terminal(mut self, name: impl Into<String>) -> Self {
        self.states.insert_state(name);
        self
    }

    /// Merge a whole graph in. Transitions already declared for the same
    /// (state, event) pair are overwritten.
    pub fn states(mut self, graph: StateGraph) -> Self {
        for state in graph.states() {
            self.states.insert_state(state);
            for (event, target) in graph.transitions(state).into_iter().flatten() {
                self.states.insert_transition(state, event.as_str(), target.as_str());
            }
        }
        self
    }

    /// Register a listener for `phase`.
    pub fn on(mut self, phase: Phase, listener: Listener<C>) -> Self {
        self.listeners.entry(phase).or_default().push(listener);
        self
    }

    pub fn on_start<F>(self, f: F) -> Self
    where
        F: Fn(&MachineState<C>, Sender<C>) -> Cleanup + Send + Sync + 'static,
    {
        self.on(Phase::Start, listener(f))
    }

    pub fn on_change<F>(self, f: F) -> Self
    where
        F: Fn(&MachineState<C>, Sender<C>) -> Cleanup + Send + Sync + 'static,
    {
        self.on(Phase::Change, listener(f))
    }

    pub fn on_done<F>(self, f: F) -> Self
    where
        F: Fn(&MachineState<C>, Sender<C>) -> Cleanup + Send + Sync + 'static,
    {
        self.on(Phase::Done, listener(f))
    }

    /// Validate and sign the configuration.
    pub fn build(self) -> Result<Config<C>, BuildError> {
        let initial = self.initial.ok_or(BuildError::MissingInitialState)?;
        let context = self.context.ok_or(BuildError::MissingContext)?;

        if self.states.is_empty() {
            return Err(BuildError::NoStates);
        }

        Config::assemble(
            self.id.unwrap_or_default(),
            initial,
            context,
            self.states,
            self.listeners,
        )
    }
}

impl<C: Context> Default for ConfigBuilder<C> {
    fn default() -> Self {
        Self::new()
    }
}
