//! Machine configuration.
//!
//! A [`Config`] is immutable once built: it is validated and signed at
//! construction and shared between machine instances behind an `Arc`.

mod signature;
mod validate;

pub(crate) use signature::composite_signature;
pub use validate::{validate_graph, GraphViolation};

use crate::builder::{BuildError, ConfigBuilder};
use crate::core::{Context, StateGraph};
use crate::listener::{Listener, Phase};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Validated, signed machine configuration.
pub struct Config<C: Context> {
    id: String,
    initial: String,
    context: C,
    states: StateGraph,
    listeners: BTreeMap<Phase, Vec<Listener<C>>>,
    signature: String,
}

impl<C: Context> Config<C> {
    pub fn builder() -> ConfigBuilder<C> {
        ConfigBuilder::new()
    }

    /// Parse the JSON configuration format
    /// (`{ "id"?, "initial", "context", "states" }`).
    ///
    /// # Example
    ///
    /// ```rust
    /// use rewind::Config;
    /// use serde_json::Value;
    ///
    /// let config: Config<Value> = Config::from_json(r#"{
    ///     "id": "switch",
    ///     "initial": "off",
    ///     "context": {},
    ///     "states": { "on": { "toggle": "off" }, "off": { "toggle": "on" } }
    /// }"#).unwrap();
    ///
    /// assert_eq!(config.initial(), "off");
    /// assert!(config.signature().starts_with("switch-"));
    /// ```
    pub fn from_json(text: &str) -> Result<Self, BuildError> {
        ConfigBuilder::from_json(text)?.build()
    }

    pub(crate) fn assemble(
        id: String,
        initial: String,
        context: C,
        states: StateGraph,
        listeners: BTreeMap<Phase, Vec<Listener<C>>>,
    ) -> Result<Self, BuildError> {
        validate::into_result(validate_graph(&states, &initial))
            .map_err(BuildError::InvalidGraph)?;

        let counts = listeners
            .iter()
            .filter(|(_, list)| !list.is_empty())
            .map(|(phase, list)| (*phase, list.len()))
            .collect();
        let signature = signature::config_signature(&id, &initial, &context, &states, counts)?;

        Ok(Self {
            id,
            initial,
            context,
            states,
            listeners,
            signature,
        })
    }

    /// Derive a distinct configuration with a different initial state and/or
    /// a context patch merged onto this one's context.
    pub fn configured(&self, overrides: ConfigOverride<C>) -> Result<Self, BuildError> {
        let initial = overrides.initial.unwrap_or_else(|| self.initial.clone());
        let context = match overrides.context {
            Some(patch) => self.context.merge(patch),
            None => self.context.clone(),
        };
        Self::assemble(
            self.id.clone(),
            initial,
            context,
            self.states.clone(),
            self.listeners.clone(),
        )
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn initial(&self) -> &str {
        &self.initial
    }

    pub fn context(&self) -> &C {
        &self.context
    }

    pub fn states(&self) -> &StateGraph {
        &self.states
    }

    pub fn listeners(&self, phase: Phase) -> &[Listener<C>] {
        self.listeners
            .get(&phase)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// `"{id}-{hash}"`, stable for identical configurations.
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Serializable part of the configuration.
    pub fn document(&self) -> ConfigDocument<C> {
        ConfigDocument {
            id: (!self.id.is_empty()).then(|| self.id.clone()),
            initial: self.initial.clone(),
            context: self.context.clone(),
            states: self.states.clone(),
        }
    }
}

impl<C: Context> fmt::Debug for Config<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let listeners: BTreeMap<Phase, usize> = self
            .listeners
            .iter()
            .map(|(phase, list)| (*phase, list.len()))
            .collect();
        f.debug_struct("Config")
            .field("id", &self.id)
            .field("initial", &self.initial)
            .field("context", &self.context)
            .field("states", &self.states)
            .field("listeners", &listeners)
            .field("signature", &self.signature)
            .finish()
    }
}

/// Overrides for [`Config::configured`].
pub struct ConfigOverride<C: Context> {
    pub initial: Option<String>,
    pub context: Option<C::Patch>,
}

impl<C: Context> ConfigOverride<C> {
    pub fn new() -> Self {
        Self {
            initial: None,
            context: None,
        }
    }

    pub fn initial(mut self, initial: impl Into<String>) -> Self {
        self.initial = Some(initial.into());
        self
    }

    pub fn context(mut self, patch: C::Patch) -> Self {
        self.context = Some(patch);
        self
    }
}

impl<C: Context> Default for ConfigOverride<C> {
    fn default() -> Self {
        Self::new()
    }
}

/// The declarative, serializable part of a configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct ConfigDocument<C: Context> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub initial: String,
    pub context: C,
    pub states: StateGraph,
}
