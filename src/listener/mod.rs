//! Listener lifecycle.
//!
//! Listeners are notified in three phases:
//! - `onStart` when the active node has no previous node
//! - `onChange` on every move of the active node and on `start()`
//! - `onDone` when the active node is terminal
//!
//! Each listener may leave a [`Cleanup`]. Before a listener runs again for
//! the same phase, its previous cleanup is awaited and run, so a side effect
//! is always torn down before the next one is scheduled. Listeners receive a
//! [`Sender`] that drops sends once the machine has moved on.

mod cleanup;
pub(crate) mod registry;
mod sender;

pub use cleanup::Cleanup;
pub use sender::Sender;

use crate::core::{Context, MachineState};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Notification phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Phase {
    #[serde(rename = "onStart")]
    Start,
    #[serde(rename = "onChange")]
    Change,
    #[serde(rename = "onDone")]
    Done,
}

impl Phase {
    /// All phases in notification order.
    pub const ALL: [Phase; 3] = [Phase::Start, Phase::Change, Phase::Done];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "onStart",
            Self::Change => "onChange",
            Self::Done => "onDone",
        }
    }

    /// Whether a notification in this phase concerns `state`.
    pub fn applies_to<C: Context>(&self, state: &MachineState<C>) -> bool {
        match self {
            Self::Start => state.is_initial(),
            Self::Change => true,
            Self::Done => state.done,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Listener callback. Identity is the `Arc` allocation, so keep a clone of
/// the listener to remove it later.
pub type Listener<C> = Arc<dyn Fn(&MachineState<C>, Sender<C>) -> Cleanup + Send + Sync>;

/// Wrap a closure as a [`Listener`].
///
/// # Example
///
/// ```rust
/// use rewind::listener::{listener, Cleanup, Listener};
/// use serde_json::Value;
///
/// let log: Listener<Value> = listener(|state, _send| {
///     println!("now in {}", state.value);
///     Cleanup::none()
/// });
/// ```
pub fn listener<C, F>(f: F) -> Listener<C>
where
    C: Context,
    F: Fn(&MachineState<C>, Sender<C>) -> Cleanup + Send + Sync + 'static,
{
    Arc::new(f)
}

pub(crate) fn same_listener<C: Context>(a: &Listener<C>, b: &Listener<C>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}
