//! Stale-guarded send handle given to listeners.

use crate::core::{Context, ContextPatch, NodeId};
use crate::machine::{Machine, MachineRef};
use std::fmt;

/// Send function bound to the node that was active when a listener ran.
///
/// Once the machine has moved to any other node (a transition, a history
/// move, a reset or a restore), every send through this handle is dropped.
/// The handle holds a weak reference, so a timer that outlives the machine
/// does not keep it alive.
pub struct Sender<C: Context> {
    machine: MachineRef<C>,
    bound: NodeId,
}

impl<C: Context> Sender<C> {
    pub(crate) fn new(machine: MachineRef<C>, bound: NodeId) -> Self {
        Self { machine, bound }
    }

    /// Whether the machine has left the bound node (or no longer exists).
    pub fn is_stale(&self) -> bool {
        Machine::upgrade(&self.machine)
            .is_none_or(|machine| machine.state_id() != self.bound)
    }

    /// Send `event` if the machine is still on the bound node.
    pub fn send(&self, event: &str) -> bool {
        self.dispatch(event, None)
    }

    pub fn send_with(&self, event: &str, patch: ContextPatch<C>) -> bool {
        self.dispatch(event, Some(patch))
    }

    fn dispatch(&self, event: &str, patch: Option<ContextPatch<C>>) -> bool {
        match Machine::upgrade(&self.machine) {
            Some(machine) => machine.apply(event, patch, Some(self.bound)),
            None => {
                tracing::trace!(event, "machine dropped; send ignored");
                false
            }
        }
    }
}

impl<C: Context> Clone for Sender<C> {
    fn clone(&self) -> Self {
        Self {
            machine: self.machine.clone(),
            bound: self.bound,
        }
    }
}

impl<C: Context> fmt::Debug for Sender<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sender").field("bound", &self.bound).finish()
    }
}
