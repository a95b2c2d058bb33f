//! History navigation for a single machine.

use super::{Direction, Machine};
use crate::core::{Context, Guard};

/// Navigator over a machine's history chain.
///
/// Every move that changes the active node fires the same notifications as
/// a transition. Moves that find nothing to land on are silent no-ops and
/// return `false`.
pub struct History<'a, C: Context> {
    machine: &'a Machine<C>,
}

impl<'a, C: Context> History<'a, C> {
    pub(super) fn new(machine: &'a Machine<C>) -> Self {
        Self { machine }
    }

    /// Move to the previous node.
    pub fn undo(&self) -> bool {
        self.machine.step(Direction::Backward, None)
    }

    /// Move to the previous node if `guard` holds for the active node at
    /// offset `0`.
    pub fn undo_when(&self, guard: &Guard<C>) -> bool {
        self.machine.step(Direction::Backward, Some(guard))
    }

    /// Move to the next node, if one is still attached.
    pub fn redo(&self) -> bool {
        self.machine.step(Direction::Forward, None)
    }

    /// Move to the next node if `guard` holds for the active node at
    /// offset `0`.
    pub fn redo_when(&self, guard: &Guard<C>) -> bool {
        self.machine.step(Direction::Forward, Some(guard))
    }

    /// Move to the immediately previous node.
    pub fn rewind(&self) -> bool {
        self.machine.walk(Direction::Backward, None)
    }

    /// Walk back from offset `-1` and land on the first node `guard`
    /// accepts.
    pub fn rewind_when(&self, guard: &Guard<C>) -> bool {
        self.machine.walk(Direction::Backward, Some(guard))
    }

    /// Move to the immediately next node.
    pub fn fast_forward(&self) -> bool {
        self.machine.walk(Direction::Forward, None)
    }

    /// Walk forward from offset `+1` and land on the first node `guard`
    /// accepts.
    pub fn fast_forward_when(&self, guard: &Guard<C>) -> bool {
        self.machine.walk(Direction::Forward, Some(guard))
    }

    /// Discard the chain and recreate the initial node from the
    /// configuration.
    pub fn reset(&self) {
        self.machine.reset();
    }
}
