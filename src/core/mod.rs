//! Core machine data.
//!
//! This module contains the pure parts of the engine:
//! - The declarative transition graph
//! - Context values and the patches applied to them
//! - History nodes and the arena ledger that links them
//! - Guards used to steer history navigation
//!
//! Nothing here performs I/O or spawns work; the engine in
//! [`machine`](crate::machine) drives these types.

mod context;
mod graph;
mod guard;
mod history;
mod state;

pub use context::{Context, ContextPatch};
pub use graph::{StateGraph, Transitions};
pub use guard::Guard;
pub use history::StateHistory;
pub use state::{MachineState, NodeId};
