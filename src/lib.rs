//! Rewind: a finite-state-machine engine with replayable history
//!
//! Rewind keeps the transition itself synchronous and pure: a state graph
//! maps each state's events to a single target, and every accepted event
//! appends a node to a bidirectional history ledger. Side effects live in
//! listeners that run on the Tokio runtime after the transition returns, and
//! each listener's cleanup is awaited before it runs again.
//!
//! # Core Concepts
//!
//! - **Config**: an immutable, validated and signed state graph plus context
//! - **Machine**: the engine handle (`send`, `start`, `stop`, `destroy`)
//! - **History**: `undo`, `redo`, `rewind`, `fast_forward` and `reset`
//! - **Listeners**: `onStart`/`onChange`/`onDone` callbacks with cleanups
//!   and stale-guarded senders
//! - **Composite**: one handle broadcasting to many named machines
//! - **Checkpoint**: snapshots saved and restored around a mount cycle
//!
//! # Example
//!
//! ```rust
//! use rewind::{state_graph, Config, Guard, Machine};
//! use serde_json::json;
//!
//! let config = Config::builder()
//!     .id("timer")
//!     .initial("idle")
//!     .context(json!({ "seconds": 3 }))
//!     .states(state_graph! {
//!         idle => { start: countdown },
//!         countdown => { tick: countdown, finish: ringing, stop: idle },
//!         ringing => { stop: idle },
//!     })
//!     .build()
//!     .unwrap();
//!
//! let timer = Machine::create(config);
//! timer.send("start");
//! timer.send("stop");
//! assert_eq!(timer.value(), "idle");
//!
//! // Go back to where the timer was stopped from.
//! timer.history().undo_when(&Guard::event("stop"));
//! assert_eq!(timer.value(), "countdown");
//! ```

pub mod builder;
pub mod checkpoint;
pub mod composite;
pub mod config;
pub mod core;
pub mod listener;
pub mod machine;

// Re-export commonly used types
pub use builder::{BuildError, ConfigBuilder};
pub use checkpoint::{mount, unmount, Checkpoint, CheckpointError, MemoryStore, Mount, StateStore};
pub use composite::{Composite, CompositeError};
pub use config::{Config, ConfigDocument, ConfigOverride, GraphViolation};
pub use core::{Context, ContextPatch, Guard, MachineState, NodeId, StateGraph, StateHistory};
pub use listener::{listener, Cleanup, Listener, Phase, Sender};
pub use machine::{History, Machine};
