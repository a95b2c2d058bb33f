//! Transition engine.
//!
//! A [`Machine`] owns the history ledger of one configured state graph and
//! drives listener notifications. Every mutation (`send`, `start`, `stop`,
//! history moves) runs synchronously to completion; listener work is spawned
//! on the ambient Tokio runtime and finishes after the call returns.

mod history;

pub use history::History;

use crate::checkpoint::Checkpoint;
use crate::config::Config;
use crate::core::{Context, ContextPatch, Guard, MachineState, NodeId, StateHistory};
use crate::listener::registry::{self, Registry};
use crate::listener::{Listener, Phase, Sender};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tracing::{debug, trace};

pub(crate) type MachineRef<C> = Weak<Shared<C>>;

pub(crate) struct Shared<C: Context> {
    config: Arc<Config<C>>,
    core: Mutex<Core<C>>,
    listeners: Mutex<Registry<C>>,
}

struct Core<C: Context> {
    history: StateHistory<C>,
    stopped: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Direction {
    Backward,
    Forward,
}

/// Handle to a running state machine.
///
/// Cloning the handle shares the machine.
///
/// # Example
///
/// ```rust
/// use rewind::{Config, Machine, StateGraph};
///
/// let config = Config::builder()
///     .initial("off")
///     .context(())
///     .states(
///         StateGraph::new()
///             .with_transition("on", "toggle", "off")
///             .with_transition("off", "toggle", "on"),
///     )
///     .build()
///     .unwrap();
///
/// let machine = Machine::create(config);
/// assert!(machine.send("toggle"));
/// assert_eq!(machine.value(), "on");
///
/// // Events the current state does not define are ignored.
/// assert!(!machine.send("spin"));
/// assert_eq!(machine.value(), "on");
///
/// machine.history().undo();
/// assert_eq!(machine.value(), "off");
/// ```
pub struct Machine<C: Context> {
    shared: Arc<Shared<C>>,
}

impl<C: Context> Machine<C> {
    /// Instantiate a machine from a configuration.
    ///
    /// Listeners declared in the configuration are registered, the initial
    /// node is created and `onStart`/`onChange` are fired.
    pub fn create(config: impl Into<Arc<Config<C>>>) -> Self {
        let config = config.into();
        let mut listeners = Registry::new();
        for phase in Phase::ALL {
            for listener in config.listeners(phase) {
                listeners.add(phase, Arc::clone(listener));
            }
        }
        let root = MachineState::initial(config.initial(), config.context().clone(), config.states());

        let machine = Self {
            shared: Arc::new(Shared {
                config,
                core: Mutex::new(Core {
                    history: StateHistory::new(root),
                    stopped: false,
                }),
                listeners: Mutex::new(listeners),
            }),
        };
        debug!(machine = machine.id(), initial = %machine.value(), "machine created");
        machine.signal_change();
        machine
    }

    pub(crate) fn upgrade(machine: &MachineRef<C>) -> Option<Self> {
        machine.upgrade().map(|shared| Self { shared })
    }

    /// Configuration this machine was created from.
    pub fn config(&self) -> &Arc<Config<C>> {
        &self.shared.config
    }

    /// Configured id.
    pub fn id(&self) -> &str {
        self.shared.config.id()
    }

    /// Content signature of the configuration, used as the persistence key.
    pub fn signature(&self) -> &str {
        self.shared.config.signature()
    }

    /// Snapshot of the active node.
    pub fn state(&self) -> MachineState<C> {
        self.core().history.current().clone()
    }

    /// Name of the active state.
    pub fn value(&self) -> String {
        self.core().history.current().value.clone()
    }

    /// Context of the active node.
    pub fn context(&self) -> C {
        self.core().history.current().context.clone()
    }

    /// Whether the active state is terminal.
    pub fn is_done(&self) -> bool {
        self.core().history.current().done
    }

    pub(crate) fn state_id(&self) -> NodeId {
        self.core().history.current_id()
    }

    /// State values along the history chain, root first.
    pub fn path(&self) -> Vec<String> {
        self.core()
            .history
            .get_path()
            .into_iter()
            .map(str::to_owned)
            .collect()
    }

    /// Whether events are currently ignored.
    pub fn is_stopped(&self) -> bool {
        self.core().stopped
    }

    /// Apply `event` to the active node.
    ///
    /// Returns `false` without creating a node or notifying anyone when the
    /// machine is stopped or the active state does not define `event`.
    pub fn send(&self, event: &str) -> bool {
        self.apply(event, None, None)
    }

    /// Like [`send`](Self::send), shallow-merging `patch` into the context
    /// of the new node. Patch functions must not call back into the machine.
    pub fn send_with(&self, event: &str, patch: ContextPatch<C>) -> bool {
        self.apply(event, Some(patch), None)
    }

    pub(crate) fn apply(
        &self,
        event: &str,
        patch: Option<ContextPatch<C>>,
        expected: Option<NodeId>,
    ) -> bool {
        let graph = self.shared.config.states();
        {
            let mut core = self.core();
            if core.stopped {
                trace!(machine = self.id(), event, "machine stopped; event ignored");
                return false;
            }
            let current = core.history.current();
            if expected.is_some_and(|id| id != current.id) {
                trace!(machine = self.id(), event, "stale send dropped");
                return false;
            }
            let Some(target) = graph.target(&current.value, event) else {
                trace!(machine = self.id(), state = %current.value, event, "no transition");
                return false;
            };

            let from = current.value.clone();
            let context = match patch {
                Some(patch) => patch.apply(&current.context),
                None => current.context.clone(),
            };
            let node = core.history.record(target, context, event, graph);
            debug!(machine = self.id(), from = %from, to = %node.value, event, "transition");
        }
        self.signal_change();
        true
    }

    /// Register `listener` for `phase`. It first runs on the next
    /// notification.
    pub fn add_event_listener(&self, phase: Phase, listener: Listener<C>) {
        self.registry().add(phase, listener);
    }

    /// Unregister `listener` from `phase`. Its pending cleanup runs in the
    /// background.
    pub fn remove_event_listener(&self, phase: Phase, listener: &Listener<C>) {
        let removed = self.registry().remove(phase, listener);
        if removed.is_empty() {
            return;
        }
        registry::spawn_detached("listener teardown", async move {
            for slot in removed {
                slot.teardown().await;
            }
        });
    }

    /// Accept events again and re-fire notifications for the active node.
    pub fn start(&self) {
        self.core().stopped = false;
        debug!(machine = self.id(), "machine started");
        self.signal_change();
    }

    /// Ignore events until the next [`start`](Self::start). In-flight side
    /// effects are not cancelled.
    pub fn stop(&self) {
        self.core().stopped = true;
        debug!(machine = self.id(), "machine stopped");
    }

    /// Stop the machine, run every listener's pending cleanup exactly once
    /// and clear all registrations.
    pub async fn destroy(&self) {
        self.stop();
        let slots = self.registry().drain();
        debug!(machine = self.id(), listeners = slots.len(), "destroying machine");
        for slot in slots {
            slot.teardown().await;
        }
    }

    /// Navigator over this machine's history.
    pub fn history(&self) -> History<'_, C> {
        History::new(self)
    }

    /// Capture the active node and the chain it references.
    pub fn checkpoint(&self) -> Checkpoint<C> {
        Checkpoint::capture(self.signature(), self.core().history.clone())
    }

    /// Replace the active node and its chain with a checkpoint's. No
    /// notification is fired; call [`start`](Self::start) to resume.
    pub fn restore(&self, checkpoint: Checkpoint<C>) {
        let history = checkpoint.into_history();
        debug!(machine = self.id(), state = %history.current().value, "restoring checkpoint");
        self.core().history = history;
    }

    /// Move one step along `prev`/`next` if `guard` accepts the active node.
    fn step(&self, direction: Direction, guard: Option<&Guard<C>>) -> bool {
        let (origin, target) = {
            let core = self.core();
            let current = core.history.current();
            let link = match direction {
                Direction::Backward => current.prev,
                Direction::Forward => current.next,
            };
            let Some(target) = link else {
                return false;
            };
            (current.clone(), target)
        };
        if guard.is_some_and(|guard| !guard.check(&origin, 0)) {
            return false;
        }
        self.move_to(origin.id, target, direction)
    }

    /// Walk `prev`/`next` and land on the first node `guard` accepts, or on
    /// the nearest one without a guard.
    fn walk(&self, direction: Direction, guard: Option<&Guard<C>>) -> bool {
        let (origin, candidates) = {
            let core = self.core();
            let history = &core.history;
            let candidates: Vec<(usize, MachineState<C>)> = match (direction, guard) {
                (Direction::Backward, None) => history.backward().take(1).map(owned).collect(),
                (Direction::Forward, None) => history.forward().take(1).map(owned).collect(),
                (Direction::Backward, Some(_)) => history.backward().map(owned).collect(),
                (Direction::Forward, Some(_)) => history.forward().map(owned).collect(),
            };
            (history.current_id(), candidates)
        };

        let sign = match direction {
            Direction::Backward => -1,
            Direction::Forward => 1,
        };
        let found = candidates.iter().zip(1isize..).find(|((_, node), offset)| {
            guard.is_none_or(|guard| guard.check(node, sign * offset))
        });
        match found {
            Some(((target, _), _)) => self.move_to(origin, *target, direction),
            None => false,
        }
    }

    fn move_to(&self, origin: NodeId, target: usize, direction: Direction) -> bool {
        {
            let mut core = self.core();
            if core.history.current_id() != origin {
                return false;
            }
            if !core.history.move_to(target, self.shared.config.states()) {
                return false;
            }
            debug!(
                machine = self.id(),
                ?direction,
                state = %core.history.current().value,
                "history moved"
            );
        }
        self.signal_change();
        true
    }

    /// Discard the whole chain and start over from the configured initial
    /// node.
    fn reset(&self) {
        let config = &self.shared.config;
        let root = MachineState::initial(config.initial(), config.context().clone(), config.states());
        self.core().history = StateHistory::new(root);
        debug!(machine = self.id(), "history reset");
        self.signal_change();
    }

    /// Notify listeners about the active node: `onStart` for an initial
    /// node, `onChange` always, `onDone` for a terminal node.
    fn signal_change(&self) {
        let current = self.state();
        for phase in Phase::ALL {
            if !phase.applies_to(&current) {
                continue;
            }
            let slots = self.registry().snapshot(phase);
            if slots.is_empty() {
                continue;
            }
            let machine = Arc::downgrade(&self.shared);
            registry::spawn_detached(phase.as_str(), async move {
                registry::dispatch(slots, move || observe(&machine, phase)).await;
            });
        }
    }

    fn core(&self) -> MutexGuard<'_, Core<C>> {
        self.shared.core.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn registry(&self) -> MutexGuard<'_, Registry<C>> {
        self.shared
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Active node and a send handle bound to it, if the machine still exists
/// and the node still belongs to `phase`.
fn observe<C: Context>(
    machine: &MachineRef<C>,
    phase: Phase,
) -> Option<(MachineState<C>, Sender<C>)> {
    let state = Machine::upgrade(machine)?.state();
    if !phase.applies_to(&state) {
        trace!(state = %state.value, %phase, "active node left the phase; listener skipped");
        return None;
    }
    let send = Sender::new(machine.clone(), state.id);
    Some((state, send))
}

fn owned<C: Context>((index, node): (usize, &MachineState<C>)) -> (usize, MachineState<C>) {
    (index, node.clone())
}

impl<C: Context> Clone for Machine<C> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<C: Context> fmt::Debug for Machine<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let core = self.core();
        f.debug_struct("Machine")
            .field("id", &self.id())
            .field("state", core.history.current())
            .field("stopped", &core.stopped)
            .finish()
    }
}
