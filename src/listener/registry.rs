//! Listener slots and the sequential dispatch chain.

use super::{same_listener, Cleanup, Listener, Phase, Sender};
use crate::core::{Context, MachineState};
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::Mutex;

/// One registration of a listener for one phase.
///
/// `pending` holds the cleanup left by the last invocation. Holding its lock
/// across "run previous cleanup, invoke again" serializes invocations of the
/// same registration.
pub(crate) struct Slot<C: Context> {
    listener: Listener<C>,
    pending: Mutex<Cleanup>,
    removed: AtomicBool,
}

impl<C: Context> Slot<C> {
    fn new(listener: Listener<C>) -> Self {
        Self {
            listener,
            pending: Mutex::new(Cleanup::None),
            removed: AtomicBool::new(false),
        }
    }

    fn is_removed(&self) -> bool {
        self.removed.load(Ordering::SeqCst)
    }

    /// Run the pending cleanup, then invoke the listener against whatever
    /// node `observe` reports as active at that moment. Nothing is invoked
    /// when `observe` reports no node.
    async fn invoke<F>(&self, observe: &F)
    where
        F: Fn() -> Option<(MachineState<C>, Sender<C>)>,
    {
        let mut pending = self.pending.lock().await;
        std::mem::take(&mut *pending).run().await;
        if self.is_removed() {
            return;
        }
        if let Some((state, send)) = observe() {
            *pending = (self.listener)(&state, send);
        }
    }

    /// Stop future invocations and run the pending cleanup exactly once.
    pub(crate) async fn teardown(&self) {
        self.removed.store(true, Ordering::SeqCst);
        let mut pending = self.pending.lock().await;
        std::mem::take(&mut *pending).run().await;
    }
}

/// Registered listeners by phase, in registration order.
pub(crate) struct Registry<C: Context> {
    phases: BTreeMap<Phase, Vec<Arc<Slot<C>>>>,
}

impl<C: Context> Registry<C> {
    pub(crate) fn new() -> Self {
        Self {
            phases: BTreeMap::new(),
        }
    }

    pub(crate) fn add(&mut self, phase: Phase, listener: Listener<C>) {
        self.phases
            .entry(phase)
            .or_default()
            .push(Arc::new(Slot::new(listener)));
    }

    /// Unregister every slot of `phase` holding `listener` and return them
    /// for teardown.
    pub(crate) fn remove(&mut self, phase: Phase, listener: &Listener<C>) -> Vec<Arc<Slot<C>>> {
        let Some(slots) = self.phases.get_mut(&phase) else {
            return Vec::new();
        };
        let (removed, kept) = std::mem::take(slots)
            .into_iter()
            .partition(|slot| same_listener(&slot.listener, listener));
        *slots = kept;
        removed
    }

    pub(crate) fn snapshot(&self, phase: Phase) -> Vec<Arc<Slot<C>>> {
        self.phases.get(&phase).cloned().unwrap_or_default()
    }

    /// Unregister everything, in phase order.
    pub(crate) fn drain(&mut self) -> Vec<Arc<Slot<C>>> {
        std::mem::take(&mut self.phases)
            .into_values()
            .flatten()
            .collect()
    }

    #[cfg(test)]
    pub(crate) fn len(&self, phase: Phase) -> usize {
        self.phases.get(&phase).map_or(0, Vec::len)
    }
}

/// Invoke each slot in turn. A slot is only invoked after its own previous
/// cleanup has finished.
pub(crate) async fn dispatch<C, F>(slots: Vec<Arc<Slot<C>>>, observe: F)
where
    C: Context,
    F: Fn() -> Option<(MachineState<C>, Sender<C>)>,
{
    for slot in slots {
        slot.invoke(&observe).await;
    }
}

/// Run `work` on the ambient Tokio runtime without waiting for it.
pub(crate) fn spawn_detached<F>(what: &'static str, work: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    match Handle::try_current() {
        Ok(handle) => {
            handle.spawn(work);
        }
        Err(_) => tracing::warn!(task = what, "no tokio runtime; listener work skipped"),
    }
}
