//! Mount boundary glue for hosts.
//!
//! A host calls [`mount`] when a machine or composite is attached and
//! [`unmount`] when it is detached. With a store, the active node is
//! saved on unmount and restored on the next mount under the signature key.
//! Nothing is synchronized between those two points.

use super::StateStore;
use crate::composite::Composite;
use crate::core::Context;
use crate::machine::Machine;
use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::{debug, warn};

/// Something a host can attach and detach.
pub trait Mount<C: Context> {
    /// Save the active node(s) into `store`.
    fn save_to(&self, store: &dyn StateStore<C>);

    /// Restore whatever `store` holds. Returns how many snapshots were
    /// applied.
    fn restore_from(&self, store: &dyn StateStore<C>) -> usize;

    fn resume(&self);

    fn suspend(&self);

    fn teardown(&self) -> BoxFuture<'_, ()>;
}

/// Attach `target`: restore from `store` if given, then start.
pub fn mount<C, M>(target: &M, store: Option<&dyn StateStore<C>>)
where
    C: Context,
    M: Mount<C> + ?Sized,
{
    target.suspend();
    if let Some(store) = store {
        let restored = target.restore_from(store);
        debug!(restored, "mounted with store");
    }
    target.resume();
}

/// Detach `target`: save into `store` if given, then destroy.
pub async fn unmount<C, M>(target: &M, store: Option<&dyn StateStore<C>>)
where
    C: Context,
    M: Mount<C> + ?Sized,
{
    if let Some(store) = store {
        target.save_to(store);
    }
    target.teardown().await;
}

fn save_machine<C: Context>(machine: &Machine<C>, store: &dyn StateStore<C>, key: &str) {
    debug!(machine = machine.id(), key, state = %machine.value(), "saving checkpoint");
    store.set(key, machine.checkpoint());
}

fn restore_machine<C: Context>(machine: &Machine<C>, store: &dyn StateStore<C>, key: &str) -> bool {
    let Some(checkpoint) = store.get(key) else {
        return false;
    };
    match checkpoint.validate(machine.signature()) {
        Ok(()) => {
            machine.restore(checkpoint);
            true
        }
        Err(error) => {
            warn!(machine = machine.id(), key, %error, "ignoring stored checkpoint");
            false
        }
    }
}

impl<C: Context> Mount<C> for Machine<C> {
    fn save_to(&self, store: &dyn StateStore<C>) {
        save_machine(self, store, self.signature());
    }

    fn restore_from(&self, store: &dyn StateStore<C>) -> usize {
        usize::from(restore_machine(self, store, self.signature()))
    }

    fn resume(&self) {
        self.start();
    }

    fn suspend(&self) {
        self.stop();
    }

    fn teardown(&self) -> BoxFuture<'_, ()> {
        self.destroy().boxed()
    }
}

/// Members are stored under `"{composite id}-{member signature}"`.
impl<C: Context> Mount<C> for Composite<C> {
    fn save_to(&self, store: &dyn StateStore<C>) {
        for (_, machine) in self.members() {
            save_machine(machine, store, &self.key_for(machine));
        }
    }

    fn restore_from(&self, store: &dyn StateStore<C>) -> usize {
        let mut restored = 0;
        for (_, machine) in self.members() {
            if restore_machine(machine, store, &self.key_for(machine)) {
                restored += 1;
            }
        }
        restored
    }

    fn resume(&self) {
        self.start();
    }

    fn suspend(&self) {
        self.stop();
    }

    fn teardown(&self) -> BoxFuture<'_, ()> {
        self.destroy().boxed()
    }
}
