//! Cancellation actions returned by listeners.

use futures::future::{BoxFuture, FutureExt};
use std::fmt;
use std::future::Future;
use tokio::task::JoinHandle;

/// What a listener leaves behind to tear down its side effect.
///
/// A listener may return nothing, an immediate cancellation, an asynchronous
/// cancellation, or a cancellation that is itself still being produced. The
/// engine runs it before the same listener is invoked again for the same
/// phase, or when the machine is destroyed.
#[derive(Default)]
pub enum Cleanup {
    #[default]
    None,
    Sync(Box<dyn FnOnce() + Send>),
    Async(Box<dyn FnOnce() -> BoxFuture<'static, ()> + Send>),
    Deferred(BoxFuture<'static, Cleanup>),
}

impl Cleanup {
    pub fn none() -> Self {
        Self::None
    }

    pub fn sync<F>(f: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self::Sync(Box::new(f))
    }

    pub fn future<F, Fut>(f: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self::Async(Box::new(move || f().boxed()))
    }

    /// A cancellation that becomes known once `pending` resolves.
    pub fn deferred<Fut>(pending: Fut) -> Self
    where
        Fut: Future<Output = Cleanup> + Send + 'static,
    {
        Self::Deferred(pending.boxed())
    }

    /// Abort a spawned task, typically a timer.
    pub fn abort<T: Send + 'static>(handle: JoinHandle<T>) -> Self {
        Self::sync(move || handle.abort())
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Resolve and run the cancellation.
    pub fn run(self) -> BoxFuture<'static, ()> {
        async move {
            match self {
                Self::None => {}
                Self::Sync(f) => f(),
                Self::Async(f) => f().await,
                Self::Deferred(pending) => pending.await.run().await,
            }
        }
        .boxed()
    }
}

impl From<()> for Cleanup {
    fn from(_: ()) -> Self {
        Self::None
    }
}

impl fmt::Debug for Cleanup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Self::None => "None",
            Self::Sync(_) => "Sync",
            Self::Async(_) => "Async",
            Self::Deferred(_) => "Deferred",
        };
        write!(f, "Cleanup::{kind}")
    }
}
