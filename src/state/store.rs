//! Observable state container shared by the session and resource stores.
//!
//! DESIGN
//! ======
//! A thin wrapper over `tokio::sync::watch`: readers take snapshots or
//! subscribe for change notifications, writers mutate through `update`, and
//! every mutation is applied atomically before observers are woken. Clones
//! share the same underlying state.

#[cfg(test)]
#[path = "store_test.rs"]
mod store_test;

use std::sync::Arc;

use tokio::sync::watch;

#[derive(Debug)]
pub struct Store<T> {
    tx: Arc<watch::Sender<T>>,
}

impl<T> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self { tx: Arc::clone(&self.tx) }
    }
}

impl<T: Default> Default for Store<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> Store<T> {
    #[must_use]
    pub fn new(initial: T) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    /// Apply `f` to the state and notify subscribers.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        self.tx.send_modify(f);
    }

    /// Apply `f` and notify subscribers only when it returns `true`.
    #[must_use]
    pub fn update_if(&self, f: impl FnOnce(&mut T) -> bool) -> bool {
        self.tx.send_if_modified(f)
    }

    /// Read the current state without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.tx.borrow())
    }

    /// Receiver that is woken after each notifying update.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.tx.subscribe()
    }
}

impl<T: Clone> Store<T> {
    #[must_use]
    pub fn snapshot(&self) -> T {
        self.tx.borrow().clone()
    }
}
