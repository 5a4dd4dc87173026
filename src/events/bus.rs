//! Async listener bus.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use futures_util::future::BoxFuture;

use super::{ListenerHandle, ListenerNotFound};

type SharedListener<T> = Arc<dyn Fn(T) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// Ordered registry of async listeners for one event channel.
///
/// Dispatch clones the payload for each listener and awaits every listener
/// future to completion before invoking the next one, so a dispatch pass is
/// fully sequential.  The registry lock is only held while snapshotting the
/// listener list, never while a listener runs, so a listener may re-enter
/// the bus — removing itself included — without deadlocking.  A listener
/// added or removed mid-pass takes effect from the next dispatch.
pub struct EventBus<T> {
    listeners: Mutex<Vec<(ListenerHandle, SharedListener<T>)>>,
    next_id: AtomicU64,
}

impl<T> EventBus<T> {
    pub fn new() -> Self {
        Self {
            listeners: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Append a listener; duplicates are allowed and fire once per
    /// registration.
    pub fn add_listener<F, Fut>(&self, listener: F) -> ListenerHandle
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let handle = ListenerHandle::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        let shared: SharedListener<T> = Arc::new(move |payload| Box::pin(listener(payload)));
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((handle, shared));
        handle
    }

    /// Remove a previously registered listener.
    ///
    /// Removing a handle that is not registered is an error, matching the
    /// remove-or-raise semantics of the upstream API.
    pub fn remove_listener(&self, handle: ListenerHandle) -> Result<(), ListenerNotFound> {
        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        let index = listeners
            .iter()
            .position(|(h, _)| *h == handle)
            .ok_or(ListenerNotFound)?;
        listeners.remove(index);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn snapshot(&self) -> Vec<SharedListener<T>> {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect()
    }

    /// Invoke every listener in registration order.
    ///
    /// A listener failure aborts the pass immediately and propagates to the
    /// caller; remaining listeners are not invoked.
    pub async fn dispatch(&self, payload: &T) -> anyhow::Result<()>
    where
        T: Clone,
    {
        for listener in self.snapshot() {
            listener(payload.clone()).await?;
        }
        Ok(())
    }
}

impl<T> Default for EventBus<T> {
    fn default() -> Self {
        Self::new()
    }
}
