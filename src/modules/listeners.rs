use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Handle returned by `subscribe`; pass it back to `unsubscribe` to detach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Callback<P> = Arc<dyn Fn(&P) + Send + Sync>;

/// Manual subscriber list shared by the registry, progress tracker and
/// favorites store. Delivery is synchronous and in subscription order; a
/// panicking listener is logged and skipped so the remaining listeners
/// still get notified.
pub struct ListenerSet<P> {
    next_id: AtomicU64,
    entries: Mutex<Vec<(ListenerId, Callback<P>)>>,
}

impl<P> ListenerSet<P> {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            entries: Mutex::new(Vec::new()),
        }
    }

    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&P) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock_entries().push((id, Arc::new(listener)));
        id
    }

    /// Unsubscribing an id that is not registered is a no-op.
    pub fn unsubscribe(&self, id: ListenerId) {
        self.lock_entries().retain(|(entry_id, _)| *entry_id != id);
    }

    pub fn emit(&self, payload: &P) {
        // Snapshot the callbacks so the table lock is not held while they
        // run; a callback may subscribe/unsubscribe without deadlocking.
        let callbacks: Vec<Callback<P>> = self
            .lock_entries()
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();

        for callback in callbacks {
            if catch_unwind(AssertUnwindSafe(|| callback(payload))).is_err() {
                log::error!("Listener panicked during notification, skipping it");
            }
        }
    }

    fn lock_entries(&self) -> std::sync::MutexGuard<'_, Vec<(ListenerId, Callback<P>)>> {
        // Callbacks never run under this lock, so poisoning can only come
        // from a panic inside this module itself.
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<P> Default for ListenerSet<P> {
    fn default() -> Self {
        Self::new()
    }
}
