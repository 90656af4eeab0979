//! Listener registry and dispatch
//!
//! The registry is copy-on-write: registration and removal swap in a new
//! entry vector under a short write lock, while dispatch clones the current
//! `Arc` and iterates it with no lock held. A listener added during a
//! dispatch sees the next change, not the one in flight. A listener removed
//! during a dispatch may still receive the change in flight.
//!
//! Entries are `Weak`. A listener whose registrant dropped the last `Arc`
//! is skipped and pruned lazily.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use crate::{ListChange, Listener, ListenerFailure};

/// Registered listener handle
struct Entry<T> {
    /// Address of the registrant's allocation, used for identity
    id: usize,
    handle: Weak<dyn Listener<T>>,
}

impl<T> Entry<T> {
    fn is_alive(&self) -> bool {
        self.handle.strong_count() > 0
    }
}

impl<T> Clone for Entry<T> {
    fn clone(&self) -> Self {
        Entry {
            id: self.id,
            handle: Weak::clone(&self.handle),
        }
    }
}

/// Outcome of delivering one change to every registered listener
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Listeners that returned normally
    pub delivered: usize,
    /// Entries whose listener was already dropped
    pub skipped: usize,
    /// Listeners that panicked
    pub failures: Vec<ListenerFailure>,
}

impl DispatchReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Ordered, copy-on-write set of listeners
pub struct ListenerRegistry<T> {
    entries: RwLock<Arc<Vec<Entry<T>>>>,
}

fn identity<L: ?Sized>(listener: &Arc<L>) -> usize {
    Arc::as_ptr(listener) as *const () as usize
}

impl<T: 'static> ListenerRegistry<T> {
    pub fn new() -> Self {
        ListenerRegistry {
            entries: RwLock::new(Arc::new(Vec::new())),
        }
    }

    /// Append a listener. Registering the same listener twice delivers
    /// every change to it twice.
    pub fn add<L: Listener<T> + 'static>(&self, listener: &Arc<L>) {
        let weak: Weak<L> = Arc::downgrade(listener);
        self.insert(identity(listener), weak);
    }

    /// Append a listener already erased to `dyn Listener<T>`
    pub fn add_dyn(&self, listener: &Arc<dyn Listener<T>>) {
        self.insert(identity(listener), Arc::downgrade(listener));
    }

    fn insert(&self, id: usize, handle: Weak<dyn Listener<T>>) {
        let mut entries = self.entries.write();
        let mut next: Vec<Entry<T>> = Vec::with_capacity(entries.len() + 1);
        next.extend(entries.iter().filter(|e| e.is_alive()).cloned());
        next.push(Entry { id, handle });
        *entries = Arc::new(next);
        tracing::debug!(listeners = entries.len(), "listener registered");
    }

    /// Remove the first registration of `listener`.
    ///
    /// Returns false when it was not registered. A concrete handle and its
    /// `dyn Listener<T>` form name the same registration.
    pub fn remove<L: Listener<T> + ?Sized>(&self, listener: &Arc<L>) -> bool {
        let id = identity(listener);

        let mut entries = self.entries.write();
        let Some(position) = entries.iter().position(|e| e.id == id) else {
            return false;
        };

        let next: Vec<Entry<T>> = entries
            .iter()
            .enumerate()
            .filter(|(i, e)| *i != position && e.is_alive())
            .map(|(_, e)| e.clone())
            .collect();
        *entries = Arc::new(next);
        tracing::debug!(listeners = entries.len(), "listener removed");
        true
    }

    /// Registered entries, including dropped listeners not yet pruned
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Listeners whose registrant still holds them
    pub fn live_count(&self) -> usize {
        self.entries.read().iter().filter(|e| e.is_alive()).count()
    }

    /// Drop entries whose listener is gone
    pub fn prune(&self) {
        let mut entries = self.entries.write();
        let dead = entries.iter().filter(|e| !e.is_alive()).count();
        if dead == 0 {
            return;
        }
        let next: Vec<Entry<T>> = entries.iter().filter(|e| e.is_alive()).cloned().collect();
        *entries = Arc::new(next);
        tracing::debug!(pruned = dead, listeners = entries.len(), "pruned dropped listeners");
    }

    /// Deliver `change` to every listener registered when the call starts.
    ///
    /// Each listener runs inside `catch_unwind`; a panic is recorded and
    /// the next listener still runs.
    pub fn dispatch(&self, change: &ListChange<T>) -> DispatchReport {
        let snapshot = self.entries.read().clone();
        let mut report = DispatchReport::default();

        for (position, entry) in snapshot.iter().enumerate() {
            let Some(listener) = entry.handle.upgrade() else {
                report.skipped += 1;
                continue;
            };

            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                change.deliver_to(listener.as_ref());
            }));
            match outcome {
                Ok(()) => report.delivered += 1,
                Err(payload) => report.failures.push(ListenerFailure {
                    position,
                    message: panic_message(payload.as_ref()),
                }),
            }
        }

        if report.skipped > 0 {
            self.prune();
        }
        report
    }
}

impl<T: 'static> Default for ListenerRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for ListenerRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("entries", &self.entries.read().len())
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
