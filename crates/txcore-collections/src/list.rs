//! Observable list
//!
//! `ObservableList<T>` owns an ordered backing store behind one
//! `parking_lot::RwLock`. Every mutation follows the same protocol:
//!
//! 1. Take the write lock, validate, apply the change, build its summary
//! 2. Release the lock
//! 3. Dispatch the summary to every registered listener
//!
//! Dispatch runs outside the lock, so listeners may call back into the
//! list (including mutating it) without deadlocking. A listener handling
//! change M may already see the store after a concurrent change M+1.
//!
//! Reads return copies taken under the read lock. There are no live views.
//!
//! Two calls are two independent atomic steps; callers that need a
//! `remove` and an `insert` to appear as one step must coordinate
//! themselves.

use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::diff;
use crate::{
    DispatchPolicy, ListChange, ListConfig, ListError, ListResult, Listener, ListenerRegistry,
};

/// Backing store guarded by the list lock
struct Store<T> {
    items: Vec<T>,
    /// Committed mutations so far
    version: u64,
}

/// Store state right after a mutation, for logging
#[derive(Clone, Copy)]
struct Commit {
    len: usize,
    version: u64,
}

impl<T> Store<T> {
    fn commit(&mut self) -> Commit {
        self.version += 1;
        Commit {
            len: self.items.len(),
            version: self.version,
        }
    }

    /// `index` must address an existing element
    fn check_index(&self, index: usize) -> ListResult<()> {
        if index < self.items.len() {
            Ok(())
        } else {
            Err(ListError::IndexOutOfBounds {
                index,
                len: self.items.len(),
            })
        }
    }

    /// `index` must be a valid insertion point (end included)
    fn check_position(&self, index: usize) -> ListResult<()> {
        if index <= self.items.len() {
            Ok(())
        } else {
            Err(ListError::IndexOutOfBounds {
                index,
                len: self.items.len(),
            })
        }
    }
}

/// Thread-safe ordered collection that announces every structural change.
///
/// Share it across threads with `Arc<ObservableList<T>>`. The list holds
/// its listeners weakly; keep the listener's `Arc` alive for as long as it
/// should receive changes.
///
/// Mutations return `ListError::ListenerPanicked` when a listener panicked
/// and the list uses `DispatchPolicy::Collect`. In that case the store
/// change is already committed, and any value the call would have
/// returned (the replaced or removed element) is dropped.
pub struct ObservableList<T> {
    store: RwLock<Store<T>>,
    listeners: ListenerRegistry<T>,
    config: ListConfig,
}

impl<T: Clone + 'static> ObservableList<T> {
    pub fn new() -> Self {
        Self::with_config(ListConfig::default())
    }

    pub fn with_config(config: ListConfig) -> Self {
        ObservableList {
            store: RwLock::new(Store {
                items: Vec::with_capacity(config.initial_capacity),
                version: 0,
            }),
            listeners: ListenerRegistry::new(),
            config,
        }
    }

    pub fn config(&self) -> &ListConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Listeners
    // ------------------------------------------------------------------

    /// Register a listener. Duplicates are kept and notified twice.
    pub fn add_listener<L: Listener<T> + 'static>(&self, listener: &Arc<L>) {
        self.listeners.add(listener);
    }

    /// Register a listener held as `Arc<dyn Listener<T>>`
    pub fn add_dyn_listener(&self, listener: &Arc<dyn Listener<T>>) {
        self.listeners.add_dyn(listener);
    }

    /// Remove the first registration of `listener`; false if it had none
    pub fn remove_listener<L: Listener<T> + ?Sized>(&self, listener: &Arc<L>) -> bool {
        self.listeners.remove(listener)
    }

    /// Registered listeners that are still alive
    pub fn listener_count(&self) -> usize {
        self.listeners.live_count()
    }

    // ------------------------------------------------------------------
    // Single-item operations
    // ------------------------------------------------------------------

    pub fn get(&self, index: usize) -> ListResult<T> {
        let store = self.store.read();
        store.check_index(index)?;
        Ok(store.items[index].clone())
    }

    /// Append `value`; it lands at index `len() - 1`
    pub fn push(&self, value: T) -> ListResult<()> {
        let change = ListChange::Added(value.clone());
        let commit = {
            let mut store = self.store.write();
            store.items.push(value);
            store.commit()
        };
        self.publish(change, commit)
    }

    /// Insert `value` at `index`, shifting successors right
    pub fn insert(&self, index: usize, value: T) -> ListResult<()> {
        let commit = {
            let mut store = self.store.write();
            store.check_position(index)?;
            store.items.insert(index, value.clone());
            store.commit()
        };
        self.publish(ListChange::Inserted { index, item: value }, commit)
    }

    /// Replace the element at `index`, returning the previous one.
    ///
    /// If a listener panics under `DispatchPolicy::Collect` the error takes
    /// the place of the previous element; it then only survives in the
    /// `on_item_updated` payload the other listeners received.
    pub fn set(&self, index: usize, value: T) -> ListResult<T> {
        let (old, commit) = {
            let mut store = self.store.write();
            store.check_index(index)?;
            let old = std::mem::replace(&mut store.items[index], value.clone());
            (old, store.commit())
        };
        self.publish(
            ListChange::Updated {
                index,
                old: old.clone(),
                new: value,
            },
            commit,
        )?;
        Ok(old)
    }

    /// Remove the element at `index`, shifting successors left.
    ///
    /// Under `DispatchPolicy::Collect` a listener panic drops the returned
    /// element; the other listeners still get it through `on_item_removed`.
    pub fn remove(&self, index: usize) -> ListResult<T> {
        let (removed, commit) = {
            let mut store = self.store.write();
            store.check_index(index)?;
            let removed = store.items.remove(index);
            (removed, store.commit())
        };
        self.publish(ListChange::Removed(removed.clone()), commit)?;
        Ok(removed)
    }

    /// Empty the store. Always notifies, even when already empty.
    pub fn clear(&self) -> ListResult<()> {
        let commit = {
            let mut store = self.store.write();
            store.items.clear();
            store.commit()
        };
        self.publish(ListChange::Cleared, commit)
    }

    // ------------------------------------------------------------------
    // Bulk operations
    // ------------------------------------------------------------------

    /// Append every value in input order
    pub fn extend<I: IntoIterator<Item = T>>(&self, values: I) -> ListResult<()> {
        let added: Vec<T> = values.into_iter().collect();
        let commit = {
            let mut store = self.store.write();
            store.items.extend(added.iter().cloned());
            store.commit()
        };
        self.publish(ListChange::addition(added), commit)
    }

    /// Insert every value at `index`, keeping input order
    pub fn insert_all<I: IntoIterator<Item = T>>(&self, index: usize, values: I) -> ListResult<()> {
        let added: Vec<T> = values.into_iter().collect();
        let commit = {
            let mut store = self.store.write();
            store.check_position(index)?;
            let tail = store.items.split_off(index);
            store.items.extend(added.iter().cloned());
            store.items.extend(tail);
            store.commit()
        };
        self.publish(ListChange::addition(added), commit)
    }

    /// Replace the whole store. The notification lists the prior contents
    /// as removed and the new contents as added, even where they overlap.
    pub fn replace_all<I: IntoIterator<Item = T>>(&self, values: I) -> ListResult<()> {
        let added: Vec<T> = values.into_iter().collect();
        let (removed, commit) = {
            let mut store = self.store.write();
            let removed = std::mem::replace(&mut store.items, added.clone());
            (removed, store.commit())
        };
        self.publish(ListChange::Bulk { added, removed }, commit)
    }

    /// Remove every element matching `predicate`, returning how many went.
    ///
    /// Survivors keep their relative order. Nothing is dispatched when no
    /// element matches. The predicate runs under the write lock and must
    /// not call back into this list.
    pub fn remove_where<F>(&self, predicate: F) -> ListResult<usize>
    where
        F: FnMut(&T) -> bool,
    {
        self.extract(|items| diff::extract_matching(items, predicate))
    }

    /// Keep only the elements matching `keep`; the inverse of `remove_where`
    pub fn retain<F>(&self, mut keep: F) -> ListResult<usize>
    where
        F: FnMut(&T) -> bool,
    {
        self.extract(|items| diff::extract_matching(items, |item| !keep(item)))
    }

    fn extract<F>(&self, split: F) -> ListResult<usize>
    where
        F: FnOnce(&mut Vec<T>) -> Vec<T>,
    {
        let (removed, commit) = {
            let mut store = self.store.write();
            let removed = split(&mut store.items);
            if removed.is_empty() {
                return Ok(0);
            }
            (removed, store.commit())
        };
        let count = removed.len();
        self.publish(ListChange::removal(removed), commit)?;
        Ok(count)
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    pub fn len(&self) -> usize {
        self.store.read().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.read().items.is_empty()
    }

    /// Number of committed mutations. No-op removals do not count.
    pub fn version(&self) -> u64 {
        self.store.read().version
    }

    /// Copy of the current contents
    pub fn to_vec(&self) -> Vec<T> {
        self.store.read().items.clone()
    }

    /// Immutable copy of the current contents. Later mutations never show
    /// up in it.
    pub fn as_unmodifiable(&self) -> Arc<[T]> {
        Arc::from(self.store.read().items.as_slice())
    }

    /// Copy of `range`
    pub fn slice(&self, range: Range<usize>) -> ListResult<Vec<T>> {
        let store = self.store.read();
        let len = store.items.len();
        if range.start > range.end || range.end > len {
            return Err(ListError::InvalidRange {
                start: range.start,
                end: range.end,
                len,
            });
        }
        Ok(store.items[range].to_vec())
    }

    /// Iterate over a copy taken now
    pub fn iter(&self) -> std::vec::IntoIter<T> {
        self.to_vec().into_iter()
    }

    /// Borrow the store for the duration of `f` without copying.
    ///
    /// `f` runs under the read lock and must not call back into this list.
    pub fn with<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        f(&self.store.read().items)
    }

    // ------------------------------------------------------------------
    // Dispatch
    // ------------------------------------------------------------------

    fn publish(&self, change: ListChange<T>, commit: Commit) -> ListResult<()> {
        let kind = change.kind();
        tracing::trace!(
            list = %self.config.label,
            change = %kind,
            bulk = kind.is_bulk(),
            len = commit.len,
            version = commit.version,
            "mutation committed"
        );

        let report = self.listeners.dispatch(&change);
        if report.is_clean() {
            return Ok(());
        }

        for failure in &report.failures {
            tracing::warn!(
                list = %self.config.label,
                change = %kind,
                "listener panicked: {}",
                failure
            );
        }
        match self.config.dispatch_policy {
            DispatchPolicy::Collect => Err(ListError::ListenerPanicked {
                change: kind,
                failures: report.failures,
            }),
            DispatchPolicy::LogAndContinue => Ok(()),
        }
    }
}

impl<T: Clone + PartialEq + 'static> ObservableList<T> {
    /// Remove the first element equal to `value`
    pub fn remove_item(&self, value: &T) -> ListResult<bool> {
        let (removed, commit) = {
            let mut store = self.store.write();
            let Some(index) = store.items.iter().position(|item| item == value) else {
                return Ok(false);
            };
            let removed = store.items.remove(index);
            (removed, store.commit())
        };
        self.publish(ListChange::Removed(removed), commit)?;
        Ok(true)
    }

    /// Remove every element equal to one of `values`
    pub fn remove_all(&self, values: &[T]) -> ListResult<usize> {
        self.extract(|items| diff::extract_members(items, values))
    }

    /// Remove every element not equal to any of `values`
    pub fn retain_all(&self, values: &[T]) -> ListResult<usize> {
        self.extract(|items| diff::extract_non_members(items, values))
    }

    pub fn contains(&self, value: &T) -> bool {
        self.store.read().items.contains(value)
    }

    pub fn contains_all(&self, values: &[T]) -> bool {
        let store = self.store.read();
        values.iter().all(|value| store.items.contains(value))
    }

    pub fn index_of(&self, value: &T) -> Option<usize> {
        self.store.read().items.iter().position(|item| item == value)
    }

    pub fn last_index_of(&self, value: &T) -> Option<usize> {
        self.store.read().items.iter().rposition(|item| item == value)
    }
}

impl<T: Clone + 'static> Default for ObservableList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + 'static> From<Vec<T>> for ObservableList<T> {
    fn from(items: Vec<T>) -> Self {
        let list = ObservableList::new();
        list.store.write().items = items;
        list
    }
}

impl<T: fmt::Debug> fmt::Debug for ObservableList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let store = self.store.read();
        f.debug_struct("ObservableList")
            .field("label", &self.config.label)
            .field("items", &store.items)
            .field("version", &store.version)
            .field("listeners", &self.listeners)
            .finish()
    }
}
