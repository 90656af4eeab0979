//! Test listeners
//!
//! - `ChangeRecorder`: keeps every change it receives, in order
//! - `PanickingListener`: panics on selected change kinds

use parking_lot::Mutex;

use txcore_collections::{ChangeKind, ListChange, Listener};

/// Listener that records every change it is handed
#[derive(Debug)]
pub struct ChangeRecorder<T> {
    changes: Mutex<Vec<ListChange<T>>>,
}

impl<T: Clone> ChangeRecorder<T> {
    pub fn new() -> Self {
        ChangeRecorder {
            changes: Mutex::new(Vec::new()),
        }
    }

    /// Copy of everything recorded so far
    pub fn changes(&self) -> Vec<ListChange<T>> {
        self.changes.lock().clone()
    }

    /// Drain the recording
    pub fn take(&self) -> Vec<ListChange<T>> {
        std::mem::take(&mut *self.changes.lock())
    }

    pub fn len(&self) -> usize {
        self.changes.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.lock().is_empty()
    }

    /// Recorded changes of one kind
    pub fn count(&self, kind: ChangeKind) -> usize {
        self.changes
            .lock()
            .iter()
            .filter(|c| c.kind() == kind)
            .count()
    }

    fn record(&self, change: ListChange<T>) {
        self.changes.lock().push(change);
    }
}

impl<T: Clone> Default for ChangeRecorder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send> Listener<T> for ChangeRecorder<T> {
    fn on_item_added(&self, item: &T) {
        self.record(ListChange::Added(item.clone()));
    }

    fn on_item_inserted(&self, index: usize, item: &T) {
        self.record(ListChange::Inserted {
            index,
            item: item.clone(),
        });
    }

    fn on_item_updated(&self, index: usize, old: &T, new: &T) {
        self.record(ListChange::Updated {
            index,
            old: old.clone(),
            new: new.clone(),
        });
    }

    fn on_item_removed(&self, item: &T) {
        self.record(ListChange::Removed(item.clone()));
    }

    fn on_cleared(&self) {
        self.record(ListChange::Cleared);
    }

    fn on_bulk_update(&self, added: &[T], removed: &[T]) {
        self.record(ListChange::Bulk {
            added: added.to_vec(),
            removed: removed.to_vec(),
        });
    }
}

/// Listener that panics whenever it receives one of `kinds`
#[derive(Clone, Debug)]
pub struct PanickingListener {
    kinds: Vec<ChangeKind>,
}

impl PanickingListener {
    pub fn on(kinds: &[ChangeKind]) -> Self {
        PanickingListener {
            kinds: kinds.to_vec(),
        }
    }

    /// Panic on every change
    pub fn always() -> Self {
        Self::on(&[
            ChangeKind::ItemAdded,
            ChangeKind::ItemInserted,
            ChangeKind::ItemUpdated,
            ChangeKind::ItemRemoved,
            ChangeKind::Cleared,
            ChangeKind::BulkUpdate,
        ])
    }

    fn trip(&self, kind: ChangeKind) {
        if self.kinds.contains(&kind) {
            panic!("listener refused {kind}");
        }
    }
}

impl<T> Listener<T> for PanickingListener {
    fn on_item_added(&self, _item: &T) {
        self.trip(ChangeKind::ItemAdded);
    }

    fn on_item_inserted(&self, _index: usize, _item: &T) {
        self.trip(ChangeKind::ItemInserted);
    }

    fn on_item_updated(&self, _index: usize, _old: &T, _new: &T) {
        self.trip(ChangeKind::ItemUpdated);
    }

    fn on_item_removed(&self, _item: &T) {
        self.trip(ChangeKind::ItemRemoved);
    }

    fn on_cleared(&self) {
        self.trip(ChangeKind::Cleared);
    }

    fn on_bulk_update(&self, _added: &[T], _removed: &[T]) {
        self.trip(ChangeKind::BulkUpdate);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use txcore_collections::{ListConfig, ListError, ObservableList};

    #[test]
    fn test_recorder_counts_by_kind() {
        let list = ObservableList::new();
        let recorder = Arc::new(ChangeRecorder::<&str>::new());
        list.add_listener(&recorder);

        list.push("a").unwrap();
        list.push("b").unwrap();
        list.remove(0).unwrap();
        list.clear().unwrap();

        assert_eq!(recorder.len(), 4);
        assert_eq!(recorder.count(ChangeKind::ItemAdded), 2);
        assert_eq!(recorder.count(ChangeKind::ItemRemoved), 1);
        assert_eq!(recorder.count(ChangeKind::Cleared), 1);
        assert_eq!(recorder.take().len(), 4);
        assert!(recorder.is_empty());
    }

    #[test]
    fn test_panicking_listener_is_selective() {
        let list = ObservableList::with_config(ListConfig::strict());
        let panicking = Arc::new(PanickingListener::on(&[ChangeKind::Cleared]));
        list.add_listener(&panicking);

        assert!(list.push(1u32).is_ok());
        let err = list.clear().unwrap_err();
        assert!(matches!(
            err,
            ListError::ListenerPanicked {
                change: ChangeKind::Cleared,
                ..
            }
        ));
        assert!(list.is_empty());
    }
}
