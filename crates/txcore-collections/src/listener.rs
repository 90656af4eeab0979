//! Listener capability
//!
//! A listener implements only the slots it cares about; every slot has a
//! no-op default. The list keeps listeners behind `Weak` handles, so the
//! registrant owns the `Arc` and decides how long the listener lives.

use std::fmt;

use crate::ListChange;

/// Observer of structural changes to an observable list.
///
/// Callbacks run on the mutating thread, after the mutation has committed
/// and with no list lock held.
pub trait Listener<T>: Send + Sync {
    /// Value appended at the end
    fn on_item_added(&self, _item: &T) {}

    /// Value inserted at `index`
    fn on_item_inserted(&self, _index: usize, _item: &T) {}

    /// Value at `index` replaced
    fn on_item_updated(&self, _index: usize, _old: &T, _new: &T) {}

    /// Value removed
    fn on_item_removed(&self, _item: &T) {}

    /// Every value removed by `clear`
    fn on_cleared(&self) {}

    /// Several values added and/or removed at once
    fn on_bulk_update(&self, _added: &[T], _removed: &[T]) {}
}

/// Closure adapter: one function receives every change
pub struct FnListener<F> {
    callback: F,
}

impl<F> FnListener<F> {
    pub fn new(callback: F) -> Self {
        FnListener { callback }
    }
}

impl<F> fmt::Debug for FnListener<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnListener").finish_non_exhaustive()
    }
}

impl<T, F> Listener<T> for FnListener<F>
where
    T: Clone,
    F: Fn(&ListChange<T>) + Send + Sync,
{
    fn on_item_added(&self, item: &T) {
        (self.callback)(&ListChange::Added(item.clone()));
    }

    fn on_item_inserted(&self, index: usize, item: &T) {
        (self.callback)(&ListChange::Inserted {
            index,
            item: item.clone(),
        });
    }

    fn on_item_updated(&self, index: usize, old: &T, new: &T) {
        (self.callback)(&ListChange::Updated {
            index,
            old: old.clone(),
            new: new.clone(),
        });
    }

    fn on_item_removed(&self, item: &T) {
        (self.callback)(&ListChange::Removed(item.clone()));
    }

    fn on_cleared(&self) {
        (self.callback)(&ListChange::Cleared);
    }

    fn on_bulk_update(&self, added: &[T], removed: &[T]) {
        (self.callback)(&ListChange::Bulk {
            added: added.to_vec(),
            removed: removed.to_vec(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    struct Silent;

    impl Listener<String> for Silent {}

    #[test]
    fn test_default_slots_are_noops() {
        let listener = Silent;
        listener.on_item_added(&"a".to_string());
        listener.on_item_updated(0, &"a".to_string(), &"b".to_string());
        listener.on_cleared();
        listener.on_bulk_update(&[], &[]);
    }

    #[test]
    fn test_fn_listener_rebuilds_changes() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let listener = FnListener::new(move |change: &ListChange<u8>| {
            sink.lock().push(change.clone());
        });

        listener.on_item_inserted(2, &9);
        listener.on_item_removed(&9);
        listener.on_bulk_update(&[1, 2], &[]);

        assert_eq!(
            *seen.lock(),
            vec![
                ListChange::Inserted { index: 2, item: 9 },
                ListChange::Removed(9),
                ListChange::addition(vec![1, 2]),
            ]
        );
    }
}
