//! Change notifications
//!
//! Every committed mutation is summarized as one [`ListChange`]. The
//! registry delivers it to each listener through the slot that matches
//! its variant.

use std::fmt;

use crate::Listener;

/// Change classification, used in logs and error reports
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    ItemAdded,
    ItemInserted,
    ItemUpdated,
    ItemRemoved,
    Cleared,
    BulkUpdate,
}

impl ChangeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ChangeKind::ItemAdded => "item-added",
            ChangeKind::ItemInserted => "item-inserted",
            ChangeKind::ItemUpdated => "item-updated",
            ChangeKind::ItemRemoved => "item-removed",
            ChangeKind::Cleared => "collection-cleared",
            ChangeKind::BulkUpdate => "bulk-update",
        }
    }

    /// Does this change touch more than one element at once?
    pub fn is_bulk(self) -> bool {
        matches!(self, ChangeKind::Cleared | ChangeKind::BulkUpdate)
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Summary of one committed state transition
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ListChange<T> {
    /// Value appended at the end
    Added(T),
    /// Value inserted at `index`, successors shifted right
    Inserted { index: usize, item: T },
    /// Value at `index` replaced
    Updated { index: usize, old: T, new: T },
    /// Value removed, successors shifted left
    Removed(T),
    /// Store emptied
    Cleared,
    /// Several values added and/or removed in one step.
    /// Both sides keep the order they had in the input or the store.
    Bulk { added: Vec<T>, removed: Vec<T> },
}

impl<T> ListChange<T> {
    pub fn kind(&self) -> ChangeKind {
        match self {
            ListChange::Added(_) => ChangeKind::ItemAdded,
            ListChange::Inserted { .. } => ChangeKind::ItemInserted,
            ListChange::Updated { .. } => ChangeKind::ItemUpdated,
            ListChange::Removed(_) => ChangeKind::ItemRemoved,
            ListChange::Cleared => ChangeKind::Cleared,
            ListChange::Bulk { .. } => ChangeKind::BulkUpdate,
        }
    }

    /// Bulk change that only removes
    pub fn removal(removed: Vec<T>) -> Self {
        ListChange::Bulk {
            added: Vec::new(),
            removed,
        }
    }

    /// Bulk change that only adds
    pub fn addition(added: Vec<T>) -> Self {
        ListChange::Bulk {
            added,
            removed: Vec::new(),
        }
    }

    /// Route this change to the listener slot that handles it
    pub fn deliver_to(&self, listener: &dyn Listener<T>) {
        match self {
            ListChange::Added(item) => listener.on_item_added(item),
            ListChange::Inserted { index, item } => listener.on_item_inserted(*index, item),
            ListChange::Updated { index, old, new } => listener.on_item_updated(*index, old, new),
            ListChange::Removed(item) => listener.on_item_removed(item),
            ListChange::Cleared => listener.on_cleared(),
            ListChange::Bulk { added, removed } => listener.on_bulk_update(added, removed),
        }
    }
}
