//! TXCore Collections - Thread-safe observable collections
//!
//! This crate provides:
//! - `ObservableList<T>`: an ordered, index-addressable store guarded by a
//!   single lock, announcing every structural change to its listeners
//! - The `Listener` capability trait (every slot defaults to a no-op)
//! - A copy-on-write listener registry that dispatches outside the store lock
//! - Bulk diff computation for predicate and membership removals
//!
//! Dispatch happens after the mutation has committed and the store lock has
//! been released, so a listener callback may call back into the list,
//! mutations included.

pub mod change;
pub mod config;
pub mod diff;
pub mod error;
pub mod list;
pub mod listener;
pub mod registry;

pub use change::*;
pub use config::*;
pub use error::*;
pub use list::*;
pub use listener::*;
pub use registry::*;
