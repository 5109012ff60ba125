// ── Reactive storage ──
//
// The DataStore holds every entity the controller has fetched. Readers
// either pull a snapshot or subscribe and pull again on change.

mod collection;
mod data_store;
mod handle;

pub use collection::EntityCollection;
pub use data_store::DataStore;
pub use handle::{ExtClientStoreHandle, ListenerGuard, NetworkStoreHandle, ServerConfigHandle, Store};

use std::sync::Arc;

/// An immutable point-in-time view of a collection.
pub type Snapshot<T> = Arc<Vec<Arc<T>>>;
