// ── Store views ──
//
// `Store<T>` is the read contract consumers program against: pull the
// current value, or subscribe and pull again when it changes. The
// handles below expose slices of the DataStore through it.

use std::sync::Arc;

use tokio::task::JoinHandle;

use super::{DataStore, Snapshot};
use crate::model::{ExternalClient, Network, Node, ServerConfig};
use crate::stream::Subscription;

/// Read access to a reactive value.
pub trait Store<T: Clone + Send + Sync + 'static> {
    /// Current value.
    fn get(&self) -> T;

    /// Subscribe to changes.
    fn subscribe(&self) -> Subscription<T>;

    /// Call `listener` with every new value until the guard is dropped.
    ///
    /// Must be called from within a tokio runtime.
    fn on_change<F>(&self, mut listener: F) -> ListenerGuard
    where
        F: FnMut(&T) + Send + 'static,
    {
        let mut sub = self.subscribe();
        ListenerGuard(tokio::spawn(async move {
            while let Some(value) = sub.changed().await {
                listener(&value);
            }
        }))
    }
}

/// Stops an [`on_change`](Store::on_change) listener when dropped.
#[must_use = "the listener stops as soon as the guard is dropped"]
#[derive(Debug)]
pub struct ListenerGuard(JoinHandle<()>);

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}

// ── Networks ─────────────────────────────────────────────────────────

/// Networks plus the server flags the network editor depends on.
#[derive(Clone)]
pub struct NetworkStoreHandle {
    store: Arc<DataStore>,
}

impl NetworkStoreHandle {
    pub fn new(store: Arc<DataStore>) -> Self {
        Self { store }
    }

    pub fn network(&self, netid: &str) -> Option<Arc<Network>> {
        self.store.network(netid)
    }

    pub fn server_config(&self) -> ServerConfigHandle {
        ServerConfigHandle::new(Arc::clone(&self.store))
    }
}

impl Store<Snapshot<Network>> for NetworkStoreHandle {
    fn get(&self) -> Snapshot<Network> {
        self.store.networks_snapshot()
    }

    fn subscribe(&self) -> Subscription<Snapshot<Network>> {
        self.store.subscribe_networks()
    }
}

#[derive(Clone)]
pub struct ServerConfigHandle {
    store: Arc<DataStore>,
}

impl ServerConfigHandle {
    pub fn new(store: Arc<DataStore>) -> Self {
        Self { store }
    }
}

impl Store<ServerConfig> for ServerConfigHandle {
    fn get(&self) -> ServerConfig {
        self.store.server_config()
    }

    fn subscribe(&self) -> Subscription<ServerConfig> {
        self.store.subscribe_server_config()
    }
}

// ── External clients ─────────────────────────────────────────────────

/// External clients and the node lookups needed to place them.
#[derive(Clone)]
pub struct ExtClientStoreHandle {
    store: Arc<DataStore>,
}

impl ExtClientStoreHandle {
    pub fn new(store: Arc<DataStore>) -> Self {
        Self { store }
    }

    pub fn nodes_by_network(&self, netid: &str) -> Option<Vec<Arc<Node>>> {
        self.store.nodes_by_network(netid)
    }

    pub fn ext_clients_by_network(&self, netid: &str) -> Vec<Arc<ExternalClient>> {
        self.store.ext_clients_by_network(netid)
    }
}

impl Store<Snapshot<ExternalClient>> for ExtClientStoreHandle {
    fn get(&self) -> Snapshot<ExternalClient> {
        self.store.ext_clients_snapshot()
    }

    fn subscribe(&self) -> Subscription<Snapshot<ExternalClient>> {
        self.store.subscribe_ext_clients()
    }
}
