// ── Central reactive data store ──
//
// Thread-safe, lock-free storage for networks, nodes, external clients
// and server flags. Mutations are broadcast to subscribers via `watch`
// channels.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use super::Snapshot;
use super::collection::EntityCollection;
use crate::gateways::filter_ingress_gateways;
use crate::model::{ExternalClient, Network, Node, ServerConfig};
use crate::stream::Subscription;

/// Central reactive store.
///
/// Thread-safe and lock-free: all reads are wait-free, writes use
/// fine-grained per-shard locks within `DashMap`. Only the controller
/// writes; everything else reads.
pub struct DataStore {
    pub(crate) networks: EntityCollection<Network>,
    pub(crate) nodes: EntityCollection<Node>,
    pub(crate) ext_clients: EntityCollection<ExternalClient>,
    pub(crate) server_config: watch::Sender<ServerConfig>,
    pub(crate) last_full_refresh: watch::Sender<Option<DateTime<Utc>>>,
}

fn scoped_key(netid: &str, id: &str) -> String {
    format!("{netid}/{id}")
}

impl DataStore {
    pub fn new() -> Self {
        let (server_config, _) = watch::channel(ServerConfig::default());
        let (last_full_refresh, _) = watch::channel(None);

        Self {
            networks: EntityCollection::new(),
            nodes: EntityCollection::new(),
            ext_clients: EntityCollection::new(),
            server_config,
            last_full_refresh,
        }
    }

    // ── Networks ─────────────────────────────────────────────────────

    pub fn network(&self, netid: &str) -> Option<Arc<Network>> {
        self.networks.get_by_key(netid)
    }

    /// All networks, ordered by netid.
    pub fn networks_snapshot(&self) -> Snapshot<Network> {
        self.networks.snapshot()
    }

    pub fn network_count(&self) -> usize {
        self.networks.len()
    }

    pub fn server_config(&self) -> ServerConfig {
        self.server_config.borrow().clone()
    }

    // ── Nodes & external clients ─────────────────────────────────────

    /// Nodes of `netid`, ordered by id.
    ///
    /// `None` when the network is unknown and no nodes reference it.
    pub fn nodes_by_network(&self, netid: &str) -> Option<Vec<Arc<Node>>> {
        let nodes: Vec<Arc<Node>> = self
            .nodes
            .snapshot()
            .iter()
            .filter(|n| n.network == netid)
            .cloned()
            .collect();
        if nodes.is_empty() && self.network(netid).is_none() {
            None
        } else {
            Some(nodes)
        }
    }

    pub fn node(&self, netid: &str, id: &str) -> Option<Arc<Node>> {
        self.nodes.get_by_key(&scoped_key(netid, id))
    }

    /// Ingress gateway nodes of `netid`; `None` as for
    /// [`nodes_by_network`](Self::nodes_by_network).
    pub fn ingress_gateways(&self, netid: &str) -> Option<Vec<Arc<Node>>> {
        self.nodes_by_network(netid).map(filter_ingress_gateways)
    }

    pub fn nodes_snapshot(&self) -> Snapshot<Node> {
        self.nodes.snapshot()
    }

    /// External clients of `netid`, ordered by clientid.
    pub fn ext_clients_by_network(&self, netid: &str) -> Vec<Arc<ExternalClient>> {
        self.ext_clients
            .snapshot()
            .iter()
            .filter(|c| c.network == netid)
            .cloned()
            .collect()
    }

    pub fn ext_client(&self, netid: &str, clientid: &str) -> Option<Arc<ExternalClient>> {
        self.ext_clients.get_by_key(&scoped_key(netid, clientid))
    }

    pub fn ext_clients_snapshot(&self) -> Snapshot<ExternalClient> {
        self.ext_clients.snapshot()
    }

    // ── Subscriptions ────────────────────────────────────────────────

    pub fn subscribe_networks(&self) -> Subscription<Snapshot<Network>> {
        Subscription::new(self.networks.subscribe())
    }

    pub fn subscribe_nodes(&self) -> Subscription<Snapshot<Node>> {
        Subscription::new(self.nodes.subscribe())
    }

    pub fn subscribe_ext_clients(&self) -> Subscription<Snapshot<ExternalClient>> {
        Subscription::new(self.ext_clients.subscribe())
    }

    pub fn subscribe_server_config(&self) -> Subscription<ServerConfig> {
        Subscription::new(self.server_config.subscribe())
    }

    // ── Writers ──────────────────────────────────────────────────────

    /// Replace every network. Nodes and external clients of networks
    /// that disappeared are dropped too.
    pub(crate) fn apply_networks(&self, networks: Vec<Network>) {
        self.networks
            .replace_all(networks.into_iter().map(|n| (n.netid.clone(), n)));

        let gone = |netid: &str| self.networks.get_by_key(netid).is_none();
        if self.nodes.snapshot().iter().any(|n| gone(&n.network)) {
            self.nodes.replace_where(|n| gone(&n.network), []);
        }
        if self.ext_clients.snapshot().iter().any(|c| gone(&c.network)) {
            self.ext_clients.replace_where(|c| gone(&c.network), []);
        }
    }

    /// Insert or replace one network record.
    pub(crate) fn apply_network(&self, network: Network) {
        self.networks.upsert(network.netid.clone(), network);
    }

    /// Replace the node list of one network.
    pub(crate) fn apply_nodes(&self, netid: &str, nodes: Vec<Node>) {
        self.nodes.replace_where(
            |n| n.network == netid,
            nodes.into_iter().map(|n| (scoped_key(netid, &n.id), n)),
        );
    }

    /// Replace the external client list of one network.
    pub(crate) fn apply_ext_clients(&self, netid: &str, clients: Vec<ExternalClient>) {
        self.ext_clients.replace_where(
            |c| c.network == netid,
            clients
                .into_iter()
                .map(|c| (scoped_key(netid, &c.clientid), c)),
        );
    }

    /// Store an updated client, dropping its entry under `previous_id`
    /// when the update renamed it.
    pub(crate) fn replace_ext_client(&self, netid: &str, previous_id: &str, client: ExternalClient) {
        if previous_id != client.clientid {
            self.ext_clients.remove(&scoped_key(netid, previous_id));
        }
        self.ext_clients
            .upsert(scoped_key(netid, &client.clientid), client);
    }

    pub(crate) fn remove_ext_client(
        &self,
        netid: &str,
        clientid: &str,
    ) -> Option<Arc<ExternalClient>> {
        self.ext_clients.remove(&scoped_key(netid, clientid))
    }

    pub(crate) fn set_server_config(&self, config: ServerConfig) {
        self.server_config.send_replace(config);
    }

    pub(crate) fn mark_refreshed(&self) {
        self.last_full_refresh.send_replace(Some(Utc::now()));
    }

    /// When the last full refresh completed.
    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        *self.last_full_refresh.borrow()
    }
}

impl Default for DataStore {
    fn default() -> Self {
        Self::new()
    }
}
