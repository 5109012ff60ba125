// ── Gateway / external client overview ──
//
// Read model for listing a network's ingress gateways next to its
// external clients.

use std::sync::Arc;

use serde::Serialize;

use crate::model::{ExternalClient, Node};
use crate::store::DataStore;

/// Keep only ingress gateway nodes, preserving order.
pub fn filter_ingress_gateways(nodes: Vec<Arc<Node>>) -> Vec<Arc<Node>> {
    nodes.into_iter().filter(|n| n.isingressgateway).collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum GatewayOverview {
    /// Nothing is known about the network.
    NetworkNotFound,
    /// The network is known but none of its nodes can host external clients.
    NoGateways,
    Gateways {
        /// Sorted by display name.
        gateways: Vec<Arc<Node>>,
        /// Sorted by clientid.
        clients: Vec<Arc<ExternalClient>>,
    },
}

impl GatewayOverview {
    pub fn build(store: &DataStore, netid: &str) -> Self {
        let Some(nodes) = store.nodes_by_network(netid) else {
            return Self::NetworkNotFound;
        };

        let mut gateways = filter_ingress_gateways(nodes);
        if gateways.is_empty() {
            return Self::NoGateways;
        }
        gateways.sort_by(|a, b| a.display_name().cmp(b.display_name()));

        let mut clients = store.ext_clients_by_network(netid);
        clients.sort_by(|a, b| a.clientid.cmp(&b.clientid));

        Self::Gateways { gateways, clients }
    }
}
