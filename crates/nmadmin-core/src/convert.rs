// ── API-to-domain type conversions ──
//
// Bridges raw `nmadmin_api` wire types into `nmadmin_core::model` domain
// types and back. Timestamps travel as unix seconds on the wire.

use chrono::{DateTime, Utc};

use nmadmin_api::{
    ApiExtClient, ApiExtClientUpdate, ApiNetwork, ApiNode, ApiServerConfig, ExtClientConfigKind,
};

use crate::model::{
    ClientConfigFormat, ExtClientUpdate, ExternalClient, Network, NetworkPayload, Node, ServerConfig,
};

// ── Helpers ────────────────────────────────────────────────────────

/// Epoch seconds to `DateTime<Utc>`. Zero and negative values mean "never".
fn epoch_to_datetime(epoch: Option<i64>) -> Option<DateTime<Utc>> {
    epoch
        .filter(|ts| *ts > 0)
        .and_then(|ts| DateTime::from_timestamp(ts, 0))
}

fn datetime_to_epoch(dt: Option<DateTime<Utc>>) -> Option<i64> {
    dt.map(|d| d.timestamp())
}

// ── Network ────────────────────────────────────────────────────────

impl From<ApiNetwork> for Network {
    fn from(n: ApiNetwork) -> Self {
        Self {
            netid: n.netid,
            displayname: n.displayname,
            addressrange: n.addressrange,
            addressrange6: n.addressrange6,
            localrange: n.localrange,
            isipv4: n.isipv4,
            isipv6: n.isipv6,
            defaultinterface: n.defaultinterface,
            defaultlistenport: n.defaultlistenport,
            defaultpostup: n.defaultpostup,
            defaultpostdown: n.defaultpostdown,
            defaultkeepalive: n.defaultkeepalive,
            defaultextclientdns: n.defaultextclientdns,
            defaultmtu: n.defaultmtu,
            allowmanualsignup: n.allowmanualsignup,
            defaultudpholepunch: n.defaultudpholepunch,
            ispointtosite: n.ispointtosite,
            defaultacl: n.defaultacl,
            nodeslastmodified: epoch_to_datetime(n.nodeslastmodified),
            networklastmodified: epoch_to_datetime(n.networklastmodified),
        }
    }
}

impl From<NetworkPayload> for ApiNetwork {
    fn from(p: NetworkPayload) -> Self {
        Self {
            netid: p.netid,
            displayname: p.displayname,
            addressrange: p.addressrange,
            addressrange6: p.addressrange6,
            localrange: p.localrange,
            isipv4: p.isipv4,
            isipv6: p.isipv6,
            defaultinterface: p.defaultinterface,
            defaultlistenport: p.defaultlistenport,
            defaultpostup: p.defaultpostup,
            defaultpostdown: p.defaultpostdown,
            defaultkeepalive: p.defaultkeepalive,
            defaultextclientdns: p.defaultextclientdns,
            defaultmtu: p.defaultmtu,
            allowmanualsignup: p.allowmanualsignup,
            defaultudpholepunch: p.defaultudpholepunch,
            ispointtosite: p.ispointtosite,
            defaultacl: p.defaultacl,
            nodeslastmodified: datetime_to_epoch(p.nodeslastmodified),
            networklastmodified: datetime_to_epoch(p.networklastmodified),
        }
    }
}

// ── Node ───────────────────────────────────────────────────────────

impl From<ApiNode> for Node {
    fn from(n: ApiNode) -> Self {
        Self {
            id: n.id,
            name: n.name,
            address: n.address,
            address6: n.address6,
            network: n.network,
            isingressgateway: n.isingressgateway,
            lastcheckin: epoch_to_datetime(n.lastcheckin),
        }
    }
}

// ── External client ────────────────────────────────────────────────

impl From<ApiExtClient> for ExternalClient {
    fn from(c: ApiExtClient) -> Self {
        Self {
            clientid: c.clientid,
            description: c.description,
            network: c.network,
            address: c.address,
            address6: c.address6,
            ingressgatewayid: c.ingressgatewayid,
            ingressgatewayendpoint: c.ingressgatewayendpoint,
            enabled: c.enabled,
            lastmodified: epoch_to_datetime(c.lastmodified),
        }
    }
}

/// Wire body for `update` applied to `clientid`; an absent rename keeps
/// the current id.
pub(crate) fn ext_client_update_body(clientid: &str, update: ExtClientUpdate) -> ApiExtClientUpdate {
    ApiExtClientUpdate {
        clientid: update.rename.unwrap_or_else(|| clientid.to_owned()),
        description: update.description,
        enabled: update.enabled,
    }
}

impl From<ClientConfigFormat> for ExtClientConfigKind {
    fn from(format: ClientConfigFormat) -> Self {
        match format {
            ClientConfigFormat::File => Self::File,
            ClientConfigFormat::Qr => Self::Qr,
        }
    }
}

// ── Server config ──────────────────────────────────────────────────

impl From<ApiServerConfig> for ServerConfig {
    fn from(c: ApiServerConfig) -> Self {
        Self {
            rce: c.rce,
            version: c.version,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn network_timestamps_convert_from_epoch() {
        let api = ApiNetwork {
            netid: "home".into(),
            nodeslastmodified: Some(1_650_000_000),
            networklastmodified: Some(0),
            ..ApiNetwork::default()
        };
        let net = Network::from(api);
        assert_eq!(
            net.nodeslastmodified,
            DateTime::from_timestamp(1_650_000_000, 0)
        );
        assert_eq!(net.networklastmodified, None);
    }

    #[test]
    fn payload_round_trips_to_wire_record() {
        let api = ApiNetwork {
            netid: "home".into(),
            addressrange: "10.0.0.0/16".into(),
            isipv4: true,
            defaultmtu: 1280,
            defaultacl: true,
            nodeslastmodified: Some(1_650_000_000),
            ..ApiNetwork::default()
        };
        let payload = NetworkPayload::from(Network::from(api.clone()));
        assert_eq!(ApiNetwork::from(payload), api);
    }

    #[test]
    fn ext_client_update_keeps_id_unless_renamed() {
        let keep = ext_client_update_body(
            "phone",
            ExtClientUpdate {
                enabled: Some(false),
                ..ExtClientUpdate::default()
            },
        );
        assert_eq!(keep.clientid, "phone");
        assert_eq!(keep.enabled, Some(false));
        assert_eq!(keep.description, None);

        let renamed = ext_client_update_body(
            "phone",
            ExtClientUpdate {
                rename: Some("work-phone".into()),
                ..ExtClientUpdate::default()
            },
        );
        assert_eq!(renamed.clientid, "work-phone");
    }

    #[test]
    fn node_keeps_gateway_flag() {
        let node = Node::from(ApiNode {
            id: "n1".into(),
            name: String::new(),
            address: "10.0.0.1".into(),
            address6: String::new(),
            network: "home".into(),
            isingressgateway: true,
            lastcheckin: None,
        });
        assert!(node.isingressgateway);
        assert_eq!(node.display_name(), "n1");
    }
}
