// ── External client domain type ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A VPN client that is not a node, attached through an ingress gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalClient {
    pub clientid: String,
    pub description: String,
    pub network: String,
    pub address: String,
    pub address6: String,
    pub ingressgatewayid: String,
    pub ingressgatewayendpoint: String,
    pub enabled: bool,
    pub lastmodified: Option<DateTime<Utc>>,
}

/// Metadata changes to an external client. `None` leaves a value as is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtClientUpdate {
    /// New client id.
    pub rename: Option<String>,
    pub description: Option<String>,
    pub enabled: Option<bool>,
}

impl ExtClientUpdate {
    pub fn is_empty(&self) -> bool {
        self.rename.is_none() && self.description.is_none() && self.enabled.is_none()
    }
}

/// Which rendering of a client's WireGuard config to download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientConfigFormat {
    /// Plain `.conf` text.
    File,
    /// PNG QR code.
    Qr,
}
