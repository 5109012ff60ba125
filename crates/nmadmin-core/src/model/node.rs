// ── Node domain type ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A machine participating in a network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub name: String,
    pub address: String,
    pub address6: String,
    /// Owning network (`netid`).
    pub network: String,
    /// Ingress gateways may host external clients.
    pub isingressgateway: bool,
    pub lastcheckin: Option<DateTime<Utc>>,
}

impl Node {
    /// Name if set, otherwise the node id.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() { &self.id } else { &self.name }
    }
}
