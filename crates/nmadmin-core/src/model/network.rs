// ── Network domain types ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A network's configuration record, one per `netid`.
///
/// `addressrange` is only meaningful when `isipv4` is set, and
/// `addressrange6` only when `isipv6` is set. Both flags are fixed when
/// the network is created.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Network {
    pub netid: String,
    pub displayname: String,

    // Addressing
    pub addressrange: String,
    pub addressrange6: String,
    pub localrange: String,
    pub isipv4: bool,
    pub isipv6: bool,

    // Node defaults
    pub defaultinterface: String,
    pub defaultlistenport: i32,
    pub defaultpostup: String,
    pub defaultpostdown: String,
    pub defaultkeepalive: i32,
    pub defaultextclientdns: String,
    pub defaultmtu: i32,

    // Policy toggles
    pub allowmanualsignup: bool,
    pub defaultudpholepunch: bool,
    pub ispointtosite: bool,
    pub defaultacl: bool,

    // Bookkeeping
    pub nodeslastmodified: Option<DateTime<Utc>>,
    pub networklastmodified: Option<DateTime<Utc>>,
}

/// The body of a network update.
///
/// Same shape as [`Network`], but only ever produced from a validated
/// draft, so the numeric fields are known to be integers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkPayload {
    pub netid: String,
    pub displayname: String,
    pub addressrange: String,
    pub addressrange6: String,
    pub localrange: String,
    pub isipv4: bool,
    pub isipv6: bool,
    pub defaultinterface: String,
    pub defaultlistenport: i32,
    pub defaultpostup: String,
    pub defaultpostdown: String,
    pub defaultkeepalive: i32,
    pub defaultextclientdns: String,
    pub defaultmtu: i32,
    pub allowmanualsignup: bool,
    pub defaultudpholepunch: bool,
    pub ispointtosite: bool,
    pub defaultacl: bool,
    pub nodeslastmodified: Option<DateTime<Utc>>,
    pub networklastmodified: Option<DateTime<Utc>>,
}

impl From<Network> for NetworkPayload {
    fn from(n: Network) -> Self {
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
            nodeslastmodified: n.nodeslastmodified,
            networklastmodified: n.networklastmodified,
        }
    }
}
