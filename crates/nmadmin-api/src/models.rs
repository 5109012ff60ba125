// Wire types for the management server REST API
//
// Field names follow the server's JSON exactly. Boolean policy toggles
// travel as "yes" / "no" strings; numeric timestamps are unix seconds.

use serde::{Deserialize, Serialize};

/// A network record as returned by `GET /api/networks/{netid}` and
/// accepted by `PUT /api/networks/{netid}`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ApiNetwork {
    pub netid: String,
    #[serde(default)]
    pub displayname: String,
    #[serde(default)]
    pub addressrange: String,
    #[serde(default)]
    pub addressrange6: String,
    #[serde(default)]
    pub localrange: String,
    #[serde(default)]
    pub defaultinterface: String,
    #[serde(default)]
    pub defaultlistenport: i32,
    #[serde(default)]
    pub defaultpostup: String,
    #[serde(default)]
    pub defaultpostdown: String,
    #[serde(default)]
    pub defaultkeepalive: i32,
    #[serde(default)]
    pub defaultextclientdns: String,
    #[serde(default)]
    pub defaultmtu: i32,
    #[serde(default, with = "yes_no")]
    pub isipv4: bool,
    #[serde(default, with = "yes_no")]
    pub isipv6: bool,
    #[serde(default, with = "yes_no")]
    pub allowmanualsignup: bool,
    #[serde(default, with = "yes_no")]
    pub defaultudpholepunch: bool,
    #[serde(default, with = "yes_no")]
    pub ispointtosite: bool,
    #[serde(default, with = "yes_no")]
    pub defaultacl: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nodeslastmodified: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub networklastmodified: Option<i64>,
}

/// A node (machine) participating in a network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiNode {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub address6: String,
    #[serde(default)]
    pub network: String,
    #[serde(default, with = "yes_no")]
    pub isingressgateway: bool,
    #[serde(default)]
    pub lastcheckin: Option<i64>,
}

/// An external VPN client bound to an ingress gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiExtClient {
    pub clientid: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub network: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub address6: String,
    #[serde(default)]
    pub ingressgatewayid: String,
    #[serde(default)]
    pub ingressgatewayendpoint: String,
    #[serde(default)]
    pub lastmodified: Option<i64>,
    #[serde(default = "enabled_default")]
    pub enabled: bool,
}

fn enabled_default() -> bool {
    true
}

/// Body of `PUT /api/extclients/{netid}/{clientid}`.
///
/// Keys and addresses are server-owned; only the metadata below can be
/// changed. `clientid` carries the new name and equals the old one when
/// the client is not being renamed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ApiExtClientUpdate {
    pub clientid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

/// Rendering of an external client's WireGuard configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtClientConfigKind {
    /// The `.conf` file as text.
    File,
    /// A PNG QR code of the same file.
    Qr,
}

impl ExtClientConfigKind {
    /// Trailing path segment the server expects.
    pub fn as_segment(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Qr => "qr",
        }
    }
}

/// Server-wide configuration flags from `GET /api/server/getconfig`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ApiServerConfig {
    #[serde(rename = "RCE", default, with = "yes_no")]
    pub rce: bool,
    #[serde(rename = "Version", default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Error body shape: `{ "Code": 400, "Message": "..." }`.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorResponse {
    #[serde(rename = "Message", default)]
    pub message: Option<String>,
}

/// Serde adapter for the server's `"yes"` / `"no"` flags.
///
/// Serializes as `"yes"` / `"no"`; deserializes from those strings,
/// `"on"` / `"off"`, `"true"` / `"false"`, or a JSON boolean.
pub mod yes_no {
    use serde::de::{self, Deserializer, Visitor};
    use serde::Serializer;
    use std::fmt;

    #[allow(clippy::trivially_copy_pass_by_ref)]
    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(if *value { "yes" } else { "no" })
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        deserializer.deserialize_any(FlagVisitor)
    }

    struct FlagVisitor;

    impl Visitor<'_> for FlagVisitor {
        type Value = bool;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a boolean or one of \"yes\", \"no\", \"on\", \"off\"")
        }

        fn visit_bool<E: de::Error>(self, v: bool) -> Result<bool, E> {
            Ok(v)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<bool, E> {
            match v.trim().to_ascii_lowercase().as_str() {
                "yes" | "on" | "true" | "1" => Ok(true),
                "no" | "off" | "false" | "0" | "" => Ok(false),
                other => Err(E::invalid_value(de::Unexpected::Str(other), &self)),
            }
        }

        fn visit_unit<E: de::Error>(self) -> Result<bool, E> {
            Ok(false)
        }
    }
}
