// ── Editable network fields ──
//
// One variant per field the network form shows, in display order.
// Wire names are the lowercase variant names and match the server's JSON.

use std::fmt;

use serde::Serialize;
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoStaticStr};

/// How a field's value is entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    /// Entered as text, sent as an integer.
    Integer,
    Switch,
}

/// Whether a field may be changed in the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldAccess {
    Editable,
    ReadOnly,
}

impl FieldAccess {
    pub fn is_editable(self) -> bool {
        self == Self::Editable
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
    IntoStaticStr,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Field {
    AddressRange,
    AddressRange6,
    LocalRange,
    DefaultInterface,
    DefaultListenPort,
    DefaultPostUp,
    DefaultPostDown,
    DefaultKeepalive,
    DefaultExtClientDns,
    DefaultMtu,
    IsIpv4,
    IsIpv6,
    AllowManualSignup,
    DefaultUdpHolePunch,
    IsPointToSite,
    DefaultAcl,
}

impl Field {
    pub fn kind(self) -> FieldKind {
        match self {
            Self::DefaultListenPort | Self::DefaultKeepalive | Self::DefaultMtu => {
                FieldKind::Integer
            }
            Self::IsIpv4
            | Self::IsIpv6
            | Self::AllowManualSignup
            | Self::DefaultUdpHolePunch
            | Self::IsPointToSite
            | Self::DefaultAcl => FieldKind::Switch,
            _ => FieldKind::Text,
        }
    }

    /// Message key of the field's label.
    pub fn label_key(self) -> &'static str {
        match self {
            Self::AddressRange => "network.addressrange",
            Self::AddressRange6 => "network.addressrange6",
            Self::LocalRange => "network.localrange",
            Self::DefaultInterface => "network.defaultinterface",
            Self::DefaultListenPort => "network.defaultlistenport",
            Self::DefaultPostUp => "network.defaultpostup",
            Self::DefaultPostDown => "network.defaultpostdown",
            Self::DefaultKeepalive => "network.defaultkeepalive",
            Self::DefaultExtClientDns => "network.defaultextclientdns",
            Self::DefaultMtu => "network.defaultmtu",
            Self::IsIpv4 => "network.isipv4",
            Self::IsIpv6 => "network.isipv6",
            Self::AllowManualSignup => "network.allowmanualsignup",
            Self::DefaultUdpHolePunch => "network.defaultudpholepunch",
            Self::IsPointToSite => "network.ispointtosite",
            Self::DefaultAcl => "network.defaultacl",
        }
    }

    /// Message key of the field's help text.
    pub fn help_key(self) -> &'static str {
        match self {
            Self::AddressRange => "helper.whatisipv4",
            Self::AddressRange6 => "helper.whatisipv6",
            Self::LocalRange => "helper.localrange",
            Self::DefaultInterface => "helper.defaultinterface",
            Self::DefaultListenPort => "helper.defaultlistenport",
            Self::DefaultPostUp => "helper.defaultpostup",
            Self::DefaultPostDown => "helper.defaultpostdown",
            Self::DefaultKeepalive => "helper.keepalive",
            Self::DefaultExtClientDns => "helper.extclient",
            Self::DefaultMtu => "helper.mtu",
            Self::IsIpv4 => "helper.ipv4",
            Self::IsIpv6 => "helper.ipv6",
            Self::AllowManualSignup => "helper.nokeysignup",
            Self::DefaultUdpHolePunch => "helper.udpholepunching",
            Self::IsPointToSite => "helper.pointtosite",
            Self::DefaultAcl => "helper.defaultaccesscontrol",
        }
    }
}

/// A field's current value as held by a draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Switch(bool),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Switch(_) => None,
        }
    }

    pub fn as_switch(&self) -> Option<bool> {
        match self {
            Self::Switch(b) => Some(*b),
            Self::Text(_) => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Switch(b) => f.write_str(if *b { "yes" } else { "no" }),
        }
    }
}

/// Parse user input for a switch field.
pub fn parse_switch(input: &str) -> Option<bool> {
    match input.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn wire_names_are_lowercase() {
        assert_eq!(Field::AddressRange6.as_ref(), "addressrange6");
        assert_eq!(Field::DefaultExtClientDns.to_string(), "defaultextclientdns");
        assert_eq!(Field::from_str("defaultudpholepunch").unwrap(), Field::DefaultUdpHolePunch);
        assert!(Field::from_str("netid").is_err());
    }

    #[test]
    fn every_field_has_distinct_label_key() {
        let mut keys: Vec<_> = Field::iter().map(Field::label_key).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), Field::iter().count());
    }

    #[test]
    fn switch_input_spellings() {
        for yes in ["true", "YES", "on", "1", " yes "] {
            assert_eq!(parse_switch(yes), Some(true), "{yes}");
        }
        for no in ["false", "No", "off", "0"] {
            assert_eq!(parse_switch(no), Some(false), "{no}");
        }
        assert_eq!(parse_switch("maybe"), None);
        assert_eq!(parse_switch(""), None);
    }
}
