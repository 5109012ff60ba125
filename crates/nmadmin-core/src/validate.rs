// ── Field validation ──
//
// Validators are plain functions keyed by field. Each one sees the value
// being checked, the whole draft (for cross-field rules such as the
// address-family flags) and a message catalog for the error text.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::editor::{Field, NetworkDraft};

// ── Patterns ─────────────────────────────────────────────────────────

const OCTET: &str = r"(25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)";

static IPV4_CIDR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^{OCTET}(\.{OCTET}){{3}}/(3[0-2]|[12]?\d)$"))
        .unwrap_or_else(|e| unreachable!("invalid IPv4 CIDR pattern: {e}"))
});

static IPV6_CIDR: LazyLock<Regex> = LazyLock::new(|| {
    const H: &str = "[0-9a-fA-F]{1,4}";
    let addr = [
        format!("({H}:){{7}}{H}"),
        format!("({H}:){{1,7}}:"),
        format!("({H}:){{1,6}}:{H}"),
        format!("({H}:){{1,5}}(:{H}){{1,2}}"),
        format!("({H}:){{1,4}}(:{H}){{1,3}}"),
        format!("({H}:){{1,3}}(:{H}){{1,4}}"),
        format!("({H}:){{1,2}}(:{H}){{1,5}}"),
        format!("{H}:((:{H}){{1,6}})"),
        format!(":((:{H}){{1,7}}|:)"),
    ]
    .join("|");
    Regex::new(&format!(r"^(?:{addr})/(12[0-8]|1[01]\d|[1-9]?\d)$"))
        .unwrap_or_else(|e| unreachable!("invalid IPv6 CIDR pattern: {e}"))
});

/// `true` when `value` is a dotted-quad IPv4 address with a `/0`..`/32` prefix.
pub fn is_ipv4_cidr(value: &str) -> bool {
    IPV4_CIDR.is_match(value)
}

/// `true` when `value` is an IPv6 address (with optional `::` compression)
/// and a `/0`..`/128` prefix.
pub fn is_ipv6_cidr(value: &str) -> bool {
    IPV6_CIDR.is_match(value)
}

// ── Error types ──────────────────────────────────────────────────────

/// Classification of a field error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationErrorKind {
    /// The content fails the field's format constraint.
    Value,
}

/// A single field-level failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub kind: ValidationErrorKind,
    /// Message key, e.g. `network.validation.ipv4`.
    pub key: &'static str,
    /// Resolved text for `key`.
    pub message: String,
}

impl FieldError {
    fn value(key: &'static str, messages: &dyn Messages) -> Self {
        Self {
            kind: ValidationErrorKind::Value,
            key,
            message: messages.text(key).into_owned(),
        }
    }
}

/// Field errors from one validation run. Empty means valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<Field, FieldError>);

impl FieldErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, field: Field) -> Option<&FieldError> {
        self.0.get(&field)
    }

    pub fn contains(&self, field: Field) -> bool {
        self.0.contains_key(&field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &FieldError)> {
        self.0.iter().map(|(f, e)| (*f, e))
    }

    pub fn insert(&mut self, field: Field, error: FieldError) {
        self.0.insert(field, error);
    }
}

impl<'a> IntoIterator for &'a FieldErrors {
    type Item = (&'a Field, &'a FieldError);
    type IntoIter = std::collections::btree_map::Iter<'a, Field, FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

// ── Message catalog ──────────────────────────────────────────────────

/// Resolves message keys to display text.
pub trait Messages: Send + Sync {
    fn lookup(&self, key: &str) -> Option<Cow<'_, str>>;

    /// Text for `key`, or the key itself when the catalog has no entry.
    fn text<'a>(&'a self, key: &'a str) -> Cow<'a, str> {
        self.lookup(key).unwrap_or(Cow::Borrowed(key))
    }
}

/// Built-in English catalog.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnglishMessages;

const ENGLISH: &[(&str, &str)] = &[
    ("network.details", "Network details"),
    ("network.validation.ipv4", "Invalid IPv4 CIDR, expected e.g. 10.10.10.0/24"),
    ("network.validation.ipv6", "Invalid IPv6 CIDR, expected e.g. fd00::/64"),
    ("network.addressrange", "Address Range"),
    ("network.addressrange6", "Address Range (IPv6)"),
    ("network.localrange", "Local Range"),
    ("network.defaultinterface", "Default Interface"),
    ("network.defaultlistenport", "Default Listen Port"),
    ("network.defaultpostup", "Default PostUp"),
    ("network.defaultpostdown", "Default PostDown"),
    ("network.defaultkeepalive", "Default Keepalive"),
    ("network.defaultextclientdns", "Default Ext Client DNS"),
    ("network.defaultmtu", "Default MTU"),
    ("network.isipv4", "IPv4"),
    ("network.isipv6", "IPv6"),
    ("network.allowmanualsignup", "Allow Node Signup Without Keys"),
    ("network.defaultudpholepunch", "UDP Hole Punching"),
    ("network.ispointtosite", "Point to Site"),
    ("network.defaultacl", "Default Access Control"),
    ("helper.whatisipv4", "IPv4 address pool of the network, in CIDR notation"),
    ("helper.whatisipv6", "IPv6 address pool of the network, in CIDR notation"),
    ("helper.localrange", "Local network range used for node endpoint discovery"),
    ("helper.defaultinterface", "WireGuard interface name on new nodes"),
    ("helper.defaultlistenport", "WireGuard listen port on new nodes"),
    ("helper.defaultpostup", "Command run after the interface comes up (requires RCE)"),
    ("helper.defaultpostdown", "Command run after the interface goes down (requires RCE)"),
    ("helper.keepalive", "Persistent keepalive interval in seconds"),
    ("helper.extclient", "DNS server handed to external clients"),
    ("helper.mtu", "Interface MTU on new nodes"),
    ("helper.ipv4", "Network uses IPv4 addressing (fixed at creation)"),
    ("helper.ipv6", "Network uses IPv6 addressing (fixed at creation)"),
    ("helper.nokeysignup", "Nodes may join without an access key, pending approval"),
    ("helper.udpholepunching", "Use UDP hole punching for NAT traversal"),
    ("helper.pointtosite", "Route all traffic through the network's gateways"),
    ("helper.defaultaccesscontrol", "Allow node-to-node traffic by default"),
    ("error.notfound", "Not found"),
    ("ingress.none", "No ingress gateways in this network"),
    ("ingress.gateways", "Ingress Gateways"),
    ("extclient.extclients", "External Clients"),
];

impl Messages for EnglishMessages {
    fn lookup(&self, key: &str) -> Option<Cow<'_, str>> {
        ENGLISH
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| Cow::Borrowed(*v))
    }
}

// ── Validators ───────────────────────────────────────────────────────

/// Check `value` as the IPv4 address range. Skipped when `isipv4` is false.
pub fn validate_address_range(
    value: &str,
    isipv4: bool,
    messages: &dyn Messages,
) -> Option<FieldError> {
    if !isipv4 || is_ipv4_cidr(value) {
        return None;
    }
    Some(FieldError::value("network.validation.ipv4", messages))
}

/// Check `value` as the IPv6 address range. Skipped when `isipv6` is false.
pub fn validate_address_range6(
    value: &str,
    isipv6: bool,
    messages: &dyn Messages,
) -> Option<FieldError> {
    if !isipv6 || is_ipv6_cidr(value) {
        return None;
    }
    Some(FieldError::value("network.validation.ipv6", messages))
}

type Validator = fn(&str, &NetworkDraft, &dyn Messages) -> Option<FieldError>;

fn address_range(value: &str, draft: &NetworkDraft, messages: &dyn Messages) -> Option<FieldError> {
    validate_address_range(value, draft.switch(Field::IsIpv4), messages)
}

fn address_range6(value: &str, draft: &NetworkDraft, messages: &dyn Messages) -> Option<FieldError> {
    validate_address_range6(value, draft.switch(Field::IsIpv6), messages)
}

/// Fields with a validator. Anything not listed is accepted as-is.
const NETWORK_VALIDATORS: &[(Field, Validator)] = &[
    (Field::AddressRange, address_range),
    (Field::AddressRange6, address_range6),
];

/// Run every network validator against the draft.
pub fn validate_network(draft: &NetworkDraft, messages: &dyn Messages) -> FieldErrors {
    let mut errors = FieldErrors::default();
    for (field, check) in NETWORK_VALIDATORS {
        if let Some(err) = check(draft.text(*field), draft, messages) {
            errors.insert(*field, err);
        }
    }
    errors
}
