// ── Editable copy of a network ──

use std::collections::BTreeMap;

use strum::IntoEnumIterator;

use super::field::{Field, FieldKind, FieldValue};
use crate::model::{Network, NetworkPayload};

/// The edit-session copy of a [`Network`].
///
/// Text fields hold strings, integer fields hold the text the user typed,
/// switches hold booleans. Fields outside [`Field`] (`netid`,
/// `displayname`, timestamps) are carried from the seed untouched.
///
/// Every [`Field`] has a value from construction on; `put` only ever
/// replaces one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkDraft {
    seed: Network,
    values: BTreeMap<Field, FieldValue>,
}

impl NetworkDraft {
    pub fn netid(&self) -> &str {
        &self.seed.netid
    }

    /// The record the draft was seeded from.
    pub fn seed(&self) -> &Network {
        &self.seed
    }

    pub fn value(&self, field: Field) -> &FieldValue {
        static EMPTY_TEXT: FieldValue = FieldValue::Text(String::new());
        static SWITCH_OFF: FieldValue = FieldValue::Switch(false);

        self.values.get(&field).unwrap_or(match field.kind() {
            FieldKind::Switch => &SWITCH_OFF,
            FieldKind::Text | FieldKind::Integer => &EMPTY_TEXT,
        })
    }

    /// Text of a text or integer field; empty for switches.
    pub fn text(&self, field: Field) -> &str {
        self.values
            .get(&field)
            .and_then(FieldValue::as_text)
            .unwrap_or_default()
    }

    /// State of a switch field; `false` for text fields.
    pub fn switch(&self, field: Field) -> bool {
        self.values
            .get(&field)
            .and_then(FieldValue::as_switch)
            .unwrap_or_default()
    }

    /// Fields whose value differs from the seed.
    pub fn changed_fields(&self) -> Vec<Field> {
        let original = Self::from(self.seed.clone());
        Field::iter()
            .filter(|f| self.values.get(f) != original.values.get(f))
            .collect()
    }

    /// Store an already-checked value. Access and typing are enforced by
    /// the editor.
    pub(crate) fn put(&mut self, field: Field, value: FieldValue) {
        self.values.insert(field, value);
    }

    /// Map the draft to the update payload.
    pub fn to_payload(&self) -> NetworkPayload {
        let s = &self.seed;
        NetworkPayload {
            netid: s.netid.clone(),
            displayname: s.displayname.clone(),
            addressrange: self.text(Field::AddressRange).to_owned(),
            addressrange6: self.text(Field::AddressRange6).to_owned(),
            localrange: self.text(Field::LocalRange).to_owned(),
            isipv4: self.switch(Field::IsIpv4),
            isipv6: self.switch(Field::IsIpv6),
            defaultinterface: self.text(Field::DefaultInterface).to_owned(),
            defaultlistenport: self.integer(Field::DefaultListenPort, s.defaultlistenport),
            defaultpostup: self.text(Field::DefaultPostUp).to_owned(),
            defaultpostdown: self.text(Field::DefaultPostDown).to_owned(),
            defaultkeepalive: self.integer(Field::DefaultKeepalive, s.defaultkeepalive),
            defaultextclientdns: self.text(Field::DefaultExtClientDns).to_owned(),
            defaultmtu: self.integer(Field::DefaultMtu, s.defaultmtu),
            allowmanualsignup: self.switch(Field::AllowManualSignup),
            defaultudpholepunch: self.switch(Field::DefaultUdpHolePunch),
            ispointtosite: self.switch(Field::IsPointToSite),
            defaultacl: self.switch(Field::DefaultAcl),
            nodeslastmodified: s.nodeslastmodified,
            networklastmodified: s.networklastmodified,
        }
    }

    // The editor only admits text that parses, so the seed value is never
    // used in practice.
    fn integer(&self, field: Field, seeded: i32) -> i32 {
        parse_integer(self.text(field)).unwrap_or(seeded)
    }
}

pub(crate) fn parse_integer(text: &str) -> Option<i32> {
    text.trim().parse().ok()
}

impl From<Network> for NetworkDraft {
    fn from(seed: Network) -> Self {
        let values = Field::iter()
            .map(|field| {
                let value = match field.kind() {
                    FieldKind::Switch => FieldValue::Switch(seed_switch(&seed, field)),
                    FieldKind::Text | FieldKind::Integer => {
                        FieldValue::Text(seed_text(&seed, field))
                    }
                };
                (field, value)
            })
            .collect();
        Self { seed, values }
    }
}

fn seed_text(n: &Network, field: Field) -> String {
    match field {
        Field::AddressRange => n.addressrange.clone(),
        Field::AddressRange6 => n.addressrange6.clone(),
        Field::LocalRange => n.localrange.clone(),
        Field::DefaultInterface => n.defaultinterface.clone(),
        Field::DefaultListenPort => n.defaultlistenport.to_string(),
        Field::DefaultPostUp => n.defaultpostup.clone(),
        Field::DefaultPostDown => n.defaultpostdown.clone(),
        Field::DefaultKeepalive => n.defaultkeepalive.to_string(),
        Field::DefaultExtClientDns => n.defaultextclientdns.clone(),
        Field::DefaultMtu => n.defaultmtu.to_string(),
        _ => String::new(),
    }
}

fn seed_switch(n: &Network, field: Field) -> bool {
    match field {
        Field::IsIpv4 => n.isipv4,
        Field::IsIpv6 => n.isipv6,
        Field::AllowManualSignup => n.allowmanualsignup,
        Field::DefaultUdpHolePunch => n.defaultudpholepunch,
        Field::IsPointToSite => n.ispointtosite,
        Field::DefaultAcl => n.defaultacl,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn network() -> Network {
        Network {
            netid: "home".into(),
            displayname: "Home".into(),
            addressrange: "10.10.10.0/24".into(),
            isipv4: true,
            defaultinterface: "nm-home".into(),
            defaultlistenport: 51821,
            defaultkeepalive: 20,
            defaultmtu: 1280,
            defaultudpholepunch: true,
            ..Network::default()
        }
    }

    #[test]
    fn seeded_draft_maps_back_to_identical_payload() {
        let draft = NetworkDraft::from(network());
        assert_eq!(draft.to_payload(), NetworkPayload::from(network()));
        assert!(draft.changed_fields().is_empty());
    }

    #[test]
    fn integers_are_held_as_text() {
        let draft = NetworkDraft::from(network());
        assert_eq!(draft.value(Field::DefaultMtu), &FieldValue::Text("1280".into()));
        assert_eq!(draft.text(Field::IsIpv4), "");
        assert!(draft.switch(Field::IsIpv4));
    }

    #[test]
    fn every_field_has_a_value_of_its_kind() {
        let draft = NetworkDraft::from(network());
        for field in Field::iter() {
            let value = draft.value(field);
            match field.kind() {
                FieldKind::Switch => assert_eq!(value.as_switch(), Some(draft.switch(field))),
                FieldKind::Text | FieldKind::Integer => {
                    assert_eq!(value.as_text(), Some(draft.text(field)));
                }
            }
        }
        assert_eq!(draft.value(Field::AddressRange).to_string(), "10.10.10.0/24");
        assert_eq!(draft.value(Field::DefaultUdpHolePunch).to_string(), "yes");
    }

    #[test]
    fn edited_integer_text_is_coerced() {
        let mut draft = NetworkDraft::from(network());
        draft.put(Field::DefaultMtu, FieldValue::Text(" 1420 ".into()));
        draft.put(Field::DefaultAcl, FieldValue::Switch(true));

        let payload = draft.to_payload();
        assert_eq!(payload.defaultmtu, 1420);
        assert!(payload.defaultacl);
        assert_eq!(payload.displayname, "Home");
        assert_eq!(draft.changed_fields(), vec![Field::DefaultMtu, Field::DefaultAcl]);
    }
}
