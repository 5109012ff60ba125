// ── Network configuration editor ──
//
// An edit session over one network record. Edits stay local until
// `submit`, which validates the draft and hands exactly one
// `Command::UpdateNetwork` to an `UpdateSink`. Submission does not change
// the session's state; the caller decides whether to await the returned
// handle or let it run detached.

mod draft;
mod field;

use std::sync::Arc;

use serde::Serialize;
use strum::IntoEnumIterator;
use thiserror::Error;
use tracing::debug;

pub use draft::NetworkDraft;
pub use field::{Field, FieldAccess, FieldKind, FieldValue, parse_switch};

use crate::command::{Command, PendingUpdate, UpdateSink};
use crate::error::CoreError;
use crate::model::{Network, ServerConfig};
use crate::validate::{EnglishMessages, FieldError, FieldErrors, Messages, validate_network};

// ── Errors ───────────────────────────────────────────────────────────

/// A rejected `set_field`. The draft is left unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("no network loaded")]
    NotFound,

    #[error("{field} is read-only")]
    ReadOnly { field: Field },

    #[error("{field} expects an integer, got '{value}'")]
    NotAnInteger { field: Field, value: String },

    #[error("{field} expects yes/no, got '{value}'")]
    NotASwitch { field: Field, value: String },
}

/// Why a submission did not dispatch anything, or failed to.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("no network loaded")]
    NotFound,

    #[error("{} field(s) failed validation", .0.len())]
    Invalid(FieldErrors),

    #[error(transparent)]
    Dispatch(#[from] CoreError),
}

// ── State ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorState {
    /// No record available; renders as not-found.
    Unloaded,
    Editing(NetworkDraft),
}

// ── View model ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum EditorView {
    NotFound { message: String },
    Form(FormView),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormView {
    pub netid: String,
    /// e.g. `Network details : home`
    pub title: String,
    pub fields: Vec<FieldView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldView {
    pub field: Field,
    pub label: String,
    pub help: String,
    pub kind: FieldKind,
    pub value: FieldValue,
    pub access: FieldAccess,
    pub error: Option<FieldError>,
}

// ── Editor ───────────────────────────────────────────────────────────

pub struct NetworkConfigEditor {
    state: EditorState,
    server: ServerConfig,
    errors: FieldErrors,
    messages: Arc<dyn Messages>,
}

impl NetworkConfigEditor {
    pub fn new(network: Option<Network>, server: &ServerConfig) -> Self {
        Self {
            state: network.map_or(EditorState::Unloaded, |n| {
                EditorState::Editing(NetworkDraft::from(n))
            }),
            server: server.clone(),
            errors: FieldErrors::default(),
            messages: Arc::new(EnglishMessages),
        }
    }

    /// Use a different message catalog for labels and error text.
    pub fn with_messages(mut self, messages: Arc<dyn Messages>) -> Self {
        self.messages = messages;
        self
    }

    /// Seed the draft once a record becomes available.
    ///
    /// Only acts on an unloaded editor; an active session keeps its local
    /// edits. Returns `true` if the editor transitioned.
    pub fn load(&mut self, network: Network) -> bool {
        if matches!(self.state, EditorState::Editing(_)) {
            return false;
        }
        debug!(netid = %network.netid, "editor loaded");
        self.state = EditorState::Editing(NetworkDraft::from(network));
        true
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn draft(&self) -> Option<&NetworkDraft> {
        match &self.state {
            EditorState::Editing(d) => Some(d),
            EditorState::Unloaded => None,
        }
    }

    pub fn server_config(&self) -> &ServerConfig {
        &self.server
    }

    /// Errors from the last submission attempt.
    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    /// Whether `field` may currently be edited.
    pub fn access(&self, field: Field) -> FieldAccess {
        match self.draft() {
            Some(draft) => field_access(field, draft, &self.server),
            None => FieldAccess::ReadOnly,
        }
    }

    /// Change one field from user input.
    pub fn set_field(&mut self, field: Field, input: &str) -> Result<(), EditError> {
        let access = self.access(field);
        let EditorState::Editing(draft) = &mut self.state else {
            return Err(EditError::NotFound);
        };
        if !access.is_editable() {
            return Err(EditError::ReadOnly { field });
        }

        let value = match field.kind() {
            FieldKind::Text => FieldValue::Text(input.to_owned()),
            FieldKind::Integer => {
                if draft::parse_integer(input).is_none() {
                    return Err(EditError::NotAnInteger {
                        field,
                        value: input.to_owned(),
                    });
                }
                FieldValue::Text(input.to_owned())
            }
            FieldKind::Switch => {
                FieldValue::Switch(parse_switch(input).ok_or_else(|| EditError::NotASwitch {
                    field,
                    value: input.to_owned(),
                })?)
            }
        };
        draft.put(field, value);
        Ok(())
    }

    /// Run the validators without submitting.
    pub fn validate(&self) -> FieldErrors {
        self.draft()
            .map(|d| validate_network(d, self.messages.as_ref()))
            .unwrap_or_default()
    }

    /// Validate and dispatch the update.
    ///
    /// Nothing is dispatched when the editor is unloaded or the draft is
    /// invalid. On failure the field errors are kept for [`view`](Self::view).
    pub fn submit<S: UpdateSink + ?Sized>(&mut self, sink: &S) -> Result<PendingUpdate, SubmitError> {
        let EditorState::Editing(draft) = &self.state else {
            return Err(SubmitError::NotFound);
        };

        let errors = validate_network(draft, self.messages.as_ref());
        if !errors.is_empty() {
            debug!(netid = draft.netid(), errors = errors.len(), "network update rejected");
            self.errors = errors.clone();
            return Err(SubmitError::Invalid(errors));
        }

        let payload = draft.to_payload();
        let netid = payload.netid.clone();
        self.errors = FieldErrors::default();

        debug!(netid = %netid, "dispatching network update");
        Ok(sink.dispatch(Command::UpdateNetwork { netid, payload })?)
    }

    /// Abandon the session.
    pub fn cancel<F: FnOnce()>(&self, on_cancel: F) {
        on_cancel();
    }

    pub fn view(&self) -> EditorView {
        let EditorState::Editing(draft) = &self.state else {
            return EditorView::NotFound {
                message: self.messages.text("error.notfound").into_owned(),
            };
        };

        let fields = Field::iter()
            .map(|field| FieldView {
                field,
                label: self.messages.text(field.label_key()).into_owned(),
                help: self.messages.text(field.help_key()).into_owned(),
                kind: field.kind(),
                value: draft.value(field).clone(),
                access: field_access(field, draft, &self.server),
                error: self.errors.get(field).cloned(),
            })
            .collect();

        EditorView::Form(FormView {
            netid: draft.netid().to_owned(),
            title: format!(
                "{} : {}",
                self.messages.text("network.details"),
                draft.netid()
            ),
            fields,
        })
    }
}

impl std::fmt::Debug for NetworkConfigEditor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkConfigEditor")
            .field("state", &self.state)
            .field("server", &self.server)
            .field("errors", &self.errors)
            .finish_non_exhaustive()
    }
}

/// Address ranges follow their family flag, hooks follow the server's RCE
/// setting, the family flags themselves never change.
fn field_access(field: Field, draft: &NetworkDraft, server: &ServerConfig) -> FieldAccess {
    let editable = match field {
        Field::IsIpv4 | Field::IsIpv6 => false,
        Field::DefaultPostUp | Field::DefaultPostDown => server.rce,
        Field::AddressRange => draft.switch(Field::IsIpv4),
        Field::AddressRange6 => draft.switch(Field::IsIpv6),
        _ => true,
    };
    if editable {
        FieldAccess::Editable
    } else {
        FieldAccess::ReadOnly
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use crate::command::CommandResult;
    use pretty_assertions::assert_eq;

    /// Records every dispatched command and answers `Ok`.
    #[derive(Default)]
    struct RecordingSink {
        sent: Mutex<Vec<Command>>,
    }

    impl RecordingSink {
        fn sent(&self) -> Vec<Command> {
            self.sent.lock().unwrap().clone()
        }
    }

    impl UpdateSink for RecordingSink {
        fn dispatch(&self, command: Command) -> Result<PendingUpdate, CoreError> {
            self.sent.lock().unwrap().push(command);
            Ok(PendingUpdate::ready(Ok(CommandResult::Ok)))
        }
    }

    struct ClosedSink;

    impl UpdateSink for ClosedSink {
        fn dispatch(&self, _command: Command) -> Result<PendingUpdate, CoreError> {
            Err(CoreError::ControllerDisconnected)
        }
    }

    fn network() -> Network {
        Network {
            netid: "home".into(),
            addressrange: "10.10.10.0/24".into(),
            isipv4: true,
            isipv6: false,
            defaultinterface: "nm-home".into(),
            defaultlistenport: 51821,
            defaultkeepalive: 20,
            defaultmtu: 1280,
            ..Network::default()
        }
    }

    fn rce(enabled: bool) -> ServerConfig {
        ServerConfig {
            rce: enabled,
            version: None,
        }
    }

    fn editor() -> NetworkConfigEditor {
        NetworkConfigEditor::new(Some(network()), &rce(false))
    }

    // ── Not found ────────────────────────────────────────────────────

    #[test]
    fn unloaded_editor_renders_not_found_and_never_dispatches() {
        let sink = RecordingSink::default();
        let mut ed = NetworkConfigEditor::new(None, &rce(true));

        assert!(matches!(ed.view(), EditorView::NotFound { .. }));
        assert!(matches!(ed.submit(&sink), Err(SubmitError::NotFound)));
        assert_eq!(
            ed.set_field(Field::LocalRange, "x"),
            Err(EditError::NotFound)
        );
        assert!(sink.sent().is_empty());
    }

    #[test]
    fn load_transitions_once() {
        let mut ed = NetworkConfigEditor::new(None, &rce(false));
        assert!(ed.load(network()));
        ed.set_field(Field::DefaultMtu, "1400").unwrap();

        let mut other = network();
        other.defaultmtu = 9000;
        assert!(!ed.load(other));
        assert_eq!(ed.draft().unwrap().text(Field::DefaultMtu), "1400");
    }

    // ── Access rules ─────────────────────────────────────────────────

    #[tokio::test]
    async fn hooks_keep_their_seed_through_submit_without_rce() {
        let sink = RecordingSink::default();
        let mut net = network();
        net.defaultpostup = "seed-up".into();
        net.defaultpostdown = "seed-down".into();
        let mut ed = NetworkConfigEditor::new(Some(net), &rce(false));

        assert_eq!(ed.access(Field::DefaultPostUp), FieldAccess::ReadOnly);
        assert_eq!(
            ed.set_field(Field::DefaultPostUp, "evil"),
            Err(EditError::ReadOnly {
                field: Field::DefaultPostUp
            })
        );
        assert!(ed.set_field(Field::DefaultPostDown, "evil").is_err());
        ed.set_field(Field::DefaultMtu, "1400").unwrap();

        ed.submit(&sink).unwrap().wait().await.unwrap();
        let sent = sink.sent();
        assert_eq!(sent.len(), 1);
        let Command::UpdateNetwork { payload, .. } = &sent[0] else {
            panic!("expected UpdateNetwork, got {:?}", sent[0]);
        };
        assert_eq!(payload.defaultpostup, "seed-up");
        assert_eq!(payload.defaultpostdown, "seed-down");
        assert_eq!(payload.defaultmtu, 1400);
    }

    #[test]
    fn hooks_are_editable_with_rce() {
        let mut ed = NetworkConfigEditor::new(Some(network()), &rce(true));
        ed.set_field(Field::DefaultPostDown, "iptables -F").unwrap();
        assert_eq!(
            ed.draft().unwrap().to_payload().defaultpostdown,
            "iptables -F"
        );
    }

    #[test]
    fn address_family_flags_are_always_read_only() {
        let mut ed = NetworkConfigEditor::new(Some(network()), &rce(true));
        for field in [Field::IsIpv4, Field::IsIpv6] {
            assert_eq!(ed.access(field), FieldAccess::ReadOnly);
            assert_eq!(
                ed.set_field(field, "yes"),
                Err(EditError::ReadOnly { field })
            );
        }
        assert!(!ed.draft().unwrap().switch(Field::IsIpv6));
    }

    #[test]
    fn address_range_follows_its_family_flag() {
        let mut ed = editor();
        assert_eq!(ed.access(Field::AddressRange), FieldAccess::Editable);
        assert_eq!(ed.access(Field::AddressRange6), FieldAccess::ReadOnly);
        assert!(ed.set_field(Field::AddressRange6, "fd00::/64").is_err());
    }

    #[test]
    fn typed_fields_reject_bad_input() {
        let mut ed = editor();
        assert_eq!(
            ed.set_field(Field::DefaultMtu, "big"),
            Err(EditError::NotAnInteger {
                field: Field::DefaultMtu,
                value: "big".into()
            })
        );
        assert!(matches!(
            ed.set_field(Field::DefaultAcl, "perhaps"),
            Err(EditError::NotASwitch { .. })
        ));
        ed.set_field(Field::DefaultAcl, "on").unwrap();
        assert!(ed.draft().unwrap().switch(Field::DefaultAcl));
        assert_eq!(ed.draft().unwrap().text(Field::DefaultMtu), "1280");
    }

    // ── Submission ───────────────────────────────────────────────────

    #[tokio::test]
    async fn valid_submit_dispatches_exactly_one_update() {
        let sink = RecordingSink::default();
        let mut ed = editor();
        ed.set_field(Field::DefaultMtu, "1420").unwrap();
        ed.set_field(Field::AddressRange, "10.20.0.0/16").unwrap();

        let pending = ed.submit(&sink).unwrap();
        assert_eq!(pending.wait().await.unwrap(), CommandResult::Ok);

        let sent = sink.sent();
        assert_eq!(sent.len(), 1);
        let Command::UpdateNetwork { netid, payload } = &sent[0] else {
            panic!("expected UpdateNetwork, got {:?}", sent[0]);
        };
        assert_eq!(netid, "home");
        assert_eq!(payload.defaultmtu, 1420);
        assert_eq!(payload.addressrange, "10.20.0.0/16");
        assert_eq!(payload.defaultlistenport, 51821);
        assert!(ed.errors().is_empty());
    }

    #[test]
    fn invalid_submit_keeps_errors_and_dispatches_nothing() {
        let sink = RecordingSink::default();
        let mut ed = editor();
        ed.set_field(Field::AddressRange, "300.1.1.1/24").unwrap();

        let Err(SubmitError::Invalid(errors)) = ed.submit(&sink) else {
            panic!("expected validation failure");
        };
        assert_eq!(errors.len(), 1);
        assert!(errors.contains(Field::AddressRange));
        assert!(sink.sent().is_empty());

        let EditorView::Form(form) = ed.view() else {
            panic!("expected form");
        };
        let range = form
            .fields
            .iter()
            .find(|f| f.field == Field::AddressRange)
            .unwrap();
        assert_eq!(
            range.error.as_ref().map(|e| e.key),
            Some("network.validation.ipv4")
        );
        assert_eq!(range.value, FieldValue::Text("300.1.1.1/24".into()));
    }

    #[test]
    fn disabled_family_range_is_never_checked() {
        let sink = RecordingSink::default();
        let mut net = network();
        net.addressrange6 = "left over junk".into();
        let mut ed = NetworkConfigEditor::new(Some(net), &rce(false));

        ed.submit(&sink).unwrap().detach();
        let sent = sink.sent();
        assert_eq!(sent.len(), 1);
        let Command::UpdateNetwork { payload, .. } = &sent[0] else {
            panic!("expected UpdateNetwork, got {:?}", sent[0]);
        };
        assert_eq!(payload.addressrange6, "left over junk");
        assert!(!payload.isipv6);
    }

    #[test]
    fn fixing_the_draft_clears_errors() {
        let sink = RecordingSink::default();
        let mut ed = editor();
        ed.set_field(Field::AddressRange, "nope").unwrap();
        assert!(ed.submit(&sink).is_err());
        assert!(!ed.errors().is_empty());

        ed.set_field(Field::AddressRange, "10.0.0.0/8").unwrap();
        ed.submit(&sink).unwrap().detach();
        assert!(ed.errors().is_empty());
        assert_eq!(sink.sent().len(), 1);
    }

    #[test]
    fn dispatch_failure_surfaces() {
        let mut ed = editor();
        assert!(matches!(
            ed.submit(&ClosedSink),
            Err(SubmitError::Dispatch(CoreError::ControllerDisconnected))
        ));
    }

    #[test]
    fn cancel_only_runs_the_callback() {
        let ed = editor();
        let mut called = false;
        ed.cancel(|| called = true);
        assert!(called);
        assert!(matches!(ed.state(), EditorState::Editing(_)));
    }

    // ── View ─────────────────────────────────────────────────────────

    #[test]
    fn form_lists_every_field_in_order() {
        let EditorView::Form(form) = editor().view() else {
            panic!("expected form");
        };
        assert_eq!(form.title, "Network details : home");
        let order: Vec<Field> = form.fields.iter().map(|f| f.field).collect();
        assert_eq!(order, Field::iter().collect::<Vec<_>>());

        let signup = form
            .fields
            .iter()
            .find(|f| f.field == Field::AllowManualSignup)
            .unwrap();
        assert_eq!(signup.label, "Allow Node Signup Without Keys");
        assert_eq!(signup.access, FieldAccess::Editable);
    }
}
