// nmadmin-core: Domain model, validation and reactive data layer between
// nmadmin-api and the CLI.

pub mod command;
pub mod config;
pub mod controller;
pub mod convert;
pub mod editor;
pub mod error;
pub mod gateways;
pub mod model;
pub mod store;
pub mod stream;
pub mod validate;

// ── Primary re-exports ──────────────────────────────────────────────
pub use command::{Command, CommandResult, PendingUpdate, UpdateSink};
pub use config::{ControllerConfig, TlsVerification};
pub use controller::{ConnectionState, Controller};
pub use editor::{
    EditError, EditorState, EditorView, Field, FieldAccess, FieldKind, FieldValue, FieldView,
    FormView, NetworkConfigEditor, NetworkDraft, SubmitError,
};
pub use error::CoreError;
pub use gateways::{GatewayOverview, filter_ingress_gateways};
pub use model::{
    ClientConfigFormat, ExtClientUpdate, ExternalClient, Network, NetworkPayload, Node, ServerConfig,
};
pub use store::{DataStore, Snapshot, Store};
pub use stream::Subscription;
pub use validate::{
    EnglishMessages, FieldError, FieldErrors, Messages, ValidationErrorKind,
    validate_address_range, validate_address_range6, validate_network,
};
