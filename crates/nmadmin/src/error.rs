//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError`, `ConfigError` and editor failures into user-facing
//! errors with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use nmadmin_config::ConfigError;
use nmadmin_core::{CoreError, EditError, SubmitError};

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
    pub const VALIDATION: i32 = 9;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to server at {url}")]
    #[diagnostic(
        code(nmadmin::connection_failed),
        help(
            "Check that the server is running and reachable.\n\
             URL: {url}\n\
             Self-signed certificate? Try --insecure (-k) or set ca_cert in your profile."
        )
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Request timed out")]
    #[diagnostic(
        code(nmadmin::timeout),
        help("Increase timeout with --timeout or check server responsiveness.")
    )]
    Timeout,

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(nmadmin::auth_failed),
        help(
            "Verify the server's master key.\n\
             Run: nmadmin config set-key <profile>"
        )
    )]
    AuthFailed { message: String },

    #[error("No master key configured for profile '{profile}'")]
    #[diagnostic(
        code(nmadmin::no_credentials),
        help(
            "Configure one with: nmadmin config init\n\
             Or set the NMADMIN_MASTER_KEY environment variable."
        )
    )]
    NoCredentials { profile: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(nmadmin::not_found),
        help("Run: nmadmin {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── Server ───────────────────────────────────────────────────────
    #[error("Server rejected the request: {message}")]
    #[diagnostic(code(nmadmin::rejected))]
    Rejected { message: String },

    #[error("API error ({code}): {message}")]
    #[diagnostic(code(nmadmin::api_error))]
    ApiError { code: String, message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(nmadmin::usage))]
    Usage { field: String, reason: String },

    #[error("Field '{field}' cannot be changed: {reason}")]
    #[diagnostic(
        code(nmadmin::field),
        help("Run: nmadmin networks get <netid> to see which fields are editable")
    )]
    Field { field: String, reason: String },

    #[error("Network '{netid}' has {count} invalid field(s)")]
    #[diagnostic(code(nmadmin::invalid_network), help("{details}"))]
    InvalidNetwork {
        netid: String,
        count: usize,
        details: String,
    },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(nmadmin::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: nmadmin config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error(transparent)]
    #[diagnostic(code(nmadmin::config))]
    Config(ConfigError),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(nmadmin::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── Internal ─────────────────────────────────────────────────────
    #[error("Internal error: {0}")]
    #[diagnostic(code(nmadmin::internal))]
    Internal(String),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    #[diagnostic(code(nmadmin::json), help("Check the JSON file contents and try again."))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout => exit_code::TIMEOUT,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Field { .. } | Self::InvalidNetwork { .. } => exit_code::VALIDATION,
            Self::Usage { .. } | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            Self::Config(err) => match err {
                ConfigError::NoCredentials { .. } => exit_code::AUTH,
                ConfigError::Validation { .. } => exit_code::USAGE,
                _ => exit_code::GENERAL,
            },
            _ => exit_code::GENERAL,
        }
    }
}

// ── Conversions ──────────────────────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed {
                url,
                source: reason.into(),
            },

            CoreError::ControllerDisconnected => CliError::ConnectionFailed {
                url: "(disconnected)".into(),
                source: "server connection was closed".into(),
            },

            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },

            CoreError::Timeout => CliError::Timeout,

            CoreError::QueueFull => CliError::Internal("command queue is full".into()),

            CoreError::NetworkNotFound { netid } => CliError::NotFound {
                resource_type: "network".into(),
                identifier: netid,
                list_command: "networks list".into(),
            },

            CoreError::NodeNotFound { identifier } => CliError::NotFound {
                resource_type: "node".into(),
                identifier,
                list_command: "extclients list <netid>".into(),
            },

            CoreError::ExtClientNotFound { identifier } => CliError::NotFound {
                resource_type: "external client".into(),
                identifier,
                list_command: "extclients list <netid>".into(),
            },

            CoreError::NotFound { path } => CliError::NotFound {
                resource_type: "resource".into(),
                identifier: path,
                list_command: "networks list".into(),
            },

            CoreError::Rejected { message } => CliError::Rejected { message },

            CoreError::ValidationFailed { message } => CliError::Usage {
                field: "input".into(),
                reason: message,
            },

            CoreError::Api { message, status } => CliError::ApiError {
                code: status.map_or_else(|| "unknown".into(), |s| s.to_string()),
                message,
            },

            CoreError::Config { message } => CliError::Usage {
                field: "config".into(),
                reason: message,
            },

            CoreError::Internal(message) => CliError::Internal(message),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            ConfigError::Validation { field, reason } => CliError::Usage { field, reason },
            other => CliError::Config(other),
        }
    }
}

impl From<EditError> for CliError {
    fn from(err: EditError) -> Self {
        match err {
            EditError::NotFound => CliError::NotFound {
                resource_type: "network".into(),
                identifier: "(editor)".into(),
                list_command: "networks list".into(),
            },
            EditError::ReadOnly { field } => CliError::Field {
                field: field.to_string(),
                reason: "read-only for this network".into(),
            },
            EditError::NotAnInteger { field, value } => CliError::Field {
                field: field.to_string(),
                reason: format!("'{value}' is not an integer"),
            },
            EditError::NotASwitch { field, value } => CliError::Field {
                field: field.to_string(),
                reason: format!("'{value}' is not one of yes/no/on/off/true/false"),
            },
        }
    }
}

/// Convert a submit failure for `netid`.
pub fn submit_error(netid: &str, err: SubmitError) -> CliError {
    match err {
        SubmitError::NotFound => CliError::NotFound {
            resource_type: "network".into(),
            identifier: netid.into(),
            list_command: "networks list".into(),
        },
        SubmitError::Invalid(errors) => CliError::InvalidNetwork {
            netid: netid.into(),
            count: errors.len(),
            details: errors
                .iter()
                .map(|(field, e)| format!("{field}: {}", e.message))
                .collect::<Vec<_>>()
                .join("\n"),
        },
        SubmitError::Dispatch(e) => e.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nmadmin_core::Field;

    #[test]
    fn exit_codes_are_stable() {
        assert_eq!(CliError::Timeout.exit_code(), exit_code::TIMEOUT);
        assert_eq!(
            CliError::from(CoreError::AuthenticationFailed {
                message: "bad key".into()
            })
            .exit_code(),
            exit_code::AUTH
        );
        assert_eq!(
            CliError::from(CoreError::NetworkNotFound {
                netid: "ghost".into()
            })
            .exit_code(),
            exit_code::NOT_FOUND
        );
        assert_eq!(
            CliError::from(EditError::ReadOnly {
                field: Field::IsIpv4
            })
            .exit_code(),
            exit_code::VALIDATION
        );
    }

    #[test]
    fn missing_master_key_is_auth_error() {
        let err = CliError::from(ConfigError::NoCredentials {
            profile: "lab".into(),
        });
        assert!(matches!(err, CliError::NoCredentials { ref profile } if profile == "lab"));
        assert_eq!(err.exit_code(), exit_code::AUTH);
    }

    #[test]
    fn dispatch_failure_keeps_core_mapping() {
        let err = submit_error("home", SubmitError::Dispatch(CoreError::ControllerDisconnected));
        assert_eq!(err.exit_code(), exit_code::CONNECTION);
    }
}
