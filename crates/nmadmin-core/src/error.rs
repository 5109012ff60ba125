// ── Core error types ──
//
// User-facing errors from nmadmin-core. These are NOT API-specific --
// consumers never see HTTP status codes or JSON parse failures directly.
// The `From<nmadmin_api::Error>` impl translates transport-layer errors
// into domain-appropriate variants.
//
// Field-level validation failures are not errors: they are returned as
// `FieldErrors` values and never travel through this type.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to server at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Controller disconnected")]
    ControllerDisconnected,

    #[error("Request timed out")]
    Timeout,

    #[error("Command queue is full")]
    QueueFull,

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Network not found: {netid}")]
    NetworkNotFound { netid: String },

    #[error("Node not found: {identifier}")]
    NodeNotFound { identifier: String },

    #[error("External client not found: {identifier}")]
    ExtClientNotFound { identifier: String },

    #[error("Entity not found: {path}")]
    NotFound { path: String },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Operation rejected by server: {message}")]
    Rejected { message: String },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<nmadmin_api::Error> for CoreError {
    fn from(err: nmadmin_api::Error) -> Self {
        match err {
            nmadmin_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            nmadmin_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            nmadmin_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            nmadmin_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            nmadmin_api::Error::NotFound { path } => CoreError::NotFound { path },
            nmadmin_api::Error::Api { status, message } if (400..500).contains(&status) => {
                CoreError::Rejected { message }
            }
            nmadmin_api::Error::Api { status, message } => CoreError::Api {
                message,
                status: Some(status),
            },
            nmadmin_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_become_rejections() {
        let err = CoreError::from(nmadmin_api::Error::Api {
            status: 400,
            message: "bad range".into(),
        });
        assert!(matches!(err, CoreError::Rejected { ref message } if message == "bad range"));
    }

    #[test]
    fn server_errors_keep_status() {
        let err = CoreError::from(nmadmin_api::Error::Api {
            status: 502,
            message: "upstream".into(),
        });
        assert!(matches!(err, CoreError::Api { status: Some(502), .. }));
    }

    #[test]
    fn bad_base_url_is_a_config_error() {
        let err = CoreError::from(nmadmin_api::Error::InvalidUrl(
            url::ParseError::RelativeUrlWithoutBase,
        ));
        assert!(matches!(err, CoreError::Config { ref message } if message.starts_with("Invalid URL")));
    }
}
