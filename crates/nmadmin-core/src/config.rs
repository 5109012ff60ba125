// ── Runtime connection configuration ──
//
// These types describe *how* to connect to a management server.
// They carry credential data and connection tuning, but never touch disk.
// The CLI constructs a `ControllerConfig` and hands it in.

use secrecy::SecretString;
use url::Url;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (self-signed certs).
    DangerAcceptInvalid,
}

/// Configuration for connecting to a single management server.
///
/// Built by the CLI, passed to `Controller` -- core never reads config files.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Server URL (e.g., `https://api.nm.example.com`).
    pub url: Url,
    /// Master key sent as a bearer token.
    pub master_key: SecretString,
    /// TLS verification strategy.
    pub tls: TlsVerification,
    /// Request timeout.
    pub timeout: std::time::Duration,
    /// How often to perform a full refresh (seconds). 0 = never.
    pub refresh_interval_secs: u64,
}

impl ControllerConfig {
    /// Config with defaults for everything but the URL and key.
    pub fn new(url: Url, master_key: SecretString) -> Self {
        Self {
            url,
            master_key,
            tls: TlsVerification::default(),
            timeout: std::time::Duration::from_secs(30),
            refresh_interval_secs: 0,
        }
    }
}
