//! Configuration for the nmadmin CLI.
//!
//! TOML profiles, master key resolution (env + keyring + plaintext),
//! and translation to `nmadmin_core::ControllerConfig`. The CLI layers
//! its flag overrides on top.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use nmadmin_core::{ControllerConfig, TlsVerification};

/// Keyring service name; entries are `{profile}/master-key`.
pub const KEYRING_SERVICE: &str = "nmadmin";

/// Environment variable that overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "NMADMIN_CONFIG";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found")]
    UnknownProfile { name: String },

    #[error("no master key configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when none is named.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named server profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub insecure: bool,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            insecure: false,
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}

/// A named server profile.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Server API base URL (e.g., "https://api.nm.example.com").
    pub server: String,

    /// Master key (plaintext -- prefer keyring or env var).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub master_key: Option<String>,

    /// Environment variable name containing the master key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub master_key_env: Option<String>,

    /// Path to custom CA certificate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insecure: Option<bool>,

    /// Override timeout (seconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

impl Config {
    /// Look up `name`, or the default profile when `name` is `None`.
    pub fn profile<'a>(&'a self, name: Option<&'a str>) -> Result<(&'a str, &'a Profile), ConfigError> {
        let name = name
            .or(self.default_profile.as_deref())
            .unwrap_or("default");
        self.profiles
            .get(name)
            .map(|p| (name, p))
            .ok_or_else(|| ConfigError::UnknownProfile { name: name.into() })
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path: `$NMADMIN_CONFIG`, else the platform
/// config directory.
pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
        return PathBuf::from(path);
    }
    ProjectDirs::from("io", "nmadmin", "nmadmin").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("nmadmin");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from `path`, layered over defaults and under `NMADMIN_*`
/// environment variables (`__` separates nested keys).
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    debug!(path = %path.display(), "loading config");
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("NMADMIN_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution (without CLI flags) ───────────────────────

fn keyring_account(profile_name: &str) -> String {
    format!("{profile_name}/master-key")
}

/// Resolve the master key: env var named by the profile, then the
/// system keyring, then plaintext.
pub fn resolve_master_key(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    resolve_master_key_with(
        profile,
        profile_name,
        |var| std::env::var(var).ok(),
        |account| {
            keyring::Entry::new(KEYRING_SERVICE, account)
                .and_then(|entry| entry.get_password())
                .ok()
        },
    )
}

fn resolve_master_key_with(
    profile: &Profile,
    profile_name: &str,
    env: impl Fn(&str) -> Option<String>,
    keyring: impl Fn(&str) -> Option<String>,
) -> Result<SecretString, ConfigError> {
    // 1. Profile's master_key_env → env var lookup
    if let Some(val) = profile.master_key_env.as_deref().and_then(&env) {
        return Ok(SecretString::from(val));
    }

    // 2. System keyring
    if let Some(secret) = keyring(&keyring_account(profile_name)) {
        return Ok(SecretString::from(secret));
    }

    // 3. Plaintext in config
    if let Some(ref key) = profile.master_key {
        return Ok(SecretString::from(key.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Store a master key in the system keyring for `profile_name`.
pub fn store_master_key(profile_name: &str, key: &SecretString) -> Result<(), ConfigError> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, &keyring_account(profile_name))?;
    entry.set_password(key.expose_secret())?;
    Ok(())
}

/// Parse and check a server URL.
pub fn parse_server_url(raw: &str) -> Result<url::Url, ConfigError> {
    let url: url::Url = raw.parse().map_err(|e| ConfigError::Validation {
        field: "server".into(),
        reason: format!("invalid URL '{raw}': {e}"),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Validation {
            field: "server".into(),
            reason: format!("expected an http(s) URL, got '{raw}'"),
        });
    }
    Ok(url)
}

/// Build a `ControllerConfig` from a profile and global defaults.
pub fn profile_to_controller_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<ControllerConfig, ConfigError> {
    let url = parse_server_url(&profile.server)?;
    let master_key = resolve_master_key(profile, profile_name)?;

    Ok(ControllerConfig {
        url,
        master_key,
        tls: tls_for(profile, defaults),
        timeout: Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout)),
        refresh_interval_secs: 0,
    })
}

fn tls_for(profile: &Profile, defaults: &Defaults) -> TlsVerification {
    if profile.insecure.unwrap_or(defaults.insecure) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = r#"
default_profile = "lab"

[defaults]
output = "json"
timeout = 10

[profiles.lab]
server = "https://api.lab.example.com"
master_key_env = "LAB_MASTER_KEY"
insecure = true

[profiles.prod]
server = "https://api.example.com"
master_key = "plain"
ca_cert = "/etc/ssl/nm-ca.pem"
"#;

    fn sample() -> Config {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, SAMPLE).unwrap();
        load_config_from(&path).unwrap()
    }

    #[test]
    fn loads_profiles_and_defaults() {
        let cfg = sample();
        assert_eq!(cfg.default_profile.as_deref(), Some("lab"));
        assert_eq!(cfg.defaults.output, "json");
        assert_eq!(cfg.defaults.color, "auto");
        assert_eq!(cfg.defaults.timeout, 10);
        assert_eq!(cfg.profiles.len(), 2);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn profile_lookup_uses_default_name() {
        let cfg = sample();
        let (name, profile) = cfg.profile(None).unwrap();
        assert_eq!(name, "lab");
        assert_eq!(profile.insecure, Some(true));

        assert!(matches!(
            cfg.profile(Some("nope")),
            Err(ConfigError::UnknownProfile { .. })
        ));
    }

    #[test]
    fn master_key_resolution_order() {
        let profile = Profile {
            server: "https://x".into(),
            master_key: Some("plain".into()),
            master_key_env: Some("KEY_VAR".into()),
            ..Profile::default()
        };

        let key = resolve_master_key_with(
            &profile,
            "p",
            |v| (v == "KEY_VAR").then(|| "from-env".to_string()),
            |_| Some("from-keyring".into()),
        )
        .unwrap();
        assert_eq!(key.expose_secret(), "from-env");

        let key = resolve_master_key_with(&profile, "p", |_| None, |a| {
            (a == "p/master-key").then(|| "from-keyring".to_string())
        })
        .unwrap();
        assert_eq!(key.expose_secret(), "from-keyring");

        let key = resolve_master_key_with(&profile, "p", |_| None, |_| None).unwrap();
        assert_eq!(key.expose_secret(), "plain");

        let bare = Profile::default();
        assert!(matches!(
            resolve_master_key_with(&bare, "p", |_| None, |_| None),
            Err(ConfigError::NoCredentials { .. })
        ));
    }

    #[test]
    fn tls_mode_follows_profile() {
        let cfg = sample();
        let lab = &cfg.profiles["lab"];
        let prod = &cfg.profiles["prod"];
        assert_eq!(tls_for(lab, &cfg.defaults), TlsVerification::DangerAcceptInvalid);
        assert_eq!(
            tls_for(prod, &cfg.defaults),
            TlsVerification::CustomCa(PathBuf::from("/etc/ssl/nm-ca.pem"))
        );
        assert_eq!(
            tls_for(&Profile::default(), &Defaults::default()),
            TlsVerification::SystemDefaults
        );
    }

    #[test]
    fn server_url_must_be_http() {
        assert!(parse_server_url("https://api.example.com").is_ok());
        assert!(parse_server_url("ftp://api.example.com").is_err());
        assert!(parse_server_url("not a url").is_err());
    }

    #[test]
    fn save_then_load_preserves_profiles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let cfg = sample();

        save_config_to(&cfg, &path).unwrap();
        assert_eq!(load_config_from(&path).unwrap(), cfg);
    }
}
