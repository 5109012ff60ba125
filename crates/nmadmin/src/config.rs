//! Translation of profiles + global flags into `nmadmin_core::ControllerConfig`.
//!
//! Core never sees these types; it receives a pre-built `ControllerConfig`.

use std::time::Duration;

use secrecy::SecretString;

use nmadmin_config::{Config, ConfigError, Defaults, Profile};
use nmadmin_core::{ControllerConfig, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Build a `ControllerConfig` from the config file, profile, and CLI overrides.
pub fn build_controller_config(global: &GlobalOpts) -> Result<ControllerConfig, CliError> {
    let cfg = nmadmin_config::load_config()?;
    resolve(global, &cfg)
}

/// Flags override profile values. With `--server` and `--master-key` no
/// profile is needed at all.
pub fn resolve(global: &GlobalOpts, cfg: &Config) -> Result<ControllerConfig, CliError> {
    let profile = match cfg.profile(global.profile.as_deref()) {
        Ok((name, profile)) => Some((name, profile)),
        Err(ConfigError::UnknownProfile { .. })
            if global.profile.is_none() && global.server.is_some() =>
        {
            None
        }
        Err(ConfigError::UnknownProfile { name }) => {
            return Err(CliError::ProfileNotFound {
                name,
                available: available_profiles(cfg),
            });
        }
        Err(e) => return Err(e.into()),
    };

    let mut controller = match (profile, global.master_key.as_deref()) {
        (Some((name, profile)), None) => {
            nmadmin_config::profile_to_controller_config(profile, name, &cfg.defaults)?
        }
        (profile, Some(key)) => {
            let raw = global
                .server
                .as_deref()
                .or_else(|| profile.map(|(_, p)| p.server.as_str()))
                .ok_or_else(|| CliError::Usage {
                    field: "server".into(),
                    reason: "no server URL given (use --server or a profile)".into(),
                })?;
            let url = nmadmin_config::parse_server_url(raw)?;
            let mut controller = ControllerConfig::new(url, SecretString::from(key.to_owned()));
            apply_profile(&mut controller, profile.map(|(_, p)| p), &cfg.defaults);
            controller
        }
        (None, None) => {
            return Err(CliError::NoCredentials {
                profile: active_profile_name(global, cfg),
            });
        }
    };

    if let Some(ref server) = global.server {
        controller.url = nmadmin_config::parse_server_url(server)?;
    }
    if global.insecure {
        controller.tls = TlsVerification::DangerAcceptInvalid;
    }
    if let Some(secs) = global.timeout {
        controller.timeout = Duration::from_secs(secs);
    }
    Ok(controller)
}

fn apply_profile(controller: &mut ControllerConfig, profile: Option<&Profile>, defaults: &Defaults) {
    let insecure = profile.and_then(|p| p.insecure).unwrap_or(defaults.insecure);
    controller.tls = if insecure {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ca) = profile.and_then(|p| p.ca_cert.clone()) {
        TlsVerification::CustomCa(ca)
    } else {
        TlsVerification::SystemDefaults
    };
    controller.timeout =
        Duration::from_secs(profile.and_then(|p| p.timeout).unwrap_or(defaults.timeout));
}

fn available_profiles(cfg: &Config) -> String {
    if cfg.profiles.is_empty() {
        "(none)".into()
    } else {
        cfg.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use clap::Parser;
    use secrecy::ExposeSecret;

    use crate::cli::Cli;

    fn global(args: &[&str]) -> GlobalOpts {
        let mut argv = vec!["nmadmin"];
        argv.extend_from_slice(args);
        argv.extend_from_slice(&["networks", "list"]);
        Cli::try_parse_from(argv).unwrap().global
    }

    fn config_with_lab() -> Config {
        let mut cfg = Config::default();
        cfg.default_profile = Some("lab".into());
        cfg.profiles.insert(
            "lab".into(),
            Profile {
                server: "https://nm.lab.example".into(),
                master_key: Some("from-file".into()),
                timeout: Some(5),
                ..Profile::default()
            },
        );
        cfg
    }

    #[test]
    fn flags_override_profile() {
        let cfg = config_with_lab();
        let g = global(&[
            "--server",
            "http://127.0.0.1:8081",
            "--master-key",
            "from-flag",
            "--timeout",
            "9",
            "-k",
        ]);

        let cc = resolve(&g, &cfg).unwrap();
        assert_eq!(cc.url.as_str(), "http://127.0.0.1:8081/");
        assert_eq!(cc.master_key.expose_secret(), "from-flag");
        assert_eq!(cc.timeout, Duration::from_secs(9));
        assert_eq!(cc.tls, TlsVerification::DangerAcceptInvalid);
    }

    #[test]
    fn key_flag_keeps_profile_server_and_timeout() {
        let cfg = config_with_lab();
        let g = global(&["--master-key", "k"]);

        let cc = resolve(&g, &cfg).unwrap();
        assert_eq!(cc.url.as_str(), "https://nm.lab.example/");
        assert_eq!(cc.timeout, Duration::from_secs(5));
        assert_eq!(cc.tls, TlsVerification::SystemDefaults);
    }

    #[test]
    fn server_and_key_flags_need_no_profile() {
        let g = global(&["--server", "https://nm.example", "--master-key", "k"]);
        let cc = resolve(&g, &Config::default()).unwrap();
        assert_eq!(cc.url.host_str(), Some("nm.example"));
    }

    #[test]
    fn unknown_profile_lists_available() {
        let cfg = config_with_lab();
        let g = global(&["--profile", "prod", "--master-key", "k"]);

        let err = resolve(&g, &cfg).unwrap_err();
        assert!(
            matches!(err, CliError::ProfileNotFound { ref name, ref available } if name == "prod" && available == "lab")
        );
    }

    #[test]
    fn server_without_key_is_no_credentials() {
        let g = global(&["--server", "https://nm.example"]);
        let err = resolve(&g, &Config::default()).unwrap_err();
        assert!(matches!(err, CliError::NoCredentials { .. }));
    }
}
