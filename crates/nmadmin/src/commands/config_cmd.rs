//! Config subcommand handlers.

use dialoguer::{Input, Select};
use secrecy::SecretString;
use tabled::Tabled;

use nmadmin_config::{Config, ConfigError, Profile};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::config::active_profile_name;
use crate::error::CliError;
use crate::output;

const REDACTED: &str = "********";

// ── Helpers ─────────────────────────────────────────────────────────

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Usage {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

/// Copy of `cfg` with plaintext master keys masked.
fn redacted(cfg: &Config) -> Config {
    let mut cfg = cfg.clone();
    for profile in cfg.profiles.values_mut() {
        if profile.master_key.is_some() {
            profile.master_key = Some(REDACTED.into());
        }
    }
    cfg
}

#[derive(Tabled)]
struct ProfileRow {
    #[tabled(rename = "")]
    active: String,
    #[tabled(rename = "Profile")]
    name: String,
    #[tabled(rename = "Server")]
    server: String,
    #[tabled(rename = "Key Source")]
    key_source: String,
}

fn key_source(profile: &Profile) -> String {
    match (&profile.master_key_env, &profile.master_key) {
        (Some(var), _) => format!("env:{var}"),
        (None, Some(_)) => "plaintext".into(),
        (None, None) => "keyring".into(),
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => init(),

        ConfigCommand::Show => {
            let cfg = redacted(&nmadmin_config::load_config()?);
            let out = match global.output {
                OutputFormat::Table | OutputFormat::Plain => {
                    toml::to_string_pretty(&cfg).map_err(ConfigError::from)?
                }
                format => output::render_single(format, &cfg, |_| String::new(), |_| String::new()),
            };
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(
                &nmadmin_config::config_path().display().to_string(),
                global.quiet,
            );
            Ok(())
        }

        ConfigCommand::Profiles => {
            let cfg = nmadmin_config::load_config()?;
            let active = active_profile_name(global, &cfg);
            let rows: Vec<ProfileRow> = cfg
                .profiles
                .iter()
                .map(|(name, p)| ProfileRow {
                    active: if *name == active { "*".into() } else { String::new() },
                    name: name.clone(),
                    server: p.server.clone(),
                    key_source: key_source(p),
                })
                .collect();
            let out = match global.output {
                OutputFormat::Table => output::render_table(&rows),
                OutputFormat::Plain => rows.iter().map(|r| r.name.clone()).collect::<Vec<_>>().join("\n"),
                format => output::render_single(
                    format,
                    &redacted(&cfg).profiles,
                    |_| String::new(),
                    |_| String::new(),
                ),
            };
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Use { name } => {
            let mut cfg = nmadmin_config::load_config()?;
            if !cfg.profiles.contains_key(&name) {
                return Err(CliError::ProfileNotFound {
                    available: cfg.profiles.keys().cloned().collect::<Vec<_>>().join(", "),
                    name,
                });
            }
            cfg.default_profile = Some(name.clone());
            nmadmin_config::save_config(&cfg)?;
            if !global.quiet {
                eprintln!("Default profile set to '{name}'");
            }
            Ok(())
        }

        ConfigCommand::SetKey { name } => {
            let cfg = nmadmin_config::load_config()?;
            let name = name.unwrap_or_else(|| active_profile_name(global, &cfg));
            let key = rpassword::prompt_password(format!("Master key for '{name}': "))
                .map_err(prompt_err)?;
            if key.is_empty() {
                return Err(CliError::Usage {
                    field: "master_key".into(),
                    reason: "master key cannot be empty".into(),
                });
            }
            nmadmin_config::store_master_key(&name, &SecretString::from(key))?;
            if !global.quiet {
                eprintln!("Master key for '{name}' stored in system keyring");
            }
            Ok(())
        }
    }
}

// ── Init: interactive wizard ────────────────────────────────────────

fn init() -> Result<(), CliError> {
    let config_path = nmadmin_config::config_path();
    eprintln!("nmadmin configuration wizard");
    eprintln!("   Config path: {}\n", config_path.display());

    let profile_name: String = Input::new()
        .with_prompt("Profile name")
        .default("default".into())
        .interact_text()
        .map_err(prompt_err)?;

    let server: String = Input::new()
        .with_prompt("Server URL")
        .default("http://localhost:8081".into())
        .validate_with(|input: &String| {
            nmadmin_config::parse_server_url(input)
                .map(|_| ())
                .map_err(|e| e.to_string())
        })
        .interact_text()
        .map_err(prompt_err)?;

    let store_choices = &[
        "Store in system keyring (recommended)",
        "Read from an environment variable",
        "Save to config file (plaintext)",
    ];
    let store_selection = Select::new()
        .with_prompt("Where should the master key come from?")
        .items(store_choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    let mut profile = Profile {
        server,
        ..Profile::default()
    };

    match store_selection {
        0 | 2 => {
            let key = rpassword::prompt_password("Master key: ").map_err(prompt_err)?;
            if key.is_empty() {
                return Err(CliError::Usage {
                    field: "master_key".into(),
                    reason: "master key cannot be empty".into(),
                });
            }
            if store_selection == 0 {
                nmadmin_config::store_master_key(&profile_name, &SecretString::from(key))?;
                eprintln!("   Master key stored in system keyring");
            } else {
                profile.master_key = Some(key);
            }
        }
        _ => {
            let var: String = Input::new()
                .with_prompt("Environment variable name")
                .default("NMADMIN_MASTER_KEY".into())
                .interact_text()
                .map_err(prompt_err)?;
            profile.master_key_env = Some(var);
        }
    }

    let mut cfg = nmadmin_config::load_config_or_default();
    if cfg.profiles.is_empty() || cfg.default_profile.is_none() {
        cfg.default_profile = Some(profile_name.clone());
    }
    cfg.profiles.insert(profile_name.clone(), profile);

    let path = nmadmin_config::save_config(&cfg)?;
    eprintln!("\n   Profile '{profile_name}' saved to {}", path.display());
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn redaction_masks_only_plaintext_keys() {
        let mut cfg = Config::default();
        cfg.profiles.insert(
            "lab".into(),
            Profile {
                server: "https://nm.lab".into(),
                master_key: Some("hunter2".into()),
                ..Profile::default()
            },
        );
        cfg.profiles.insert(
            "prod".into(),
            Profile {
                server: "https://nm.prod".into(),
                master_key_env: Some("PROD_KEY".into()),
                ..Profile::default()
            },
        );

        let out = redacted(&cfg);
        assert_eq!(out.profiles["lab"].master_key.as_deref(), Some(REDACTED));
        assert_eq!(out.profiles["prod"].master_key, None);
        assert_eq!(key_source(&out.profiles["prod"]), "env:PROD_KEY");
        assert_eq!(key_source(&cfg.profiles["lab"]), "plaintext");
    }
}
