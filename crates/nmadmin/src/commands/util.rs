//! Shared helpers for command handlers.

use std::future::Future;
use std::io::IsTerminal;
use std::path::Path;
use std::str::FromStr;

use strum::IntoEnumIterator;

use nmadmin_api::ApiNetwork;
use nmadmin_core::{Controller, Field, Network, NetworkConfigEditor};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Connect, run `f`, disconnect. Errors from `f` win over disconnect.
pub async fn with_controller<F, Fut, T>(global: &GlobalOpts, f: F) -> Result<T, CliError>
where
    F: FnOnce(Controller) -> Fut,
    Fut: Future<Output = Result<T, CliError>>,
{
    let config = crate::config::build_controller_config(global)?;
    let controller = Controller::new(config);
    controller.connect().await?;

    let result = f(controller.clone()).await;
    controller.disconnect().await;
    result
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, action: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: action.into(),
        });
    }
    dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))
}

/// Read a network record in the server's JSON format.
pub fn read_network_file(path: &Path) -> Result<Network, CliError> {
    let contents = std::fs::read_to_string(path)?;
    let api: ApiNetwork = serde_json::from_str(&contents)?;
    Ok(Network::from(api))
}

/// Split `field=value`. The value may itself contain `=`.
pub fn parse_assignment(raw: &str) -> Result<(Field, &str), CliError> {
    let Some((key, value)) = raw.split_once('=') else {
        return Err(CliError::Usage {
            field: "set".into(),
            reason: format!("expected FIELD=VALUE, got '{raw}'"),
        });
    };
    let key = key.trim().to_ascii_lowercase();
    let field = Field::from_str(&key).map_err(|_| CliError::Usage {
        field: key.clone(),
        reason: format!(
            "unknown field; expected one of: {}",
            Field::iter().map(|f| f.to_string()).collect::<Vec<_>>().join(", ")
        ),
    })?;
    Ok((field, value))
}

/// Apply every `--set` to the editor, stopping at the first rejection.
pub fn apply_assignments(editor: &mut NetworkConfigEditor, sets: &[String]) -> Result<(), CliError> {
    for raw in sets {
        let (field, value) = parse_assignment(raw)?;
        editor.set_field(field, value)?;
    }
    Ok(())
}
