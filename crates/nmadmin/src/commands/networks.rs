//! Network command handlers.

use std::sync::Arc;

use tabled::Tabled;

use nmadmin_core::{
    CommandResult, Controller, EditorState, EditorView, FieldErrors, Network, NetworkConfigEditor,
    ServerConfig, SubmitError,
};

use crate::cli::{GlobalOpts, NetworksArgs, NetworksCommand, OutputFormat};
use crate::error::{self, CliError};
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct NetworkRow {
    #[tabled(rename = "Network")]
    netid: String,
    #[tabled(rename = "IPv4 Range")]
    ipv4: String,
    #[tabled(rename = "IPv6 Range")]
    ipv6: String,
    #[tabled(rename = "Port")]
    port: String,
    #[tabled(rename = "Interface")]
    interface: String,
    #[tabled(rename = "Modified")]
    modified: String,
}

fn or_dash(enabled: bool, value: &str) -> String {
    if enabled && !value.is_empty() { value.to_owned() } else { "-".into() }
}

impl From<&Arc<Network>> for NetworkRow {
    fn from(n: &Arc<Network>) -> Self {
        Self {
            netid: n.netid.clone(),
            ipv4: or_dash(n.isipv4, &n.addressrange),
            ipv6: or_dash(n.isipv6, &n.addressrange6),
            port: n.defaultlistenport.to_string(),
            interface: or_dash(true, &n.defaultinterface),
            modified: n
                .networklastmodified
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "-".into()),
        }
    }
}

// ── Form rendering ──────────────────────────────────────────────────

/// Render the editor's form: one line per field, read-only fields dimmed,
/// field errors underneath.
fn render_form(view: &EditorView, color: bool) -> String {
    let form = match view {
        EditorView::NotFound { message } => return message.clone(),
        EditorView::Form(form) => form,
    };

    let width = form.fields.iter().map(|f| f.label.len()).max().unwrap_or(0);
    let mut lines = vec![output::heading(&form.title, color), String::new()];

    for field in &form.fields {
        let value = field.value.to_string();
        let value = if value.is_empty() { "-".to_owned() } else { value };
        let line = format!("{:<width$}  {value}", field.label);
        if field.access.is_editable() {
            lines.push(line);
        } else {
            lines.push(output::muted(&format!("{line}  (read-only)"), color));
        }
        if let Some(ref err) = field.error {
            lines.push(output::error(&format!("{:<width$}  ! {}", "", err.message), color));
        }
    }
    lines.join("\n")
}

fn render_errors(errors: &FieldErrors, color: bool) -> String {
    errors
        .iter()
        .map(|(field, e)| output::error(&format!("{field}: {}", e.message), color))
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: NetworksArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let color = output::should_color(global.color);

    match args.command {
        NetworksCommand::List => {
            let config = crate::config::build_controller_config(global)?;
            let snap =
                Controller::oneshot(config, |c| async move { Ok(c.networks_snapshot()) }).await?;
            let out = output::render_list(
                global.output,
                snap.as_slice(),
                |n| NetworkRow::from(n),
                |n| n.netid.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        NetworksCommand::Get { netid } => {
            util::with_controller(global, |c| async move {
                let network = c.network(&netid).ok_or_else(|| not_found(&netid))?;
                let view = c.editor_for(&netid).view();
                let out = output::render_single(
                    global.output,
                    network.as_ref(),
                    |_| render_form(&view, color),
                    |n| n.netid.clone(),
                );
                output::print_output(&out, global.quiet);
                Ok(())
            })
            .await
        }

        NetworksCommand::Edit {
            netid,
            set,
            dry_run,
        } => {
            util::with_controller(global, |c| async move {
                let mut editor = c.editor_for(&netid);
                if matches!(editor.state(), EditorState::Unloaded) {
                    return Err(not_found(&netid));
                }
                util::apply_assignments(&mut editor, &set)?;

                if dry_run {
                    return show_dry_run(&editor, &netid, global, color);
                }

                let pending = editor
                    .submit(&c)
                    .map_err(|e| error::submit_error(&netid, e))?;
                match pending.wait().await? {
                    CommandResult::Network(updated) => {
                        tracing::info!(netid = %updated.netid, "network updated");
                        let view = NetworkConfigEditor::new(
                            Some(updated.clone()),
                            &c.server_config(),
                        )
                        .view();
                        let out = output::render_single(
                            global.output,
                            &updated,
                            |_| {
                                format!(
                                    "{}\n\n{}",
                                    output::success("Network updated", color),
                                    render_form(&view, color)
                                )
                            },
                            |n| n.netid.clone(),
                        );
                        output::print_output(&out, global.quiet);
                    }
                    other => tracing::debug!(result = ?other, "unexpected update result"),
                }
                Ok(())
            })
            .await
        }

        NetworksCommand::Validate {
            netid,
            from_file,
            set,
            rce,
        } => {
            if let Some(path) = from_file {
                let network = util::read_network_file(&path)?;
                let server = ServerConfig { rce, version: None };
                let mut editor = NetworkConfigEditor::new(Some(network), &server);
                util::apply_assignments(&mut editor, &set)?;
                return report_validation(&editor, global, color);
            }

            let Some(netid) = netid else {
                return Err(CliError::Usage {
                    field: "netid".into(),
                    reason: "a network ID or --from-file is required".into(),
                });
            };
            util::with_controller(global, |c| async move {
                let mut editor = c.editor_for(&netid);
                if matches!(editor.state(), EditorState::Unloaded) {
                    return Err(not_found(&netid));
                }
                util::apply_assignments(&mut editor, &set)?;
                report_validation(&editor, global, color)
            })
            .await
        }
    }
}

fn not_found(netid: &str) -> CliError {
    CliError::NotFound {
        resource_type: "network".into(),
        identifier: netid.into(),
        list_command: "networks list".into(),
    }
}

/// Print the payload that would be sent, or fail on invalid fields.
fn show_dry_run(
    editor: &NetworkConfigEditor,
    netid: &str,
    global: &GlobalOpts,
    color: bool,
) -> Result<(), CliError> {
    let errors = editor.validate();
    if !errors.is_empty() {
        return Err(error::submit_error(netid, SubmitError::Invalid(errors)));
    }
    let Some(draft) = editor.draft() else {
        return Err(not_found(netid));
    };

    let changed = draft.changed_fields();
    let payload = draft.to_payload();
    let out = output::render_single(
        global.output,
        &payload,
        |_| {
            let mut lines = vec![output::heading(
                &format!("Dry run: {} change(s) to '{netid}'", changed.len()),
                color,
            )];
            lines.extend(
                changed
                    .iter()
                    .map(|f| format!("  {f} = {}", draft.value(*f))),
            );
            lines.join("\n")
        },
        |_| {
            changed
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("\n")
        },
    );
    output::print_output(&out, global.quiet);
    Ok(())
}

/// Print the validation outcome. Invalid drafts exit non-zero in every
/// output format; structured formats still get the error map on stdout.
fn report_validation(
    editor: &NetworkConfigEditor,
    global: &GlobalOpts,
    color: bool,
) -> Result<(), CliError> {
    let errors = editor.validate();
    let netid = editor.draft().map(|d| d.netid().to_owned()).unwrap_or_default();

    match global.output {
        OutputFormat::Table | OutputFormat::Plain => {
            if errors.is_empty() {
                output::print_output(
                    &output::success(&format!("Network '{netid}' is valid"), color),
                    global.quiet,
                );
            } else {
                output::print_output(&render_errors(&errors, color), global.quiet);
            }
        }
        format => {
            let out = output::render_single(format, &errors, |_| String::new(), |_| String::new());
            output::print_output(&out, global.quiet);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(error::submit_error(&netid, SubmitError::Invalid(errors)))
    }
}
