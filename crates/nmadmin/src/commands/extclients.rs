//! External client and ingress gateway handlers.

use std::io::Write;
use std::sync::Arc;

use tabled::Tabled;

use nmadmin_core::{
    ClientConfigFormat, Command as CoreCommand, CommandResult, EnglishMessages, ExtClientUpdate,
    ExternalClient, GatewayOverview, Messages, Node,
};

use crate::cli::{ExtClientsArgs, ExtClientsCommand, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct GatewayRow {
    #[tabled(rename = "Node ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "Last Check-in")]
    lastcheckin: String,
}

impl From<&Arc<Node>> for GatewayRow {
    fn from(n: &Arc<Node>) -> Self {
        Self {
            id: n.id.clone(),
            name: n.display_name().to_owned(),
            address: n.address.clone(),
            lastcheckin: n
                .lastcheckin
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "-".into()),
        }
    }
}

#[derive(Tabled)]
struct ClientRow {
    #[tabled(rename = "Client ID")]
    clientid: String,
    #[tabled(rename = "Gateway")]
    gateway: String,
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "Enabled")]
    enabled: String,
}

impl From<&Arc<ExternalClient>> for ClientRow {
    fn from(c: &Arc<ExternalClient>) -> Self {
        Self {
            clientid: c.clientid.clone(),
            gateway: c.ingressgatewayid.clone(),
            address: c.address.clone(),
            enabled: if c.enabled { "yes" } else { "no" }.into(),
        }
    }
}

fn client_detail(c: &ExternalClient) -> String {
    [
        format!("Client ID:  {}", c.clientid),
        format!("Network:    {}", c.network),
        format!("Gateway:    {}", c.ingressgatewayid),
        format!("Endpoint:   {}", or_dash(&c.ingressgatewayendpoint)),
        format!("Address:    {}", or_dash(&c.address)),
        format!("Address6:   {}", or_dash(&c.address6)),
        format!("Notes:      {}", or_dash(&c.description)),
        format!("Enabled:    {}", c.enabled),
    ]
    .join("\n")
}

fn or_dash(s: &str) -> &str {
    if s.is_empty() { "-" } else { s }
}

fn render_overview(overview: &GatewayOverview, color: bool) -> String {
    let messages = EnglishMessages;
    match overview {
        GatewayOverview::NetworkNotFound => messages.text("error.notfound").into_owned(),
        GatewayOverview::NoGateways => messages.text("ingress.none").into_owned(),
        GatewayOverview::Gateways { gateways, clients } => {
            let gateway_rows: Vec<GatewayRow> = gateways.iter().map(GatewayRow::from).collect();
            let client_rows: Vec<ClientRow> = clients.iter().map(ClientRow::from).collect();
            let clients_table = if client_rows.is_empty() {
                output::muted("(none)", color)
            } else {
                output::render_table(&client_rows)
            };
            format!(
                "{}\n{}\n\n{}\n{}",
                output::heading(&messages.text("ingress.gateways"), color),
                output::render_table(&gateway_rows),
                output::heading(&messages.text("extclient.extclients"), color),
                clients_table,
            )
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: ExtClientsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let color = output::should_color(global.color);

    match args.command {
        ExtClientsCommand::List { netid } => {
            util::with_controller(global, |c| async move {
                c.refresh_network(&netid).await?;
                let overview = GatewayOverview::build(c.store(), &netid);
                if overview == GatewayOverview::NetworkNotFound {
                    return Err(CliError::NotFound {
                        resource_type: "network".into(),
                        identifier: netid,
                        list_command: "networks list".into(),
                    });
                }

                let out = match global.output {
                    OutputFormat::Plain => match &overview {
                        GatewayOverview::Gateways { clients, .. } => clients
                            .iter()
                            .map(|c| c.clientid.clone())
                            .collect::<Vec<_>>()
                            .join("\n"),
                        _ => String::new(),
                    },
                    format => output::render_single(
                        format,
                        &overview,
                        |o| render_overview(o, color),
                        |_| String::new(),
                    ),
                };
                output::print_output(&out, global.quiet);
                Ok(())
            })
            .await
        }

        ExtClientsCommand::Create { netid, gateway } => {
            util::with_controller(global, |c| async move {
                // Populate nodes so the gateway is checked before the POST.
                c.refresh_network(&netid).await?;
                let result = c
                    .execute(CoreCommand::CreateExtClient {
                        netid: netid.clone(),
                        gateway_node_id: gateway,
                    })
                    .await?;

                match result {
                    CommandResult::ExtClient(client) => {
                        let out = output::render_single(
                            global.output,
                            &client,
                            |cl| {
                                format!(
                                    "{}\n\n{}",
                                    output::success("External client created", color),
                                    client_detail(cl)
                                )
                            },
                            |cl| cl.clientid.clone(),
                        );
                        output::print_output(&out, global.quiet);
                    }
                    other => tracing::debug!(result = ?other, "unexpected create result"),
                }
                Ok(())
            })
            .await
        }

        ExtClientsCommand::Edit {
            netid,
            clientid,
            rename,
            description,
            enable,
            disable,
        } => {
            let update = ExtClientUpdate {
                rename,
                description,
                enabled: match (enable, disable) {
                    (true, _) => Some(true),
                    (_, true) => Some(false),
                    _ => None,
                },
            };
            if update.is_empty() {
                return Err(CliError::Usage {
                    field: "extclients edit".into(),
                    reason: "nothing to change; pass --rename, --description, --enable or --disable"
                        .into(),
                });
            }

            util::with_controller(global, |c| async move {
                let result = c
                    .execute(CoreCommand::UpdateExtClient {
                        netid,
                        clientid,
                        update,
                    })
                    .await?;

                match result {
                    CommandResult::ExtClient(client) => {
                        let out = output::render_single(
                            global.output,
                            &client,
                            |cl| {
                                format!(
                                    "{}\n\n{}",
                                    output::success("External client updated", color),
                                    client_detail(cl)
                                )
                            },
                            |cl| cl.clientid.clone(),
                        );
                        output::print_output(&out, global.quiet);
                    }
                    other => tracing::debug!(result = ?other, "unexpected update result"),
                }
                Ok(())
            })
            .await
        }

        ExtClientsCommand::Config {
            netid,
            clientid,
            qr,
            out,
        } => {
            let format = if qr {
                ClientConfigFormat::Qr
            } else {
                ClientConfigFormat::File
            };
            if format == ClientConfigFormat::Qr && out.is_none() {
                return Err(CliError::Usage {
                    field: "--out".into(),
                    reason: "QR codes are PNG images; pass --out <PATH>".into(),
                });
            }

            util::with_controller(global, |c| async move {
                let bytes = c.ext_client_config(&netid, &clientid, format).await?;
                match out {
                    Some(path) => {
                        std::fs::write(&path, &bytes)?;
                        if !global.quiet {
                            eprintln!(
                                "{}",
                                output::success(&format!("Wrote {}", path.display()), color)
                            );
                        }
                    }
                    None => std::io::stdout().write_all(&bytes)?,
                }
                Ok(())
            })
            .await
        }

        ExtClientsCommand::Delete { netid, clientid } => {
            let prompt = format!("Delete external client '{clientid}' from network '{netid}'?");
            if !util::confirm(&prompt, "extclients delete", global.yes)? {
                return Ok(());
            }

            util::with_controller(global, |c| async move {
                c.execute(CoreCommand::DeleteExtClient {
                    netid: netid.clone(),
                    clientid: clientid.clone(),
                })
                .await?;
                if !global.quiet {
                    eprintln!(
                        "{}",
                        output::success(&format!("Deleted external client '{clientid}'"), color)
                    );
                }
                Ok(())
            })
            .await
        }
    }
}
