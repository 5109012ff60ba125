// ── Controller abstraction ──
//
// Connection lifecycle for one management server: builds the API client,
// performs the initial load, runs background refresh and routes commands
// through a single processor task that writes results to the DataStore.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use nmadmin_api::transport::{TlsMode, TransportConfig};
use nmadmin_api::{ApiNetwork, ServerClient};

use crate::command::{Command, CommandEnvelope, CommandResult, PendingUpdate, UpdateSink};
use crate::config::{ControllerConfig, TlsVerification};
use crate::editor::NetworkConfigEditor;
use crate::error::CoreError;
use crate::convert::ext_client_update_body;
use crate::model::{ClientConfigFormat, ExternalClient, Network, Node, ServerConfig};
use crate::store::{DataStore, ExtClientStoreHandle, NetworkStoreHandle, Snapshot};
use crate::stream::Subscription;

const COMMAND_CHANNEL_SIZE: usize = 64;

// ── ConnectionState ──────────────────────────────────────────────

/// Connection state observable by consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

// ── Controller ───────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<ControllerInner>`.
#[derive(Clone)]
pub struct Controller {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    config: ControllerConfig,
    store: Arc<DataStore>,
    connection_state: watch::Sender<ConnectionState>,
    command_tx: mpsc::Sender<CommandEnvelope>,
    command_rx: Mutex<Option<mpsc::Receiver<CommandEnvelope>>>,
    cancel: CancellationToken,
    client: Mutex<Option<Arc<ServerClient>>>,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Controller {
    /// Create a new Controller from configuration. Does NOT connect --
    /// call [`connect()`](Self::connect) to load data and start background tasks.
    pub fn new(config: ControllerConfig) -> Self {
        let store = Arc::new(DataStore::new());
        let (connection_state, _) = watch::channel(ConnectionState::Disconnected);
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);

        Self {
            inner: Arc::new(ControllerInner {
                config,
                store,
                connection_state,
                command_tx,
                command_rx: Mutex::new(Some(command_rx)),
                cancel: CancellationToken::new(),
                client: Mutex::new(None),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Access the controller configuration.
    pub fn config(&self) -> &ControllerConfig {
        &self.inner.config
    }

    /// Access the underlying DataStore.
    pub fn store(&self) -> &Arc<DataStore> {
        &self.inner.store
    }

    // ── Connection lifecycle ─────────────────────────────────────

    /// Connect to the server.
    ///
    /// Builds the HTTP client, loads the server flags and every network,
    /// and spawns the command processor (plus periodic refresh if
    /// configured).
    pub async fn connect(&self) -> Result<(), CoreError> {
        self.inner
            .connection_state
            .send_replace(ConnectionState::Connecting);

        let config = &self.inner.config;
        let client = match ServerClient::new(
            config.url.clone(),
            &config.master_key,
            &build_transport(config),
        ) {
            Ok(c) => c,
            Err(e) => {
                self.inner.connection_state.send_replace(ConnectionState::Failed);
                return Err(e.into());
            }
        };
        *self.inner.client.lock().await = Some(Arc::new(client));

        if let Err(e) = self.full_refresh().await {
            self.inner.connection_state.send_replace(ConnectionState::Failed);
            *self.inner.client.lock().await = None;
            return Err(e);
        }

        // Spawn background tasks
        let mut handles = self.inner.task_handles.lock().await;

        if let Some(rx) = self.inner.command_rx.lock().await.take() {
            let ctrl = self.clone();
            handles.push(tokio::spawn(command_processor_task(ctrl, rx)));
        }

        let interval_secs = config.refresh_interval_secs;
        if interval_secs > 0 {
            let ctrl = self.clone();
            let cancel = self.inner.cancel.clone();
            handles.push(tokio::spawn(refresh_task(ctrl, interval_secs, cancel)));
        }

        self.inner
            .connection_state
            .send_replace(ConnectionState::Connected);
        info!(
            url = %config.url,
            networks = self.inner.store.network_count(),
            "connected to server"
        );
        Ok(())
    }

    /// Disconnect from the server.
    ///
    /// Cancels background tasks and resets the connection state to
    /// [`Disconnected`](ConnectionState::Disconnected). Commands still
    /// queued are dropped; their handles resolve to
    /// [`CoreError::ControllerDisconnected`].
    pub async fn disconnect(&self) {
        self.inner.cancel.cancel();

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }

        *self.inner.client.lock().await = None;
        self.inner
            .connection_state
            .send_replace(ConnectionState::Disconnected);
        debug!("disconnected");
    }

    async fn client(&self) -> Result<Arc<ServerClient>, CoreError> {
        self.inner
            .client
            .lock()
            .await
            .clone()
            .ok_or(CoreError::ControllerDisconnected)
    }

    /// Fetch server flags and all networks, replacing the store's copy.
    pub async fn full_refresh(&self) -> Result<(), CoreError> {
        let client = self.client().await?;

        let (config_res, networks_res) =
            tokio::join!(client.server_config(), client.list_networks());

        let server = ServerConfig::from(config_res?);
        let networks: Vec<Network> = networks_res?.into_iter().map(Network::from).collect();

        let store = &self.inner.store;
        store.set_server_config(server);
        store.apply_networks(networks);
        store.mark_refreshed();

        debug!(networks = store.network_count(), "data refresh complete");
        Ok(())
    }

    /// Fetch the nodes and external clients of one network.
    ///
    /// Fails with [`CoreError::NetworkNotFound`] for a network the store
    /// does not hold or the server no longer knows.
    pub async fn refresh_network(&self, netid: &str) -> Result<(), CoreError> {
        let client = self.client().await?;
        let missing = || CoreError::NetworkNotFound {
            netid: netid.to_owned(),
        };
        if self.inner.store.network(netid).is_none() {
            return Err(missing());
        }

        let (nodes_res, clients_res) =
            tokio::join!(client.list_nodes(netid), client.list_ext_clients(netid));

        let nodes: Vec<Node> = nodes_res
            .map_err(|e| or_missing(e, missing))?
            .into_iter()
            .map(Node::from)
            .collect();
        let clients: Vec<ExternalClient> = clients_res
            .map_err(|e| or_missing(e, missing))?
            .into_iter()
            .map(ExternalClient::from)
            .collect();

        debug!(netid, nodes = nodes.len(), clients = clients.len(), "network refreshed");
        self.inner.store.apply_nodes(netid, nodes);
        self.inner.store.apply_ext_clients(netid, clients);
        Ok(())
    }

    /// Download an external client's WireGuard config as text or QR PNG.
    pub async fn ext_client_config(
        &self,
        netid: &str,
        clientid: &str,
        format: ClientConfigFormat,
    ) -> Result<Vec<u8>, CoreError> {
        let client = self.client().await?;
        client
            .ext_client_config(netid, clientid, format.into())
            .await
            .map_err(|e| {
                or_missing(e, || CoreError::ExtClientNotFound {
                    identifier: clientid.to_owned(),
                })
            })
    }

    // ── Command execution ────────────────────────────────────────

    /// Execute a command and wait for its result.
    pub async fn execute(&self, cmd: Command) -> Result<CommandResult, CoreError> {
        if *self.inner.connection_state.borrow() != ConnectionState::Connected {
            return Err(CoreError::ControllerDisconnected);
        }

        let (tx, pending) = PendingUpdate::channel();
        self.inner
            .command_tx
            .send(CommandEnvelope {
                command: cmd,
                response_tx: tx,
            })
            .await
            .map_err(|_| CoreError::ControllerDisconnected)?;

        pending.wait().await
    }

    // ── One-shot convenience ─────────────────────────────────────

    /// One-shot: connect, run closure, disconnect.
    ///
    /// Periodic refresh is disabled since only a single
    /// request-response cycle is needed.
    pub async fn oneshot<F, Fut, T>(config: ControllerConfig, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(Controller) -> Fut,
        Fut: std::future::Future<Output = Result<T, CoreError>>,
    {
        let mut cfg = config;
        cfg.refresh_interval_secs = 0;

        let controller = Controller::new(cfg);
        controller.connect().await?;
        let result = f(controller.clone()).await;
        controller.disconnect().await;
        result
    }

    // ── State observation ────────────────────────────────────────

    /// Subscribe to connection state changes.
    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.connection_state.subscribe()
    }

    // ── Store accessors ──────────────────────────────────────────

    pub fn network(&self, netid: &str) -> Option<Arc<Network>> {
        self.inner.store.network(netid)
    }

    pub fn networks_snapshot(&self) -> Snapshot<Network> {
        self.inner.store.networks_snapshot()
    }

    pub fn networks(&self) -> Subscription<Snapshot<Network>> {
        self.inner.store.subscribe_networks()
    }

    pub fn server_config(&self) -> ServerConfig {
        self.inner.store.server_config()
    }

    pub fn network_store(&self) -> NetworkStoreHandle {
        NetworkStoreHandle::new(Arc::clone(&self.inner.store))
    }

    pub fn ext_client_store(&self) -> ExtClientStoreHandle {
        ExtClientStoreHandle::new(Arc::clone(&self.inner.store))
    }

    /// An edit session for `netid`, seeded from the store.
    ///
    /// Unknown networks yield an editor in the not-found state.
    pub fn editor_for(&self, netid: &str) -> NetworkConfigEditor {
        let network = self.inner.store.network(netid).map(|n| (*n).clone());
        NetworkConfigEditor::new(network, &self.inner.store.server_config())
    }
}

impl UpdateSink for Controller {
    /// Queue a command without waiting for it to run.
    fn dispatch(&self, command: Command) -> Result<PendingUpdate, CoreError> {
        if *self.inner.connection_state.borrow() != ConnectionState::Connected {
            return Err(CoreError::ControllerDisconnected);
        }

        let (tx, pending) = PendingUpdate::channel();
        self.inner
            .command_tx
            .try_send(CommandEnvelope {
                command,
                response_tx: tx,
            })
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => CoreError::QueueFull,
                mpsc::error::TrySendError::Closed(_) => CoreError::ControllerDisconnected,
            })?;
        Ok(pending)
    }
}

// ── Background tasks ─────────────────────────────────────────────

/// Periodically refresh data from the server.
async fn refresh_task(controller: Controller, interval_secs: u64, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                if let Err(e) = controller.full_refresh().await {
                    warn!(error = %e, "periodic refresh failed");
                }
            }
        }
    }
}

/// Process commands from the mpsc channel one at a time.
///
/// Failures are logged here as well as returned, so a caller that
/// detached its handle still leaves a trace.
async fn command_processor_task(controller: Controller, mut rx: mpsc::Receiver<CommandEnvelope>) {
    let cancel = controller.inner.cancel.clone();

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            envelope = rx.recv() => {
                let Some(envelope) = envelope else { break };
                let name = envelope.command.name();
                let netid = envelope.command.netid().to_owned();

                let result = route_command(&controller, envelope.command).await;
                if let Err(ref e) = result {
                    warn!(command = name, netid = %netid, error = %e, "command failed");
                } else {
                    debug!(command = name, netid = %netid, "command completed");
                }
                if envelope.response_tx.send(result).is_err() {
                    debug!(command = name, "command handle was detached");
                }
            }
        }
    }
}

// ── Command routing ──────────────────────────────────────────────

async fn route_command(controller: &Controller, cmd: Command) -> Result<CommandResult, CoreError> {
    let client = controller.client().await?;
    let store = &controller.inner.store;

    match cmd {
        Command::UpdateNetwork { netid, payload } => {
            if payload.netid != netid {
                return Err(CoreError::ValidationFailed {
                    message: format!("payload is for '{}', not '{netid}'", payload.netid),
                });
            }
            let updated = client
                .update_network(&ApiNetwork::from(payload))
                .await
                .map_err(|e| or_missing(e, || CoreError::NetworkNotFound { netid }))?;
            let network = Network::from(updated);
            store.apply_network(network.clone());
            Ok(CommandResult::Network(network))
        }

        Command::CreateExtClient {
            netid,
            gateway_node_id,
        } => {
            match store.node(&netid, &gateway_node_id) {
                Some(node) if !node.isingressgateway => {
                    return Err(CoreError::ValidationFailed {
                        message: format!("node '{}' is not an ingress gateway", node.display_name()),
                    });
                }
                Some(_) => {}
                // Only decidable once the network's nodes are loaded.
                None if store
                    .nodes_by_network(&netid)
                    .is_some_and(|nodes| !nodes.is_empty()) =>
                {
                    return Err(CoreError::NodeNotFound {
                        identifier: gateway_node_id,
                    });
                }
                None => {}
            }

            let known: HashSet<String> = store
                .ext_clients_by_network(&netid)
                .iter()
                .map(|c| c.clientid.clone())
                .collect();

            client.create_ext_client(&netid, &gateway_node_id).await?;

            let clients: Vec<ExternalClient> = client
                .list_ext_clients(&netid)
                .await?
                .into_iter()
                .map(ExternalClient::from)
                .collect();
            let created = clients
                .iter()
                .find(|c| !known.contains(&c.clientid) && c.ingressgatewayid == gateway_node_id)
                .cloned();
            store.apply_ext_clients(&netid, clients);

            Ok(created.map_or(CommandResult::Ok, CommandResult::ExtClient))
        }

        Command::UpdateExtClient {
            netid,
            clientid,
            update,
        } => {
            if update.is_empty() {
                return Err(CoreError::ValidationFailed {
                    message: "no changes to apply".into(),
                });
            }
            if update.rename.as_deref().is_some_and(|id| id.trim().is_empty()) {
                return Err(CoreError::ValidationFailed {
                    message: "client id cannot be empty".into(),
                });
            }

            let body = ext_client_update_body(&clientid, update);
            let updated = client
                .update_ext_client(&netid, &clientid, &body)
                .await
                .map_err(|e| {
                    or_missing(e, || CoreError::ExtClientNotFound {
                        identifier: clientid.clone(),
                    })
                })?;
            let updated = ExternalClient::from(updated);
            store.replace_ext_client(&netid, &clientid, updated.clone());
            Ok(CommandResult::ExtClient(updated))
        }

        Command::DeleteExtClient { netid, clientid } => {
            client
                .delete_ext_client(&netid, &clientid)
                .await
                .map_err(|e| {
                    or_missing(e, || CoreError::ExtClientNotFound {
                        identifier: clientid.clone(),
                    })
                })?;
            store.remove_ext_client(&netid, &clientid);
            Ok(CommandResult::Ok)
        }
    }
}

// ── Helpers ──────────────────────────────────────────────────────

/// A 404 becomes the not-found variant of the entity involved.
fn or_missing(err: nmadmin_api::Error, missing: impl FnOnce() -> CoreError) -> CoreError {
    if err.is_not_found() { missing() } else { err.into() }
}

/// Build a [`TransportConfig`] from the controller configuration.
fn build_transport(config: &ControllerConfig) -> TransportConfig {
    TransportConfig {
        tls: tls_to_transport(&config.tls),
        timeout: config.timeout,
    }
}

fn tls_to_transport(tls: &TlsVerification) -> TlsMode {
    match tls {
        TlsVerification::SystemDefaults => TlsMode::System,
        TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
        TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
    }
}
