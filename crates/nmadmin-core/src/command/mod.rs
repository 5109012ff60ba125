// ── Command API ──
//
// All write operations flow through a unified `Command` enum. The
// controller's processor task routes each variant to the API client and
// applies the result to the DataStore.

use tokio::sync::oneshot;

use crate::error::CoreError;
use crate::model::{ExtClientUpdate, ExternalClient, Network, NetworkPayload};

type Reply = Result<CommandResult, CoreError>;

/// A command envelope sent through the command channel.
/// Contains the command and a oneshot response channel.
pub(crate) struct CommandEnvelope {
    pub command: Command,
    pub response_tx: oneshot::Sender<Reply>,
}

/// All write operations against the management server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    // ── Networks ─────────────────────────────────────────────────────
    /// Replace a network's configuration record.
    UpdateNetwork {
        netid: String,
        payload: NetworkPayload,
    },

    // ── External clients ─────────────────────────────────────────────
    CreateExtClient {
        netid: String,
        gateway_node_id: String,
    },
    /// Change a client's metadata (id, description, enabled).
    UpdateExtClient {
        netid: String,
        clientid: String,
        update: ExtClientUpdate,
    },
    DeleteExtClient {
        netid: String,
        clientid: String,
    },
}

impl Command {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::UpdateNetwork { .. } => "update_network",
            Self::CreateExtClient { .. } => "create_ext_client",
            Self::UpdateExtClient { .. } => "update_ext_client",
            Self::DeleteExtClient { .. } => "delete_ext_client",
        }
    }

    /// The network the command targets.
    pub fn netid(&self) -> &str {
        match self {
            Self::UpdateNetwork { netid, .. }
            | Self::CreateExtClient { netid, .. }
            | Self::UpdateExtClient { netid, .. }
            | Self::DeleteExtClient { netid, .. } => netid,
        }
    }
}

/// Result of a successfully executed command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    Ok,
    Network(Network),
    ExtClient(ExternalClient),
}

// ── Dispatch ─────────────────────────────────────────────────────────

/// Something that accepts commands without blocking the caller.
pub trait UpdateSink {
    /// Enqueue `command`. Fails only if it could not be queued; the
    /// outcome of the command itself arrives through the returned handle.
    fn dispatch(&self, command: Command) -> Result<PendingUpdate, CoreError>;
}

/// Handle to a dispatched command.
///
/// `.wait().await` yields the command's outcome. Dropping the handle
/// detaches it: the command still runs and failures are still logged by
/// the processor.
#[derive(Debug)]
#[must_use = "dropping a PendingUpdate detaches it; call `.wait()` or `.detach()`"]
pub struct PendingUpdate {
    rx: oneshot::Receiver<Reply>,
}

impl PendingUpdate {
    /// A connected sender / handle pair.
    pub fn channel() -> (oneshot::Sender<Reply>, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, Self { rx })
    }

    /// A handle that is already resolved.
    pub fn ready(result: Reply) -> Self {
        let (tx, pending) = Self::channel();
        let _ = tx.send(result);
        pending
    }

    /// Wait for the command to finish.
    pub async fn wait(self) -> Reply {
        self.rx
            .await
            .map_err(|_| CoreError::ControllerDisconnected)?
    }

    /// Let the command finish in the background.
    pub fn detach(self) {}
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn ready_handle_resolves_immediately() {
        let pending = PendingUpdate::ready(Ok(CommandResult::Ok));
        let result = tokio_test::block_on(pending.wait());
        assert_eq!(result.unwrap(), CommandResult::Ok);
    }

    #[tokio::test]
    async fn dropped_sender_reports_disconnect() {
        let (tx, pending) = PendingUpdate::channel();
        drop(tx);
        assert!(matches!(
            pending.wait().await,
            Err(CoreError::ControllerDisconnected)
        ));
    }

    #[test]
    fn command_names_its_network() {
        let cmd = Command::DeleteExtClient {
            netid: "home".into(),
            clientid: "phone".into(),
        };
        assert_eq!(cmd.netid(), "home");
        assert_eq!(cmd.name(), "delete_ext_client");
    }
}
