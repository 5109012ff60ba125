// ── Server capability flags ──

use serde::{Deserialize, Serialize};

/// Server-wide configuration relevant to clients.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Remote command execution. Gates editing of post-up/post-down hooks.
    pub rce: bool,
    pub version: Option<String>,
}
