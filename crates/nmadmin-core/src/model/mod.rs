// ── Domain model ──
//
// Canonical representations of the management server's entities. The
// API crate owns the wire encoding; everything here is what consumers
// (editor, CLI) work with.

pub mod ext_client;
pub mod network;
pub mod node;
pub mod server;

// ── Re-exports ──────────────────────────────────────────────────────

pub use ext_client::{ClientConfigFormat, ExtClientUpdate, ExternalClient};
pub use network::{Network, NetworkPayload};
pub use node::Node;
pub use server::ServerConfig;
