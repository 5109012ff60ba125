// nmadmin-api: Async Rust client for the management server REST API

pub mod client;
pub mod error;
pub mod models;
pub mod transport;

pub use client::ServerClient;
pub use error::Error;
pub use models::{
    ApiExtClient, ApiExtClientUpdate, ApiNetwork, ApiNode, ApiServerConfig, ExtClientConfigKind,
};
pub use transport::{TlsMode, TransportConfig};
