//! HTTP API handlers. Expose relay state as JSON.

pub mod status;

use pairlink_services::Relay;

#[derive(Clone)]
pub struct ApiState {
    pub relay: Relay,
    /// Signaling port, reported by /status.
    pub port: u16,
    /// Signals graceful daemon shutdown.
    pub shutdown_tx: tokio::sync::broadcast::Sender<()>,
}

pub use status::{handle_connections, handle_peers, handle_shutdown, handle_status};
