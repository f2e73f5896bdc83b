//! Relay error taxonomy.
//!
//! None of these are fatal. Each one is handled where it is raised: the frame
//! is dropped, the outcome logged, and the sender gets no reply.

/// Why an inbound frame or an outbound delivery was dropped.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// Frame body is not a JSON object with a string `type`.
    #[error("malformed message: {0}")]
    Parse(String),

    /// Registration without a non-empty `id`.
    #[error("registration without an identity")]
    InvalidRegistration,

    /// Signal received on a connection that never registered.
    #[error("signal from unregistered connection")]
    InvalidState,

    /// Destination identity has no live connection.
    #[error("target {0} is not connected")]
    UnregisteredTarget(String),

    /// Sender has no pairing partner and named no destination.
    #[error("no route for {0}")]
    NoRoute(String),

    #[error("unknown message type {0:?}")]
    UnknownMessageType(String),

    /// Delivery to a connection failed because it is already closing.
    #[error("connection {0} is closed")]
    Transport(u64),

    /// A connection's outbound queue is full; the frame was dropped.
    #[error("outbound queue full for connection {0}")]
    QueueFull(u64),
}

impl From<serde_json::Error> for RelayError {
    fn from(e: serde_json::Error) -> Self {
        RelayError::Parse(e.to_string())
    }
}
