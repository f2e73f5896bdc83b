//! Connection handles, the relay's view of one transport connection.
//!
//! The transport owns the socket. The relay only holds the sending half of a
//! bounded frame queue, so nothing here ever performs socket I/O.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use tokio::sync::mpsc;

use pairlink_core::RelayError;

pub type ConnectionId = u64;

/// A frame queued for a connection's writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    /// Ask the writer to close the socket.
    Close,
}

/// Cloneable handle used to queue frames for one connection.
#[derive(Debug, Clone)]
pub struct PeerHandle {
    id: ConnectionId,
    tx: mpsc::Sender<Frame>,
}

impl PeerHandle {
    /// Create a handle plus the receiver the connection's writer drains.
    pub fn channel(id: ConnectionId, capacity: usize) -> (Self, mpsc::Receiver<Frame>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { id, tx }, rx)
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Queue a frame without waiting.
    pub fn send(&self, frame: Frame) -> Result<(), RelayError> {
        self.tx.try_send(frame).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => RelayError::QueueFull(self.id),
            mpsc::error::TrySendError::Closed(_) => RelayError::Transport(self.id),
        })
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Per-connection routing state. A closed connection has no entry at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Unregistered,
    Registered(String),
}

impl ConnectionState {
    pub fn identity(&self) -> Option<&str> {
        match self {
            ConnectionState::Unregistered => None,
            ConnectionState::Registered(id) => Some(id),
        }
    }
}

#[derive(Debug)]
pub struct ConnectionEntry {
    pub handle: PeerHandle,
    pub remote: Option<SocketAddr>,
    pub opened_at: Instant,
    pub state: ConnectionState,
}

/// Open connections, keyed on connection id.
pub type ConnectionTable = Arc<DashMap<ConnectionId, ConnectionEntry>>;

/// Create a new empty connection table.
pub fn new_connection_table() -> ConnectionTable {
    Arc::new(DashMap::new())
}
