//! Outbound frames and best-effort delivery.

use pairlink_core::{Presence, RelayError};

use crate::connection::{ConnectionId, Frame, PeerHandle};

/// A frame addressed to one connection.
#[derive(Debug, Clone)]
pub struct Outbound {
    pub target: PeerHandle,
    pub frame: Frame,
}

impl Outbound {
    pub fn text(target: PeerHandle, text: String) -> Self {
        Self {
            target,
            frame: Frame::Text(text),
        }
    }

    pub fn presence(target: PeerHandle, presence: Presence) -> Self {
        Self::text(target, presence.frame())
    }

    pub fn close(target: PeerHandle) -> Self {
        Self {
            target,
            frame: Frame::Close,
        }
    }
}

/// Queue every frame once. Returns the connections whose queues are closed;
/// the caller owes them a cleanup. Full queues only lose the frame.
pub fn deliver(batch: Vec<Outbound>) -> Vec<ConnectionId> {
    let mut closed = Vec::new();
    for out in batch {
        match out.target.send(out.frame) {
            Ok(()) => {}
            Err(RelayError::Transport(conn)) => {
                tracing::warn!(conn, "delivery failed, connection closing");
                if !closed.contains(&conn) {
                    closed.push(conn);
                }
            }
            Err(e) => {
                tracing::warn!(conn = out.target.id(), error = %e, "frame dropped");
            }
        }
    }
    closed
}
