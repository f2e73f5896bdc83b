//! Connection lifecycle. Binds transport connections to relay state and
//! tears them down exactly once.
//!
//! Close, read errors, and failed deliveries all land in [`LifecycleManager::cleanup`].
//! Removal from the connection table is the once-only gate: whichever event
//! gets there first does the work, the rest are no-ops.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;

use crate::connection::{
    ConnectionEntry, ConnectionId, ConnectionState, ConnectionTable, Frame, PeerHandle,
};
use crate::outbound::{deliver, Outbound};
use crate::presence::PresenceNotifier;
use crate::registry::PeerRegistry;

#[derive(Clone)]
pub struct LifecycleManager {
    registry: PeerRegistry,
    connections: ConnectionTable,
    presence: Arc<PresenceNotifier>,
    next_id: Arc<AtomicU64>,
    queue_capacity: usize,
}

impl LifecycleManager {
    pub fn new(
        registry: PeerRegistry,
        connections: ConnectionTable,
        presence: Arc<PresenceNotifier>,
        queue_capacity: usize,
    ) -> Self {
        Self {
            registry,
            connections,
            presence,
            next_id: Arc::new(AtomicU64::new(1)),
            queue_capacity,
        }
    }

    /// Track a new, unregistered connection. The receiver feeds its writer.
    pub fn open(&self, remote: Option<SocketAddr>) -> (PeerHandle, mpsc::Receiver<Frame>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (handle, rx) = PeerHandle::channel(id, self.queue_capacity);
        self.connections.insert(
            id,
            ConnectionEntry {
                handle: handle.clone(),
                remote,
                opened_at: Instant::now(),
                state: ConnectionState::Unregistered,
            },
        );
        tracing::debug!(conn = id, remote = ?remote, "connection opened");
        (handle, rx)
    }

    pub async fn on_close(&self, conn: ConnectionId) {
        self.cleanup(conn).await;
    }

    /// Same as close. Safe to call alongside `on_close` for one connection.
    pub async fn on_transport_error(&self, conn: ConnectionId, error: &(dyn std::fmt::Display + Sync)) {
        tracing::warn!(conn, error = %error, "transport error");
        self.cleanup(conn).await;
    }

    /// Clean up connections found closed during delivery.
    pub(crate) async fn cleanup_all(&self, closed: Vec<ConnectionId>) {
        for conn in closed {
            self.cleanup(conn).await;
        }
    }

    /// Tear down `conn`, then anything whose queue turned out closed while
    /// notifying its counterpart.
    async fn cleanup(&self, conn: ConnectionId) {
        let mut pending = vec![conn];
        while let Some(conn) = pending.pop() {
            pending.extend(self.teardown(conn).await);
        }
    }

    async fn teardown(&self, conn: ConnectionId) -> Vec<ConnectionId> {
        let mut peers = self.registry.lock().await;

        let Some((_, entry)) = self.connections.remove(&conn) else {
            tracing::trace!(conn, "already cleaned up");
            return Vec::new();
        };
        let age_secs = entry.opened_at.elapsed().as_secs();

        match peers.unregister_by_connection(conn) {
            Some(identity) => {
                tracing::info!(conn, identity = %identity, age_secs, "peer disconnected");
                deliver(self.presence.on_disconnect(&peers, &identity))
            }
            None => {
                match entry.state {
                    ConnectionState::Registered(identity) => tracing::info!(
                        conn,
                        identity = %identity,
                        age_secs,
                        "superseded connection closed"
                    ),
                    ConnectionState::Unregistered => {
                        tracing::info!(conn, age_secs, "connection closed before registering")
                    }
                }
                Vec::new()
            }
        }
    }

    /// Queue a batch outside any registry change and clean up closed targets.
    pub async fn dispatch(&self, batch: Vec<Outbound>) {
        let closed = deliver(batch);
        self.cleanup_all(closed).await;
    }
}
