//! Message router. Classifies inbound frames and acts on them.
//!
//! Per connection: Unregistered → Registered (registration), Registered →
//! Registered (re-registration rebinds), either → Closed (lifecycle). A closed
//! connection has no entry in the connection table, so late frames from it
//! are treated like frames before registration.

use std::sync::Arc;

use pairlink_core::config::ReregisterPolicy;
use pairlink_core::{Inbound, RelayError, SignalMessage};

use crate::connection::{ConnectionId, ConnectionState, ConnectionTable};
use crate::lifecycle::LifecycleManager;
use crate::outbound::{deliver, Outbound};
use crate::pairing::PairingResolver;
use crate::presence::PresenceNotifier;
use crate::registry::PeerRegistry;

#[derive(Clone)]
pub struct MessageRouter {
    registry: PeerRegistry,
    connections: ConnectionTable,
    resolver: Arc<dyn PairingResolver>,
    presence: Arc<PresenceNotifier>,
    lifecycle: LifecycleManager,
    on_reregister: ReregisterPolicy,
}

impl MessageRouter {
    pub fn new(
        registry: PeerRegistry,
        connections: ConnectionTable,
        resolver: Arc<dyn PairingResolver>,
        presence: Arc<PresenceNotifier>,
        lifecycle: LifecycleManager,
        on_reregister: ReregisterPolicy,
    ) -> Self {
        Self {
            registry,
            connections,
            resolver,
            presence,
            lifecycle,
            on_reregister,
        }
    }

    /// Handle one inbound text frame. Never fails: every error is logged and
    /// the frame dropped, with no reply to the sender.
    pub async fn on_message(&self, conn: ConnectionId, raw: &str) {
        let result = match Inbound::parse(raw) {
            Ok(Inbound::Registration { identity }) => self.register(conn, identity).await,
            Ok(Inbound::Signal(signal)) => self.forward(conn, signal).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => {}
            Err(e @ (RelayError::UnregisteredTarget(_) | RelayError::NoRoute(_))) => {
                tracing::info!(conn, error = %e, "signal dropped");
            }
            Err(e @ RelayError::Parse(_)) => {
                tracing::debug!(conn, error = %e, len = raw.len(), "message dropped");
            }
            Err(e) => {
                tracing::warn!(conn, error = %e, "message dropped");
            }
        }
    }

    async fn register(&self, conn: ConnectionId, identity: String) -> Result<(), RelayError> {
        let closed = {
            let mut peers = self.registry.lock().await;

            let mut entry = self
                .connections
                .get_mut(&conn)
                .ok_or(RelayError::InvalidState)?;
            let handle = entry.handle.clone();
            let mut batch = Vec::new();

            // Rebinding to a new identity releases the old one first.
            if let Some(previous) = peers.unregister_by_connection(conn) {
                if previous != identity {
                    tracing::info!(conn, from = %previous, to = %identity, "connection rebinding");
                    batch.extend(self.presence.on_disconnect(&peers, &previous));
                }
            }

            let superseded = peers.register(&identity, handle)?;
            entry.state = ConnectionState::Registered(identity.clone());
            drop(entry);

            tracing::info!(conn, identity = %identity, "peer registered");

            if let Some(old) = superseded.filter(|old| old.id() != conn) {
                tracing::info!(
                    conn,
                    superseded = old.id(),
                    identity = %identity,
                    policy = ?self.on_reregister,
                    "identity claimed by new connection"
                );
                if self.on_reregister == ReregisterPolicy::Close {
                    batch.push(Outbound::close(old));
                }
            }

            batch.extend(self.presence.on_register(&peers, &identity));
            deliver(batch)
        };

        self.lifecycle.cleanup_all(closed).await;
        Ok(())
    }

    async fn forward(&self, conn: ConnectionId, signal: SignalMessage) -> Result<(), RelayError> {
        let (sender, target) = {
            let peers = self.registry.lock().await;

            let sender = self
                .connections
                .get(&conn)
                .and_then(|entry| entry.state.identity().map(str::to_string))
                .ok_or(RelayError::InvalidState)?;

            let destination = self
                .resolver
                .resolve(&sender, signal.destination.as_deref())
                .ok_or_else(|| RelayError::NoRoute(sender.clone()))?;

            let target = peers
                .lookup(&destination)
                .cloned()
                .ok_or(RelayError::UnregisteredTarget(destination))?;

            (sender, target)
        };

        if let Some(claimed) = signal.claimed_sender.as_deref() {
            if claimed != sender {
                tracing::debug!(conn, claimed, sender = %sender, "claimed id differs from bound identity");
            }
        }
        if signal.kind.is_none() {
            tracing::debug!(conn, sender = %sender, "relaying payload of unrecognised kind");
        }

        let frame = signal.outbound_frame(&sender);
        tracing::debug!(
            conn,
            from = %sender,
            to_conn = target.id(),
            kind = signal.kind_str(),
            "signal forwarded"
        );
        self.lifecycle
            .dispatch(vec![Outbound::text(target, frame)])
            .await;
        Ok(())
    }
}
