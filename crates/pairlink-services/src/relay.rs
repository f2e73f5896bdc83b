//! The relay: registry, resolver, presence, router and lifecycle, built once
//! at startup from config and shared by every connection task.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;

use pairlink_core::config::{ConfigError, RelayConfig, RoutingStrategy};

use crate::connection::{new_connection_table, ConnectionId, ConnectionTable, Frame, PeerHandle};
use crate::lifecycle::LifecycleManager;
use crate::pairing::{resolver_for, PairingResolver, PairingTable};
use crate::presence::PresenceNotifier;
use crate::registry::PeerRegistry;
use crate::router::MessageRouter;

#[derive(Clone)]
pub struct Relay {
    registry: PeerRegistry,
    connections: ConnectionTable,
    resolver: Arc<dyn PairingResolver>,
    router: MessageRouter,
    lifecycle: LifecycleManager,
    pairs: usize,
    started_at: Instant,
}

/// A registered identity as seen by the admin API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerStatus {
    pub identity: String,
    pub conn: ConnectionId,
    pub counterpart: Option<String>,
    pub counterpart_online: bool,
}

/// An open connection as seen by the admin API.
#[derive(Debug, Clone)]
pub struct ConnectionInfo {
    pub conn: ConnectionId,
    pub remote: Option<SocketAddr>,
    pub identity: Option<String>,
    pub age_secs: u64,
}

impl Relay {
    pub fn new(config: &RelayConfig) -> Result<Self, ConfigError> {
        let table = PairingTable::from_config(&config.pairing)?;
        let pairs = table.len();
        let resolver = resolver_for(config.routing.strategy, table);
        let presence = Arc::new(PresenceNotifier::new(resolver.clone()));
        let registry = PeerRegistry::new();
        let connections = new_connection_table();

        let lifecycle = LifecycleManager::new(
            registry.clone(),
            connections.clone(),
            presence.clone(),
            config.routing.outbound_queue,
        );
        let router = MessageRouter::new(
            registry.clone(),
            connections.clone(),
            resolver.clone(),
            presence,
            lifecycle.clone(),
            config.routing.on_reregister,
        );

        Ok(Self {
            registry,
            connections,
            resolver,
            router,
            lifecycle,
            pairs,
            started_at: Instant::now(),
        })
    }

    /// Start tracking a transport connection.
    pub fn open_connection(&self, remote: Option<SocketAddr>) -> (PeerHandle, mpsc::Receiver<Frame>) {
        self.lifecycle.open(remote)
    }

    pub async fn on_message(&self, conn: ConnectionId, raw: &str) {
        self.router.on_message(conn, raw).await;
    }

    pub async fn on_close(&self, conn: ConnectionId) {
        self.lifecycle.on_close(conn).await;
    }

    pub async fn on_transport_error(&self, conn: ConnectionId, error: &(dyn std::fmt::Display + Sync)) {
        self.lifecycle.on_transport_error(conn, error).await;
    }

    pub fn registry(&self) -> &PeerRegistry {
        &self.registry
    }

    pub fn strategy(&self) -> RoutingStrategy {
        self.resolver.strategy()
    }

    pub fn pair_count(&self) -> usize {
        self.pairs
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Registered identities and whether each one's counterpart is live.
    pub async fn peers(&self) -> Vec<PeerStatus> {
        let peers = self.registry.lock().await;
        peers
            .entries()
            .into_iter()
            .map(|(identity, conn)| {
                let counterpart = self.resolver.counterpart(&identity);
                let counterpart_online = counterpart
                    .as_deref()
                    .map(|c| peers.is_registered(c))
                    .unwrap_or(false);
                PeerStatus {
                    identity,
                    conn,
                    counterpart,
                    counterpart_online,
                }
            })
            .collect()
    }

    /// Open connections, oldest first.
    pub fn connections(&self) -> Vec<ConnectionInfo> {
        let mut list: Vec<ConnectionInfo> = self
            .connections
            .iter()
            .map(|entry| ConnectionInfo {
                conn: *entry.key(),
                remote: entry.remote,
                identity: entry.state.identity().map(str::to_string),
                age_secs: entry.opened_at.elapsed().as_secs(),
            })
            .collect();
        list.sort_by_key(|c| c.conn);
        list
    }
}
