//! Peer registry: who is reachable right now.
//!
//! One live handle per identity. A later registration for the same identity
//! replaces the entry; the superseded handle is returned to the caller and
//! is not closed here.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};

use pairlink_core::RelayError;

use crate::connection::{ConnectionId, PeerHandle};

/// Identity → live connection. Only reachable through [`PeerRegistry::lock`].
#[derive(Debug, Default)]
pub struct PeerTable {
    peers: HashMap<String, PeerHandle>,
}

impl PeerTable {
    /// Bind `identity` to `handle`. Returns the handle it replaced, if any.
    pub fn register(
        &mut self,
        identity: &str,
        handle: PeerHandle,
    ) -> Result<Option<PeerHandle>, RelayError> {
        if identity.is_empty() {
            return Err(RelayError::InvalidRegistration);
        }
        Ok(self.peers.insert(identity.to_string(), handle))
    }

    pub fn lookup(&self, identity: &str) -> Option<&PeerHandle> {
        self.peers.get(identity)
    }

    pub fn is_registered(&self, identity: &str) -> bool {
        self.peers.contains_key(identity)
    }

    /// Remove whichever identity is bound to `conn`. Returns that identity.
    ///
    /// A connection that was superseded no longer owns any entry, so this
    /// returns `None` for it and leaves the newer binding alone.
    pub fn unregister_by_connection(&mut self, conn: ConnectionId) -> Option<String> {
        let identity = self
            .peers
            .iter()
            .find(|(_, handle)| handle.id() == conn)
            .map(|(identity, _)| identity.clone())?;
        self.peers.remove(&identity);
        Some(identity)
    }

    /// Registered identities with their connection ids, sorted by identity.
    pub fn entries(&self) -> Vec<(String, ConnectionId)> {
        let mut entries: Vec<_> = self
            .peers
            .iter()
            .map(|(identity, handle)| (identity.clone(), handle.id()))
            .collect();
        entries.sort();
        entries
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}

/// Created once at startup, shared by every connection task.
///
/// All compound operations (register + presence, unregister + presence) run
/// under one lock so they are atomic with respect to each other.
#[derive(Debug, Clone, Default)]
pub struct PeerRegistry {
    table: Arc<Mutex<PeerTable>>,
}

impl PeerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exclusive access for compound operations. Never hold across socket I/O.
    pub async fn lock(&self) -> MutexGuard<'_, PeerTable> {
        self.table.lock().await
    }

    pub async fn register(
        &self,
        identity: &str,
        handle: PeerHandle,
    ) -> Result<Option<PeerHandle>, RelayError> {
        self.lock().await.register(identity, handle)
    }

    pub async fn lookup(&self, identity: &str) -> Option<PeerHandle> {
        self.lock().await.lookup(identity).cloned()
    }

    pub async fn is_registered(&self, identity: &str) -> bool {
        self.lock().await.is_registered(identity)
    }

    pub async fn unregister_by_connection(&self, conn: ConnectionId) -> Option<String> {
        self.lock().await.unregister_by_connection(conn)
    }

    pub async fn entries(&self) -> Vec<(String, ConnectionId)> {
        self.lock().await.entries()
    }

    pub async fn len(&self) -> usize {
        self.lock().await.len()
    }
}
