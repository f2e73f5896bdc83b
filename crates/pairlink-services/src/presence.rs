//! Online/offline events for a pair.
//!
//! Presence is computed from the registry at the moment of the event, never
//! cached. Callers pass the locked [`PeerTable`] so the computation is atomic
//! with the registry change that triggered it.

use std::sync::Arc;

use pairlink_core::Presence;

use crate::outbound::Outbound;
use crate::pairing::PairingResolver;
use crate::registry::PeerTable;

pub struct PresenceNotifier {
    resolver: Arc<dyn PairingResolver>,
}

impl PresenceNotifier {
    pub fn new(resolver: Arc<dyn PairingResolver>) -> Self {
        Self { resolver }
    }

    /// `identity` was just bound. Counterpart live: both get `online`.
    /// Counterpart absent: only `identity` gets `offline`.
    pub fn on_register(&self, peers: &PeerTable, identity: &str) -> Vec<Outbound> {
        let Some(own) = peers.lookup(identity).cloned() else {
            return Vec::new();
        };

        let counterpart = self
            .resolver
            .counterpart(identity)
            .and_then(|c| peers.lookup(&c).cloned().map(|h| (c, h)));

        match counterpart {
            Some((counterpart, handle)) => {
                tracing::info!(identity, counterpart = %counterpart, "pair online");
                vec![
                    Outbound::presence(own, Presence::Online),
                    Outbound::presence(handle, Presence::Online),
                ]
            }
            None => {
                tracing::debug!(identity, "counterpart not connected");
                vec![Outbound::presence(own, Presence::Offline)]
            }
        }
    }

    /// `identity` was just unbound. A live counterpart gets `offline`.
    pub fn on_disconnect(&self, peers: &PeerTable, identity: &str) -> Vec<Outbound> {
        let Some(counterpart) = self.resolver.counterpart(identity) else {
            return Vec::new();
        };
        match peers.lookup(&counterpart) {
            Some(handle) => {
                tracing::info!(identity, counterpart = %counterpart, "notifying counterpart offline");
                vec![Outbound::presence(handle.clone(), Presence::Offline)]
            }
            None => Vec::new(),
        }
    }
}
