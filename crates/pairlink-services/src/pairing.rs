//! Pairing resolver: who a message is meant for.
//!
//! Two strategies share one interface so the router never knows which one a
//! deployment picked:
//!   addressed: an explicit `to` wins, the pairing table is the fallback
//!   paired:    the pairing table alone decides

use std::collections::HashMap;
use std::sync::Arc;

use pairlink_core::config::{ConfigError, PairingConfig, RoutingStrategy};

/// Symmetric identity ↔ identity table, fixed for the process lifetime.
#[derive(Debug, Clone, Default)]
pub struct PairingTable {
    partners: HashMap<String, String>,
}

impl PairingTable {
    /// Build from config. Rejects self-pairs, empty names, and identities
    /// that appear in more than one pair.
    pub fn from_config(config: &PairingConfig) -> Result<Self, ConfigError> {
        let mut partners = HashMap::new();
        for pair in &config.pairs {
            if pair.device.is_empty() || pair.console.is_empty() {
                return Err(ConfigError::Pairing("empty identity in pair".to_string()));
            }
            if pair.device == pair.console {
                return Err(ConfigError::Pairing(format!(
                    "{} is paired with itself",
                    pair.device
                )));
            }
            for identity in [&pair.device, &pair.console] {
                if partners.contains_key(identity) {
                    return Err(ConfigError::Pairing(format!(
                        "{identity} appears in more than one pair"
                    )));
                }
            }
            partners.insert(pair.device.clone(), pair.console.clone());
            partners.insert(pair.console.clone(), pair.device.clone());
        }
        Ok(Self { partners })
    }

    pub fn partner(&self, identity: &str) -> Option<&str> {
        self.partners.get(identity).map(String::as_str)
    }

    /// Number of pairs.
    pub fn len(&self) -> usize {
        self.partners.len() / 2
    }

    pub fn is_empty(&self) -> bool {
        self.partners.is_empty()
    }
}

/// Resolves the intended recipient of a message.
pub trait PairingResolver: Send + Sync {
    /// Destination for a signal from `sender`, given an optional explicit `to`.
    fn resolve(&self, sender: &str, explicit: Option<&str>) -> Option<String>;

    /// Default counterpart, used for presence.
    fn counterpart(&self, identity: &str) -> Option<String> {
        self.resolve(identity, None)
    }

    fn strategy(&self) -> RoutingStrategy;
}

/// `to` when present, else the pairing table.
pub struct ExplicitAddressing {
    table: PairingTable,
}

impl ExplicitAddressing {
    pub fn new(table: PairingTable) -> Self {
        Self { table }
    }
}

impl PairingResolver for ExplicitAddressing {
    fn resolve(&self, sender: &str, explicit: Option<&str>) -> Option<String> {
        match explicit {
            Some(to) => Some(to.to_string()),
            None => self.table.partner(sender).map(str::to_string),
        }
    }

    fn strategy(&self) -> RoutingStrategy {
        RoutingStrategy::Addressed
    }
}

/// Pairing table only; an explicit `to` is ignored.
pub struct StaticPairing {
    table: PairingTable,
}

impl StaticPairing {
    pub fn new(table: PairingTable) -> Self {
        Self { table }
    }
}

impl PairingResolver for StaticPairing {
    fn resolve(&self, sender: &str, explicit: Option<&str>) -> Option<String> {
        let partner = self.table.partner(sender);
        if let Some(to) = explicit {
            if partner != Some(to) {
                tracing::debug!(sender, to, "ignoring explicit destination under paired routing");
            }
        }
        partner.map(str::to_string)
    }

    fn strategy(&self) -> RoutingStrategy {
        RoutingStrategy::Paired
    }
}

/// Build the resolver a deployment selected.
pub fn resolver_for(strategy: RoutingStrategy, table: PairingTable) -> Arc<dyn PairingResolver> {
    match strategy {
        RoutingStrategy::Addressed => Arc::new(ExplicitAddressing::new(table)),
        RoutingStrategy::Paired => Arc::new(StaticPairing::new(table)),
    }
}
