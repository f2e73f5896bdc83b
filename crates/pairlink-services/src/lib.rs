//! pairlink-services — the signaling relay core.
//!
//! Leaf-first: connection handles and the peer registry, the pairing
//! resolver, presence computation, then the router and lifecycle manager
//! that drive them. [`Relay`] wires them together once at startup.

pub mod connection;
pub mod lifecycle;
pub mod outbound;
pub mod pairing;
pub mod presence;
pub mod registry;
pub mod relay;
pub mod router;

pub use connection::{
    new_connection_table, ConnectionEntry, ConnectionId, ConnectionState, ConnectionTable, Frame,
    PeerHandle,
};
pub use lifecycle::LifecycleManager;
pub use outbound::Outbound;
pub use pairing::{resolver_for, ExplicitAddressing, PairingResolver, PairingTable, StaticPairing};
pub use presence::PresenceNotifier;
pub use registry::{PeerRegistry, PeerTable};
pub use relay::{ConnectionInfo, PeerStatus, Relay};
pub use router::MessageRouter;
