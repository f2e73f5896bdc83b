//! pairlink-core — shared types, wire protocol, and configuration.
//! All other pairlink crates depend on this one.

pub mod config;
pub mod error;
pub mod message;

pub use error::RelayError;
pub use message::{Inbound, Presence, SignalForm, SignalKind, SignalMessage};
