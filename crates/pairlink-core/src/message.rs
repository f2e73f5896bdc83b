//! Wire protocol: one JSON object per WebSocket text frame.
//!
//! Inbound (client → relay):
//!   {"type":"registration"|"hello", "id": "<identity>"}
//!   {"type":"signal", "id": "<identity>", "to": "<identity>", "data": {...}}
//!   {"type":"offer"|"answer"|"candidate"|"offer_request", ...}
//!
//! Outbound (relay → client):
//!   {"type":"signal", "from": "<identity>", "data": {...}}
//!   {"type":"remote-peer-online"} / {"type":"remote-peer-offline"}
//!   bare signals, forwarded byte-for-byte
//!
//! Bare signals ignore any `to` field. Envelope payloads are opaque: a `data`
//! object whose `type` is not a known handshake kind is still relayed.

use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::RelayError;

/// Handshake payload kinds the relay recognises. Payloads stay opaque.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    Offer,
    Answer,
    Candidate,
    OfferRequest,
}

impl SignalKind {
    pub fn from_type(value: &str) -> Option<Self> {
        match value {
            "offer" => Some(Self::Offer),
            "answer" => Some(Self::Answer),
            "candidate" => Some(Self::Candidate),
            "offer_request" => Some(Self::OfferRequest),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Offer => "offer",
            Self::Answer => "answer",
            Self::Candidate => "candidate",
            Self::OfferRequest => "offer_request",
        }
    }
}

/// How a signal reached the relay, which decides how it leaves.
#[derive(Debug, Clone, PartialEq)]
pub enum SignalForm {
    /// Bare `offer`/`answer`/... frame. Forwarded verbatim.
    Bare { raw: String },
    /// `signal` envelope. `data` is re-wrapped with the sender's identity.
    Envelope { data: Value },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignalMessage {
    /// `None` for envelopes whose payload carries no recognised `type`.
    pub kind: Option<SignalKind>,
    /// Identity the client claims in `id`. Routing uses the bound identity.
    pub claimed_sender: Option<String>,
    /// Explicit destination from `to`.
    pub destination: Option<String>,
    pub form: SignalForm,
}

impl SignalMessage {
    /// Frame delivered to the destination connection.
    pub fn outbound_frame(&self, from: &str) -> String {
        match &self.form {
            SignalForm::Bare { raw } => raw.clone(),
            SignalForm::Envelope { data } => json!({
                "type": "signal",
                "from": from,
                "data": data,
            })
            .to_string(),
        }
    }

    pub fn kind_str(&self) -> &'static str {
        self.kind.map(|k| k.as_str()).unwrap_or("opaque")
    }
}

/// A classified inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Registration { identity: String },
    Signal(SignalMessage),
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    to: Option<Value>,
    #[serde(default)]
    data: Option<Value>,
}

/// Non-empty string field, anything else counts as absent.
fn identity_field(value: Option<Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        _ => None,
    }
}

impl Inbound {
    /// Parse and classify a raw text frame.
    pub fn parse(raw: &str) -> Result<Self, RelayError> {
        let envelope: Envelope = serde_json::from_str(raw)?;

        match envelope.kind.as_str() {
            "registration" | "hello" => identity_field(envelope.id)
                .map(|identity| Inbound::Registration { identity })
                .ok_or(RelayError::InvalidRegistration),

            "signal" => {
                let data = match envelope.data {
                    Some(Value::Null) | None => {
                        return Err(RelayError::Parse("signal without data".to_string()))
                    }
                    Some(d) => d,
                };
                let kind = data
                    .get("type")
                    .and_then(Value::as_str)
                    .and_then(SignalKind::from_type);
                Ok(Inbound::Signal(SignalMessage {
                    kind,
                    claimed_sender: identity_field(envelope.id),
                    destination: identity_field(envelope.to),
                    form: SignalForm::Envelope { data },
                }))
            }

            other => match SignalKind::from_type(other) {
                Some(kind) => Ok(Inbound::Signal(SignalMessage {
                    kind: Some(kind),
                    claimed_sender: identity_field(envelope.id),
                    // Bare frames always go to the paired counterpart.
                    destination: None,
                    form: SignalForm::Bare {
                        raw: raw.to_string(),
                    },
                })),
                None => Err(RelayError::UnknownMessageType(other.to_string())),
            },
        }
    }
}

/// Counterpart status pushed to a registered client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Online,
    Offline,
}

impl Presence {
    pub fn type_str(&self) -> &'static str {
        match self {
            Presence::Online => "remote-peer-online",
            Presence::Offline => "remote-peer-offline",
        }
    }

    pub fn frame(&self) -> String {
        json!({ "type": self.type_str() }).to_string()
    }
}
