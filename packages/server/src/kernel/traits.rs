// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// The connection and otp domains are written against these traits so that the
// transport, the clock and the code source can be swapped in tests.
//
// Naming convention: Base* for trait names (e.g., BaseMessagingTransport)

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use serde::Serialize;

// =============================================================================
// Messaging Transport Trait (Infrastructure - chat channel session + delivery)
// =============================================================================

/// Opaque handle to a previously persisted authorization.
///
/// The core never interprets it; the transport uses it to locate whatever
/// credential blob it stored during an earlier pairing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCredentials(pub String);

/// Short-lived token the operator presents to the companion device (a QR payload).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PairingChallenge(pub String);

/// The authorized account behind a ready session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientIdentity {
    pub phone_number: String,
    pub name: String,
}

/// Asynchronous events emitted by a transport session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// No valid prior authorization; present this challenge to pair.
    /// Re-emitted with a fresh token until pairing completes.
    PairingRequired(PairingChallenge),
    /// The session is authorized and can deliver messages.
    Authorized(ClientIdentity),
    /// The network rejected the authorization.
    AuthFailure(String),
    /// The link to the network was lost.
    LinkDropped(String),
}

pub type TransportEventStream = BoxStream<'static, TransportEvent>;

/// Why a delivery (or session bootstrap) failed, tagged by kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("transport error: {0}")]
    Transport(String),
}

impl DeliveryError {
    pub fn kind(&self) -> &'static str {
        match self {
            DeliveryError::InvalidAddress(_) => "invalid_address",
            DeliveryError::Transport(_) => "transport",
        }
    }
}

#[async_trait]
pub trait BaseMessagingTransport: Send + Sync {
    /// Start a session, reusing persisted credentials when present.
    ///
    /// The returned stream carries every lifecycle event of this session.
    async fn begin_session(
        &self,
        credentials: Option<&SessionCredentials>,
    ) -> Result<TransportEventStream, DeliveryError>;

    /// Deliver `text` to a normalized chat address.
    async fn deliver(&self, address: &str, text: &str) -> Result<(), DeliveryError>;

    /// Tear down the live session, if any.
    async fn end_session(&self) {}
}

// =============================================================================
// Clock Trait (Infrastructure)
// =============================================================================

pub trait BaseClock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

// =============================================================================
// Code Generator Trait (Infrastructure - randomness)
// =============================================================================

pub trait BaseCodeGenerator: Send + Sync {
    /// Produce a fresh 6-digit numeric code.
    fn generate(&self) -> String;
}
