//! Server dependencies (using traits for testability)
//!
//! This module provides the production implementations of the kernel traits and
//! the dependency container handed to the domains at startup.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use rand::Rng;
use std::sync::Arc;
use tracing::{info, warn};
use twilio::{TwilioError, TwilioService};

use crate::kernel::{
    BaseClock, BaseCodeGenerator, BaseMessagingTransport, ClientIdentity, DeliveryError,
    SessionCredentials, TransportEvent, TransportEventStream,
};

// =============================================================================
// TwilioTransport (implements BaseMessagingTransport over the WhatsApp channel)
// =============================================================================

/// Wrapper around TwilioService that implements BaseMessagingTransport.
///
/// Twilio sessions are credential based: there is no pairing step, so a
/// session either authorizes immediately or fails authentication.
pub struct TwilioTransport(pub Arc<TwilioService>);

impl TwilioTransport {
    pub fn new(service: Arc<TwilioService>) -> Self {
        Self(service)
    }
}

#[async_trait]
impl BaseMessagingTransport for TwilioTransport {
    async fn begin_session(
        &self,
        credentials: Option<&SessionCredentials>,
    ) -> Result<TransportEventStream, DeliveryError> {
        if let Some(SessionCredentials(client_id)) = credentials {
            info!(client_id = %client_id, "Starting Twilio session");
        }

        let event = match self.0.fetch_account().await {
            Ok(account) => TransportEvent::Authorized(ClientIdentity {
                phone_number: self.0.sender().trim_start_matches('+').to_string(),
                name: account.friendly_name,
            }),
            Err(e @ TwilioError::Unauthorized { .. }) => TransportEvent::AuthFailure(e.to_string()),
            Err(e) => return Err(DeliveryError::Transport(e.to_string())),
        };

        Ok(stream::iter(vec![event]).boxed())
    }

    async fn deliver(&self, address: &str, text: &str) -> Result<(), DeliveryError> {
        let to = chat_address_to_e164(address);
        match self.0.send_whatsapp_message(&to, text).await {
            Ok(message) => {
                info!(sid = %message.sid, status = %message.status, "WhatsApp message queued");
                Ok(())
            }
            Err(TwilioError::InvalidRecipient { code, message }) => {
                warn!(code, "Twilio rejected recipient {}", to);
                Err(DeliveryError::InvalidAddress(message))
            }
            Err(e) => Err(DeliveryError::Transport(e.to_string())),
        }
    }
}

/// `919876543210@c.us` -> `+919876543210`
fn chat_address_to_e164(address: &str) -> String {
    let local = address.split('@').next().unwrap_or(address);
    format!("+{}", local)
}

// =============================================================================
// System clock and random code generator
// =============================================================================

pub struct SystemClock;

impl BaseClock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Draws codes uniformly from `[100000, 999999]`.
pub struct RandomCodeGenerator;

impl BaseCodeGenerator for RandomCodeGenerator {
    fn generate(&self) -> String {
        rand::thread_rng().gen_range(100_000..=999_999u32).to_string()
    }
}

// =============================================================================
// ServerDeps
// =============================================================================

/// Capabilities the core consumes from its environment
#[derive(Clone)]
pub struct ServerDeps {
    pub transport: Arc<dyn BaseMessagingTransport>,
    pub clock: Arc<dyn BaseClock>,
    pub code_generator: Arc<dyn BaseCodeGenerator>,
}

impl ServerDeps {
    pub fn new(
        transport: Arc<dyn BaseMessagingTransport>,
        clock: Arc<dyn BaseClock>,
        code_generator: Arc<dyn BaseCodeGenerator>,
    ) -> Self {
        Self {
            transport,
            clock,
            code_generator,
        }
    }

    /// Production dependencies: Twilio transport, wall clock, thread RNG.
    pub fn production(twilio: Arc<TwilioService>) -> Self {
        Self::new(
            Arc::new(TwilioTransport::new(twilio)),
            Arc::new(SystemClock),
            Arc::new(RandomCodeGenerator),
        )
    }
}
