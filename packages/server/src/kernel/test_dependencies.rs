// TestDependencies - mock implementations for testing
//
// Provides mock services that can be injected into OtpService for tests.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use futures::channel::mpsc;
use futures::StreamExt;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;

use super::{
    BaseClock, BaseCodeGenerator, BaseMessagingTransport, ClientIdentity, DeliveryError,
    PairingChallenge, ServerDeps, SessionCredentials, TransportEvent, TransportEventStream,
};
use crate::domains::connection::AddressRules;
use crate::domains::otp::{OtpService, OtpSettings};

// =============================================================================
// Mock Transport
// =============================================================================

/// A message handed to the transport for delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveredMessage {
    pub address: String,
    pub text: String,
}

/// Scripted transport: tests push lifecycle events into the live session.
pub struct MockTransport {
    on_begin: Mutex<Vec<TransportEvent>>,
    start_error: Mutex<Option<DeliveryError>>,
    delivery_error: Mutex<Option<DeliveryError>>,
    sessions: Mutex<Vec<mpsc::UnboundedSender<TransportEvent>>>,
    credentials_seen: Mutex<Vec<Option<SessionCredentials>>>,
    deliveries: Mutex<Vec<DeliveredMessage>>,
    end_calls: Mutex<usize>,
    teardown_delay: Mutex<StdDuration>,
    lifecycle: Mutex<Vec<&'static str>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            on_begin: Mutex::new(Vec::new()),
            start_error: Mutex::new(None),
            delivery_error: Mutex::new(None),
            sessions: Mutex::new(Vec::new()),
            credentials_seen: Mutex::new(Vec::new()),
            deliveries: Mutex::new(Vec::new()),
            end_calls: Mutex::new(0),
            teardown_delay: Mutex::new(StdDuration::ZERO),
            lifecycle: Mutex::new(Vec::new()),
        }
    }

    /// Every new session authorizes immediately (persisted credentials valid).
    pub fn authorizing(self, identity: ClientIdentity) -> Self {
        self.on_begin
            .lock()
            .unwrap()
            .push(TransportEvent::Authorized(identity));
        self
    }

    /// Every new session immediately asks for pairing with `challenge`.
    pub fn pairing(self, challenge: &str) -> Self {
        self.on_begin
            .lock()
            .unwrap()
            .push(TransportEvent::PairingRequired(PairingChallenge(
                challenge.to_string(),
            )));
        self
    }

    /// `begin_session` fails outright.
    pub fn failing_start(self, error: DeliveryError) -> Self {
        *self.start_error.lock().unwrap() = Some(error);
        self
    }

    /// `end_session` waits `delay` before it completes.
    pub fn slow_teardown(self, delay: StdDuration) -> Self {
        *self.teardown_delay.lock().unwrap() = delay;
        self
    }

    /// Make every subsequent delivery fail (or succeed again with `None`).
    pub fn fail_deliveries(&self, error: Option<DeliveryError>) {
        *self.delivery_error.lock().unwrap() = error;
    }

    /// Push an event into the most recent session. Returns false if none is open.
    pub fn emit(&self, event: TransportEvent) -> bool {
        self.sessions
            .lock()
            .unwrap()
            .last()
            .map(|tx| tx.unbounded_send(event).is_ok())
            .unwrap_or(false)
    }

    /// Close the event stream of every session.
    pub fn close_sessions(&self) {
        self.sessions.lock().unwrap().clear();
    }

    /// How many times `begin_session` was called
    pub fn begin_calls(&self) -> usize {
        self.credentials_seen.lock().unwrap().len()
    }

    /// Credentials passed to each `begin_session` call
    pub fn credentials_seen(&self) -> Vec<Option<SessionCredentials>> {
        self.credentials_seen.lock().unwrap().clone()
    }

    pub fn end_calls(&self) -> usize {
        *self.end_calls.lock().unwrap()
    }

    /// Completed `begin_session`/`end_session` calls, in order: "begin" or "end".
    pub fn lifecycle_calls(&self) -> Vec<&'static str> {
        self.lifecycle.lock().unwrap().clone()
    }

    /// Get all delivered messages
    pub fn deliveries(&self) -> Vec<DeliveredMessage> {
        self.deliveries.lock().unwrap().clone()
    }

    /// Text of the last message delivered to `address`
    pub fn last_message_to(&self, address: &str) -> Option<String> {
        self.deliveries
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|m| m.address == address)
            .map(|m| m.text.clone())
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseMessagingTransport for MockTransport {
    async fn begin_session(
        &self,
        credentials: Option<&SessionCredentials>,
    ) -> Result<TransportEventStream, DeliveryError> {
        self.credentials_seen
            .lock()
            .unwrap()
            .push(credentials.cloned());
        self.lifecycle.lock().unwrap().push("begin");

        if let Some(error) = self.start_error.lock().unwrap().clone() {
            return Err(error);
        }

        let (tx, rx) = mpsc::unbounded();
        for event in self.on_begin.lock().unwrap().iter() {
            let _ = tx.unbounded_send(event.clone());
        }
        self.sessions.lock().unwrap().push(tx);
        Ok(rx.boxed())
    }

    async fn deliver(&self, address: &str, text: &str) -> Result<(), DeliveryError> {
        if let Some(error) = self.delivery_error.lock().unwrap().clone() {
            return Err(error);
        }
        self.deliveries.lock().unwrap().push(DeliveredMessage {
            address: address.to_string(),
            text: text.to_string(),
        });
        Ok(())
    }

    async fn end_session(&self) {
        let delay = *self.teardown_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        *self.end_calls.lock().unwrap() += 1;
        self.lifecycle.lock().unwrap().push("end");
    }
}

// =============================================================================
// Mock Clock
// =============================================================================

/// Manually driven clock
pub struct MockClock {
    now: Mutex<DateTime<Utc>>,
}

impl MockClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock().unwrap() += by;
    }
}

impl BaseClock for MockClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

// =============================================================================
// Sequence Code Generator
// =============================================================================

/// Hands out queued codes, then falls back to a fixed one
pub struct SequenceCodeGenerator {
    codes: Mutex<VecDeque<String>>,
    fallback: String,
}

impl SequenceCodeGenerator {
    pub fn new(codes: &[&str]) -> Self {
        Self {
            codes: Mutex::new(codes.iter().map(|c| c.to_string()).collect()),
            fallback: "123456".to_string(),
        }
    }
}

impl BaseCodeGenerator for SequenceCodeGenerator {
    fn generate(&self) -> String {
        self.codes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

// =============================================================================
// TestDependencies - Builder for test dependencies
// =============================================================================

#[derive(Clone)]
pub struct TestDependencies {
    pub transport: Arc<MockTransport>,
    pub clock: Arc<MockClock>,
    pub codes: Arc<SequenceCodeGenerator>,
    pub credentials: Option<SessionCredentials>,
    pub rules: AddressRules,
    pub settings: OtpSettings,
}

impl TestDependencies {
    pub fn new() -> Self {
        Self {
            transport: Arc::new(MockTransport::new()),
            clock: Arc::new(MockClock::new(Utc::now())),
            codes: Arc::new(SequenceCodeGenerator::new(&[])),
            credentials: Some(SessionCredentials("test-client".to_string())),
            rules: AddressRules::default(),
            settings: OtpSettings::default(),
        }
    }

    /// Set a mock transport
    pub fn mock_transport(mut self, transport: MockTransport) -> Self {
        self.transport = Arc::new(transport);
        self
    }

    /// Start the clock at a fixed instant
    pub fn starting_at(mut self, start: DateTime<Utc>) -> Self {
        self.clock = Arc::new(MockClock::new(start));
        self
    }

    /// Queue the codes the generator hands out
    pub fn with_codes(mut self, codes: &[&str]) -> Self {
        self.codes = Arc::new(SequenceCodeGenerator::new(codes));
        self
    }

    pub fn with_settings(mut self, settings: OtpSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn build_deps(&self) -> ServerDeps {
        ServerDeps::new(self.transport.clone(), self.clock.clone(), self.codes.clone())
    }

    /// Convert into an OtpService for testing
    pub fn build_service(&self) -> OtpService {
        OtpService::from_deps(
            self.build_deps(),
            self.credentials.clone(),
            self.rules.clone(),
            self.settings.clone(),
        )
    }
}

impl Default for TestDependencies {
    fn default() -> Self {
        Self::new()
    }
}
