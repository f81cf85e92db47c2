//! Connection manager - executes the connection machine's decisions.
//!
//! Requests from callers and facts from the transport are fed to the
//! [`ConnectionMachine`] one at a time under a short synchronous lock; the
//! resulting snapshot is published on a `watch` channel. IO (session bootstrap,
//! teardown, delivery) always runs after the lock is released.
//!
//! Lifecycle commands are queued in decision order and executed one at a time
//! by a single worker, so a teardown always completes before the next
//! bootstrap begins.

use futures::StreamExt;
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use super::address::{normalize_address, AddressRules, ChatAddress};
use super::commands::ConnectionCommand;
use super::errors::ConnectionError;
use super::events::ConnectionEvent;
use super::machines::ConnectionMachine;
use super::models::ConnectionSession;
use crate::kernel::{BaseMessagingTransport, SessionCredentials, TransportEventStream};

/// Acknowledgment of a successful delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReceipt {
    pub address: ChatAddress,
}

/// Owner of the single outbound messaging session.
///
/// Cheap to clone; all clones drive the same session.
#[derive(Clone)]
pub struct ConnectionManager {
    inner: Arc<Inner>,
}

struct Inner {
    transport: Arc<dyn BaseMessagingTransport>,
    credentials: Option<SessionCredentials>,
    rules: AddressRules,
    machine: Mutex<ConnectionMachine>,
    snapshots: watch::Sender<ConnectionSession>,
    commands: mpsc::UnboundedSender<ConnectionCommand>,
    // Taken by the first dispatch that produces a command.
    pending_worker: Mutex<Option<mpsc::UnboundedReceiver<ConnectionCommand>>>,
}

impl ConnectionManager {
    pub fn new(
        transport: Arc<dyn BaseMessagingTransport>,
        credentials: Option<SessionCredentials>,
        rules: AddressRules,
    ) -> Self {
        let (snapshots, _) = watch::channel(ConnectionSession::Idle);
        let (commands, worker) = mpsc::unbounded_channel();
        Self {
            inner: Arc::new(Inner {
                transport,
                credentials,
                rules,
                machine: Mutex::new(ConnectionMachine::new()),
                snapshots,
                commands,
                pending_worker: Mutex::new(Some(worker)),
            }),
        }
    }

    /// Normalize a raw address with this manager's rules.
    pub fn normalize(&self, raw: &str) -> ChatAddress {
        normalize_address(raw, &self.inner.rules)
    }

    /// Current session snapshot.
    pub fn status(&self) -> ConnectionSession {
        self.inner.snapshots.borrow().clone()
    }

    /// Subscribe to session snapshots.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionSession> {
        self.inner.snapshots.subscribe()
    }

    /// Start connecting unless a session is already live. Never blocks.
    ///
    /// Must be called from within a tokio runtime.
    pub fn connect(&self) -> ConnectionSession {
        self.dispatch(ConnectionEvent::ConnectRequested);
        self.status()
    }

    /// Connect, then wait until the session is ready, awaiting pairing, or failed.
    pub async fn connect_and_wait(
        &self,
        timeout: Duration,
    ) -> Result<ConnectionSession, ConnectionError> {
        let mut rx = self.subscribe();
        self.connect();

        let settled = tokio::time::timeout(timeout, async {
            rx.wait_for(ConnectionSession::is_settled)
                .await
                .map(|session| session.clone())
        })
        .await;

        match settled {
            Ok(Ok(session)) => Ok(session),
            Ok(Err(_)) | Err(_) => {
                warn!(timeout_secs = timeout.as_secs(), "Timed out waiting for WhatsApp session");
                Err(ConnectionError::Timeout)
            }
        }
    }

    /// Discard a failed session so the next connect starts fresh.
    pub fn reset(&self) -> ConnectionSession {
        self.dispatch(ConnectionEvent::ResetRequested);
        self.status()
    }

    /// Tear down the session from any state.
    pub fn disconnect(&self) -> ConnectionSession {
        self.dispatch(ConnectionEvent::DisconnectRequested);
        self.status()
    }

    /// Deliver `text` to `address` over the ready session.
    pub async fn send(&self, address: &str, text: &str) -> Result<DeliveryReceipt, ConnectionError> {
        if !self.status().is_ready() {
            return Err(ConnectionError::NotConnected);
        }

        let address = self.normalize(address);
        self.inner
            .transport
            .deliver(address.as_str(), text)
            .await
            .map_err(|e| {
                error!(kind = e.kind(), error = %e, "Failed to deliver message to {}", address);
                ConnectionError::DeliveryFailed(e)
            })?;

        Ok(DeliveryReceipt { address })
    }

    /// Feed one event to the machine and execute the resulting command.
    fn dispatch(&self, event: ConnectionEvent) {
        let queued = {
            let mut machine = self
                .inner
                .machine
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let before = machine.session().state();
            let command = machine.decide(&event);
            let session = machine.session().clone();
            let after = session.state();

            if before != after {
                match session.failure_reason() {
                    Some(reason) => {
                        warn!(from = ?before, to = ?after, reason, "WhatsApp session transition")
                    }
                    None => info!(from = ?before, to = ?after, "WhatsApp session transition"),
                }
            }

            // Published and queued under the lock so subscribers and the worker
            // observe transitions in order.
            self.inner.snapshots.send_if_modified(|current| {
                if *current == session {
                    false
                } else {
                    *current = session;
                    true
                }
            });
            if let Some(command) = command {
                if self.inner.commands.send(command).is_err() {
                    error!("Connection lifecycle worker is gone");
                }
                true
            } else {
                false
            }
        };

        if queued {
            self.ensure_worker();
        }
    }

    /// Start the lifecycle worker on first use. Must run inside a tokio runtime.
    fn ensure_worker(&self) {
        let worker = self
            .inner
            .pending_worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(commands) = worker {
            tokio::spawn(run_lifecycle(Arc::downgrade(&self.inner), commands));
        }
    }

    fn current_epoch(&self) -> u64 {
        self.inner
            .machine
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .epoch()
    }

    /// Execute one lifecycle command to completion.
    ///
    /// A bootstrap whose epoch was superseded while queued is skipped; the
    /// command that superseded it is already behind it in the queue.
    async fn execute(&self, command: ConnectionCommand) {
        match command {
            ConnectionCommand::BeginSession { epoch } => self.begin_session(epoch).await,
            ConnectionCommand::RestartSession { epoch } => {
                self.inner.transport.end_session().await;
                self.begin_session(epoch).await;
            }
            ConnectionCommand::EndSession => self.inner.transport.end_session().await,
        }
    }

    async fn begin_session(&self, epoch: u64) {
        if self.current_epoch() != epoch {
            debug!(epoch, "Skipping superseded WhatsApp session bootstrap");
            return;
        }
        info!(epoch, "Bootstrapping WhatsApp session");

        match self
            .inner
            .transport
            .begin_session(self.inner.credentials.as_ref())
            .await
        {
            Ok(events) => {
                let manager = self.clone();
                tokio::spawn(async move { manager.pump_events(epoch, events).await });
            }
            Err(e) => {
                error!(epoch, error = %e, "Failed to start WhatsApp session");
                self.dispatch(ConnectionEvent::SessionStartFailed {
                    epoch,
                    reason: e.to_string(),
                });
            }
        }
    }

    /// Event-handling path for one transport session.
    async fn pump_events(&self, epoch: u64, mut events: TransportEventStream) {
        while let Some(event) = events.next().await {
            if self.current_epoch() != epoch {
                break;
            }
            self.dispatch(ConnectionEvent::Transport { epoch, event });
        }

        self.dispatch(ConnectionEvent::StreamEnded { epoch });
    }
}

/// Single consumer of lifecycle commands.
///
/// Holds only a weak handle; exits once every manager clone is dropped.
async fn run_lifecycle(
    inner: Weak<Inner>,
    mut commands: mpsc::UnboundedReceiver<ConnectionCommand>,
) {
    while let Some(command) = commands.recv().await {
        let Some(inner) = inner.upgrade() else {
            break;
        };
        ConnectionManager { inner }.execute(command).await;
    }
}
