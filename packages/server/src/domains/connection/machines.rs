use tracing::debug;

use super::commands::ConnectionCommand;
use super::events::ConnectionEvent;
use super::models::ConnectionSession;
use crate::kernel::TransportEvent;

/// Connection machine - owns the session and decides transitions.
///
/// Pure: no IO, no async. Each bootstrap bumps `epoch`; transport facts from
/// any other epoch belong to a discarded session and are ignored.
#[derive(Debug, Default)]
pub struct ConnectionMachine {
    session: ConnectionSession,
    epoch: u64,
}

impl ConnectionMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session(&self) -> &ConnectionSession {
        &self.session
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn decide(&mut self, event: &ConnectionEvent) -> Option<ConnectionCommand> {
        match event {
            ConnectionEvent::ConnectRequested => match self.session {
                ConnectionSession::Idle => {
                    self.epoch += 1;
                    self.session = ConnectionSession::Initializing;
                    Some(ConnectionCommand::BeginSession { epoch: self.epoch })
                }
                // Connecting after a failure implies the reset.
                ConnectionSession::Failed { .. } => {
                    self.epoch += 1;
                    self.session = ConnectionSession::Initializing;
                    Some(ConnectionCommand::RestartSession { epoch: self.epoch })
                }
                // Already live: never re-initialize a running session.
                _ => None,
            },

            ConnectionEvent::ResetRequested => match self.session {
                ConnectionSession::Failed { .. } => {
                    self.epoch += 1;
                    self.session = ConnectionSession::Idle;
                    Some(ConnectionCommand::EndSession)
                }
                _ => None,
            },

            ConnectionEvent::DisconnectRequested => match self.session {
                ConnectionSession::Idle => None,
                _ => {
                    self.epoch += 1;
                    self.session = ConnectionSession::Idle;
                    Some(ConnectionCommand::EndSession)
                }
            },

            ConnectionEvent::Transport { epoch, event } => {
                if *epoch != self.epoch {
                    debug!(epoch, current = self.epoch, "Dropping event from stale session");
                    return None;
                }
                self.apply_transport(event);
                None
            }

            ConnectionEvent::SessionStartFailed { epoch, reason } => {
                if *epoch == self.epoch && self.is_bootstrapping() {
                    self.session = ConnectionSession::Failed {
                        reason: reason.clone(),
                    };
                }
                None
            }

            ConnectionEvent::StreamEnded { epoch } => {
                if *epoch == self.epoch && self.is_bootstrapping() {
                    self.session = ConnectionSession::Failed {
                        reason: "session ended before authorization".to_string(),
                    };
                }
                None
            }
        }
    }

    fn apply_transport(&mut self, event: &TransportEvent) {
        let bootstrapping = self.is_bootstrapping();
        match event {
            TransportEvent::PairingRequired(challenge) if bootstrapping => {
                self.session = ConnectionSession::AwaitingPairing {
                    challenge: challenge.clone(),
                };
            }
            TransportEvent::Authorized(identity) if bootstrapping => {
                self.session = ConnectionSession::Ready {
                    identity: identity.clone(),
                };
            }
            TransportEvent::AuthFailure(reason) if bootstrapping => {
                self.session = ConnectionSession::Failed {
                    reason: format!("authentication failed: {}", reason),
                };
            }
            TransportEvent::LinkDropped(reason) if self.session.is_live() => {
                self.session = ConnectionSession::Failed {
                    reason: format!("link dropped: {}", reason),
                };
            }
            other => {
                debug!(state = ?self.session.state(), event = ?other, "Ignoring transport event");
            }
        }
    }

    fn is_bootstrapping(&self) -> bool {
        matches!(
            self.session,
            ConnectionSession::Initializing | ConnectionSession::AwaitingPairing { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::connection::ConnectionState;
    use crate::kernel::{ClientIdentity, PairingChallenge};

    fn identity() -> ClientIdentity {
        ClientIdentity {
            phone_number: "15550001111".to_string(),
            name: "OTP Bot".to_string(),
        }
    }

    fn transport(machine: &ConnectionMachine, event: TransportEvent) -> ConnectionEvent {
        ConnectionEvent::Transport {
            epoch: machine.epoch(),
            event,
        }
    }

    #[test]
    fn test_connect_from_idle_begins_one_session() {
        let mut machine = ConnectionMachine::new();

        let cmd = machine.decide(&ConnectionEvent::ConnectRequested);
        assert_eq!(cmd, Some(ConnectionCommand::BeginSession { epoch: 1 }));
        assert_eq!(machine.session().state(), ConnectionState::Initializing);

        // Second connect while initializing is a no-op
        assert_eq!(machine.decide(&ConnectionEvent::ConnectRequested), None);
        assert_eq!(machine.epoch(), 1);
    }

    #[test]
    fn test_persisted_authorization_goes_straight_to_ready() {
        let mut machine = ConnectionMachine::new();
        machine.decide(&ConnectionEvent::ConnectRequested);

        let event = transport(&machine, TransportEvent::Authorized(identity()));
        machine.decide(&event);

        assert_eq!(machine.session().identity(), Some(&identity()));
        assert_eq!(machine.decide(&ConnectionEvent::ConnectRequested), None);
    }

    #[test]
    fn test_pairing_flow_with_challenge_rotation() {
        let mut machine = ConnectionMachine::new();
        machine.decide(&ConnectionEvent::ConnectRequested);

        let first = transport(
            &machine,
            TransportEvent::PairingRequired(PairingChallenge("qr-1".to_string())),
        );
        machine.decide(&first);
        assert_eq!(
            machine.session().pairing_challenge(),
            Some(&PairingChallenge("qr-1".to_string()))
        );

        let rotated = transport(
            &machine,
            TransportEvent::PairingRequired(PairingChallenge("qr-2".to_string())),
        );
        machine.decide(&rotated);
        assert_eq!(
            machine.session().pairing_challenge(),
            Some(&PairingChallenge("qr-2".to_string()))
        );

        let authorized = transport(&machine, TransportEvent::Authorized(identity()));
        machine.decide(&authorized);
        assert!(machine.session().is_ready());
        assert!(machine.session().pairing_challenge().is_none());
    }

    #[test]
    fn test_auth_failure_is_terminal_until_reset() {
        let mut machine = ConnectionMachine::new();
        machine.decide(&ConnectionEvent::ConnectRequested);
        let failure = transport(&machine, TransportEvent::AuthFailure("bad creds".to_string()));
        machine.decide(&failure);
        assert_eq!(machine.session().state(), ConnectionState::Failed);

        // Late transport events do not revive a failed session
        let late = transport(&machine, TransportEvent::Authorized(identity()));
        machine.decide(&late);
        assert_eq!(machine.session().state(), ConnectionState::Failed);

        assert_eq!(
            machine.decide(&ConnectionEvent::ResetRequested),
            Some(ConnectionCommand::EndSession)
        );
        assert_eq!(machine.session().state(), ConnectionState::Idle);
    }

    #[test]
    fn test_link_drop_fails_ready_session() {
        let mut machine = ConnectionMachine::new();
        machine.decide(&ConnectionEvent::ConnectRequested);
        let authorized = transport(&machine, TransportEvent::Authorized(identity()));
        machine.decide(&authorized);

        let dropped = transport(&machine, TransportEvent::LinkDropped("NAVIGATION".to_string()));
        machine.decide(&dropped);

        assert_eq!(
            machine.session().failure_reason(),
            Some("link dropped: NAVIGATION")
        );
    }

    #[test]
    fn test_connect_after_failure_restarts_with_new_epoch() {
        let mut machine = ConnectionMachine::new();
        machine.decide(&ConnectionEvent::ConnectRequested);
        let failure = transport(&machine, TransportEvent::AuthFailure("x".to_string()));
        machine.decide(&failure);

        let cmd = machine.decide(&ConnectionEvent::ConnectRequested);
        assert_eq!(cmd, Some(ConnectionCommand::RestartSession { epoch: 2 }));
        assert_eq!(machine.session().state(), ConnectionState::Initializing);
    }

    #[test]
    fn test_stale_epoch_events_are_dropped() {
        let mut machine = ConnectionMachine::new();
        machine.decide(&ConnectionEvent::ConnectRequested);
        machine.decide(&ConnectionEvent::DisconnectRequested);
        machine.decide(&ConnectionEvent::ConnectRequested);
        assert_eq!(machine.epoch(), 3);

        machine.decide(&ConnectionEvent::Transport {
            epoch: 1,
            event: TransportEvent::Authorized(identity()),
        });
        assert_eq!(machine.session().state(), ConnectionState::Initializing);
    }

    #[test]
    fn test_stream_end_before_authorization_fails() {
        let mut machine = ConnectionMachine::new();
        machine.decide(&ConnectionEvent::ConnectRequested);
        machine.decide(&ConnectionEvent::StreamEnded { epoch: 1 });
        assert_eq!(machine.session().state(), ConnectionState::Failed);
    }

    #[test]
    fn test_stream_end_after_authorization_keeps_ready() {
        let mut machine = ConnectionMachine::new();
        machine.decide(&ConnectionEvent::ConnectRequested);
        let authorized = transport(&machine, TransportEvent::Authorized(identity()));
        machine.decide(&authorized);
        machine.decide(&ConnectionEvent::StreamEnded { epoch: 1 });
        assert!(machine.session().is_ready());
    }

    #[test]
    fn test_session_start_failure() {
        let mut machine = ConnectionMachine::new();
        machine.decide(&ConnectionEvent::ConnectRequested);
        machine.decide(&ConnectionEvent::SessionStartFailed {
            epoch: 1,
            reason: "transport error: dns".to_string(),
        });
        assert_eq!(
            machine.session().failure_reason(),
            Some("transport error: dns")
        );
    }

    #[test]
    fn test_reset_only_applies_to_failed() {
        let mut machine = ConnectionMachine::new();
        assert_eq!(machine.decide(&ConnectionEvent::ResetRequested), None);
        machine.decide(&ConnectionEvent::ConnectRequested);
        assert_eq!(machine.decide(&ConnectionEvent::ResetRequested), None);
        assert_eq!(machine.session().state(), ConnectionState::Initializing);
    }

    #[test]
    fn test_disconnect_from_idle_is_noop() {
        let mut machine = ConnectionMachine::new();
        assert_eq!(machine.decide(&ConnectionEvent::DisconnectRequested), None);
        assert_eq!(machine.epoch(), 0);
    }
}
