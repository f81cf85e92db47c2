use serde::Serialize;

use crate::kernel::{ClientIdentity, PairingChallenge};

/// Coarse lifecycle state, without the per-state payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Idle,
    Initializing,
    AwaitingPairing,
    Ready,
    Failed,
}

/// Snapshot of the process-wide messaging session.
///
/// The pairing challenge exists only while awaiting pairing and the identity
/// only while ready; the variants carry them so no other state can hold one.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConnectionSession {
    #[default]
    Idle,
    Initializing,
    AwaitingPairing {
        challenge: PairingChallenge,
    },
    Ready {
        identity: ClientIdentity,
    },
    Failed {
        reason: String,
    },
}

impl ConnectionSession {
    pub fn state(&self) -> ConnectionState {
        match self {
            ConnectionSession::Idle => ConnectionState::Idle,
            ConnectionSession::Initializing => ConnectionState::Initializing,
            ConnectionSession::AwaitingPairing { .. } => ConnectionState::AwaitingPairing,
            ConnectionSession::Ready { .. } => ConnectionState::Ready,
            ConnectionSession::Failed { .. } => ConnectionState::Failed,
        }
    }

    pub fn pairing_challenge(&self) -> Option<&PairingChallenge> {
        match self {
            ConnectionSession::AwaitingPairing { challenge } => Some(challenge),
            _ => None,
        }
    }

    pub fn identity(&self) -> Option<&ClientIdentity> {
        match self {
            ConnectionSession::Ready { identity } => Some(identity),
            _ => None,
        }
    }

    pub fn failure_reason(&self) -> Option<&str> {
        match self {
            ConnectionSession::Failed { reason } => Some(reason),
            _ => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, ConnectionSession::Ready { .. })
    }

    /// A session is live while a transport session is bootstrapping or running.
    pub fn is_live(&self) -> bool {
        matches!(
            self,
            ConnectionSession::Initializing
                | ConnectionSession::AwaitingPairing { .. }
                | ConnectionSession::Ready { .. }
        )
    }

    /// True once a connect attempt has produced an answer for the caller:
    /// ready, a challenge to scan, or a failure.
    pub fn is_settled(&self) -> bool {
        matches!(
            self,
            ConnectionSession::AwaitingPairing { .. }
                | ConnectionSession::Ready { .. }
                | ConnectionSession::Failed { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_only_in_matching_state() {
        let pairing = ConnectionSession::AwaitingPairing {
            challenge: PairingChallenge("qr-1".to_string()),
        };
        assert_eq!(pairing.state(), ConnectionState::AwaitingPairing);
        assert!(pairing.pairing_challenge().is_some());
        assert!(pairing.identity().is_none());

        let ready = ConnectionSession::Ready {
            identity: ClientIdentity {
                phone_number: "15550001111".to_string(),
                name: "OTP Bot".to_string(),
            },
        };
        assert!(ready.is_ready());
        assert!(ready.pairing_challenge().is_none());
        assert_eq!(ready.identity().map(|i| i.name.as_str()), Some("OTP Bot"));
    }

    #[test]
    fn test_settled_states() {
        assert!(!ConnectionSession::Idle.is_settled());
        assert!(!ConnectionSession::Initializing.is_settled());
        assert!(ConnectionSession::Failed {
            reason: "auth".to_string()
        }
        .is_settled());
    }
}
