use crate::kernel::TransportEvent;

/// Connection events - everything the connection machine reacts to.
///
/// Caller requests and transport facts share one queue so that the machine
/// sees a single, serial history. Transport facts carry the epoch of the
/// session that produced them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    ConnectRequested,
    ResetRequested,
    DisconnectRequested,
    Transport { epoch: u64, event: TransportEvent },
    /// `begin_session` itself returned an error.
    SessionStartFailed { epoch: u64, reason: String },
    /// The session's event stream closed.
    StreamEnded { epoch: u64 },
}
