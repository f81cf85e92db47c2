/// Connection commands - intents for IO decided by the connection machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionCommand {
    /// Bootstrap a new transport session tagged with `epoch`.
    BeginSession { epoch: u64 },
    /// Tear down the failed session, then bootstrap a new one tagged with `epoch`.
    RestartSession { epoch: u64 },
    /// Tear down the live transport session.
    EndSession,
}
