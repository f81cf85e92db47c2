//! Connection domain - lifecycle of the single outbound messaging session.
//!
//! ```text
//!            connect()                 pairing_required
//!   Idle ─────────────► Initializing ─────────────────► AwaitingPairing
//!    ▲                      │   │                           │   │
//!    │ reset()/disconnect() │   └──── authorized ────┐      │   │ authorized
//!    │                      │ auth_failure           ▼      │   ▼
//!  Failed ◄─────────────────┴──────────────────── Ready ◄───┘ (pairing done)
//!           auth_failure / link_dropped
//! ```
//!
//! The machine decides, the manager executes. Transport events reach the
//! machine only through the manager's per-session event task.

pub mod address;
pub mod commands;
pub mod errors;
pub mod events;
pub mod machines;
pub mod manager;
pub mod models;

pub use address::{normalize_address, AddressRules, ChatAddress};
pub use commands::ConnectionCommand;
pub use errors::ConnectionError;
pub use events::ConnectionEvent;
pub use machines::ConnectionMachine;
pub use manager::{ConnectionManager, DeliveryReceipt};
pub use models::{ConnectionSession, ConnectionState};
