pub mod session;

pub use session::{ConnectionSession, ConnectionState};
