//! OTP domain - issuing, storing and verifying one-time passcodes.

pub mod actions;
pub mod code;
pub mod errors;
pub mod models;
pub mod service;
pub mod store;

pub use actions::{IssuedOtp, VerifiedOtp};
pub use errors::OtpError;
pub use models::OtpRecord;
pub use service::{OtpService, OtpSettings, OtpStats};
pub use store::{OtpStore, Verified};
