// HTTP routes
pub mod error;
pub mod health;
pub mod otp;
pub mod whatsapp;

pub use error::ApiError;
pub use health::*;
pub use otp::*;
pub use whatsapp::*;
