// WhatsApp OTP Service - Core
//
// Issues one-time passcodes over a chat-messaging channel and verifies them.
// The connection to the channel is owned by the connection domain, OTP records
// by the otp domain; the server module is the HTTP surface over both.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
