// Business domains
pub mod connection;
pub mod otp;
