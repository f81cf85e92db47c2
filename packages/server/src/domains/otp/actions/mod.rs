// OTP actions - the issue and verify flows
mod issue_otp;
mod verify_otp;

pub use issue_otp::{issue_otp, IssuedOtp};
pub use verify_otp::{verify_otp, VerifiedOtp};

/// Treat blank strings from request bodies as absent.
fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
