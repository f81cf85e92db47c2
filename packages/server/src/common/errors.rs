use serde::Serialize;

/// Stable machine-checkable error codes surfaced to API clients.
///
/// The string forms are part of the external contract: clients branch on
/// them, so variants may be added but existing strings never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NotConnected,
    DeliveryFailed,
    MissingPhone,
    MissingOtp,
    MissingIdentifier,
    OtpNotFound,
    OtpExpired,
    OtpAlreadyVerified,
    InvalidOtp,
    Timeout,
    InvalidRequest,
    InternalError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::NotConnected => "NOT_CONNECTED",
            ErrorCode::DeliveryFailed => "DELIVERY_FAILED",
            ErrorCode::MissingPhone => "MISSING_PHONE",
            ErrorCode::MissingOtp => "MISSING_OTP",
            ErrorCode::MissingIdentifier => "MISSING_IDENTIFIER",
            ErrorCode::OtpNotFound => "OTP_NOT_FOUND",
            ErrorCode::OtpExpired => "OTP_EXPIRED",
            ErrorCode::OtpAlreadyVerified => "OTP_ALREADY_VERIFIED",
            ErrorCode::InvalidOtp => "INVALID_OTP",
            ErrorCode::Timeout => "TIMEOUT",
            ErrorCode::InvalidRequest => "INVALID_REQUEST",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
