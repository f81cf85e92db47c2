use thiserror::Error;
use uuid::Uuid;

use crate::common::ErrorCode;
use crate::domains::connection::ConnectionError;
use crate::kernel::DeliveryError;

/// Errors from issuing or verifying an OTP
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OtpError {
    #[error("WhatsApp client is not connected")]
    NotConnected,

    #[error("Failed to send OTP: {0}")]
    DeliveryFailed(DeliveryError),

    #[error("Phone number is required")]
    MissingAddress,

    #[error("OTP is required")]
    MissingCode,

    #[error("Either otpId or phoneNumber is required")]
    MissingIdentifier,

    #[error("OTP not found")]
    NotFound,

    #[error("OTP has expired")]
    Expired,

    #[error("OTP has already been verified")]
    AlreadyConsumed,

    #[error("Invalid OTP")]
    CodeMismatch,

    #[error("Timed out waiting for the WhatsApp session")]
    Timeout,

    #[error("OTP record {0} already exists")]
    DuplicateId(Uuid),
}

impl OtpError {
    pub fn code(&self) -> ErrorCode {
        match self {
            OtpError::NotConnected => ErrorCode::NotConnected,
            OtpError::DeliveryFailed(_) => ErrorCode::DeliveryFailed,
            OtpError::MissingAddress => ErrorCode::MissingPhone,
            OtpError::MissingCode => ErrorCode::MissingOtp,
            OtpError::MissingIdentifier => ErrorCode::MissingIdentifier,
            OtpError::NotFound => ErrorCode::OtpNotFound,
            OtpError::Expired => ErrorCode::OtpExpired,
            OtpError::AlreadyConsumed => ErrorCode::OtpAlreadyVerified,
            OtpError::CodeMismatch => ErrorCode::InvalidOtp,
            OtpError::Timeout => ErrorCode::Timeout,
            OtpError::DuplicateId(_) => ErrorCode::InternalError,
        }
    }
}

impl From<ConnectionError> for OtpError {
    fn from(err: ConnectionError) -> Self {
        match err {
            ConnectionError::NotConnected => OtpError::NotConnected,
            ConnectionError::DeliveryFailed(e) => OtpError::DeliveryFailed(e),
            ConnectionError::Timeout => OtpError::Timeout,
        }
    }
}
