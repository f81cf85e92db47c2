use thiserror::Error;

use crate::common::ErrorCode;
use crate::kernel::DeliveryError;

/// Errors surfaced by the connection manager
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    #[error("WhatsApp client is not connected")]
    NotConnected,

    #[error("Failed to deliver message: {0}")]
    DeliveryFailed(#[from] DeliveryError),

    #[error("Timed out waiting for the WhatsApp session")]
    Timeout,
}

impl ConnectionError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ConnectionError::NotConnected => ErrorCode::NotConnected,
            ConnectionError::DeliveryFailed(_) => ErrorCode::DeliveryFailed,
            ConnectionError::Timeout => ErrorCode::Timeout,
        }
    }
}
