//! Mapping of domain errors onto HTTP responses.
//!
//! Every error body has the shape `{"error": <message>, "code": <ErrorCode>}`.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::common::ErrorCode;
use crate::domains::connection::ConnectionError;
use crate::domains::otp::OtpError;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }
}

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::NotConnected => StatusCode::SERVICE_UNAVAILABLE,
        ErrorCode::DeliveryFailed => StatusCode::BAD_GATEWAY,
        ErrorCode::MissingPhone
        | ErrorCode::MissingOtp
        | ErrorCode::MissingIdentifier
        | ErrorCode::InvalidOtp
        | ErrorCode::InvalidRequest => StatusCode::BAD_REQUEST,
        ErrorCode::OtpNotFound => StatusCode::NOT_FOUND,
        ErrorCode::OtpExpired => StatusCode::GONE,
        ErrorCode::OtpAlreadyVerified => StatusCode::CONFLICT,
        ErrorCode::Timeout => StatusCode::REQUEST_TIMEOUT,
        ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<OtpError> for ApiError {
    fn from(err: OtpError) -> Self {
        let code = err.code();
        Self::new(status_for(code), code, err.to_string())
    }
}

impl From<ConnectionError> for ApiError {
    fn from(err: ConnectionError) -> Self {
        let code = err.code();
        Self::new(status_for(code), code, err.to_string())
    }
}

/// Unreadable bodies keep axum's status (400, 415 or 422) but use the API error shape.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(
            rejection.status(),
            ErrorCode::InvalidRequest,
            rejection.body_text(),
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.message,
            "code": self.code,
        }));
        (self.status, body).into_response()
    }
}
