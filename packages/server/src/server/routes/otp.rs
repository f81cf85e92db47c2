//! OTP endpoints.
//!
//! POST /api/send-otp    `{phoneNumber, message?}`
//! POST /api/verify-otp  `{otpId?, otp, phoneNumber?}`

use axum::{
    extract::{rejection::JsonRejection, Extension},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::ApiError;
use crate::server::app::AxumAppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendOtpRequest {
    pub phone_number: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendOtpResponse {
    pub message: String,
    pub otp_id: Uuid,
    pub phone_number: String,
    pub expires_in: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOtpRequest {
    pub otp_id: Option<String>,
    pub otp: Option<String>,
    pub phone_number: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOtpResponse {
    pub message: String,
    pub verified: bool,
    pub phone_number: String,
    pub verified_at: DateTime<Utc>,
}

pub async fn send_otp_handler(
    Extension(state): Extension<AxumAppState>,
    payload: Result<Json<SendOtpRequest>, JsonRejection>,
) -> Result<Json<SendOtpResponse>, ApiError> {
    let Json(request) = payload?;
    let issued = state
        .service
        .issue_otp(request.phone_number.as_deref(), request.message.as_deref())
        .await?;

    Ok(Json(SendOtpResponse {
        message: "OTP sent successfully".to_string(),
        otp_id: issued.id,
        phone_number: issued.address.phone_number().to_string(),
        expires_in: issued.expires_in_seconds,
    }))
}

pub async fn verify_otp_handler(
    Extension(state): Extension<AxumAppState>,
    payload: Result<Json<VerifyOtpRequest>, JsonRejection>,
) -> Result<Json<VerifyOtpResponse>, ApiError> {
    let Json(request) = payload?;
    let verified = state
        .service
        .verify_otp(
            request.otp_id.as_deref(),
            request.phone_number.as_deref(),
            request.otp.as_deref(),
        )
        .await?;

    Ok(Json(VerifyOtpResponse {
        message: "OTP verified successfully".to_string(),
        verified: true,
        phone_number: verified.address.phone_number().to_string(),
        verified_at: verified.verified_at,
    }))
}
