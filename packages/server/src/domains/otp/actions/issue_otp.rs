//! Issue OTP action

use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use super::non_blank;
use crate::domains::connection::ChatAddress;
use crate::domains::otp::code::render_message;
use crate::domains::otp::{OtpError, OtpRecord, OtpService};

/// Result of issuing an OTP
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedOtp {
    pub id: Uuid,
    pub address: ChatAddress,
    pub expires_at: DateTime<Utc>,
    pub expires_in_seconds: i64,
}

/// Generate a code, deliver it over WhatsApp, and record it.
///
/// The record is stored only after delivery succeeds, so a failed send never
/// leaves a valid code behind for a message the user did not get.
pub async fn issue_otp(
    phone_number: Option<&str>,
    message_template: Option<&str>,
    service: &OtpService,
) -> Result<IssuedOtp, OtpError> {
    let phone_number = non_blank(phone_number).ok_or(OtpError::MissingAddress)?;

    if !service.connection().status().is_ready() {
        return Err(OtpError::NotConnected);
    }

    let code = service.deps().code_generator.generate();
    let template =
        non_blank(message_template).unwrap_or(service.settings().default_template.as_str());
    let message = render_message(template, &code);

    let receipt = service.connection().send(phone_number, &message).await?;

    let record = OtpRecord::new(
        receipt.address,
        code,
        service.deps().clock.now(),
        service.settings().ttl,
    );
    let issued = IssuedOtp {
        id: record.id,
        address: record.subject_address.clone(),
        expires_at: record.expires_at,
        expires_in_seconds: (record.expires_at - record.created_at).num_seconds(),
    };
    service.store().put(record).await?;

    info!(otp_id = %issued.id, "OTP sent to {}", issued.address.phone_number());
    Ok(issued)
}
