//! Verify OTP action

use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use super::non_blank;
use crate::domains::connection::ChatAddress;
use crate::domains::otp::{OtpError, OtpRecord, OtpService};

/// Result of a successful verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedOtp {
    pub id: Uuid,
    pub address: ChatAddress,
    pub verified_at: DateTime<Utc>,
}

/// Verify a submitted code against a record found by id or by phone number.
///
/// When both are given the id wins. A phone number resolves to the newest
/// record for that address that is neither consumed nor expired.
pub async fn verify_otp(
    otp_id: Option<&str>,
    phone_number: Option<&str>,
    code: Option<&str>,
    service: &OtpService,
) -> Result<VerifiedOtp, OtpError> {
    let code = non_blank(code).ok_or(OtpError::MissingCode)?;

    let record = resolve_record(non_blank(otp_id), non_blank(phone_number), service).await?;

    match service
        .store()
        .consume(record.id, code, service.deps().clock.now())
        .await
    {
        Ok(verified) => {
            info!(otp_id = %verified.id, "OTP verified for {}", verified.address.phone_number());
            Ok(VerifiedOtp {
                id: verified.id,
                address: verified.address,
                verified_at: verified.verified_at,
            })
        }
        Err(e) => {
            warn!(otp_id = %record.id, error = %e, "OTP verification failed");
            Err(e)
        }
    }
}

async fn resolve_record(
    otp_id: Option<&str>,
    phone_number: Option<&str>,
    service: &OtpService,
) -> Result<OtpRecord, OtpError> {
    let record = match (otp_id, phone_number) {
        (Some(id), _) => match Uuid::parse_str(id) {
            Ok(id) => service.store().get(id).await,
            Err(_) => None,
        },
        (None, Some(phone_number)) => {
            let address = service.connection().normalize(phone_number);
            service
                .store()
                .find_latest_pending_for_address(&address, service.deps().clock.now())
                .await
        }
        (None, None) => return Err(OtpError::MissingIdentifier),
    };
    record.ok_or(OtpError::NotFound)
}
