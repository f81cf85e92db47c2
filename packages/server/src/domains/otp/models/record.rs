use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domains::connection::ChatAddress;

/// A one-time passcode issued to a chat address.
///
/// Everything except `consumed`/`consumed_at` is fixed at creation. Only the
/// store flips `consumed`, and only once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpRecord {
    pub id: Uuid,
    pub subject_address: ChatAddress,
    #[serde(skip_serializing)]
    pub code: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub consumed: bool,
    pub consumed_at: Option<DateTime<Utc>>,
}

impl OtpRecord {
    /// Create a fresh, unconsumed record valid for `ttl` from `created_at`.
    ///
    /// A non-positive `ttl` is raised to one second to keep `expires_at > created_at`.
    pub fn new(
        subject_address: ChatAddress,
        code: String,
        created_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        let ttl = ttl.max(Duration::seconds(1));
        Self {
            id: Uuid::new_v4(),
            subject_address,
            code,
            created_at,
            expires_at: created_at + ttl,
            consumed: false,
            consumed_at: None,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Neither expired nor consumed.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        !self.consumed && !self.is_expired(now)
    }
}
