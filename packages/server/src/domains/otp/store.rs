//! In-memory OTP record store.
//!
//! One `RwLock` guards the whole map, so `put`, `consume`, `remove` and the
//! sweep are serialized against each other. No lock is held across IO.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::errors::OtpError;
use super::models::OtpRecord;
use crate::domains::connection::ChatAddress;
use crate::kernel::BaseClock;

/// Outcome of a successful consumption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verified {
    pub id: Uuid,
    pub address: ChatAddress,
    pub verified_at: DateTime<Utc>,
}

/// Exclusive owner of all OTP records. Callers only ever get copies.
#[derive(Clone)]
pub struct OtpStore {
    records: Arc<RwLock<HashMap<Uuid, OtpRecord>>>,
    clock: Arc<dyn BaseClock>,
}

impl OtpStore {
    pub fn new(clock: Arc<dyn BaseClock>) -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
            clock,
        }
    }

    /// Insert a new record and schedule its deletion at `expires_at`.
    pub async fn put(&self, record: OtpRecord) -> Result<(), OtpError> {
        let id = record.id;
        let delay = (record.expires_at - self.clock.now())
            .to_std()
            .unwrap_or_default();

        {
            let mut records = self.records.write().await;
            if records.contains_key(&id) {
                return Err(OtpError::DuplicateId(id));
            }
            records.insert(id, record);
        }

        // The timer only holds a weak handle; a dropped store takes its timers' work with it.
        let records = Arc::downgrade(&self.records);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(records) = records.upgrade() {
                if records.write().await.remove(&id).is_some() {
                    debug!(otp_id = %id, "Expired OTP removed by deferred deletion");
                }
            }
        });

        Ok(())
    }

    pub async fn get(&self, id: Uuid) -> Option<OtpRecord> {
        self.records.read().await.get(&id).cloned()
    }

    /// Newest record for `address` that is neither consumed nor expired at `now`.
    ///
    /// Ordered by `(created_at, id)` so equal timestamps still resolve the same
    /// way on every scan.
    pub async fn find_latest_pending_for_address(
        &self,
        address: &ChatAddress,
        now: DateTime<Utc>,
    ) -> Option<OtpRecord> {
        self.records
            .read()
            .await
            .values()
            .filter(|record| record.subject_address == *address && record.is_active(now))
            .max_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)))
            .cloned()
    }

    /// Atomically check and consume a record.
    ///
    /// Checks run in a fixed order: existence, expiry, prior consumption, code.
    pub async fn consume(
        &self,
        id: Uuid,
        submitted_code: &str,
        now: DateTime<Utc>,
    ) -> Result<Verified, OtpError> {
        let mut records = self.records.write().await;
        let record = records.get_mut(&id).ok_or(OtpError::NotFound)?;

        if record.is_expired(now) {
            return Err(OtpError::Expired);
        }
        if record.consumed {
            return Err(OtpError::AlreadyConsumed);
        }
        if record.code != submitted_code {
            return Err(OtpError::CodeMismatch);
        }

        record.consumed = true;
        record.consumed_at = Some(now);

        Ok(Verified {
            id,
            address: record.subject_address.clone(),
            verified_at: now,
        })
    }

    /// Delete a record. Deleting a missing id is a no-op.
    pub async fn remove(&self, id: Uuid) -> bool {
        self.records.write().await.remove(&id).is_some()
    }

    /// Remove every record with `expires_at < now`; returns how many went.
    pub async fn sweep_expired(&self, now: DateTime<Utc>) -> usize {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|_, record| record.expires_at >= now);
        before - records.len()
    }

    pub async fn active_count(&self, now: DateTime<Utc>) -> usize {
        self.records
            .read()
            .await
            .values()
            .filter(|record| record.is_active(now))
            .count()
    }

    pub async fn total_count(&self) -> usize {
        self.records.read().await.len()
    }
}
