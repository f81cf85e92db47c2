use chrono::Duration;
use serde::Serialize;
use tracing::{debug, info};

use super::actions::{self, IssuedOtp, VerifiedOtp};
use super::code::DEFAULT_MESSAGE_TEMPLATE;
use super::errors::OtpError;
use super::store::OtpStore;
use crate::domains::connection::{AddressRules, ConnectionManager};
use crate::kernel::{ServerDeps, SessionCredentials};

/// Tunables for issued codes
#[derive(Debug, Clone)]
pub struct OtpSettings {
    pub ttl: Duration,
    pub default_template: String,
}

impl Default for OtpSettings {
    fn default() -> Self {
        Self {
            ttl: Duration::minutes(5),
            default_template: DEFAULT_MESSAGE_TEMPLATE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OtpStats {
    #[serde(rename = "activeOTPs")]
    pub active: usize,
    #[serde(rename = "totalOTPs")]
    pub total: usize,
}

/// Orchestrates the connection manager and the OTP store.
///
/// Constructed once at startup and handed to the route layer; cheap to clone.
#[derive(Clone)]
pub struct OtpService {
    connection: ConnectionManager,
    store: OtpStore,
    deps: ServerDeps,
    settings: OtpSettings,
}

impl OtpService {
    pub fn new(
        connection: ConnectionManager,
        store: OtpStore,
        deps: ServerDeps,
        settings: OtpSettings,
    ) -> Self {
        Self {
            connection,
            store,
            deps,
            settings,
        }
    }

    /// Build the connection manager and store from the given dependencies.
    pub fn from_deps(
        deps: ServerDeps,
        credentials: Option<SessionCredentials>,
        rules: AddressRules,
        settings: OtpSettings,
    ) -> Self {
        let connection = ConnectionManager::new(deps.transport.clone(), credentials, rules);
        let store = OtpStore::new(deps.clock.clone());
        Self::new(connection, store, deps, settings)
    }

    pub fn connection(&self) -> &ConnectionManager {
        &self.connection
    }

    pub fn store(&self) -> &OtpStore {
        &self.store
    }

    pub fn deps(&self) -> &ServerDeps {
        &self.deps
    }

    pub fn settings(&self) -> &OtpSettings {
        &self.settings
    }

    pub async fn issue_otp(
        &self,
        phone_number: Option<&str>,
        message_template: Option<&str>,
    ) -> Result<IssuedOtp, OtpError> {
        actions::issue_otp(phone_number, message_template, self).await
    }

    pub async fn verify_otp(
        &self,
        otp_id: Option<&str>,
        phone_number: Option<&str>,
        code: Option<&str>,
    ) -> Result<VerifiedOtp, OtpError> {
        actions::verify_otp(otp_id, phone_number, code, self).await
    }

    /// Drop every record past its expiry as of now.
    pub async fn sweep_expired(&self) -> usize {
        let removed = self.store.sweep_expired(self.deps.clock.now()).await;
        if removed > 0 {
            info!(removed, "Swept expired OTPs");
        } else {
            debug!("OTP sweep found nothing to remove");
        }
        removed
    }

    pub async fn stats(&self) -> OtpStats {
        OtpStats {
            active: self.store.active_count(self.deps.clock.now()).await,
            total: self.store.total_count().await,
        }
    }
}
