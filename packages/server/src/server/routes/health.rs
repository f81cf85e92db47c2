use axum::{extract::Extension, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domains::otp::OtpStats;
use crate::server::app::AxumAppState;

pub const SERVICE_NAME: &str = "WhatsApp OTP Service";

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WhatsAppSummary {
    connected: bool,
    qr_available: bool,
}

#[derive(Serialize)]
pub struct ServiceStatusResponse {
    service: &'static str,
    status: &'static str,
    whatsapp: WhatsAppSummary,
    stats: OtpStats,
    timestamp: DateTime<Utc>,
}

/// Liveness probe
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Service status: connection summary plus OTP counters
pub async fn service_status_handler(
    Extension(state): Extension<AxumAppState>,
) -> Json<ServiceStatusResponse> {
    let session = state.service.connection().status();
    let stats = state.service.stats().await;

    Json(ServiceStatusResponse {
        service: SERVICE_NAME,
        status: "running",
        whatsapp: WhatsAppSummary {
            connected: session.is_ready(),
            qr_available: session.pairing_challenge().is_some(),
        },
        stats,
        timestamp: state.service.deps().clock.now(),
    })
}
