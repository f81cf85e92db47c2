//! WhatsApp connection endpoints.
//!
//! POST /api/whatsapp/connect     start (or reuse) the session and wait for an answer
//! GET  /api/whatsapp/status      current session snapshot
//! POST /api/whatsapp/disconnect  tear the session down

use axum::{extract::Extension, http::StatusCode, Json};
use serde::Serialize;

use super::error::ApiError;
use crate::common::ErrorCode;
use crate::domains::connection::{ConnectionSession, ConnectionState};
use crate::kernel::ClientIdentity;
use crate::server::app::AxumAppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectResponse {
    pub message: String,
    pub qr_code: Option<String>,
    pub connected: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionStatusResponse {
    pub state: ConnectionState,
    pub connected: bool,
    pub qr_available: bool,
    pub qr_code: Option<String>,
    pub client_info: Option<ClientIdentity>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisconnectResponse {
    pub message: String,
    pub connected: bool,
}

impl From<&ConnectionSession> for ConnectionStatusResponse {
    fn from(session: &ConnectionSession) -> Self {
        Self {
            state: session.state(),
            connected: session.is_ready(),
            qr_available: session.pairing_challenge().is_some(),
            qr_code: session.pairing_challenge().map(|c| c.0.clone()),
            client_info: session.identity().cloned(),
        }
    }
}

pub async fn connect_handler(
    Extension(state): Extension<AxumAppState>,
) -> Result<Json<ConnectResponse>, ApiError> {
    let connection = state.service.connection();
    if connection.status().is_ready() {
        return Ok(Json(ConnectResponse {
            message: "WhatsApp is already connected".to_string(),
            qr_code: None,
            connected: true,
        }));
    }

    let session = connection.connect_and_wait(state.connect_timeout).await?;

    match session {
        ConnectionSession::Ready { .. } => Ok(Json(ConnectResponse {
            message: "WhatsApp connected successfully".to_string(),
            qr_code: None,
            connected: true,
        })),
        ConnectionSession::AwaitingPairing { challenge } => Ok(Json(ConnectResponse {
            message: "Scan the QR code with WhatsApp to connect".to_string(),
            qr_code: Some(challenge.0),
            connected: false,
        })),
        ConnectionSession::Failed { reason } => Err(ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::NotConnected,
            format!("WhatsApp connection failed: {}", reason),
        )),
        // connect_and_wait only returns settled sessions
        ConnectionSession::Idle | ConnectionSession::Initializing => Err(ApiError::new(
            StatusCode::REQUEST_TIMEOUT,
            ErrorCode::Timeout,
            "WhatsApp session did not settle",
        )),
    }
}

pub async fn connection_status_handler(
    Extension(state): Extension<AxumAppState>,
) -> Json<ConnectionStatusResponse> {
    let session = state.service.connection().status();
    Json(ConnectionStatusResponse::from(&session))
}

pub async fn disconnect_handler(
    Extension(state): Extension<AxumAppState>,
) -> Json<DisconnectResponse> {
    state.service.connection().disconnect();
    Json(DisconnectResponse {
        message: "WhatsApp disconnected".to_string(),
        connected: false,
    })
}
