//! Application setup and server configuration.

use std::time::Duration;

use axum::{
    extract::Extension,
    http::{header::CONTENT_TYPE, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::domains::otp::OtpService;
use crate::server::routes::{
    connect_handler, connection_status_handler, disconnect_handler, health_handler,
    send_otp_handler, service_status_handler, verify_otp_handler,
};

/// Shared application state
#[derive(Clone)]
pub struct AxumAppState {
    pub service: OtpService,
    pub connect_timeout: Duration,
}

/// CORS: any origin unless an explicit allow-list is configured
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    let allow_origin = if origins.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE])
}

/// Build the Axum application router
pub fn build_app(
    service: OtpService,
    connect_timeout: Duration,
    allowed_origins: &[String],
) -> Router {
    let app_state = AxumAppState {
        service,
        connect_timeout,
    };

    Router::new()
        // WhatsApp session
        .route("/api/whatsapp/connect", post(connect_handler))
        .route("/api/whatsapp/status", get(connection_status_handler))
        .route("/api/whatsapp/disconnect", post(disconnect_handler))
        // OTP
        .route("/api/send-otp", post(send_otp_handler))
        .route("/api/verify-otp", post(verify_otp_handler))
        // Status
        .route("/api/status", get(service_status_handler))
        .route("/health", get(health_handler))
        // Middleware layers (applied in reverse order - last added runs first)
        .layer(Extension(app_state))
        .layer(cors_layer(allowed_origins))
        .layer(TraceLayer::new_for_http())
}
