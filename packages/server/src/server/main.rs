// Main entry point for the OTP server

use std::sync::Arc;

use anyhow::{Context, Result};
use otp_core::domains::connection::AddressRules;
use otp_core::domains::otp::{OtpService, OtpSettings};
use otp_core::kernel::{start_scheduler, ServerDeps, SessionCredentials};
use otp_core::{server::build_app, Config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use twilio::{TwilioOptions, TwilioService};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,otp_core=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting WhatsApp OTP Service");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!("Configuration loaded");

    // Messaging transport
    let twilio = Arc::new(TwilioService::new(TwilioOptions {
        account_sid: config.twilio_account_sid.clone(),
        auth_token: config.twilio_auth_token.clone(),
        whatsapp_from: config.twilio_whatsapp_from.clone(),
    }));

    let service = OtpService::from_deps(
        ServerDeps::production(twilio),
        Some(SessionCredentials(config.session_client_id.clone())),
        AddressRules {
            default_country_code: config.default_country_code.clone(),
            suffix: config.chat_address_suffix.clone(),
        },
        OtpSettings {
            ttl: config.otp_ttl(),
            ..OtpSettings::default()
        },
    );

    // Start the WhatsApp session in the background; callers can also POST /api/whatsapp/connect
    service.connection().connect();

    let mut scheduler = start_scheduler(service.clone(), &config.otp_sweep_schedule)
        .await
        .context("Failed to start scheduler")?;

    let app = build_app(
        service.clone(),
        config.connect_timeout(),
        &config.allowed_origins,
    );

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {}", addr);
    tracing::info!("Health check: http://localhost:{}/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Shutting down");
    service.connection().disconnect();
    if let Err(e) = scheduler.shutdown().await {
        tracing::warn!("Scheduler shutdown failed: {}", e);
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
