use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub default_country_code: String,
    pub chat_address_suffix: String,
    pub otp_ttl_seconds: i64,
    pub otp_sweep_schedule: String,
    pub connect_timeout_seconds: u64,
    pub session_client_id: String,
    pub twilio_account_sid: String,
    pub twilio_auth_token: String,
    pub twilio_whatsapp_from: String,
    pub allowed_origins: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            default_country_code: env::var("DEFAULT_COUNTRY_CODE")
                .unwrap_or_else(|_| "91".to_string()),
            chat_address_suffix: env::var("CHAT_ADDRESS_SUFFIX")
                .unwrap_or_else(|_| "@c.us".to_string()),
            otp_ttl_seconds: env::var("OTP_TTL_SECONDS")
                .unwrap_or_else(|_| "300".to_string())
                .parse()
                .context("OTP_TTL_SECONDS must be a valid number")?,
            otp_sweep_schedule: env::var("OTP_SWEEP_SCHEDULE")
                .unwrap_or_else(|_| "0 * * * * *".to_string()),
            connect_timeout_seconds: env::var("CONNECT_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .context("CONNECT_TIMEOUT_SECONDS must be a valid number")?,
            session_client_id: env::var("SESSION_CLIENT_ID")
                .unwrap_or_else(|_| "otp-service".to_string()),
            twilio_account_sid: env::var("TWILIO_ACCOUNT_SID")
                .context("TWILIO_ACCOUNT_SID must be set")?,
            twilio_auth_token: env::var("TWILIO_AUTH_TOKEN")
                .context("TWILIO_AUTH_TOKEN must be set")?,
            twilio_whatsapp_from: env::var("TWILIO_WHATSAPP_FROM")
                .context("TWILIO_WHATSAPP_FROM must be set")?,
            allowed_origins: env::var("ALLOWED_ORIGINS")
                .map(|origins| parse_origins(&origins))
                .unwrap_or_default(),
        })
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }

    pub fn otp_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.otp_ttl_seconds)
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_origins_trims_and_skips_empty() {
        let origins = parse_origins(" http://localhost:3000, ,https://example.org ");
        assert_eq!(
            origins,
            vec![
                "http://localhost:3000".to_string(),
                "https://example.org".to_string()
            ]
        );
    }
}
