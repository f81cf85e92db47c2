// Minimal Twilio REST client for delivering WhatsApp messages.

use std::collections::HashMap;

pub mod models;
use reqwest::{header, Client, StatusCode};

use crate::models::{AccountResponse, ApiErrorResponse, MessageResponse};

const API_BASE: &str = "https://api.twilio.com/2010-04-01";

/// Twilio error codes meaning the recipient address cannot receive messages.
const INVALID_RECIPIENT_CODES: &[u32] = &[21211, 21214, 21407, 21614, 63003, 63024];

#[derive(Debug, thiserror::Error)]
pub enum TwilioError {
    #[error("request to Twilio failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Twilio rejected the credentials ({status})")]
    Unauthorized { status: StatusCode },

    #[error("Twilio rejected recipient (code {code}): {message}")]
    InvalidRecipient { code: u32, message: String },

    #[error("Twilio returned an error ({status}): {message}")]
    Api { status: StatusCode, message: String },
}

#[derive(Debug, Clone)]
pub struct TwilioOptions {
    pub account_sid: String,
    pub auth_token: String,
    /// Sender number, E.164 without the `whatsapp:` prefix.
    pub whatsapp_from: String,
}

#[derive(Debug, Clone)]
pub struct TwilioService {
    options: TwilioOptions,
    client: Client,
}

impl TwilioService {
    pub fn new(options: TwilioOptions) -> Self {
        Self {
            options,
            client: Client::new(),
        }
    }

    /// The configured sender number.
    pub fn sender(&self) -> &str {
        &self.options.whatsapp_from
    }

    /// Fetch the account the credentials belong to. Used to validate credentials.
    pub async fn fetch_account(&self) -> Result<AccountResponse, TwilioError> {
        let url = format!(
            "{API_BASE}/Accounts/{sid}.json",
            sid = self.options.account_sid
        );

        let response = self
            .client
            .get(url)
            .basic_auth(&self.options.account_sid, Some(&self.options.auth_token))
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(TwilioError::Unauthorized { status });
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(TwilioError::Api { status, message });
        }

        Ok(response.json::<AccountResponse>().await?)
    }

    /// Send a WhatsApp message. `to` is an E.164 number such as `+919876543210`.
    pub async fn send_whatsapp_message(
        &self,
        to: &str,
        body: &str,
    ) -> Result<MessageResponse, TwilioError> {
        let url = format!(
            "{API_BASE}/Accounts/{sid}/Messages.json",
            sid = self.options.account_sid
        );

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/x-www-form-urlencoded"),
        );

        let mut form_body: HashMap<&str, String> = HashMap::new();
        form_body.insert("To", format!("whatsapp:{to}"));
        form_body.insert("From", format!("whatsapp:{}", self.options.whatsapp_from));
        form_body.insert("Body", body.to_string());

        let response = self
            .client
            .post(url)
            .basic_auth(&self.options.account_sid, Some(&self.options.auth_token))
            .headers(headers)
            .form(&form_body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<MessageResponse>().await?);
        }
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(TwilioError::Unauthorized { status });
        }

        let text = response.text().await.unwrap_or_default();
        Err(classify_error(status, &text))
    }
}

fn classify_error(status: StatusCode, body: &str) -> TwilioError {
    match serde_json::from_str::<ApiErrorResponse>(body) {
        Ok(err) if err.code.is_some_and(|c| INVALID_RECIPIENT_CODES.contains(&c)) => {
            TwilioError::InvalidRecipient {
                code: err.code.unwrap_or_default(),
                message: err.message,
            }
        }
        Ok(err) => TwilioError::Api {
            status,
            message: err.message,
        },
        Err(_) => TwilioError::Api {
            status,
            message: body.to_string(),
        },
    }
}
