use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AccountResponse {
    pub sid: String,
    pub friendly_name: String,
    pub status: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageResponse {
    pub sid: String,
    pub status: String,
    pub to: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub code: Option<u32>,
    pub message: String,
}
