use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct ReviewToken {
    pub token: String,
    pub email: String,
    pub name: Option<String>,
    pub used: bool,
    #[allow(dead_code)]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GenerateLinkRequest {
    pub email: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GenerateLinkResponse {
    pub link: String,
}

#[derive(Debug, Serialize)]
pub struct TokenStatusResponse {
    pub valid: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct SendReviewEmailRequest {
    pub token: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
}
