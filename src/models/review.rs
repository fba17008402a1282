use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Review {
    pub id: Uuid,
    pub name: Option<String>,
    pub email: Option<String>,
    pub rating: i32,
    pub comments: String,
    pub date_submitted: DateTime<Utc>,
}

/// A review ready to be stored. Identity comes from a redeemed token or,
/// for direct submissions, from the request itself.
#[derive(Debug, Clone)]
pub struct NewReview {
    pub name: Option<String>,
    pub email: Option<String>,
    pub rating: i32,
    pub comments: String,
}

/// Body of `POST /review`. A non-null `token` selects the tokenized flow; a
/// missing or `null` token makes it a direct submission.
#[derive(Debug, Default, Deserialize)]
pub struct SubmitReviewRequest {
    pub token: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub rating: Option<i32>,
    pub comments: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
