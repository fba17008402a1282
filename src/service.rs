use std::sync::Arc;

use rand::Rng;
use crate::config::Config;
use crate::error::AppError;
use crate::models::review::{NewReview, Review, SubmitReviewRequest};
use crate::models::token::{GenerateLinkRequest, SendReviewEmailRequest};
use crate::notify::{Email, Notifier};
use crate::store::Store;

const TOKEN_LEN: usize = 32;

/// Review-token lifecycle: issue a link, check it, redeem it once.
#[derive(Clone)]
pub struct ReviewService {
    store: Store,
    notifier: Notifier,
    config: Arc<Config>,
}

/// 32 characters of `[0-9a-z]` from the thread-local CSPRNG, about 165 bits.
fn generate_token() -> String {
    let mut rng = rand::thread_rng();
    (0..TOKEN_LEN)
        .map(|_| {
            let idx = rng.gen_range(0..36u8);
            if idx < 10 {
                (b'0' + idx) as char
            } else {
                (b'a' + idx - 10) as char
            }
        })
        .collect()
}

/// Only strings shaped like [`generate_token`] output can name a stored token.
fn is_well_formed_token(token: &str) -> bool {
    token.len() == TOKEN_LEN
        && token
            .bytes()
            .all(|b| b.is_ascii_digit() || b.is_ascii_lowercase())
}

/// Trimmed, non-empty value or `None`.
fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl ReviewService {
    pub fn new(store: Store, notifier: Notifier, config: Arc<Config>) -> Self {
        Self {
            store,
            notifier,
            config,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn review_link(&self, token: &str) -> String {
        let mut url = self.config.review_link_base.clone();
        url.query_pairs_mut().append_pair("token", token);
        url.into()
    }

    /// Store a fresh token for `email` and return the review link carrying it.
    pub async fn generate_link(&self, req: GenerateLinkRequest) -> Result<String, AppError> {
        let email = non_blank(req.email)
            .ok_or_else(|| AppError::Validation("Email is required.".into()))?;
        let name = non_blank(req.name);

        let token = generate_token();
        let link = self.review_link(&token);
        let record = self
            .store
            .insert_token(&token, &email, name.as_deref())
            .await?;

        tracing::info!(email = %record.email, "review link generated");

        if self.config.send_invite_on_generate {
            self.notifier.dispatch(Email::invitation(
                &record.email,
                record.name.as_deref(),
                &link,
                &self.config.email_signature,
            ));
        }

        Ok(link)
    }

    /// True iff the token exists and has not been used. Never exposes who it
    /// was issued to.
    pub async fn validate_token(&self, token: &str) -> Result<bool, AppError> {
        let token = token.trim();
        if !is_well_formed_token(token) {
            return Ok(false);
        }

        Ok(self
            .store
            .find_token(token)
            .await?
            .is_some_and(|t| !t.used))
    }

    /// A non-null `token` means the tokenized flow; otherwise this is a
    /// direct submission (if enabled).
    pub async fn submit(&self, req: SubmitReviewRequest) -> Result<Review, AppError> {
        match req.token {
            Some(token) => self.submit_with_token(&token, req.rating, req.comments).await,
            None if self.config.allow_direct_reviews => {
                self.submit_direct(req.name, req.email, req.rating, req.comments)
                    .await
            }
            None => Err(AppError::Validation(
                "Token, rating and comments are required.".into(),
            )),
        }
    }

    pub async fn submit_with_token(
        &self,
        token: &str,
        rating: Option<i32>,
        comments: Option<String>,
    ) -> Result<Review, AppError> {
        let token = token.trim();
        let (Some(rating), Some(comments)) = (rating, non_blank(comments)) else {
            return Err(AppError::Validation(
                "Token, rating and comments are required.".into(),
            ));
        };
        if token.is_empty() {
            return Err(AppError::Validation(
                "Token, rating and comments are required.".into(),
            ));
        }
        if !is_well_formed_token(token) {
            return Err(AppError::InvalidToken);
        }

        let review = self
            .store
            .redeem_token(token, rating, &comments)
            .await?
            .ok_or(AppError::InvalidToken)?;

        tracing::info!(review_id = %review.id, rating, "review submitted with token");

        if let Some(email) = &review.email {
            self.notifier.dispatch(Email::thank_you(
                email,
                review.name.as_deref(),
                &self.config.email_signature,
            ));
        }

        Ok(review)
    }

    pub async fn submit_direct(
        &self,
        name: Option<String>,
        email: Option<String>,
        rating: Option<i32>,
        comments: Option<String>,
    ) -> Result<Review, AppError> {
        let (Some(rating), Some(comments)) = (rating, non_blank(comments)) else {
            return Err(AppError::Validation("Rating and comments are required.".into()));
        };

        let review = self
            .store
            .insert_review(&NewReview {
                name: non_blank(name),
                email: non_blank(email),
                rating,
                comments,
            })
            .await?;

        tracing::info!(review_id = %review.id, rating, "direct review submitted");

        if let Some(email) = &review.email {
            self.notifier.dispatch(Email::thank_you(
                email,
                review.name.as_deref(),
                &self.config.email_signature,
            ));
        }

        Ok(review)
    }

    /// Manually (re)send the invitation for an existing link. Unlike the
    /// other flows, delivery failure is reported to the caller.
    pub async fn send_review_email(&self, req: SendReviewEmailRequest) -> Result<(), AppError> {
        let (Some(token), Some(email)) = (non_blank(req.token), non_blank(req.email)) else {
            return Err(AppError::Validation("Token and email are required.".into()));
        };
        let name = non_blank(req.name);

        let link = self.review_link(&token);
        self.notifier
            .send(&Email::invitation(
                &email,
                name.as_deref(),
                &link,
                &self.config.email_signature,
            ))
            .await?;

        tracing::info!(%email, "review email sent");
        Ok(())
    }

    pub async fn list_reviews(&self) -> Result<Vec<Review>, AppError> {
        self.store.list_reviews().await
    }
}
