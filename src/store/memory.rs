use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::review::{NewReview, Review};
use crate::models::token::ReviewToken;

/// Process-local store with the same contract as the Postgres one.
/// Every operation runs under a single lock, so redemption is atomic.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Tables>>,
}

#[derive(Default)]
struct Tables {
    tokens: HashMap<String, ReviewToken>,
    reviews: Vec<Review>,
}

impl Tables {
    fn push_review(&mut self, review: &NewReview) -> Review {
        let stored = Review {
            id: Uuid::new_v4(),
            name: review.name.clone(),
            email: review.email.clone(),
            rating: review.rating,
            comments: review.comments.clone(),
            date_submitted: Utc::now(),
        };
        self.reviews.push(stored.clone());
        stored
    }
}

impl MemoryStore {
    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn insert_token(
        &self,
        token: &str,
        email: &str,
        name: Option<&str>,
    ) -> Result<ReviewToken, AppError> {
        let mut tables = self.tables();
        if tables.tokens.contains_key(token) {
            return Err(AppError::Internal("duplicate review token".into()));
        }

        let record = ReviewToken {
            token: token.to_string(),
            email: email.to_string(),
            name: name.map(str::to_string),
            used: false,
            created_at: Utc::now(),
        };
        tables.tokens.insert(token.to_string(), record.clone());
        Ok(record)
    }

    pub fn find_token(&self, token: &str) -> Option<ReviewToken> {
        self.tables().tokens.get(token).cloned()
    }

    pub fn insert_review(&self, review: &NewReview) -> Review {
        self.tables().push_review(review)
    }

    pub fn list_reviews(&self) -> Vec<Review> {
        let mut reviews = self.tables().reviews.clone();
        // Newest insert first among equal timestamps.
        reviews.reverse();
        reviews.sort_by(|a, b| b.date_submitted.cmp(&a.date_submitted));
        reviews
    }

    pub fn redeem_token(&self, token: &str, rating: i32, comments: &str) -> Option<Review> {
        let mut tables = self.tables();
        let record = tables.tokens.get_mut(token).filter(|t| !t.used)?;
        record.used = true;

        let review = NewReview {
            name: record.name.clone(),
            email: Some(record.email.clone()),
            rating,
            comments: comments.to_string(),
        };
        Some(tables.push_review(&review))
    }
}
