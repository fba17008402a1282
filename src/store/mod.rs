pub mod memory;
pub mod postgres;

use crate::config::{Config, StoreKind};
use crate::error::AppError;
use crate::models::review::{NewReview, Review};
use crate::models::token::ReviewToken;

use memory::MemoryStore;
use postgres::PgStore;

/// Backing store for review tokens and reviews. Constructed once at startup
/// and cloned into every request handler.
#[derive(Clone)]
pub enum Store {
    Postgres(PgStore),
    Memory(MemoryStore),
}

impl Store {
    pub async fn open(config: &Config) -> Result<Self, AppError> {
        match config.store {
            StoreKind::Postgres => Ok(Self::Postgres(PgStore::connect(&config.database_url).await?)),
            StoreKind::Memory => {
                tracing::warn!("Using in-memory store; reviews will not survive a restart");
                Ok(Self::Memory(MemoryStore::default()))
            }
        }
    }

    pub async fn insert_token(
        &self,
        token: &str,
        email: &str,
        name: Option<&str>,
    ) -> Result<ReviewToken, AppError> {
        match self {
            Self::Postgres(s) => s.insert_token(token, email, name).await,
            Self::Memory(s) => s.insert_token(token, email, name),
        }
    }

    pub async fn find_token(&self, token: &str) -> Result<Option<ReviewToken>, AppError> {
        match self {
            Self::Postgres(s) => s.find_token(token).await,
            Self::Memory(s) => Ok(s.find_token(token)),
        }
    }

    pub async fn insert_review(&self, review: &NewReview) -> Result<Review, AppError> {
        match self {
            Self::Postgres(s) => s.insert_review(review).await,
            Self::Memory(s) => Ok(s.insert_review(review)),
        }
    }

    /// All reviews, newest first.
    pub async fn list_reviews(&self) -> Result<Vec<Review>, AppError> {
        match self {
            Self::Postgres(s) => s.list_reviews().await,
            Self::Memory(s) => Ok(s.list_reviews()),
        }
    }

    /// Atomically mark an unused token as used and store a review attributed
    /// to the token's email and name. Returns `None` if the token is unknown
    /// or already used.
    pub async fn redeem_token(
        &self,
        token: &str,
        rating: i32,
        comments: &str,
    ) -> Result<Option<Review>, AppError> {
        match self {
            Self::Postgres(s) => s.redeem_token(token, rating, comments).await,
            Self::Memory(s) => Ok(s.redeem_token(token, rating, comments)),
        }
    }

    pub async fn ping(&self) -> Result<bool, AppError> {
        match self {
            Self::Postgres(s) => s.ping().await,
            Self::Memory(_) => Ok(true),
        }
    }

    pub async fn close(&self) {
        match self {
            Self::Postgres(s) => s.close().await,
            Self::Memory(_) => {}
        }
    }
}
