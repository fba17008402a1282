use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_extra::extract::WithRejection;

use crate::error::AppError;
use crate::models::review::{MessageResponse, SubmitReviewRequest};
use crate::models::token::{
    GenerateLinkRequest, GenerateLinkResponse, SendReviewEmailRequest, TokenStatusResponse,
};
use crate::AppState;

type JsonBody<T> = WithRejection<Json<T>, AppError>;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/generate-review-link", post(generate_review_link))
        .route("/review-token/{token}", get(check_token))
        .route("/review", post(submit_review))
        .route("/send-review-email", post(send_review_email))
}

async fn generate_review_link(
    State(state): State<AppState>,
    WithRejection(Json(body), _): JsonBody<GenerateLinkRequest>,
) -> Result<Json<GenerateLinkResponse>, AppError> {
    let link = state.reviews.generate_link(body).await?;
    Ok(Json(GenerateLinkResponse { link }))
}

async fn check_token(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<TokenStatusResponse>, AppError> {
    let valid = state.reviews.validate_token(&token).await?;
    Ok(Json(TokenStatusResponse { valid }))
}

async fn submit_review(
    State(state): State<AppState>,
    WithRejection(Json(body), _): JsonBody<SubmitReviewRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    state.reviews.submit(body).await?;
    Ok(Json(MessageResponse::new("Review submitted successfully.")))
}

async fn send_review_email(
    State(state): State<AppState>,
    WithRejection(Json(body), _): JsonBody<SendReviewEmailRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    state.reviews.send_review_email(body).await?;
    Ok(Json(MessageResponse::new("Email sent successfully.")))
}
