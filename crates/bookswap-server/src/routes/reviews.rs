//! Review endpoints.
//!
//! - `GET /reviews/pending` — accepted trades the caller still owes a
//!   review for
//! - `POST /reviews` — submit a review (once per offer per reviewer)
//! - `GET /reviews/received/{user_id}` — visible reviews a user received
//! - `GET /reviews/given` — reviews the caller has given

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use bookswap_core::{OfferId, UserId};
use bookswap_exchange::SubmitReview;
use bookswap_store::ReviewRow;

use crate::error::ApiResult;
use crate::extract::Identity;
use crate::routes::offers::OfferView;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for submitting a review.
#[derive(Debug, Deserialize)]
pub struct SubmitReviewRequest {
    pub trade_offer_id: Uuid,
    pub reviewee_id: Uuid,
    pub rating: i32,
    #[serde(default)]
    pub comment: Option<String>,
}

/// One trade still owing a review from the caller.
#[derive(Debug, Serialize)]
pub struct PendingReviewItem {
    pub trade_offer: OfferView,
    pub reviewee_id: Uuid,
    pub reviewee_name: String,
}

/// Response for a successful submission.
#[derive(Debug, Serialize)]
pub struct SubmitReviewResponse {
    pub review: ReviewRow,
    /// Review flags on the offer after this submission.
    pub both_reviewed: bool,
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET /reviews/pending - Trades the caller still owes a review for.
async fn pending_reviews(
    State(state): State<AppState>,
    Identity(user): Identity,
) -> ApiResult<Json<Vec<PendingReviewItem>>> {
    let rows = state.exchange().reviews.compute_pending(user).await?;

    let items = rows
        .into_iter()
        .map(|row| PendingReviewItem {
            trade_offer: row.offer.into(),
            reviewee_id: row.reviewee_id,
            reviewee_name: row.reviewee_name,
        })
        .collect();

    Ok(Json(items))
}

/// POST /reviews - Submit a review for a completed trade.
async fn submit_review(
    State(state): State<AppState>,
    Identity(user): Identity,
    Json(request): Json<SubmitReviewRequest>,
) -> ApiResult<(StatusCode, Json<SubmitReviewResponse>)> {
    let submitted = state
        .exchange()
        .reviews
        .submit(SubmitReview {
            trade_offer: OfferId(request.trade_offer_id),
            reviewer: user,
            reviewee: UserId(request.reviewee_id),
            rating: request.rating,
            comment: request.comment,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SubmitReviewResponse {
            both_reviewed: submitted.offer.both_reviewed,
            review: submitted.review,
        }),
    ))
}

/// GET /reviews/received/{user_id} - Visible reviews a user received.
///
/// Public: feeds the user's profile page.
async fn reviews_received(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<Vec<ReviewRow>>> {
    let rows = state
        .exchange()
        .reviews
        .list_received(UserId(user_id))
        .await?;
    Ok(Json(rows))
}

/// GET /reviews/given - Reviews the caller has given.
async fn reviews_given(
    State(state): State<AppState>,
    Identity(user): Identity,
) -> ApiResult<Json<Vec<ReviewRow>>> {
    let rows = state.exchange().reviews.list_given(user).await?;
    Ok(Json(rows))
}

/// Build review routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/reviews", post(submit_review))
        .route("/reviews/pending", get(pending_reviews))
        .route("/reviews/received/{user_id}", get(reviews_received))
        .route("/reviews/given", get(reviews_given))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submit_request_deserialize() {
        let json = r#"{
            "trade_offer_id": "8f14e45f-ceea-4e7b-9c58-1b5f0c4f1a2b",
            "reviewee_id": "7c9e6679-7425-40de-944b-e07fc1f90ae7",
            "rating": 5,
            "comment": "Great trade!"
        }"#;
        let request: SubmitReviewRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.rating, 5);
        assert_eq!(request.comment.as_deref(), Some("Great trade!"));
    }

    #[test]
    fn submit_request_comment_optional() {
        let json = r#"{
            "trade_offer_id": "8f14e45f-ceea-4e7b-9c58-1b5f0c4f1a2b",
            "reviewee_id": "7c9e6679-7425-40de-944b-e07fc1f90ae7",
            "rating": 3
        }"#;
        let request: SubmitReviewRequest = serde_json::from_str(json).unwrap();
        assert!(request.comment.is_none());
    }
}
