//! Trade-offer lifecycle endpoints.
//!
//! - `POST   /offers` — create an offer against a listing
//! - `GET    /offers/received` — offers received by the caller
//! - `GET    /offers/sent` — offers sent by the caller
//! - `GET    /offers/{id}` — one offer (parties only)
//! - `PUT    /offers/{id}/accept-chat` — first-stage approval (recipient)
//! - `PUT    /offers/{id}/accept-offer` — final approval (recipient)
//! - `PUT    /offers/{id}/reject` — rejection (recipient)
//! - `PUT    /offers/{id}/cancel` — withdrawal (proposer)
//! - `PUT    /offers/{id}/archive` — soft-reject (proposer)
//!
//! The actor is always the authenticated identity; transition bodies may
//! carry only an optional `response_message`.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use bookswap_core::{ListingId, OfferId, OfferedBook, ReviewStatus};
use bookswap_exchange::CreateOffer;
use bookswap_store::{ListingRow, TradeOfferRow, UserRow};

use crate::error::ApiResult;
use crate::extract::Identity;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for creating an offer.
#[derive(Debug, Deserialize)]
pub struct CreateOfferRequest {
    pub target_listing_id: Uuid,
    pub offered_book: OfferedBook,
    #[serde(default)]
    pub message: Option<String>,
}

/// Optional body for recipient transitions.
#[derive(Debug, Default, Deserialize)]
pub struct TransitionRequest {
    #[serde(default)]
    pub response_message: Option<String>,
}

/// API view of a trade offer.
#[derive(Debug, Serialize)]
pub struct OfferView {
    pub id: Uuid,
    pub from_user: Uuid,
    pub to_user: Uuid,
    pub target_listing: Uuid,
    pub offered_book: serde_json::Value,
    pub message: Option<String>,
    pub status: String,
    pub chat_accepted_date: Option<DateTime<Utc>>,
    pub response_message: Option<String>,
    pub response_date: Option<DateTime<Utc>>,
    pub completed_date: Option<DateTime<Utc>>,
    pub conversation_id: Option<Uuid>,
    pub archived_by_user: bool,
    pub review_status: ReviewStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<TradeOfferRow> for OfferView {
    fn from(row: TradeOfferRow) -> Self {
        let review_status = row.review_status();
        Self {
            id: row.id,
            from_user: row.from_user,
            to_user: row.to_user,
            target_listing: row.target_listing,
            offered_book: row.offered_book,
            message: row.message,
            status: row.status,
            chat_accepted_date: row.chat_accepted_date,
            response_message: row.response_message,
            response_date: row.response_date,
            completed_date: row.completed_date,
            conversation_id: row.conversation_id,
            archived_by_user: row.archived_by_user,
            review_status,
            created_at: row.created,
            updated_at: row.updated,
        }
    }
}

/// Compact counterpart info attached to offer listings.
#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub avatar: Option<String>,
    pub city: Option<String>,
    pub rating: f64,
    pub total_ratings: i32,
}

impl From<UserRow> for UserSummary {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            avatar: row.avatar,
            city: row.city,
            rating: row.rating,
            total_ratings: row.total_ratings,
        }
    }
}

/// Compact listing info attached to offer listings.
#[derive(Debug, Serialize)]
pub struct ListingSummary {
    pub id: Uuid,
    pub book_title: String,
    pub author: String,
    pub category: String,
    pub status: String,
}

impl From<ListingRow> for ListingSummary {
    fn from(row: ListingRow) -> Self {
        Self {
            id: row.id,
            book_title: row.book_title,
            author: row.author,
            category: row.category,
            status: row.status,
        }
    }
}

/// One entry of the received/sent listings: the offer plus the other
/// party and the target listing.
#[derive(Debug, Serialize)]
pub struct OfferListItem {
    #[serde(flatten)]
    pub offer: OfferView,
    pub counterpart: UserSummary,
    pub listing: ListingSummary,
}

/// Response for a successful chat acceptance.
#[derive(Debug, Serialize)]
pub struct AcceptChatResponse {
    pub offer: OfferView,
    pub conversation_id: Uuid,
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST /offers - Create a new offer.
async fn create_offer(
    State(state): State<AppState>,
    Identity(user): Identity,
    Json(request): Json<CreateOfferRequest>,
) -> ApiResult<(StatusCode, Json<OfferView>)> {
    let row = state
        .exchange()
        .offers
        .create_offer(CreateOffer {
            from_user: user,
            target_listing: ListingId(request.target_listing_id),
            offered_book: request.offered_book,
            message: request.message,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(row.into())))
}

/// GET /offers/received - Offers received by the caller, newest first.
async fn list_received(
    State(state): State<AppState>,
    Identity(user): Identity,
) -> ApiResult<Json<Vec<OfferListItem>>> {
    let rows = state.exchange().offers.list_received(user).await?;
    let items = attach_summaries(&state, rows, Counterpart::Proposer).await?;
    Ok(Json(items))
}

/// GET /offers/sent - Offers sent by the caller, newest first.
async fn list_sent(
    State(state): State<AppState>,
    Identity(user): Identity,
) -> ApiResult<Json<Vec<OfferListItem>>> {
    let rows = state.exchange().offers.list_sent(user).await?;
    let items = attach_summaries(&state, rows, Counterpart::Recipient).await?;
    Ok(Json(items))
}

/// GET /offers/{id} - One offer; only its parties may view it.
async fn get_offer(
    State(state): State<AppState>,
    Identity(user): Identity,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<OfferView>> {
    let row = state.exchange().offers.get_offer(OfferId(id), user).await?;
    Ok(Json(row.into()))
}

/// PUT /offers/{id}/accept-chat - First-stage approval by the recipient.
async fn accept_chat(
    State(state): State<AppState>,
    Identity(user): Identity,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<AcceptChatResponse>> {
    let (row, conversation_id) = state
        .exchange()
        .offers
        .accept_chat(OfferId(id), user)
        .await?;

    Ok(Json(AcceptChatResponse {
        offer: row.into(),
        conversation_id: conversation_id.0,
    }))
}

/// PUT /offers/{id}/accept-offer - Final approval by the recipient.
///
/// Only legal from `chat_accepted`; the negotiation stage cannot be
/// skipped.
async fn accept_offer(
    State(state): State<AppState>,
    Identity(user): Identity,
    Path(id): Path<Uuid>,
    body: Option<Json<TransitionRequest>>,
) -> ApiResult<Json<OfferView>> {
    let response_message = body.and_then(|Json(b)| b.response_message);
    let row = state
        .exchange()
        .offers
        .accept_offer(OfferId(id), user, response_message)
        .await?;
    Ok(Json(row.into()))
}

/// PUT /offers/{id}/reject - Rejection by the recipient.
async fn reject_offer(
    State(state): State<AppState>,
    Identity(user): Identity,
    Path(id): Path<Uuid>,
    body: Option<Json<TransitionRequest>>,
) -> ApiResult<Json<OfferView>> {
    let response_message = body.and_then(|Json(b)| b.response_message);
    let row = state
        .exchange()
        .offers
        .reject_offer(OfferId(id), user, response_message)
        .await?;
    Ok(Json(row.into()))
}

/// PUT /offers/{id}/cancel - Withdrawal by the proposer.
async fn cancel_offer(
    State(state): State<AppState>,
    Identity(user): Identity,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<OfferView>> {
    let row = state.exchange().offers.cancel_offer(OfferId(id), user).await?;
    Ok(Json(row.into()))
}

/// PUT /offers/{id}/archive - Proposer-side soft-reject.
async fn archive_offer(
    State(state): State<AppState>,
    Identity(user): Identity,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<OfferView>> {
    let row = state
        .exchange()
        .offers
        .archive_offer(OfferId(id), user)
        .await?;
    Ok(Json(row.into()))
}

// ============================================================================
// Helpers
// ============================================================================

enum Counterpart {
    /// The offers' `from_user` (for received listings).
    Proposer,
    /// The offers' `to_user` (for sent listings).
    Recipient,
}

async fn attach_summaries(
    state: &AppState,
    rows: Vec<TradeOfferRow>,
    counterpart: Counterpart,
) -> ApiResult<Vec<OfferListItem>> {
    let mut items = Vec::with_capacity(rows.len());
    for row in rows {
        let counterpart_id = match counterpart {
            Counterpart::Proposer => row.from_user,
            Counterpart::Recipient => row.to_user,
        };
        let user = state.store().get_user(counterpart_id).await.map_err(
            bookswap_exchange::ExchangeError::from,
        )?;
        let listing = state
            .store()
            .get_listing(row.target_listing)
            .await
            .map_err(bookswap_exchange::ExchangeError::from)?;

        items.push(OfferListItem {
            offer: row.into(),
            counterpart: user.into(),
            listing: listing.into(),
        });
    }
    Ok(items)
}

/// Build offer routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/offers", post(create_offer))
        .route("/offers/received", get(list_received))
        .route("/offers/sent", get(list_sent))
        .route("/offers/{id}", get(get_offer))
        .route("/offers/{id}/accept-chat", put(accept_chat))
        .route("/offers/{id}/accept-offer", put(accept_offer))
        .route("/offers/{id}/reject", put(reject_offer))
        .route("/offers/{id}/cancel", put(cancel_offer))
        .route("/offers/{id}/archive", put(archive_offer))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_request_deserialize() {
        let json = r#"{
            "target_listing_id": "8f14e45f-ceea-4e7b-9c58-1b5f0c4f1a2b",
            "offered_book": {
                "book_title": "Dune",
                "author": "Frank Herbert",
                "category": "sci-fi",
                "condition": "good"
            },
            "message": "Would love to trade!"
        }"#;
        let request: CreateOfferRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.offered_book.book_title, "Dune");
        assert_eq!(request.message.as_deref(), Some("Would love to trade!"));
    }

    #[test]
    fn transition_request_allows_empty_body() {
        let request: TransitionRequest = serde_json::from_str("{}").unwrap();
        assert!(request.response_message.is_none());
    }

    #[test]
    fn offer_view_serializes_review_status() {
        let view = OfferView {
            id: Uuid::new_v4(),
            from_user: Uuid::new_v4(),
            to_user: Uuid::new_v4(),
            target_listing: Uuid::new_v4(),
            offered_book: serde_json::json!({"book_title": "Dune"}),
            message: None,
            status: "accepted".to_string(),
            chat_accepted_date: None,
            response_message: None,
            response_date: None,
            completed_date: None,
            conversation_id: None,
            archived_by_user: false,
            review_status: ReviewStatus::default(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["status"], "accepted");
        assert_eq!(json["review_status"]["both_reviewed"], false);
    }

    #[test]
    fn list_item_flattens_offer() {
        let item = OfferListItem {
            offer: OfferView {
                id: Uuid::new_v4(),
                from_user: Uuid::new_v4(),
                to_user: Uuid::new_v4(),
                target_listing: Uuid::new_v4(),
                offered_book: serde_json::json!({}),
                message: None,
                status: "pending".to_string(),
                chat_accepted_date: None,
                response_message: None,
                response_date: None,
                completed_date: None,
                conversation_id: None,
                archived_by_user: false,
                review_status: ReviewStatus::default(),
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            counterpart: UserSummary {
                id: Uuid::new_v4(),
                username: "ada".to_string(),
                avatar: None,
                city: Some("Ankara".to_string()),
                rating: 4.5,
                total_ratings: 12,
            },
            listing: ListingSummary {
                id: Uuid::new_v4(),
                book_title: "Dune".to_string(),
                author: "Frank Herbert".to_string(),
                category: "sci-fi".to_string(),
                status: "active".to_string(),
            },
        };
        let json = serde_json::to_value(&item).unwrap();
        // Flattened offer fields live at the top level.
        assert_eq!(json["status"], "pending");
        assert_eq!(json["counterpart"]["username"], "ada");
        assert_eq!(json["listing"]["book_title"], "Dune");
    }
}
