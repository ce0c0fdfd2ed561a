//! Conversation and message endpoints.
//!
//! - `GET /conversations` — the caller's conversations, most recently
//!   active first
//! - `GET /conversations/{id}` — one conversation with its messages
//!   (participants only)
//! - `POST /conversations/{id}/messages` — send a message (participants
//!   only, active conversations only)
//! - `PUT /conversations/{id}/messages/read` — mark everything not
//!   authored by the caller as read

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use bookswap_core::ConversationId;
use bookswap_store::{ConversationRow, MessageRow};

use crate::error::ApiResult;
use crate::extract::Identity;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// API view of a conversation.
#[derive(Debug, Serialize)]
pub struct ConversationView {
    pub id: Uuid,
    pub trade_offer: Uuid,
    pub listing_id: Uuid,
    pub participants: Vec<Uuid>,
    pub status: String,
    pub end_reason: Option<String>,
    pub ended_at: Option<DateTime<Utc>>,
    pub last_message_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<ConversationRow> for ConversationView {
    fn from(row: ConversationRow) -> Self {
        Self {
            id: row.id,
            trade_offer: row.trade_offer,
            listing_id: row.listing_id,
            participants: row.participants,
            status: row.status,
            end_reason: row.end_reason,
            ended_at: row.ended_at,
            last_message_at: row.last_message_at,
            created_at: row.created,
        }
    }
}

/// API view of a message.
#[derive(Debug, Serialize)]
pub struct MessageView {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender: Uuid,
    pub content: String,
    pub message_type: String,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<MessageRow> for MessageView {
    fn from(row: MessageRow) -> Self {
        Self {
            id: row.id,
            conversation_id: row.conversation_id,
            sender: row.sender,
            content: row.content,
            message_type: row.message_type,
            is_read: row.is_read,
            read_at: row.read_at,
            created_at: row.created,
        }
    }
}

/// Request body for sending a message.
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
}

/// A conversation with its full message history.
#[derive(Debug, Serialize)]
pub struct ConversationDetail {
    pub conversation: ConversationView,
    pub messages: Vec<MessageView>,
}

/// Response for the mark-read operation.
#[derive(Debug, Serialize)]
pub struct MarkReadResponse {
    pub updated: u64,
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET /conversations - The caller's conversations.
async fn list_conversations(
    State(state): State<AppState>,
    Identity(user): Identity,
) -> ApiResult<Json<Vec<ConversationView>>> {
    let rows = state.exchange().conversations.list_for(user).await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

/// GET /conversations/{id} - One conversation with messages.
async fn get_conversation(
    State(state): State<AppState>,
    Identity(user): Identity,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ConversationDetail>> {
    let (conversation, messages) = state
        .exchange()
        .conversations
        .get_with_messages(ConversationId(id), user)
        .await?;

    Ok(Json(ConversationDetail {
        conversation: conversation.into(),
        messages: messages.into_iter().map(Into::into).collect(),
    }))
}

/// POST /conversations/{id}/messages - Send a message.
///
/// Fails `Forbidden` for non-participants and 409 once the conversation
/// has ended.
async fn send_message(
    State(state): State<AppState>,
    Identity(user): Identity,
    Path(id): Path<Uuid>,
    Json(request): Json<SendMessageRequest>,
) -> ApiResult<(StatusCode, Json<MessageView>)> {
    let row = state
        .exchange()
        .conversations
        .post_user_message(ConversationId(id), user, request.content)
        .await?;

    Ok((StatusCode::CREATED, Json(row.into())))
}

/// PUT /conversations/{id}/messages/read - Mark incoming messages read.
async fn mark_read(
    State(state): State<AppState>,
    Identity(user): Identity,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MarkReadResponse>> {
    let updated = state
        .exchange()
        .conversations
        .mark_read(ConversationId(id), user)
        .await?;

    Ok(Json(MarkReadResponse { updated }))
}

/// Build conversation routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/conversations", get(list_conversations))
        .route("/conversations/{id}", get(get_conversation))
        .route("/conversations/{id}/messages", post(send_message))
        .route("/conversations/{id}/messages/read", put(mark_read))
}

// ============================================================================
// Tests
// ============================================================================
