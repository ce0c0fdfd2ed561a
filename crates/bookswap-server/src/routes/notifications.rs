//! Notification endpoints.
//!
//! - `GET /notifications` — one page of the caller's notifications,
//!   newest first, with unread count
//! - `GET /notifications/unread-count` — just the unread count
//! - `PUT /notifications/mark-read` — mark the listed ids read (empty
//!   list marks everything)
//! - `PUT /notifications/mark-all-read` — mark everything read

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::{get, put},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use bookswap_core::NotificationId;
use bookswap_store::{NotificationQuery, NotificationRow};

use crate::error::ApiResult;
use crate::extract::Identity;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for the notification listing.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub unread_only: Option<bool>,
}

impl From<ListQuery> for NotificationQuery {
    fn from(q: ListQuery) -> Self {
        let defaults = NotificationQuery::default();
        Self {
            page: q.page.unwrap_or(defaults.page),
            limit: q.limit.unwrap_or(defaults.limit),
            unread_only: q.unread_only.unwrap_or(false),
        }
    }
}

/// Pagination block of the listing response.
#[derive(Debug, Serialize)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub pages: i64,
}

/// Response for the notification listing.
#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub notifications: Vec<NotificationRow>,
    pub pagination: Pagination,
    pub unread_count: i64,
}

/// Response carrying just the unread count.
#[derive(Debug, Serialize)]
pub struct UnreadCountResponse {
    pub unread_count: i64,
}

/// Request body for mark-read. An empty id list marks everything.
#[derive(Debug, Default, Deserialize)]
pub struct MarkReadRequest {
    #[serde(default)]
    pub notification_ids: Vec<Uuid>,
}

/// Response for the mark-read operations.
#[derive(Debug, Serialize)]
pub struct MarkReadResponse {
    pub updated: u64,
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET /notifications - One page of the caller's notifications.
async fn list_notifications(
    State(state): State<AppState>,
    Identity(user): Identity,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<ListResponse>> {
    let page = state
        .exchange()
        .notifications
        .list_for(user, query.into())
        .await?;

    Ok(Json(ListResponse {
        pagination: Pagination {
            page: page.page,
            limit: page.limit,
            total: page.total,
            pages: page.pages(),
        },
        unread_count: page.unread_count,
        notifications: page.notifications,
    }))
}

/// GET /notifications/unread-count - Unread count only.
async fn unread_count(
    State(state): State<AppState>,
    Identity(user): Identity,
) -> ApiResult<Json<UnreadCountResponse>> {
    let unread_count = state.exchange().notifications.unread_count(user).await?;
    Ok(Json(UnreadCountResponse { unread_count }))
}

/// PUT /notifications/mark-read - Mark the listed notifications read.
async fn mark_read(
    State(state): State<AppState>,
    Identity(user): Identity,
    body: Option<Json<MarkReadRequest>>,
) -> ApiResult<Json<MarkReadResponse>> {
    let ids = body.map(|Json(b)| b.notification_ids).unwrap_or_default();

    let ids = if ids.is_empty() {
        None
    } else {
        Some(ids.into_iter().map(NotificationId).collect())
    };

    let updated = state.exchange().notifications.mark_read(user, ids).await?;
    Ok(Json(MarkReadResponse { updated }))
}

/// PUT /notifications/mark-all-read - Mark everything read.
async fn mark_all_read(
    State(state): State<AppState>,
    Identity(user): Identity,
) -> ApiResult<Json<MarkReadResponse>> {
    let updated = state.exchange().notifications.mark_read(user, None).await?;
    Ok(Json(MarkReadResponse { updated }))
}

/// Build notification routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/notifications", get(list_notifications))
        .route("/notifications/unread-count", get(unread_count))
        .route("/notifications/mark-read", put(mark_read))
        .route("/notifications/mark-all-read", put(mark_all_read))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_query_defaults() {
        let q: ListQuery = serde_json::from_str("{}").unwrap();
        let query: NotificationQuery = q.into();
        assert_eq!(query.page, 1);
        assert_eq!(query.limit, 20);
        assert!(!query.unread_only);
    }

    #[test]
    fn mark_read_request_defaults_to_empty() {
        let request: MarkReadRequest = serde_json::from_str("{}").unwrap();
        assert!(request.notification_ids.is_empty());
    }

    #[test]
    fn pagination_serializes() {
        let response = ListResponse {
            notifications: vec![],
            pagination: Pagination {
                page: 2,
                limit: 20,
                total: 41,
                pages: 3,
            },
            unread_count: 7,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["pagination"]["pages"], 3);
        assert_eq!(json["unread_count"], 7);
    }
}
