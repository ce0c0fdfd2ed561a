//! Database models for the storage layer.
//!
//! These types map directly to database rows and are used for sqlx
//! queries. Status columns are stored as their snake_case wire strings and
//! parsed back through the `bookswap-core` enums; embedded documents
//! (offered book, notification data) are JSONB.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use bookswap_core::{
    ConversationStatus, EndReason, ListingStatus, MessageType, NotificationData,
    NotificationPriority, NotificationType, OfferStatus, OfferedBook, ParseEnumError, ReviewStatus,
};

// ==================== Users ====================

/// Database row for the `users` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub avatar: Option<String>,
    pub city: Option<String>,
    pub is_active: bool,
    pub rating: f64,
    pub total_ratings: i32,
    pub total_trades: i32,
    pub successful_trades: i32,
    pub pending_reviews: i32,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

/// Input for creating a new user.
///
/// Account registration itself is an external concern; the store exposes
/// this for bootstrap and test fixtures.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub avatar: Option<String>,
    pub city: Option<String>,
}

// ==================== Listings ====================

/// Database row for the `listings` table.
#[derive(Debug, Clone, FromRow)]
pub struct ListingRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub book_title: String,
    pub author: String,
    pub isbn: Option<String>,
    pub category: String,
    pub condition: String,
    pub images: Vec<String>,
    pub description: Option<String>,
    pub city: Option<String>,
    pub status: String,
    pub offer_count: i32,
    pub completed_trade_offer: Option<Uuid>,
    pub completed_date: Option<DateTime<Utc>>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl ListingRow {
    /// Parse the status column.
    pub fn listing_status(&self) -> Result<ListingStatus, ParseEnumError> {
        self.status.parse()
    }
}

/// Input for creating a new listing.
///
/// Listing CRUD is an external collaborator; this input exists for
/// fixtures and the external surface's insert path.
#[derive(Debug, Clone)]
pub struct NewListing {
    pub owner_id: Uuid,
    pub book_title: String,
    pub author: String,
    pub isbn: Option<String>,
    pub category: String,
    pub condition: String,
    pub images: Vec<String>,
    pub description: Option<String>,
    pub city: Option<String>,
}

// ==================== Trade Offers ====================

/// Database row for the `trade_offers` table.
#[derive(Debug, Clone, FromRow)]
pub struct TradeOfferRow {
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
    pub from_user_reviewed: bool,
    pub to_user_reviewed: bool,
    pub both_reviewed: bool,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl TradeOfferRow {
    /// Parse the status column.
    pub fn offer_status(&self) -> Result<OfferStatus, ParseEnumError> {
        self.status.parse()
    }

    /// Parse the offered_book JSONB document.
    pub fn offered_book(&self) -> Result<OfferedBook, serde_json::Error> {
        serde_json::from_value(self.offered_book.clone())
    }

    /// The review flags as a domain value.
    pub fn review_status(&self) -> ReviewStatus {
        ReviewStatus {
            from_user_reviewed: self.from_user_reviewed,
            to_user_reviewed: self.to_user_reviewed,
            both_reviewed: self.both_reviewed,
        }
    }

    /// Whether `user` is a party to this offer.
    pub fn is_party(&self, user: Uuid) -> bool {
        self.from_user == user || self.to_user == user
    }

    /// The other party of the offer, if `user` is one of them.
    pub fn counterpart_of(&self, user: Uuid) -> Option<Uuid> {
        if user == self.from_user {
            Some(self.to_user)
        } else if user == self.to_user {
            Some(self.from_user)
        } else {
            None
        }
    }
}

/// Input for creating a new trade offer.
///
/// `to_user` is not part of the input: the store derives it from the
/// listing's owner inside the creation transaction.
#[derive(Debug, Clone)]
pub struct NewTradeOffer {
    pub from_user: Uuid,
    pub target_listing: Uuid,
    pub offered_book: OfferedBook,
    pub message: Option<String>,
}

/// Field updates applied together with a compare-and-swap status change.
///
/// Each lifecycle transition stamps a different subset; unset fields are
/// left untouched by the update.
#[derive(Debug, Clone, Default)]
pub struct OfferUpdate {
    /// Stamp `chat_accepted_date = NOW()`.
    pub stamp_chat_accepted: bool,
    /// Stamp `response_date = NOW()`.
    pub stamp_response: bool,
    /// Stamp `completed_date = NOW()`.
    pub stamp_completed: bool,
    /// Set the recipient's (or archiver's) response text.
    pub response_message: Option<String>,
    /// Flag the offer as archived by its proposer.
    pub archived_by_user: bool,
}

// ==================== Conversations ====================

/// Database row for the `conversations` table.
#[derive(Debug, Clone, FromRow)]
pub struct ConversationRow {
    pub id: Uuid,
    pub trade_offer: Uuid,
    pub listing_id: Uuid,
    pub participants: Vec<Uuid>,
    pub status: String,
    pub end_reason: Option<String>,
    pub ended_at: Option<DateTime<Utc>>,
    pub last_message_at: DateTime<Utc>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl ConversationRow {
    /// Parse the status column.
    pub fn conversation_status(&self) -> Result<ConversationStatus, ParseEnumError> {
        self.status.parse()
    }

    /// Parse the end_reason column, if set.
    pub fn end_reason(&self) -> Result<Option<EndReason>, ParseEnumError> {
        self.end_reason.as_deref().map(str::parse).transpose()
    }

    /// Whether `user` participates in this conversation.
    pub fn is_participant(&self, user: Uuid) -> bool {
        self.participants.contains(&user)
    }
}

// ==================== Messages ====================

/// Database row for the `messages` table.
#[derive(Debug, Clone, FromRow)]
pub struct MessageRow {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender: Uuid,
    pub content: String,
    pub message_type: String,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub created: DateTime<Utc>,
}

impl MessageRow {
    /// Parse the message_type column.
    pub fn message_type(&self) -> Result<MessageType, ParseEnumError> {
        self.message_type.parse()
    }
}

/// Input for creating a new message.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub conversation_id: Uuid,
    pub sender: Uuid,
    pub content: String,
    pub message_type: MessageType,
}

// ==================== Notifications ====================

/// Database row for the `notifications` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct NotificationRow {
    pub id: Uuid,
    pub recipient: Uuid,
    pub sender: Option<Uuid>,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub notification_type: String,
    pub title: String,
    pub message: String,
    pub data: serde_json::Value,
    pub priority: String,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub created: DateTime<Utc>,
}

impl NotificationRow {
    /// Parse the type column.
    pub fn notification_type(&self) -> Result<NotificationType, ParseEnumError> {
        self.notification_type.parse()
    }

    /// Parse the data JSONB document.
    pub fn data(&self) -> Result<NotificationData, serde_json::Error> {
        serde_json::from_value(self.data.clone())
    }
}

/// Input for creating a new notification.
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub recipient: Uuid,
    pub sender: Option<Uuid>,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub data: NotificationData,
    pub priority: NotificationPriority,
}

/// Query parameters for listing a user's notifications.
#[derive(Debug, Clone, Copy)]
pub struct NotificationQuery {
    /// 1-based page number.
    pub page: i64,
    /// Page size.
    pub limit: i64,
    /// Restrict to unread notifications.
    pub unread_only: bool,
}

impl Default for NotificationQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 20,
            unread_only: false,
        }
    }
}

impl NotificationQuery {
    /// Clamp page/limit into sane bounds.
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            page: self.page.max(1),
            limit: self.limit.clamp(1, 100),
            unread_only: self.unread_only,
        }
    }

    /// Row offset of the first item on the requested page.
    #[must_use]
    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }
}

/// One page of a user's notifications plus the running unread count.
#[derive(Debug, Clone)]
pub struct NotificationPage {
    pub notifications: Vec<NotificationRow>,
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub unread_count: i64,
}

impl NotificationPage {
    /// Total number of pages for the query.
    #[must_use]
    pub fn pages(&self) -> i64 {
        if self.total == 0 {
            0
        } else {
            (self.total as u64).div_ceil(self.limit as u64) as i64
        }
    }
}

// ==================== Reviews ====================

/// Database row for the `reviews` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ReviewRow {
    pub id: Uuid,
    pub trade_offer: Uuid,
    pub reviewer: Uuid,
    pub reviewee: Uuid,
    pub rating: i32,
    pub comment: Option<String>,
    pub is_visible: bool,
    pub created: DateTime<Utc>,
}

/// Input for creating a new review.
#[derive(Debug, Clone)]
pub struct NewReview {
    pub trade_offer: Uuid,
    pub reviewer: Uuid,
    pub reviewee: Uuid,
    pub rating: i32,
    pub comment: Option<String>,
}

/// An accepted offer still awaiting a review from the queried user,
/// joined with the counterpart's username.
#[derive(Debug, Clone, FromRow)]
pub struct PendingReviewRow {
    #[sqlx(flatten)]
    pub offer: TradeOfferRow,
    pub reviewee_id: Uuid,
    pub reviewee_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookswap_core::BookCondition;

    fn sample_offer_row(status: &str) -> TradeOfferRow {
        TradeOfferRow {
            id: Uuid::new_v4(),
            from_user: Uuid::new_v4(),
            to_user: Uuid::new_v4(),
            target_listing: Uuid::new_v4(),
            offered_book: serde_json::json!({
                "book_title": "Foundation",
                "author": "Isaac Asimov",
                "category": "sci-fi",
                "condition": "good",
            }),
            message: None,
            status: status.to_string(),
            chat_accepted_date: None,
            response_message: None,
            response_date: None,
            completed_date: None,
            conversation_id: None,
            archived_by_user: false,
            from_user_reviewed: false,
            to_user_reviewed: false,
            both_reviewed: false,
            created: Utc::now(),
            updated: Utc::now(),
        }
    }

    #[test]
    fn offer_row_status_parses() {
        let row = sample_offer_row("chat_accepted");
        assert_eq!(row.offer_status().unwrap(), OfferStatus::ChatAccepted);
    }

    #[test]
    fn offer_row_bad_status_is_error() {
        let row = sample_offer_row("negotiating");
        assert!(row.offer_status().is_err());
    }

    #[test]
    fn offer_row_book_parses() {
        let row = sample_offer_row("pending");
        let book = row.offered_book().unwrap();
        assert_eq!(book.book_title, "Foundation");
        assert_eq!(book.condition, BookCondition::Good);
    }

    #[test]
    fn offer_row_counterpart() {
        let row = sample_offer_row("pending");
        assert_eq!(row.counterpart_of(row.from_user), Some(row.to_user));
        assert_eq!(row.counterpart_of(row.to_user), Some(row.from_user));
        assert_eq!(row.counterpart_of(Uuid::new_v4()), None);
    }

    #[test]
    fn notification_query_normalization() {
        let q = NotificationQuery {
            page: 0,
            limit: 10_000,
            unread_only: true,
        }
        .normalized();
        assert_eq!(q.page, 1);
        assert_eq!(q.limit, 100);
        assert_eq!(q.offset(), 0);

        let q = NotificationQuery {
            page: 3,
            limit: 20,
            unread_only: false,
        }
        .normalized();
        assert_eq!(q.offset(), 40);
    }

    #[test]
    fn notification_page_count() {
        let page = NotificationPage {
            notifications: vec![],
            page: 1,
            limit: 20,
            total: 41,
            unread_count: 3,
        };
        assert_eq!(page.pages(), 3);

        let empty = NotificationPage {
            notifications: vec![],
            page: 1,
            limit: 20,
            total: 0,
            unread_count: 0,
        };
        assert_eq!(empty.pages(), 0);
    }
}
