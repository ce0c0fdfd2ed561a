//! The live-push capability the engine depends on.
//!
//! The domain core never touches the transport. The transport layer owns a
//! connection registry and hands the engine a [`LivePush`] implementation;
//! `push_*` is fire-and-forget — delivery to an offline recipient is
//! silently skipped, and the persisted record remains the durable source
//! of truth.

use chrono::{DateTime, Utc};
use serde::Serialize;

use bookswap_core::{
    ConversationId, MessageId, MessageType, NotificationData, NotificationId,
    NotificationPriority, NotificationType, UserId,
};
use bookswap_store::{MessageRow, NotificationRow};

/// A notification event published on a recipient's per-user channel.
#[derive(Debug, Clone, Serialize)]
pub struct NotificationEvent {
    pub id: NotificationId,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub data: NotificationData,
    pub priority: NotificationPriority,
    pub created_at: DateTime<Utc>,
}

impl NotificationEvent {
    /// Build the push event from a freshly persisted row.
    ///
    /// Rows written by this process always parse; a row that does not is
    /// reported as `None` and the push skipped.
    pub fn from_row(row: &NotificationRow) -> Option<Self> {
        Some(Self {
            id: NotificationId(row.id),
            notification_type: row.notification_type().ok()?,
            title: row.title.clone(),
            message: row.message.clone(),
            data: row.data().ok()?,
            priority: row.priority.parse().ok()?,
            created_at: row.created,
        })
    }
}

/// A chat message event published on a per-conversation channel.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessageEvent {
    pub id: MessageId,
    pub conversation_id: ConversationId,
    pub sender: UserId,
    pub content: String,
    pub message_type: MessageType,
    pub created_at: DateTime<Utc>,
}

impl ChatMessageEvent {
    pub fn from_row(row: &MessageRow) -> Option<Self> {
        Some(Self {
            id: MessageId(row.id),
            conversation_id: ConversationId(row.conversation_id),
            sender: UserId(row.sender),
            content: row.content.clone(),
            message_type: row.message_type().ok()?,
            created_at: row.created,
        })
    }
}

/// Best-effort delivery to live subscribers.
///
/// Implementations must not block and must not fail the caller: a
/// disconnected recipient is a no-op.
pub trait LivePush: Send + Sync {
    /// Publish a notification on the recipient's per-user channel.
    fn push_notification(&self, recipient: UserId, event: NotificationEvent);

    /// Publish a chat message on its conversation's channel.
    fn push_chat_message(&self, conversation: ConversationId, event: ChatMessageEvent);
}

/// A `LivePush` that drops everything. Used where no transport is wired
/// up (tests, offline tooling).
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPush;

impl LivePush for NoopPush {
    fn push_notification(&self, _recipient: UserId, _event: NotificationEvent) {}

    fn push_chat_message(&self, _conversation: ConversationId, _event: ChatMessageEvent) {}
}
