//! The connection registry for real-time delivery.
//!
//! The transport layer owns all live channels; the domain engine only
//! sees the `LivePush` capability. Two channel families exist:
//!
//! - one broadcast channel per user, carrying that user's notification
//!   events
//! - one broadcast channel per conversation, carrying live chat messages
//!
//! Channels are created lazily on first subscription or first publish and
//! can be swept once all subscribers disconnect. Publishing to a channel
//! nobody listens on is a no-op — the persisted record is the durable
//! source of truth, the push only shaves latency for connected clients.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

use bookswap_core::{ConversationId, UserId};
use bookswap_exchange::{ChatMessageEvent, LivePush, NotificationEvent};

/// Default channel capacity for broadcast channels.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Heartbeat interval in seconds.
pub const HEARTBEAT_INTERVAL_SECS: u64 = 30;

/// Heartbeat payload sent to keep SSE connections alive.
#[derive(Debug, Clone, Serialize)]
pub struct HeartbeatEvent {
    pub timestamp: DateTime<Utc>,
}

/// Sent when a subscriber's buffer overflowed and events were dropped.
/// The client should re-sync via the REST listing endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct CatchupEvent {
    pub events_missed: u64,
    pub timestamp: DateTime<Utc>,
}

/// Holds the live channels for users and conversations.
///
/// Uses synchronous locks: publishes come from the engine's fire-and-forget
/// path and must not await, and the critical sections only touch the map.
#[derive(Debug)]
pub struct ChannelRegistry {
    users: RwLock<HashMap<Uuid, broadcast::Sender<NotificationEvent>>>,
    conversations: RwLock<HashMap<Uuid, broadcast::Sender<ChatMessageEvent>>>,
    capacity: usize,
}

impl Default for ChannelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelRegistry {
    /// Create a new registry with default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a new registry with custom capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            conversations: RwLock::new(HashMap::new()),
            capacity,
        }
    }

    /// Subscribe to a user's notification channel, creating it if needed.
    pub fn subscribe_user(&self, user: UserId) -> broadcast::Receiver<NotificationEvent> {
        Self::subscribe(&self.users, user.0, self.capacity)
    }

    /// Subscribe to a conversation's chat channel, creating it if needed.
    pub fn subscribe_conversation(
        &self,
        conversation: ConversationId,
    ) -> broadcast::Receiver<ChatMessageEvent> {
        Self::subscribe(&self.conversations, conversation.0, self.capacity)
    }

    fn subscribe<E: Clone>(
        channels: &RwLock<HashMap<Uuid, broadcast::Sender<E>>>,
        key: Uuid,
        capacity: usize,
    ) -> broadcast::Receiver<E> {
        {
            let channels = channels.read().expect("channel registry lock poisoned");
            if let Some(sender) = channels.get(&key) {
                return sender.subscribe();
            }
        }

        let mut channels = channels.write().expect("channel registry lock poisoned");
        // Check again in case another task created it
        if let Some(sender) = channels.get(&key) {
            return sender.subscribe();
        }

        let (sender, receiver) = broadcast::channel(capacity);
        channels.insert(key, sender);

        tracing::debug!(channel = %key, capacity, "Created event channel");

        receiver
    }

    fn publish<E: Clone>(
        channels: &RwLock<HashMap<Uuid, broadcast::Sender<E>>>,
        key: Uuid,
        event: E,
    ) -> usize {
        let channels = channels.read().expect("channel registry lock poisoned");
        match channels.get(&key) {
            Some(sender) => sender.send(event).unwrap_or(0),
            None => 0,
        }
    }

    /// Number of live user channels.
    pub fn user_channel_count(&self) -> usize {
        self.users.read().expect("channel registry lock poisoned").len()
    }

    /// Number of subscribers on a user's channel.
    pub fn user_subscriber_count(&self, user: UserId) -> usize {
        self.users
            .read()
            .expect("channel registry lock poisoned")
            .get(&user.0)
            .map(|s| s.receiver_count())
            .unwrap_or(0)
    }

    /// Drop channels with no subscribers. Returns how many were removed.
    pub fn cleanup_empty_channels(&self) -> usize {
        Self::sweep(&self.users) + Self::sweep(&self.conversations)
    }

    fn sweep<E>(channels: &RwLock<HashMap<Uuid, broadcast::Sender<E>>>) -> usize {
        let mut map = channels.write().expect("channel registry lock poisoned");
        let before = map.len();
        map.retain(|_, sender| sender.receiver_count() > 0);
        before - map.len()
    }
}

impl LivePush for ChannelRegistry {
    fn push_notification(&self, recipient: UserId, event: NotificationEvent) {
        let delivered = Self::publish(&self.users, recipient.0, event);
        tracing::trace!(user = %recipient, delivered, "Pushed notification event");
    }

    fn push_chat_message(&self, conversation: ConversationId, event: ChatMessageEvent) {
        let delivered = Self::publish(&self.conversations, conversation.0, event);
        tracing::trace!(conversation = %conversation, delivered, "Pushed chat event");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookswap_core::{NotificationData, NotificationPriority, NotificationType};
    use std::sync::Arc;

    fn sample_event() -> NotificationEvent {
        NotificationEvent {
            id: bookswap_core::NotificationId::new(),
            notification_type: NotificationType::NewOffer,
            title: "New offer received".to_string(),
            message: "You received a new offer.".to_string(),
            data: NotificationData::default(),
            priority: NotificationPriority::High,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn subscribe_creates_channel() {
        let registry = ChannelRegistry::new();
        let user = UserId::new();

        let _receiver = registry.subscribe_user(user);
        assert_eq!(registry.user_channel_count(), 1);
        assert_eq!(registry.user_subscriber_count(user), 1);
    }

    #[tokio::test]
    async fn publish_reaches_subscriber() {
        let registry = Arc::new(ChannelRegistry::new());
        let user = UserId::new();

        let mut receiver = registry.subscribe_user(user);
        registry.push_notification(user, sample_event());

        let event = receiver.recv().await.unwrap();
        assert_eq!(event.notification_type, NotificationType::NewOffer);
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_noop() {
        let registry = Arc::new(ChannelRegistry::new());
        // Must not panic or create a channel.
        registry.push_notification(UserId::new(), sample_event());
        assert_eq!(registry.user_channel_count(), 0);
    }

    #[tokio::test]
    async fn conversation_channel_is_separate() {
        let registry = Arc::new(ChannelRegistry::new());
        let conversation = ConversationId::new();

        let mut receiver = registry.subscribe_conversation(conversation);

        let event = ChatMessageEvent {
            id: bookswap_core::MessageId::new(),
            conversation_id: conversation,
            sender: UserId::new(),
            content: "hello".to_string(),
            message_type: bookswap_core::MessageType::User,
            created_at: Utc::now(),
        };
        registry.push_chat_message(conversation, event);

        let received = receiver.recv().await.unwrap();
        assert_eq!(received.content, "hello");
    }

    #[tokio::test]
    async fn cleanup_removes_orphaned_channels() {
        let registry = ChannelRegistry::new();
        let user = UserId::new();

        {
            let _receiver = registry.subscribe_user(user);
            assert_eq!(registry.user_channel_count(), 1);
        }
        // receiver dropped

        let cleaned = registry.cleanup_empty_channels();
        assert_eq!(cleaned, 1);
        assert_eq!(registry.user_channel_count(), 0);
    }

    #[test]
    fn catchup_event_serialization() {
        let event = CatchupEvent {
            events_missed: 12,
            timestamp: Utc::now(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"events_missed\":12"));
    }
}
