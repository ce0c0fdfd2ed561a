//! Notification dispatch: persist, then push.
//!
//! The dispatcher knows nothing about offer semantics — callers pick the
//! type, texts, and references. Persistence must succeed for the calling
//! operation to succeed; the live push afterwards is a best-effort latency
//! optimization and can never fail the caller.

use std::sync::Arc;

use uuid::Uuid;

use bookswap_core::{
    ConversationId, EndReason, ListingId, NotificationData, NotificationId, NotificationPriority,
    NotificationType, OfferId, ReviewId, UserId,
};
use bookswap_store::{
    MessageRow, NewNotification, NotificationPage, NotificationQuery, NotificationRow, ReviewRow,
    Store, TradeOfferRow,
};

use crate::error::ExchangeResult;
use crate::push::{LivePush, NotificationEvent};

/// Persists notification records and pushes them to live recipients.
#[derive(Clone)]
pub struct NotificationDispatcher {
    store: Store,
    push: Arc<dyn LivePush>,
}

impl NotificationDispatcher {
    pub fn new(store: Store, push: Arc<dyn LivePush>) -> Self {
        Self { store, push }
    }

    /// Persist a notification, then attempt the live push.
    pub async fn notify(&self, notification: NewNotification) -> ExchangeResult<NotificationRow> {
        let row = self.store.insert_notification(&notification).await?;

        match NotificationEvent::from_row(&row) {
            Some(event) => {
                self.push
                    .push_notification(UserId(row.recipient), event);
            }
            None => {
                tracing::warn!(notification_id = %row.id, "Skipping push for unparseable notification row");
            }
        }

        Ok(row)
    }

    // ==================== Offer Notifications ====================

    /// Tell the listing owner a new offer arrived.
    pub async fn notify_new_offer(&self, offer: &TradeOfferRow) -> ExchangeResult<()> {
        let book_title = offer
            .offered_book()
            .map(|b| b.book_title)
            .unwrap_or_else(|_| "a book".to_string());

        self.notify(NewNotification {
            recipient: offer.to_user,
            sender: Some(offer.from_user),
            notification_type: NotificationType::NewOffer,
            title: "New offer received".to_string(),
            message: format!("You received a new offer: \"{book_title}\"."),
            data: offer_data(offer),
            priority: NotificationPriority::High,
        })
        .await?;
        Ok(())
    }

    /// Tell the proposer their chat was accepted, carrying the new
    /// conversation's id.
    pub async fn notify_offer_chat_accepted(
        &self,
        offer: &TradeOfferRow,
        conversation_id: Uuid,
    ) -> ExchangeResult<()> {
        self.notify(NewNotification {
            recipient: offer.from_user,
            sender: Some(offer.to_user),
            notification_type: NotificationType::OfferChatAccepted,
            title: "Chat accepted".to_string(),
            message: "The chat for your offer was accepted. You can now talk!".to_string(),
            data: NotificationData {
                offer_id: Some(OfferId(offer.id)),
                conversation_id: Some(ConversationId(conversation_id)),
                ..NotificationData::default()
            },
            priority: NotificationPriority::High,
        })
        .await?;
        Ok(())
    }

    /// Tell the proposer their offer was accepted and the trade completed.
    pub async fn notify_offer_accepted(&self, offer: &TradeOfferRow) -> ExchangeResult<()> {
        self.notify(NewNotification {
            recipient: offer.from_user,
            sender: Some(offer.to_user),
            notification_type: NotificationType::OfferAccepted,
            title: "Offer accepted".to_string(),
            message: "Your offer was accepted! The trade is complete.".to_string(),
            data: offer_data(offer),
            priority: NotificationPriority::High,
        })
        .await?;
        Ok(())
    }

    /// Tell the proposer their offer was rejected.
    pub async fn notify_offer_rejected(&self, offer: &TradeOfferRow) -> ExchangeResult<()> {
        self.notify(NewNotification {
            recipient: offer.from_user,
            sender: Some(offer.to_user),
            notification_type: NotificationType::OfferRejected,
            title: "Offer rejected".to_string(),
            message: "Unfortunately your offer was rejected.".to_string(),
            data: offer_data(offer),
            priority: NotificationPriority::Medium,
        })
        .await?;
        Ok(())
    }

    /// Tell the recipient the proposer withdrew.
    pub async fn notify_offer_cancelled(&self, offer: &TradeOfferRow) -> ExchangeResult<()> {
        self.notify(NewNotification {
            recipient: offer.to_user,
            sender: Some(offer.from_user),
            notification_type: NotificationType::OfferCancelled,
            title: "Offer cancelled".to_string(),
            message: "An offer sent to you was cancelled.".to_string(),
            data: offer_data(offer),
            priority: NotificationPriority::Low,
        })
        .await?;
        Ok(())
    }

    // ==================== Chat Notifications ====================

    /// Tell every participant except the sender a message arrived.
    pub async fn notify_new_message(
        &self,
        message: &MessageRow,
        participants: &[Uuid],
        trade_offer: Uuid,
    ) -> ExchangeResult<()> {
        for &recipient in participants.iter().filter(|&&p| p != message.sender) {
            self.notify(NewNotification {
                recipient,
                sender: Some(message.sender),
                notification_type: NotificationType::NewMessage,
                title: "New message".to_string(),
                message: "You have a new message.".to_string(),
                data: NotificationData::for_conversation(
                    ConversationId(message.conversation_id),
                    OfferId(trade_offer),
                ),
                priority: NotificationPriority::Medium,
            })
            .await?;
        }
        Ok(())
    }

    /// Tell both participants their conversation ended.
    pub async fn notify_conversation_ended(
        &self,
        conversation_id: Uuid,
        trade_offer: Uuid,
        participants: &[Uuid],
        reason: EndReason,
    ) -> ExchangeResult<()> {
        for &recipient in participants {
            self.notify(NewNotification {
                recipient,
                sender: None,
                notification_type: NotificationType::ConversationEnded,
                title: "Chat ended".to_string(),
                message: conversation_ended_text(reason).to_string(),
                data: NotificationData::for_conversation(
                    ConversationId(conversation_id),
                    OfferId(trade_offer),
                ),
                priority: NotificationPriority::Low,
            })
            .await?;
        }
        Ok(())
    }

    // ==================== Review Notifications ====================

    /// Tell the reviewee a review arrived.
    pub async fn notify_review_received(&self, review: &ReviewRow) -> ExchangeResult<()> {
        self.notify(NewNotification {
            recipient: review.reviewee,
            sender: Some(review.reviewer),
            notification_type: NotificationType::ReviewReceived,
            title: "New review received".to_string(),
            message: format!("You received a {}-star review.", review.rating),
            data: NotificationData::for_review(
                ReviewId(review.id),
                OfferId(review.trade_offer),
            ),
            priority: NotificationPriority::Low,
        })
        .await?;
        Ok(())
    }

    // ==================== Queries ====================

    /// One page of a user's notifications, newest first, with unread
    /// count.
    pub async fn list_for(
        &self,
        user: UserId,
        query: NotificationQuery,
    ) -> ExchangeResult<NotificationPage> {
        Ok(self.store.list_notifications(user.0, &query).await?)
    }

    /// Number of unread notifications.
    pub async fn unread_count(&self, user: UserId) -> ExchangeResult<i64> {
        Ok(self.store.unread_notification_count(user.0).await?)
    }

    /// Mark the given notifications (or all unread ones) as read.
    pub async fn mark_read(
        &self,
        user: UserId,
        ids: Option<Vec<NotificationId>>,
    ) -> ExchangeResult<u64> {
        let raw: Option<Vec<Uuid>> = ids.map(|ids| ids.into_iter().map(|id| id.0).collect());
        Ok(self
            .store
            .mark_notifications_read(user.0, raw.as_deref())
            .await?)
    }
}

fn offer_data(offer: &TradeOfferRow) -> NotificationData {
    NotificationData::for_offer(
        OfferId(offer.id),
        ListingId(offer.target_listing),
    )
}

/// Reason-specific text for the conversation-ended notification.
fn conversation_ended_text(reason: EndReason) -> &'static str {
    match reason {
        EndReason::OfferAccepted => "The offer was accepted; the chat has been closed.",
        EndReason::OfferRejected => "The offer was rejected; the chat has been closed.",
        EndReason::OfferArchived => "The offer was archived; the chat has been closed.",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversation_ended_texts_name_the_reason() {
        assert!(conversation_ended_text(EndReason::OfferAccepted).contains("accepted"));
        assert!(conversation_ended_text(EndReason::OfferRejected).contains("rejected"));
        assert!(conversation_ended_text(EndReason::OfferArchived).contains("archived"));
    }
}
