//! Conversation management.
//!
//! A conversation is scoped 1:1 to a trade offer and its two participants.
//! It is opened exactly once (on chat acceptance) and ended exactly once
//! (when the governing offer leaves `chat_accepted`). Only the two
//! participants can read it, and only while it is `active` can they write
//! to it.

use std::sync::Arc;

use bookswap_core::{
    ConversationId, ConversationStatus, EndReason, ListingId, MessageType, OfferId, UserId,
};
use bookswap_store::{ConversationRow, MessageRow, NewMessage, Store};

use crate::dispatch::NotificationDispatcher;
use crate::error::{ExchangeError, ExchangeResult};
use crate::push::{ChatMessageEvent, LivePush};

/// Creates, gates, and ends conversations; appends system and user
/// messages.
#[derive(Clone)]
pub struct ConversationManager {
    store: Store,
    dispatcher: NotificationDispatcher,
    push: Arc<dyn LivePush>,
}

impl ConversationManager {
    pub fn new(store: Store, dispatcher: NotificationDispatcher, push: Arc<dyn LivePush>) -> Self {
        Self {
            store,
            dispatcher,
            push,
        }
    }

    /// Open an `active` conversation for an offer.
    pub async fn open(
        &self,
        offer: OfferId,
        listing: ListingId,
        participants: [UserId; 2],
    ) -> ExchangeResult<ConversationRow> {
        let row = self
            .store
            .insert_conversation(offer.0, listing.0, &[participants[0].0, participants[1].0])
            .await?;

        tracing::info!(
            conversation_id = %row.id,
            offer_id = %offer,
            "Conversation opened"
        );
        Ok(row)
    }

    /// End a conversation with the given reason.
    ///
    /// Compare-and-swap on `active`: if the conversation was already ended
    /// this is a no-op and returns `None`.
    pub async fn close(
        &self,
        conversation: ConversationId,
        reason: EndReason,
    ) -> ExchangeResult<Option<ConversationRow>> {
        let ended = self.store.end_conversation(conversation.0, reason).await?;

        if let Some(ref row) = ended {
            tracing::info!(
                conversation_id = %row.id,
                reason = %reason,
                "Conversation ended"
            );
        }
        Ok(ended)
    }

    /// Append a system message narrating a lifecycle transition.
    ///
    /// Bypasses the active/ended gate — the engine narrates closings into
    /// conversations it just ended.
    pub async fn post_system_message(
        &self,
        conversation: ConversationId,
        sender: UserId,
        text: &str,
    ) -> ExchangeResult<MessageRow> {
        let row = self
            .store
            .insert_message(&NewMessage {
                conversation_id: conversation.0,
                sender: sender.0,
                content: text.to_string(),
                message_type: MessageType::System,
            })
            .await?;

        if let Some(event) = ChatMessageEvent::from_row(&row) {
            self.push.push_chat_message(conversation, event);
        }
        Ok(row)
    }

    /// Append a user message.
    ///
    /// Fails `Forbidden` for non-participants and `InvalidState` once the
    /// conversation has ended. On success the conversation's activity
    /// stamp is bumped, the message is pushed on the conversation's live
    /// channel, and the other participant is notified.
    pub async fn post_user_message(
        &self,
        conversation: ConversationId,
        sender: UserId,
        content: String,
    ) -> ExchangeResult<MessageRow> {
        let convo = self.store.get_conversation(conversation.0).await?;

        if !convo.is_participant(sender.0) {
            return Err(ExchangeError::Forbidden(
                "only participants may send messages to this conversation".to_string(),
            ));
        }

        if convo.conversation_status()? != ConversationStatus::Active {
            return Err(ExchangeError::InvalidState(
                "this conversation has ended; no new messages can be sent".to_string(),
            ));
        }

        if content.trim().is_empty() {
            return Err(ExchangeError::BadRequest(
                "message content must not be empty".to_string(),
            ));
        }

        let row = self
            .store
            .insert_message(&NewMessage {
                conversation_id: conversation.0,
                sender: sender.0,
                content,
                message_type: MessageType::User,
            })
            .await?;

        self.store.touch_conversation(conversation.0).await?;

        if let Some(event) = ChatMessageEvent::from_row(&row) {
            self.push.push_chat_message(conversation, event);
        }

        self.dispatcher
            .notify_new_message(&row, &convo.participants, convo.trade_offer)
            .await?;

        Ok(row)
    }

    /// Mark every message not authored by `reader` as read.
    pub async fn mark_read(
        &self,
        conversation: ConversationId,
        reader: UserId,
    ) -> ExchangeResult<u64> {
        let convo = self.store.get_conversation(conversation.0).await?;

        if !convo.is_participant(reader.0) {
            return Err(ExchangeError::Forbidden(
                "only participants may mark this conversation read".to_string(),
            ));
        }

        Ok(self.store.mark_messages_read(conversation.0, reader.0).await?)
    }

    /// A user's conversations, most recently active first.
    pub async fn list_for(&self, user: UserId) -> ExchangeResult<Vec<ConversationRow>> {
        Ok(self.store.list_conversations_for(user.0).await?)
    }

    /// A conversation with its full message history; participants only.
    pub async fn get_with_messages(
        &self,
        conversation: ConversationId,
        viewer: UserId,
    ) -> ExchangeResult<(ConversationRow, Vec<MessageRow>)> {
        let convo = self.store.get_conversation(conversation.0).await?;

        if !convo.is_participant(viewer.0) {
            return Err(ExchangeError::Forbidden(
                "only participants may view this conversation".to_string(),
            ));
        }

        let messages = self.store.list_messages(conversation.0).await?;
        Ok((convo, messages))
    }
}
