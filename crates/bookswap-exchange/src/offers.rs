//! The trade-offer lifecycle orchestrator.
//!
//! Each operation follows the same shape:
//!
//! 1. Load the offer and resolve the caller's role on it
//! 2. Ask the transition table (`bookswap_core::lifecycle`) whether the
//!    `(status, action, role)` combination is legal and which side
//!    effects it implies
//! 3. Apply the status change as a compare-and-swap against the status
//!    that was just read — if another actor's write landed first, the
//!    swap misses and the caller gets `InvalidState`
//! 4. Run the side effects in fixed order: listing guard, conversation
//!    manager, notification dispatcher
//!
//! Offer creation has no prior state; it validates the input, then runs
//! the exclusivity checks and the insert inside one listing-locked
//! transaction in the store.

use bookswap_core::{
    ActorRole, ConversationId, ListingId, OfferAction, OfferId, OfferedBook, Transition, UserId,
    transition,
};
use bookswap_store::{NewTradeOffer, OfferUpdate, Store, TradeOfferRow};

use crate::conversations::ConversationManager;
use crate::dispatch::NotificationDispatcher;
use crate::error::{ExchangeError, ExchangeResult};
use crate::listings::ListingGuard;

/// Upper bound on the free-text message attached to an offer or a
/// response.
const MAX_MESSAGE_LEN: usize = 1000;

/// Response text stamped on self-archived offers.
const ARCHIVED_RESPONSE: &str = "Archived by the proposer";

/// Input for creating a trade offer.
#[derive(Debug, Clone)]
pub struct CreateOffer {
    pub from_user: UserId,
    pub target_listing: ListingId,
    pub offered_book: OfferedBook,
    pub message: Option<String>,
}

/// Orchestrates the trade-offer state machine across the store, the
/// listing guard, the conversation manager, and the dispatcher.
#[derive(Clone)]
pub struct TradeOfferEngine {
    store: Store,
    guard: ListingGuard,
    conversations: ConversationManager,
    dispatcher: NotificationDispatcher,
}

impl TradeOfferEngine {
    pub fn new(
        store: Store,
        guard: ListingGuard,
        conversations: ConversationManager,
        dispatcher: NotificationDispatcher,
    ) -> Self {
        Self {
            store,
            guard,
            conversations,
            dispatcher,
        }
    }

    // ==================== Creation ====================

    /// Create a new offer against an active listing.
    ///
    /// Refusals: `NotFound` (listing absent), `InvalidState` (listing not
    /// active), `Forbidden` (own listing), `Conflict` (listing held by
    /// another offer, or the proposer was already rejected here).
    pub async fn create_offer(&self, input: CreateOffer) -> ExchangeResult<TradeOfferRow> {
        validate_create(&input)?;

        // Courtesy check for a friendly early refusal; the insert re-checks
        // under the listing row lock.
        self.guard.assert_no_active_offer(input.target_listing).await?;

        let row = self
            .store
            .insert_offer(&NewTradeOffer {
                from_user: input.from_user.0,
                target_listing: input.target_listing.0,
                offered_book: input.offered_book,
                message: input.message,
            })
            .await?;

        tracing::info!(
            offer_id = %row.id,
            listing_id = %row.target_listing,
            from_user = %row.from_user,
            "Offer created"
        );

        self.dispatcher.notify_new_offer(&row).await?;

        Ok(row)
    }

    // ==================== Transitions ====================

    /// First-stage approval by the recipient: opens the conversation.
    pub async fn accept_chat(
        &self,
        offer: OfferId,
        actor: UserId,
    ) -> ExchangeResult<(TradeOfferRow, ConversationId)> {
        let (mut row, t) = self
            .apply(
                offer,
                actor,
                OfferAction::AcceptChat,
                OfferUpdate {
                    stamp_chat_accepted: true,
                    ..OfferUpdate::default()
                },
            )
            .await?;

        debug_assert!(t.opens_conversation);
        let conversation = self
            .conversations
            .open(
                OfferId(row.id),
                ListingId(row.target_listing),
                [UserId(row.from_user), UserId(row.to_user)],
            )
            .await?;
        self.store.link_conversation(row.id, conversation.id).await?;
        row.conversation_id = Some(conversation.id);

        self.conversations
            .post_system_message(
                ConversationId(conversation.id),
                UserId(row.to_user),
                "Chat accepted. You can now talk to each other!",
            )
            .await?;

        self.dispatcher
            .notify_offer_chat_accepted(&row, conversation.id)
            .await?;

        Ok((row, ConversationId(conversation.id)))
    }

    /// Second-stage, final approval by the recipient: completes the trade.
    ///
    /// Only reachable from `chat_accepted` — a direct `pending → accepted`
    /// call fails `InvalidState`.
    pub async fn accept_offer(
        &self,
        offer: OfferId,
        actor: UserId,
        response_message: Option<String>,
    ) -> ExchangeResult<TradeOfferRow> {
        validate_message(response_message.as_deref())?;

        let (row, t) = self
            .apply(
                offer,
                actor,
                OfferAction::AcceptOffer,
                OfferUpdate {
                    stamp_response: true,
                    stamp_completed: true,
                    response_message,
                    ..OfferUpdate::default()
                },
            )
            .await?;

        debug_assert!(t.completes_listing);
        self.guard
            .mark_completed(ListingId(row.target_listing), OfferId(row.id))
            .await?;

        self.store
            .record_completed_trade(&[row.from_user, row.to_user])
            .await?;

        if let Some(reason) = t.ends_conversation
            && let Some(conversation_id) = row.conversation_id
        {
            self.conversations
                .close(ConversationId(conversation_id), reason)
                .await?;
            self.conversations
                .post_system_message(
                    ConversationId(conversation_id),
                    UserId(row.to_user),
                    "Offer accepted! The trade is complete and the chat is closed.",
                )
                .await?;
        }

        self.dispatcher.notify_offer_accepted(&row).await?;

        Ok(row)
    }

    /// Rejection by the recipient, from `pending` or `chat_accepted`.
    ///
    /// The listing stays active for other proposers; this proposer is
    /// excluded by the one-shot rule.
    pub async fn reject_offer(
        &self,
        offer: OfferId,
        actor: UserId,
        response_message: Option<String>,
    ) -> ExchangeResult<TradeOfferRow> {
        validate_message(response_message.as_deref())?;

        let (row, t) = self
            .apply(
                offer,
                actor,
                OfferAction::Reject,
                OfferUpdate {
                    stamp_response: true,
                    response_message,
                    ..OfferUpdate::default()
                },
            )
            .await?;

        if let Some(reason) = t.ends_conversation
            && let Some(conversation_id) = row.conversation_id
        {
            self.conversations
                .close(ConversationId(conversation_id), reason)
                .await?;
            self.conversations
                .post_system_message(
                    ConversationId(conversation_id),
                    UserId(row.to_user),
                    "The offer was rejected and the chat is closed.",
                )
                .await?;
        }

        self.dispatcher.notify_offer_rejected(&row).await?;

        Ok(row)
    }

    /// Withdrawal by the proposer, from `pending` or `chat_accepted`.
    pub async fn cancel_offer(&self, offer: OfferId, actor: UserId) -> ExchangeResult<TradeOfferRow> {
        let (row, _) = self
            .apply(offer, actor, OfferAction::Cancel, OfferUpdate::default())
            .await?;

        self.dispatcher.notify_offer_cancelled(&row).await?;

        Ok(row)
    }

    /// Proposer-side soft-reject.
    ///
    /// The offer becomes `rejected` with the archived flag set; an
    /// existing conversation ends with `offer_archived` and both
    /// participants receive the generic conversation-ended notification —
    /// nothing more.
    pub async fn archive_offer(&self, offer: OfferId, actor: UserId) -> ExchangeResult<TradeOfferRow> {
        let (row, t) = self
            .apply(
                offer,
                actor,
                OfferAction::Archive,
                OfferUpdate {
                    stamp_response: true,
                    response_message: Some(ARCHIVED_RESPONSE.to_string()),
                    archived_by_user: true,
                    ..OfferUpdate::default()
                },
            )
            .await?;

        if let Some(reason) = t.ends_conversation
            && let Some(conversation_id) = row.conversation_id
        {
            if let Some(ended) = self
                .conversations
                .close(ConversationId(conversation_id), reason)
                .await?
            {
                self.dispatcher
                    .notify_conversation_ended(ended.id, row.id, &ended.participants, reason)
                    .await?;
            }
        }

        Ok(row)
    }

    // ==================== Queries ====================

    /// An offer, visible only to its two parties.
    pub async fn get_offer(&self, offer: OfferId, viewer: UserId) -> ExchangeResult<TradeOfferRow> {
        let row = self.store.get_offer(offer.0).await?;
        if !row.is_party(viewer.0) {
            return Err(ExchangeError::Forbidden(
                "only the offer's parties may view it".to_string(),
            ));
        }
        Ok(row)
    }

    /// Offers received by a user, newest first.
    pub async fn list_received(&self, user: UserId) -> ExchangeResult<Vec<TradeOfferRow>> {
        Ok(self.store.list_received_offers(user.0).await?)
    }

    /// Offers sent by a user, newest first.
    pub async fn list_sent(&self, user: UserId) -> ExchangeResult<Vec<TradeOfferRow>> {
        Ok(self.store.list_sent_offers(user.0).await?)
    }

    // ==================== Internals ====================

    /// The shared transition skeleton: load, resolve role, consult the
    /// table, compare-and-swap.
    async fn apply(
        &self,
        offer: OfferId,
        actor: UserId,
        action: OfferAction,
        update: OfferUpdate,
    ) -> ExchangeResult<(TradeOfferRow, Transition)> {
        let row = self.store.get_offer(offer.0).await?;

        let role = resolve_role(&row, actor).ok_or_else(|| {
            ExchangeError::Forbidden("you are not a party to this offer".to_string())
        })?;

        let current = row.offer_status()?;
        let t = transition(current, action, role)?;

        let updated = self
            .store
            .transition_offer(row.id, &[current], t.next, &update)
            .await?
            .ok_or_else(|| {
                // The status moved between our read and the swap; whoever
                // won, this action no longer applies.
                ExchangeError::InvalidState(format!(
                    "offer {offer} is no longer {current}"
                ))
            })?;

        tracing::info!(
            offer_id = %offer,
            action = %action,
            from = %current,
            to = %t.next,
            "Offer transitioned"
        );

        Ok((updated, t))
    }
}

/// The caller's role on an offer, if they are a party at all.
fn resolve_role(offer: &TradeOfferRow, actor: UserId) -> Option<ActorRole> {
    if actor.0 == offer.from_user {
        Some(ActorRole::Proposer)
    } else if actor.0 == offer.to_user {
        Some(ActorRole::Recipient)
    } else {
        None
    }
}

fn validate_create(input: &CreateOffer) -> ExchangeResult<()> {
    let book = &input.offered_book;
    if book.book_title.trim().is_empty() {
        return Err(ExchangeError::BadRequest(
            "offered book title must not be empty".to_string(),
        ));
    }
    if book.author.trim().is_empty() {
        return Err(ExchangeError::BadRequest(
            "offered book author must not be empty".to_string(),
        ));
    }
    if book.category.trim().is_empty() {
        return Err(ExchangeError::BadRequest(
            "offered book category must not be empty".to_string(),
        ));
    }
    validate_message(input.message.as_deref())
}

fn validate_message(message: Option<&str>) -> ExchangeResult<()> {
    if let Some(message) = message
        && message.chars().count() > MAX_MESSAGE_LEN
    {
        return Err(ExchangeError::BadRequest(format!(
            "message exceeds {MAX_MESSAGE_LEN} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookswap_core::BookCondition;
    use chrono::Utc;
    use uuid::Uuid;

    fn offer_row() -> TradeOfferRow {
        TradeOfferRow {
            id: Uuid::new_v4(),
            from_user: Uuid::new_v4(),
            to_user: Uuid::new_v4(),
            target_listing: Uuid::new_v4(),
            offered_book: serde_json::json!({
                "book_title": "Solaris",
                "author": "Stanisław Lem",
                "category": "sci-fi",
                "condition": "good",
            }),
            message: None,
            status: "pending".to_string(),
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

    fn sample_book() -> OfferedBook {
        OfferedBook {
            book_title: "Solaris".to_string(),
            author: "Stanisław Lem".to_string(),
            isbn: None,
            category: "sci-fi".to_string(),
            condition: BookCondition::Good,
            images: vec![],
            description: None,
            publisher: None,
            published_year: None,
        }
    }

    #[test]
    fn role_resolution() {
        let row = offer_row();
        assert_eq!(
            resolve_role(&row, UserId(row.from_user)),
            Some(ActorRole::Proposer)
        );
        assert_eq!(
            resolve_role(&row, UserId(row.to_user)),
            Some(ActorRole::Recipient)
        );
        assert_eq!(resolve_role(&row, UserId(Uuid::new_v4())), None);
    }

    #[test]
    fn create_requires_book_fields() {
        let mut input = CreateOffer {
            from_user: UserId::new(),
            target_listing: ListingId::new(),
            offered_book: sample_book(),
            message: None,
        };
        assert!(validate_create(&input).is_ok());

        input.offered_book.book_title = "   ".to_string();
        assert!(matches!(
            validate_create(&input),
            Err(ExchangeError::BadRequest(_))
        ));
    }

    #[test]
    fn message_length_is_bounded() {
        assert!(validate_message(None).is_ok());
        assert!(validate_message(Some("fine")).is_ok());

        let long = "x".repeat(MAX_MESSAGE_LEN + 1);
        assert!(matches!(
            validate_message(Some(&long)),
            Err(ExchangeError::BadRequest(_))
        ));
    }
}
