//! bookswap-exchange: the trade-offer lifecycle engine.
//!
//! This crate orchestrates the cross-entity synchronization at the heart
//! of BookSwap. One [`Exchange`] value wires up:
//!
//! - [`TradeOfferEngine`] — the state-machine orchestrator
//! - [`ListingGuard`] — listing exclusivity and the completion flip
//! - [`ConversationManager`] — chat gating and system messages
//! - [`NotificationDispatcher`] — persist-then-push fan-out
//! - [`ReviewGate`] — mandatory post-trade reviews and reputation
//!
//! The engine reaches the transport only through the [`LivePush`]
//! capability; the HTTP/SSE layer in `bookswap-server` supplies the real
//! implementation.

pub mod conversations;
pub mod dispatch;
pub mod error;
pub mod listings;
pub mod offers;
pub mod push;
pub mod reviews;

use std::sync::Arc;

use bookswap_store::Store;

pub use conversations::ConversationManager;
pub use dispatch::NotificationDispatcher;
pub use error::{ExchangeError, ExchangeResult};
pub use listings::ListingGuard;
pub use offers::{CreateOffer, TradeOfferEngine};
pub use push::{ChatMessageEvent, LivePush, NoopPush, NotificationEvent};
pub use reviews::{ReviewGate, SubmitReview, SubmittedReview};

/// The assembled lifecycle engine.
#[derive(Clone)]
pub struct Exchange {
    pub offers: TradeOfferEngine,
    pub conversations: ConversationManager,
    pub notifications: NotificationDispatcher,
    pub reviews: ReviewGate,
    pub listings: ListingGuard,
}

impl Exchange {
    /// Wire the engine against a store and a live-push implementation.
    pub fn new(store: Store, push: Arc<dyn LivePush>) -> Self {
        let dispatcher = NotificationDispatcher::new(store.clone(), Arc::clone(&push));
        let conversations =
            ConversationManager::new(store.clone(), dispatcher.clone(), Arc::clone(&push));
        let listings = ListingGuard::new(store.clone());
        let offers = TradeOfferEngine::new(
            store.clone(),
            listings.clone(),
            conversations.clone(),
            dispatcher.clone(),
        );
        let reviews = ReviewGate::new(store, dispatcher.clone());

        Self {
            offers,
            conversations,
            notifications: dispatcher,
            reviews,
            listings,
        }
    }
}
