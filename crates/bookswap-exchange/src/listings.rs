//! Listing availability guard.
//!
//! Enforces "at most one active offer per listing" and performs the
//! status flip on trade completion. The guard's standalone check is a
//! query-time courtesy; the authoritative re-check happens under the
//! listing row lock inside the offer-creation transaction
//! (`Store::insert_offer`), and the `offer_count` bump rides the same
//! transaction.

use bookswap_core::{ListingId, OfferId};
use bookswap_store::Store;

use crate::error::{ExchangeError, ExchangeResult};

/// Guards listing availability around the offer lifecycle.
#[derive(Clone)]
pub struct ListingGuard {
    store: Store,
}

impl ListingGuard {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Fail `Conflict` if any offer currently holds the listing.
    pub async fn assert_no_active_offer(&self, listing: ListingId) -> ExchangeResult<()> {
        if self.store.has_active_offer(listing.0).await? {
            return Err(ExchangeError::Conflict(format!(
                "listing {listing} already has an active offer"
            )));
        }
        Ok(())
    }

    /// Flip the listing to `completed`, back-referencing the winning
    /// offer. The only path that completes a listing.
    pub async fn mark_completed(&self, listing: ListingId, offer: OfferId) -> ExchangeResult<()> {
        self.store.mark_listing_completed(listing.0, offer.0).await?;

        tracing::info!(listing_id = %listing, offer_id = %offer, "Listing completed");
        Ok(())
    }
}
