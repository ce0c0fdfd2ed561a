//! The lifecycle error taxonomy.
//!
//! Every refusal an engine operation can produce falls into one of five
//! buckets: `NotFound`, `Forbidden`, `InvalidState`, `Conflict`, or
//! `BadRequest`. Storage failures that are not domain refusals pass
//! through as `Storage`.

use thiserror::Error;

use bookswap_core::TransitionError;
use bookswap_store::StoreError;

/// Result type alias for exchange operations.
pub type ExchangeResult<T> = Result<T, ExchangeError>;

/// Errors surfaced by the lifecycle engine.
#[derive(Debug, Error)]
pub enum ExchangeError {
    /// A referenced offer, listing, conversation, or user does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The actor lacks the role required for this operation.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The operation is not permitted from the document's current status.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// The operation collides with existing state (listing exclusivity,
    /// one-shot rejected-proposer rule, duplicate review).
    #[error("conflict: {0}")]
    Conflict(String),

    /// The request itself is malformed (rating out of range, wrong
    /// counterpart, oversized text).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Underlying storage failure that is not a domain refusal.
    #[error("storage error: {0}")]
    Storage(StoreError),
}

impl From<StoreError> for ExchangeError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UserNotFound(id) => Self::NotFound(format!("user {id}")),
            StoreError::ListingNotFound(id) => Self::NotFound(format!("listing {id}")),
            StoreError::OfferNotFound(id) => Self::NotFound(format!("trade offer {id}")),
            StoreError::ConversationNotFound(id) => Self::NotFound(format!("conversation {id}")),
            StoreError::ListingNotActive { listing, status } => {
                Self::InvalidState(format!("listing {listing} is not active (status: {status})"))
            }
            StoreError::OwnListing(id) => {
                Self::Forbidden(format!("cannot make an offer on your own listing {id}"))
            }
            StoreError::ActiveOfferExists(id) => {
                Self::Conflict(format!("listing {id} already has an active offer"))
            }
            StoreError::RejectedOfferExists(id) => Self::Conflict(format!(
                "a previous offer on listing {id} was rejected; it cannot be retried"
            )),
            StoreError::DuplicateReview(offer) => {
                Self::Conflict(format!("a review for offer {offer} was already submitted"))
            }
            other => Self::Storage(other),
        }
    }
}

impl From<bookswap_core::ParseEnumError> for ExchangeError {
    fn from(err: bookswap_core::ParseEnumError) -> Self {
        Self::Storage(StoreError::from(err))
    }
}

impl From<TransitionError> for ExchangeError {
    fn from(err: TransitionError) -> Self {
        match err {
            TransitionError::WrongActor { .. } => Self::Forbidden(err.to_string()),
            TransitionError::InvalidState { .. } => Self::InvalidState(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookswap_core::{ActorRole, OfferAction, OfferStatus};
    use uuid::Uuid;

    #[test]
    fn store_refusals_map_into_taxonomy() {
        let id = Uuid::new_v4();

        assert!(matches!(
            ExchangeError::from(StoreError::ListingNotFound(id)),
            ExchangeError::NotFound(_)
        ));
        assert!(matches!(
            ExchangeError::from(StoreError::OwnListing(id)),
            ExchangeError::Forbidden(_)
        ));
        assert!(matches!(
            ExchangeError::from(StoreError::ListingNotActive {
                listing: id,
                status: "completed".to_string(),
            }),
            ExchangeError::InvalidState(_)
        ));
        assert!(matches!(
            ExchangeError::from(StoreError::ActiveOfferExists(id)),
            ExchangeError::Conflict(_)
        ));
        assert!(matches!(
            ExchangeError::from(StoreError::RejectedOfferExists(id)),
            ExchangeError::Conflict(_)
        ));
        assert!(matches!(
            ExchangeError::from(StoreError::DuplicateReview(id)),
            ExchangeError::Conflict(_)
        ));
    }

    #[test]
    fn transition_refusals_map_into_taxonomy() {
        let wrong_actor = TransitionError::WrongActor {
            action: OfferAction::AcceptOffer,
            required: ActorRole::Recipient,
        };
        assert!(matches!(
            ExchangeError::from(wrong_actor),
            ExchangeError::Forbidden(_)
        ));

        let invalid = TransitionError::InvalidState {
            from: OfferStatus::Accepted,
            action: OfferAction::Reject,
        };
        assert!(matches!(
            ExchangeError::from(invalid),
            ExchangeError::InvalidState(_)
        ));
    }
}
