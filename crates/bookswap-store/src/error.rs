//! Error types for the storage layer.

use thiserror::Error;
use uuid::Uuid;

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database connection or query error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// User not found.
    #[error("user not found: {0}")]
    UserNotFound(Uuid),

    /// Listing not found.
    #[error("listing not found: {0}")]
    ListingNotFound(Uuid),

    /// Trade offer not found.
    #[error("trade offer not found: {0}")]
    OfferNotFound(Uuid),

    /// Conversation not found.
    #[error("conversation not found: {0}")]
    ConversationNotFound(Uuid),

    /// The listing is not open for offers.
    #[error("listing {listing} is not active (status: {status})")]
    ListingNotActive { listing: Uuid, status: String },

    /// A proposer tried to target their own listing.
    #[error("listing {0} is owned by the proposer")]
    OwnListing(Uuid),

    /// Another offer already holds the listing.
    #[error("listing {0} already has an active offer")]
    ActiveOfferExists(Uuid),

    /// The proposer has a rejected offer against this listing and may not
    /// retry.
    #[error("proposer has a rejected offer against listing {0}")]
    RejectedOfferExists(Uuid),

    /// A review by this reviewer already exists for the offer.
    #[error("review already submitted for offer {0}")]
    DuplicateReview(Uuid),

    /// A stored enum or JSONB document failed to parse back into its
    /// domain type.
    #[error("corrupt row: {0}")]
    Corrupt(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<bookswap_core::ParseEnumError> for StoreError {
    fn from(err: bookswap_core::ParseEnumError) -> Self {
        Self::Corrupt(err.to_string())
    }
}
