//! bookswap-core: domain types and the trade-offer state machine.
//!
//! This crate is pure domain logic — no I/O, no async. It defines:
//!
//! - Typed identifiers for every document in the system
//! - The status enums for listings, offers, conversations, and messages
//! - The embedded offered-book document carried by a trade offer
//! - The notification type/priority vocabulary and its data references
//! - The trade-offer transition table (`lifecycle` module), which is the
//!   single source of truth for which `(status, action, actor role)`
//!   combinations are legal and which side effects each transition implies
//!
//! Storage and orchestration live in `bookswap-store` and
//! `bookswap-exchange` respectively.

pub mod lifecycle;
pub mod types;

pub use lifecycle::{ActorRole, OfferAction, Transition, TransitionError, transition};
pub use types::{
    BookCondition, ConversationId, ConversationStatus, EndReason, ListingId, ListingStatus,
    MessageId, MessageType, NotificationData, NotificationId, NotificationPriority,
    NotificationType, OfferId, OfferStatus, OfferedBook, ParseEnumError, ReviewId, ReviewStatus,
    UserId,
};
