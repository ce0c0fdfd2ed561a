//! Core data types for the BookSwap exchange platform.
//!
//! Every document in the system (user, listing, trade offer, conversation,
//! message, notification, review) is addressed by a UUID-v4 newtype defined
//! here, and every status field is a closed enum with a stable snake_case
//! wire form. The wire form doubles as the database representation, so
//! `Display`/`FromStr` round-trip through the exact strings stored in
//! Postgres.
//!
//! All types derive `Debug`, `Clone`, `Serialize`, and `Deserialize` for
//! inspection, copying, and JSON serialization.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// ID Types
// ============================================================================

/// Error returned when an enum's wire form does not match any variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct ParseEnumError {
    /// Which enum was being parsed (e.g. "offer status").
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

macro_rules! uuid_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Creates a new random id using UUID v4.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an id from an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner UUID.
            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

uuid_id! {
    /// Unique identifier for a user account.
    UserId
}

uuid_id! {
    /// Unique identifier for a published book listing.
    ListingId
}

uuid_id! {
    /// Unique identifier for a trade offer.
    OfferId
}

uuid_id! {
    /// Unique identifier for a conversation opened by chat acceptance.
    ConversationId
}

uuid_id! {
    /// Unique identifier for a chat message.
    MessageId
}

uuid_id! {
    /// Unique identifier for a persisted notification record.
    NotificationId
}

uuid_id! {
    /// Unique identifier for a post-trade review.
    ReviewId
}

macro_rules! wire_enum {
    (
        $(#[$doc:meta])* $name:ident, $kind:literal,
        { $($(#[$vdoc:meta])* $variant:ident => $wire:literal),+ $(,)? }
    ) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($(#[$vdoc])* $variant),+
        }

        impl $name {
            /// Returns the wire/database form of this value.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $wire),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok(Self::$variant),)+
                    other => Err(ParseEnumError {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

// ============================================================================
// Status Enums
// ============================================================================

wire_enum! {
    /// Lifecycle status of a listing.
    ///
    /// Listings are created externally as `active`. This core only flips a
    /// listing to `completed` (on offer acceptance); `pending` and `removed`
    /// exist for the external CRUD surface.
    ListingStatus, "listing status",
    {
        Active => "active",
        Pending => "pending",
        Completed => "completed",
        Removed => "removed",
    }
}

wire_enum! {
    /// Status of a trade offer — the two-stage negotiation state machine.
    ///
    /// The happy path is `pending → chat_accepted → accepted`. `accepted`,
    /// `rejected`, and `cancelled` are terminal. The legal transitions are
    /// defined by [`crate::lifecycle::transition`].
    OfferStatus, "offer status",
    {
        /// Offer sent; the recipient has not yet opened the chat.
        Pending => "pending",
        /// Chat accepted; the parties are negotiating.
        ChatAccepted => "chat_accepted",
        /// Offer accepted; the trade is complete.
        Accepted => "accepted",
        /// Offer rejected (by the recipient, or archived by the proposer).
        Rejected => "rejected",
        /// Offer withdrawn by the proposer.
        Cancelled => "cancelled",
    }
}

impl OfferStatus {
    /// Whether this status permits no further transition.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Accepted | Self::Rejected | Self::Cancelled)
    }

    /// Whether an offer in this status blocks new offers on its listing.
    #[must_use]
    pub const fn holds_listing(&self) -> bool {
        matches!(self, Self::Pending | Self::ChatAccepted)
    }
}

wire_enum! {
    /// Status of a conversation.
    ConversationStatus, "conversation status",
    {
        Active => "active",
        Ended => "ended",
    }
}

wire_enum! {
    /// Why a conversation was ended. Set exactly once, when the governing
    /// offer leaves `chat_accepted`.
    EndReason, "end reason",
    {
        OfferAccepted => "offer_accepted",
        OfferRejected => "offer_rejected",
        OfferArchived => "offer_archived",
    }
}

wire_enum! {
    /// Who authored a message: a participant or the lifecycle engine.
    MessageType, "message type",
    {
        User => "user",
        System => "system",
    }
}

wire_enum! {
    /// Physical condition of an offered or listed book.
    BookCondition, "book condition",
    {
        New => "new",
        LikeNew => "like_new",
        Good => "good",
        Fair => "fair",
    }
}

// ============================================================================
// Notification Vocabulary
// ============================================================================

wire_enum! {
    /// The closed set of notification types, mirroring lifecycle, chat, and
    /// review events.
    NotificationType, "notification type",
    {
        NewOffer => "new_offer",
        OfferChatAccepted => "offer_chat_accepted",
        OfferAccepted => "offer_accepted",
        OfferRejected => "offer_rejected",
        OfferCancelled => "offer_cancelled",
        NewMessage => "new_message",
        ConversationEnded => "conversation_ended",
        ReviewRequired => "review_required",
        ReviewReceived => "review_received",
        ListingCreated => "listing_created",
    }
}

wire_enum! {
    /// Delivery priority of a notification.
    NotificationPriority, "notification priority",
    {
        Low => "low",
        Medium => "medium",
        High => "high",
    }
}

/// Typed references carried by a notification.
///
/// All fields are optional; each notification type fills the references
/// that are meaningful for it (e.g. `new_offer` carries `offer_id` and
/// `listing_id`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listing_id: Option<ListingId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offer_id: Option<OfferId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<ConversationId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_id: Option<ReviewId>,
}

impl NotificationData {
    /// References for an offer-scoped notification.
    #[must_use]
    pub fn for_offer(offer_id: OfferId, listing_id: ListingId) -> Self {
        Self {
            offer_id: Some(offer_id),
            listing_id: Some(listing_id),
            ..Self::default()
        }
    }

    /// References for a conversation-scoped notification.
    #[must_use]
    pub fn for_conversation(conversation_id: ConversationId, offer_id: OfferId) -> Self {
        Self {
            conversation_id: Some(conversation_id),
            offer_id: Some(offer_id),
            ..Self::default()
        }
    }

    /// References for a review-scoped notification.
    #[must_use]
    pub fn for_review(review_id: ReviewId, offer_id: OfferId) -> Self {
        Self {
            review_id: Some(review_id),
            offer_id: Some(offer_id),
            ..Self::default()
        }
    }
}

// ============================================================================
// Embedded Documents
// ============================================================================

/// The book a proposer puts up against a listing.
///
/// This is an embedded description, not a listing of its own — it never
/// enters the listing search surface and is never separately archived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfferedBook {
    pub book_title: String,
    pub author: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,
    pub category: String,
    pub condition: BookCondition,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_year: Option<i32>,
}

/// Mandatory-review bookkeeping on an accepted offer.
///
/// `both_reviewed` becomes permanently true once both parties have
/// submitted their review.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewStatus {
    pub from_user_reviewed: bool,
    pub to_user_reviewed: bool,
    pub both_reviewed: bool,
}

impl ReviewStatus {
    /// Returns a copy with the given party's flag set, recomputing
    /// `both_reviewed`.
    #[must_use]
    pub fn with_reviewed(mut self, by_from_user: bool) -> Self {
        if by_from_user {
            self.from_user_reviewed = true;
        } else {
            self.to_user_reviewed = true;
        }
        self.both_reviewed = self.from_user_reviewed && self.to_user_reviewed;
        self
    }
}

// ============================================================================
// Tests
// ============================================================================
