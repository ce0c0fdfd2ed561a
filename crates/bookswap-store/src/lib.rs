//! bookswap-store: Postgres persistence for the BookSwap exchange platform.
//!
//! This crate owns the single logical data store every request handler
//! reaches. It provides:
//!
//! - Row models mapping directly to database tables (`models`)
//! - Embedded, idempotent SQL migrations (`schema`)
//! - The `Store` type with all queries (`store`), including the two
//!   concurrency-critical pieces of the offer lifecycle:
//!   - offer creation as a single transaction that locks the listing row
//!     before the exclusivity checks and the insert
//!   - every other offer transition as a compare-and-swap update that
//!     re-checks the expected prior status in the `WHERE` clause
//!
//! Domain semantics (who may do what, in which order side effects run)
//! live in `bookswap-exchange`, not here.

pub mod error;
pub mod models;
pub mod schema;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use models::{
    ConversationRow, ListingRow, MessageRow, NewListing, NewMessage, NewNotification, NewReview,
    NewTradeOffer, NewUser, NotificationPage, NotificationQuery, NotificationRow, OfferUpdate,
    PendingReviewRow, ReviewRow, TradeOfferRow, UserRow,
};
pub use store::{Store, StoreConfig};
