//! End-to-end walks of the trade-offer state machine.
//!
//! These scenarios drive the transition table the way the orchestrator
//! does, asserting the side-effect plan at every step. Storage-backed
//! behavior (listing exclusivity, the one-shot rule, notification rows)
//! is covered by the store and exchange crates against a live database.

use bookswap_core::{
    ActorRole, EndReason, OfferAction, OfferStatus, ReviewStatus, transition,
};

/// Happy path: pending → chat_accepted → accepted, then both parties
/// review.
#[test]
fn full_trade_with_mutual_reviews() {
    // Recipient opens the chat.
    let t = transition(
        OfferStatus::Pending,
        OfferAction::AcceptChat,
        ActorRole::Recipient,
    )
    .unwrap();
    assert_eq!(t.next, OfferStatus::ChatAccepted);
    assert!(t.opens_conversation);
    assert!(!t.completes_listing);

    // Recipient finalizes the trade.
    let t = transition(t.next, OfferAction::AcceptOffer, ActorRole::Recipient).unwrap();
    assert_eq!(t.next, OfferStatus::Accepted);
    assert!(t.completes_listing);
    assert_eq!(t.ends_conversation, Some(EndReason::OfferAccepted));

    // The accepted offer is terminal: nobody can move it again.
    for action in [
        OfferAction::AcceptChat,
        OfferAction::AcceptOffer,
        OfferAction::Reject,
        OfferAction::Cancel,
        OfferAction::Archive,
    ] {
        for role in [ActorRole::Proposer, ActorRole::Recipient] {
            assert!(transition(OfferStatus::Accepted, action, role).is_err());
        }
    }

    // Both parties review; the flags converge exactly once.
    let after_proposer = ReviewStatus::default().with_reviewed(true);
    assert!(!after_proposer.both_reviewed);
    let after_both = after_proposer.with_reviewed(false);
    assert!(after_both.both_reviewed);
}

/// A pending offer is rejected before any chat opened: no conversation to
/// end is planned for an offer that never had one, and the listing is not
/// completed.
#[test]
fn rejection_before_chat() {
    let t = transition(
        OfferStatus::Pending,
        OfferAction::Reject,
        ActorRole::Recipient,
    )
    .unwrap();

    assert_eq!(t.next, OfferStatus::Rejected);
    assert!(!t.completes_listing);
    // The plan names the reason; the orchestrator skips it when the offer
    // has no conversation yet.
    assert_eq!(t.ends_conversation, Some(EndReason::OfferRejected));

    // Terminal: the proposer cannot cancel their way out of a rejection.
    assert!(
        transition(OfferStatus::Rejected, OfferAction::Cancel, ActorRole::Proposer).is_err()
    );
}

/// The trade cannot be finalized without the negotiation stage.
#[test]
fn acceptance_requires_prior_chat() {
    let err = transition(
        OfferStatus::Pending,
        OfferAction::AcceptOffer,
        ActorRole::Recipient,
    )
    .unwrap_err();
    assert!(err.to_string().contains("not permitted"));

    // And the recipient cannot reopen a chat that is already open.
    let again = transition(
        OfferStatus::ChatAccepted,
        OfferAction::AcceptChat,
        ActorRole::Recipient,
    );
    assert!(again.is_err());
}

/// Proposer withdraws mid-negotiation: the conversation is left alone and
/// the listing is not completed.
#[test]
fn cancellation_mid_negotiation() {
    let t = transition(
        OfferStatus::ChatAccepted,
        OfferAction::Cancel,
        ActorRole::Proposer,
    )
    .unwrap();

    assert_eq!(t.next, OfferStatus::Cancelled);
    assert_eq!(t.ends_conversation, None);
    assert!(!t.completes_listing);
    assert!(!t.archived_by_user);
}

/// Proposer archives mid-negotiation: lands in `rejected` with the
/// archived flag, and the conversation plan carries the archive reason.
#[test]
fn archive_mid_negotiation_counts_as_rejection() {
    let t = transition(
        OfferStatus::ChatAccepted,
        OfferAction::Archive,
        ActorRole::Proposer,
    )
    .unwrap();

    assert_eq!(t.next, OfferStatus::Rejected);
    assert!(t.archived_by_user);
    assert_eq!(t.ends_conversation, Some(EndReason::OfferArchived));
}

/// Cross-actor races resolve to whoever lands first: both orders of
/// (cancel, accept-chat) leave exactly one winner, because the loser's
/// starting state is gone.
#[test]
fn conflicting_transitions_are_mutually_exclusive() {
    // Cancel wins: accept-chat from cancelled fails.
    let cancelled = transition(
        OfferStatus::Pending,
        OfferAction::Cancel,
        ActorRole::Proposer,
    )
    .unwrap();
    assert!(
        transition(cancelled.next, OfferAction::AcceptChat, ActorRole::Recipient).is_err()
    );

    // Accept-chat wins: cancel is still legal from chat_accepted, but a
    // subsequent accept-offer is not — cancelled is terminal.
    let chatting = transition(
        OfferStatus::Pending,
        OfferAction::AcceptChat,
        ActorRole::Recipient,
    )
    .unwrap();
    let cancelled = transition(chatting.next, OfferAction::Cancel, ActorRole::Proposer).unwrap();
    assert!(
        transition(cancelled.next, OfferAction::AcceptOffer, ActorRole::Recipient).is_err()
    );
}
