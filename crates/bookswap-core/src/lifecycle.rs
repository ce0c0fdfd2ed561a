//! The trade-offer transition table.
//!
//! Every lifecycle endpoint funnels through [`transition`]: given the
//! offer's current status, the requested action, and the caller's role on
//! the offer, it either returns the [`Transition`] to apply (next status
//! plus the fixed side effects) or a typed refusal. Permissions and
//! reachable states are decided here, in one place, never re-derived per
//! endpoint.
//!
//! The state machine:
//!
//! ```text
//!              accept_chat            accept_offer
//!   pending ───────────────▶ chat_accepted ───────▶ accepted (terminal)
//!      │                        │
//!      │ reject / archive       │ reject / archive
//!      ├───────────────────────▶│──────▶ rejected (terminal)
//!      │ cancel                 │ cancel
//!      └───────────────────────▶└──────▶ cancelled (terminal)
//! ```
//!
//! There is no `pending → accepted` edge: a trade cannot be finalized
//! without the negotiation stage.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{EndReason, OfferStatus};

/// A lifecycle action requested against an existing offer.
///
/// Offer creation is not listed here — it has no prior state and is
/// validated against the listing instead (see the exchange engine).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferAction {
    /// First-stage approval: open the conversation.
    AcceptChat,
    /// Second-stage, final approval: complete the trade.
    AcceptOffer,
    /// Recipient turns the offer down.
    Reject,
    /// Proposer withdraws the offer.
    Cancel,
    /// Proposer-side soft-reject; counts as a rejection.
    Archive,
}

impl OfferAction {
    /// The role an actor must hold on the offer to perform this action.
    #[must_use]
    pub const fn required_role(&self) -> ActorRole {
        match self {
            Self::AcceptChat | Self::AcceptOffer | Self::Reject => ActorRole::Recipient,
            Self::Cancel | Self::Archive => ActorRole::Proposer,
        }
    }
}

impl fmt::Display for OfferAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::AcceptChat => "accept_chat",
            Self::AcceptOffer => "accept_offer",
            Self::Reject => "reject",
            Self::Cancel => "cancel",
            Self::Archive => "archive",
        };
        f.write_str(s)
    }
}

/// The caller's relationship to the offer being acted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    /// `from_user` — the user who sent the offer.
    Proposer,
    /// `to_user` — the listing owner the offer targets.
    Recipient,
}

impl fmt::Display for ActorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Proposer => f.write_str("proposer"),
            Self::Recipient => f.write_str("recipient"),
        }
    }
}

/// The outcome of a legal transition: the next status and the side effects
/// the orchestrator must apply, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// Status the offer moves to.
    pub next: OfferStatus,
    /// A new conversation must be opened and linked to the offer.
    pub opens_conversation: bool,
    /// The offer's conversation (if one exists) must be ended with this
    /// reason.
    pub ends_conversation: Option<EndReason>,
    /// The target listing must be flipped to `completed`.
    pub completes_listing: bool,
    /// The offer must be flagged as archived by its proposer.
    pub archived_by_user: bool,
}

impl Transition {
    const fn to(next: OfferStatus) -> Self {
        Self {
            next,
            opens_conversation: false,
            ends_conversation: None,
            completes_listing: false,
            archived_by_user: false,
        }
    }
}

/// A refused transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    /// The caller does not hold the role this action requires.
    #[error("{action} may only be performed by the offer's {required}")]
    WrongActor {
        action: OfferAction,
        required: ActorRole,
    },

    /// The offer's current status does not permit this action.
    #[error("{action} is not permitted from status {from}")]
    InvalidState {
        from: OfferStatus,
        action: OfferAction,
    },
}

/// Resolve `(current status, action, actor role)` against the transition
/// table.
///
/// Role is checked before state, so a third party probing a terminal offer
/// learns only that they may not act on it.
pub fn transition(
    current: OfferStatus,
    action: OfferAction,
    role: ActorRole,
) -> Result<Transition, TransitionError> {
    let required = action.required_role();
    if role != required {
        return Err(TransitionError::WrongActor { action, required });
    }

    use OfferAction as A;
    use OfferStatus as S;

    let transition = match (action, current) {
        (A::AcceptChat, S::Pending) => Transition {
            opens_conversation: true,
            ..Transition::to(S::ChatAccepted)
        },
        (A::AcceptOffer, S::ChatAccepted) => Transition {
            ends_conversation: Some(EndReason::OfferAccepted),
            completes_listing: true,
            ..Transition::to(S::Accepted)
        },
        (A::Reject, S::Pending | S::ChatAccepted) => Transition {
            ends_conversation: Some(EndReason::OfferRejected),
            ..Transition::to(S::Rejected)
        },
        (A::Cancel, S::Pending | S::ChatAccepted) => Transition::to(S::Cancelled),
        (A::Archive, S::Pending | S::ChatAccepted) => Transition {
            ends_conversation: Some(EndReason::OfferArchived),
            archived_by_user: true,
            ..Transition::to(S::Rejected)
        },
        (_, from) => return Err(TransitionError::InvalidState { from, action }),
    };

    Ok(transition)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const ALL_STATUSES: [OfferStatus; 5] = [
        OfferStatus::Pending,
        OfferStatus::ChatAccepted,
        OfferStatus::Accepted,
        OfferStatus::Rejected,
        OfferStatus::Cancelled,
    ];

    const ALL_ACTIONS: [OfferAction; 5] = [
        OfferAction::AcceptChat,
        OfferAction::AcceptOffer,
        OfferAction::Reject,
        OfferAction::Cancel,
        OfferAction::Archive,
    ];

    fn acting(action: OfferAction) -> ActorRole {
        action.required_role()
    }

    #[test]
    fn happy_path() {
        let t = transition(
            OfferStatus::Pending,
            OfferAction::AcceptChat,
            ActorRole::Recipient,
        )
        .unwrap();
        assert_eq!(t.next, OfferStatus::ChatAccepted);
        assert!(t.opens_conversation);
        assert_eq!(t.ends_conversation, None);
        assert!(!t.completes_listing);

        let t = transition(t.next, OfferAction::AcceptOffer, ActorRole::Recipient).unwrap();
        assert_eq!(t.next, OfferStatus::Accepted);
        assert!(t.completes_listing);
        assert_eq!(t.ends_conversation, Some(EndReason::OfferAccepted));
    }

    #[test]
    fn direct_acceptance_is_rejected() {
        // pending → accepted must not exist: negotiation is mandatory.
        let err = transition(
            OfferStatus::Pending,
            OfferAction::AcceptOffer,
            ActorRole::Recipient,
        )
        .unwrap_err();
        assert_eq!(
            err,
            TransitionError::InvalidState {
                from: OfferStatus::Pending,
                action: OfferAction::AcceptOffer,
            }
        );
    }

    #[test]
    fn reject_from_both_live_states() {
        for from in [OfferStatus::Pending, OfferStatus::ChatAccepted] {
            let t = transition(from, OfferAction::Reject, ActorRole::Recipient).unwrap();
            assert_eq!(t.next, OfferStatus::Rejected);
            assert_eq!(t.ends_conversation, Some(EndReason::OfferRejected));
            assert!(!t.completes_listing);
        }
    }

    #[test]
    fn cancel_is_proposer_only() {
        let t = transition(OfferStatus::Pending, OfferAction::Cancel, ActorRole::Proposer).unwrap();
        assert_eq!(t.next, OfferStatus::Cancelled);
        assert_eq!(t.ends_conversation, None);

        let err = transition(
            OfferStatus::Pending,
            OfferAction::Cancel,
            ActorRole::Recipient,
        )
        .unwrap_err();
        assert!(matches!(err, TransitionError::WrongActor { .. }));
    }

    #[test]
    fn archive_is_a_rejection_with_flag() {
        let t =
            transition(OfferStatus::ChatAccepted, OfferAction::Archive, ActorRole::Proposer)
                .unwrap();
        assert_eq!(t.next, OfferStatus::Rejected);
        assert!(t.archived_by_user);
        assert_eq!(t.ends_conversation, Some(EndReason::OfferArchived));
    }

    #[test]
    fn archive_never_touches_accepted() {
        let err = transition(
            OfferStatus::Accepted,
            OfferAction::Archive,
            ActorRole::Proposer,
        )
        .unwrap_err();
        assert!(matches!(err, TransitionError::InvalidState { .. }));
    }

    #[test]
    fn role_is_checked_before_state() {
        // A proposer poking a terminal offer with a recipient action gets
        // the role refusal, not a state leak.
        let err = transition(
            OfferStatus::Accepted,
            OfferAction::AcceptOffer,
            ActorRole::Proposer,
        )
        .unwrap_err();
        assert_eq!(
            err,
            TransitionError::WrongActor {
                action: OfferAction::AcceptOffer,
                required: ActorRole::Recipient,
            }
        );
    }

    #[test]
    fn exhaustive_table() {
        // Every (status, action) cell, with the action's own required role.
        // Legal cells are exactly the edges drawn in the module docs.
        for from in ALL_STATUSES {
            for action in ALL_ACTIONS {
                let result = transition(from, action, acting(action));
                let legal = match (action, from) {
                    (OfferAction::AcceptChat, OfferStatus::Pending) => true,
                    (OfferAction::AcceptOffer, OfferStatus::ChatAccepted) => true,
                    (
                        OfferAction::Reject | OfferAction::Cancel | OfferAction::Archive,
                        OfferStatus::Pending | OfferStatus::ChatAccepted,
                    ) => true,
                    _ => false,
                };
                assert_eq!(result.is_ok(), legal, "({from}, {action})");
            }
        }
    }

    fn any_status() -> impl Strategy<Value = OfferStatus> {
        prop::sample::select(&ALL_STATUSES[..])
    }

    fn any_action() -> impl Strategy<Value = OfferAction> {
        prop::sample::select(&ALL_ACTIONS[..])
    }

    fn any_role() -> impl Strategy<Value = ActorRole> {
        prop::sample::select(&[ActorRole::Proposer, ActorRole::Recipient][..])
    }

    proptest! {
        #[test]
        fn terminal_states_admit_no_transition(
            from in any_status(),
            action in any_action(),
            role in any_role(),
        ) {
            if from.is_terminal() {
                prop_assert!(transition(from, action, role).is_err());
            }
        }

        #[test]
        fn wrong_role_never_transitions(
            from in any_status(),
            action in any_action(),
            role in any_role(),
        ) {
            if role != action.required_role() {
                prop_assert_eq!(
                    transition(from, action, role),
                    Err(TransitionError::WrongActor {
                        action,
                        required: action.required_role(),
                    })
                );
            }
        }

        #[test]
        fn successful_transitions_leave_live_states(
            from in any_status(),
            action in any_action(),
            role in any_role(),
        ) {
            if let Ok(t) = transition(from, action, role) {
                // Only live states transition, and a listing is completed
                // only by final acceptance.
                prop_assert!(from.holds_listing());
                prop_assert!(t.next != from);
                if t.completes_listing {
                    prop_assert_eq!(t.next, OfferStatus::Accepted);
                }
                if t.opens_conversation {
                    prop_assert_eq!(t.next, OfferStatus::ChatAccepted);
                }
            }
        }
    }
}
