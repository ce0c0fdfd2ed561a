//! The review gate.
//!
//! Completed trades must be reviewed by both parties. The gate computes
//! which accepted offers still owe a review from a given user, accepts
//! each submission exactly once per (offer, reviewer), and folds the score
//! into the reviewee's public rating.

use bookswap_core::{OfferId, OfferStatus, UserId};
use bookswap_store::{NewReview, PendingReviewRow, ReviewRow, Store, TradeOfferRow, UserRow};

use crate::dispatch::NotificationDispatcher;
use crate::error::{ExchangeError, ExchangeResult};

/// Upper bound on review comment length.
const MAX_COMMENT_LEN: usize = 500;

/// A review submission.
#[derive(Debug, Clone)]
pub struct SubmitReview {
    pub trade_offer: OfferId,
    pub reviewer: UserId,
    pub reviewee: UserId,
    pub rating: i32,
    pub comment: Option<String>,
}

/// Outcome of a successful submission.
#[derive(Debug, Clone)]
pub struct SubmittedReview {
    pub review: ReviewRow,
    /// The offer with its review flags updated.
    pub offer: TradeOfferRow,
    /// The reviewee with their recomputed rating.
    pub reviewee: UserRow,
}

/// Gates mandatory post-trade reviews and maintains user reputation.
#[derive(Clone)]
pub struct ReviewGate {
    store: Store,
    dispatcher: NotificationDispatcher,
}

impl ReviewGate {
    pub fn new(store: Store, dispatcher: NotificationDispatcher) -> Self {
        Self { store, dispatcher }
    }

    /// Accepted offers for which `user` has not yet submitted a review,
    /// each carrying the counterpart's identity.
    pub async fn compute_pending(&self, user: UserId) -> ExchangeResult<Vec<PendingReviewRow>> {
        Ok(self.store.list_pending_reviews(user.0).await?)
    }

    /// Accept a review submission.
    ///
    /// Refusals: `InvalidState` unless the offer is `accepted`;
    /// `Forbidden` unless the reviewer is a party; `BadRequest` if the
    /// rating is out of 1–5 or the reviewee is not the offer's other
    /// party; `Conflict` on a duplicate (offer, reviewer) pair.
    pub async fn submit(&self, input: SubmitReview) -> ExchangeResult<SubmittedReview> {
        let offer = self.store.get_offer(input.trade_offer.0).await?;
        validate_submission(&offer, &input)?;

        let review = self
            .store
            .insert_review(&NewReview {
                trade_offer: offer.id,
                reviewer: input.reviewer.0,
                reviewee: input.reviewee.0,
                rating: input.rating,
                comment: input.comment,
            })
            .await?;

        let by_from_user = input.reviewer.0 == offer.from_user;
        let offer = self.store.record_review_flag(offer.id, by_from_user).await?;

        let reviewee = self
            .store
            .apply_received_review(input.reviewee.0, input.rating)
            .await?;

        tracing::info!(
            offer_id = %offer.id,
            reviewer = %input.reviewer,
            rating = input.rating,
            both_reviewed = offer.both_reviewed,
            "Review recorded"
        );

        self.dispatcher.notify_review_received(&review).await?;

        Ok(SubmittedReview {
            review,
            offer,
            reviewee,
        })
    }

    /// Visible reviews a user has received, newest first.
    pub async fn list_received(&self, user: UserId) -> ExchangeResult<Vec<ReviewRow>> {
        Ok(self.store.list_reviews_received(user.0).await?)
    }

    /// Reviews a user has given, newest first.
    pub async fn list_given(&self, user: UserId) -> ExchangeResult<Vec<ReviewRow>> {
        Ok(self.store.list_reviews_given(user.0).await?)
    }
}

/// Check a submission against the offer it targets.
fn validate_submission(offer: &TradeOfferRow, input: &SubmitReview) -> ExchangeResult<()> {
    if !(1..=5).contains(&input.rating) {
        return Err(ExchangeError::BadRequest(format!(
            "rating must be between 1 and 5, got {}",
            input.rating
        )));
    }

    if let Some(comment) = &input.comment
        && comment.chars().count() > MAX_COMMENT_LEN
    {
        return Err(ExchangeError::BadRequest(format!(
            "comment exceeds {MAX_COMMENT_LEN} characters"
        )));
    }

    if offer.offer_status()? != OfferStatus::Accepted {
        return Err(ExchangeError::InvalidState(
            "only completed trades can be reviewed".to_string(),
        ));
    }

    let Some(expected_reviewee) = offer.counterpart_of(input.reviewer.0) else {
        return Err(ExchangeError::Forbidden(
            "only the trade's parties may review it".to_string(),
        ));
    };

    if input.reviewee.0 != expected_reviewee {
        return Err(ExchangeError::BadRequest(
            "reviewee must be the trade's other party".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn accepted_offer() -> TradeOfferRow {
        TradeOfferRow {
            id: Uuid::new_v4(),
            from_user: Uuid::new_v4(),
            to_user: Uuid::new_v4(),
            target_listing: Uuid::new_v4(),
            offered_book: serde_json::json!({
                "book_title": "Invisible Cities",
                "author": "Italo Calvino",
                "category": "fiction",
                "condition": "like_new",
            }),
            message: None,
            status: "accepted".to_string(),
            chat_accepted_date: Some(Utc::now()),
            response_message: None,
            response_date: Some(Utc::now()),
            completed_date: Some(Utc::now()),
            conversation_id: Some(Uuid::new_v4()),
            archived_by_user: false,
            from_user_reviewed: false,
            to_user_reviewed: false,
            both_reviewed: false,
            created: Utc::now(),
            updated: Utc::now(),
        }
    }

    fn submission_for(offer: &TradeOfferRow, reviewer: Uuid, reviewee: Uuid) -> SubmitReview {
        SubmitReview {
            trade_offer: OfferId(offer.id),
            reviewer: UserId(reviewer),
            reviewee: UserId(reviewee),
            rating: 4,
            comment: None,
        }
    }

    #[test]
    fn valid_submission_passes() {
        let offer = accepted_offer();
        let input = submission_for(&offer, offer.from_user, offer.to_user);
        assert!(validate_submission(&offer, &input).is_ok());

        let input = submission_for(&offer, offer.to_user, offer.from_user);
        assert!(validate_submission(&offer, &input).is_ok());
    }

    #[test]
    fn rating_out_of_range_is_bad_request() {
        let offer = accepted_offer();
        for rating in [0, 6, -1] {
            let mut input = submission_for(&offer, offer.from_user, offer.to_user);
            input.rating = rating;
            assert!(matches!(
                validate_submission(&offer, &input),
                Err(ExchangeError::BadRequest(_))
            ));
        }
    }

    #[test]
    fn unaccepted_offer_is_invalid_state() {
        for status in ["pending", "chat_accepted", "rejected", "cancelled"] {
            let mut offer = accepted_offer();
            offer.status = status.to_string();
            let input = submission_for(&offer, offer.from_user, offer.to_user);
            assert!(matches!(
                validate_submission(&offer, &input),
                Err(ExchangeError::InvalidState(_))
            ));
        }
    }

    #[test]
    fn third_party_is_forbidden() {
        let offer = accepted_offer();
        let outsider = Uuid::new_v4();
        let input = submission_for(&offer, outsider, offer.to_user);
        assert!(matches!(
            validate_submission(&offer, &input),
            Err(ExchangeError::Forbidden(_))
        ));
    }

    #[test]
    fn wrong_counterpart_is_bad_request() {
        let offer = accepted_offer();
        // Reviewer names themselves as the reviewee.
        let input = submission_for(&offer, offer.from_user, offer.from_user);
        assert!(matches!(
            validate_submission(&offer, &input),
            Err(ExchangeError::BadRequest(_))
        ));
    }

    #[test]
    fn oversized_comment_is_bad_request() {
        let offer = accepted_offer();
        let mut input = submission_for(&offer, offer.from_user, offer.to_user);
        input.comment = Some("x".repeat(MAX_COMMENT_LEN + 1));
        assert!(matches!(
            validate_submission(&offer, &input),
            Err(ExchangeError::BadRequest(_))
        ));
    }
}
