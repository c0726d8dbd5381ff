//! Responses, moderation flags and like/dislike votes on a review.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use dreambook_core::{DomainError, DomainResult, ReviewId, ReviewItemId, UserId, impl_entity};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewResponse {
    pub id: ReviewItemId,
    pub review: ReviewId,
    pub user: UserId,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewReviewResponse {
    pub text: String,
}

impl ReviewResponse {
    pub fn new(
        review: ReviewId,
        user: UserId,
        cmd: NewReviewResponse,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let text = cmd.text.trim();
        if text.is_empty() {
            return Err(DomainError::validation("response text cannot be empty"));
        }
        Ok(Self {
            id: ReviewItemId::new(),
            review,
            user,
            text: text.to_string(),
            created_at: now,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewFlag {
    pub id: ReviewItemId,
    pub review: ReviewId,
    pub user: UserId,
    pub reason: String,
    pub flagged_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewReviewFlag {
    pub reason: String,
}

impl ReviewFlag {
    pub fn new(
        review: ReviewId,
        user: UserId,
        cmd: NewReviewFlag,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let reason = cmd.reason.trim();
        if reason.is_empty() {
            return Err(DomainError::validation("flag reason cannot be empty"));
        }
        if reason.chars().count() > 200 {
            return Err(DomainError::validation("flag reason cannot exceed 200 characters"));
        }
        Ok(Self {
            id: ReviewItemId::new(),
            review,
            user,
            reason: reason.to_string(),
            flagged_at: now,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewLike {
    pub id: ReviewItemId,
    pub review: ReviewId,
    pub user: UserId,
    pub is_like: bool,
}

/// Record `user`'s vote on `review`. A second vote by the same user replaces
/// the first and keeps its id.
pub fn cast_vote(
    existing: Option<ReviewLike>,
    review: ReviewId,
    user: UserId,
    is_like: bool,
) -> ReviewLike {
    match existing {
        Some(mut vote) if vote.review == review && vote.user == user => {
            vote.is_like = is_like;
            vote
        }
        _ => ReviewLike {
            id: ReviewItemId::new(),
            review,
            user,
            is_like,
        },
    }
}

impl_entity!(ReviewResponse, ReviewItemId);
impl_entity!(ReviewFlag, ReviewItemId);
impl_entity!(ReviewLike, ReviewItemId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn revote_overwrites_in_place() {
        let review = ReviewId::new();
        let user = UserId::new();
        let first = cast_vote(None, review, user, true);
        let second = cast_vote(Some(first.clone()), review, user, false);
        assert_eq!(second.id, first.id);
        assert!(!second.is_like);
    }

    #[test]
    fn flag_reason_is_bounded() {
        let err = ReviewFlag::new(
            ReviewId::new(),
            UserId::new(),
            NewReviewFlag { reason: "x".repeat(201) },
            Utc::now(),
        );
        assert!(err.is_err());
    }
}
