//! `dreambook-reviews` — guest reviews of completed or confirmed stays, host
//! responses, moderation flags and helpfulness votes.

pub mod feedback;
pub mod review;
pub mod summary;

pub use feedback::{NewReviewFlag, NewReviewResponse, ReviewFlag, ReviewLike, ReviewResponse, cast_vote};
pub use review::{NewReview, Review, ReviewPatch};
pub use summary::ReviewSummary;
