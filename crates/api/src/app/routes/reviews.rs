//! Guest reviews, host responses, flags and votes.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Utc;
use serde_json::Value;

use dreambook_auth::permissions;
use dreambook_core::{DomainError, ListingId, ReviewId};
use dreambook_infra::Store;
use dreambook_reviews::{
    NewReview, NewReviewFlag, NewReviewResponse, Review, ReviewFlag, ReviewLike, ReviewPatch,
    ReviewResponse, ReviewSummary, cast_vote,
};

use crate::app::dto::{self, ListingScope, VoteRequest};
use crate::app::errors::{ApiError, ApiResult};
use crate::app::routes::common::{fetch, parse_id};
use crate::app::services::AppServices;
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_reviews).post(create_review))
        .route("/summary/:listing_id", get(summary))
        .route(
            "/:id",
            get(get_review)
                .put(update_review)
                .patch(update_review)
                .delete(delete_review),
        )
        .route("/:id/respond", post(respond))
        .route("/:id/flag", post(flag))
        .route("/:id/like", post(like))
}

async fn review_json(services: &AppServices, review: &Review) -> ApiResult<Value> {
    let responses: Vec<ReviewResponse> = services
        .stores
        .review_responses
        .list()
        .await?
        .into_iter()
        .filter(|r| r.review == review.id)
        .collect();
    let votes: Vec<ReviewLike> = services
        .stores
        .review_likes
        .list()
        .await?
        .into_iter()
        .filter(|v| v.review == review.id)
        .collect();
    Ok(dto::review_to_json(review, &responses, &votes))
}

async fn load_review(services: &AppServices, id: &str) -> ApiResult<Review> {
    let review_id: ReviewId = parse_id(id, "review")?;
    fetch(&services.stores.reviews, &review_id, "review").await
}

/// Delete a review with its responses, flags and votes.
pub(crate) async fn purge_review(services: &AppServices, review: ReviewId) -> ApiResult<()> {
    services.stores.reviews.delete(&review).await?;
    for response in services.stores.review_responses.list().await? {
        if response.review == review {
            services.stores.review_responses.delete(&response.id).await?;
        }
    }
    for flag in services.stores.review_flags.list().await? {
        if flag.review == review {
            services.stores.review_flags.delete(&flag.id).await?;
        }
    }
    for vote in services.stores.review_likes.list().await? {
        if vote.review == review {
            services.stores.review_likes.delete(&vote.id).await?;
        }
    }
    Ok(())
}

/// GET /api/reviews?listing_id= - newest first
pub async fn list_reviews(
    Extension(services): Extension<Arc<AppServices>>,
    Query(scope): Query<ListingScope>,
) -> ApiResult<Json<Vec<Value>>> {
    let listing = scope
        .listing_id
        .as_deref()
        .map(|raw| parse_id::<ListingId>(raw, "listing"))
        .transpose()?;

    let mut reviews = services.stores.reviews.list().await?;
    reviews.retain(|r| listing.is_none_or(|l| r.listing == l));
    reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let mut out = Vec::with_capacity(reviews.len());
    for review in &reviews {
        out.push(review_json(&services, review).await?);
    }
    Ok(Json(out))
}

/// POST /api/reviews - one review per reservation, by its guest
pub async fn create_review(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Json(body): Json<NewReview>,
) -> ApiResult<Response> {
    let (actor, _) = authz::require(&services, &principal, &permissions::REVIEWS_WRITE).await?;
    let reservation = services
        .stores
        .reservations
        .get(&body.reservation)
        .await?
        .ok_or_else(|| ApiError::bad_request("validation_error", "unknown reservation"))?;

    let _guard = services.booking_lock.lock().await;
    if services
        .stores
        .reviews
        .list()
        .await?
        .iter()
        .any(|r| r.reservation == body.reservation)
    {
        return Err(DomainError::conflict("this reservation has already been reviewed").into());
    }

    let review = Review::write(body, actor.user_id, &reservation, Utc::now())?;
    services.stores.reviews.insert(review.id, review.clone()).await?;

    tracing::info!(review_id = %review.id, listing_id = %review.listing, rating = review.rating, "review written");
    Ok((StatusCode::CREATED, Json(dto::review_to_json(&review, &[], &[]))).into_response())
}

/// GET /api/reviews/:id
pub async fn get_review(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let review = load_review(&services, &id).await?;
    Ok(Json(review_json(&services, &review).await?))
}

/// PUT|PATCH /api/reviews/:id - author only
pub async fn update_review(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Path(id): Path<String>,
    Json(body): Json<ReviewPatch>,
) -> ApiResult<Json<Value>> {
    let (actor, _) = authz::require(&services, &principal, &permissions::REVIEWS_WRITE).await?;
    let mut review = load_review(&services, &id).await?;
    review.ensure_author(actor.user_id, actor.is_admin())?;
    review.apply(body)?;
    services.stores.reviews.upsert(review.id, review.clone()).await?;
    Ok(Json(review_json(&services, &review).await?))
}

/// DELETE /api/reviews/:id - removes responses, flags and votes too
pub async fn delete_review(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let (actor, _) = authz::resolve_principal(&services, &principal).await?;
    let review = load_review(&services, &id).await?;
    review.ensure_author(actor.user_id, actor.is_admin())?;

    purge_review(&services, review.id).await?;
    tracing::info!(review_id = %review.id, "review deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/reviews/:id/respond - the listing's host answers
pub async fn respond(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Path(id): Path<String>,
    Json(body): Json<NewReviewResponse>,
) -> ApiResult<Response> {
    let (actor, _) = authz::resolve_principal(&services, &principal).await?;
    let review = load_review(&services, &id).await?;
    let is_host = services
        .stores
        .listings
        .get(&review.listing)
        .await?
        .is_some_and(|l| l.owner == actor.user_id);
    if !(is_host || actor.is_admin()) {
        return Err(ApiError::forbidden("only the listing's host can respond to its reviews"));
    }

    let response = ReviewResponse::new(review.id, actor.user_id, body, Utc::now())?;
    services
        .stores
        .review_responses
        .insert(response.id, response.clone())
        .await?;
    Ok((StatusCode::CREATED, Json(response)).into_response())
}

/// POST /api/reviews/:id/flag
pub async fn flag(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Path(id): Path<String>,
    Json(body): Json<NewReviewFlag>,
) -> ApiResult<Response> {
    let (actor, _) = authz::resolve_principal(&services, &principal).await?;
    let review = load_review(&services, &id).await?;

    let flag = ReviewFlag::new(review.id, actor.user_id, body, Utc::now())?;
    services.stores.review_flags.insert(flag.id, flag.clone()).await?;
    tracing::warn!(review_id = %review.id, reason = %flag.reason, "review flagged");
    Ok((StatusCode::CREATED, Json(flag)).into_response())
}

/// POST /api/reviews/:id/like - re-voting replaces the earlier vote
pub async fn like(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Path(id): Path<String>,
    Json(body): Json<VoteRequest>,
) -> ApiResult<Json<ReviewLike>> {
    let (actor, _) = authz::resolve_principal(&services, &principal).await?;
    let review = load_review(&services, &id).await?;

    let _guard = services.booking_lock.lock().await;
    let existing = services
        .stores
        .review_likes
        .list()
        .await?
        .into_iter()
        .find(|v| v.review == review.id && v.user == actor.user_id);
    let vote = cast_vote(existing, review.id, actor.user_id, body.is_like);
    services.stores.review_likes.upsert(vote.id, vote.clone()).await?;
    Ok(Json(vote))
}

/// GET /api/reviews/summary/:listing_id
pub async fn summary(
    Extension(services): Extension<Arc<AppServices>>,
    Path(listing_id): Path<String>,
) -> ApiResult<Json<ReviewSummary>> {
    let listing_id: ListingId = parse_id(&listing_id, "listing")?;
    let reviews = services.stores.reviews.list().await?;
    Ok(Json(ReviewSummary::for_listing(listing_id, &reviews)))
}
