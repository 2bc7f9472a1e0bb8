use axum::{extract::State, http::StatusCode};
use chrono::Utc;
use serde_json::{json, Value};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::extractors::{CurrentUser, Json, Path};
use crate::id::new_id;
use crate::model::{Review, ReviewInput};
use crate::state::AppState;

/// `GET /listings/{id}/reviews`, newest first
pub async fn list(
    State(state): State<AppState>,
    Path(listing_id): Path<String>,
) -> AppResult<Json<Vec<Review>>> {
    Ok(Json(state.store.list_reviews_for_listing(&listing_id)?))
}

/// `POST /listings/{id}/reviews`
pub async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(listing_id): Path<String>,
    Json(mut input): Json<ReviewInput>,
) -> AppResult<(StatusCode, Json<Review>)> {
    input.comment = input.comment.trim().to_string();
    input.validate()?;

    let review = Review {
        id: new_id("rev"),
        listing_id,
        author_id: user.id.clone(),
        author_name: user.display_name(),
        rating: input.rating,
        comment: input.comment,
        created_at: Utc::now(),
    };
    let listing = state.store.create_review(&review)?;
    tracing::info!(
        "Review {} added to listing {} (average now {:?})",
        review.id,
        listing.id,
        listing.average_rating
    );
    Ok((StatusCode::CREATED, Json(review)))
}

/// `DELETE /listings/{id}/reviews/{review_id}`
///
/// Allowed for the review's author, the listing owner and admins.
pub async fn delete(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((listing_id, review_id)): Path<(String, String)>,
) -> AppResult<Json<Value>> {
    let review = state
        .store
        .get_review(&review_id)?
        .filter(|r| r.listing_id == listing_id)
        .ok_or(AppError::NotFound("Review"))?;
    let listing = state
        .store
        .get_listing(&listing_id)?
        .ok_or(AppError::NotFound("Listing"))?;

    if review.author_id != user.id && listing.owner_id != user.id && !user.is_admin() {
        return Err(AppError::Forbidden(
            "You are not allowed to delete this review".to_string(),
        ));
    }

    let listing = state.store.delete_review(&listing_id, &review_id)?;
    Ok(Json(json!({
        "success": true,
        "reviewCount": listing.review_ids.len(),
        "averageRating": listing.average_rating
    })))
}
