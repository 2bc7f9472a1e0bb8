use axum::{extract::State, http::StatusCode};
use chrono::Utc;

use crate::error::{AppError, AppResult};
use crate::extractors::{CurrentUser, Json, Path};
use crate::lifecycle::{can_access, complete_booking, create_booking};
use crate::model::{Booking, BookingRequest};
use crate::state::AppState;

fn newest_first(mut bookings: Vec<Booking>) -> Vec<Booking> {
    bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    bookings
}

/// `POST /listings/{id}/book`
pub async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(listing_id): Path<String>,
    Json(request): Json<BookingRequest>,
) -> AppResult<(StatusCode, Json<Booking>)> {
    let booking = create_booking(
        &state.store,
        &listing_id,
        &user,
        request,
        state.config.max_stay_nights,
    )?;
    Ok((StatusCode::CREATED, Json(booking)))
}

/// `GET /bookings`: the caller's own bookings
pub async fn list_mine(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<Vec<Booking>>> {
    let bookings = state.store.list_bookings_by_guest(&user.id)?;
    Ok(Json(bookings))
}

/// `GET /host/bookings`: bookings on listings the caller owns
pub async fn list_hosted(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<Vec<Booking>>> {
    let mut bookings = Vec::new();
    for listing in state.store.list_listings()? {
        if listing.owner_id == user.id {
            bookings.extend(state.store.list_bookings_by_listing(&listing.id, &[])?);
        }
    }
    Ok(Json(newest_first(bookings)))
}

/// `GET /bookings/{id}`
pub async fn show(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<Booking>> {
    let booking = state
        .store
        .get_booking(&id)?
        .ok_or(AppError::NotFound("Booking"))?;
    if !can_access(&state.store, &booking, &user)? {
        return Err(AppError::Forbidden(
            "You are not allowed to view this booking".to_string(),
        ));
    }
    Ok(Json(booking))
}

/// `POST /bookings/{id}/complete`
pub async fn complete(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<Booking>> {
    let today = Utc::now().date_naive();
    let booking = complete_booking(&state.store, &id, &user, today)?;
    tracing::info!("Booking {} completed by {}", booking.id, user.id);
    Ok(Json(booking))
}
