//! Admin endpoints, mounted behind the admin token check

use axum::extract::State;
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::AppResult;
use crate::extractors::{Json, Path, Query};
use crate::model::{
    BookingStatus, ContactMessage, ListingStatus, PageParams, RoleRequest, User, UserStatus,
};
use crate::pricing::round_cents;
use crate::search::Pagination;
use crate::state::AppState;

const USERS_PER_PAGE: usize = 20;

#[derive(Serialize, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BookingCounts {
    pub pending: usize,
    pub confirmed: usize,
    pub completed: usize,
    pub cancelled: usize,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total_users: usize,
    pub total_listings: usize,
    pub total_bookings: usize,
    pub bookings_by_status: BookingCounts,
    /// Sum of completed bookings
    pub total_revenue: f64,
}

#[derive(Serialize)]
pub struct UserPage {
    pub users: Vec<User>,
    pub pagination: Pagination,
}

/// `GET /admin/stats`
pub async fn stats(State(state): State<AppState>) -> AppResult<Json<Stats>> {
    let bookings = state.store.list_bookings()?;
    let mut counts = BookingCounts::default();
    let mut revenue = 0.0;
    for booking in &bookings {
        match booking.status {
            BookingStatus::Pending => counts.pending += 1,
            BookingStatus::Confirmed => counts.confirmed += 1,
            BookingStatus::Completed => {
                counts.completed += 1;
                revenue += booking.total_price;
            }
            BookingStatus::Cancelled => counts.cancelled += 1,
        }
    }

    Ok(Json(Stats {
        total_users: state.store.list_users()?.len(),
        total_listings: state.store.list_listings()?.len(),
        total_bookings: bookings.len(),
        bookings_by_status: counts,
        total_revenue: round_cents(revenue),
    }))
}

/// `GET /admin/users`, newest first
pub async fn users(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> AppResult<Json<UserPage>> {
    let users = state.store.list_users()?;
    let pagination = Pagination::new(
        params.page,
        Some(params.limit.unwrap_or(USERS_PER_PAGE)),
        users.len(),
    );
    Ok(Json(UserPage {
        users: pagination.slice(users),
        pagination,
    }))
}

/// `PATCH /admin/users/{id}/status` flips active/suspended
pub async fn toggle_user_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    let user = state.store.update_user(&id, |u| {
        u.status = match u.status {
            UserStatus::Active => UserStatus::Suspended,
            UserStatus::Suspended => UserStatus::Active,
        };
        Ok(())
    })?;
    tracing::info!("User {} is now {:?}", user.id, user.status);
    Ok(Json(json!({ "success": true, "status": user.status })))
}

/// `PATCH /admin/users/{id}/role`
pub async fn set_user_role(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<RoleRequest>,
) -> AppResult<Json<User>> {
    let user = state.store.update_user(&id, |u| {
        u.role = request.role;
        Ok(())
    })?;
    tracing::info!("User {} role set to {:?}", user.id, user.role);
    Ok(Json(user))
}

/// `PATCH /admin/listings/{id}/status` flips active/inactive
pub async fn toggle_listing_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    let listing = state.store.update_listing(&id, |l| {
        l.status = match l.status {
            ListingStatus::Active => ListingStatus::Inactive,
            ListingStatus::Inactive => ListingStatus::Active,
        };
        l.updated_at = Utc::now();
        Ok(())
    })?;
    tracing::info!("Listing {} is now {:?}", listing.id, listing.status);
    Ok(Json(json!({ "success": true, "status": listing.status })))
}

/// `GET /admin/messages`, newest first
pub async fn messages(State(state): State<AppState>) -> AppResult<Json<Vec<ContactMessage>>> {
    Ok(Json(state.store.list_messages()?))
}
