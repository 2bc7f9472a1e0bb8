//! Listing endpoints: search, create, show, update, delete, availability
//! and favorites.

use axum::{extract::State, http::StatusCode};
use chrono::Utc;
use serde_json::{json, Value};
use validator::Validate;

use crate::availability::unavailable_dates;
use crate::error::{AppError, AppResult};
use crate::extractors::{CurrentUser, Json, Path, Query};
use crate::id::new_id;
use crate::model::{Listing, ListingInput, ListingStatus, User};
use crate::search::{search_listings, ListingQuery, SearchResults};
use crate::state::AppState;

const DEFAULT_CURRENCY: &str = "USD";
const DEFAULT_MAX_GUESTS: u32 = 2;
const DEFAULT_ROOMS: u32 = 1;

fn validated(mut input: ListingInput) -> AppResult<ListingInput> {
    input.normalize();
    input.validate()?;
    Ok(input)
}

fn currency(input: &ListingInput) -> String {
    input
        .currency
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_uppercase)
        .unwrap_or_else(|| DEFAULT_CURRENCY.to_string())
}

fn ensure_owner(listing: &Listing, user: &User, action: &str) -> AppResult<()> {
    if listing.owner_id == user.id || user.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "Only the owner can {action} this listing"
        )))
    }
}

/// `GET /listings`
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<ListingQuery>,
) -> AppResult<Json<SearchResults>> {
    Ok(Json(search_listings(&state.store, &query)?))
}

/// `POST /listings`
///
/// The creator becomes the owner and is promoted to host if they were a
/// guest.
pub async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<ListingInput>,
) -> AppResult<(StatusCode, Json<Listing>)> {
    let input = validated(input)?;
    let now = Utc::now();
    let listing = Listing {
        id: new_id("lst"),
        currency: currency(&input),
        title: input.title,
        description: input.description,
        price: input.price,
        location: input.location,
        country: input.country,
        max_guests: input.max_guests.unwrap_or(DEFAULT_MAX_GUESTS),
        bedrooms: input.bedrooms.unwrap_or(DEFAULT_ROOMS),
        bathrooms: input.bathrooms.unwrap_or(DEFAULT_ROOMS),
        category: input.category.unwrap_or_default(),
        amenities: input.amenities.unwrap_or_default(),
        image_url: input.image_url,
        owner_id: user.id.clone(),
        review_ids: Vec::new(),
        average_rating: None,
        status: ListingStatus::Active,
        favorite_count: 0,
        view_count: 0,
        weekly_discount: input.weekly_discount,
        monthly_discount: input.monthly_discount,
        created_at: now,
        updated_at: now,
    };

    state.store.create_listing(&listing)?;
    tracing::info!("Listing {} created by {}", listing.id, user.id);
    Ok((StatusCode::CREATED, Json(listing)))
}

/// `GET /listings/{id}`, counting the view
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Listing>> {
    let listing = state.store.update_listing(&id, |l| {
        l.view_count += 1;
        Ok(())
    })?;
    Ok(Json(listing))
}

/// `PUT /listings/{id}`
pub async fn update(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Json(input): Json<ListingInput>,
) -> AppResult<Json<Listing>> {
    let input = validated(input)?;
    let listing = state.store.update_listing(&id, |l| {
        ensure_owner(l, &user, "edit")?;
        l.currency = currency(&input);
        l.title = input.title;
        l.description = input.description;
        l.price = input.price;
        l.location = input.location;
        l.country = input.country;
        if let Some(max_guests) = input.max_guests {
            l.max_guests = max_guests;
        }
        if let Some(bedrooms) = input.bedrooms {
            l.bedrooms = bedrooms;
        }
        if let Some(bathrooms) = input.bathrooms {
            l.bathrooms = bathrooms;
        }
        if let Some(category) = input.category {
            l.category = category;
        }
        if let Some(amenities) = input.amenities {
            l.amenities = amenities;
        }
        if input.image_url.is_some() {
            l.image_url = input.image_url;
        }
        l.weekly_discount = input.weekly_discount;
        l.monthly_discount = input.monthly_discount;
        l.updated_at = Utc::now();
        Ok(())
    })?;

    tracing::debug!("Listing {} updated by {}", listing.id, user.id);
    Ok(Json(listing))
}

/// `DELETE /listings/{id}`
pub async fn delete(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    let listing = state
        .store
        .get_listing(&id)?
        .ok_or(AppError::NotFound("Listing"))?;
    ensure_owner(&listing, &user, "delete")?;

    state.store.delete_listing(&id)?;
    tracing::info!("Listing {} deleted by {}", id, user.id);
    Ok(Json(json!({
        "message": "Listing deleted successfully",
        "deletedId": id
    })))
}

/// `GET /listings/{id}/unavailable-dates`
pub async fn unavailable(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    let dates = unavailable_dates(&state.store, &id)?;
    Ok(Json(json!({ "unavailableDates": dates })))
}

/// `POST /listings/{id}/favorite` toggles the listing in the user's
/// favorites.
pub async fn toggle_favorite(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    let (is_favorite, favorite_count) = state.store.toggle_favorite(&user.id, &id)?;
    Ok(Json(json!({
        "success": true,
        "isFavorite": is_favorite,
        "favoriteCount": favorite_count
    })))
}
