use axum::{extract::State, http::StatusCode};
use chrono::Utc;
use validator::Validate;

use crate::error::AppResult;
use crate::extractors::{CurrentUser, Json};
use crate::id::new_id;
use crate::model::{Listing, RegisterRequest, Role, User, UserStatus};
use crate::state::AppState;

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// `POST /users` registers a profile. Credentials live with the upstream
/// authentication layer; the returned id is what it sends as `X-User-Id`.
pub async fn register(
    State(state): State<AppState>,
    Json(mut request): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<User>)> {
    request.username = request.username.trim().to_string();
    request.email = request.email.trim().to_lowercase();
    request.validate()?;

    let user = User {
        id: new_id("usr"),
        username: request.username,
        email: request.email,
        first_name: non_empty(request.first_name),
        last_name: non_empty(request.last_name),
        bio: non_empty(request.bio),
        role: Role::Guest,
        status: UserStatus::Active,
        favorites: Vec::new(),
        created_at: Utc::now(),
    };
    state.store.create_user(&user)?;
    tracing::info!("Registered user {} ({})", user.id, user.username);
    Ok((StatusCode::CREATED, Json(user)))
}

/// `GET /users/me`
pub async fn me(CurrentUser(user): CurrentUser) -> Json<User> {
    Json(user)
}

/// `GET /users/me/favorites`
///
/// Favorites pointing at listings that no longer exist are skipped.
pub async fn favorites(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<Vec<Listing>>> {
    let mut listings = Vec::with_capacity(user.favorites.len());
    for id in &user.favorites {
        if let Some(listing) = state.store.get_listing(id)? {
            listings.push(listing);
        }
    }
    Ok(Json(listings))
}
