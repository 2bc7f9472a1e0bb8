//! Route definitions for the rental API
//!
//! Maps every HTTP route to its handler and layers the middleware:
//! the admin token check on `/admin`, the rate limiter on everything.

use axum::middleware;
use axum::routing::{delete, get, patch, post};
use axum::Router;

use crate::handler::{admin, booking, contact, health, listing, payment, review, user};
use crate::middleware::{admin_auth, rate_limit};
use crate::state::AppState;

/// Creates the application router
///
/// # Example Usage
///
/// ```no_run
/// # use wanderlust::config::Config;
/// # use wanderlust::route::create_app;
/// # use wanderlust::state::AppState;
/// # use wanderlust::store::Store;
/// let store = Store::open("data.db").unwrap();
/// let app = create_app(AppState::new(store, Config::default()));
/// // axum::serve(listener, app).await.unwrap();
/// ```
pub fn create_app(state: AppState) -> Router {
    let admin_routes = Router::new()
        .route("/stats", get(admin::stats))
        .route("/users", get(admin::users))
        .route("/users/{id}/status", patch(admin::toggle_user_status))
        .route("/users/{id}/role", patch(admin::set_user_role))
        .route("/listings/{id}/status", patch(admin::toggle_listing_status))
        .route("/messages", get(admin::messages))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth));

    Router::new()
        .route("/health", get(health))
        .route("/users", post(user::register))
        .route("/users/me", get(user::me))
        .route("/users/me/favorites", get(user::favorites))
        .route("/listings", get(listing::search).post(listing::create))
        .route(
            "/listings/{id}",
            get(listing::show).put(listing::update).delete(listing::delete),
        )
        .route("/listings/{id}/unavailable-dates", get(listing::unavailable))
        .route("/listings/{id}/book", post(booking::create))
        .route("/listings/{id}/favorite", post(listing::toggle_favorite))
        .route(
            "/listings/{id}/reviews",
            get(review::list).post(review::create),
        )
        .route(
            "/listings/{id}/reviews/{review_id}",
            delete(review::delete),
        )
        .route("/bookings", get(booking::list_mine))
        .route("/bookings/{id}", get(booking::show))
        .route("/bookings/{id}/complete", post(booking::complete))
        .route("/host/bookings", get(booking::list_hosted))
        .route("/payments/process", post(payment::process))
        .route("/payments/refund", post(payment::refund))
        .route("/contact", post(contact::submit))
        .nest("/admin", admin_routes)
        .layer(middleware::from_fn_with_state(state.clone(), rate_limit))
        .with_state(state)
}
