use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::NamedTempFile;
use tower::ServiceExt;

use wanderlust::config::Config;
use wanderlust::route::create_app;
use wanderlust::state::AppState;
use wanderlust::store::Store;

const TOKEN: &str = "secret_token";

fn setup_test_app(admin_token: Option<&str>) -> (Router, NamedTempFile) {
    let temp_db = NamedTempFile::new().expect("Failed to create temp file");
    let store = Store::open(temp_db.path().to_str().unwrap())
        .expect("Failed to initialize test database");
    let config = Config {
        admin_token: admin_token.map(str::to_string),
        rate_limit_max: 0,
        ..Config::default()
    };
    (create_app(AppState::new(store, config)), temp_db)
}

/// Helper function to parse response body as JSON
async fn response_json(body: Body) -> Value {
    let bytes = body
        .collect()
        .await
        .expect("Failed to read response body")
        .to_bytes();

    serde_json::from_slice(&bytes).expect("Failed to parse JSON")
}

async fn call(
    app: &Router,
    method: &str,
    uri: &str,
    headers: &[(&str, &str)],
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    (status, response_json(response.into_body()).await)
}

async fn register(app: &Router, username: &str) -> String {
    let (status, body) = call(
        app,
        "POST",
        "/users",
        &[],
        Some(json!({ "username": username, "email": format!("{username}@example.com") })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_admin_enabled_valid_token() {
    let (app, _temp_db) = setup_test_app(Some(TOKEN));

    let (status, body) = call(&app, "GET", "/admin/stats", &[("Authorization", TOKEN)], None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalUsers"], 0);
    assert_eq!(body["totalRevenue"], 0.0);
}

#[tokio::test]
async fn test_admin_enabled_invalid_token() {
    let (app, _temp_db) = setup_test_app(Some(TOKEN));

    let (status, body) = call(
        &app,
        "GET",
        "/admin/stats",
        &[("Authorization", "wrong_token")],
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "unauthorized");
}

#[tokio::test]
async fn test_admin_enabled_missing_token() {
    let (app, _temp_db) = setup_test_app(Some(TOKEN));

    let (status, _) = call(&app, "GET", "/admin/users", &[], None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_disabled_without_token() {
    let (app, _temp_db) = setup_test_app(None);

    let (status, _) = call(&app, "GET", "/admin/stats", &[], None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_token_does_not_guard_public_routes() {
    let (app, _temp_db) = setup_test_app(Some(TOKEN));

    let (status, _) = call(&app, "GET", "/listings", &[], None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_suspended_user_is_forbidden() {
    let (app, _temp_db) = setup_test_app(Some(TOKEN));
    let user = register(&app, "marta").await;
    let admin = [("Authorization", TOKEN)];

    let (status, body) = call(
        &app,
        "PATCH",
        &format!("/admin/users/{user}/status"),
        &admin,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "suspended");

    let (status, body) = call(&app, "GET", "/users/me", &[("x-user-id", user.as_str())], None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "forbidden");

    let (_, body) = call(
        &app,
        "PATCH",
        &format!("/admin/users/{user}/status"),
        &admin,
        None,
    )
    .await;
    assert_eq!(body["status"], "active");
    let (status, _) = call(&app, "GET", "/users/me", &[("x-user-id", user.as_str())], None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_admin_role_and_listing_status() {
    let (app, _temp_db) = setup_test_app(None);
    let host = register(&app, "host").await;
    let moderator = register(&app, "moderator").await;

    let (status, listing) = call(
        &app,
        "POST",
        "/listings",
        &[("x-user-id", host.as_str())],
        Some(json!({
            "title": "Harbour flat",
            "description": "Two rooms above the fish market.",
            "price": 75.0,
            "location": "Porto",
            "country": "Portugal"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let listing_id = listing["id"].as_str().unwrap();

    let (status, body) = call(
        &app,
        "PATCH",
        &format!("/admin/listings/{listing_id}/status"),
        &[],
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "inactive");

    let (_, search) = call(&app, "GET", "/listings", &[], None).await;
    assert_eq!(search["pagination"]["total"], 0);

    // Admins may manage listings they do not own
    let (status, body) = call(
        &app,
        "PATCH",
        &format!("/admin/users/{moderator}/role"),
        &[],
        Some(json!({ "role": "admin" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "admin");

    let (status, _) = call(
        &app,
        "DELETE",
        &format!("/listings/{listing_id}"),
        &[("x-user-id", moderator.as_str())],
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = call(&app, "PATCH", "/admin/users/usr_missing/status", &[], None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_users_and_messages() {
    let (app, _temp_db) = setup_test_app(None);
    for name in ["alice", "bruno", "carla"] {
        register(&app, name).await;
    }

    let (status, body) = call(&app, "GET", "/admin/users?page=2&limit=2", &[], None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["users"].as_array().unwrap().len(), 1);
    assert_eq!(body["pagination"]["total"], 3);
    assert_eq!(body["pagination"]["pages"], 2);

    let (status, _) = call(
        &app,
        "POST",
        "/contact",
        &[],
        Some(json!({
            "name": "Visitor",
            "email": "visitor@example.com",
            "subject": "Lost property",
            "message": "I left a scarf in the Porto flat last week."
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, messages) = call(&app, "GET", "/admin/messages", &[], None).await;
    assert_eq!(messages[0]["subject"], "Lost property");

    let (_, stats) = call(&app, "GET", "/admin/stats", &[], None).await;
    assert_eq!(stats["totalUsers"], 3);
    assert_eq!(stats["bookingsByStatus"]["pending"], 0);
}
