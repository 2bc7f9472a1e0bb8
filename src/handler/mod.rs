//! HTTP request handlers
//!
//! Each submodule covers one resource. Handlers extract the acting user,
//! delegate to the store or the booking lifecycle, and return
//! `AppResult<T>`; errors render through `AppError`'s `IntoResponse`.

pub mod admin;
pub mod booking;
pub mod contact;
pub mod listing;
pub mod payment;
pub mod review;
pub mod user;

use serde_json::{json, Value};

use crate::extractors::Json;

/// Liveness check
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
