use axum::{extract::State, http::StatusCode};
use chrono::Utc;
use serde_json::{json, Value};
use validator::Validate;

use crate::error::AppResult;
use crate::extractors::{Json, MaybeUser};
use crate::id::new_id;
use crate::model::{ContactMessage, ContactRequest};
use crate::state::AppState;

/// `POST /contact`, open to anonymous visitors
pub async fn submit(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Json(mut request): Json<ContactRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    request.name = request.name.trim().to_string();
    request.email = request.email.trim().to_string();
    request.subject = request.subject.trim().to_string();
    request.message = request.message.trim().to_string();
    request.validate()?;

    let message = ContactMessage {
        id: new_id("msg"),
        name: request.name,
        email: request.email,
        subject: request.subject,
        message: request.message,
        user_id: user.map(|u| u.id),
        created_at: Utc::now(),
    };
    state.store.create_message(&message)?;
    tracing::info!("Contact message {} received from {}", message.id, message.email);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "id": message.id,
            "message": "Thank you for contacting us. We'll get back to you soon."
        })),
    ))
}
