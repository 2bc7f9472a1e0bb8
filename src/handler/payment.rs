//! Payment endpoints
//!
//! Both routes go through the gateway held in `AppState`; the booking
//! lifecycle decides whether the transition is allowed.

use axum::extract::State;
use chrono::Utc;
use serde::Serialize;

use crate::error::AppResult;
use crate::extractors::{CurrentUser, Json};
use crate::lifecycle::{cancel_booking, process_payment};
use crate::model::{Booking, PaymentRequest, RefundRequest};
use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
    pub success: bool,
    pub payment_id: String,
    pub booking: Booking,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundResponse {
    pub success: bool,
    pub refund_amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refund_id: Option<String>,
    pub booking: Booking,
}

/// `POST /payments/process`
pub async fn process(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<PaymentRequest>,
) -> AppResult<Json<PaymentResponse>> {
    let receipt = process_payment(
        &state.store,
        state.gateway.as_ref(),
        &request.booking_id,
        &request.payment_method,
        &user,
    )
    .await?;

    Ok(Json(PaymentResponse {
        success: true,
        payment_id: receipt.payment_id,
        booking: receipt.booking,
    }))
}

/// `POST /payments/refund` cancels the booking and refunds per policy.
pub async fn refund(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<RefundRequest>,
) -> AppResult<Json<RefundResponse>> {
    let booking = cancel_booking(
        &state.store,
        state.gateway.as_ref(),
        &request.booking_id,
        &user,
        &request.reason,
        Utc::now(),
    )
    .await?;

    let (refund_amount, refund_id) = booking
        .cancellation
        .as_ref()
        .map(|c| (c.refund_amount, c.refund_reference.clone()))
        .unwrap_or((0.0, None));

    Ok(Json(RefundResponse {
        success: true,
        refund_amount,
        refund_id,
        booking,
    }))
}
