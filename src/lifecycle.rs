//! Booking lifecycle
//!
//! ```text
//! pending ──pay──> confirmed ──complete──> completed
//!    │                 │
//!    └──────cancel─────┴──> cancelled
//! ```
//!
//! Each transition is validated against the current status and written as
//! a single store update. `completed` and `cancelled` are terminal.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use crate::error::{AppError, AppResult};
use crate::id::new_id;
use crate::model::{
    Booking, BookingRequest, BookingStatus, Cancellation, ListingStatus, PaymentStatus, User,
};
use crate::payment::{Charge, PaymentGateway, PaymentOutcome};
use crate::pricing::{compute_total, round_cents};
use crate::store::Store;

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// Longest stay accepted unless configured otherwise
pub const DEFAULT_MAX_STAY_NIGHTS: i64 = 365;

pub fn parse_date(field: &str, raw: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::Validation(format!("{field} must be a date in YYYY-MM-DD format")))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Owner of the booked listing, if the listing still exists
fn listing_owner(store: &Store, listing_id: &str) -> AppResult<Option<String>> {
    Ok(store.get_listing(listing_id)?.map(|l| l.owner_id))
}

/// Guests see their own bookings, hosts see bookings on their listings.
pub fn can_access(store: &Store, booking: &Booking, user: &User) -> AppResult<bool> {
    if user.is_admin() || booking.guest_id == user.id {
        return Ok(true);
    }
    Ok(listing_owner(store, &booking.listing_id)?.as_deref() == Some(user.id.as_str()))
}

/// Validates the request, prices the stay and stores a pending booking.
///
/// Nothing is written unless every check passes; overlapping an existing
/// pending or confirmed stay fails with `Conflict`.
pub fn create_booking(
    store: &Store,
    listing_id: &str,
    guest: &User,
    request: BookingRequest,
    max_nights: i64,
) -> AppResult<Booking> {
    let check_in = parse_date("checkIn", &request.check_in)?;
    let check_out = parse_date("checkOut", &request.check_out)?;
    if check_out <= check_in {
        return Err(AppError::Validation(
            "Check-out must be after check-in".to_string(),
        ));
    }
    if (check_out - check_in).num_days() > max_nights {
        return Err(AppError::Validation(format!(
            "Stays are limited to {max_nights} nights"
        )));
    }
    if request.guests == 0 {
        return Err(AppError::Validation(
            "At least one guest is required".to_string(),
        ));
    }

    let listing = store
        .get_listing(listing_id)?
        .ok_or(AppError::NotFound("Listing"))?;
    if listing.status != ListingStatus::Active {
        return Err(AppError::Validation(
            "This listing is not accepting bookings".to_string(),
        ));
    }
    if request.guests > listing.max_guests {
        return Err(AppError::Validation(format!(
            "This listing allows at most {} guests",
            listing.max_guests
        )));
    }

    let quote = compute_total(listing.price, check_in, check_out)?;
    let now = Utc::now();
    let booking = Booking {
        id: new_id("bk"),
        listing_id: listing.id.clone(),
        guest_id: guest.id.clone(),
        check_in,
        check_out,
        guests: request.guests,
        nights: quote.nights,
        total_price: quote.total,
        currency: listing.currency.clone(),
        status: BookingStatus::Pending,
        phone: non_empty(request.phone),
        message: non_empty(request.message),
        payment_status: PaymentStatus::Unpaid,
        payment_reference: None,
        cancellation: None,
        created_at: now,
        updated_at: now,
    };

    store.create_booking(&booking)?;
    tracing::info!(
        "Booking {} created for listing {} ({} to {}, {:.2} {})",
        booking.id,
        booking.listing_id,
        booking.check_in,
        booking.check_out,
        booking.total_price,
        booking.currency
    );
    Ok(booking)
}

/// Result of a successful payment
#[derive(Debug, Clone)]
pub struct PaymentReceipt {
    pub payment_id: String,
    pub booking: Booking,
}

fn ensure_transition(from: BookingStatus, to: BookingStatus) -> AppResult<()> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(AppError::InvalidTransition { from, to })
    }
}

/// Charges the booking total and confirms the booking.
///
/// A decline leaves the booking untouched. If the booking stopped being
/// pending while the charge was in flight, the charge is refunded and the
/// call fails with `Conflict`.
pub async fn process_payment(
    store: &Store,
    gateway: &dyn PaymentGateway,
    booking_id: &str,
    payment_method: &str,
    payer: &User,
) -> AppResult<PaymentReceipt> {
    let booking = store
        .get_booking(booking_id)?
        .ok_or(AppError::NotFound("Booking"))?;
    if booking.guest_id != payer.id && !payer.is_admin() {
        return Err(AppError::Forbidden(
            "Only the guest can pay for this booking".to_string(),
        ));
    }
    let method = payment_method.trim();
    if method.is_empty() {
        return Err(AppError::Validation("Payment method is required".to_string()));
    }
    ensure_transition(booking.status, BookingStatus::Confirmed)?;

    let outcome = gateway
        .submit(Charge {
            amount: booking.total_price,
            currency: &booking.currency,
            method,
            description: format!("Booking {}", booking.id),
        })
        .await?;

    let reference = match outcome {
        PaymentOutcome::Accepted { reference } => reference,
        PaymentOutcome::Declined { reason } => {
            tracing::warn!("Payment for booking {} declined: {}", booking.id, reason);
            return Err(AppError::PaymentDeclined(reason));
        }
    };

    let confirmed = store.update_booking(booking_id, |b| {
        ensure_transition(b.status, BookingStatus::Confirmed)?;
        b.status = BookingStatus::Confirmed;
        b.payment_status = PaymentStatus::Paid;
        b.payment_reference = Some(reference.clone());
        Ok(())
    });

    match confirmed {
        Ok(booking) => {
            tracing::info!("Booking {} confirmed by payment {}", booking.id, reference);
            Ok(PaymentReceipt {
                payment_id: reference,
                booking,
            })
        }
        Err(err) => {
            tracing::warn!(
                "Reversing payment {} for booking {}: {}",
                reference,
                booking_id,
                err
            );
            if let Err(refund_err) = gateway.refund(&reference, booking.total_price).await {
                tracing::error!("Could not reverse payment {}: {}", reference, refund_err);
            }
            match err {
                AppError::InvalidTransition { .. } => Err(AppError::Conflict(
                    "Booking changed while the payment was processed; the charge was reversed"
                        .to_string(),
                )),
                other => Err(other),
            }
        }
    }
}

/// Whole days until check-in (00:00 UTC), rounded up
pub fn days_until_check_in(check_in: NaiveDate, now: DateTime<Utc>) -> i64 {
    let starts_at = check_in.and_time(NaiveTime::MIN).and_utc();
    let seconds = (starts_at - now).num_seconds();
    seconds.div_euclid(SECONDS_PER_DAY) + i64::from(seconds.rem_euclid(SECONDS_PER_DAY) > 0)
}

/// Cancellation refund policy: full refund more than 7 days out, half
/// more than 1 day out, nothing after that.
pub fn refund_amount(total: f64, check_in: NaiveDate, now: DateTime<Utc>) -> f64 {
    match days_until_check_in(check_in, now) {
        d if d > 7 => total,
        d if d > 1 => round_cents(total * 0.5),
        _ => 0.0,
    }
}

/// Cancels a booking, refunding a paid booking according to the policy.
///
/// The booking is marked cancelled (with its refund amount) in one write
/// before the gateway is called, so a concurrent cancel sees it as already
/// cancelled and never refunds a second time. The refund reference is
/// filled in once the gateway answers. Cancelling an already cancelled
/// booking returns it unchanged.
pub async fn cancel_booking(
    store: &Store,
    gateway: &dyn PaymentGateway,
    booking_id: &str,
    actor: &User,
    reason: &str,
    now: DateTime<Utc>,
) -> AppResult<Booking> {
    let booking = store
        .get_booking(booking_id)?
        .ok_or(AppError::NotFound("Booking"))?;
    if !can_access(store, &booking, actor)? {
        return Err(AppError::Forbidden(
            "You are not allowed to cancel this booking".to_string(),
        ));
    }
    if booking.status == BookingStatus::Cancelled {
        return Ok(booking);
    }
    ensure_transition(booking.status, BookingStatus::Cancelled)?;

    let (cancelled, claimed) = store.update_booking_if(booking_id, |b| {
        if b.status == BookingStatus::Cancelled {
            return Ok(false);
        }
        ensure_transition(b.status, BookingStatus::Cancelled)?;

        let refund = if b.payment_status == PaymentStatus::Paid {
            if b.payment_reference.is_none() {
                return Err(AppError::Conflict(
                    "Paid booking has no payment reference".to_string(),
                ));
            }
            refund_amount(b.total_price, b.check_in, now)
        } else {
            0.0
        };

        b.status = BookingStatus::Cancelled;
        b.cancellation = Some(Cancellation {
            cancelled_by: actor.id.clone(),
            cancelled_at: now,
            reason: reason.trim().to_string(),
            refund_amount: refund,
            refund_reference: None,
        });
        Ok(true)
    })?;
    if !claimed {
        return Ok(cancelled);
    }

    let refund = cancelled
        .cancellation
        .as_ref()
        .map_or(0.0, |c| c.refund_amount);
    let payment_reference = match cancelled.payment_reference.clone() {
        Some(reference) if refund > 0.0 => reference,
        _ => {
            tracing::info!("Booking {} cancelled by {} without refund", cancelled.id, actor.id);
            return Ok(cancelled);
        }
    };

    let refund_reference = match gateway.refund(&payment_reference, refund).await {
        Ok(reference) => reference,
        Err(err) => {
            tracing::error!(
                "Booking {} cancelled but refund of {:.2} {} failed: {}",
                cancelled.id,
                refund,
                cancelled.currency,
                err
            );
            return Err(err);
        }
    };

    let refunded = store.update_booking(booking_id, |b| {
        b.payment_status = PaymentStatus::Refunded;
        if let Some(record) = b.cancellation.as_mut() {
            record.refund_reference = Some(refund_reference.clone());
        }
        Ok(())
    })?;

    tracing::info!(
        "Booking {} cancelled by {} (refund {:.2} {}, {})",
        refunded.id,
        actor.id,
        refund,
        refunded.currency,
        refund_reference
    );
    Ok(refunded)
}

/// Marks a confirmed stay as completed once check-out has been reached.
pub fn complete_booking(
    store: &Store,
    booking_id: &str,
    actor: &User,
    today: NaiveDate,
) -> AppResult<Booking> {
    let booking = store
        .get_booking(booking_id)?
        .ok_or(AppError::NotFound("Booking"))?;
    let owner = listing_owner(store, &booking.listing_id)?;
    if !actor.is_admin() && owner.as_deref() != Some(actor.id.as_str()) {
        return Err(AppError::Forbidden(
            "Only the host can complete this booking".to_string(),
        ));
    }
    ensure_transition(booking.status, BookingStatus::Completed)?;
    if today < booking.check_out {
        return Err(AppError::Validation(
            "A stay can only be completed after check-out".to_string(),
        ));
    }

    store.update_booking(booking_id, |b| {
        ensure_transition(b.status, BookingStatus::Completed)?;
        b.status = BookingStatus::Completed;
        Ok(())
    })
}
