//! Blocked-date calculation for a listing
//!
//! A stay from `check_in` to `check_out` occupies every night in
//! `[check_in, check_out)`. Only pending and confirmed bookings block
//! dates, so a cancellation frees its nights immediately.

use std::collections::BTreeSet;

use chrono::{Days, NaiveDate};

use crate::error::{AppError, AppResult};
use crate::model::{Booking, BookingStatus};
use crate::store::Store;

/// Iterates the nights of a stay, check-in inclusive, check-out exclusive.
///
/// Yields nothing when `check_out <= check_in`.
pub fn nights(check_in: NaiveDate, check_out: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    std::iter::successors(Some(check_in), |d| d.checked_add_days(Days::new(1)))
        .take_while(move |d| *d < check_out)
}

/// Unions the nights of every blocking booking into a sorted date set.
pub fn blocked_dates<'a>(bookings: impl IntoIterator<Item = &'a Booking>) -> BTreeSet<NaiveDate> {
    bookings
        .into_iter()
        .filter(|b| b.status.blocks_dates())
        .flat_map(|b| nights(b.check_in, b.check_out))
        .collect()
}

/// `YYYY-MM-DD` strings for the API response
pub fn to_iso_strings(dates: &BTreeSet<NaiveDate>) -> Vec<String> {
    dates.iter().map(|d| d.format("%Y-%m-%d").to_string()).collect()
}

/// Dates of `listing_id` that new bookings cannot use, as sorted
/// `YYYY-MM-DD` strings.
pub fn unavailable_dates(store: &Store, listing_id: &str) -> AppResult<Vec<String>> {
    if store.get_listing(listing_id)?.is_none() {
        return Err(AppError::NotFound("Listing"));
    }
    let bookings = store.list_bookings_by_listing(listing_id, &BookingStatus::BLOCKING)?;
    Ok(to_iso_strings(&blocked_dates(&bookings)))
}

/// True when any night of `[check_in, check_out)` is in `blocked`.
pub fn overlaps(blocked: &BTreeSet<NaiveDate>, check_in: NaiveDate, check_out: NaiveDate) -> bool {
    check_in < check_out && blocked.range(check_in..check_out).next().is_some()
}
