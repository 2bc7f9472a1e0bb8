//! Stay pricing: nights times the nightly rate.
//!
//! Weekly and monthly discounts stored on listings are not
//! applied.

use chrono::NaiveDate;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quote {
    pub nights: i64,
    pub total: f64,
}

/// Rounds to whole cents
pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

pub fn compute_total(nightly_price: f64, check_in: NaiveDate, check_out: NaiveDate) -> AppResult<Quote> {
    if !nightly_price.is_finite() || nightly_price <= 0.0 {
        return Err(AppError::Validation(
            "Nightly price must be a positive number".to_string(),
        ));
    }
    if check_out <= check_in {
        return Err(AppError::Validation(
            "Check-out must be after check-in".to_string(),
        ));
    }

    // Dates carry no time component, so the day difference is already whole.
    let nights = (check_out - check_in).num_days();
    Ok(Quote {
        nights,
        total: round_cents(nights as f64 * nightly_price),
    })
}
