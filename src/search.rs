//! Listing search filters and pagination

use serde::{Deserialize, Serialize};

use crate::availability::{blocked_dates, overlaps};
use crate::error::{AppError, AppResult};
use crate::lifecycle::parse_date;
use crate::model::{BookingStatus, Category, Listing, ListingStatus};
use crate::store::Store;

pub const DEFAULT_PAGE_SIZE: usize = 12;
pub const MAX_PAGE_SIZE: usize = 100;

/// Query string of `GET /listings`
///
/// `amenities` is a comma-separated list; a listing matches when it has
/// any of them.
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ListingQuery {
    pub location: Option<String>,
    pub category: Option<Category>,
    pub guests: Option<u32>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub min_rating: Option<f64>,
    pub amenities: Option<String>,
    pub check_in: Option<String>,
    pub check_out: Option<String>,
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: usize,
    pub limit: usize,
    pub total: usize,
    pub pages: usize,
    pub has_next: bool,
    pub has_prev: bool,
}

impl Pagination {
    /// Clamps `page` to at least 1 and `limit` to `1..=MAX_PAGE_SIZE`.
    pub fn new(page: Option<usize>, limit: Option<usize>, total: usize) -> Self {
        let page = page.unwrap_or(1).max(1);
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let pages = total.div_ceil(limit);
        Self {
            page,
            limit,
            total,
            pages,
            has_next: page < pages,
            has_prev: page > 1,
        }
    }

    pub fn offset(&self) -> usize {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }

    pub fn slice<T>(&self, items: Vec<T>) -> Vec<T> {
        items.into_iter().skip(self.offset()).take(self.limit).collect()
    }
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SearchResults {
    pub listings: Vec<Listing>,
    pub pagination: Pagination,
}

impl ListingQuery {
    fn amenity_list(&self) -> Vec<String> {
        self.amenities
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(|a| a.trim().to_lowercase())
            .filter(|a| !a.is_empty())
            .collect()
    }

    /// Attribute filters; date availability is checked separately.
    pub fn matches(&self, listing: &Listing) -> bool {
        if listing.status != ListingStatus::Active {
            return false;
        }
        if let Some(location) = self.location.as_deref().map(str::trim).filter(|l| !l.is_empty()) {
            let needle = location.to_lowercase();
            let hit = [&listing.location, &listing.country, &listing.title]
                .iter()
                .any(|field| field.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }
        if self.category.is_some_and(|c| c != listing.category) {
            return false;
        }
        if self.guests.is_some_and(|g| listing.max_guests < g) {
            return false;
        }
        if self.min_price.is_some_and(|p| listing.price < p) {
            return false;
        }
        if self.max_price.is_some_and(|p| listing.price > p) {
            return false;
        }
        if let Some(min_rating) = self.min_rating {
            if listing.average_rating.map_or(true, |r| r < min_rating) {
                return false;
            }
        }
        let wanted = self.amenity_list();
        if !wanted.is_empty()
            && !listing
                .amenities
                .iter()
                .any(|a| wanted.contains(&a.to_lowercase()))
        {
            return false;
        }
        true
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Runs a search against every stored listing, newest first.
///
/// The date filter applies only when both `checkIn` and `checkOut` are
/// given; one without the other is rejected.
pub fn search_listings(store: &Store, query: &ListingQuery) -> AppResult<SearchResults> {
    let stay = match (present(&query.check_in), present(&query.check_out)) {
        (None, None) => None,
        (Some(check_in), Some(check_out)) => {
            let check_in = parse_date("checkIn", check_in)?;
            let check_out = parse_date("checkOut", check_out)?;
            if check_out <= check_in {
                return Err(AppError::Validation(
                    "Check-out must be after check-in".to_string(),
                ));
            }
            Some((check_in, check_out))
        }
        _ => {
            return Err(AppError::Validation(
                "checkIn and checkOut must be given together".to_string(),
            ))
        }
    };

    let mut matching = Vec::new();
    for listing in store.list_listings()? {
        if !query.matches(&listing) {
            continue;
        }
        if let Some((check_in, check_out)) = stay {
            let bookings = store.list_bookings_by_listing(&listing.id, &BookingStatus::BLOCKING)?;
            if overlaps(&blocked_dates(&bookings), check_in, check_out) {
                continue;
            }
        }
        matching.push(listing);
    }

    let pagination = Pagination::new(query.page, query.limit, matching.len());
    Ok(SearchResults {
        listings: pagination.slice(matching),
        pagination,
    })
}
