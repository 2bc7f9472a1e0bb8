//! Data models for the rental service
//!
//! Stored records (listings, bookings, reviews, users, contact messages),
//! their status enums, and the request payloads accepted by the API.
//! Everything crosses the wire in camelCase.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Property type a listing is filed under
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    Apartment,
    House,
    Villa,
    Cabin,
    Hotel,
    Resort,
    Other,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    #[default]
    Active,
    Inactive,
}

/// A bookable property record
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: String,
    pub title: String,
    pub description: String,

    /// Nightly price in `currency`
    pub price: f64,
    pub currency: String,

    pub location: String,
    pub country: String,

    pub max_guests: u32,
    pub bedrooms: u32,
    pub bathrooms: u32,

    pub category: Category,
    #[serde(default)]
    pub amenities: Vec<String>,
    pub image_url: Option<String>,

    /// User who created the listing
    pub owner_id: String,

    #[serde(default)]
    pub review_ids: Vec<String>,
    pub average_rating: Option<f64>,

    #[serde(default)]
    pub status: ListingStatus,
    #[serde(default)]
    pub favorite_count: u64,
    #[serde(default)]
    pub view_count: u64,

    /// Percent off for stays of 7+ nights. Stored only, never priced in.
    pub weekly_discount: Option<f64>,
    /// Percent off for stays of 28+ nights. Stored only, never priced in.
    pub monthly_discount: Option<f64>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl BookingStatus {
    /// Statuses whose nights are unavailable to other guests
    pub const BLOCKING: [BookingStatus; 2] = [BookingStatus::Pending, BookingStatus::Confirmed];

    pub fn blocks_dates(self) -> bool {
        Self::BLOCKING.contains(&self)
    }

    pub fn can_transition_to(self, next: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed) | (Confirmed, Completed) | (Pending, Cancelled) | (Confirmed, Cancelled)
        )
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Unpaid,
    Paid,
    Refunded,
}

/// Who cancelled a booking, when, and what they got back
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Cancellation {
    pub cancelled_by: String,
    pub cancelled_at: DateTime<Utc>,
    pub reason: String,
    pub refund_amount: f64,
    pub refund_reference: Option<String>,
}

/// A guest's reservation against a listing
///
/// `check_in`/`check_out` never change after creation; the stay covers
/// the nights `[check_in, check_out)`.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: String,
    pub listing_id: String,
    pub guest_id: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub guests: u32,
    pub nights: i64,
    pub total_price: f64,
    pub currency: String,
    pub status: BookingStatus,
    pub phone: Option<String>,
    pub message: Option<String>,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    pub payment_reference: Option<String>,
    pub cancellation: Option<Cancellation>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: String,
    pub listing_id: String,
    pub author_id: String,
    pub author_name: String,
    pub rating: u8,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Guest,
    Host,
    Admin,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    #[default]
    Active,
    Suspended,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub status: UserStatus,
    #[serde(default)]
    pub favorites: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Name shown next to the user's reviews
    pub fn display_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(first), None) => first.clone(),
            _ => self.username.clone(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ContactMessage {
    pub id: String,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub user_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Listing fields accepted on create and update
#[derive(Deserialize, Validate, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ListingInput {
    #[validate(length(min = 3, max = 100, message = "Title must be between 3 and 100 characters"))]
    pub title: String,

    #[validate(length(min = 10, max = 2000, message = "Description must be between 10 and 2000 characters"))]
    pub description: String,

    #[validate(range(min = 0.01, max = 1_000_000.0, message = "Price must be between 0.01 and 1,000,000"))]
    pub price: f64,

    pub currency: Option<String>,

    #[validate(length(min = 2, max = 100, message = "Location must be between 2 and 100 characters"))]
    pub location: String,

    #[validate(length(min = 2, max = 60, message = "Country must be between 2 and 60 characters"))]
    pub country: String,

    #[validate(range(min = 1, max = 20, message = "Max guests must be between 1 and 20"))]
    pub max_guests: Option<u32>,

    #[validate(range(max = 10, message = "Bedrooms cannot exceed 10"))]
    pub bedrooms: Option<u32>,

    #[validate(range(max = 10, message = "Bathrooms cannot exceed 10"))]
    pub bathrooms: Option<u32>,

    pub category: Option<Category>,
    pub amenities: Option<Vec<String>>,
    pub image_url: Option<String>,

    #[validate(range(min = 0.0, max = 100.0, message = "Weekly discount must be a percentage"))]
    pub weekly_discount: Option<f64>,

    #[validate(range(min = 0.0, max = 100.0, message = "Monthly discount must be a percentage"))]
    pub monthly_discount: Option<f64>,
}

impl ListingInput {
    /// Trims free-text fields in place before validation
    pub fn normalize(&mut self) {
        for field in [
            &mut self.title,
            &mut self.description,
            &mut self.location,
            &mut self.country,
        ] {
            *field = field.trim().to_string();
        }
        self.image_url = self
            .image_url
            .take()
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());
        if let Some(amenities) = self.amenities.as_mut() {
            amenities.retain(|a| !a.trim().is_empty());
        }
    }
}

/// Body of `POST /listings/{id}/book`
///
/// Dates arrive as raw strings so malformed values surface as validation
/// errors rather than extractor rejections.
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub check_in: String,
    pub check_out: String,
    pub guests: u32,
    pub phone: Option<String>,
    pub message: Option<String>,
}

#[derive(Deserialize, Validate, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ReviewInput {
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: u8,

    #[validate(length(min = 5, max = 500, message = "Comment must be between 5 and 500 characters"))]
    pub comment: String,
}

#[derive(Deserialize, Validate, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 30, message = "Username must be between 3 and 30 characters"))]
    pub username: String,

    #[validate(email(message = "Email must be a valid address"))]
    pub email: String,

    pub first_name: Option<String>,
    pub last_name: Option<String>,

    #[validate(length(max = 500, message = "Bio cannot exceed 500 characters"))]
    pub bio: Option<String>,
}

#[derive(Deserialize, Validate, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ContactRequest {
    #[validate(length(min = 2, max = 100, message = "Name must be between 2 and 100 characters"))]
    pub name: String,

    #[validate(email(message = "Email must be a valid address"))]
    pub email: String,

    #[validate(length(min = 3, max = 200, message = "Subject must be between 3 and 200 characters"))]
    pub subject: String,

    #[validate(length(min = 10, max = 2000, message = "Message must be between 10 and 2000 characters"))]
    pub message: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub booking_id: String,
    pub payment_method: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RefundRequest {
    pub booking_id: String,
    #[serde(default)]
    pub reason: String,
}

#[derive(Deserialize, Debug)]
pub struct RoleRequest {
    pub role: Role,
}

/// Query parameters for paginated admin listings
#[derive(Deserialize, Debug, Default)]
pub struct PageParams {
    pub page: Option<usize>,
    pub limit: Option<usize>,
}
