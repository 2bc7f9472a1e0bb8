use chrono::{NaiveDate, Utc};
use tempfile::NamedTempFile;

use crate::id::new_id;
use crate::model::{
    Booking, BookingStatus, Category, Listing, ListingStatus, PaymentStatus, Role, User,
    UserStatus,
};
use crate::store::Store;

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

/// A store backed by a temp file; keep the file alive for the test's duration
pub fn temp_store() -> (Store, NamedTempFile) {
    let tmp = NamedTempFile::new().unwrap();
    let store = Store::open(tmp.path().to_str().unwrap()).unwrap();
    (store, tmp)
}

pub fn sample_user(username: &str) -> User {
    User {
        id: new_id("usr"),
        username: username.to_string(),
        email: format!("{}@example.com", username.to_lowercase()),
        first_name: None,
        last_name: None,
        bio: None,
        role: Role::Guest,
        status: UserStatus::Active,
        favorites: vec![],
        created_at: Utc::now(),
    }
}

pub fn sample_listing(owner_id: &str, price: f64) -> Listing {
    let now = Utc::now();
    Listing {
        id: new_id("lst"),
        title: "Cliffside Cabin".to_string(),
        description: "Quiet cabin above the bay".to_string(),
        price,
        currency: "USD".to_string(),
        location: "Big Sur".to_string(),
        country: "United States".to_string(),
        max_guests: 4,
        bedrooms: 2,
        bathrooms: 1,
        category: Category::Cabin,
        amenities: vec!["wifi".to_string(), "fireplace".to_string()],
        image_url: None,
        owner_id: owner_id.to_string(),
        review_ids: vec![],
        average_rating: None,
        status: ListingStatus::Active,
        favorite_count: 0,
        view_count: 0,
        weekly_discount: None,
        monthly_discount: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn sample_booking(check_in: &str, check_out: &str, status: BookingStatus) -> Booking {
    let mut booking = booking_for("lst_sample", check_in, check_out);
    booking.status = status;
    booking
}

/// A pending booking at 100/night for a fresh guest
pub fn booking_for(listing_id: &str, check_in: &str, check_out: &str) -> Booking {
    let now = Utc::now();
    let (check_in, check_out) = (date(check_in), date(check_out));
    let nights = (check_out - check_in).num_days();
    Booking {
        id: new_id("bk"),
        listing_id: listing_id.to_string(),
        guest_id: new_id("usr"),
        check_in,
        check_out,
        guests: 2,
        nights,
        total_price: nights as f64 * 100.0,
        currency: "USD".to_string(),
        status: BookingStatus::Pending,
        phone: None,
        message: None,
        payment_status: PaymentStatus::Unpaid,
        payment_reference: None,
        cancellation: None,
        created_at: now,
        updated_at: now,
    }
}
