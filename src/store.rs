//! Record storage on top of redb
//!
//! `Store` is the only code that opens transactions. Each public method is
//! one transaction: multi-record changes (night claims, favorite counters,
//! review aggregates, owner promotion) either commit together or not at all.

use std::sync::Arc;

use chrono::Utc;
use redb::{
    Database, ReadTransaction, ReadableDatabase, ReadableTable, Table, TableDefinition,
    WriteTransaction,
};
use serde::{de::DeserializeOwned, Serialize};

use crate::availability::nights;
use crate::database::{
    init_db, prefix_range, TABLE_BOOKINGS, TABLE_BOOKINGS_BY_GUEST, TABLE_BOOKINGS_BY_LISTING,
    TABLE_LISTINGS, TABLE_MESSAGES, TABLE_NIGHTS, TABLE_REVIEWS, TABLE_USERS,
};
use crate::error::{AppError, AppResult};
use crate::model::{Booking, BookingStatus, ContactMessage, Listing, Review, Role, User};
use crate::pricing::round_cents;

type JsonTable = TableDefinition<'static, &'static str, &'static str>;

/// Shared handle to the embedded database
#[derive(Clone)]
pub struct Store {
    db: Arc<Database>,
}

fn get_json<T: DeserializeOwned>(
    table: &impl ReadableTable<&'static str, &'static str>,
    key: &str,
) -> AppResult<Option<T>> {
    match table.get(key)? {
        Some(guard) => Ok(Some(serde_json::from_str(guard.value())?)),
        None => Ok(None),
    }
}

fn put_json<T: Serialize>(
    table: &mut Table<'_, &'static str, &'static str>,
    key: &str,
    record: &T,
) -> AppResult<()> {
    let json = serde_json::to_string(record)?;
    table.insert(key, json.as_str())?;
    Ok(())
}

/// `(key, value)` pairs of an index under `owner`
fn index_entries(
    table: &impl ReadableTable<&'static str, &'static str>,
    owner: &str,
) -> AppResult<Vec<(String, String)>> {
    let (start, end) = prefix_range(owner);
    let mut entries = Vec::new();
    for entry in table.range(start.as_str()..end.as_str())? {
        let (key, value) = entry?;
        entries.push((key.value().to_string(), value.value().to_string()));
    }
    Ok(entries)
}

fn all_json<T: DeserializeOwned>(
    table: &impl ReadableTable<&'static str, &'static str>,
) -> AppResult<Vec<T>> {
    let mut records = Vec::new();
    for entry in table.iter()? {
        let (_, value) = entry?;
        records.push(serde_json::from_str(value.value())?);
    }
    Ok(records)
}

fn night_key(listing_id: &str, night: chrono::NaiveDate) -> String {
    format!("{}:{}", listing_id, night.format("%Y-%m-%d"))
}

fn index_key(owner: &str, id: &str) -> String {
    format!("{owner}:{id}")
}

/// Mean rating of the given reviews, rounded to two decimals
fn average_rating(
    reviews: &impl ReadableTable<&'static str, &'static str>,
    review_ids: &[String],
) -> AppResult<Option<f64>> {
    let mut sum = 0u32;
    let mut count = 0u32;
    for id in review_ids {
        if let Some(review) = get_json::<Review>(reviews, id)? {
            sum += u32::from(review.rating);
            count += 1;
        }
    }
    Ok((count > 0).then(|| round_cents(f64::from(sum) / f64::from(count))))
}

impl Store {
    pub fn new(db: Database) -> Self {
        Self { db: Arc::new(db) }
    }

    /// Opens (or creates) the database file and its tables
    pub fn open(path: &str) -> AppResult<Self> {
        Ok(Self::new(init_db(path)?))
    }

    fn read<R>(&self, f: impl FnOnce(&ReadTransaction) -> AppResult<R>) -> AppResult<R> {
        let read_txn = self.db.begin_read()?;
        f(&read_txn)
    }

    /// Runs `f` in a write transaction, committing on `Ok` and aborting on `Err`.
    fn write<R>(&self, f: impl FnOnce(&WriteTransaction) -> AppResult<R>) -> AppResult<R> {
        let write_txn = self.db.begin_write()?;
        match f(&write_txn) {
            Ok(result) => {
                write_txn.commit()?;
                Ok(result)
            }
            Err(err) => {
                write_txn.abort()?;
                Err(err)
            }
        }
    }

    fn get<T: DeserializeOwned>(&self, def: JsonTable, id: &str) -> AppResult<Option<T>> {
        self.read(|txn| get_json(&txn.open_table(def)?, id))
    }

    fn all<T: DeserializeOwned>(&self, def: JsonTable) -> AppResult<Vec<T>> {
        self.read(|txn| all_json(&txn.open_table(def)?))
    }

    // ---- users ----

    /// Inserts a new user; usernames and emails are unique (case-insensitive).
    pub fn create_user(&self, user: &User) -> AppResult<()> {
        self.write(|txn| {
            let mut users = txn.open_table(TABLE_USERS)?;
            for entry in users.iter()? {
                let (_, value) = entry?;
                let existing: User = serde_json::from_str(value.value())?;
                if existing.username.eq_ignore_ascii_case(&user.username) {
                    return Err(AppError::Conflict("Username is already taken".to_string()));
                }
                if existing.email.eq_ignore_ascii_case(&user.email) {
                    return Err(AppError::Conflict("Email is already registered".to_string()));
                }
            }
            put_json(&mut users, &user.id, user)
        })
    }

    pub fn get_user(&self, id: &str) -> AppResult<Option<User>> {
        self.get(TABLE_USERS, id)
    }

    pub fn list_users(&self) -> AppResult<Vec<User>> {
        let mut users: Vec<User> = self.all(TABLE_USERS)?;
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }

    pub fn update_user(
        &self,
        id: &str,
        f: impl FnOnce(&mut User) -> AppResult<()>,
    ) -> AppResult<User> {
        self.write(|txn| {
            let mut users = txn.open_table(TABLE_USERS)?;
            let mut user: User = get_json(&users, id)?.ok_or(AppError::NotFound("User"))?;
            f(&mut user)?;
            put_json(&mut users, id, &user)?;
            Ok(user)
        })
    }

    /// Adds or removes `listing_id` from the user's favorites and keeps the
    /// listing's counter in step. Returns the new state and count.
    pub fn toggle_favorite(&self, user_id: &str, listing_id: &str) -> AppResult<(bool, u64)> {
        self.write(|txn| {
            let mut listings = txn.open_table(TABLE_LISTINGS)?;
            let mut users = txn.open_table(TABLE_USERS)?;

            let mut listing: Listing =
                get_json(&listings, listing_id)?.ok_or(AppError::NotFound("Listing"))?;
            let mut user: User = get_json(&users, user_id)?.ok_or(AppError::NotFound("User"))?;

            let is_favorite = if let Some(pos) = user.favorites.iter().position(|f| f == listing_id) {
                user.favorites.remove(pos);
                listing.favorite_count = listing.favorite_count.saturating_sub(1);
                false
            } else {
                user.favorites.push(listing_id.to_string());
                listing.favorite_count += 1;
                true
            };

            put_json(&mut users, user_id, &user)?;
            put_json(&mut listings, listing_id, &listing)?;
            Ok((is_favorite, listing.favorite_count))
        })
    }

    // ---- listings ----

    /// Inserts a listing and promotes its owner from guest to host.
    pub fn create_listing(&self, listing: &Listing) -> AppResult<()> {
        self.write(|txn| {
            let mut users = txn.open_table(TABLE_USERS)?;
            let mut owner: User =
                get_json(&users, &listing.owner_id)?.ok_or(AppError::NotFound("User"))?;
            if owner.role == Role::Guest {
                owner.role = Role::Host;
                put_json(&mut users, &owner.id, &owner)?;
                tracing::info!("Promoted user {} to host", owner.id);
            }

            let mut listings = txn.open_table(TABLE_LISTINGS)?;
            put_json(&mut listings, &listing.id, listing)
        })
    }

    pub fn get_listing(&self, id: &str) -> AppResult<Option<Listing>> {
        self.get(TABLE_LISTINGS, id)
    }

    /// Every listing, newest first
    pub fn list_listings(&self) -> AppResult<Vec<Listing>> {
        let mut listings: Vec<Listing> = self.all(TABLE_LISTINGS)?;
        listings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(listings)
    }

    pub fn update_listing(
        &self,
        id: &str,
        f: impl FnOnce(&mut Listing) -> AppResult<()>,
    ) -> AppResult<Listing> {
        self.write(|txn| {
            let mut listings = txn.open_table(TABLE_LISTINGS)?;
            let mut listing: Listing =
                get_json(&listings, id)?.ok_or(AppError::NotFound("Listing"))?;
            f(&mut listing)?;
            put_json(&mut listings, id, &listing)?;
            Ok(listing)
        })
    }

    /// Hard-deletes a listing together with its reviews, its night claims
    /// and every favorite pointing at it. Bookings stay as history.
    pub fn delete_listing(&self, id: &str) -> AppResult<Listing> {
        self.write(|txn| {
            let mut listings = txn.open_table(TABLE_LISTINGS)?;
            let listing: Listing = get_json(&listings, id)?.ok_or(AppError::NotFound("Listing"))?;
            listings.remove(id)?;

            let mut reviews = txn.open_table(TABLE_REVIEWS)?;
            for review_id in &listing.review_ids {
                reviews.remove(review_id.as_str())?;
            }

            let mut claims = txn.open_table(TABLE_NIGHTS)?;
            for (key, _) in index_entries(&claims, id)? {
                claims.remove(key.as_str())?;
            }

            let mut users = txn.open_table(TABLE_USERS)?;
            let mut affected = Vec::new();
            for entry in users.iter()? {
                let (_, value) = entry?;
                let user: User = serde_json::from_str(value.value())?;
                if user.favorites.iter().any(|f| f == id) {
                    affected.push(user);
                }
            }
            for mut user in affected {
                user.favorites.retain(|f| f != id);
                put_json(&mut users, &user.id, &user)?;
            }

            Ok(listing)
        })
    }

    // ---- bookings ----

    /// Inserts a booking, claiming each of its nights.
    ///
    /// Fails with `Conflict` if any night is already held by another
    /// pending or confirmed booking; nothing is written in that case.
    pub fn create_booking(&self, booking: &Booking) -> AppResult<()> {
        self.write(|txn| {
            let mut claims = txn.open_table(TABLE_NIGHTS)?;
            for night in nights(booking.check_in, booking.check_out) {
                let key = night_key(&booking.listing_id, night);
                if claims.get(key.as_str())?.is_some() {
                    return Err(AppError::Conflict(format!(
                        "Listing is already booked on {}",
                        night.format("%Y-%m-%d")
                    )));
                }
                claims.insert(key.as_str(), booking.id.as_str())?;
            }

            let mut bookings = txn.open_table(TABLE_BOOKINGS)?;
            put_json(&mut bookings, &booking.id, booking)?;

            let mut by_listing = txn.open_table(TABLE_BOOKINGS_BY_LISTING)?;
            by_listing.insert(
                index_key(&booking.listing_id, &booking.id).as_str(),
                booking.id.as_str(),
            )?;

            let mut by_guest = txn.open_table(TABLE_BOOKINGS_BY_GUEST)?;
            by_guest.insert(
                index_key(&booking.guest_id, &booking.id).as_str(),
                booking.id.as_str(),
            )?;
            Ok(())
        })
    }

    pub fn get_booking(&self, id: &str) -> AppResult<Option<Booking>> {
        self.get(TABLE_BOOKINGS, id)
    }

    fn bookings_via_index(
        &self,
        index: JsonTable,
        owner: &str,
        statuses: &[BookingStatus],
    ) -> AppResult<Vec<Booking>> {
        let mut found = self.read(|txn| {
            let index = txn.open_table(index)?;
            let bookings = txn.open_table(TABLE_BOOKINGS)?;
            let mut found = Vec::new();
            for (_, booking_id) in index_entries(&index, owner)? {
                if let Some(booking) = get_json::<Booking>(&bookings, &booking_id)? {
                    if statuses.is_empty() || statuses.contains(&booking.status) {
                        found.push(booking);
                    }
                }
            }
            Ok(found)
        })?;
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }

    /// Bookings of a listing, newest first. An empty `statuses` slice
    /// matches every status.
    pub fn list_bookings_by_listing(
        &self,
        listing_id: &str,
        statuses: &[BookingStatus],
    ) -> AppResult<Vec<Booking>> {
        self.bookings_via_index(TABLE_BOOKINGS_BY_LISTING, listing_id, statuses)
    }

    pub fn list_bookings_by_guest(&self, guest_id: &str) -> AppResult<Vec<Booking>> {
        self.bookings_via_index(TABLE_BOOKINGS_BY_GUEST, guest_id, &[])
    }

    pub fn list_bookings(&self) -> AppResult<Vec<Booking>> {
        self.all(TABLE_BOOKINGS)
    }

    /// Applies `f` to a booking and persists it.
    ///
    /// Stay dates cannot change. When the booking stops blocking (cancelled
    /// or completed) its night claims are released in the same transaction.
    pub fn update_booking(
        &self,
        id: &str,
        f: impl FnOnce(&mut Booking) -> AppResult<()>,
    ) -> AppResult<Booking> {
        self.update_booking_if(id, |b| f(b).map(|()| true))
            .map(|(booking, _)| booking)
    }

    /// Like `update_booking`, but `f` may return `false` to leave the
    /// record untouched. The flag is passed back alongside the booking.
    pub fn update_booking_if(
        &self,
        id: &str,
        f: impl FnOnce(&mut Booking) -> AppResult<bool>,
    ) -> AppResult<(Booking, bool)> {
        self.write(|txn| {
            let mut bookings = txn.open_table(TABLE_BOOKINGS)?;
            let mut booking: Booking =
                get_json(&bookings, id)?.ok_or(AppError::NotFound("Booking"))?;
            let before = booking.clone();

            if !f(&mut booking)? {
                return Ok((before, false));
            }

            if booking.check_in != before.check_in || booking.check_out != before.check_out {
                return Err(AppError::Validation(
                    "Booking dates cannot be changed".to_string(),
                ));
            }
            booking.updated_at = Utc::now();
            put_json(&mut bookings, id, &booking)?;

            if before.status.blocks_dates() && !booking.status.blocks_dates() {
                let mut claims = txn.open_table(TABLE_NIGHTS)?;
                for night in nights(booking.check_in, booking.check_out) {
                    let key = night_key(&booking.listing_id, night);
                    let held_by_this = claims
                        .get(key.as_str())?
                        .is_some_and(|holder| holder.value() == booking.id);
                    if held_by_this {
                        claims.remove(key.as_str())?;
                    }
                }
            }
            Ok((booking, true))
        })
    }

    // ---- reviews ----

    /// Stores a review and refreshes the listing's review list and rating.
    pub fn create_review(&self, review: &Review) -> AppResult<Listing> {
        self.write(|txn| {
            let mut listings = txn.open_table(TABLE_LISTINGS)?;
            let mut listing: Listing =
                get_json(&listings, &review.listing_id)?.ok_or(AppError::NotFound("Listing"))?;

            let mut reviews = txn.open_table(TABLE_REVIEWS)?;
            put_json(&mut reviews, &review.id, review)?;

            listing.review_ids.push(review.id.clone());
            listing.average_rating = average_rating(&reviews, &listing.review_ids)?;
            put_json(&mut listings, &listing.id, &listing)?;
            Ok(listing)
        })
    }

    pub fn get_review(&self, id: &str) -> AppResult<Option<Review>> {
        self.get(TABLE_REVIEWS, id)
    }

    /// Reviews of a listing, newest first
    pub fn list_reviews_for_listing(&self, listing_id: &str) -> AppResult<Vec<Review>> {
        let mut found = self.read(|txn| {
            let listings = txn.open_table(TABLE_LISTINGS)?;
            let listing: Listing =
                get_json(&listings, listing_id)?.ok_or(AppError::NotFound("Listing"))?;
            let reviews = txn.open_table(TABLE_REVIEWS)?;
            let mut found = Vec::new();
            for id in &listing.review_ids {
                if let Some(review) = get_json::<Review>(&reviews, id)? {
                    found.push(review);
                }
            }
            Ok(found)
        })?;
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }

    pub fn delete_review(&self, listing_id: &str, review_id: &str) -> AppResult<Listing> {
        self.write(|txn| {
            let mut listings = txn.open_table(TABLE_LISTINGS)?;
            let mut listing: Listing =
                get_json(&listings, listing_id)?.ok_or(AppError::NotFound("Listing"))?;

            let mut reviews = txn.open_table(TABLE_REVIEWS)?;
            if reviews.remove(review_id)?.is_none() {
                return Err(AppError::NotFound("Review"));
            }

            listing.review_ids.retain(|id| id != review_id);
            listing.average_rating = average_rating(&reviews, &listing.review_ids)?;
            put_json(&mut listings, listing_id, &listing)?;
            Ok(listing)
        })
    }

    // ---- contact messages ----

    pub fn create_message(&self, message: &ContactMessage) -> AppResult<()> {
        self.write(|txn| {
            let mut messages = txn.open_table(TABLE_MESSAGES)?;
            let key = format!("{:020}:{}", message.created_at.timestamp_micros(), message.id);
            put_json(&mut messages, &key, message)
        })
    }

    /// Contact messages, newest first
    pub fn list_messages(&self) -> AppResult<Vec<ContactMessage>> {
        let mut messages: Vec<ContactMessage> = self.all(TABLE_MESSAGES)?;
        messages.reverse();
        Ok(messages)
    }
}
