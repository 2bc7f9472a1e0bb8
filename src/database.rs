//! Database initialization and table definitions
//!
//! Records are stored as JSON strings keyed by their identifier. Secondary
//! indexes use composite `"{owner}:{id}"` keys so that a range scan over
//! `"{owner}:"..="{owner}:{"` returns everything belonging to one owner.

use redb::{Database, TableDefinition};

/// Listings by id
///
/// - Key: `"lst_Ab12Cd34Ef"`
/// - Value: JSON-serialized `Listing`
pub const TABLE_LISTINGS: TableDefinition<&str, &str> = TableDefinition::new("listings_v1");

/// Bookings by id
pub const TABLE_BOOKINGS: TableDefinition<&str, &str> = TableDefinition::new("bookings_v1");

/// Index of bookings per listing
///
/// - Key: `"{listing_id}:{booking_id}"`
/// - Value: booking id
pub const TABLE_BOOKINGS_BY_LISTING: TableDefinition<&str, &str> =
    TableDefinition::new("bookings_by_listing_v1");

/// Index of bookings per guest
///
/// - Key: `"{guest_id}:{booking_id}"`
/// - Value: booking id
pub const TABLE_BOOKINGS_BY_GUEST: TableDefinition<&str, &str> =
    TableDefinition::new("bookings_by_guest_v1");

/// Night claims held by pending and confirmed bookings
///
/// - Key: `"{listing_id}:{YYYY-MM-DD}"`
/// - Value: id of the booking holding that night
///
/// A night can be claimed by one booking only. Claims are written in the
/// same transaction as the booking and released when it stops blocking.
pub const TABLE_NIGHTS: TableDefinition<&str, &str> = TableDefinition::new("nights_v1");

/// Reviews by id
pub const TABLE_REVIEWS: TableDefinition<&str, &str> = TableDefinition::new("reviews_v1");

/// Users by id
pub const TABLE_USERS: TableDefinition<&str, &str> = TableDefinition::new("users_v1");

/// Contact messages
///
/// - Key: `"{created_at_micros}:{message_id}"` so iteration is chronological
pub const TABLE_MESSAGES: TableDefinition<&str, &str> = TableDefinition::new("messages_v1");

/// Builds the inclusive-exclusive bounds for all index keys under `owner`.
pub fn prefix_range(owner: &str) -> (String, String) {
    // '{' sorts right after every character used in ids and dates
    (format!("{owner}:"), format!("{owner}:{{"))
}

/// Initializes the embedded database and creates every table
pub fn init_db(db_path: &str) -> Result<Database, redb::Error> {
    let db = Database::create(db_path)?;

    let write_txn = db.begin_write()?;
    {
        write_txn.open_table(TABLE_LISTINGS)?;
        write_txn.open_table(TABLE_BOOKINGS)?;
        write_txn.open_table(TABLE_BOOKINGS_BY_LISTING)?;
        write_txn.open_table(TABLE_BOOKINGS_BY_GUEST)?;
        write_txn.open_table(TABLE_NIGHTS)?;
        write_txn.open_table(TABLE_REVIEWS)?;
        write_txn.open_table(TABLE_USERS)?;
        write_txn.open_table(TABLE_MESSAGES)?;
    }
    write_txn.commit()?;

    tracing::debug!("Database ready at {}", db_path);
    Ok(db)
}
