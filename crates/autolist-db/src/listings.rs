//! Database operations for the `listings` table.

use autolist_core::Listing;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::DbError;

/// A row from the `listings` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ListingRow {
    pub id: i64,
    pub identity_url: String,
    pub source_id: String,
    pub title: Option<String>,
    pub price_display: Option<String>,
    pub city: Option<String>,
    pub mileage_km: Option<i64>,
    pub image_url: Option<String>,
    pub year: Option<i32>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub first_seen_at: DateTime<Utc>,
}

impl From<ListingRow> for Listing {
    fn from(row: ListingRow) -> Self {
        Listing {
            identity_url: Some(row.identity_url),
            title: row.title,
            price_display: row.price_display,
            city: row.city,
            mileage_km: row.mileage_km,
            image_url: row.image_url,
            year: row.year,
            make: row.make,
            model: row.model,
        }
    }
}

/// Result of [`insert_listing_if_absent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    AlreadyExists,
}

const SELECT_COLUMNS: &str = "id, identity_url, source_id, title, price_display, city, \
                              mileage_km, image_url, year, make, model, first_seen_at";

/// Inserts `listing` unless a row with the same `identity_url` exists.
///
/// The existence check is the table's unique constraint (`ON CONFLICT DO
/// NOTHING`), not a prior read, so two writers racing on the same URL in this
/// process or another still leave exactly one row. A skipped insert is
/// reported as [`InsertOutcome::AlreadyExists`]; the first-seen copy is never
/// updated.
///
/// # Errors
///
/// Returns [`DbError::MissingIdentity`] if the listing has no `identity_url`,
/// or [`DbError::Sqlx`] if the query fails.
pub async fn insert_listing_if_absent(
    pool: &SqlitePool,
    source_id: &str,
    listing: &Listing,
) -> Result<InsertOutcome, DbError> {
    let identity_url = listing
        .identity_url
        .as_deref()
        .filter(|u| !u.is_empty())
        .ok_or(DbError::MissingIdentity)?;

    let result = sqlx::query(
        "INSERT INTO listings \
             (identity_url, source_id, title, price_display, city, mileage_km, \
              image_url, year, make, model, first_seen_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
         ON CONFLICT (identity_url) DO NOTHING",
    )
    .bind(identity_url)
    .bind(source_id)
    .bind(listing.title.as_deref())
    .bind(listing.price_display.as_deref())
    .bind(listing.city.as_deref())
    .bind(listing.mileage_km)
    .bind(listing.image_url.as_deref())
    .bind(listing.year)
    .bind(listing.make.as_deref())
    .bind(listing.model.as_deref())
    .bind(Utc::now())
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        tracing::debug!(identity_url, "listing already stored");
        Ok(InsertOutcome::AlreadyExists)
    } else {
        Ok(InsertOutcome::Inserted)
    }
}

/// Fetches a listing by its identity URL.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_listing_by_url(
    pool: &SqlitePool,
    identity_url: &str,
) -> Result<Option<ListingRow>, DbError> {
    let row = sqlx::query_as::<_, ListingRow>(&format!(
        "SELECT {SELECT_COLUMNS} FROM listings WHERE identity_url = ?"
    ))
    .bind(identity_url)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Most recently first-seen listings, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_listings(pool: &SqlitePool, limit: i64) -> Result<Vec<ListingRow>, DbError> {
    let rows = sqlx::query_as::<_, ListingRow>(&format!(
        "SELECT {SELECT_COLUMNS} FROM listings ORDER BY first_seen_at DESC, id DESC LIMIT ?"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Total number of stored listings.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_listings(pool: &SqlitePool) -> Result<i64, DbError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM listings")
        .fetch_one(pool)
        .await?;
    Ok(count)
}
