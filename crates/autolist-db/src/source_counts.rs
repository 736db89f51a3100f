//! Database operations for `source_counts`.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::DbError;

/// A row from the `source_counts` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SourceCountRow {
    pub source_id: String,
    pub total_count: i64,
    pub updated_at: DateTime<Utc>,
}

/// Overwrites the latest upstream total for `source_id`. Last write wins;
/// counts are never accumulated.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn record_source_count(
    pool: &SqlitePool,
    source_id: &str,
    total_count: i64,
) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO source_counts (source_id, total_count, updated_at) \
         VALUES (?, ?, ?) \
         ON CONFLICT (source_id) DO UPDATE SET \
             total_count = excluded.total_count, \
             updated_at  = excluded.updated_at",
    )
    .bind(source_id)
    .bind(total_count)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    Ok(())
}

/// Fetches the last recorded total for `source_id`, if any.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_source_count(
    pool: &SqlitePool,
    source_id: &str,
) -> Result<Option<SourceCountRow>, DbError> {
    let row = sqlx::query_as::<_, SourceCountRow>(
        "SELECT source_id, total_count, updated_at FROM source_counts WHERE source_id = ?",
    )
    .bind(source_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}
