//! Additive, idempotent schema migration for the offers table.
//!
//! SQLite has no `ADD COLUMN IF NOT EXISTS`, so extended columns are checked
//! against `pragma_table_info` before being added. Re-running the migration
//! against any schema version is a no-op and never touches existing rows.

use sqlx::SqlitePool;

use crate::DbError;

/// Base schema. Extended columns are deliberately absent here; they arrived
/// after the initial deployment and are added by [`ensure_column`] so that
/// databases created by either schema generation converge.
const CREATE_OFFERS: &str = "CREATE TABLE IF NOT EXISTS offers ( \
     id TEXT PRIMARY KEY, \
     retailer TEXT NOT NULL, \
     title TEXT NOT NULL, \
     price TEXT NOT NULL, \
     unit TEXT, \
     valid_from TEXT NOT NULL, \
     valid_to TEXT NOT NULL, \
     image_url TEXT NOT NULL DEFAULT '', \
     updated_at TEXT NOT NULL, \
     week_key TEXT NOT NULL, \
     brand TEXT \
 )";

const EXTENDED_COLUMNS: &[(&str, &str)] = &[
    ("original_price", "TEXT"),
    ("discount_percent", "TEXT"),
    ("category", "TEXT"),
    ("page", "INTEGER"),
    ("metadata", "TEXT"),
];

/// Bring the schema up to date: base table, extended columns, and the two
/// query indices (`week_key` alone and `(retailer, week_key)` composite).
///
/// Safe to run on every startup.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any statement fails.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), DbError> {
    sqlx::query(CREATE_OFFERS).execute(pool).await?;

    for (column, sql_type) in EXTENDED_COLUMNS {
        ensure_column(pool, "offers", column, sql_type).await?;
    }

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_offers_week_key ON offers (week_key)")
        .execute(pool)
        .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_offers_retailer_week_key ON offers (retailer, week_key)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Adds `column` to `table` unless it already exists. Existing rows get
/// `NULL` for the new column; nothing is dropped or rewritten.
async fn ensure_column(
    pool: &SqlitePool,
    table: &str,
    column: &str,
    sql_type: &str,
) -> Result<(), DbError> {
    let exists: Option<(i64,)> =
        sqlx::query_as("SELECT 1 FROM pragma_table_info(?1) WHERE name = ?2")
            .bind(table)
            .bind(column)
            .fetch_optional(pool)
            .await?;

    if exists.is_none() {
        sqlx::query(&format!("ALTER TABLE {table} ADD COLUMN {column} {sql_type}"))
            .execute(pool)
            .await?;
    }

    Ok(())
}
