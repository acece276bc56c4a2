//! Store operations for the `offers` table.
//!
//! Money columns are bound as canonical decimal strings and re-parsed with
//! `rust_decimal` on read; SQLite keeps them as TEXT, which preserves the
//! exact scale the normalizer produced. `metadata` is a JSON object column.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Map;
use sqlx::SqlitePool;

use prospekt_core::{Offer, Retailer};

use crate::DbError;

const SELECT_OFFERS: &str = "SELECT id, retailer, title, price, unit, original_price, \
     discount_percent, valid_from, valid_to, image_url, brand, category, page, week_key, \
     updated_at, metadata \
     FROM offers";

const ORDER_BY: &str = " ORDER BY retailer ASC, title ASC";

/// A row from the `offers` table, still in storage encoding.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OfferRow {
    pub id: String,
    pub retailer: String,
    pub title: String,
    pub price: String,
    pub unit: Option<String>,
    pub original_price: Option<String>,
    pub discount_percent: Option<String>,
    pub valid_from: DateTime<Utc>,
    pub valid_to: DateTime<Utc>,
    pub image_url: String,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub page: Option<i64>,
    pub week_key: String,
    pub updated_at: DateTime<Utc>,
    pub metadata: Option<String>,
}

impl TryFrom<OfferRow> for Offer {
    type Error = DbError;

    fn try_from(row: OfferRow) -> Result<Self, DbError> {
        let retailer: Retailer = row.retailer.parse().map_err(|_| DbError::Decode {
            id: row.id.clone(),
            column: "retailer",
            reason: format!("unknown retailer {:?}", row.retailer),
        })?;

        let price = parse_decimal(&row.id, "price", &row.price)?;
        let original_price = row
            .original_price
            .as_deref()
            .map(|s| parse_decimal(&row.id, "original_price", s))
            .transpose()?;
        let discount_percent = row
            .discount_percent
            .as_deref()
            .map(|s| parse_decimal(&row.id, "discount_percent", s))
            .transpose()?;

        let metadata: Map<String, serde_json::Value> = match row.metadata.as_deref() {
            Some(text) => serde_json::from_str(text).map_err(|e| DbError::Decode {
                id: row.id.clone(),
                column: "metadata",
                reason: e.to_string(),
            })?,
            None => Map::new(),
        };

        Ok(Offer {
            id: row.id,
            retailer,
            title: row.title,
            price,
            unit: row.unit,
            original_price,
            discount_percent,
            valid_from: row.valid_from,
            valid_to: row.valid_to,
            image_url: row.image_url,
            brand: row.brand,
            category: row.category,
            page: row.page,
            week_key: row.week_key,
            updated_at: row.updated_at,
            metadata,
        })
    }
}

fn parse_decimal(id: &str, column: &'static str, value: &str) -> Result<Decimal, DbError> {
    value.parse().map_err(|_| DbError::Decode {
        id: id.to_owned(),
        column,
        reason: format!("not a decimal: {value:?}"),
    })
}

/// Writes one retailer-week batch inside a single transaction.
///
/// A conflict on `id` replaces every column (last-writer-wins); `updated_at`
/// is stamped with the write time for all rows in the batch. The transaction
/// is all-or-nothing — any failure rolls the whole batch back and prior
/// state survives untouched.
///
/// Returns the number of offers written.
///
/// # Errors
///
/// Returns [`DbError`] if metadata cannot be encoded or any statement fails;
/// in both cases nothing has been committed.
pub async fn upsert_offers(
    pool: &SqlitePool,
    retailer: Retailer,
    week_key: &str,
    offers: &[Offer],
) -> Result<u64, DbError> {
    let mut tx = pool.begin().await?;
    let updated_at = Utc::now();
    let mut written = 0u64;

    for offer in offers {
        let metadata = serde_json::to_string(&offer.metadata).map_err(|e| {
            DbError::EncodeMetadata {
                id: offer.id.clone(),
                source: e,
            }
        })?;

        sqlx::query(
            "INSERT INTO offers \
                 (id, retailer, title, price, unit, original_price, discount_percent, \
                  valid_from, valid_to, image_url, brand, category, page, week_key, \
                  updated_at, metadata) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16) \
             ON CONFLICT(id) DO UPDATE SET \
                 retailer         = excluded.retailer, \
                 title            = excluded.title, \
                 price            = excluded.price, \
                 unit             = excluded.unit, \
                 original_price   = excluded.original_price, \
                 discount_percent = excluded.discount_percent, \
                 valid_from       = excluded.valid_from, \
                 valid_to         = excluded.valid_to, \
                 image_url        = excluded.image_url, \
                 brand            = excluded.brand, \
                 category         = excluded.category, \
                 page             = excluded.page, \
                 week_key         = excluded.week_key, \
                 updated_at       = excluded.updated_at, \
                 metadata         = excluded.metadata",
        )
        .bind(&offer.id)
        .bind(offer.retailer.prefix())
        .bind(&offer.title)
        .bind(offer.price.to_string())
        .bind(&offer.unit)
        .bind(offer.original_price.map(|d| d.to_string()))
        .bind(offer.discount_percent.map(|d| d.to_string()))
        .bind(offer.valid_from)
        .bind(offer.valid_to)
        .bind(&offer.image_url)
        .bind(&offer.brand)
        .bind(&offer.category)
        .bind(offer.page)
        .bind(&offer.week_key)
        .bind(updated_at)
        .bind(metadata)
        .execute(&mut *tx)
        .await?;

        written += 1;
    }

    tx.commit().await?;

    tracing::debug!(
        retailer = %retailer,
        week = %week_key,
        offers = written,
        "offer batch committed"
    );

    Ok(written)
}

/// Queries offers, optionally filtered by retailer and/or week key, ordered
/// by `(retailer ASC, title ASC)`. Both filters are independently omittable.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on query failure and [`DbError::Decode`] when a
/// stored row no longer parses into an [`Offer`].
pub async fn query_offers(
    pool: &SqlitePool,
    retailer: Option<Retailer>,
    week_key: Option<&str>,
) -> Result<Vec<Offer>, DbError> {
    let rows: Vec<OfferRow> = match (retailer, week_key) {
        (Some(retailer), Some(week_key)) => {
            sqlx::query_as(&format!(
                "{SELECT_OFFERS} WHERE retailer = ?1 AND week_key = ?2{ORDER_BY}"
            ))
            .bind(retailer.prefix())
            .bind(week_key)
            .fetch_all(pool)
            .await?
        }
        (Some(retailer), None) => {
            sqlx::query_as(&format!("{SELECT_OFFERS} WHERE retailer = ?1{ORDER_BY}"))
                .bind(retailer.prefix())
                .fetch_all(pool)
                .await?
        }
        (None, Some(week_key)) => {
            sqlx::query_as(&format!("{SELECT_OFFERS} WHERE week_key = ?1{ORDER_BY}"))
                .bind(week_key)
                .fetch_all(pool)
                .await?
        }
        (None, None) => {
            sqlx::query_as(&format!("{SELECT_OFFERS}{ORDER_BY}"))
                .fetch_all(pool)
                .await?
        }
    };

    rows.into_iter().map(Offer::try_from).collect()
}

/// Deletes every offer belonging to `week_key`. Offers are never removed
/// automatically; this is the explicit stale-week maintenance operation.
///
/// Returns the number of deleted rows.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn purge_week(pool: &SqlitePool, week_key: &str) -> Result<u64, DbError> {
    let deleted = sqlx::query("DELETE FROM offers WHERE week_key = ?1")
        .bind(week_key)
        .execute(pool)
        .await?
        .rows_affected();

    Ok(deleted)
}
