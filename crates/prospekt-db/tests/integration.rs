//! Store integration tests against an in-memory SQLite database.
//!
//! Each test builds its own pool (single connection — `sqlite::memory:` is
//! per-connection) and runs the schema migration, so tests are fully
//! isolated from each other and from any on-disk state.

use chrono::{TimeZone, Utc};
use serde_json::{json, Map};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use prospekt_core::{Offer, Retailer};
use prospekt_db::{purge_week, query_offers, run_migrations, upsert_offers};

async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory pool");
    run_migrations(&pool).await.expect("migration");
    pool
}

fn offer(retailer: Retailer, week_key: &str, title: &str, price: &str) -> Offer {
    let valid_from = Utc.with_ymd_and_hms(2025, 11, 24, 0, 0, 0).unwrap();
    Offer {
        id: format!(
            "{}-{}-{}-0",
            retailer.prefix(),
            week_key,
            title.to_lowercase().replace(' ', "-")
        ),
        retailer,
        title: title.to_owned(),
        price: price.parse().unwrap(),
        unit: None,
        original_price: None,
        discount_percent: None,
        valid_from,
        valid_to: valid_from + chrono::Duration::days(6),
        image_url: String::new(),
        brand: None,
        category: None,
        page: None,
        week_key: week_key.to_owned(),
        updated_at: valid_from,
        metadata: Map::new(),
    }
}

#[tokio::test]
async fn upsert_then_query_roundtrips_all_fields() {
    let pool = test_pool().await;

    let mut original = offer(Retailer::Lidl, "2025-W48", "Bananen", "1.29");
    original.unit = Some("kg".to_owned());
    original.original_price = Some("1.99".parse().unwrap());
    original.discount_percent = Some("35".parse().unwrap());
    original.image_url = "https://cdn.example/bananen.jpg".to_owned();
    original.brand = Some("Chiquita".to_owned());
    original.category = Some("Obst".to_owned());
    original.page = Some(2);
    original
        .metadata
        .insert("source_strategy".to_owned(), json!("leaflet"));

    upsert_offers(&pool, Retailer::Lidl, "2025-W48", &[original.clone()])
        .await
        .unwrap();

    let stored = query_offers(&pool, Some(Retailer::Lidl), Some("2025-W48"))
        .await
        .unwrap();

    assert_eq!(stored.len(), 1);
    let stored = &stored[0];
    assert_eq!(stored.id, original.id);
    assert_eq!(stored.retailer, Retailer::Lidl);
    assert_eq!(stored.title, "Bananen");
    assert_eq!(stored.price, original.price);
    assert_eq!(stored.unit.as_deref(), Some("kg"));
    assert_eq!(stored.original_price, original.original_price);
    assert_eq!(stored.discount_percent, original.discount_percent);
    assert_eq!(stored.valid_from, original.valid_from);
    assert_eq!(stored.valid_to, original.valid_to);
    assert_eq!(stored.image_url, original.image_url);
    assert_eq!(stored.brand.as_deref(), Some("Chiquita"));
    assert_eq!(stored.category.as_deref(), Some("Obst"));
    assert_eq!(stored.page, Some(2));
    assert_eq!(stored.week_key, "2025-W48");
    assert_eq!(stored.metadata.get("source_strategy"), Some(&json!("leaflet")));
}

#[tokio::test]
async fn upsert_is_idempotent() {
    let pool = test_pool().await;
    let offers = vec![
        offer(Retailer::Aldi, "2025-W48", "Milch 1L", "0.99"),
        offer(Retailer::Aldi, "2025-W48", "Butter", "1.99"),
    ];

    upsert_offers(&pool, Retailer::Aldi, "2025-W48", &offers)
        .await
        .unwrap();
    upsert_offers(&pool, Retailer::Aldi, "2025-W48", &offers)
        .await
        .unwrap();

    let stored = query_offers(&pool, Some(Retailer::Aldi), Some("2025-W48"))
        .await
        .unwrap();
    assert_eq!(stored.len(), 2);

    let titles: Vec<_> = stored.iter().map(|o| o.title.as_str()).collect();
    assert_eq!(titles, vec!["Butter", "Milch 1L"]);
}

#[tokio::test]
async fn conflicting_id_replaces_all_columns() {
    let pool = test_pool().await;

    let mut first = offer(Retailer::Rewe, "2025-W48", "Kaffee", "4.99");
    first.unit = Some("500 g".to_owned());
    first.brand = Some("Jacobs".to_owned());
    upsert_offers(&pool, Retailer::Rewe, "2025-W48", &[first.clone()])
        .await
        .unwrap();

    // Same id, different payload, and the optional fields now absent.
    let mut replacement = offer(Retailer::Rewe, "2025-W48", "Kaffee", "5.49");
    replacement.id = first.id.clone();
    upsert_offers(&pool, Retailer::Rewe, "2025-W48", &[replacement])
        .await
        .unwrap();

    let stored = query_offers(&pool, Some(Retailer::Rewe), None).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].price, "5.49".parse().unwrap());
    // Full-row replacement, not a partial merge: cleared fields stay cleared.
    assert!(stored[0].unit.is_none());
    assert!(stored[0].brand.is_none());
}

#[tokio::test]
async fn last_writer_wins_within_one_batch() {
    let pool = test_pool().await;

    let first = offer(Retailer::Netto, "2025-W48", "Brot", "1.49");
    let mut second = offer(Retailer::Netto, "2025-W48", "Brot", "1.29");
    second.id = first.id.clone();

    upsert_offers(&pool, Retailer::Netto, "2025-W48", &[first, second])
        .await
        .unwrap();

    let stored = query_offers(&pool, Some(Retailer::Netto), None).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].price, "1.29".parse().unwrap());
}

#[tokio::test]
async fn query_orders_by_retailer_then_title() {
    let pool = test_pool().await;

    upsert_offers(
        &pool,
        Retailer::Rewe,
        "2025-W48",
        &[offer(Retailer::Rewe, "2025-W48", "Apfel", "0.59")],
    )
    .await
    .unwrap();
    upsert_offers(
        &pool,
        Retailer::Aldi,
        "2025-W48",
        &[
            offer(Retailer::Aldi, "2025-W48", "Zwiebeln", "0.99"),
            offer(Retailer::Aldi, "2025-W48", "Birnen", "1.89"),
        ],
    )
    .await
    .unwrap();

    let stored = query_offers(&pool, None, Some("2025-W48")).await.unwrap();
    let keys: Vec<_> = stored
        .iter()
        .map(|o| (o.retailer.prefix(), o.title.as_str()))
        .collect();
    assert_eq!(
        keys,
        vec![
            ("aldi", "Birnen"),
            ("aldi", "Zwiebeln"),
            ("rewe", "Apfel"),
        ]
    );
}

#[tokio::test]
async fn filters_are_independently_omittable() {
    let pool = test_pool().await;

    upsert_offers(
        &pool,
        Retailer::Lidl,
        "2025-W48",
        &[offer(Retailer::Lidl, "2025-W48", "Bananen", "1.29")],
    )
    .await
    .unwrap();
    upsert_offers(
        &pool,
        Retailer::Lidl,
        "2025-W49",
        &[offer(Retailer::Lidl, "2025-W49", "Bananen", "1.19")],
    )
    .await
    .unwrap();
    upsert_offers(
        &pool,
        Retailer::Edeka,
        "2025-W48",
        &[offer(Retailer::Edeka, "2025-W48", "Bananen", "1.49")],
    )
    .await
    .unwrap();

    assert_eq!(query_offers(&pool, None, None).await.unwrap().len(), 3);
    assert_eq!(
        query_offers(&pool, Some(Retailer::Lidl), None)
            .await
            .unwrap()
            .len(),
        2
    );
    assert_eq!(
        query_offers(&pool, None, Some("2025-W48")).await.unwrap().len(),
        2
    );
    assert_eq!(
        query_offers(&pool, Some(Retailer::Lidl), Some("2025-W48"))
            .await
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn query_on_empty_store_returns_empty() {
    let pool = test_pool().await;
    assert!(query_offers(&pool, None, None).await.unwrap().is_empty());
}

#[tokio::test]
async fn migration_is_idempotent_and_preserves_rows() {
    let pool = test_pool().await;

    upsert_offers(
        &pool,
        Retailer::Edeka,
        "2025-W48",
        &[offer(Retailer::Edeka, "2025-W48", "Milch 1L", "0.99")],
    )
    .await
    .unwrap();

    // Second run must be a no-op: no errors, no lost rows.
    run_migrations(&pool).await.unwrap();
    run_migrations(&pool).await.unwrap();

    let stored = query_offers(&pool, Some(Retailer::Edeka), None).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].title, "Milch 1L");
}

#[tokio::test]
async fn migration_adds_extended_columns_to_legacy_schema() {
    // A database created before the extended columns existed.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    sqlx::query(
        "CREATE TABLE offers ( \
             id TEXT PRIMARY KEY, retailer TEXT NOT NULL, title TEXT NOT NULL, \
             price TEXT NOT NULL, unit TEXT, valid_from TEXT NOT NULL, \
             valid_to TEXT NOT NULL, image_url TEXT NOT NULL DEFAULT '', \
             updated_at TEXT NOT NULL, week_key TEXT NOT NULL, brand TEXT)",
    )
    .execute(&pool)
    .await
    .unwrap();
    sqlx::query(
        "INSERT INTO offers (id, retailer, title, price, valid_from, valid_to, updated_at, week_key) \
         VALUES ('edeka-2025-W40-brot-0', 'edeka', 'Brot', '1.49', \
                 '2025-09-29T00:00:00Z', '2025-10-05T00:00:00Z', \
                 '2025-09-29T06:00:00Z', '2025-W40')",
    )
    .execute(&pool)
    .await
    .unwrap();

    run_migrations(&pool).await.unwrap();

    let stored = query_offers(&pool, Some(Retailer::Edeka), Some("2025-W40"))
        .await
        .unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].title, "Brot");
    assert!(stored[0].original_price.is_none());
    assert!(stored[0].metadata.is_empty());
}

#[tokio::test]
async fn purge_week_removes_only_that_week() {
    let pool = test_pool().await;

    upsert_offers(
        &pool,
        Retailer::Lidl,
        "2025-W47",
        &[offer(Retailer::Lidl, "2025-W47", "Bananen", "1.39")],
    )
    .await
    .unwrap();
    upsert_offers(
        &pool,
        Retailer::Lidl,
        "2025-W48",
        &[offer(Retailer::Lidl, "2025-W48", "Bananen", "1.29")],
    )
    .await
    .unwrap();

    let deleted = purge_week(&pool, "2025-W47").await.unwrap();
    assert_eq!(deleted, 1);

    let remaining = query_offers(&pool, None, None).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].week_key, "2025-W48");
}

#[tokio::test]
async fn updated_at_is_stamped_on_every_write() {
    let pool = test_pool().await;
    let original = offer(Retailer::Aldi, "2025-W48", "Milch 1L", "0.99");
    let before = Utc::now();

    upsert_offers(&pool, Retailer::Aldi, "2025-W48", &[original.clone()])
        .await
        .unwrap();

    let stored = query_offers(&pool, Some(Retailer::Aldi), None).await.unwrap();
    // The normalizer's timestamp is replaced by the write time.
    assert!(stored[0].updated_at >= before);
    assert!(stored[0].updated_at > original.updated_at);
}
