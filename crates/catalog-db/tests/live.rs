//! Live integration tests for catalog-db using `#[sqlx::test]`.
//!
//! Each test gets a fresh, fully-migrated Postgres database spun up by the
//! sqlx test harness. The `migrations` path is relative to the crate root
//! (`crates/catalog-db/`), so `"../../migrations"` resolves to the workspace
//! migration directory.

use catalog_core::TimeWindow;
use catalog_db::{
    append_offer, append_offers, create_product_with_offers, get_offer_history, get_offer_trend,
    get_product, list_active_product_ids, list_current_offers, list_current_offers_for_products,
    list_products, offer_history, soft_delete_product, update_product, DbError, HistoryError,
    NewOffer,
};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn insert_test_product(pool: &sqlx::PgPool, name: &str) -> Uuid {
    let id = Uuid::new_v4();
    create_product_with_offers(pool, id, name, "a test product", &[])
        .await
        .unwrap_or_else(|e| panic!("insert_test_product failed for '{name}': {e}"));
    id
}

/// Insert a snapshot with an explicit creation time.
async fn insert_offer_at(
    pool: &sqlx::PgPool,
    product_id: Uuid,
    offer_id: Uuid,
    price: i64,
    created_at: DateTime<Utc>,
) {
    sqlx::query(
        "INSERT INTO offers (product_id, offer_id, price, items_in_stock, created_at) \
         VALUES ($1, $2, $3, 10, $4)",
    )
    .bind(product_id)
    .bind(offer_id)
    .bind(price)
    .bind(created_at)
    .execute(pool)
    .await
    .expect("insert_offer_at failed");
}

fn base_time() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(1_767_225_600, 0).expect("valid timestamp")
}

// ---------------------------------------------------------------------------
// Section 1: Product Store
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn create_product_persists_initial_offers(pool: sqlx::PgPool) {
    let id = Uuid::new_v4();
    let offers = [
        NewOffer {
            offer_id: Uuid::new_v4(),
            price: 1000,
            items_in_stock: 3,
        },
        NewOffer {
            offer_id: Uuid::new_v4(),
            price: 1200,
            items_in_stock: 0,
        },
    ];

    let (product, inserted) = create_product_with_offers(&pool, id, "Kettle", "Boils water", &offers)
        .await
        .expect("create_product_with_offers failed");

    assert_eq!(product.id, id);
    assert_eq!(product.name, "Kettle");
    assert!(!product.is_deleted);
    assert_eq!(inserted.len(), 2);
    assert!(inserted.iter().all(|o| o.product_id == id));

    let current = list_current_offers(&pool, id)
        .await
        .expect("list_current_offers failed");
    assert_eq!(current.len(), 2);
}

#[sqlx::test(migrations = "../../migrations")]
async fn update_product_replaces_fields(pool: sqlx::PgPool) {
    let id = insert_test_product(&pool, "Old name").await;

    let updated = update_product(&pool, id, "New name", "New description")
        .await
        .expect("update_product failed")
        .expect("product should exist");

    assert_eq!(updated.name, "New name");
    assert_eq!(updated.description, "New description");
    assert!(updated.updated_at >= updated.created_at);
}

#[sqlx::test(migrations = "../../migrations")]
async fn update_missing_product_returns_none(pool: sqlx::PgPool) {
    let result = update_product(&pool, Uuid::new_v4(), "x", "y")
        .await
        .expect("update_product failed");
    assert!(result.is_none());
}

#[sqlx::test(migrations = "../../migrations")]
async fn soft_deleted_product_is_hidden_but_offers_remain(pool: sqlx::PgPool) {
    let kept = insert_test_product(&pool, "Kept").await;
    let gone = insert_test_product(&pool, "Gone").await;
    let offer_id = Uuid::new_v4();
    append_offer(&pool, gone, offer_id, 500, 1)
        .await
        .expect("append_offer failed");

    let deleted = soft_delete_product(&pool, gone)
        .await
        .expect("soft_delete_product failed")
        .expect("product should exist");
    assert!(deleted.is_deleted);

    assert!(get_product(&pool, gone).await.expect("get_product failed").is_none());
    let listed: Vec<Uuid> = list_products(&pool)
        .await
        .expect("list_products failed")
        .into_iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(listed, vec![kept]);
    assert_eq!(
        list_active_product_ids(&pool).await.expect("ids failed"),
        vec![kept]
    );

    let stored: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM offers WHERE product_id = $1")
        .bind(gone)
        .fetch_one(&pool)
        .await
        .expect("count failed");
    assert_eq!(stored, 1, "offer rows must survive a soft delete");

    assert!(list_current_offers(&pool, gone)
        .await
        .expect("list_current_offers failed")
        .is_empty());
    let history = offer_history(&pool, offer_id, TimeWindow::unbounded())
        .await
        .expect("offer_history failed");
    assert_eq!(history.total, 0);
}

#[sqlx::test(migrations = "../../migrations")]
async fn deleting_twice_returns_none(pool: sqlx::PgPool) {
    let id = insert_test_product(&pool, "Once").await;
    assert!(soft_delete_product(&pool, id).await.unwrap().is_some());
    assert!(soft_delete_product(&pool, id).await.unwrap().is_none());
    assert!(update_product(&pool, id, "a", "b").await.unwrap().is_none());
}

// ---------------------------------------------------------------------------
// Section 2: Offer Store
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn current_offer_is_latest_snapshot(pool: sqlx::PgPool) {
    let product_id = insert_test_product(&pool, "Lamp").await;
    let offer_id = Uuid::new_v4();

    for price in [100, 110, 90, 95] {
        append_offer(&pool, product_id, offer_id, price, 5)
            .await
            .expect("append_offer failed");
    }

    let current = list_current_offers(&pool, product_id)
        .await
        .expect("list_current_offers failed");
    assert_eq!(current.len(), 1);
    assert_eq!(current[0].offer_id, offer_id);
    assert_eq!(current[0].price, 95);
}

#[sqlx::test(migrations = "../../migrations")]
async fn batch_append_keeps_one_current_row_per_offer(pool: sqlx::PgPool) {
    let product_id = insert_test_product(&pool, "Desk").await;
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();

    let first = [
        NewOffer { offer_id: a, price: 10, items_in_stock: 1 },
        NewOffer { offer_id: b, price: 20, items_in_stock: 2 },
    ];
    let second = [
        NewOffer { offer_id: a, price: 11, items_in_stock: 0 },
        NewOffer { offer_id: b, price: 19, items_in_stock: 3 },
    ];
    assert_eq!(append_offers(&pool, product_id, &first).await.unwrap(), 2);
    assert_eq!(append_offers(&pool, product_id, &second).await.unwrap(), 2);
    assert_eq!(append_offers(&pool, product_id, &[]).await.unwrap(), 0);

    let mut current = list_current_offers(&pool, product_id).await.unwrap();
    current.sort_by_key(|o| o.price);
    let prices: Vec<i64> = current.iter().map(|o| o.price).collect();
    assert_eq!(prices, vec![11, 19]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn current_offers_for_many_products(pool: sqlx::PgPool) {
    let p1 = insert_test_product(&pool, "One").await;
    let p2 = insert_test_product(&pool, "Two").await;
    append_offer(&pool, p1, Uuid::new_v4(), 1, 1).await.unwrap();
    append_offer(&pool, p2, Uuid::new_v4(), 2, 1).await.unwrap();

    let rows = list_current_offers_for_products(&pool, &[p1, p2]).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert!(list_current_offers_for_products(&pool, &[]).await.unwrap().is_empty());
}

#[sqlx::test(migrations = "../../migrations")]
async fn append_for_unknown_product_fails(pool: sqlx::PgPool) {
    let err = append_offer(&pool, Uuid::new_v4(), Uuid::new_v4(), 1, 1)
        .await
        .expect_err("foreign key should reject unknown product");
    assert!(matches!(err, DbError::Sqlx(_)));
}

#[sqlx::test(migrations = "../../migrations")]
async fn append_offer_returns_committed_row(pool: sqlx::PgPool) {
    let product_id = insert_test_product(&pool, "Single append").await;
    let offer_id = Uuid::new_v4();

    let row = append_offer(&pool, product_id, offer_id, 4_200, 3)
        .await
        .expect("append_offer failed");
    assert_eq!(row.product_id, product_id);
    assert_eq!(row.offer_id, offer_id);
    assert_eq!(row.price, 4_200);
    assert_eq!(row.items_in_stock, 3);

    let current = list_current_offers(&pool, product_id).await.unwrap();
    assert_eq!(current.len(), 1);
    assert_eq!(current[0].id, row.id);
}

#[sqlx::test(migrations = "../../migrations")]
async fn history_is_chronological_and_windowed(pool: sqlx::PgPool) {
    let product_id = insert_test_product(&pool, "Chair").await;
    let offer_id = Uuid::new_v4();
    let t0 = base_time();

    // Inserted out of order on purpose.
    insert_offer_at(&pool, product_id, offer_id, 300, t0 + Duration::hours(2)).await;
    insert_offer_at(&pool, product_id, offer_id, 100, t0).await;
    insert_offer_at(&pool, product_id, offer_id, 200, t0 + Duration::hours(1)).await;

    let all = offer_history(&pool, offer_id, TimeWindow::unbounded())
        .await
        .expect("offer_history failed");
    let prices: Vec<i64> = all.snapshots.iter().map(|s| s.price).collect();
    assert_eq!(prices, vec![100, 200, 300]);
    assert_eq!(all.total, 3);

    let window = TimeWindow::new(Some(t0 + Duration::hours(1)), Some(t0 + Duration::hours(2)));
    let bounded = offer_history(&pool, offer_id, window).await.unwrap();
    let prices: Vec<i64> = bounded.snapshots.iter().map(|s| s.price).collect();
    assert_eq!(prices, vec![200, 300], "bounds are inclusive");
}

#[sqlx::test(migrations = "../../migrations")]
async fn reversed_window_is_invalid_range(pool: sqlx::PgPool) {
    let t0 = base_time();
    let window = TimeWindow::new(Some(t0 + Duration::seconds(1)), Some(t0));

    let err = offer_history(&pool, Uuid::new_v4(), window)
        .await
        .expect_err("reversed window must fail");
    assert!(matches!(err, DbError::InvalidRange { .. }));
}

// ---------------------------------------------------------------------------
// Section 3: History & Trend
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn history_over_two_snapshots_is_one_page(pool: sqlx::PgPool) {
    let product_id = insert_test_product(&pool, "Mug").await;
    let offer_id = Uuid::new_v4();
    append_offer(&pool, product_id, offer_id, 100, 1).await.unwrap();
    append_offer(&pool, product_id, offer_id, 150, 1).await.unwrap();

    let page = get_offer_history(&pool, offer_id, TimeWindow::unbounded(), 0, 10)
        .await
        .expect("get_offer_history failed");

    assert_eq!(page.items.len(), 2);
    assert_eq!(page.paging.page(), 1);
    assert_eq!(page.paging.total_pages(), 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn empty_history_is_not_found(pool: sqlx::PgPool) {
    let offer_id = Uuid::new_v4();
    let err = get_offer_history(&pool, offer_id, TimeWindow::unbounded(), 0, 10)
        .await
        .expect_err("no snapshots should be NotFound");
    assert!(matches!(err, HistoryError::NotFound(id) if id == offer_id));

    let err = get_offer_trend(&pool, offer_id, TimeWindow::unbounded())
        .await
        .expect_err("no snapshots should be NotFound");
    assert!(matches!(err, HistoryError::NotFound(_)));
}

#[sqlx::test(migrations = "../../migrations")]
async fn trend_compares_first_and_last(pool: sqlx::PgPool) {
    let product_id = insert_test_product(&pool, "Pan").await;
    let rising = Uuid::new_v4();
    let falling = Uuid::new_v4();
    let t0 = base_time();

    insert_offer_at(&pool, product_id, rising, 100, t0).await;
    insert_offer_at(&pool, product_id, rising, 150, t0 + Duration::minutes(1)).await;
    insert_offer_at(&pool, product_id, falling, 200, t0).await;
    insert_offer_at(&pool, product_id, falling, 100, t0 + Duration::minutes(1)).await;

    let up = get_offer_trend(&pool, rising, TimeWindow::unbounded()).await.unwrap();
    assert_eq!(up.trend, Decimal::new(5000, 2));
    assert_eq!(up.start_price, 100);
    assert_eq!(up.end_price, 150);
    assert_eq!(up.history.len(), 2);

    let down = get_offer_trend(&pool, falling, TimeWindow::unbounded()).await.unwrap();
    assert_eq!(down.trend, Decimal::new(-5000, 2));
}

#[sqlx::test(migrations = "../../migrations")]
async fn trend_from_zero_price_is_division_undefined(pool: sqlx::PgPool) {
    let product_id = insert_test_product(&pool, "Freebie").await;
    let offer_id = Uuid::new_v4();
    append_offer(&pool, product_id, offer_id, 0, 1).await.unwrap();
    append_offer(&pool, product_id, offer_id, 100, 1).await.unwrap();

    let err = get_offer_trend(&pool, offer_id, TimeWindow::unbounded())
        .await
        .expect_err("zero first price must fail");
    assert!(matches!(
        err,
        HistoryError::Trend(catalog_core::TrendError::DivisionUndefined)
    ));
}

#[sqlx::test(migrations = "../../migrations")]
async fn trend_with_reversed_window_is_invalid_range(pool: sqlx::PgPool) {
    let t0 = base_time();
    let err = get_offer_trend(
        &pool,
        Uuid::new_v4(),
        TimeWindow::new(Some(t0), Some(t0 - Duration::days(1))),
    )
    .await
    .expect_err("reversed window must fail");
    assert!(matches!(err, HistoryError::InvalidRange { .. }));
}
