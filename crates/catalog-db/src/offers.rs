//! Database operations for the append-only `offers` table.
//!
//! Rows are never updated or deleted. The "current" offer for an external
//! offer id is the row with the latest `created_at`, ties broken by row id.

use catalog_core::{OfferSnapshot, TimeWindow};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `offers` table.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OfferRow {
    pub id: i64,
    pub product_id: Uuid,
    /// External offer id assigned by the offer provider.
    pub offer_id: Uuid,
    /// Smallest currency unit.
    pub price: i64,
    pub items_in_stock: i64,
    pub created_at: DateTime<Utc>,
}

impl OfferRow {
    #[must_use]
    pub fn into_snapshot(self) -> OfferSnapshot {
        OfferSnapshot {
            offer_id: self.offer_id,
            price: self.price,
            items_in_stock: self.items_in_stock,
            created_at: self.created_at,
        }
    }
}

/// Offer values to append; `created_at` is assigned by the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewOffer {
    pub offer_id: Uuid,
    pub price: i64,
    pub items_in_stock: i64,
}

/// Every snapshot of one external offer inside a time window, oldest first,
/// with the snapshot count.
#[derive(Debug, Clone)]
pub struct OfferHistory {
    pub snapshots: Vec<OfferSnapshot>,
    pub total: i64,
}

const OFFER_COLUMNS: &str = "id, product_id, offer_id, price, items_in_stock, created_at";

// ---------------------------------------------------------------------------
// Appends
// ---------------------------------------------------------------------------

pub(crate) async fn insert_offer_tx(
    tx: &mut Transaction<'_, Postgres>,
    product_id: Uuid,
    offer: &NewOffer,
) -> Result<OfferRow, DbError> {
    let row = sqlx::query_as::<_, OfferRow>(&format!(
        "INSERT INTO offers (product_id, offer_id, price, items_in_stock) \
         VALUES ($1, $2, $3, $4) \
         RETURNING {OFFER_COLUMNS}"
    ))
    .bind(product_id)
    .bind(offer.offer_id)
    .bind(offer.price)
    .bind(offer.items_in_stock)
    .fetch_one(&mut **tx)
    .await?;

    Ok(row)
}

/// Appends a single offer snapshot.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails, including when
/// `product_id` does not reference an existing product.
pub async fn append_offer(
    pool: &PgPool,
    product_id: Uuid,
    offer_id: Uuid,
    price: i64,
    items_in_stock: i64,
) -> Result<OfferRow, DbError> {
    let offer = NewOffer {
        offer_id,
        price,
        items_in_stock,
    };

    let mut tx = pool.begin().await?;
    let row = insert_offer_tx(&mut tx, product_id, &offer).await?;
    tx.commit().await?;

    Ok(row)
}

/// Appends a batch of snapshots for one product in a single transaction.
///
/// Returns the number of rows written.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any insert fails; nothing is committed.
pub async fn append_offers(
    pool: &PgPool,
    product_id: Uuid,
    offers: &[NewOffer],
) -> Result<u64, DbError> {
    if offers.is_empty() {
        return Ok(0);
    }

    let mut tx = pool.begin().await?;
    for offer in offers {
        insert_offer_tx(&mut tx, product_id, offer).await?;
    }
    tx.commit().await?;

    Ok(offers.len() as u64)
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// Latest snapshot per external offer id for one live product.
///
/// Empty when the product has no offers or is soft-deleted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_current_offers(
    pool: &PgPool,
    product_id: Uuid,
) -> Result<Vec<OfferRow>, DbError> {
    list_current_offers_for_products(pool, &[product_id]).await
}

/// Latest snapshot per external offer id across several live products.
///
/// Rows are ordered by `product_id`, then `offer_id`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_current_offers_for_products(
    pool: &PgPool,
    product_ids: &[Uuid],
) -> Result<Vec<OfferRow>, DbError> {
    if product_ids.is_empty() {
        return Ok(Vec::new());
    }

    let rows = sqlx::query_as::<_, OfferRow>(
        "SELECT DISTINCT ON (o.product_id, o.offer_id) \
                o.id, o.product_id, o.offer_id, o.price, o.items_in_stock, o.created_at \
         FROM offers o \
         JOIN products p ON p.id = o.product_id \
         WHERE o.product_id = ANY($1) \
           AND NOT p.is_deleted \
         ORDER BY o.product_id, o.offer_id, o.created_at DESC, o.id DESC",
    )
    .bind(product_ids)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// All snapshots of one external offer inside an inclusive time window,
/// oldest first, excluding rows whose product is soft-deleted.
///
/// # Errors
///
/// Returns [`DbError::InvalidRange`] when both bounds are set and `start`
/// is after `end`, or [`DbError::Sqlx`] if the query fails.
pub async fn offer_history(
    pool: &PgPool,
    offer_id: Uuid,
    window: TimeWindow,
) -> Result<OfferHistory, DbError> {
    if let Some((start, end)) = window.reversed_bounds() {
        return Err(DbError::InvalidRange { start, end });
    }

    let rows = sqlx::query_as::<_, OfferRow>(
        "SELECT o.id, o.product_id, o.offer_id, o.price, o.items_in_stock, o.created_at \
         FROM offers o \
         JOIN products p ON p.id = o.product_id \
         WHERE o.offer_id = $1 \
           AND NOT p.is_deleted \
           AND ($2::timestamptz IS NULL OR o.created_at >= $2) \
           AND ($3::timestamptz IS NULL OR o.created_at <= $3) \
         ORDER BY o.created_at ASC, o.id ASC",
    )
    .bind(offer_id)
    .bind(window.start)
    .bind(window.end)
    .fetch_all(pool)
    .await?;

    let snapshots: Vec<OfferSnapshot> = rows.into_iter().map(OfferRow::into_snapshot).collect();
    let total = i64::try_from(snapshots.len()).unwrap_or(i64::MAX);

    Ok(OfferHistory { snapshots, total })
}
