//! Database operations for `products`.
//!
//! Products are soft-deleted: every read filters on `NOT is_deleted`, and
//! their offer rows stay in place after deletion.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::offers::{insert_offer_tx, NewOffer, OfferRow};
use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `products` table.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProductRow {
    /// Generated by this service and shared with the offer provider at
    /// registration time.
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const PRODUCT_COLUMNS: &str = "id, name, description, is_deleted, created_at, updated_at";

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

/// Inserts a product together with its initial offer snapshots.
///
/// Runs in one transaction so a product is never visible without the offers
/// that were fetched for it at registration time.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any insert fails; nothing is committed.
pub async fn create_product_with_offers(
    pool: &PgPool,
    id: Uuid,
    name: &str,
    description: &str,
    offers: &[NewOffer],
) -> Result<(ProductRow, Vec<OfferRow>), DbError> {
    let mut tx = pool.begin().await?;

    let product = sqlx::query_as::<_, ProductRow>(&format!(
        "INSERT INTO products (id, name, description) \
         VALUES ($1, $2, $3) \
         RETURNING {PRODUCT_COLUMNS}"
    ))
    .bind(id)
    .bind(name)
    .bind(description)
    .fetch_one(&mut *tx)
    .await?;

    let mut inserted = Vec::with_capacity(offers.len());
    for offer in offers {
        inserted.push(insert_offer_tx(&mut tx, id, offer).await?);
    }

    tx.commit().await?;
    Ok((product, inserted))
}

/// Replaces the name and description of a live product.
///
/// Returns `None` if the product does not exist or is soft-deleted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn update_product(
    pool: &PgPool,
    id: Uuid,
    name: &str,
    description: &str,
) -> Result<Option<ProductRow>, DbError> {
    let row = sqlx::query_as::<_, ProductRow>(&format!(
        "UPDATE products \
         SET name = $2, description = $3, updated_at = NOW() \
         WHERE id = $1 AND NOT is_deleted \
         RETURNING {PRODUCT_COLUMNS}"
    ))
    .bind(id)
    .bind(name)
    .bind(description)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Flags a live product as deleted and returns the flagged row.
///
/// Returns `None` if the product does not exist or was already deleted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn soft_delete_product(pool: &PgPool, id: Uuid) -> Result<Option<ProductRow>, DbError> {
    let row = sqlx::query_as::<_, ProductRow>(&format!(
        "UPDATE products \
         SET is_deleted = TRUE, updated_at = NOW() \
         WHERE id = $1 AND NOT is_deleted \
         RETURNING {PRODUCT_COLUMNS}"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_product(pool: &PgPool, id: Uuid) -> Result<Option<ProductRow>, DbError> {
    let row = sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 AND NOT is_deleted"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Lists live products, oldest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_products(pool: &PgPool) -> Result<Vec<ProductRow>, DbError> {
    let rows = sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products \
         WHERE NOT is_deleted \
         ORDER BY created_at, id"
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Ids of every live product, in creation order. Drives the refresh loop.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_active_product_ids(pool: &PgPool) -> Result<Vec<Uuid>, DbError> {
    let ids = sqlx::query_scalar::<_, Uuid>(
        "SELECT id FROM products WHERE NOT is_deleted ORDER BY created_at, id",
    )
    .fetch_all(pool)
    .await?;

    Ok(ids)
}
