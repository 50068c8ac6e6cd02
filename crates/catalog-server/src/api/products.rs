//! Product handlers. Creating a product registers it with the offer service
//! and stores its initial offers; reads attach the current offer per
//! external offer id.

use std::collections::HashMap;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Extension, Json,
};
use catalog_db::{NewOffer, OfferRow, ProductRow};
use catalog_offers::StatusCode as OfferStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::Claims;
use crate::middleware::RequestId;

use super::{
    map_db_error, map_offer_error, map_rejection, parse_uuid, ApiError, ApiResponse, AppState,
};

const MAX_NAME_CHARS: usize = 200;
const MAX_DESCRIPTION_CHARS: usize = 2000;

// ---------------------------------------------------------------------------
// Request / response bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(super) struct ProductRequest {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Serialize)]
pub(super) struct OfferItem {
    id: Uuid,
    price: i64,
    items_in_stock: i64,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub(super) struct ProductItem {
    id: Uuid,
    name: String,
    description: String,
    is_deleted: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    offers: Vec<OfferItem>,
}

impl From<OfferRow> for OfferItem {
    fn from(row: OfferRow) -> Self {
        Self {
            id: row.offer_id,
            price: row.price,
            items_in_stock: row.items_in_stock,
            created_at: row.created_at,
        }
    }
}

impl ProductItem {
    fn new(row: ProductRow, offers: Vec<OfferRow>) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            is_deleted: row.is_deleted,
            created_at: row.created_at,
            updated_at: row.updated_at,
            offers: offers.into_iter().map(OfferItem::from).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Trims both fields and checks their lengths in characters.
fn validate_product(req_id: &str, body: &ProductRequest) -> Result<(String, String), ApiError> {
    let name = body.name.trim();
    let name_chars = name.chars().count();
    if name_chars == 0 || name_chars > MAX_NAME_CHARS {
        return Err(ApiError::new(
            req_id,
            "validation_error",
            format!("name must be 1-{MAX_NAME_CHARS} characters"),
        ));
    }

    let description = body.description.trim();
    let description_chars = description.chars().count();
    if description_chars == 0 || description_chars > MAX_DESCRIPTION_CHARS {
        return Err(ApiError::new(
            req_id,
            "validation_error",
            format!("description must be 1-{MAX_DESCRIPTION_CHARS} characters"),
        ));
    }

    Ok((name.to_owned(), description.to_owned()))
}

fn not_found(req_id: &str, id: Uuid) -> ApiError {
    ApiError::new(req_id, "not_found", format!("product {id} not found"))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /product — register with the offer service, fetch offers, persist.
pub(super) async fn create_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(claims): Extension<Claims>,
    body: Result<Json<ProductRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<ProductItem>>), ApiError> {
    let rid = &req_id.0;
    let Json(body) = body.map_err(|e| map_rejection(rid, &e))?;
    let (name, description) = validate_product(rid, &body)?;
    let id = Uuid::new_v4();

    let status = state
        .offers
        .register_product(id, &name, &description)
        .await
        .map_err(|e| map_offer_error(rid.clone(), &e))?;
    if status != OfferStatus::CREATED {
        tracing::warn!(product_id = %id, status = status.as_u16(), "product registration rejected");
        return Err(ApiError::new(
            rid,
            "bad_gateway",
            format!("offer service registration failed with status {}", status.as_u16()),
        ));
    }

    let fetched = state
        .offers
        .get_product_offers(id)
        .await
        .map_err(|e| map_offer_error(rid.clone(), &e))?;
    if !fetched.is_success() {
        tracing::warn!(product_id = %id, status = fetched.status.as_u16(), "initial offer fetch failed");
        return Err(ApiError::new(
            rid,
            "bad_gateway",
            format!(
                "offer service offer fetch failed with status {}",
                fetched.status.as_u16()
            ),
        ));
    }

    let new_offers: Vec<NewOffer> = fetched
        .offers
        .iter()
        .map(|o| NewOffer {
            offer_id: o.id,
            price: o.price,
            items_in_stock: o.items_in_stock,
        })
        .collect();

    let (product, offers) =
        catalog_db::create_product_with_offers(&state.pool, id, &name, &description, &new_offers)
            .await
            .map_err(|e| map_db_error(rid.clone(), &e))?;

    tracing::info!(
        product_id = %id,
        offers = offers.len(),
        requested_by = %claims.email,
        "product created"
    );

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(req_id.0, ProductItem::new(product, offers))),
    ))
}

/// PUT /product/{id} — replace name and description.
pub(super) async fn update_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    body: Result<Json<ProductRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<ProductItem>>, ApiError> {
    let rid = &req_id.0;
    let id = parse_uuid(rid, &id, "product id")?;
    let Json(body) = body.map_err(|e| map_rejection(rid, &e))?;
    let (name, description) = validate_product(rid, &body)?;

    let product = catalog_db::update_product(&state.pool, id, &name, &description)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| not_found(rid, id))?;

    tracing::info!(product_id = %id, requested_by = %claims.email, "product updated");

    let offers = catalog_db::list_current_offers(&state.pool, id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok(Json(ApiResponse::new(
        req_id.0,
        ProductItem::new(product, offers),
    )))
}

/// DELETE /product/{id} — soft delete; returns the flagged product.
pub(super) async fn delete_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<ProductItem>>, ApiError> {
    let rid = &req_id.0;
    let id = parse_uuid(rid, &id, "product id")?;

    let product = catalog_db::soft_delete_product(&state.pool, id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| not_found(rid, id))?;

    tracing::info!(product_id = %id, requested_by = %claims.email, "product deleted");

    Ok(Json(ApiResponse::new(
        req_id.0,
        ProductItem::new(product, Vec::new()),
    )))
}

/// GET /product/{id} — product with its current offers.
pub(super) async fn get_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<ProductItem>>, ApiError> {
    let rid = &req_id.0;
    let id = parse_uuid(rid, &id, "product id")?;

    let product = catalog_db::get_product(&state.pool, id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| not_found(rid, id))?;

    let offers = catalog_db::list_current_offers(&state.pool, id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok(Json(ApiResponse::new(
        req_id.0,
        ProductItem::new(product, offers),
    )))
}

/// GET /products — every live product with its current offers; 404 when
/// there are none.
pub(super) async fn list_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<ProductItem>>>, ApiError> {
    let rid = &req_id.0;

    let products = catalog_db::list_products(&state.pool)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;
    if products.is_empty() {
        return Err(ApiError::new(rid, "not_found", "no products found"));
    }

    let ids: Vec<Uuid> = products.iter().map(|p| p.id).collect();
    let offer_rows = catalog_db::list_current_offers_for_products(&state.pool, &ids)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    let mut by_product: HashMap<Uuid, Vec<OfferRow>> = HashMap::new();
    for row in offer_rows {
        by_product.entry(row.product_id).or_default().push(row);
    }

    let data = products
        .into_iter()
        .map(|p| {
            let offers = by_product.remove(&p.id).unwrap_or_default();
            ProductItem::new(p, offers)
        })
        .collect();

    Ok(Json(ApiResponse::new(req_id.0, data)))
}
