mod offers;
mod products;
mod token;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post, put},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use catalog_offers::{OfferClient, OfferClientError};

use crate::middleware::{
    enforce_rate_limit, request_id, require_bearer_auth, AuthState, RateLimitState, RequestId,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub offers: OfferClient,
    pub auth: AuthState,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub(super) fn new(request_id: String, data: T) -> Self {
        Self {
            data,
            meta: ResponseMeta::new(request_id),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "unprocessable" => StatusCode::UNPROCESSABLE_ENTITY,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            "bad_gateway" => StatusCode::BAD_GATEWAY,
            "service_unavailable" => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn map_db_error(request_id: String, error: &catalog_db::DbError) -> ApiError {
    if let catalog_db::DbError::InvalidRange { .. } = error {
        return ApiError::new(request_id, "bad_request", error.to_string());
    }
    tracing::error!(error = %error, "database query failed");
    ApiError::new(request_id, "internal_error", error.to_string())
}

pub(super) fn map_offer_error(request_id: String, error: &OfferClientError) -> ApiError {
    match error {
        OfferClientError::ServiceUnavailable { .. } => {
            tracing::error!(error = %error, "offer service unavailable");
            ApiError::new(request_id, "service_unavailable", error.to_string())
        }
        _ => {
            tracing::error!(error = %error, "offer service call failed");
            ApiError::new(request_id, "internal_error", error.to_string())
        }
    }
}

pub(super) fn map_history_error(request_id: String, error: &catalog_db::HistoryError) -> ApiError {
    use catalog_db::HistoryError;

    match error {
        HistoryError::NotFound(_) => ApiError::new(request_id, "not_found", error.to_string()),
        HistoryError::InvalidRange { .. } => {
            ApiError::new(request_id, "bad_request", error.to_string())
        }
        HistoryError::Trend(_) => ApiError::new(request_id, "unprocessable", error.to_string()),
        HistoryError::Db(e) => map_db_error(request_id, e),
    }
}

/// Wraps a `Json` or `Query` extractor rejection in the error envelope.
pub(super) fn map_rejection(request_id: &str, rejection: &impl std::fmt::Display) -> ApiError {
    ApiError::new(request_id, "bad_request", rejection.to_string())
}

pub(super) fn parse_uuid(request_id: &str, raw: &str, what: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| {
        ApiError::new(
            request_id,
            "bad_request",
            format!("{what} must be a UUID, got '{raw}'"),
        )
    })
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
        ])
}

fn protected_router(auth: AuthState, rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route("/product", post(products::create_product))
        .route(
            "/product/{id}",
            get(products::get_product)
                .put(products::update_product)
                .delete(products::delete_product),
        )
        .route("/products", get(products::list_products))
        .route(
            "/offer/{id}/history/{limit}/{offset}",
            get(offers::get_offer_history),
        )
        .route("/offer/{id}/trend", get(offers::get_offer_trend))
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(
                    rate_limit,
                    enforce_rate_limit,
                ))
                .layer(axum::middleware::from_fn_with_state(
                    auth,
                    require_bearer_auth,
                )),
        )
}

/// Builds the full application router with every route mounted under
/// `api_prefix` (empty for the root).
pub fn build_app(state: AppState, rate_limit: RateLimitState, api_prefix: &str) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health))
        .route("/token", post(token::issue_token));

    let routes = Router::new()
        .merge(public_routes)
        .merge(protected_router(state.auth.clone(), rate_limit));

    // axum refuses to nest at the root, so an empty prefix merges instead.
    let routes = if api_prefix.is_empty() {
        routes
    } else {
        Router::new().nest(api_prefix, routes)
    };

    routes
        .layer(
            ServiceBuilder::new()
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);

    match catalog_db::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse {
                data: HealthData {
                    status: "ok",
                    database: "ok",
                },
                meta,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse {
                    data: HealthData {
                        status: "degraded",
                        database: "unavailable",
                    },
                    meta,
                }),
            )
        }
    }
}

pub fn default_rate_limit_state() -> RateLimitState {
    RateLimitState::new(120, Duration::from_secs(60))
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
