//! Wire types for the offer service.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Body of `POST products/register`.
#[derive(Debug, Serialize)]
pub(crate) struct RegisterProductRequest<'a> {
    pub id: Uuid,
    pub name: &'a str,
    pub description: &'a str,
}

/// Body of a successful `POST auth` response.
#[derive(Debug, Deserialize)]
pub(crate) struct AuthResponse {
    pub access_token: String,
}

/// One entry of the `GET products/{id}/offers` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawOffer {
    /// External offer id; stable across refreshes.
    pub id: Uuid,
    pub price: i64,
    pub items_in_stock: i64,
}

/// Final outcome of an offers request: the last status observed, and the
/// parsed offers when that status was 200.
#[derive(Debug, Clone)]
pub struct OffersResponse {
    pub status: StatusCode,
    pub offers: Vec<RawOffer>,
}

impl OffersResponse {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == StatusCode::OK
    }
}
