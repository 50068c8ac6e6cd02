//! HTTP client for the external offer service.
//!
//! Every call authenticates with a `Bearer: <token>` header (the header name
//! itself is `Bearer`). Every 401 triggers a refresh of the access token;
//! other failures are retried as-is.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use uuid::Uuid;

use crate::error::OfferClientError;
use crate::token::AccessToken;
use crate::types::{AuthResponse, OffersResponse, RawOffer, RegisterProductRequest};

/// Total HTTP calls made for one register/get operation, reauthorizations
/// excluded.
pub const MAX_ATTEMPTS: u32 = 3;

const BEARER_HEADER: &str = "Bearer";

/// Client for the offer service.
///
/// Cheap to clone; clones share the HTTP connection pool and the
/// [`AccessToken`].
#[derive(Clone)]
pub struct OfferClient {
    client: Client,
    base_url: Url,
    refresh_token: String,
    access_token: AccessToken,
}

impl std::fmt::Debug for OfferClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OfferClient")
            .field("base_url", &self.base_url.as_str())
            .field("refresh_token", &"[redacted]")
            .finish_non_exhaustive()
    }
}

impl OfferClient {
    /// Creates a client for the service at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`OfferClientError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`OfferClientError::InvalidUrl`] if
    /// `base_url` is not a valid URL.
    pub fn new(
        base_url: &str,
        refresh_token: &str,
        timeout_secs: u64,
    ) -> Result<Self, OfferClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("catalog/0.1 (offer-sync)")
            .build()?;

        // Paths are joined relative to the base, which only keeps the last
        // path segment when the base ends in a slash.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised)
            .map_err(|e| OfferClientError::InvalidUrl(format!("'{base_url}': {e}")))?;

        Ok(Self {
            client,
            base_url,
            refresh_token: refresh_token.to_owned(),
            access_token: AccessToken::default(),
        })
    }

    /// Seeds the client with an access token obtained elsewhere, so the first
    /// call does not have to fail with 401 before authorizing.
    #[must_use]
    pub fn with_access_token(mut self, token: Option<String>) -> Self {
        self.access_token = AccessToken::new(token);
        self
    }

    #[must_use]
    pub fn access_token(&self) -> &AccessToken {
        &self.access_token
    }

    /// Registers a product with the offer service.
    ///
    /// Returns the status of the final attempt; only `201 Created` means the
    /// product was registered.
    ///
    /// # Errors
    ///
    /// - [`OfferClientError::ServiceUnavailable`] if a reauthorization fails.
    /// - [`OfferClientError::Http`] on network failure.
    pub async fn register_product(
        &self,
        id: Uuid,
        name: &str,
        description: &str,
    ) -> Result<StatusCode, OfferClientError> {
        let url = self.endpoint("products/register")?;
        let body = RegisterProductRequest {
            id,
            name,
            description,
        };

        let response = self
            .send_with_reauth("register_product", StatusCode::CREATED, |client| {
                client.post(url.clone()).json(&body)
            })
            .await?;

        Ok(response.status())
    }

    /// Fetches the current offers for a registered product.
    ///
    /// `offers` is empty unless the final status is `200 OK`.
    ///
    /// # Errors
    ///
    /// - [`OfferClientError::ServiceUnavailable`] if a reauthorization fails.
    /// - [`OfferClientError::Http`] on network failure.
    /// - [`OfferClientError::Deserialize`] if a 200 body is not an offer list.
    pub async fn get_product_offers(&self, id: Uuid) -> Result<OffersResponse, OfferClientError> {
        let url = self.endpoint(&format!("products/{id}/offers"))?;

        let response = self
            .send_with_reauth("get_product_offers", StatusCode::OK, |client| {
                client.get(url.clone())
            })
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Ok(OffersResponse {
                status,
                offers: Vec::new(),
            });
        }

        let body = response.text().await?;
        let offers: Vec<RawOffer> =
            serde_json::from_str(&body).map_err(|e| OfferClientError::Deserialize {
                context: format!("get_product_offers(id={id})"),
                source: e,
            })?;

        Ok(OffersResponse { status, offers })
    }

    /// Exchanges the refresh token for a new access token and stores it.
    ///
    /// # Errors
    ///
    /// - [`OfferClientError::ServiceUnavailable`] if the service does not
    ///   answer `201 Created`.
    /// - [`OfferClientError::Http`] on network failure.
    /// - [`OfferClientError::Deserialize`] if the 201 body has no token.
    pub async fn authorize(&self) -> Result<String, OfferClientError> {
        let url = self.endpoint("auth")?;
        let response = self
            .client
            .post(url)
            .header(BEARER_HEADER, &self.refresh_token)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::CREATED {
            tracing::error!(status = status.as_u16(), "offer service rejected refresh token");
            return Err(OfferClientError::ServiceUnavailable {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        let auth: AuthResponse =
            serde_json::from_str(&body).map_err(|e| OfferClientError::Deserialize {
                context: "authorize".to_string(),
                source: e,
            })?;

        self.access_token.swap(auth.access_token.clone()).await;
        tracing::info!("offer service access token refreshed");

        Ok(auth.access_token)
    }

    fn endpoint(&self, path: &str) -> Result<Url, OfferClientError> {
        self.base_url
            .join(path)
            .map_err(|e| OfferClientError::InvalidUrl(format!("{}{path}: {e}", self.base_url)))
    }

    /// Sends the request built by `build` up to [`MAX_ATTEMPTS`] times, until
    /// the response status equals `success`.
    ///
    /// Every 401, the last one included, refreshes the access token. A
    /// rejected refresh token therefore surfaces as
    /// [`OfferClientError::ServiceUnavailable`] even on the final attempt. The
    /// last response is returned whatever its status; the caller decides what
    /// a non-success status means.
    async fn send_with_reauth<F>(
        &self,
        operation: &'static str,
        success: StatusCode,
        build: F,
    ) -> Result<Response, OfferClientError>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let mut attempt = 1;
        loop {
            let token = self.access_token.get().await.unwrap_or_default();
            let response = build(&self.client)
                .header(BEARER_HEADER, token)
                .send()
                .await?;

            let status = response.status();
            if status == success {
                return Ok(response);
            }

            if status == StatusCode::UNAUTHORIZED {
                tracing::info!(operation, attempt, "offer service returned 401, reauthorizing");
                self.authorize().await?;
            }

            if attempt >= MAX_ATTEMPTS {
                tracing::warn!(
                    operation,
                    status = status.as_u16(),
                    attempts = attempt,
                    "offer service call did not succeed"
                );
                return Ok(response);
            }

            if status != StatusCode::UNAUTHORIZED {
                tracing::warn!(
                    operation,
                    attempt,
                    max_attempts = MAX_ATTEMPTS,
                    status = status.as_u16(),
                    "offer service call failed, retrying"
                );
            }

            attempt += 1;
        }
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
