use thiserror::Error;

/// Errors returned by the offer service client.
#[derive(Debug, Error)]
pub enum OfferClientError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Exchanging the refresh token for an access token did not return 201.
    /// Not retried; aborts the call that triggered the reauthorization.
    #[error("offer service unavailable: auth returned HTTP {status}")]
    ServiceUnavailable { status: u16 },

    /// The configured base URL, or a path joined onto it, is not a valid URL.
    #[error("invalid offer service URL: {0}")]
    InvalidUrl(String),

    /// A success response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}
