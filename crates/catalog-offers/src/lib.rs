//! Client for the external offer service: product registration, offer
//! retrieval, and access-token refresh.

pub mod client;
pub mod error;
pub mod token;
pub mod types;

pub use client::{OfferClient, MAX_ATTEMPTS};
pub use error::OfferClientError;
pub use reqwest::StatusCode;
pub use token::AccessToken;
pub use types::{OffersResponse, RawOffer};
