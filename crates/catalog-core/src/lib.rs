pub mod app_config;
pub mod config;
pub mod history;
pub mod offers;
pub mod pagination;
pub mod trend;

use thiserror::Error;

pub use app_config::{AppConfig, Environment, RefreshFailurePolicy};
pub use config::{load_app_config, load_app_config_from_env};
pub use history::{page_history, PagedHistory};
pub use offers::{OfferSnapshot, TimeWindow};
pub use pagination::Pagination;
pub use trend::{price_trend, TrendError};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
