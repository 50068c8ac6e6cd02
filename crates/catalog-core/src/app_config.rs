use std::net::SocketAddr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// What the offer refresh loop does when fetching offers for one product fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshFailurePolicy {
    /// Stop the whole pass at the first failing product.
    #[default]
    AbortPass,
    /// Log the failure and continue with the next product.
    SkipProduct,
}

impl std::fmt::Display for RefreshFailurePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RefreshFailurePolicy::AbortPass => write!(f, "abort_pass"),
            RefreshFailurePolicy::SkipProduct => write!(f, "skip_product"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    /// Path prefix every HTTP route is mounted under, e.g. `/api`.
    pub api_prefix: String,
    pub jwt_secret: String,
    pub jwt_expire_secs: u64,
    /// Base URL of the external offer service; always ends with `/`.
    pub offers_base_url: String,
    pub offers_refresh_token: String,
    pub offers_access_token: Option<String>,
    pub offers_request_timeout_secs: u64,
    pub refresh_interval_secs: u64,
    pub refresh_failure_policy: RefreshFailurePolicy,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("api_prefix", &self.api_prefix)
            .field("database_url", &"[redacted]")
            .field("jwt_secret", &"[redacted]")
            .field("jwt_expire_secs", &self.jwt_expire_secs)
            .field("offers_base_url", &self.offers_base_url)
            .field("offers_refresh_token", &"[redacted]")
            .field(
                "offers_access_token",
                &self.offers_access_token.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "offers_request_timeout_secs",
                &self.offers_request_timeout_secs,
            )
            .field("refresh_interval_secs", &self.refresh_interval_secs)
            .field("refresh_failure_policy", &self.refresh_failure_policy)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .finish()
    }
}
