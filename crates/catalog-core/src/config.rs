use crate::app_config::{AppConfig, Environment, RefreshFailurePolicy};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real process environment so tests can drive it with a
/// plain `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let database_url = require("DATABASE_URL")?;
    let jwt_secret = require("CATALOG_JWT_SECRET")?;
    let offers_base_url = normalize_base_url(&require("CATALOG_OFFERS_URL")?);
    let offers_refresh_token = require("CATALOG_OFFERS_REFRESH_TOKEN")?;
    let offers_access_token = lookup("CATALOG_OFFERS_ACCESS_TOKEN")
        .ok()
        .filter(|v| !v.trim().is_empty());

    let env = parse_environment(&or_default("CATALOG_ENV", "development"))?;

    let bind_addr = parse("CATALOG_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("CATALOG_LOG_LEVEL", "info");
    let api_prefix = normalize_api_prefix(&or_default("CATALOG_API_PREFIX", "/api"));

    let jwt_expire_secs = parse_u64("CATALOG_JWT_EXPIRE_SECS", "600")?;
    let offers_request_timeout_secs = parse_u64("CATALOG_OFFERS_REQUEST_TIMEOUT_SECS", "30")?;

    let refresh_interval_secs = parse_u64("CATALOG_REFRESH_INTERVAL_SECS", "60")?;
    if refresh_interval_secs == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "CATALOG_REFRESH_INTERVAL_SECS".to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    let refresh_failure_policy =
        parse_refresh_failure_policy(&or_default("CATALOG_REFRESH_FAILURE_POLICY", "abort_pass"))?;

    let db_max_connections = parse_u32("CATALOG_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("CATALOG_DB_MIN_CONNECTIONS", "1")?;
    if db_min_connections > db_max_connections {
        return Err(ConfigError::InvalidEnvVar {
            var: "CATALOG_DB_MIN_CONNECTIONS".to_string(),
            reason: format!(
                "min connections ({db_min_connections}) exceeds max connections ({db_max_connections})"
            ),
        });
    }
    let db_acquire_timeout_secs = parse_u64("CATALOG_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        api_prefix,
        jwt_secret,
        jwt_expire_secs,
        offers_base_url,
        offers_refresh_token,
        offers_access_token,
        offers_request_timeout_secs,
        refresh_interval_secs,
        refresh_failure_policy,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
    })
}

fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "CATALOG_ENV".to_string(),
            reason: format!("expected development, test, or production, got '{other}'"),
        }),
    }
}

fn parse_refresh_failure_policy(s: &str) -> Result<RefreshFailurePolicy, ConfigError> {
    match s {
        "abort_pass" => Ok(RefreshFailurePolicy::AbortPass),
        "skip_product" => Ok(RefreshFailurePolicy::SkipProduct),
        other => Err(ConfigError::InvalidEnvVar {
            var: "CATALOG_REFRESH_FAILURE_POLICY".to_string(),
            reason: format!("expected abort_pass or skip_product, got '{other}'"),
        }),
    }
}

/// Relative request paths are joined onto the base URL, so it must end in `/`.
fn normalize_base_url(raw: &str) -> String {
    format!("{}/", raw.trim().trim_end_matches('/'))
}

/// `"api"`, `"/api"` and `"/api/"` all become `"/api"`; an empty prefix stays empty.
fn normalize_api_prefix(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
