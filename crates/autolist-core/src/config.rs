use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://autolist.db";
pub const DEFAULT_UPSTREAM_BASE_URL: &str = "https://www.autotrader.ca";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
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
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let database_url = or_default("DATABASE_URL", DEFAULT_DATABASE_URL);
    let env = parse_environment(&or_default("AUTOLIST_ENV", "development"));

    let bind_addr = or_default("AUTOLIST_BIND_ADDR", "0.0.0.0:8000")
        .parse::<SocketAddr>()
        .map_err(|e| invalid("AUTOLIST_BIND_ADDR", e.to_string()))?;
    let log_level = or_default("AUTOLIST_LOG_LEVEL", "info");

    let db_max_connections = parse_u32("AUTOLIST_DB_MAX_CONNECTIONS", "5")?;
    let db_min_connections = parse_u32("AUTOLIST_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("AUTOLIST_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let upstream_base_url = or_default("AUTOLIST_UPSTREAM_BASE_URL", DEFAULT_UPSTREAM_BASE_URL)
        .trim_end_matches('/')
        .to_string();
    if !(upstream_base_url.starts_with("http://") || upstream_base_url.starts_with("https://")) {
        return Err(invalid(
            "AUTOLIST_UPSTREAM_BASE_URL",
            format!("\"{upstream_base_url}\" is not an http(s) origin"),
        ));
    }

    let scraper_request_timeout_secs = parse_u64("AUTOLIST_SCRAPER_REQUEST_TIMEOUT_SECS", "30")?;
    let scraper_user_agent = or_default("AUTOLIST_SCRAPER_USER_AGENT", "Mozilla/5.0");
    let default_postal_code = or_default("AUTOLIST_DEFAULT_POSTAL_CODE", "N5X0E2");

    let page_size = parse_u32("AUTOLIST_PAGE_SIZE", "40")?;
    if page_size == 0 {
        return Err(invalid("AUTOLIST_PAGE_SIZE", "must be at least 1".to_string()));
    }

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        upstream_base_url,
        scraper_request_timeout_secs,
        scraper_user_agent,
        default_postal_code,
        page_size,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
