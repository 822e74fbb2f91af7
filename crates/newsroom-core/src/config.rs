use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Desktop browser identification sent with every source fetch. Several news
/// sites serve an empty shell or a 403 to non-browser agents.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Every six hours, on the hour.
pub const DEFAULT_INGEST_CRON: &str = "0 0 */6 * * *";

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
/// Decoupled from the real environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

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

    let parse_bool = |var: &str, default: &str| -> Result<bool, ConfigError> {
        match or_default(var, default).to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(invalid(var, format!("expected a boolean, got \"{other}\""))),
        }
    };

    let database_url = require("DATABASE_URL")?;
    let env = parse_environment(&or_default("NEWSROOM_ENV", "development"))?;

    let bind_addr = or_default("NEWSROOM_BIND_ADDR", "0.0.0.0:3000")
        .parse::<SocketAddr>()
        .map_err(|e| invalid("NEWSROOM_BIND_ADDR", e.to_string()))?;
    let log_level = or_default("NEWSROOM_LOG_LEVEL", "info");
    let sources_path = PathBuf::from(or_default(
        "NEWSROOM_SOURCES_PATH",
        "./config/sources.yaml",
    ));

    let db_max_connections = parse_u32("NEWSROOM_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("NEWSROOM_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("NEWSROOM_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let scraper_request_timeout_secs = parse_u64("NEWSROOM_SCRAPER_REQUEST_TIMEOUT_SECS", "10")?;
    let scraper_user_agent = or_default("NEWSROOM_SCRAPER_USER_AGENT", DEFAULT_USER_AGENT);
    let scraper_inter_source_delay_ms =
        parse_u64("NEWSROOM_SCRAPER_INTER_SOURCE_DELAY_MS", "2000")?;

    let ingest_cron = or_default("NEWSROOM_INGEST_CRON", DEFAULT_INGEST_CRON);
    if ingest_cron.split_whitespace().count() < 6 {
        return Err(invalid(
            "NEWSROOM_INGEST_CRON",
            format!("\"{ingest_cron}\" must have six fields (seconds first)"),
        ));
    }
    let ingest_schedule_enabled = parse_bool("NEWSROOM_INGEST_SCHEDULE_ENABLED", "true")?;

    let default_author = or_default("NEWSROOM_DEFAULT_AUTHOR", "Redacción");
    if default_author.trim().is_empty() {
        return Err(invalid(
            "NEWSROOM_DEFAULT_AUTHOR",
            "must not be blank".to_string(),
        ));
    }

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        sources_path,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        scraper_request_timeout_secs,
        scraper_user_agent,
        scraper_inter_source_delay_ms,
        ingest_cron,
        ingest_schedule_enabled,
        default_author,
    })
}

fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "NEWSROOM_ENV".to_string(),
            reason: format!("unknown environment \"{other}\""),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
