use std::path::PathBuf;

use crate::app_config::AppConfig;
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

/// Load application configuration from environment variables already in the
/// process, without touching `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// The lookup indirection keeps parsing and validation testable with a plain
/// `HashMap` — no `set_var`/`remove_var` in tests.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
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

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let database_url = require("DATABASE_URL")?;

    let log_level = or_default("PROSPEKT_LOG_LEVEL", "info");
    let brand_rules_path = PathBuf::from(or_default(
        "PROSPEKT_BRAND_RULES_PATH",
        "./config/brand_rules.yaml",
    ));
    let spool_dir = PathBuf::from(or_default("PROSPEKT_SPOOL_DIR", "./spool"));

    let db_max_connections = parse_u32("PROSPEKT_DB_MAX_CONNECTIONS", "5")?;
    let db_acquire_timeout_secs = parse_u64("PROSPEKT_DB_ACQUIRE_TIMEOUT_SECS", "10")?;
    let strategy_timeout_secs = parse_u64("PROSPEKT_STRATEGY_TIMEOUT_SECS", "45")?;
    let max_concurrent_retailers = parse_usize("PROSPEKT_MAX_CONCURRENT_RETAILERS", "5")?;

    Ok(AppConfig {
        database_url,
        log_level,
        brand_rules_path,
        spool_dir,
        db_max_connections,
        db_acquire_timeout_secs,
        strategy_timeout_secs,
        max_concurrent_retailers,
    })
}
