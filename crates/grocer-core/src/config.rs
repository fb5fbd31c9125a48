use crate::app_config::{AppConfig, Environment};
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
/// Decoupled from the process environment so tests can drive it with a
/// plain `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var).ok().filter(|v| !v.trim().is_empty())
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
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

    let answer_engine_api_key = require("PERPLEXITY_API_KEY")?;
    let shopping_search_api_key = optional("SERPER_API_KEY");

    let env = parse_environment(&or_default("GROCER_ENV", "development"))?;
    let bind_addr = parse_addr("GROCER_BIND_ADDR", "0.0.0.0:8000")?;
    let log_level = or_default("GROCER_LOG_LEVEL", "info");

    let answer_engine_url = or_default("GROCER_ANSWER_ENGINE_URL", "https://api.perplexity.ai");
    let answer_engine_model = or_default("GROCER_ANSWER_ENGINE_MODEL", "sonar");
    let shopping_search_url =
        or_default("GROCER_SHOPPING_SEARCH_URL", "https://google.serper.dev");
    let user_agent = or_default("GROCER_USER_AGENT", "grocer/0.1 (grocery-discovery)");

    let upstream_timeout_secs = parse_u64("GROCER_UPSTREAM_TIMEOUT_SECS", "30")?;
    if upstream_timeout_secs == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "GROCER_UPSTREAM_TIMEOUT_SECS".to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    let upstream_max_retries = parse_u32("GROCER_UPSTREAM_MAX_RETRIES", "1")?;
    let upstream_backoff_base_ms = parse_u64("GROCER_UPSTREAM_BACKOFF_BASE_MS", "500")?;

    let store_cache_ttl_secs = parse_u64("GROCER_STORE_CACHE_TTL_SECS", "86400")?;
    let product_cache_ttl_secs = parse_u64("GROCER_PRODUCT_CACHE_TTL_SECS", "14400")?;

    let tuning_path = optional("GROCER_TUNING_PATH").map(PathBuf::from);

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        answer_engine_api_key,
        answer_engine_url,
        answer_engine_model,
        shopping_search_api_key,
        shopping_search_url,
        user_agent,
        upstream_timeout_secs,
        upstream_max_retries,
        upstream_backoff_base_ms,
        store_cache_ttl_secs,
        product_cache_ttl_secs,
        tuning_path,
    })
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidEnvVar`] for anything other than
/// `development`, `test`, or `production`.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "GROCER_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
