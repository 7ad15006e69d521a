//! Application configuration loaded once from environment variables.
//!
//! Every collaborator receives the pieces it needs from this struct; nothing
//! else in the crate reads the environment.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,
    /// Frontend URL allowed by CORS
    pub frontend_url: String,

    // --- Backend REST proxy ---
    /// Base URL of the profile/gallery/winners/schedule proxy.
    /// `None` runs against the in-memory backend.
    pub backend_url: Option<String>,
    /// Optional bearer token for the proxy
    pub backend_api_key: Option<String>,

    // --- Chain ---
    /// JSON-RPC endpoint
    pub solana_rpc_url: String,
    /// Membership program ID (base58)
    pub membership_program_id: String,

    // --- Race data providers ---
    /// Base URL for providers A and B
    pub openf1_url: String,
    /// Base URL for provider C
    pub ergast_url: String,

    // --- Timing ---
    /// Timeout applied to every outbound HTTP call
    pub http_timeout: Duration,
    /// Race result refresh interval
    pub race_refresh_interval: Duration,
    /// Winner commit check interval
    pub winner_check_interval: Duration,
    /// Delay after a wallet connects before the first sync
    pub wallet_settle_delay: Duration,
    /// Chain poll interval for membership watches
    pub membership_poll_interval: Duration,

    /// Optional file persisting the local cache
    pub cache_path: Option<String>,
}

impl Config {
    /// Offline configuration for tests.
    pub fn test_default() -> Self {
        Self {
            port: 8080,
            frontend_url: "http://localhost:3000".to_string(),
            backend_url: None,
            backend_api_key: None,
            solana_rpc_url: "http://127.0.0.1:8899".to_string(),
            membership_program_id: "11111111111111111111111111111111".to_string(),
            openf1_url: "http://127.0.0.1:9/v1".to_string(),
            ergast_url: "http://127.0.0.1:9/ergast/f1".to_string(),
            http_timeout: Duration::from_secs(2),
            race_refresh_interval: Duration::from_secs(30),
            winner_check_interval: Duration::from_secs(60),
            wallet_settle_delay: Duration::from_millis(10),
            membership_poll_interval: Duration::from_millis(50),
            cache_path: None,
        }
    }

    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Self {
            port: parse_or("PORT", 8080)?,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),

            backend_url: optional("BACKEND_URL").map(|url| url.trim_end_matches('/').to_string()),
            backend_api_key: optional("BACKEND_API_KEY"),

            solana_rpc_url: env::var("SOLANA_RPC_URL")
                .unwrap_or_else(|_| "https://api.devnet.solana.com".to_string()),
            membership_program_id: env::var("MEMBERSHIP_PROGRAM_ID")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("MEMBERSHIP_PROGRAM_ID"))?,

            openf1_url: env::var("OPENF1_URL")
                .unwrap_or_else(|_| "https://api.openf1.org/v1".to_string()),
            ergast_url: env::var("ERGAST_URL")
                .unwrap_or_else(|_| "https://api.jolpi.ca/ergast/f1".to_string()),

            http_timeout: Duration::from_secs(parse_or("HTTP_TIMEOUT_SECS", 10)?),
            race_refresh_interval: Duration::from_secs(parse_or("RACE_REFRESH_SECS", 30)?),
            winner_check_interval: Duration::from_secs(parse_or("WINNER_CHECK_SECS", 60)?),
            wallet_settle_delay: Duration::from_millis(parse_or("WALLET_SETTLE_MS", 1500)?),
            membership_poll_interval: Duration::from_secs(parse_or("MEMBERSHIP_POLL_SECS", 20)?),

            cache_path: optional("CACHE_PATH"),
        })
    }
}

/// Read a non-empty variable.
fn optional(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse a variable, falling back to `default` when unset.
fn parse_or<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match optional(name) {
        Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid(name)),
        None => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    // Both cases live in one test since they share process-wide env vars.
    #[test]
    fn test_config_from_env() {
        env::set_var("MEMBERSHIP_PROGRAM_ID", " Memb3rsh1pProgram111111111111111111111111 ");
        env::set_var("BACKEND_URL", "https://proxy.example.com/api/");
        env::set_var("RACE_REFRESH_SECS", "45");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(
            config.membership_program_id,
            "Memb3rsh1pProgram111111111111111111111111"
        );
        assert_eq!(
            config.backend_url.as_deref(),
            Some("https://proxy.example.com/api")
        );
        assert_eq!(config.race_refresh_interval, Duration::from_secs(45));
        assert_eq!(config.http_timeout, Duration::from_secs(10));

        env::set_var("HTTP_TIMEOUT_SECS", "ten");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::Invalid("HTTP_TIMEOUT_SECS"))
        ));
        env::remove_var("HTTP_TIMEOUT_SECS");
    }
}
