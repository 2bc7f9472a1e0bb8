//! Runtime configuration read from the environment
//!
//! Values may come from a `.env` file loaded by `main` through `dotenvy`.
//! Unparseable values fall back to their defaults with a warning.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::lifecycle::DEFAULT_MAX_STAY_NIGHTS;

#[derive(Debug, Clone)]
pub struct Config {
    /// Server port (`PORT`)
    pub port: u16,

    /// Path to the redb file (`DATABASE_URL`)
    pub database_url: String,

    /// Token the admin API expects in the `Authorization` header
    /// (`AUTHORIZATION`). Admin routes are open when unset or empty.
    pub admin_token: Option<String>,

    /// Requests allowed per client per window (`RATE_LIMIT_MAX`)
    pub rate_limit_max: u32,

    /// Rate limit window length (`RATE_LIMIT_WINDOW_SECS`)
    pub rate_limit_window: Duration,

    /// Client keys tracked before expired windows are swept
    /// (`RATE_LIMIT_MAX_KEYS`)
    pub rate_limit_max_keys: usize,

    /// Artificial delay of the simulated payment gateway
    /// (`PAYMENT_LATENCY_MS`)
    pub payment_latency: Duration,

    /// Longest bookable stay in nights (`MAX_STAY_NIGHTS`)
    pub max_stay_nights: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            database_url: "data.db".to_string(),
            admin_token: None,
            rate_limit_max: 100,
            rate_limit_window: Duration::from_secs(15 * 60),
            rate_limit_max_keys: 10_000,
            payment_latency: Duration::ZERO,
            max_stay_nights: DEFAULT_MAX_STAY_NIGHTS,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Config::default();

        Self {
            port: parse_var("PORT", defaults.port),
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            admin_token: env::var("AUTHORIZATION").ok().filter(|t| !t.is_empty()),
            rate_limit_max: parse_var("RATE_LIMIT_MAX", defaults.rate_limit_max),
            rate_limit_window: Duration::from_secs(parse_var(
                "RATE_LIMIT_WINDOW_SECS",
                defaults.rate_limit_window.as_secs(),
            )),
            rate_limit_max_keys: parse_var("RATE_LIMIT_MAX_KEYS", defaults.rate_limit_max_keys),
            payment_latency: Duration::from_millis(parse_var("PAYMENT_LATENCY_MS", 0)),
            max_stay_nights: match parse_var("MAX_STAY_NIGHTS", defaults.max_stay_nights) {
                n if n > 0 => n,
                n => {
                    tracing::warn!("Ignoring non-positive MAX_STAY_NIGHTS={}", n);
                    defaults.max_stay_nights
                }
            },
        }
    }
}

fn parse_var<T: FromStr + Copy + std::fmt::Display>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Ignoring invalid {}={:?}, using {}", name, raw, default);
            default
        }),
        Err(_) => default,
    }
}
