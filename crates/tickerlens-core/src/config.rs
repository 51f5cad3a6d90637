//! Runtime configuration with environment overrides.
//!
//! | Field | Env var | Default |
//! |-------|---------|---------|
//! | `cache_ttl` | `TICKERLENS_CACHE_TTL_SECS` | 3600 s |
//! | `request_timeout_ms` | `TICKERLENS_TIMEOUT_MS` | 10000 |
//! | `default_lookback_days` | `TICKERLENS_LOOKBACK_DAYS` | 365 |
//! | `default_currency_symbol` | `TICKERLENS_CURRENCY_SYMBOL` | `$` |
//! | `session_cookie` | `YAHOO_COOKIE` | unset |

use std::time::Duration;

use crate::format::DEFAULT_CURRENCY_SYMBOL;
use crate::ConfigError;

pub const ENV_CACHE_TTL_SECS: &str = "TICKERLENS_CACHE_TTL_SECS";
pub const ENV_TIMEOUT_MS: &str = "TICKERLENS_TIMEOUT_MS";
pub const ENV_LOOKBACK_DAYS: &str = "TICKERLENS_LOOKBACK_DAYS";
pub const ENV_CURRENCY_SYMBOL: &str = "TICKERLENS_CURRENCY_SYMBOL";
pub const ENV_YAHOO_COOKIE: &str = "YAHOO_COOKIE";

/// Settings shared by the snapshot pipeline and its collaborators.
#[derive(Clone, PartialEq, Eq)]
pub struct SnapshotConfig {
    /// How long a fetched history stays reusable. Zero disables caching.
    pub cache_ttl: Duration,
    pub request_timeout_ms: u64,
    pub default_lookback_days: u32,
    /// Symbol used when the provider reports no currency.
    pub default_currency_symbol: String,
    /// Optional Yahoo session cookie, bypassing the cookie handshake.
    pub session_cookie: Option<String>,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(3600),
            request_timeout_ms: 10_000,
            default_lookback_days: 365,
            default_currency_symbol: String::from(DEFAULT_CURRENCY_SYMBOL),
            session_cookie: None,
        }
    }
}

impl std::fmt::Debug for SnapshotConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotConfig")
            .field("cache_ttl", &self.cache_ttl)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .field("default_lookback_days", &self.default_lookback_days)
            .field("default_currency_symbol", &self.default_currency_symbol)
            .field(
                "session_cookie",
                &self.session_cookie.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

impl SnapshotConfig {
    /// Defaults overridden by process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable name.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_CACHE_TTL_SECS) {
            config.cache_ttl = Duration::from_secs(parse_u64(ENV_CACHE_TTL_SECS, &raw)?);
        }

        if let Some(raw) = lookup(ENV_TIMEOUT_MS) {
            config.request_timeout_ms = parse_positive(ENV_TIMEOUT_MS, &raw)?;
        }

        if let Some(raw) = lookup(ENV_LOOKBACK_DAYS) {
            let days = parse_positive(ENV_LOOKBACK_DAYS, &raw)?;
            config.default_lookback_days =
                u32::try_from(days).map_err(|_| ConfigError::InvalidInteger {
                    var: ENV_LOOKBACK_DAYS,
                    value: raw.clone(),
                })?;
        }

        if let Some(raw) = lookup(ENV_CURRENCY_SYMBOL) {
            if raw.trim().is_empty() {
                return Err(ConfigError::EmptyValue {
                    var: ENV_CURRENCY_SYMBOL,
                });
            }
            config.default_currency_symbol = raw.trim().to_owned();
        }

        config.session_cookie = lookup(ENV_YAHOO_COOKIE).filter(|cookie| !cookie.trim().is_empty());

        Ok(config)
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn with_request_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.request_timeout_ms = timeout_ms;
        self
    }
}

fn parse_u64(var: &'static str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim()
        .parse::<u64>()
        .map_err(|_| ConfigError::InvalidInteger {
            var,
            value: raw.to_owned(),
        })
}

fn parse_positive(var: &'static str, raw: &str) -> Result<u64, ConfigError> {
    match parse_u64(var, raw)? {
        0 => Err(ConfigError::ZeroValue { var }),
        value => Ok(value),
    }
}
