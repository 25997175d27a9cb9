//! Service configuration.
//!
//! Defaults mirror the two front-ends the service was built for: the phone app
//! keeps quotes for 30 seconds and polls every 10, the web app keeps them for five
//! minutes. Every knob can be overridden from the environment:
//!
//! | variable                   | field           |
//! |----------------------------|-----------------|
//! | `QUOTE_CACHE_TTL_SECS`     | `quote_ttl`     |
//! | `QUOTE_OPTIONS_TTL_SECS`   | `options_ttl`   |
//! | `QUOTE_POLL_INTERVAL_SECS` | `poll_interval` |
//! | `QUOTE_HTTP_TIMEOUT_SECS`  | `http_timeout`  |
//! | `QUOTE_YAHOO_BASE_URL`     | `yahoo_base_url`|
//! | `QUOTE_RELAY_URL`          | `relay_url` (empty disables the relay) |
use std::time::Duration;

use quote_common::{MarketError, Result};
use strum_macros::{Display, EnumString};

/// Quote TTL of the realtime profile.
pub const REALTIME_CACHE_TTL: Duration = Duration::from_secs(30);
/// Quote TTL of the standard profile.
pub const STANDARD_CACHE_TTL: Duration = Duration::from_secs(5 * 60);
/// Period of the per-symbol subscription poller.
pub const POLL_INTERVAL: Duration = Duration::from_secs(10);
/// Upper bound for one upstream HTTP exchange.
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(10);
/// Public Yahoo Finance API host.
pub const YAHOO_BASE_URL: &str = "https://query1.finance.yahoo.com";
/// Public CORS relay; the target URL goes in its `url` query parameter.
pub const CORS_RELAY_URL: &str = "https://api.allorigins.win/raw";
/// Yahoo rejects requests without a browser-like agent.
pub const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Named TTL presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum CacheProfile {
    /// 30 second TTL for screens that show live prices.
    #[default]
    Realtime,
    /// Five minute TTL for overview pages.
    Standard,
}

impl CacheProfile {
    /// TTL applied to quotes and options data under this profile.
    pub fn ttl(self) -> Duration {
        match self {
            CacheProfile::Realtime => REALTIME_CACHE_TTL,
            CacheProfile::Standard => STANDARD_CACHE_TTL,
        }
    }
}

/// Runtime settings of [`crate::StockDataService`].
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    /// How long a quote is served from cache.
    pub quote_ttl: Duration,
    /// How long generated options data is served from cache.
    pub options_ttl: Duration,
    /// Period of subscription polling.
    pub poll_interval: Duration,
    /// Timeout of one HTTP exchange.
    pub http_timeout: Duration,
    /// Yahoo Finance host, without a trailing slash.
    pub yahoo_base_url: String,
    /// Relay each request is retried through; `None` disables it.
    pub relay_url: Option<String>,
    /// `User-Agent` header sent upstream.
    pub user_agent: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::with_profile(CacheProfile::Realtime)
    }
}

impl ServiceConfig {
    /// Defaults with both TTLs taken from `profile`.
    pub fn with_profile(profile: CacheProfile) -> Self {
        ServiceConfig {
            quote_ttl: profile.ttl(),
            options_ttl: profile.ttl(),
            poll_interval: POLL_INTERVAL,
            http_timeout: HTTP_TIMEOUT,
            yahoo_base_url: YAHOO_BASE_URL.to_string(),
            relay_url: Some(CORS_RELAY_URL.to_string()),
            user_agent: BROWSER_USER_AGENT.to_string(),
        }
    }

    /// Five minute TTL preset.
    pub fn standard() -> Self {
        Self::with_profile(CacheProfile::Standard)
    }

    /// Apply `QUOTE_*` environment overrides on top of `self`.
    pub fn apply_env(self) -> Result<Self> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides read through `lookup`.
    pub fn apply_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(ttl) = secs(&lookup, "QUOTE_CACHE_TTL_SECS")? {
            self.quote_ttl = ttl;
        }
        if let Some(ttl) = secs(&lookup, "QUOTE_OPTIONS_TTL_SECS")? {
            self.options_ttl = ttl;
        }
        if let Some(period) = secs(&lookup, "QUOTE_POLL_INTERVAL_SECS")? {
            if period.is_zero() {
                return Err(MarketError::Format(
                    "QUOTE_POLL_INTERVAL_SECS must be positive".to_string(),
                ));
            }
            self.poll_interval = period;
        }
        if let Some(timeout) = secs(&lookup, "QUOTE_HTTP_TIMEOUT_SECS")? {
            self.http_timeout = timeout;
        }
        if let Some(url) = lookup("QUOTE_YAHOO_BASE_URL") {
            self.yahoo_base_url = url.trim().trim_end_matches('/').to_string();
        }
        if let Some(url) = lookup("QUOTE_RELAY_URL") {
            let url = url.trim();
            self.relay_url = (!url.is_empty()).then(|| url.to_string());
        }
        Ok(self)
    }
}

fn secs<F>(lookup: &F, key: &str) -> Result<Option<Duration>>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|e| MarketError::Format(format!("{key}={raw:?}: {e}")))
        })
        .transpose()
}
