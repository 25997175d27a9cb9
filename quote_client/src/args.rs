//! Command-line arguments for the quote client.
//!
//! This module defines the CLI interface using `clap`. See `main` for end-to-end usage.
use std::time::Duration;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use quote_common::{MarketError, Result};
use quote_service::{CacheProfile, ServiceConfig};

/// Parsed command-line arguments.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Cache profile: `realtime` (30 s TTL) or `standard` (5 min TTL).
    #[arg(long, global = true, default_value = "realtime")]
    pub profile: CacheProfile,

    /// Override the quote and options cache TTL, in seconds.
    #[arg(long, global = true)]
    pub ttl_secs: Option<u64>,

    /// Override the subscription polling period, in seconds.
    #[arg(long, global = true)]
    pub poll_secs: Option<u64>,

    /// Do not retry failed requests through the CORS relay.
    #[arg(long, global = true)]
    pub no_relay: bool,

    /// What to fetch.
    #[command(subcommand)]
    pub command: Command,
}

/// Client operations, one per service call.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Current quote for one or more symbols.
    Quote {
        /// Symbols, e.g. `AAPL MSFT`.
        #[arg(required = true)]
        symbols: Vec<String>,
    },
    /// Generated options around the current price.
    Options {
        /// Underlying symbol.
        symbol: String,
        /// Return only this contract (OCC symbol).
        #[arg(long)]
        contract: Option<String>,
    },
    /// Listed options chain for one expiration.
    Chain {
        /// Underlying symbol.
        symbol: String,
        /// Expiration date, `YYYY-MM-DD`; nearest if omitted.
        #[arg(long)]
        expiry: Option<NaiveDate>,
        /// Strikes to keep around the money.
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Upcoming option expirations.
    Expirations {
        /// Underlying symbol.
        symbol: String,
    },
    /// Daily price history.
    History {
        /// Symbol.
        symbol: String,
        /// Number of days.
        #[arg(long, default_value_t = 30)]
        days: u32,
    },
    /// Company profile.
    Company {
        /// Symbol.
        symbol: String,
    },
    /// Recent headlines.
    News {
        /// Symbol.
        symbol: String,
        /// Maximum number of items.
        #[arg(long, default_value_t = 8)]
        limit: usize,
    },
    /// Quotes for the most watched large caps.
    Popular,
    /// Quotes for the index funds.
    Indices,
    /// Poll symbols and log every update until Ctrl+C.
    Watch {
        /// Symbols to watch.
        symbols: Vec<String>,
        /// Text file with more symbols, separated by commas, spaces, or new lines.
        #[arg(long)]
        path: Option<String>,
    },
}

impl Args {
    /// Service configuration: profile defaults, then `QUOTE_*` environment
    /// variables, then command-line flags.
    pub fn service_config(&self) -> Result<ServiceConfig> {
        self.overlay(ServiceConfig::with_profile(self.profile).apply_env()?)
    }

    fn overlay(&self, mut config: ServiceConfig) -> Result<ServiceConfig> {
        if let Some(ttl) = self.ttl_secs {
            config.quote_ttl = Duration::from_secs(ttl);
            config.options_ttl = Duration::from_secs(ttl);
        }
        if let Some(poll) = self.poll_secs {
            if poll == 0 {
                return Err(MarketError::Format("--poll-secs must be positive".to_string()));
            }
            config.poll_interval = Duration::from_secs(poll);
        }
        if self.no_relay {
            config.relay_url = None;
        }
        Ok(config)
    }
}
