//! Cached, failure-tolerant stock data service.
//!
//! The crate wraps the public Yahoo Finance endpoints behind [`StockDataService`]:
//!
//! - `cache` — TTL cache with an injectable clock.
//! - `upstream` — the [`MarketDataSource`] trait and the Yahoo client.
//! - `resolver` — the quote fallback chain (realtime, chart, stale cache, synthetic).
//! - `registry` — per-symbol polling subscriptions.
//! - `options` — synthetic option chains and OCC contract symbols.
//! - `synthetic` — generated quotes, candles and headlines.
//! - `company` — static company profiles.
//! - `config` — defaults and environment overrides.
//!
//! ```no_run
//! use quote_service::{ServiceConfig, StockDataService};
//!
//! let service = StockDataService::new(ServiceConfig::default().apply_env()?)?;
//! let quote = service.get_stock_quote("AAPL");
//! println!("{} {:.2} ({:+.2}%)", quote.symbol, quote.price, quote.change_percent);
//! # Ok::<(), quote_common::MarketError>(())
//! ```
#![warn(missing_docs)]

pub mod cache;
pub mod company;
pub mod config;
pub mod options;
pub mod registry;
pub mod resolver;
pub mod service;
pub mod synthetic;
pub mod upstream;

mod sync;
#[cfg(test)]
mod test_support;

pub use cache::{Clock, ManualClock, SystemClock, TtlCache};
pub use config::{CacheProfile, ServiceConfig};
pub use registry::{Subscription, SubscriptionRegistry};
pub use resolver::{FallbackResolver, QuoteOrigin};
pub use service::StockDataService;
pub use upstream::{MarketDataSource, YahooClient};
