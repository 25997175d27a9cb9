//!
//! Common types and utilities shared by the quote data service and its client.
//!
//! This crate aggregates:
//! - `error` — unified error type `MarketError` used across the workspace.
//! - `result` — handy `Result<T, MarketError>` alias.
//! - `model` — quotes, option contracts, price bars and the other payloads.
//! - `tickers` — validated symbols, known tickers and symbol-list parsing.
#![warn(missing_docs)]
pub mod error;
pub mod model;
pub mod result;
pub mod tickers;

pub use error::MarketError;
pub use model::Quote;
pub use result::Result;
pub use tickers::{Symbol, Ticker};
