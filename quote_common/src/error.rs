//! Error types shared by the service and the client.
//!
//! The `MarketError` enum unifies the failure cases of the workspace: I/O, JSON,
//! upstream fetches and the few domain errors the data service reports
//! explicitly, allowing crates to propagate a single error type.
use std::io;

use thiserror::Error;

/// Unified error type shared by the service and the client.
#[derive(Error, Debug)]
pub enum MarketError {
    /// I/O error originating from the standard library or files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Generic formatting/validation error with a human-readable message.
    #[error("Format error: {0}")]
    Format(String),

    /// Failure while encoding/decoding JSON via serde_json.
    #[error("JSON serialization/deserialization error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    /// An upstream endpoint could not be reached or answered with an error status.
    #[error("Upstream request failed: {0}")]
    Upstream(String),

    /// An upstream endpoint answered, but the payload lacked the expected fields.
    #[error("Malformed upstream payload: {0}")]
    MalformedPayload(String),

    /// Error while parsing a symbol list file.
    #[error("Parse tickers file error: {0}")]
    ParseTickersFile(String),

    /// A symbol that is empty or contains characters no exchange uses.
    #[error("Invalid symbol: {0:?}")]
    InvalidSymbol(String),

    /// Options were requested for an underlying whose price cannot anchor a strike ladder.
    #[error("Degenerate underlying price {price} for {symbol}")]
    DegenerateUnderlying {
        /// Underlying symbol.
        symbol: String,
        /// The offending price.
        price: f64,
    },
}

