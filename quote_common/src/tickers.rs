//! Ticker symbols and helpers shared between the service and the client.
//!
//! Arbitrary exchange symbols travel as [`Symbol`], a validated uppercase string.
//! The handful of tickers the service knows something about (company profiles, the
//! popular list, index funds) are enumerated in [`Ticker`].
use std::collections::HashSet;
use std::fmt;
use std::io::BufRead;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::error::MarketError;

/// Longest symbol accepted, long enough for index and class-share forms.
pub const MAX_SYMBOL_LEN: usize = 12;

/// Trait providing file parsing for tickers.
pub trait TickerParser: Sized {
    /// Parses symbols from a buffered reader.
    ///
    /// Symbols may be separated by commas, spaces, or new lines. Duplicates are
    /// dropped, keeping the first occurrence. Returns an error if any token is not a
    /// valid symbol.
    fn parse_from_file<R: BufRead>(reader: R) -> Result<Vec<Self>, MarketError>;
}

/// Validated, uppercase exchange symbol (`AAPL`, `BRK.B`, `^GSPC`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    /// Borrow the symbol text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Symbol {
    type Err = MarketError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let symbol = raw.trim().to_ascii_uppercase();
        let valid_char = |c: char| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '=');
        if symbol.is_empty() || symbol.len() > MAX_SYMBOL_LEN || !symbol.chars().all(valid_char) {
            return Err(MarketError::InvalidSymbol(raw.to_string()));
        }
        Ok(Symbol(symbol))
    }
}

impl TryFrom<String> for Symbol {
    type Error = MarketError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Symbol> for String {
    fn from(symbol: Symbol) -> Self {
        symbol.0
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TickerParser for Symbol {
    fn parse_from_file<R: BufRead>(reader: R) -> Result<Vec<Self>, MarketError> {
        let mut seen = HashSet::new();
        let mut symbols = Vec::new();

        for line_result in reader.lines() {
            let line = line_result.map_err(MarketError::Io)?;
            for token in line.split(|c: char| c == ',' || c.is_whitespace()) {
                if token.is_empty() {
                    continue;
                }
                let symbol = token
                    .parse::<Symbol>()
                    .map_err(|e| MarketError::ParseTickersFile(e.to_string()))?;
                if seen.insert(symbol.clone()) {
                    symbols.push(symbol);
                }
            }
        }
        Ok(symbols)
    }
}

/// Tickers the service has built-in knowledge of.
#[allow(missing_docs)]
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, Display, EnumString, Hash, Eq, PartialEq,
)]
#[strum(ascii_case_insensitive)]
pub enum Ticker {
    AAPL,
    MSFT,
    AMZN,
    TSLA,
    GOOGL,
    NVDA,
    META,
    SPY,
    QQQ,
    DIA,
}

impl Ticker {
    /// Large caps shown on the market overview.
    pub const POPULAR: [Ticker; 6] = [
        Ticker::AAPL,
        Ticker::MSFT,
        Ticker::AMZN,
        Ticker::TSLA,
        Ticker::GOOGL,
        Ticker::NVDA,
    ];

    /// Index-tracking funds standing in for the S&P 500, Nasdaq 100 and Dow.
    pub const INDICES: [Ticker; 3] = [Ticker::SPY, Ticker::QQQ, Ticker::DIA];
}
