//! Data model shared by the data service and its consumers.
//!
//! Every type serializes with camelCase field names, the JSON shape the trading
//! front-ends consume. Dates are `chrono` values: trading days and expirations are
//! `NaiveDate` (`YYYY-MM-DD`), bar and news timestamps are UTC `DateTime`s.
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Percentage move from `previous_close` to `previous_close + change`.
///
/// Returns `0.0` when `previous_close` is zero or the ratio is not finite.
pub fn change_percent(change: f64, previous_close: f64) -> f64 {
    if previous_close == 0.0 {
        return 0.0;
    }
    let pct = change / previous_close * 100.0;
    if pct.is_finite() { pct } else { 0.0 }
}

/// Raw session prices a `Quote` is derived from.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SessionPrices {
    /// Last traded price.
    pub price: f64,
    /// Session open.
    pub open: f64,
    /// Session high.
    pub high: f64,
    /// Session low.
    pub low: f64,
    /// Session volume.
    pub volume: u64,
    /// Close of the previous session.
    pub previous_close: f64,
}

/// Snapshot of a symbol's current trading price and derived change metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    /// Ticker symbol, uppercase.
    pub symbol: String,
    /// Last traded price.
    pub price: f64,
    /// Session open.
    pub open: f64,
    /// Session high.
    pub high: f64,
    /// Session low.
    pub low: f64,
    /// Session volume.
    pub volume: u64,
    /// Close of the previous session.
    pub previous_close: f64,
    /// `price - previous_close`.
    pub change: f64,
    /// `change / previous_close * 100`, zero when undefined.
    pub change_percent: f64,
    /// Trading day the quote belongs to.
    pub latest_trading_day: NaiveDate,
}

impl Quote {
    /// Build a quote from session prices; `change` and `change_percent` are always
    /// derived here so the invariant holds no matter where the prices came from.
    pub fn from_session(symbol: &str, session: SessionPrices, trading_day: NaiveDate) -> Self {
        let change = session.price - session.previous_close;
        Quote {
            symbol: symbol.to_string(),
            price: session.price,
            open: session.open,
            high: session.high,
            low: session.low,
            volume: session.volume,
            previous_close: session.previous_close,
            change,
            change_percent: change_percent(change, session.previous_close),
            latest_trading_day: trading_day,
        }
    }

    /// True when every price field is a finite number.
    pub fn is_finite(&self) -> bool {
        [
            self.price,
            self.open,
            self.high,
            self.low,
            self.previous_close,
            self.change,
            self.change_percent,
        ]
        .iter()
        .all(|v| v.is_finite())
    }
}

/// Call or put.
#[allow(missing_docs)]
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum OptionType {
    Call,
    Put,
}

impl OptionType {
    /// Single-letter code used inside OCC contract symbols.
    pub fn code(self) -> char {
        match self {
            OptionType::Call => 'C',
            OptionType::Put => 'P',
        }
    }

    /// Inverse of [`Self::code`].
    pub fn from_code(code: char) -> Option<Self> {
        match code.to_ascii_uppercase() {
            'C' => Some(OptionType::Call),
            'P' => Some(OptionType::Put),
            _ => None,
        }
    }
}

/// Option sensitivities.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Greeks {
    pub delta: f64,
    pub gamma: f64,
    pub theta: f64,
    pub vega: f64,
    pub rho: f64,
}

/// A single option contract.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionContract {
    /// OCC-style contract identifier.
    pub contract_symbol: String,
    pub strike: f64,
    #[serde(rename = "type")]
    pub option_type: OptionType,
    pub expiration: NaiveDate,
    pub bid: f64,
    pub ask: f64,
    pub volume: u64,
    pub open_interest: u64,
    /// Reported by the upstream feed only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub implied_volatility: Option<f64>,
    /// Present for locally generated contracts; the upstream feed has none.
    #[serde(flatten)]
    pub greeks: Option<Greeks>,
}

/// Underlying price attached to options data.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Underlying {
    pub price: f64,
}

/// Result of an options-data request: a chain, or one requested contract.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionsData {
    pub symbol: String,
    pub options: Vec<OptionContract>,
    pub underlying: Underlying,
}

/// Underlying description attached to a full options chain.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainUnderlying {
    pub symbol: String,
    pub price: f64,
    pub last_updated: DateTime<Utc>,
}

/// Calls and puts for a single expiration.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionsChain {
    pub calls: Vec<OptionContract>,
    pub puts: Vec<OptionContract>,
    pub underlying: ChainUnderlying,
}

/// An available expiration date.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expiration {
    pub date: NaiveDate,
    pub days_to_expiry: i64,
    /// Human readable form, e.g. `Oct 23, 2026`.
    pub formatted: String,
}

impl Expiration {
    /// Describe `date` relative to `today`.
    pub fn new(date: NaiveDate, today: NaiveDate) -> Self {
        Expiration {
            date,
            days_to_expiry: (date - today).num_days(),
            formatted: date.format("%b %-d, %Y").to_string(),
        }
    }
}

/// One OHLCV candle.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    /// Start of the bar, UTC.
    #[serde(rename = "date")]
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Static company profile.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyInfo {
    pub symbol: String,
    pub name: String,
    pub description: String,
    pub sector: String,
    pub industry: String,
    pub exchange: String,
    pub market_cap: u64,
    pub employees: u64,
    pub website: String,
}

/// A news headline about a symbol.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    pub title: String,
    pub url: String,
    pub publisher: String,
    pub published_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}
