//! Upstream market data over the public Yahoo Finance endpoints.
//!
//! [`MarketDataSource`] is the seam between the service and the network: the
//! service only ever talks to the trait, [`YahooClient`] implements it over a
//! blocking `reqwest` client, and tests substitute a scripted source.
//!
//! Endpoints consumed:
//! - `GET /v7/finance/quote?symbols=` — real-time quote (`quoteResponse.result[0]`).
//! - `GET /v8/finance/chart/{symbol}?range=&interval=` — chart samples
//!   (`chart.result[0].{meta, timestamp[], indicators.quote[0]}`).
//! - `GET /v7/finance/options/{symbol}[?date=]` — listed options.
//! - `GET /v1/finance/search?q=&newsCount=` — headlines.
//!
//! Each request is attempted against the Yahoo host first and then, if a relay is
//! configured, once more through it. A payload missing the fields we need counts
//! as a failed attempt, exactly like a transport error.
use chrono::{DateTime, NaiveDate, Utc};
use log::{debug, warn};
use quote_common::model::{NewsItem, OptionContract, OptionType, PriceBar, SessionPrices};
use quote_common::{MarketError, Quote};
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde::Deserialize;
use thiserror::Error;

use crate::config::ServiceConfig;

/// Failure of a single upstream request.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Connection, TLS, timeout or body read failure.
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status.
    #[error("{url} answered with status {status}")]
    Status {
        /// Requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// The body was not the JSON shape we expect.
    #[error("malformed payload: {0}")]
    Malformed(String),

    /// A request URL could not be built.
    #[error("invalid request URL: {0}")]
    Url(String),
}

impl From<FetchError> for MarketError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Malformed(msg) => MarketError::MalformedPayload(msg),
            other => MarketError::Upstream(other.to_string()),
        }
    }
}

/// Provider of raw market data.
pub trait MarketDataSource: Send + Sync {
    /// Current quote for `symbol`.
    fn realtime_quote(&self, symbol: &str) -> Result<Quote, FetchError>;

    /// Chart samples for `symbol` over `range` (`1d`, `30d`, ...) at `interval` (`5m`, `1d`, ...).
    fn chart(&self, symbol: &str, range: &str, interval: &str) -> Result<Chart, FetchError>;

    /// Listed options for `symbol`, nearest expiration unless `expiry` is given.
    fn options(&self, symbol: &str, expiry: Option<NaiveDate>) -> Result<OptionsSnapshot, FetchError>;

    /// Up to `limit` recent headlines about `symbol`.
    fn news(&self, symbol: &str, limit: usize) -> Result<Vec<NewsItem>, FetchError>;
}

/// Chart metadata block.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartMeta {
    /// Last traded price.
    pub regular_market_price: Option<f64>,
    /// Close of the previous session.
    pub previous_close: Option<f64>,
    /// Close before the first sample of the chart range.
    pub chart_previous_close: Option<f64>,
}

/// One chart sample; any price may be missing on illiquid intervals.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartSample {
    /// Unix seconds.
    pub timestamp: i64,
    #[allow(missing_docs)]
    pub open: Option<f64>,
    #[allow(missing_docs)]
    pub high: Option<f64>,
    #[allow(missing_docs)]
    pub low: Option<f64>,
    #[allow(missing_docs)]
    pub close: Option<f64>,
    #[allow(missing_docs)]
    pub volume: Option<f64>,
}

/// Decoded chart response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Chart {
    /// Metadata block.
    pub meta: ChartMeta,
    /// Samples in time order.
    pub samples: Vec<ChartSample>,
}

impl Chart {
    /// Derive a quote from the metadata and the latest sample.
    ///
    /// The price is `meta.regularMarketPrice`, else the latest close; the previous
    /// close is `meta.previousClose`, else `meta.chartPreviousClose`, else zero.
    pub fn latest_quote(&self, symbol: &str, trading_day: NaiveDate) -> Result<Quote, FetchError> {
        let latest = self.samples.last();
        let price = positive(self.meta.regular_market_price)
            .or_else(|| latest.and_then(|s| positive(s.close)))
            .ok_or_else(|| FetchError::Malformed(format!("chart for {symbol} has no price")))?;
        let previous_close = positive(self.meta.previous_close)
            .or_else(|| positive(self.meta.chart_previous_close))
            .unwrap_or(0.0);
        let from_latest = |pick: fn(&ChartSample) -> Option<f64>| {
            latest.and_then(|s| positive(pick(s))).unwrap_or(price)
        };

        let session = SessionPrices {
            price,
            open: from_latest(|s| s.open),
            high: from_latest(|s| s.high),
            low: from_latest(|s| s.low),
            volume: latest.and_then(|s| s.volume).map_or(0, volume),
            previous_close,
        };
        Ok(Quote::from_session(symbol, session, trading_day))
    }

    /// Samples with a positive close, as candles.
    pub fn bars(&self) -> Vec<PriceBar> {
        self.samples
            .iter()
            .filter_map(|s| {
                let close = positive(s.close)?;
                let timestamp = DateTime::<Utc>::from_timestamp(s.timestamp, 0)?;
                Some(PriceBar {
                    timestamp,
                    open: positive(s.open).unwrap_or(close),
                    high: positive(s.high).unwrap_or(close),
                    low: positive(s.low).unwrap_or(close),
                    close,
                    volume: s.volume.map_or(0, volume),
                })
            })
            .collect()
    }
}

/// Listed options for one expiration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptionsSnapshot {
    /// Underlying price reported alongside the chain.
    pub underlying_price: Option<f64>,
    /// Every listed expiration, ascending.
    pub expirations: Vec<NaiveDate>,
    #[allow(missing_docs)]
    pub calls: Vec<OptionContract>,
    #[allow(missing_docs)]
    pub puts: Vec<OptionContract>,
}

/// Yahoo Finance client.
pub struct YahooClient {
    http: Client,
    base_url: String,
    relay_url: Option<String>,
}

impl YahooClient {
    /// Build a client from the HTTP settings of `config`.
    pub fn new(config: &ServiceConfig) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let http = Client::builder()
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .timeout(config.http_timeout)
            .build()?;

        Ok(YahooClient {
            http,
            base_url: config.yahoo_base_url.trim_end_matches('/').to_string(),
            relay_url: config.relay_url.clone(),
        })
    }

    /// URLs tried for `path_and_query`, in order: direct, then relayed.
    pub fn candidate_urls(&self, path_and_query: &str) -> Result<Vec<String>, FetchError> {
        let direct = format!("{}{}", self.base_url, path_and_query);
        let mut urls = Vec::with_capacity(2);
        if let Some(relay) = &self.relay_url {
            let relayed = reqwest::Url::parse_with_params(relay, &[("url", direct.as_str())])
                .map_err(|e| FetchError::Url(e.to_string()))?;
            urls.push(direct);
            urls.push(relayed.to_string());
        } else {
            urls.push(direct);
        }
        Ok(urls)
    }

    fn get_text(&self, url: &str) -> Result<String, FetchError> {
        let response = self.http.get(url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.text()?)
    }

    fn fetch<T, F>(&self, path_and_query: &str, parse: F) -> Result<T, FetchError>
    where
        F: Fn(&str) -> Result<T, FetchError>,
    {
        let mut last_error = None;
        for url in self.candidate_urls(path_and_query)? {
            debug!("GET {}", url);
            match self.get_text(&url).and_then(|body| parse(&body)) {
                Ok(value) => return Ok(value),
                Err(e) => {
                    warn!("Upstream attempt failed for {}: {}", url, e);
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| FetchError::Url(path_and_query.to_string())))
    }
}

impl MarketDataSource for YahooClient {
    fn realtime_quote(&self, symbol: &str) -> Result<Quote, FetchError> {
        let path = format!("/v7/finance/quote?symbols={}", encode_symbol(symbol));
        let today = Utc::now().date_naive();
        self.fetch(&path, |body| parse_quote_response(body, symbol, today))
    }

    fn chart(&self, symbol: &str, range: &str, interval: &str) -> Result<Chart, FetchError> {
        let path = format!(
            "/v8/finance/chart/{}?range={}&interval={}",
            encode_symbol(symbol),
            range,
            interval
        );
        self.fetch(&path, parse_chart)
    }

    fn options(&self, symbol: &str, expiry: Option<NaiveDate>) -> Result<OptionsSnapshot, FetchError> {
        let mut path = format!("/v7/finance/options/{}", encode_symbol(symbol));
        if let Some(date) = expiry {
            let ts = date.and_time(chrono::NaiveTime::MIN).and_utc().timestamp();
            path.push_str(&format!("?date={}", ts));
        }
        self.fetch(&path, parse_options)
    }

    fn news(&self, symbol: &str, limit: usize) -> Result<Vec<NewsItem>, FetchError> {
        let path = format!(
            "/v1/finance/search?q={}&newsCount={}&quotesCount=0",
            encode_symbol(symbol),
            limit
        );
        let mut items = self.fetch(&path, parse_news)?;
        items.truncate(limit);
        Ok(items)
    }
}

/// Percent-encode everything in `symbol` except alphanumerics, `.` and `-`.
pub fn encode_symbol(symbol: &str) -> String {
    let mut out = String::with_capacity(symbol.len());
    for b in symbol.bytes() {
        if b.is_ascii_alphanumeric() || b == b'.' || b == b'-' {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{:02X}", b));
        }
    }
    out
}

fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}

fn volume(raw: f64) -> u64 {
    if raw.is_finite() && raw > 0.0 { raw as u64 } else { 0 }
}

fn malformed(err: serde_json::Error) -> FetchError {
    FetchError::Malformed(err.to_string())
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteEnvelope {
    quote_response: QuoteResponseBody,
}

#[derive(Debug, Deserialize)]
struct QuoteResponseBody {
    result: Option<Vec<QuoteRow>>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteRow {
    regular_market_price: Option<f64>,
    ask: Option<f64>,
    bid: Option<f64>,
    regular_market_open: Option<f64>,
    regular_market_day_high: Option<f64>,
    regular_market_day_low: Option<f64>,
    regular_market_volume: Option<f64>,
    regular_market_previous_close: Option<f64>,
}

/// Decode a v7 quote body into a quote for `symbol`.
pub fn parse_quote_response(body: &str, symbol: &str, trading_day: NaiveDate) -> Result<Quote, FetchError> {
    let envelope: QuoteEnvelope = serde_json::from_str(body).map_err(malformed)?;
    if let Some(err) = envelope.quote_response.error {
        return Err(FetchError::Malformed(format!("{}: {}", err.code, err.description)));
    }
    let row = envelope
        .quote_response
        .result
        .and_then(|rows| rows.into_iter().next())
        .ok_or_else(|| FetchError::Malformed(format!("no quote returned for {symbol}")))?;

    let price = positive(row.regular_market_price)
        .or_else(|| positive(row.ask))
        .or_else(|| positive(row.bid))
        .ok_or_else(|| FetchError::Malformed(format!("quote for {symbol} has no price")))?;

    let session = SessionPrices {
        price,
        open: positive(row.regular_market_open).unwrap_or(price),
        high: positive(row.regular_market_day_high).unwrap_or(price),
        low: positive(row.regular_market_day_low).unwrap_or(price),
        volume: row.regular_market_volume.map_or(0, volume),
        previous_close: positive(row.regular_market_previous_close).unwrap_or(0.0),
    };
    Ok(Quote::from_session(symbol, session, trading_day))
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<RawChart>>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct RawChart {
    #[serde(default)]
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    #[serde(default)]
    indicators: RawIndicators,
}

#[derive(Debug, Default, Deserialize)]
struct RawIndicators {
    #[serde(default)]
    quote: Vec<RawSeries>,
}

#[derive(Debug, Default, Deserialize)]
struct RawSeries {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

/// Decode a v8 chart body.
pub fn parse_chart(body: &str) -> Result<Chart, FetchError> {
    let envelope: ChartEnvelope = serde_json::from_str(body).map_err(malformed)?;
    if let Some(err) = envelope.chart.error {
        return Err(FetchError::Malformed(format!("{}: {}", err.code, err.description)));
    }
    let raw = envelope
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| FetchError::Malformed("empty chart result".to_string()))?;

    let series = raw.indicators.quote.into_iter().next().unwrap_or_default();
    let at = |values: &[Option<f64>], i: usize| values.get(i).copied().flatten();
    let samples = raw
        .timestamp
        .iter()
        .enumerate()
        .map(|(i, &timestamp)| ChartSample {
            timestamp,
            open: at(&series.open, i),
            high: at(&series.high, i),
            low: at(&series.low, i),
            close: at(&series.close, i),
            volume: at(&series.volume, i),
        })
        .collect();

    Ok(Chart {
        meta: raw.meta,
        samples,
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OptionsEnvelope {
    option_chain: OptionChainBody,
}

#[derive(Debug, Deserialize)]
struct OptionChainBody {
    result: Option<Vec<RawOptionResult>>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawOptionResult {
    #[serde(default)]
    expiration_dates: Vec<i64>,
    quote: Option<RawUnderlying>,
    #[serde(default)]
    options: Vec<RawOptionSet>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawUnderlying {
    regular_market_price: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawOptionSet {
    #[serde(default)]
    calls: Vec<RawContract>,
    #[serde(default)]
    puts: Vec<RawContract>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawContract {
    contract_symbol: String,
    strike: f64,
    bid: Option<f64>,
    ask: Option<f64>,
    volume: Option<f64>,
    open_interest: Option<f64>,
    expiration: i64,
    implied_volatility: Option<f64>,
}

fn unix_date(ts: i64) -> Option<NaiveDate> {
    DateTime::<Utc>::from_timestamp(ts, 0).map(|dt| dt.date_naive())
}

fn listed_contracts(raw: Vec<RawContract>, option_type: OptionType) -> Vec<OptionContract> {
    raw.into_iter()
        .filter_map(|c| {
            Some(OptionContract {
                expiration: unix_date(c.expiration)?,
                contract_symbol: c.contract_symbol,
                strike: c.strike,
                option_type,
                bid: c.bid.unwrap_or(0.0),
                ask: c.ask.unwrap_or(0.0),
                volume: c.volume.map_or(0, volume),
                open_interest: c.open_interest.map_or(0, volume),
                implied_volatility: c.implied_volatility,
                greeks: None,
            })
        })
        .collect()
}

/// Decode a v7 options body.
pub fn parse_options(body: &str) -> Result<OptionsSnapshot, FetchError> {
    let envelope: OptionsEnvelope = serde_json::from_str(body).map_err(malformed)?;
    if let Some(err) = envelope.option_chain.error {
        return Err(FetchError::Malformed(format!("{}: {}", err.code, err.description)));
    }
    let raw = envelope
        .option_chain
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| FetchError::Malformed("empty option chain result".to_string()))?;

    let mut expirations: Vec<NaiveDate> = raw.expiration_dates.iter().filter_map(|&ts| unix_date(ts)).collect();
    expirations.sort();
    expirations.dedup();

    let (calls, puts) = match raw.options.into_iter().next() {
        Some(set) => (
            listed_contracts(set.calls, OptionType::Call),
            listed_contracts(set.puts, OptionType::Put),
        ),
        None => (Vec::new(), Vec::new()),
    };

    Ok(OptionsSnapshot {
        underlying_price: raw.quote.and_then(|q| positive(q.regular_market_price)),
        expirations,
        calls,
        puts,
    })
}

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    news: Option<Vec<RawNews>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawNews {
    title: String,
    link: String,
    publisher: Option<String>,
    provider_publish_time: Option<i64>,
}

/// Decode the news section of a v1 search body.
pub fn parse_news(body: &str) -> Result<Vec<NewsItem>, FetchError> {
    let envelope: SearchEnvelope = serde_json::from_str(body).map_err(malformed)?;
    let raw = envelope
        .news
        .ok_or_else(|| FetchError::Malformed("search result without news".to_string()))?;
    Ok(raw
        .into_iter()
        .filter_map(|n| {
            Some(NewsItem {
                published_at: DateTime::<Utc>::from_timestamp(n.provider_publish_time?, 0)?,
                title: n.title,
                url: n.link,
                publisher: n.publisher.unwrap_or_default(),
                summary: None,
            })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    const CHART_BODY: &str = r#"{
        "chart": {
            "result": [{
                "meta": {"regularMarketPrice": 150.5, "previousClose": 148.5, "chartPreviousClose": 148.5},
                "indicators": {"quote": [{
                    "open": [148.5], "high": [151.0], "low": [148.0], "close": [150.5], "volume": [1000000]
                }]},
                "timestamp": [1234567890]
            }],
            "error": null
        }
    }"#;

    #[test]
    fn test_chart_quote_derivation() {
        let chart = parse_chart(CHART_BODY).unwrap();
        let quote = chart.latest_quote("AAPL", day()).unwrap();
        assert_eq!(quote.symbol, "AAPL");
        assert_eq!(quote.price, 150.5);
        assert_eq!(quote.previous_close, 148.5);
        assert!((quote.change - 2.0).abs() < 1e-9);
        assert!((quote.change_percent - 1.347).abs() < 1e-3);
        assert_eq!(quote.open, 148.5);
        assert_eq!(quote.high, 151.0);
        assert_eq!(quote.volume, 1_000_000);
    }

    #[test]
    fn test_chart_with_sparse_series() {
        let body = r#"{"chart":{"result":[{"meta":{"regularMarketPrice":150},
            "indicators":{"quote":[{"close":[150]}]},"timestamp":[1234567890]}]}}"#;
        let chart = parse_chart(body).unwrap();
        let quote = chart.latest_quote("AAPL", day()).unwrap();
        assert_eq!(quote.price, 150.0);
        assert_eq!(quote.open, 150.0);
        assert_eq!(quote.previous_close, 0.0);
        assert_eq!(quote.change_percent, 0.0);
    }

    #[test]
    fn test_chart_falls_back_to_latest_close() {
        let body = r#"{"chart":{"result":[{"meta":{"chartPreviousClose":10},
            "indicators":{"quote":[{"close":[11, null, 12]}]},"timestamp":[1,2,3]}]}}"#;
        let quote = parse_chart(body).unwrap().latest_quote("X", day()).unwrap();
        assert_eq!(quote.price, 12.0);
        assert_eq!(quote.previous_close, 10.0);
    }

    #[test]
    fn test_chart_without_price_is_malformed() {
        let body = r#"{"chart":{"result":[{"meta":{},"indicators":{"quote":[{}]}}]}}"#;
        let chart = parse_chart(body).unwrap();
        assert!(matches!(chart.latest_quote("X", day()), Err(FetchError::Malformed(_))));
    }

    #[test]
    fn test_chart_error_and_garbage_are_malformed() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found"}}}"#;
        assert!(matches!(parse_chart(body), Err(FetchError::Malformed(_))));
        assert!(matches!(parse_chart("<html>"), Err(FetchError::Malformed(_))));
    }

    #[test]
    fn test_chart_bars_drop_empty_closes() {
        let body = r#"{"chart":{"result":[{"meta":{},
            "indicators":{"quote":[{"open":[1,2,3],"high":[1,2,3],"low":[1,2,3],"close":[1,null,0],"volume":[5,6,7]}]},
            "timestamp":[1700000000,1700086400,1700172800]}]}}"#;
        let bars = parse_chart(body).unwrap().bars();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].close, 1.0);
        assert_eq!(bars[0].volume, 5);
    }

    #[test]
    fn test_quote_response_ignores_upstream_change() {
        let body = r#"{"quoteResponse":{"result":[{
            "symbol":"AAPL","regularMarketPrice":150.5,"regularMarketPreviousClose":148.5,
            "regularMarketChange":99,"regularMarketOpen":149,"regularMarketDayHigh":151,
            "regularMarketDayLow":148,"regularMarketVolume":1200}],"error":null}}"#;
        let quote = parse_quote_response(body, "AAPL", day()).unwrap();
        assert!((quote.change - 2.0).abs() < 1e-9);
        assert_eq!(quote.volume, 1200);
        assert_eq!(quote.latest_trading_day, day());
    }

    #[test]
    fn test_quote_response_uses_ask_when_no_market_price() {
        let body = r#"{"quoteResponse":{"result":[{"ask":10.5,"bid":10.4}]}}"#;
        let quote = parse_quote_response(body, "X", day()).unwrap();
        assert_eq!(quote.price, 10.5);
    }

    #[test]
    fn test_quote_response_empty_is_malformed() {
        let body = r#"{"quoteResponse":{"result":[],"error":null}}"#;
        assert!(matches!(
            parse_quote_response(body, "X", day()),
            Err(FetchError::Malformed(_))
        ));
    }

    #[test]
    fn test_options_snapshot() {
        let body = r#"{"optionChain":{"result":[{
            "expirationDates":[1792108800,1791504000],
            "quote":{"regularMarketPrice":150.0},
            "options":[{
                "calls":[{"contractSymbol":"AAPL261016C00150000","strike":150,"bid":2.1,"ask":2.3,
                          "volume":10,"openInterest":100,"expiration":1791504000,"impliedVolatility":0.3}],
                "puts":[{"contractSymbol":"AAPL261016P00150000","strike":150,"expiration":1791504000}]
            }]}],"error":null}}"#;
        let snapshot = parse_options(body).unwrap();
        assert_eq!(snapshot.underlying_price, Some(150.0));
        assert_eq!(snapshot.expirations.len(), 2);
        assert!(snapshot.expirations[0] < snapshot.expirations[1]);
        assert_eq!(snapshot.calls[0].option_type, OptionType::Call);
        assert_eq!(snapshot.calls[0].implied_volatility, Some(0.3));
        assert_eq!(snapshot.puts[0].bid, 0.0);
        assert!(snapshot.puts[0].greeks.is_none());
    }

    #[test]
    fn test_news_items() {
        let body = r#"{"news":[
            {"title":"Apple beats","link":"https://example.com/a","publisher":"Wire","providerPublishTime":1700000000},
            {"title":"No time","link":"https://example.com/b"}
        ]}"#;
        let items = parse_news(body).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].publisher, "Wire");
        assert_eq!(items[0].published_at.timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_encode_symbol() {
        assert_eq!(encode_symbol("AAPL"), "AAPL");
        assert_eq!(encode_symbol("BRK.B"), "BRK.B");
        assert_eq!(encode_symbol("^GSPC"), "%5EGSPC");
        assert_eq!(encode_symbol("EURUSD=X"), "EURUSD%3DX");
    }

    #[test]
    fn test_candidate_urls_add_relay() {
        let client = YahooClient::new(&ServiceConfig::default()).unwrap();
        let urls = client.candidate_urls("/v7/finance/quote?symbols=AAPL").unwrap();
        assert_eq!(urls[0], "https://query1.finance.yahoo.com/v7/finance/quote?symbols=AAPL");
        assert_eq!(
            urls[1],
            "https://api.allorigins.win/raw?url=https%3A%2F%2Fquery1.finance.yahoo.com%2Fv7%2Ffinance%2Fquote%3Fsymbols%3DAAPL"
        );

        let config = ServiceConfig {
            relay_url: None,
            ..ServiceConfig::default()
        };
        let client = YahooClient::new(&config).unwrap();
        assert_eq!(client.candidate_urls("/x").unwrap().len(), 1);
    }

    #[test]
    fn test_fetch_error_maps_to_market_error() {
        let err: MarketError = FetchError::Malformed("bad".into()).into();
        assert!(matches!(err, MarketError::MalformedPayload(_)));
        let err: MarketError = FetchError::Status {
            url: "u".into(),
            status: 503,
        }
        .into();
        assert!(matches!(err, MarketError::Upstream(_)));
    }
}
