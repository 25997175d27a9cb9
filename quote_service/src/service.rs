//! The stock data facade.
//!
//! [`StockDataService`] is what front-ends talk to. Every read is best effort:
//! quotes, history and news always come back with *something*, falling back to
//! generated data when upstream is unavailable. Only the options operations can
//! fail, and only for an underlying price that cannot anchor a strike ladder.
//!
//! Quote reads go through a quote desk: a TTL cache in front of the fallback
//! resolver, with a per-symbol gate so concurrent misses for one symbol cost a
//! single upstream resolution.
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::thread;

use chrono::{NaiveDate, Utc};
use log::{debug, error, warn};
use quote_common::model::{
    ChainUnderlying, CompanyInfo, Expiration, NewsItem, OptionContract, OptionsChain, OptionsData,
    PriceBar, Underlying,
};
use quote_common::{MarketError, Quote, Result, Ticker};

use crate::cache::{Clock, SystemClock, TtlCache};
use crate::company::company_info;
use crate::config::ServiceConfig;
use crate::options::{generate_chain, generate_contract, generate_ladder, next_friday, next_fridays};
use crate::registry::{QuoteFeed, Subscription, SubscriptionRegistry};
use crate::resolver::{FallbackResolver, ResolveContext, ResolvedQuote};
use crate::sync::lock;
use crate::synthetic::{MAX_HISTORY_DAYS, synthetic_history, synthetic_intraday, synthetic_news, synthetic_quote};
use crate::upstream::{MarketDataSource, YahooClient};

/// Expirations offered when upstream lists none.
pub const FALLBACK_EXPIRATIONS: usize = 4;

fn normalize(symbol: &str) -> String {
    symbol.trim().to_ascii_uppercase()
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

struct QuoteDesk {
    resolver: FallbackResolver,
    quotes: Mutex<TtlCache<Quote>>,
    in_flight: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl QuoteDesk {
    fn gate(&self, symbol: &str) -> Arc<Mutex<()>> {
        Arc::clone(lock(&self.in_flight).entry(symbol.to_string()).or_default())
    }

    /// Cached quote if fresh, otherwise one resolution shared by concurrent callers.
    fn quote(&self, symbol: &str) -> Quote {
        if let Some(quote) = lock(&self.quotes).get(symbol) {
            debug!("Cache hit for {}", symbol);
            return quote;
        }
        let gate = self.gate(symbol);
        let _guard = lock(&gate);
        // another caller may have refreshed it while we waited
        if let Some(quote) = lock(&self.quotes).get(symbol) {
            return quote;
        }
        self.refresh(symbol)
    }

    /// Resolve past the cache; used by pollers, which want a new quote every tick.
    fn poll(&self, symbol: &str) -> Quote {
        let gate = self.gate(symbol);
        let _guard = lock(&gate);
        self.refresh(symbol)
    }

    fn refresh(&self, symbol: &str) -> Quote {
        let stale = lock(&self.quotes).get_stale(symbol);
        let ctx = ResolveContext {
            symbol,
            stale: stale.as_ref(),
            today: today(),
        };
        match self.resolver.resolve(&ctx) {
            Some(ResolvedQuote { quote, origin }) => {
                if origin.is_fresh() {
                    lock(&self.quotes).put(symbol, quote.clone());
                }
                quote
            }
            None => synthetic_quote(symbol, ctx.today, &mut rand::rng()),
        }
    }
}

/// Cached, failure-tolerant access to quotes, options, history, company data and
/// news, plus polling subscriptions.
///
/// Construct one per process (or per test) and share it by reference or `Arc`.
pub struct StockDataService {
    config: ServiceConfig,
    source: Arc<dyn MarketDataSource>,
    desk: Arc<QuoteDesk>,
    options_cache: Mutex<TtlCache<OptionsData>>,
    chain_cache: Mutex<TtlCache<OptionsChain>>,
    expirations_cache: Mutex<TtlCache<Vec<NaiveDate>>>,
    registry: SubscriptionRegistry,
}

impl StockDataService {
    /// Service backed by Yahoo Finance.
    pub fn new(config: ServiceConfig) -> Result<Self> {
        let source = Arc::new(YahooClient::new(&config)?);
        Ok(Self::with_source(config, source, Arc::new(SystemClock)))
    }

    /// Service backed by an arbitrary source and clock.
    pub fn with_source(config: ServiceConfig, source: Arc<dyn MarketDataSource>, clock: Arc<dyn Clock>) -> Self {
        let desk = Arc::new(QuoteDesk {
            resolver: FallbackResolver::standard(Arc::clone(&source)),
            quotes: Mutex::new(TtlCache::new(config.quote_ttl, Arc::clone(&clock))),
            in_flight: Mutex::new(HashMap::new()),
        });

        let feed_desk = Arc::clone(&desk);
        let feed: QuoteFeed = Arc::new(move |symbol: &str| feed_desk.poll(symbol));

        StockDataService {
            options_cache: Mutex::new(TtlCache::new(config.options_ttl, Arc::clone(&clock))),
            chain_cache: Mutex::new(TtlCache::new(config.options_ttl, Arc::clone(&clock))),
            expirations_cache: Mutex::new(TtlCache::new(config.options_ttl, clock)),
            registry: SubscriptionRegistry::new(feed, config.poll_interval),
            config,
            source,
            desk,
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Registry behind [`Self::subscribe`].
    pub fn registry(&self) -> &SubscriptionRegistry {
        &self.registry
    }

    /// Current quote for `symbol`; never fails.
    pub fn get_stock_quote(&self, symbol: &str) -> Quote {
        self.desk.quote(&normalize(symbol))
    }

    /// Quotes for [`Ticker::POPULAR`], fetched concurrently.
    pub fn get_popular_stocks(&self) -> Vec<Quote> {
        self.quotes_for(&Ticker::POPULAR)
    }

    /// Quotes for the index funds in [`Ticker::INDICES`], fetched concurrently.
    pub fn get_market_indices(&self) -> Vec<Quote> {
        self.quotes_for(&Ticker::INDICES)
    }

    fn quotes_for(&self, tickers: &[Ticker]) -> Vec<Quote> {
        thread::scope(|scope| {
            let handles: Vec<_> = tickers
                .iter()
                .map(|ticker| {
                    let symbol = ticker.to_string();
                    scope.spawn(move || self.get_stock_quote(&symbol))
                })
                .collect();

            handles
                .into_iter()
                .zip(tickers)
                .map(|(handle, ticker)| {
                    handle.join().unwrap_or_else(|_| {
                        error!("Quote worker for {} panicked", ticker);
                        synthetic_quote(&ticker.to_string(), today(), &mut rand::rng())
                    })
                })
                .collect()
        })
    }

    fn anchor_price(&self, symbol: &str) -> Result<f64> {
        let price = self.get_stock_quote(symbol).price;
        if price.is_finite() && price > 0.0 {
            Ok(price)
        } else {
            Err(MarketError::DegenerateUnderlying {
                symbol: symbol.to_string(),
                price,
            })
        }
    }

    /// Generated options around the current quote: the next-Friday chain, or the
    /// single contract named by `specific_contract`. Results are cached per
    /// symbol and contract.
    pub fn get_options_data(&self, symbol: &str, specific_contract: Option<&str>) -> Result<OptionsData> {
        let symbol = normalize(symbol);
        let key = match specific_contract {
            Some(contract) => format!("{symbol}#{contract}"),
            None => symbol.clone(),
        };
        if let Some(data) = lock(&self.options_cache).get(&key) {
            debug!("Options cache hit for {}", key);
            return Ok(data);
        }

        let price = self.anchor_price(&symbol)?;
        let today = today();
        let mut rng = rand::rng();
        let options = match specific_contract {
            Some(contract) => vec![generate_contract(contract, price, today, &mut rng)],
            None => generate_chain(&symbol, next_friday(today), price, &mut rng),
        };

        let data = OptionsData {
            symbol,
            options,
            underlying: Underlying { price },
        };
        lock(&self.options_cache).put(&key, data.clone());
        Ok(data)
    }

    /// Listed chain for `expiry` (nearest if `None`), keeping the `limit` strikes
    /// closest to the money on each side. Falls back to a generated ladder.
    /// Results are cached per symbol, expiry and limit.
    pub fn get_options_chain(&self, symbol: &str, expiry: Option<NaiveDate>, limit: usize) -> Result<OptionsChain> {
        let symbol = normalize(symbol);
        let key = match expiry {
            Some(date) => format!("{symbol}#{date}#{limit}"),
            None => format!("{symbol}#all#{limit}"),
        };
        if let Some(chain) = lock(&self.chain_cache).get(&key) {
            debug!("Options chain cache hit for {}", key);
            return Ok(chain);
        }

        let chain = self.fetch_chain(symbol, expiry, limit)?;
        lock(&self.chain_cache).put(&key, chain.clone());
        Ok(chain)
    }

    fn fetch_chain(&self, symbol: String, expiry: Option<NaiveDate>, limit: usize) -> Result<OptionsChain> {
        match self.source.options(&symbol, expiry) {
            Ok(snapshot) if !snapshot.calls.is_empty() || !snapshot.puts.is_empty() => {
                let price = match snapshot.underlying_price {
                    Some(price) => price,
                    None => self.anchor_price(&symbol)?,
                };
                Ok(OptionsChain {
                    calls: nearest_strikes(snapshot.calls, price, limit),
                    puts: nearest_strikes(snapshot.puts, price, limit),
                    underlying: ChainUnderlying {
                        symbol,
                        price,
                        last_updated: Utc::now(),
                    },
                })
            }
            Ok(_) => {
                warn!("Options endpoint listed no contracts for {}", symbol);
                self.generated_chain(symbol, expiry, limit)
            }
            Err(e) => {
                warn!("Options chain for {} failed: {}", symbol, e);
                self.generated_chain(symbol, expiry, limit)
            }
        }
    }

    fn generated_chain(&self, symbol: String, expiry: Option<NaiveDate>, limit: usize) -> Result<OptionsChain> {
        let price = self.anchor_price(&symbol)?;
        let expiration = expiry.unwrap_or_else(|| next_friday(today()));
        let (calls, puts) = generate_ladder(&symbol, expiration, price, limit, &mut rand::rng());
        Ok(OptionsChain {
            calls,
            puts,
            underlying: ChainUnderlying {
                symbol,
                price,
                last_updated: Utc::now(),
            },
        })
    }

    /// Upcoming expirations; the next Fridays if upstream lists none.
    pub fn get_options_expirations(&self, symbol: &str) -> Vec<Expiration> {
        let symbol = normalize(symbol);
        let today = today();
        let cached = lock(&self.expirations_cache).get(&symbol);
        let listed = match cached {
            Some(dates) => dates,
            None => match self.source.options(&symbol, None) {
                Ok(snapshot) => {
                    lock(&self.expirations_cache).put(&symbol, snapshot.expirations.clone());
                    snapshot.expirations
                }
                Err(e) => {
                    warn!("Options expirations for {} failed: {}", symbol, e);
                    Vec::new()
                }
            },
        };

        let mut dates: Vec<NaiveDate> = listed.into_iter().filter(|date| *date >= today).collect();
        if dates.is_empty() {
            dates = next_fridays(today, FALLBACK_EXPIRATIONS);
        }
        dates.into_iter().map(|date| Expiration::new(date, today)).collect()
    }

    /// Daily candles for the last `days` days (five-minute bars when `days == 1`),
    /// at most [`MAX_HISTORY_DAYS`].
    ///
    /// Falls back to a random walk ending at the current quote price: today's
    /// session in five-minute bars for one day, daily bars otherwise.
    pub fn get_historical_prices(&self, symbol: &str, days: u32) -> Vec<PriceBar> {
        if days == 0 {
            return Vec::new();
        }
        let days = days.min(MAX_HISTORY_DAYS);
        let symbol = normalize(symbol);
        let interval = if days == 1 { "5m" } else { "1d" };
        match self.source.chart(&symbol, &format!("{days}d"), interval) {
            Ok(chart) => {
                let bars = chart.bars();
                if !bars.is_empty() {
                    return bars;
                }
                warn!("Chart for {} has no usable bars", symbol);
            }
            Err(e) => warn!("History for {} failed: {}", symbol, e),
        }

        let anchor = self.get_stock_quote(&symbol).price;
        if days == 1 {
            synthetic_intraday(anchor, Utc::now(), &mut rand::rng())
        } else {
            synthetic_history(anchor, days, today(), &mut rand::rng())
        }
    }

    /// Static company profile.
    pub fn get_company_info(&self, symbol: &str) -> CompanyInfo {
        company_info(symbol)
    }

    /// Up to `limit` headlines; generated ones if the search endpoint fails.
    pub fn get_company_news(&self, symbol: &str, limit: usize) -> Vec<NewsItem> {
        if limit == 0 {
            return Vec::new();
        }
        let symbol = normalize(symbol);
        match self.source.news(&symbol, limit) {
            Ok(mut items) => {
                items.truncate(limit);
                items
            }
            Err(e) => {
                warn!("News for {} failed: {}", symbol, e);
                synthetic_news(&symbol, limit, Utc::now())
            }
        }
    }

    /// Poll `symbol` every [`ServiceConfig::poll_interval`] and pass each quote to
    /// `listener` until the returned [`Subscription`] is dropped or unsubscribed.
    pub fn subscribe<F>(&self, symbol: &str, listener: F) -> Subscription
    where
        F: Fn(&Quote) + Send + Sync + 'static,
    {
        self.registry.subscribe(symbol, listener)
    }

    /// Stop every poller.
    pub fn shutdown(&self) {
        self.registry.shutdown();
    }
}

fn nearest_strikes(mut contracts: Vec<OptionContract>, price: f64, limit: usize) -> Vec<OptionContract> {
    contracts.sort_by(|a, b| (a.strike - price).abs().total_cmp(&(b.strike - price).abs()));
    contracts.truncate(limit);
    contracts.sort_by(|a, b| a.strike.total_cmp(&b.strike));
    contracts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use crate::test_support::{ScriptedSource, session};
    use crate::upstream::{Chart, ChartMeta, ChartSample, OptionsSnapshot};
    use chrono::Duration as ChronoDuration;
    use quote_common::model::OptionType;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, Instant};

    fn config() -> ServiceConfig {
        ServiceConfig {
            poll_interval: Duration::from_millis(20),
            ..ServiceConfig::default()
        }
    }

    fn new_service(source: ScriptedSource) -> (StockDataService, Arc<ScriptedSource>, Arc<ManualClock>) {
        let source = Arc::new(source);
        let clock = Arc::new(ManualClock::new());
        let service = StockDataService::with_source(config(), source.clone(), clock.clone());
        (service, source, clock)
    }

    fn contract(strike: f64, option_type: OptionType) -> OptionContract {
        OptionContract {
            contract_symbol: format!("AAPL261023{}{:08}", option_type.code(), (strike * 1000.0) as u64),
            strike,
            option_type,
            expiration: today() + ChronoDuration::days(7),
            bid: 1.0,
            ask: 1.2,
            volume: 1,
            open_interest: 1,
            implied_volatility: Some(0.3),
            greeks: None,
        }
    }

    #[test]
    fn test_change_invariant() {
        let (service, _, _) = new_service(ScriptedSource::with_quote(150.5, 148.5));
        for symbol in ["AAPL", "msft", " tsla "] {
            let quote = service.get_stock_quote(symbol);
            assert_eq!(quote.symbol, symbol.trim().to_ascii_uppercase());
            assert!((quote.change - (quote.price - quote.previous_close)).abs() < 1e-9);
            assert!((quote.change_percent - 1.3468).abs() < 1e-3);
        }
    }

    #[test]
    fn test_cache_hit_and_expiry() {
        let (service, source, clock) = new_service(ScriptedSource::with_quote(150.5, 148.5));
        service.get_stock_quote("AAPL");
        service.get_stock_quote("aapl");
        assert_eq!(source.quote_calls(), 1);

        clock.advance(Duration::from_secs(31));
        service.get_stock_quote("AAPL");
        assert_eq!(source.quote_calls(), 2);
    }

    #[test]
    fn test_concurrent_misses_share_one_fetch() {
        let (service, source, _) = new_service(ScriptedSource::with_quote(10.0, 9.0).delayed(Duration::from_millis(50)));
        thread::scope(|scope| {
            for _ in 0..5 {
                scope.spawn(|| service.get_stock_quote("AAPL"));
            }
        });
        assert_eq!(source.quote_calls(), 1);
    }

    #[test]
    fn test_failing_upstream_still_answers() {
        let (service, source, _) = new_service(ScriptedSource::failing());
        let quote = service.get_stock_quote("ANY");
        assert_eq!(quote.symbol, "ANY");
        assert!(quote.is_finite());
        assert!(quote.price > 0.0);

        // synthetic quotes are not cached
        service.get_stock_quote("ANY");
        assert_eq!(source.quote_calls(), 2);
    }

    #[test]
    fn test_stale_quote_served_but_not_refreshed() {
        let (service, source, clock) = new_service(ScriptedSource::with_quote(150.5, 148.5));
        let fresh = service.get_stock_quote("AAPL");

        source.fail(503);
        clock.advance(Duration::from_secs(31));
        assert_eq!(service.get_stock_quote("AAPL"), fresh);
        assert_eq!(service.get_stock_quote("AAPL"), fresh);
        assert_eq!(source.quote_calls(), 3);

        source.recover();
        source.set_quote(session(160.0, 150.0));
        assert_eq!(service.get_stock_quote("AAPL").price, 160.0);
    }

    #[test]
    fn test_chart_fallback_is_cached() {
        let source = ScriptedSource::new();
        source.set_chart(Chart {
            meta: ChartMeta {
                regular_market_price: Some(150.5),
                previous_close: Some(148.5),
                chart_previous_close: None,
            },
            samples: Vec::new(),
        });
        let (service, source, _) = new_service(source);
        assert_eq!(service.get_stock_quote("AAPL").price, 150.5);
        service.get_stock_quote("AAPL");
        assert_eq!(source.chart_calls(), 1);
    }

    #[test]
    fn test_options_chain_data() {
        let (service, source, _) = new_service(ScriptedSource::with_quote(150.0, 149.0));
        let data = service.get_options_data("aapl", None).unwrap();
        assert_eq!(data.symbol, "AAPL");
        assert_eq!(data.options.len(), 10);
        assert!(
            data.options
                .iter()
                .all(|c| matches!(c.option_type, OptionType::Call | OptionType::Put))
        );
        assert_eq!(data.underlying.price, 150.0);
        assert!(data.options.iter().all(|c| c.expiration == next_friday(today())));

        let again = service.get_options_data("AAPL", None).unwrap();
        assert_eq!(again, data);
        assert_eq!(source.quote_calls(), 1);
    }

    #[test]
    fn test_specific_contract() {
        let (service, _, _) = new_service(ScriptedSource::with_quote(150.0, 149.0));
        let data = service.get_options_data("AAPL", Some("AAPL261023C00155000")).unwrap();
        assert_eq!(data.options.len(), 1);
        assert_eq!(data.options[0].contract_symbol, "AAPL261023C00155000");
        assert_eq!(data.options[0].strike, 155.0);

        // cached separately from the chain
        let chain = service.get_options_data("AAPL", None).unwrap();
        assert_eq!(chain.options.len(), 10);
    }

    #[test]
    fn test_degenerate_underlying_is_rejected() {
        let (service, _, _) = new_service(ScriptedSource::with_quote(0.0, 10.0));
        let err = service.get_options_data("ZERO", None).unwrap_err();
        assert!(matches!(err, MarketError::DegenerateUnderlying { price, .. } if price == 0.0));
        assert!(service.get_options_chain("ZERO", None, 10).is_err());
    }

    #[test]
    fn test_listed_chain_keeps_nearest_strikes() {
        let source = ScriptedSource::with_quote(150.0, 149.0);
        source.set_options(OptionsSnapshot {
            underlying_price: Some(150.0),
            expirations: vec![today() + ChronoDuration::days(7)],
            calls: [100.0, 140.0, 150.0, 160.0, 200.0]
                .map(|k| contract(k, OptionType::Call))
                .to_vec(),
            puts: vec![contract(150.0, OptionType::Put)],
        });
        let (service, _, _) = new_service(source);
        let chain = service.get_options_chain("AAPL", None, 3).unwrap();
        let strikes: Vec<f64> = chain.calls.iter().map(|c| c.strike).collect();
        assert_eq!(strikes, vec![140.0, 150.0, 160.0]);
        assert_eq!(chain.puts.len(), 1);
        assert_eq!(chain.underlying.price, 150.0);
    }

    #[test]
    fn test_chain_falls_back_to_ladder() {
        let (service, source, _) = new_service(ScriptedSource::with_quote(101.0, 100.0));
        let chain = service.get_options_chain("IBM", None, 4).unwrap();
        assert_eq!(source.options_calls(), 1);
        let strikes: Vec<f64> = chain.calls.iter().map(|c| c.strike).collect();
        assert_eq!(strikes, vec![90.0, 95.0, 100.0, 105.0, 110.0]);
        assert_eq!(chain.puts.len(), 5);
        assert_eq!(chain.underlying.symbol, "IBM");
    }

    #[test]
    fn test_options_chain_is_cached() {
        let (service, source, clock) = new_service(ScriptedSource::with_quote(101.0, 100.0));
        let first = service.get_options_chain("IBM", None, 4).unwrap();
        let second = service.get_options_chain("ibm", None, 4).unwrap();
        assert_eq!(first, second);
        assert_eq!(source.options_calls(), 1);

        service.get_options_chain("IBM", None, 6).unwrap();
        service.get_options_chain("IBM", Some(today() + ChronoDuration::days(14)), 4).unwrap();
        assert_eq!(source.options_calls(), 3);

        clock.advance(Duration::from_secs(31));
        service.get_options_chain("IBM", None, 4).unwrap();
        assert_eq!(source.options_calls(), 4);
    }

    #[test]
    fn test_expirations_are_cached() {
        let source = ScriptedSource::new();
        source.set_options(OptionsSnapshot {
            expirations: vec![today() + ChronoDuration::days(7)],
            ..OptionsSnapshot::default()
        });
        let (service, source, clock) = new_service(source);
        assert_eq!(service.get_options_expirations("AAPL").len(), 1);
        assert_eq!(service.get_options_expirations("AAPL").len(), 1);
        assert_eq!(source.options_calls(), 1);

        clock.advance(Duration::from_secs(31));
        service.get_options_expirations("AAPL");
        assert_eq!(source.options_calls(), 2);
    }

    #[test]
    fn test_expirations() {
        let (service, _, _) = new_service(ScriptedSource::failing());
        let fallback = service.get_options_expirations("AAPL");
        assert_eq!(fallback.len(), FALLBACK_EXPIRATIONS);
        assert!(fallback.iter().all(|e| e.days_to_expiry >= 1 && e.days_to_expiry <= 28));

        let source = ScriptedSource::new();
        source.set_options(OptionsSnapshot {
            expirations: vec![
                today() - ChronoDuration::days(1),
                today() + ChronoDuration::days(3),
                today() + ChronoDuration::days(10),
            ],
            ..OptionsSnapshot::default()
        });
        let (service, _, _) = new_service(source);
        let listed = service.get_options_expirations("AAPL");
        let days: Vec<i64> = listed.iter().map(|e| e.days_to_expiry).collect();
        assert_eq!(days, vec![3, 10]);
    }

    #[test]
    fn test_history_from_chart() {
        let source = ScriptedSource::new();
        source.set_chart(Chart {
            meta: ChartMeta::default(),
            samples: vec![
                ChartSample {
                    timestamp: 1_700_000_000,
                    close: Some(10.0),
                    ..ChartSample::default()
                },
                ChartSample {
                    timestamp: 1_700_086_400,
                    close: None,
                    ..ChartSample::default()
                },
            ],
        });
        let (service, _, _) = new_service(source);
        let bars = service.get_historical_prices("AAPL", 5);
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].open, 10.0);
    }

    #[test]
    fn test_history_fallback_anchors_on_quote() {
        let (service, source, _) = new_service(ScriptedSource::with_quote(150.5, 148.5));
        let bars = service.get_historical_prices("AAPL", 30);
        assert_eq!(source.chart_calls(), 1);
        assert_eq!(bars.len(), 30);
        assert_eq!(bars.last().unwrap().close, 150.5);
        assert_eq!(bars.last().unwrap().timestamp.date_naive(), today());
        assert!(service.get_historical_prices("AAPL", 0).is_empty());
    }

    #[test]
    fn test_one_day_fallback_is_intraday() {
        let (service, _, _) = new_service(ScriptedSource::with_quote(150.5, 148.5));
        let bars = service.get_historical_prices("AAPL", 1);
        assert!(!bars.is_empty() && bars.len() <= 79);
        assert_eq!(bars.last().unwrap().close, 150.5);
        assert!(
            bars.windows(2)
                .all(|w| w[1].timestamp - w[0].timestamp == ChronoDuration::minutes(5))
        );
    }

    #[test]
    fn test_news() {
        let (service, _, _) = new_service(ScriptedSource::failing());
        let items = service.get_company_news("TSLA", 5);
        assert_eq!(items.len(), 5);
        assert!(items[0].title.contains("TSLA"));
        assert!(service.get_company_news("TSLA", 0).is_empty());

        let source = ScriptedSource::new();
        source.set_news(synthetic_news("REAL", 3, Utc::now()));
        let (service, source, _) = new_service(source);
        assert_eq!(service.get_company_news("TSLA", 2).len(), 2);
        assert_eq!(source.news_calls(), 1);
    }

    #[test]
    fn test_popular_and_indices() {
        let (service, _, _) = new_service(ScriptedSource::with_quote(10.0, 9.0));
        let popular: Vec<String> = service.get_popular_stocks().into_iter().map(|q| q.symbol).collect();
        assert_eq!(popular, vec!["AAPL", "MSFT", "AMZN", "TSLA", "GOOGL", "NVDA"]);
        let indices: Vec<String> = service.get_market_indices().into_iter().map(|q| q.symbol).collect();
        assert_eq!(indices, vec!["SPY", "QQQ", "DIA"]);
    }

    #[test]
    fn test_company_info() {
        let (service, _, _) = new_service(ScriptedSource::failing());
        assert_eq!(service.get_company_info("msft").name, "Microsoft Corporation");
        assert_eq!(service.get_company_info("ACME").name, "ACME Corporation");
    }

    #[test]
    fn test_subscription_delivers_polled_quotes() {
        let (service, source, _) = new_service(ScriptedSource::with_quote(150.5, 148.5));
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        let sub = service.subscribe("AAPL", move |quote: &Quote| {
            assert_eq!(quote.price, 150.5);
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let deadline = Instant::now() + Duration::from_secs(3);
        while seen.load(Ordering::SeqCst) < 2 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert!(seen.load(Ordering::SeqCst) >= 2);
        // polling bypasses the cache
        assert!(source.quote_calls() >= 2);

        sub.unsubscribe();
        assert!(!service.registry().is_polling("AAPL"));
        service.shutdown();
    }
}
