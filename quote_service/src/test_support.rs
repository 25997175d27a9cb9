use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use chrono::NaiveDate;
use quote_common::Quote;
use quote_common::model::{NewsItem, SessionPrices};

use crate::sync::lock;
use crate::upstream::{Chart, FetchError, MarketDataSource, OptionsSnapshot};

pub(crate) fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
}

pub(crate) fn session(price: f64, previous_close: f64) -> SessionPrices {
    SessionPrices {
        price,
        open: previous_close,
        high: price.max(previous_close),
        low: price.min(previous_close),
        volume: 1_000,
        previous_close,
    }
}

/// In-memory source answering with whatever it was scripted with.
///
/// Unscripted endpoints answer with a malformed payload; `fail` makes every
/// endpoint answer with the given HTTP status until `recover`.
#[derive(Default)]
pub(crate) struct ScriptedSource {
    fail_with: Mutex<Option<u16>>,
    session: Mutex<Option<SessionPrices>>,
    chart: Mutex<Option<Chart>>,
    options: Mutex<Option<OptionsSnapshot>>,
    news: Mutex<Option<Vec<NewsItem>>>,
    delay: Duration,
    quote_calls: AtomicUsize,
    chart_calls: AtomicUsize,
    options_calls: AtomicUsize,
    news_calls: AtomicUsize,
}

impl ScriptedSource {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_quote(price: f64, previous_close: f64) -> Self {
        let source = Self::new();
        source.set_quote(session(price, previous_close));
        source
    }

    pub(crate) fn failing() -> Self {
        let source = Self::new();
        source.fail(503);
        source
    }

    pub(crate) fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub(crate) fn set_quote(&self, prices: SessionPrices) {
        *lock(&self.session) = Some(prices);
    }

    pub(crate) fn set_chart(&self, chart: Chart) {
        *lock(&self.chart) = Some(chart);
    }

    pub(crate) fn set_options(&self, snapshot: OptionsSnapshot) {
        *lock(&self.options) = Some(snapshot);
    }

    pub(crate) fn set_news(&self, items: Vec<NewsItem>) {
        *lock(&self.news) = Some(items);
    }

    pub(crate) fn fail(&self, status: u16) {
        *lock(&self.fail_with) = Some(status);
    }

    pub(crate) fn recover(&self) {
        *lock(&self.fail_with) = None;
    }

    pub(crate) fn quote_calls(&self) -> usize {
        self.quote_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn chart_calls(&self) -> usize {
        self.chart_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn options_calls(&self) -> usize {
        self.options_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn news_calls(&self) -> usize {
        self.news_calls.load(Ordering::SeqCst)
    }

    fn answer<T: Clone>(&self, counter: &AtomicUsize, slot: &Mutex<Option<T>>) -> Result<T, FetchError> {
        counter.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
        if let Some(status) = *lock(&self.fail_with) {
            return Err(FetchError::Status {
                url: "scripted".to_string(),
                status,
            });
        }
        lock(slot)
            .clone()
            .ok_or_else(|| FetchError::Malformed("not scripted".to_string()))
    }
}

impl MarketDataSource for ScriptedSource {
    fn realtime_quote(&self, symbol: &str) -> Result<Quote, FetchError> {
        self.answer(&self.quote_calls, &self.session)
            .map(|prices| Quote::from_session(symbol, prices, today()))
    }

    fn chart(&self, _symbol: &str, _range: &str, _interval: &str) -> Result<Chart, FetchError> {
        self.answer(&self.chart_calls, &self.chart)
    }

    fn options(&self, _symbol: &str, _expiry: Option<NaiveDate>) -> Result<OptionsSnapshot, FetchError> {
        self.answer(&self.options_calls, &self.options)
    }

    fn news(&self, _symbol: &str, limit: usize) -> Result<Vec<NewsItem>, FetchError> {
        self.answer(&self.news_calls, &self.news).map(|mut items| {
            items.truncate(limit);
            items
        })
    }
}
