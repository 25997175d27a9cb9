//! Best-effort quote resolution.
//!
//! A [`FallbackResolver`] walks an ordered list of [`QuoteStrategy`]s until one of
//! them produces a quote. The standard order is:
//!
//! 1. [`RealtimeQuote`]: the v7 quote endpoint.
//! 2. [`ChartQuote`]: a one-day chart, quote derived from its metadata.
//! 3. [`StaleCache`]: whatever the cache still holds past its TTL.
//! 4. [`SyntheticQuote`]: a generated quote.
//!
//! A strategy may also answer [`Resolution::Exhausted`] to end the walk early; the
//! caller is then expected to synthesize a quote itself.
use std::sync::Arc;

use chrono::NaiveDate;
use log::{debug, info, warn};
use quote_common::Quote;
use strum_macros::Display;

use crate::synthetic::synthetic_quote;
use crate::upstream::{FetchError, MarketDataSource};

/// Chart range and interval used to derive a quote.
pub const CHART_QUOTE_RANGE: (&str, &str) = ("1d", "5m");

/// Outcome of one strategy.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// A usable quote.
    Resolved(Quote),
    /// Nothing here, ask the next strategy.
    TryNext,
    /// Nothing here and no later strategy can do better.
    Exhausted,
}

/// Which strategy produced a quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum QuoteOrigin {
    /// v7 quote endpoint.
    Realtime,
    /// v8 chart endpoint.
    Chart,
    /// Expired cache entry.
    StaleCache,
    /// Locally generated.
    Synthetic,
}

impl QuoteOrigin {
    /// True for quotes fetched from upstream just now; only these refresh the cache.
    pub fn is_fresh(self) -> bool {
        matches!(self, QuoteOrigin::Realtime | QuoteOrigin::Chart)
    }
}

/// What a strategy gets to work with.
#[derive(Debug, Clone, Copy)]
pub struct ResolveContext<'a> {
    /// Normalized symbol.
    pub symbol: &'a str,
    /// Expired cache entry, if any.
    pub stale: Option<&'a Quote>,
    /// Trading day stamped on derived quotes.
    pub today: NaiveDate,
}

/// One step of the fallback chain.
pub trait QuoteStrategy: Send + Sync {
    /// Origin reported for quotes this strategy resolves.
    fn origin(&self) -> QuoteOrigin;

    /// Try to produce a quote.
    fn resolve(&self, ctx: &ResolveContext<'_>) -> Resolution;
}

/// Quote straight from the v7 quote endpoint.
pub struct RealtimeQuote {
    source: Arc<dyn MarketDataSource>,
}

impl RealtimeQuote {
    #[allow(missing_docs)]
    pub fn new(source: Arc<dyn MarketDataSource>) -> Self {
        RealtimeQuote { source }
    }
}

impl QuoteStrategy for RealtimeQuote {
    fn origin(&self) -> QuoteOrigin {
        QuoteOrigin::Realtime
    }

    fn resolve(&self, ctx: &ResolveContext<'_>) -> Resolution {
        match self.source.realtime_quote(ctx.symbol) {
            Ok(quote) if quote.is_finite() => Resolution::Resolved(quote),
            Ok(_) => {
                warn!("Realtime quote for {} has non-finite fields", ctx.symbol);
                Resolution::TryNext
            }
            Err(e) => {
                warn!("Realtime quote for {} failed: {}", ctx.symbol, e);
                Resolution::TryNext
            }
        }
    }
}

/// Quote derived from a one-day chart.
///
/// A 404 from the chart endpoint means Yahoo does not know the symbol, which ends
/// the chain.
pub struct ChartQuote {
    source: Arc<dyn MarketDataSource>,
}

impl ChartQuote {
    #[allow(missing_docs)]
    pub fn new(source: Arc<dyn MarketDataSource>) -> Self {
        ChartQuote { source }
    }
}

impl QuoteStrategy for ChartQuote {
    fn origin(&self) -> QuoteOrigin {
        QuoteOrigin::Chart
    }

    fn resolve(&self, ctx: &ResolveContext<'_>) -> Resolution {
        let (range, interval) = CHART_QUOTE_RANGE;
        let derived = self
            .source
            .chart(ctx.symbol, range, interval)
            .and_then(|chart| chart.latest_quote(ctx.symbol, ctx.today));
        match derived {
            Ok(quote) if quote.is_finite() => Resolution::Resolved(quote),
            Ok(_) => Resolution::TryNext,
            Err(FetchError::Status { status: 404, .. }) if ctx.stale.is_none() => {
                info!("Chart endpoint does not know {}", ctx.symbol);
                Resolution::Exhausted
            }
            Err(e) => {
                warn!("Chart quote for {} failed: {}", ctx.symbol, e);
                Resolution::TryNext
            }
        }
    }
}

/// Expired cache entry served as a degraded answer.
pub struct StaleCache;

impl QuoteStrategy for StaleCache {
    fn origin(&self) -> QuoteOrigin {
        QuoteOrigin::StaleCache
    }

    fn resolve(&self, ctx: &ResolveContext<'_>) -> Resolution {
        match ctx.stale {
            Some(quote) => {
                warn!("Serving stale cached quote for {}", ctx.symbol);
                Resolution::Resolved(quote.clone())
            }
            None => Resolution::TryNext,
        }
    }
}

/// Generated quote; never fails.
pub struct SyntheticQuote;

impl QuoteStrategy for SyntheticQuote {
    fn origin(&self) -> QuoteOrigin {
        QuoteOrigin::Synthetic
    }

    fn resolve(&self, ctx: &ResolveContext<'_>) -> Resolution {
        warn!("Using synthetic quote for {}", ctx.symbol);
        Resolution::Resolved(synthetic_quote(ctx.symbol, ctx.today, &mut rand::rng()))
    }
}

/// A quote and the strategy it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedQuote {
    #[allow(missing_docs)]
    pub quote: Quote,
    #[allow(missing_docs)]
    pub origin: QuoteOrigin,
}

/// Ordered fallback chain.
pub struct FallbackResolver {
    strategies: Vec<Box<dyn QuoteStrategy>>,
}

impl FallbackResolver {
    /// Chain over `strategies`, tried in order.
    pub fn new(strategies: Vec<Box<dyn QuoteStrategy>>) -> Self {
        FallbackResolver { strategies }
    }

    /// Realtime, chart, stale cache, synthetic.
    pub fn standard(source: Arc<dyn MarketDataSource>) -> Self {
        Self::new(vec![
            Box::new(RealtimeQuote::new(Arc::clone(&source))),
            Box::new(ChartQuote::new(source)),
            Box::new(StaleCache),
            Box::new(SyntheticQuote),
        ])
    }

    /// First quote any strategy produces, `None` if the chain ran out or was cut short.
    pub fn resolve(&self, ctx: &ResolveContext<'_>) -> Option<ResolvedQuote> {
        for strategy in &self.strategies {
            match strategy.resolve(ctx) {
                Resolution::Resolved(quote) => {
                    let origin = strategy.origin();
                    debug!("Resolved {} via {}", ctx.symbol, origin);
                    return Some(ResolvedQuote { quote, origin });
                }
                Resolution::TryNext => continue,
                Resolution::Exhausted => {
                    debug!("Resolution of {} exhausted at {}", ctx.symbol, strategy.origin());
                    return None;
                }
            }
        }
        None
    }
}
