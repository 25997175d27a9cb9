//! Locally generated market data, used when every upstream source has failed.
//!
//! Nothing here is meant to look like a real market. The only promises are the
//! structural ones: prices are positive and finite, `high >= max(open, close)`,
//! `low <= min(open, close)` and change metrics are derived through
//! [`Quote::from_session`]. Every generator takes the RNG as an argument, so
//! tests can pass a seeded `StdRng`.
use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, NaiveTime, Utc};
use quote_common::Quote;
use quote_common::model::{NewsItem, PriceBar, SessionPrices};
use rand::Rng;
use std::ops::Range;

/// Prices never drop below this floor.
pub const MIN_PRICE: f64 = 0.01;

/// Longest synthetic history, in days.
pub const MAX_HISTORY_DAYS: u32 = 3650;

/// Bar width of the synthetic intraday series, in minutes.
pub const INTRADAY_STEP_MINUTES: i64 = 5;

// regular session, minutes after midnight UTC
const SESSION_OPEN_MINUTES: i64 = 9 * 60 + 30;
const SESSION_CLOSE_MINUTES: i64 = 16 * 60;

/// Publisher attributed to generated headlines.
pub const SYNTHETIC_PUBLISHER: &str = "AlphaSphere AI";

const HEADLINES: [&str; 8] = [
    "{s} shares move as traders weigh the latest guidance",
    "Analysts revisit price targets on {s}",
    "{s} options activity picks up ahead of earnings",
    "What the recent volume spike means for {s}",
    "{s} trades near key technical level",
    "Institutional holders adjust {s} positions",
    "{s} in focus as sector rotation continues",
    "Market wrap: {s} among the most watched names",
];

/// Quote with a random price below 1000 and a previous close within 1% of it.
pub fn synthetic_quote<R: Rng + ?Sized>(symbol: &str, trading_day: NaiveDate, rng: &mut R) -> Quote {
    let price = rng.random_range(0.0..1000.0_f64).max(MIN_PRICE);
    let previous_close = price * (1.0 + rng.random_range(-0.01..0.01));
    let open = previous_close * (1.0 + rng.random_range(0.0..0.01));
    let high = price.max(open) * (1.0 + rng.random_range(0.0..0.02));
    let low = price.min(open) * (1.0 - rng.random_range(0.0..0.02));

    let session = SessionPrices {
        price,
        open,
        high,
        low,
        volume: rng.random_range(0..10_000_000),
        previous_close,
    };
    Quote::from_session(symbol, session, trading_day)
}

struct Walk {
    drift: f64,
    wick: f64,
    volume: Range<u64>,
}

/// Bars at `stamps` (newest first), returned oldest first. The walk runs
/// backwards from `anchor`, so the close of the last bar is exactly `anchor`.
fn walk_back<R, I>(anchor: f64, stamps: I, walk: &Walk, rng: &mut R) -> Vec<PriceBar>
where
    R: Rng + ?Sized,
    I: Iterator<Item = DateTime<Utc>>,
{
    let mut bars = Vec::with_capacity(stamps.size_hint().0);
    let mut close = anchor.max(MIN_PRICE);

    for timestamp in stamps {
        let open = (close * (1.0 + rng.random_range(-walk.drift..walk.drift))).max(MIN_PRICE);
        let high = open.max(close) * (1.0 + rng.random_range(0.0..walk.wick));
        let low = open.min(close) * (1.0 - rng.random_range(0.0..walk.wick));

        bars.push(PriceBar {
            timestamp,
            open,
            high,
            low,
            close,
            volume: rng.random_range(walk.volume.clone()),
        });
        // the previous bar closed where this one opened
        close = open;
    }

    bars.reverse();
    bars
}

/// `days` daily bars ending on `end_date`, oldest first, the last closing at
/// `anchor` so history lines up with the quote the caller already holds.
/// `days` is capped at [`MAX_HISTORY_DAYS`].
pub fn synthetic_history<R: Rng + ?Sized>(
    anchor: f64,
    days: u32,
    end_date: NaiveDate,
    rng: &mut R,
) -> Vec<PriceBar> {
    let days = days.min(MAX_HISTORY_DAYS);
    let stamps = (0..days).map(|back| {
        (end_date - ChronoDuration::days(i64::from(back)))
            .and_time(NaiveTime::MIN)
            .and_utc()
    });
    let walk = Walk {
        drift: 0.02,
        wick: 0.01,
        volume: 100_000..1_100_000,
    };
    walk_back(anchor, stamps, &walk, rng)
}

/// Five-minute bars for the regular session (09:30 to 16:00 UTC) of `now`'s
/// day, from the open up to `now`. Before the open it is the whole previous
/// session. The last bar closes at `anchor`.
pub fn synthetic_intraday<R: Rng + ?Sized>(anchor: f64, now: DateTime<Utc>, rng: &mut R) -> Vec<PriceBar> {
    let mut midnight = now.date_naive().and_time(NaiveTime::MIN).and_utc();
    let mut end = now.min(midnight + ChronoDuration::minutes(SESSION_CLOSE_MINUTES));
    if end < midnight + ChronoDuration::minutes(SESSION_OPEN_MINUTES) {
        midnight -= ChronoDuration::days(1);
        end = midnight + ChronoDuration::minutes(SESSION_CLOSE_MINUTES);
    }
    let session_open = midnight + ChronoDuration::minutes(SESSION_OPEN_MINUTES);
    let count = (end - session_open).num_minutes() / INTRADAY_STEP_MINUTES + 1;

    let stamps = (0..count)
        .rev()
        .map(|step| session_open + ChronoDuration::minutes(step * INTRADAY_STEP_MINUTES));
    let walk = Walk {
        drift: 0.0075,
        wick: 0.002,
        volume: 100_000..600_000,
    };
    walk_back(anchor, stamps, &walk, rng)
}

/// `limit` generic headlines about `symbol`, newest first, one hour apart.
pub fn synthetic_news(symbol: &str, limit: usize, now: DateTime<Utc>) -> Vec<NewsItem> {
    HEADLINES
        .iter()
        .cycle()
        .take(limit)
        .enumerate()
        .map(|(i, template)| NewsItem {
            title: template.replace("{s}", symbol),
            url: format!("https://finance.yahoo.com/quote/{symbol}"),
            publisher: SYNTHETIC_PUBLISHER.to_string(),
            published_at: now - ChronoDuration::hours(i as i64),
            summary: None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    #[test]
    fn test_synthetic_quote_is_consistent() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let quote = synthetic_quote("ANY", day(), &mut rng);
            assert!(quote.is_finite());
            assert!(quote.price > 0.0 && quote.low > 0.0);
            assert!(quote.high >= quote.price && quote.high >= quote.open);
            assert!(quote.low <= quote.price && quote.low <= quote.open);
            assert!((quote.change - (quote.price - quote.previous_close)).abs() < 1e-9);
            assert!(quote.change_percent.abs() <= 1.1);
        }
    }

    #[test]
    fn test_history_ends_on_anchor() {
        let mut rng = StdRng::seed_from_u64(1);
        let bars = synthetic_history(123.45, 30, day(), &mut rng);
        assert_eq!(bars.len(), 30);
        assert_eq!(bars.last().unwrap().close, 123.45);
        assert_eq!(bars.last().unwrap().timestamp.date_naive(), day());
        assert!(bars.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
        for bar in &bars {
            assert!(bar.low <= bar.open.min(bar.close));
            assert!(bar.high >= bar.open.max(bar.close));
            assert!(bar.low > 0.0);
        }
    }

    #[test]
    fn test_history_of_zero_days_is_empty() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(synthetic_history(10.0, 0, day(), &mut rng).is_empty());
    }

    #[test]
    fn test_history_is_capped() {
        let mut rng = StdRng::seed_from_u64(1);
        let bars = synthetic_history(10.0, u32::MAX, day(), &mut rng);
        assert_eq!(bars.len(), MAX_HISTORY_DAYS as usize);
    }

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        day().and_hms_opt(h, m, 0).unwrap().and_utc()
    }

    #[test]
    fn test_intraday_runs_from_open_to_now() {
        let mut rng = StdRng::seed_from_u64(4);
        let bars = synthetic_intraday(50.0, at(12, 3), &mut rng);
        assert_eq!(bars.len(), 31);
        assert_eq!(bars[0].timestamp, at(9, 30));
        assert_eq!(bars.last().unwrap().timestamp, at(12, 0));
        assert_eq!(bars.last().unwrap().close, 50.0);
        assert!(
            bars.windows(2)
                .all(|w| w[1].timestamp - w[0].timestamp == ChronoDuration::minutes(5))
        );
        for bar in &bars {
            assert!(bar.low <= bar.open.min(bar.close));
            assert!(bar.high >= bar.open.max(bar.close));
        }
    }

    #[test]
    fn test_intraday_after_close_and_before_open() {
        let mut rng = StdRng::seed_from_u64(4);
        let evening = synthetic_intraday(50.0, at(20, 0), &mut rng);
        assert_eq!(evening.len(), 79);
        assert_eq!(evening.last().unwrap().timestamp, at(16, 0));

        let early = synthetic_intraday(50.0, at(8, 0), &mut rng);
        assert_eq!(early.len(), 79);
        assert_eq!(early[0].timestamp, at(9, 30) - ChronoDuration::days(1));
        assert_eq!(early.last().unwrap().close, 50.0);
    }

    #[test]
    fn test_news_spacing_and_limit() {
        let now = Utc::now();
        let items = synthetic_news("TSLA", 10, now);
        assert_eq!(items.len(), 10);
        assert!(items[0].title.contains("TSLA"));
        assert_eq!(items[0].published_at, now);
        assert_eq!(items[1].published_at, now - ChronoDuration::hours(1));
        assert!(items.iter().all(|n| n.publisher == SYNTHETIC_PUBLISHER));
    }
}
