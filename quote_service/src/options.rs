//! Synthetic option chains derived from an underlying price.
//!
//! There is no pricing model here. A contract is priced as intrinsic value plus a
//! time value that shrinks with distance from the money, with a little noise on
//! top. Delta follows moneyness; the other greeks are small random numbers with
//! the usual signs. Contract identifiers use the OCC layout
//! `ROOT + YYMMDD + C|P + strike * 1000 (8 digits)`, e.g. `AAPL261023C00150000`.
use chrono::{Datelike, Duration as ChronoDuration, NaiveDate, Weekday};
use quote_common::model::{Greeks, OptionContract, OptionType};
use rand::Rng;

/// Strikes of a generated chain, as fractions of the underlying.
pub const CHAIN_MONEYNESS: [f64; 5] = [0.90, 0.95, 1.00, 1.05, 1.10];

/// Spacing of a strike ladder.
pub const LADDER_STEP: f64 = 5.0;

/// Largest `limit` a strike ladder honors.
pub const MAX_LADDER_LIMIT: usize = 200;

const OCC_TAIL_LEN: usize = 15;

/// Fields encoded in an OCC contract symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct ContractSpec {
    /// Underlying root.
    pub root: String,
    /// Expiration date.
    pub expiration: NaiveDate,
    /// Call or put.
    pub option_type: OptionType,
    /// Strike price.
    pub strike: f64,
}

/// First Friday strictly after `from`.
pub fn next_friday(from: NaiveDate) -> NaiveDate {
    let weekday = from.weekday().num_days_from_monday();
    let friday = Weekday::Fri.num_days_from_monday();
    let ahead = match (friday + 7 - weekday) % 7 {
        0 => 7,
        n => n,
    };
    from + ChronoDuration::days(i64::from(ahead))
}

/// The next `count` Fridays strictly after `from`.
pub fn next_fridays(from: NaiveDate, count: usize) -> Vec<NaiveDate> {
    let first = next_friday(from);
    (0..count)
        .map(|week| first + ChronoDuration::weeks(week as i64))
        .collect()
}

/// OCC identifier for a contract.
pub fn contract_symbol(root: &str, expiration: NaiveDate, option_type: OptionType, strike: f64) -> String {
    format!(
        "{}{}{}{:08}",
        root,
        expiration.format("%y%m%d"),
        option_type.code(),
        (strike * 1000.0).round() as u64
    )
}

/// Decode an OCC identifier, `None` if it does not follow the layout.
pub fn parse_contract_symbol(symbol: &str) -> Option<ContractSpec> {
    let symbol = symbol.trim();
    if !symbol.is_ascii() || symbol.len() <= OCC_TAIL_LEN {
        return None;
    }
    let (root, tail) = symbol.split_at(symbol.len() - OCC_TAIL_LEN);
    let expiration = NaiveDate::parse_from_str(&tail[..6], "%y%m%d").ok()?;
    let option_type = OptionType::from_code(tail[6..7].chars().next()?)?;
    let digits = &tail[7..];
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let strike = digits.parse::<u64>().ok()? as f64 / 1000.0;

    Some(ContractSpec {
        root: root.to_ascii_uppercase(),
        expiration,
        option_type,
        strike,
    })
}

/// Delta implied by moneyness alone.
pub fn moneyness_delta(option_type: OptionType, strike: f64, underlying: f64) -> f64 {
    let call_delta = (0.5 + (underlying - strike) / (0.2 * underlying)).clamp(0.1, 0.9);
    match option_type {
        OptionType::Call => call_delta,
        OptionType::Put => call_delta - 1.0,
    }
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn price_contract<R: Rng + ?Sized>(
    contract_symbol: String,
    option_type: OptionType,
    strike: f64,
    expiration: NaiveDate,
    underlying: f64,
    rng: &mut R,
) -> OptionContract {
    let intrinsic = match option_type {
        OptionType::Call => (underlying - strike).max(0.0),
        OptionType::Put => (strike - underlying).max(0.0),
    };
    let distance = (strike / underlying - 1.0).abs();
    let time_value = (5.0 - distance * 10.0).max(0.5) * rng.random_range(0.9..1.1);
    let mid = intrinsic + time_value;
    let rho = rng.random_range(0.0..0.01);

    OptionContract {
        contract_symbol,
        strike,
        option_type,
        expiration,
        bid: round_cents((mid - 0.05).max(0.01)),
        ask: round_cents(mid + 0.05),
        volume: rng.random_range(0..10_000),
        open_interest: rng.random_range(0..50_000),
        implied_volatility: None,
        greeks: Some(Greeks {
            delta: moneyness_delta(option_type, strike, underlying),
            gamma: rng.random_range(0.0..0.05),
            theta: -rng.random_range(0.0..0.1),
            vega: rng.random_range(0.0..0.2),
            rho: match option_type {
                OptionType::Call => rho,
                OptionType::Put => -rho,
            },
        }),
    }
}

fn price_pair<R: Rng + ?Sized>(
    symbol: &str,
    strike: f64,
    expiration: NaiveDate,
    underlying: f64,
    rng: &mut R,
) -> [OptionContract; 2] {
    [OptionType::Call, OptionType::Put].map(|option_type| {
        price_contract(
            contract_symbol(symbol, expiration, option_type, strike),
            option_type,
            strike,
            expiration,
            underlying,
            rng,
        )
    })
}

/// Ten contracts: a call and a put at each of [`CHAIN_MONEYNESS`].
///
/// `underlying` must be positive and finite; the service checks this before calling.
pub fn generate_chain<R: Rng + ?Sized>(
    symbol: &str,
    expiration: NaiveDate,
    underlying: f64,
    rng: &mut R,
) -> Vec<OptionContract> {
    CHAIN_MONEYNESS
        .iter()
        .flat_map(|factor| price_pair(symbol, round_cents(underlying * factor), expiration, underlying, rng))
        .collect()
}

/// A single contract carrying the requested identifier.
///
/// When the identifier is a valid OCC symbol its type, strike and expiration are
/// honored. Otherwise they are made up: a strike within 10% of the underlying, a
/// random side and the next Friday after `today`.
pub fn generate_contract<R: Rng + ?Sized>(
    requested: &str,
    underlying: f64,
    today: NaiveDate,
    rng: &mut R,
) -> OptionContract {
    let (option_type, strike, expiration) = match parse_contract_symbol(requested) {
        Some(spec) => (spec.option_type, spec.strike, spec.expiration),
        None => {
            let option_type = if rng.random_bool(0.5) {
                OptionType::Call
            } else {
                OptionType::Put
            };
            let strike = round_cents(underlying * (1.0 + rng.random_range(-0.1..0.1)));
            (option_type, strike, next_friday(today))
        }
    };
    price_contract(requested.to_string(), option_type, strike, expiration, underlying, rng)
}

/// Calls and puts on `limit + 1` strikes [`LADDER_STEP`] apart around the
/// underlying rounded to the step: `limit / 2` below it and the rest above.
/// `limit` is capped at [`MAX_LADDER_LIMIT`]; non-positive strikes are skipped.
pub fn generate_ladder<R: Rng + ?Sized>(
    symbol: &str,
    expiration: NaiveDate,
    underlying: f64,
    limit: usize,
    rng: &mut R,
) -> (Vec<OptionContract>, Vec<OptionContract>) {
    let centre = (underlying / LADDER_STEP).round() * LADDER_STEP;
    let limit = limit.min(MAX_LADDER_LIMIT);
    let below = (limit / 2) as i64;
    let above = (limit - limit / 2) as i64;
    let mut calls = Vec::with_capacity(limit + 1);
    let mut puts = Vec::with_capacity(limit + 1);

    for step in -below..=above {
        let strike = centre + step as f64 * LADDER_STEP;
        if strike <= 0.0 {
            continue;
        }
        let [call, put] = price_pair(symbol, strike, expiration, underlying, rng);
        calls.push(call);
        puts.push(put);
    }
    (calls, puts)
}
