//! `watch` command: subscribe to symbols and log every polled quote.
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use log::info;
use quote_common::tickers::TickerParser;
use quote_common::{MarketError, Quote, Result, Symbol};
use quote_service::{StockDataService, Subscription};

/// How often the main thread checks for Ctrl+C.
const IDLE_TICK: Duration = Duration::from_millis(200);

/// Symbols given on the command line followed by those in `path`, deduplicated.
pub fn collect_symbols(cli: &[String], path: Option<&str>) -> Result<Vec<Symbol>> {
    let mut symbols = cli
        .iter()
        .map(|raw| raw.parse::<Symbol>())
        .collect::<Result<Vec<_>>>()?;

    if let Some(raw_path) = path {
        let file_path = normalize_path(raw_path);
        if !is_file_exist(&file_path) {
            return Err(MarketError::Format(format!(
                "ticker file {} not found",
                file_path.display()
            )));
        }
        let reader = BufReader::new(File::open(&file_path)?);
        symbols.extend(Symbol::parse_from_file(reader)?);
    }

    let mut seen = HashSet::new();
    symbols.retain(|symbol| seen.insert(symbol.clone()));
    if symbols.is_empty() {
        return Err(MarketError::Format("no symbols to watch".to_string()));
    }
    Ok(symbols)
}

/// Subscribe to every symbol and block until `shutdown` is raised.
pub fn run(service: &StockDataService, symbols: &[Symbol], shutdown: Arc<AtomicBool>) -> Result<()> {
    let subscriptions: Vec<Subscription> = symbols
        .iter()
        .map(|symbol| service.subscribe(symbol.as_str(), log_quote))
        .collect();

    info!(
        "Watching {:?} every {:?}. Press Ctrl+C to exit.",
        symbols.iter().map(Symbol::as_str).collect::<Vec<_>>(),
        service.registry().period()
    );
    while !shutdown.load(Ordering::Relaxed) {
        thread::sleep(IDLE_TICK);
    }

    info!("Watch loop stopping...");
    for subscription in subscriptions {
        subscription.unsubscribe();
    }
    service.shutdown();
    Ok(())
}

fn log_quote(quote: &Quote) {
    info!(
        "QUOTE: {} Price={:.2} Change={:+.2} ({:+.2}%) Volume={}",
        quote.symbol, quote.price, quote.change, quote.change_percent, quote.volume
    );
}

/// Normalize a CLI-provided path string by trimming whitespace and matching quotes.
///
/// This allows passing Windows paths in quotes without breaking parsing.
fn normalize_path(raw: &str) -> PathBuf {
    let trimmed = raw.trim();
    let no_quotes = trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(trimmed);
    PathBuf::from(no_quotes)
}

/// Returns `true` if the provided path exists and is a regular file.
fn is_file_exist(path: &Path) -> bool {
    path.exists() && path.is_file()
}
