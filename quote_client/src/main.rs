//! Quote Client — a command-line front-end for the stock data service. Each
//! subcommand makes one service call and prints the result as pretty JSON on
//! stdout; `watch` subscribes to symbols and logs every polled update until Ctrl+C.
//!
//! Usage example (CLI):
//! ```bash
//! quote_client quote AAPL MSFT
//! quote_client --profile standard history TSLA --days 90
//! quote_client options AAPL --contract AAPL261023C00150000
//! quote_client watch SPY --path ./tickers.txt --poll-secs 5
//! ```
//!
//! Logging goes to stderr through `env_logger` (`RUST_LOG=debug` for more detail).
//! `QUOTE_*` environment variables configure the service; flags win over them.
#![warn(missing_docs)]
mod args;
mod watch;

use crate::args::{Args, Command};
use clap::Parser;
use log::info;
use quote_common::{MarketError, Quote, Result, Symbol};
use quote_service::StockDataService;
use serde::Serialize;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

fn main() -> Result<(), MarketError> {
    init_logger();
    let args = Args::parse();
    let service = StockDataService::new(args.service_config()?)?;

    match args.command {
        Command::Quote { symbols } => {
            let quotes = symbols
                .iter()
                .map(|raw| -> Result<Quote> { Ok(service.get_stock_quote(parse_symbol(raw)?.as_str())) })
                .collect::<Result<Vec<_>>>()?;
            print_json(&quotes)
        }
        Command::Options { symbol, contract } => {
            let symbol = parse_symbol(&symbol)?;
            print_json(&service.get_options_data(symbol.as_str(), contract.as_deref())?)
        }
        Command::Chain { symbol, expiry, limit } => {
            let symbol = parse_symbol(&symbol)?;
            print_json(&service.get_options_chain(symbol.as_str(), expiry, limit)?)
        }
        Command::Expirations { symbol } => {
            print_json(&service.get_options_expirations(parse_symbol(&symbol)?.as_str()))
        }
        Command::History { symbol, days } => {
            print_json(&service.get_historical_prices(parse_symbol(&symbol)?.as_str(), days))
        }
        Command::Company { symbol } => {
            print_json(&service.get_company_info(parse_symbol(&symbol)?.as_str()))
        }
        Command::News { symbol, limit } => {
            print_json(&service.get_company_news(parse_symbol(&symbol)?.as_str(), limit))
        }
        Command::Popular => print_json(&service.get_popular_stocks()),
        Command::Indices => print_json(&service.get_market_indices()),
        Command::Watch { symbols, path } => {
            let symbols = watch::collect_symbols(&symbols, path.as_deref())?;
            let shutdown = Arc::new(AtomicBool::new(false));
            {
                let shutdown = shutdown.clone();
                ctrlc::set_handler(move || {
                    info!("Ctrl+C received. Shutting down client...");
                    shutdown.store(true, Ordering::SeqCst);
                })
                .map_err(|e| MarketError::Format(format!("Error setting Ctrl+C handler: {e}")))?;
            }
            watch::run(&service, &symbols, shutdown)
        }
    }
}

fn parse_symbol(raw: &str) -> Result<Symbol> {
    raw.parse()
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn init_logger() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
}
