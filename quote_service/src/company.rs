//! Static company profiles.
use quote_common::Ticker;
use quote_common::model::CompanyInfo;

struct Profile {
    name: &'static str,
    description: &'static str,
    sector: &'static str,
    industry: &'static str,
    exchange: &'static str,
    market_cap: u64,
    employees: u64,
    website: &'static str,
}

const APPLE: Profile = Profile {
    name: "Apple Inc.",
    description: "Apple designs, manufactures and markets smartphones, personal computers, tablets, wearables and accessories, and sells a variety of related services.",
    sector: "Technology",
    industry: "Consumer Electronics",
    exchange: "NASDAQ",
    market_cap: 2_800_000_000_000,
    employees: 164_000,
    website: "https://www.apple.com",
};

const ALPHABET: Profile = Profile {
    name: "Alphabet Inc.",
    description: "Alphabet is the holding company of Google, offering search, advertising, cloud computing, hardware and a portfolio of other bets.",
    sector: "Communication Services",
    industry: "Internet Content & Information",
    exchange: "NASDAQ",
    market_cap: 1_700_000_000_000,
    employees: 182_000,
    website: "https://abc.xyz",
};

const MICROSOFT: Profile = Profile {
    name: "Microsoft Corporation",
    description: "Microsoft develops and supports software, services, devices and solutions, including Windows, Office, Azure and Xbox.",
    sector: "Technology",
    industry: "Software - Infrastructure",
    exchange: "NASDAQ",
    market_cap: 2_700_000_000_000,
    employees: 221_000,
    website: "https://www.microsoft.com",
};

const TESLA: Profile = Profile {
    name: "Tesla, Inc.",
    description: "Tesla designs, develops, manufactures and sells electric vehicles and energy generation and storage systems.",
    sector: "Consumer Cyclical",
    industry: "Auto Manufacturers",
    exchange: "NASDAQ",
    market_cap: 800_000_000_000,
    employees: 140_000,
    website: "https://www.tesla.com",
};

const AMAZON: Profile = Profile {
    name: "Amazon.com, Inc.",
    description: "Amazon engages in the retail sale of consumer products and subscriptions through online and physical stores, and provides cloud services through AWS.",
    sector: "Consumer Cyclical",
    industry: "Internet Retail",
    exchange: "NASDAQ",
    market_cap: 1_500_000_000_000,
    employees: 1_540_000,
    website: "https://www.amazon.com",
};

fn profile(ticker: Ticker) -> Option<&'static Profile> {
    match ticker {
        Ticker::AAPL => Some(&APPLE),
        Ticker::GOOGL => Some(&ALPHABET),
        Ticker::MSFT => Some(&MICROSOFT),
        Ticker::TSLA => Some(&TESLA),
        Ticker::AMZN => Some(&AMAZON),
        _ => None,
    }
}

/// Profile for `symbol`; unknown symbols get a placeholder with zeroed figures.
pub fn company_info(symbol: &str) -> CompanyInfo {
    let symbol = symbol.trim().to_ascii_uppercase();
    match symbol.parse::<Ticker>().ok().and_then(profile) {
        Some(p) => CompanyInfo {
            symbol,
            name: p.name.to_string(),
            description: p.description.to_string(),
            sector: p.sector.to_string(),
            industry: p.industry.to_string(),
            exchange: p.exchange.to_string(),
            market_cap: p.market_cap,
            employees: p.employees,
            website: p.website.to_string(),
        },
        None => CompanyInfo {
            name: format!("{symbol} Corporation"),
            description: format!("{symbol} is a publicly traded company."),
            sector: "Unknown".to_string(),
            industry: "Unknown".to_string(),
            exchange: "Unknown".to_string(),
            market_cap: 0,
            employees: 0,
            website: String::new(),
            symbol,
        },
    }
}
