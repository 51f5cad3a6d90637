use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};

use time::Weekday;
use tracing::debug;

use crate::data_source::{HealthStatus, HistoryFuture, HistoryRequest, MarketDataSource, SourceError};
use crate::{MarketData, PriceBar, PriceSeries, ProviderId, QuoteMeta, Symbol, TradingDate};

/// Days of history generated per ticker by [`FixtureSource::demo`].
pub const DEMO_HISTORY_DAYS: u32 = 730;

struct DemoCompany {
    ticker: &'static str,
    name: &'static str,
    sector: &'static str,
    industry: &'static str,
    website: &'static str,
    summary: &'static str,
}

const DEMO_COMPANIES: [DemoCompany; 4] = [
    DemoCompany {
        ticker: "AAPL",
        name: "Apple Inc.",
        sector: "Technology",
        industry: "Consumer Electronics",
        website: "https://www.apple.com",
        summary: "Designs, manufactures, and markets smartphones, personal computers, tablets, wearables, and accessories.",
    },
    DemoCompany {
        ticker: "MSFT",
        name: "Microsoft Corporation",
        sector: "Technology",
        industry: "Software - Infrastructure",
        website: "https://www.microsoft.com",
        summary: "Develops and supports software, services, devices, and solutions worldwide.",
    },
    DemoCompany {
        ticker: "GOOGL",
        name: "Alphabet Inc.",
        sector: "Communication Services",
        industry: "Internet Content & Information",
        website: "https://abc.xyz",
        summary: "Offers online advertising, search, cloud computing, and consumer hardware products.",
    },
    DemoCompany {
        ticker: "TSLA",
        name: "Tesla, Inc.",
        sector: "Consumer Cyclical",
        industry: "Auto Manufacturers",
        website: "https://www.tesla.com",
        summary: "Designs, develops, manufactures, and sells electric vehicles and energy storage systems.",
    },
];

/// In-memory [`MarketDataSource`] backed by canned responses.
///
/// Unknown symbols fail with `NotFound`; stored bars are filtered to the
/// requested range. Every call is counted, including failed ones.
#[derive(Default)]
pub struct FixtureSource {
    entries: HashMap<Symbol, MarketData>,
    failure: Option<SourceError>,
    calls: AtomicUsize,
}

impl FixtureSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Synthetic but deterministic history for a handful of large caps,
    /// covering [`DEMO_HISTORY_DAYS`] calendar days up to `end`.
    pub fn demo(end: TradingDate) -> Self {
        DEMO_COMPANIES
            .iter()
            .filter_map(|company| {
                let symbol = Symbol::parse(company.ticker).ok()?;
                let data = demo_market_data(&symbol, company, end);
                Some((symbol, data))
            })
            .fold(Self::new(), |source, (symbol, data)| {
                source.with_symbol(symbol, data)
            })
    }

    pub fn with_symbol(mut self, symbol: Symbol, data: MarketData) -> Self {
        self.entries.insert(symbol, data);
        self
    }

    /// Fail every fetch with `error`.
    pub fn with_failure(mut self, error: SourceError) -> Self {
        self.failure = Some(error);
        self
    }

    /// Number of `fetch_history` calls served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.entries.keys()
    }
}

impl MarketDataSource for FixtureSource {
    fn id(&self) -> ProviderId {
        ProviderId::Fixture
    }

    fn fetch_history<'a>(&'a self, req: HistoryRequest) -> HistoryFuture<'a> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            debug!(symbol = %req.symbol, range = %req.range, "fixture fetch");

            if let Some(error) = &self.failure {
                return Err(error.clone());
            }

            let stored = self
                .entries
                .get(&req.symbol)
                .ok_or_else(|| SourceError::not_found(&req.symbol))?;

            Ok(MarketData {
                bars: stored.bars.within(req.range.start, req.range.end),
                meta: stored.meta.clone(),
                warnings: stored.warnings.clone(),
            })
        })
    }

    fn health<'a>(&'a self) -> Pin<Box<dyn Future<Output = HealthStatus> + Send + 'a>> {
        Box::pin(async { HealthStatus::healthy() })
    }
}

fn demo_market_data(symbol: &Symbol, company: &DemoCompany, end: TradingDate) -> MarketData {
    let seed = symbol_seed(symbol);
    let bars = demo_bars(seed, end);
    let last_close = bars.last().map_or(100.0, |bar| bar.close);
    let closes: Vec<f64> = bars.iter().map(|bar| bar.close).collect();
    let (year_low, year_high) = closes
        .iter()
        .rev()
        .take(252)
        .fold((f64::MAX, f64::MIN), |(low, high), &close| {
            (low.min(close), high.max(close))
        });

    let shares = 1.5e9 + (seed % 150) as f64 * 1e8;
    let eps = last_close / (18.0 + (seed % 200) as f64 / 10.0);

    let meta = QuoteMeta::new()
        .with("longName", company.name)
        .with("shortName", company.name)
        .with("currency", "USD")
        .with("sector", company.sector)
        .with("industry", company.industry)
        .with("website", company.website)
        .with("longBusinessSummary", company.summary)
        .with("marketCap", (last_close * shares).round())
        .with("trailingPE", last_close / eps)
        .with("forwardPE", last_close / (eps * 1.08))
        .with("dividendYield", 0.004 + (seed % 40) as f64 / 10_000.0)
        .with("fiftyTwoWeekHigh", year_high)
        .with("fiftyTwoWeekLow", year_low)
        .with("totalRevenue", (shares * eps * 6.5).round())
        .with("pegRatio", 1.2 + (seed % 25) as f64 / 10.0)
        .with("priceToBook", 4.0 + (seed % 400) as f64 / 10.0);

    MarketData::new(PriceSeries::new(bars), meta)
}

/// Weekday bars following a slow sine drift, so moving averages have shape.
fn demo_bars(seed: u64, end: TradingDate) -> Vec<PriceBar> {
    let Some(start) = end.checked_sub_days(DEMO_HISTORY_DAYS) else {
        return Vec::new();
    };
    let base = 60.0 + (seed % 300) as f64;

    let mut bars = Vec::new();
    let mut previous_close = base;
    for offset in 0..=DEMO_HISTORY_DAYS {
        let Some(date) = start.checked_add_days(offset) else {
            break;
        };
        if matches!(
            date.into_inner().weekday(),
            Weekday::Saturday | Weekday::Sunday
        ) {
            continue;
        }

        let step = f64::from(offset);
        let wobble = ((seed.wrapping_add(u64::from(offset) * 7_919)) % 100) as f64 / 100.0 - 0.5;
        let close = (base * (1.0 + 0.12 * (step / 29.0).sin() + 0.0004 * step) + wobble).max(1.0);
        let open = previous_close;
        let high = open.max(close) * 1.008;
        let low = open.min(close) * 0.992;
        let volume =
            8_000_000 + seed.wrapping_mul(31).wrapping_add(u64::from(offset) * 977) % 6_000_000;

        let bar = PriceBar::new(
            date,
            round_cents(open),
            round_cents(high),
            round_cents(low),
            round_cents(close),
            volume,
        );
        if let Ok(bar) = bar {
            bars.push(bar);
        }
        previous_close = close;
    }
    bars
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn symbol_seed(symbol: &Symbol) -> u64 {
    symbol.as_str().bytes().fold(0_u64, |acc, byte| {
        acc.wrapping_mul(33).wrapping_add(u64::from(byte))
    })
}
