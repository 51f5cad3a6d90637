//! Quote snapshot pipeline.
//!
//! One [`SnapshotBuilder::build`] call runs the whole chain for a request:
//! fetch, reject empty results, derive headline metrics, compute the selected
//! moving averages, and format the metadata fields for display. Upstream
//! failures never escape; they become [`SnapshotOutcome::NoData`].
//!
//! ```rust,ignore
//! use tickerlens_core::{FixtureSource, LookbackWindow, MovingAverageSelection};
//! use tickerlens_core::snapshot::{SnapshotBuilder, SnapshotRequest};
//!
//! let builder = SnapshotBuilder::new(FixtureSource::demo(TradingDate::today()));
//! let request = SnapshotRequest::new("aapl", LookbackWindow::days(365)?, MovingAverageSelection::standard())?;
//! match builder.build(&request).await {
//!     SnapshotOutcome::Ready(snapshot) => println!("{}", snapshot.display.headline[0].value),
//!     SnapshotOutcome::NoData(no_data) => eprintln!("{}", no_data.message),
//! }
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::SnapshotConfig;
use crate::data_source::{HistoryRequest, MarketDataSource, SourceError};
use crate::format::{
    currency_symbol, format_percent_change, FieldFormatter, FormatKind, DEFAULT_CURRENCY_SYMBOL,
    NOT_AVAILABLE,
};
use crate::metrics::{derive_metrics, DerivedMetrics};
use crate::moving_average::{MovingAverage, MovingAverageSelection};
use crate::{
    DateRange, LookbackWindow, PriceBar, PriceSeries, ProviderId, QuoteMeta, Symbol, TradingDate,
    ValidationError,
};

/// Longest accepted trailing lookback, in days.
pub const MAX_LOOKBACK_DAYS: u32 = 36_500;

/// Profile summary shown when the provider has none.
pub const NO_SUMMARY: &str = "No summary available.";

/// `(label, metadata field, format)` rows of the key statistics table, in display order.
pub const KEY_STATISTICS: [(&str, &str, FormatKind); 9] = [
    ("Market Cap", "marketCap", FormatKind::LargeMagnitude),
    ("Trailing P/E", "trailingPE", FormatKind::Ratio),
    ("Forward P/E", "forwardPE", FormatKind::Ratio),
    ("Dividend Yield", "dividendYield", FormatKind::Percentage),
    ("52 Week High", "fiftyTwoWeekHigh", FormatKind::Currency),
    ("52 Week Low", "fiftyTwoWeekLow", FormatKind::Currency),
    ("Revenue", "totalRevenue", FormatKind::LargeMagnitude),
    ("PEG Ratio", "pegRatio", FormatKind::Ratio),
    ("Price to Book", "priceToBook", FormatKind::Ratio),
];

/// Validated input of one snapshot build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotRequest {
    symbol: Symbol,
    window: LookbackWindow,
    averages: MovingAverageSelection,
}

impl SnapshotRequest {
    /// Normalize the ticker and check the window.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] for an empty or malformed ticker, a
    /// zero-day lookback, or a lookback longer than [`MAX_LOOKBACK_DAYS`].
    pub fn new(
        ticker: &str,
        window: LookbackWindow,
        averages: MovingAverageSelection,
    ) -> Result<Self, ValidationError> {
        let symbol = Symbol::parse(ticker)?;
        match window {
            LookbackWindow::Days(0) => return Err(ValidationError::EmptyLookback),
            LookbackWindow::Days(days) if days > MAX_LOOKBACK_DAYS => {
                return Err(ValidationError::LookbackOutOfRange { days });
            }
            LookbackWindow::Days(_) => {}
            LookbackWindow::Range(range) => {
                DateRange::new(range.start, range.end)?;
            }
        }

        Ok(Self {
            symbol,
            window,
            averages,
        })
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn window(&self) -> LookbackWindow {
        self.window
    }

    pub fn averages(&self) -> &MovingAverageSelection {
        &self.averages
    }
}

/// Why a snapshot could not be produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoDataReason {
    /// The provider failed or does not know the ticker.
    FetchFailure,
    /// The provider answered with zero bars for the window.
    EmptyResult,
}

/// The "no data" outcome: a user-facing message and no partial snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoData {
    pub symbol: Symbol,
    pub reason: NoDataReason,
    pub message: String,
    /// Underlying provider error, for logs and diagnostics.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl NoData {
    pub fn fetch_failure(symbol: Symbol, error: &SourceError) -> Self {
        Self {
            message: no_data_message(&symbol),
            symbol,
            reason: NoDataReason::FetchFailure,
            detail: Some(error.to_string()),
        }
    }

    pub fn empty_result(symbol: Symbol) -> Self {
        Self {
            message: no_data_message(&symbol),
            symbol,
            reason: NoDataReason::EmptyResult,
            detail: None,
        }
    }
}

/// `Could not find data for ticker: <T>. Please check the symbol and try again.`
pub fn no_data_message(symbol: &Symbol) -> String {
    format!("Could not find data for ticker: {symbol}. Please check the symbol and try again.")
}

/// One formatted label/value pair; `delta` carries a change figure when one applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayField {
    pub label: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta: Option<String>,
}

impl DisplayField {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            delta: None,
        }
    }

    pub fn with_delta(mut self, delta: impl Into<String>) -> Self {
        self.delta = Some(delta.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub name: String,
    pub summary: String,
    /// Empty when unknown.
    pub website: String,
    pub sector: String,
    pub industry: String,
}

impl CompanyProfile {
    /// Profile with fallbacks for every missing field.
    pub fn from_meta(symbol: &Symbol, meta: &QuoteMeta) -> Self {
        let text_or = |field: &str, fallback: &str| {
            meta.text(field).unwrap_or(fallback).to_owned()
        };

        Self {
            name: meta
                .text("longName")
                .or_else(|| meta.text("shortName"))
                .unwrap_or(symbol.as_str())
                .to_owned(),
            summary: text_or("longBusinessSummary", NO_SUMMARY),
            website: text_or("website", ""),
            sector: text_or("sector", NOT_AVAILABLE),
            industry: text_or("industry", NOT_AVAILABLE),
        }
    }
}

/// Display-ready strings for a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotDisplay {
    pub currency_symbol: String,
    /// Current Price, Day High, Day Low, Volume.
    pub headline: Vec<DisplayField>,
    /// Rows of [`KEY_STATISTICS`], in order.
    pub key_statistics: Vec<DisplayField>,
    pub profile: CompanyProfile,
}

impl SnapshotDisplay {
    pub fn compose(
        symbol: &Symbol,
        metrics: &DerivedMetrics,
        meta: &QuoteMeta,
        default_currency_symbol: &str,
    ) -> Self {
        let currency = meta
            .text("currency")
            .map(currency_symbol)
            .unwrap_or_else(|| default_currency_symbol.to_owned());
        let formatter = FieldFormatter::new(currency.clone());

        let headline = vec![
            DisplayField::new(
                "Current Price",
                formatter.number(Some(metrics.latest_close), FormatKind::Currency),
            )
            .with_delta(format_percent_change(metrics.percent_change)),
            DisplayField::new(
                "Day High",
                formatter.number(Some(metrics.day_high), FormatKind::Currency),
            ),
            DisplayField::new(
                "Day Low",
                formatter.number(Some(metrics.day_low), FormatKind::Currency),
            ),
            DisplayField::new(
                "Volume",
                formatter.number(Some(metrics.volume_latest as f64), FormatKind::Plain),
            ),
        ];

        let key_statistics = KEY_STATISTICS
            .iter()
            .map(|&(label, field, kind)| DisplayField::new(label, formatter.field(meta.get(field), kind)))
            .collect();

        Self {
            currency_symbol: currency,
            headline,
            key_statistics,
            profile: CompanyProfile::from_meta(symbol, meta),
        }
    }

    pub fn key_statistic(&self, label: &str) -> Option<&str> {
        self.key_statistics
            .iter()
            .find(|field| field.label == label)
            .map(|field| field.value.as_str())
    }
}

/// Everything a front end needs to render one ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteSnapshot {
    pub symbol: Symbol,
    pub provider: ProviderId,
    pub range: DateRange,
    pub bars: PriceSeries,
    pub metrics: DerivedMetrics,
    #[serde(default)]
    pub moving_averages: Vec<MovingAverage>,
    pub meta: QuoteMeta,
    pub display: SnapshotDisplay,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl QuoteSnapshot {
    /// Bars sorted by date, newest first.
    pub fn bars_newest_first(&self) -> Vec<PriceBar> {
        self.bars.bars().iter().rev().cloned().collect()
    }

    pub fn moving_average(&self, window: usize) -> Option<&MovingAverage> {
        self.moving_averages
            .iter()
            .find(|average| average.window == window)
    }
}

/// Result of [`SnapshotBuilder::build`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SnapshotOutcome {
    Ready(Box<QuoteSnapshot>),
    NoData(NoData),
}

impl SnapshotOutcome {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    pub fn snapshot(&self) -> Option<&QuoteSnapshot> {
        match self {
            Self::Ready(snapshot) => Some(snapshot),
            Self::NoData(_) => None,
        }
    }

    pub fn no_data(&self) -> Option<&NoData> {
        match self {
            Self::Ready(_) => None,
            Self::NoData(no_data) => Some(no_data),
        }
    }
}

/// Runs the snapshot pipeline against one [`MarketDataSource`].
pub struct SnapshotBuilder<S> {
    source: S,
    today: Option<TradingDate>,
    default_currency_symbol: String,
}

impl<S> SnapshotBuilder<S>
where
    S: MarketDataSource,
{
    pub fn new(source: S) -> Self {
        Self {
            source,
            today: None,
            default_currency_symbol: String::from(DEFAULT_CURRENCY_SYMBOL),
        }
    }

    pub fn with_config(mut self, config: &SnapshotConfig) -> Self {
        self.default_currency_symbol = config.default_currency_symbol.clone();
        self
    }

    /// Pin the date trailing lookbacks resolve against.
    pub fn with_today(mut self, today: TradingDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn with_default_currency_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.default_currency_symbol = symbol.into();
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Build a snapshot for `request`.
    ///
    /// Never fails: provider errors and empty windows are reported as
    /// [`SnapshotOutcome::NoData`].
    pub async fn build(&self, request: &SnapshotRequest) -> SnapshotOutcome {
        let symbol = request.symbol().clone();
        let today = self.today.unwrap_or_else(TradingDate::today);

        let range = match request.window().resolve(today) {
            Ok(range) => range,
            Err(error) => {
                warn!(symbol = %symbol, error = %error, "lookback could not be resolved");
                let error = SourceError::invalid_request(error.to_string());
                return SnapshotOutcome::NoData(NoData::fetch_failure(symbol, &error));
            }
        };

        debug!(symbol = %symbol, range = %range, provider = %self.source.id(), "fetching history");
        let data = match self
            .source
            .fetch_history(HistoryRequest::new(symbol.clone(), range))
            .await
        {
            Ok(data) => data,
            Err(error) => {
                warn!(symbol = %symbol, code = error.code(), error = %error, "history fetch failed");
                return SnapshotOutcome::NoData(NoData::fetch_failure(symbol, &error));
            }
        };

        let Some(metrics) = derive_metrics(&data.bars) else {
            warn!(symbol = %symbol, range = %range, "history is empty");
            return SnapshotOutcome::NoData(NoData::empty_result(symbol));
        };

        let moving_averages = request.averages().compute(&data.bars);
        let display =
            SnapshotDisplay::compose(&symbol, &metrics, &data.meta, &self.default_currency_symbol);

        info!(
            symbol = %symbol,
            bars = data.bars.len(),
            averages = moving_averages.len(),
            warnings = data.warnings.len(),
            "snapshot ready"
        );

        SnapshotOutcome::Ready(Box::new(QuoteSnapshot {
            symbol,
            provider: self.source.id(),
            range,
            bars: data.bars,
            metrics,
            moving_averages,
            meta: data.meta,
            display,
            warnings: data.warnings,
        }))
    }
}
