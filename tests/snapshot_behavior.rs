//! Behavior-driven tests for the snapshot pipeline
//!
//! These tests drive `SnapshotBuilder` end to end against an in-memory
//! source: fetch, empty-result handling, metric derivation, moving averages
//! and metadata formatting.

use tickerlens_core::{
    DerivedMetrics, FixtureSource, LookbackWindow, MarketData, MovingAverageSelection,
    NoDataReason, PriceBar, PriceSeries, QuoteMeta, SnapshotBuilder, SnapshotOutcome,
    SnapshotRequest, SourceError, Symbol, TradingDate, NOT_AVAILABLE,
};

fn date(value: &str) -> TradingDate {
    TradingDate::parse(value).expect("valid date")
}

fn symbol(value: &str) -> Symbol {
    Symbol::parse(value).expect("valid symbol")
}

/// One bar per calendar day, ending at `last_day`.
fn daily_series(closes: &[f64], last_day: &str) -> PriceSeries {
    let first = date(last_day)
        .checked_sub_days(closes.len() as u32 - 1)
        .expect("in range");
    let bars = closes
        .iter()
        .enumerate()
        .map(|(offset, &close)| {
            let day = first.checked_add_days(offset as u32).expect("in range");
            PriceBar::new(day, close, close + 2.0, close - 1.0, close, 1_000_000 + offset as u64)
                .expect("valid bar")
        })
        .collect();
    PriceSeries::new(bars)
}

fn aapl_meta() -> QuoteMeta {
    QuoteMeta::new()
        .with("longName", "Apple Inc.")
        .with("currency", "USD")
        .with("marketCap", 1_500_000_000.0)
        .with("trailingPE", 28.53)
        .with("dividendYield", 0.0421)
        .with("sector", "Technology")
}

fn builder(source: FixtureSource) -> SnapshotBuilder<FixtureSource> {
    SnapshotBuilder::new(source).with_today(date("2024-12-31"))
}

fn one_year(ticker: &str, averages: MovingAverageSelection) -> SnapshotRequest {
    SnapshotRequest::new(ticker, LookbackWindow::days(365).expect("window"), averages)
        .expect("valid request")
}

fn ready(outcome: SnapshotOutcome) -> Box<tickerlens_core::QuoteSnapshot> {
    match outcome {
        SnapshotOutcome::Ready(snapshot) => snapshot,
        SnapshotOutcome::NoData(no_data) => panic!("expected a snapshot, got {no_data:?}"),
    }
}

// =============================================================================
// Snapshot: Happy Path
// =============================================================================

#[tokio::test]
async fn when_a_year_of_bars_is_available_snapshot_reports_latest_move() {
    // Given: 300 daily bars for AAPL whose last two closes are 150.00 and 152.50
    let mut closes: Vec<f64> = (0..298).map(|i| 120.0 + (i % 20) as f64).collect();
    closes.extend([150.0, 152.5]);
    let source = FixtureSource::new().with_symbol(
        symbol("AAPL"),
        MarketData::new(daily_series(&closes, "2024-12-31"), aapl_meta()),
    );

    // When: A one-year snapshot is built
    let snapshot = ready(
        builder(source)
            .build(&one_year("aapl", MovingAverageSelection::none()))
            .await,
    );

    // Then: The headline metrics come from the last two bars
    let DerivedMetrics {
        latest_close,
        previous_close,
        absolute_change,
        percent_change,
        ..
    } = snapshot.metrics.clone();
    assert_eq!(snapshot.bars.len(), 300);
    assert_eq!(latest_close, 152.5);
    assert_eq!(previous_close, 150.0);
    assert_eq!(absolute_change, 2.5);
    let pct = percent_change.expect("previous close is non-zero");
    assert!((pct - 1.6667).abs() < 1e-3, "got {pct}");

    // And: The display fields are formatted
    assert_eq!(snapshot.display.headline[0].value, "$152.50");
    assert_eq!(snapshot.display.headline[0].delta.as_deref(), Some("1.67%"));
    assert_eq!(snapshot.display.headline[1].value, "$154.50");
    assert_eq!(snapshot.display.headline[2].value, "$151.50");
    assert_eq!(snapshot.display.headline[3].value, "1,000,299");
    assert_eq!(snapshot.display.key_statistic("Market Cap"), Some("1.50B"));
    assert_eq!(snapshot.display.key_statistic("Trailing P/E"), Some("28.53"));
    assert_eq!(snapshot.display.key_statistic("Dividend Yield"), Some("4.21%"));
    assert_eq!(snapshot.display.profile.name, "Apple Inc.");
    assert_eq!(snapshot.display.profile.sector, "Technology");
}

#[tokio::test]
async fn when_bars_are_listed_newest_first_dates_descend() {
    // Given: A short history
    let source = FixtureSource::new().with_symbol(
        symbol("AAPL"),
        MarketData::new(daily_series(&[10.0, 11.0, 12.0], "2024-12-31"), aapl_meta()),
    );

    // When: The snapshot's raw data view is requested
    let snapshot = ready(
        builder(source)
            .build(&one_year("AAPL", MovingAverageSelection::none()))
            .await,
    );
    let dates: Vec<TradingDate> = snapshot
        .bars_newest_first()
        .iter()
        .map(|bar| bar.date)
        .collect();

    // Then: Dates are in descending order
    assert_eq!(
        dates,
        vec![date("2024-12-31"), date("2024-12-30"), date("2024-12-29")]
    );
}

// =============================================================================
// Snapshot: No Data
// =============================================================================

#[tokio::test]
async fn when_provider_returns_no_bars_outcome_is_no_data() {
    // Given: A ticker the provider knows but with an empty history
    let source = FixtureSource::new().with_symbol(
        symbol("ZZZZ"),
        MarketData::new(PriceSeries::empty(), QuoteMeta::new()),
    );

    // When: A snapshot is built
    let outcome = builder(source)
        .build(&one_year("zzzz", MovingAverageSelection::standard()))
        .await;

    // Then: No partial snapshot is produced, only the user-facing message
    let no_data = outcome.no_data().expect("no data");
    assert_eq!(no_data.reason, NoDataReason::EmptyResult);
    assert_eq!(
        no_data.message,
        "Could not find data for ticker: ZZZZ. Please check the symbol and try again."
    );
    assert!(outcome.snapshot().is_none());
}

#[tokio::test]
async fn when_provider_fails_outcome_is_no_data_not_an_error() {
    // Given: A provider that is down
    let source = FixtureSource::new()
        .with_symbol(
            symbol("AAPL"),
            MarketData::new(daily_series(&[1.0, 2.0], "2024-12-31"), aapl_meta()),
        )
        .with_failure(SourceError::unavailable("connection refused"));

    // When: A snapshot is built
    let outcome = builder(source)
        .build(&one_year("AAPL", MovingAverageSelection::none()))
        .await;

    // Then: The failure becomes a no-data outcome carrying the cause
    let no_data = outcome.no_data().expect("no data");
    assert_eq!(no_data.reason, NoDataReason::FetchFailure);
    assert!(no_data.message.starts_with("Could not find data for ticker: AAPL."));
    assert!(no_data
        .detail
        .as_deref()
        .is_some_and(|detail| detail.contains("connection refused")));
}

#[tokio::test]
async fn when_bars_fall_outside_the_window_outcome_is_no_data() {
    // Given: History that ended years before the requested window
    let source = FixtureSource::new().with_symbol(
        symbol("OLD"),
        MarketData::new(daily_series(&[5.0, 6.0], "2019-06-28"), QuoteMeta::new()),
    );

    // When: A one-year snapshot ending 2024-12-31 is built
    let outcome = builder(source)
        .build(&one_year("OLD", MovingAverageSelection::none()))
        .await;

    // Then: Nothing is in range, so there is no data
    assert_eq!(
        outcome.no_data().map(|no_data| no_data.reason),
        Some(NoDataReason::EmptyResult)
    );
}

// =============================================================================
// Snapshot: Edge Cases
// =============================================================================

#[tokio::test]
async fn when_only_one_bar_exists_change_is_zero() {
    // Given: A single session of history
    let source = FixtureSource::new().with_symbol(
        symbol("IPO"),
        MarketData::new(daily_series(&[42.0], "2024-12-31"), QuoteMeta::new()),
    );

    // When: A snapshot is built
    let snapshot = ready(
        builder(source)
            .build(&one_year("IPO", MovingAverageSelection::standard()))
            .await,
    );

    // Then: Previous close equals latest close and the change is zero
    assert_eq!(snapshot.metrics.previous_close, 42.0);
    assert_eq!(snapshot.metrics.absolute_change, 0.0);
    assert_eq!(snapshot.metrics.percent_change, Some(0.0));
    assert_eq!(snapshot.display.headline[0].delta.as_deref(), Some("0.00%"));

    // And: Averages exist but are undefined
    assert!(snapshot
        .moving_averages
        .iter()
        .all(|average| average.values == vec![None]));
}

#[tokio::test]
async fn when_previous_close_is_zero_percent_change_is_undefined() {
    // Given: A previous session that closed at zero
    let bars = PriceSeries::new(vec![
        PriceBar::new(date("2024-12-30"), 0.0, 0.0, 0.0, 0.0, 0).expect("valid bar"),
        PriceBar::new(date("2024-12-31"), 1.0, 1.5, 0.5, 1.25, 10).expect("valid bar"),
    ]);
    let source = FixtureSource::new()
        .with_symbol(symbol("PENNY"), MarketData::new(bars, QuoteMeta::new()));

    // When: A snapshot is built
    let snapshot = ready(
        builder(source)
            .build(&one_year("PENNY", MovingAverageSelection::none()))
            .await,
    );

    // Then: The percent change is absent and renders as N/A
    assert_eq!(snapshot.metrics.percent_change, None);
    assert_eq!(snapshot.metrics.absolute_change, 1.25);
    assert_eq!(snapshot.display.headline[0].delta.as_deref(), Some(NOT_AVAILABLE));
}

#[tokio::test]
async fn when_sma20_is_requested_values_start_at_the_twentieth_bar() {
    // Given: 60 bars with distinct closes
    let closes: Vec<f64> = (1..=60).map(f64::from).collect();
    let source = FixtureSource::new().with_symbol(
        symbol("MSFT"),
        MarketData::new(daily_series(&closes, "2024-12-31"), QuoteMeta::new()),
    );

    // When: SMA 20 and SMA 50 are requested
    let snapshot = ready(
        builder(source)
            .build(&one_year("MSFT", MovingAverageSelection::standard()))
            .await,
    );

    // Then: SMA 20 is undefined before index 19 and equals the trailing mean after
    let sma20 = snapshot.moving_average(20).expect("sma 20 computed");
    assert_eq!(sma20.values.len(), 60);
    for (index, value) in sma20.values.iter().enumerate() {
        if index < 19 {
            assert_eq!(*value, None, "index {index}");
        } else {
            let expected = closes[index - 19..=index].iter().sum::<f64>() / 20.0;
            let actual = value.expect("defined");
            assert!((actual - expected).abs() < 1e-9, "index {index}");
        }
    }

    // And: SMA 50 is aligned the same way
    let sma50 = snapshot.moving_average(50).expect("sma 50 computed");
    assert_eq!(sma50.values.iter().filter(|value| value.is_some()).count(), 11);
    assert_eq!(sma50.latest(), Some(35.5));
}

#[tokio::test]
async fn when_no_averages_are_selected_none_are_computed() {
    // Given: Plenty of history
    let closes: Vec<f64> = (1..=80).map(f64::from).collect();
    let source = FixtureSource::new().with_symbol(
        symbol("MSFT"),
        MarketData::new(daily_series(&closes, "2024-12-31"), QuoteMeta::new()),
    );

    // When: No moving averages are selected
    let snapshot = ready(
        builder(source)
            .build(&one_year("MSFT", MovingAverageSelection::none()))
            .await,
    );

    // Then: The snapshot carries none
    assert!(snapshot.moving_averages.is_empty());
}

#[tokio::test]
async fn when_metadata_is_missing_statistics_render_not_available() {
    // Given: Bars that arrived with a metadata warning and no metadata
    let data = MarketData::new(daily_series(&[10.0, 11.0], "2024-12-31"), QuoteMeta::new())
        .with_warning("company metadata unavailable: quoteSummary returned status 500");
    let source = FixtureSource::new().with_symbol(symbol("AAPL"), data);

    // When: A snapshot is built
    let snapshot = ready(
        builder(source)
            .build(&one_year("AAPL", MovingAverageSelection::none()))
            .await,
    );

    // Then: Every key statistic is N/A, the profile falls back, and the warning is kept
    assert!(snapshot
        .display
        .key_statistics
        .iter()
        .all(|field| field.value == NOT_AVAILABLE));
    assert_eq!(snapshot.display.profile.name, "AAPL");
    assert_eq!(snapshot.display.profile.summary, "No summary available.");
    assert_eq!(snapshot.warnings.len(), 1);
}

#[tokio::test]
async fn when_metadata_is_malformed_only_that_field_degrades() {
    // Given: Metadata with one non-numeric statistic
    let meta = aapl_meta().with("forwardPE", "Infinity and beyond");
    let source = FixtureSource::new().with_symbol(
        symbol("AAPL"),
        MarketData::new(daily_series(&[10.0, 11.0], "2024-12-31"), meta),
    );

    // When: A snapshot is built
    let snapshot = ready(
        builder(source)
            .build(&one_year("AAPL", MovingAverageSelection::none()))
            .await,
    );

    // Then: The malformed field is N/A and its neighbours are unaffected
    assert_eq!(snapshot.display.key_statistic("Forward P/E"), Some(NOT_AVAILABLE));
    assert_eq!(snapshot.display.key_statistic("Trailing P/E"), Some("28.53"));
}

#[tokio::test]
async fn when_ticker_is_invalid_request_is_rejected_before_fetching() {
    // Given/When: A request for a malformed ticker
    let result = SnapshotRequest::new(
        "AA PL",
        LookbackWindow::days(30).expect("window"),
        MovingAverageSelection::none(),
    );

    // Then: It is a caller error, not a no-data outcome
    assert!(result.is_err());
}
