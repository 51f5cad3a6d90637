use std::time::Duration;

use tickerlens_core::{
    CacheMode, CacheStore, CachedSource, FixtureSource, LookbackWindow, MarketDataSource,
    MovingAverageSelection, SnapshotBuilder, SnapshotConfig, SnapshotOutcome, SnapshotRequest,
    TradingDate, ValidationError, YahooSource,
};
use tracing::debug;

use crate::cli::{Cli, SnapshotArgs};
use crate::error::CliError;

pub async fn run(cli: &Cli, args: &SnapshotArgs) -> Result<SnapshotOutcome, CliError> {
    let config = resolve_config(cli, SnapshotConfig::from_env()?)?;
    let request = SnapshotRequest::new(
        &args.ticker,
        lookback_window(args, &config)?,
        average_selection(args)?,
    )?;
    let mode = if cli.no_cache {
        CacheMode::Bypass
    } else {
        CacheMode::Use
    };
    debug!(?config, ?mode, mock = cli.mock, "snapshot configuration");

    let outcome = if cli.mock {
        build(FixtureSource::demo(TradingDate::today()), &config, mode, &request).await
    } else {
        let source = YahooSource::from_config(&config)
            .map_err(|error| CliError::Command(error.to_string()))?;
        build(source, &config, mode, &request).await
    };

    Ok(outcome)
}

async fn build<S>(
    source: S,
    config: &SnapshotConfig,
    mode: CacheMode,
    request: &SnapshotRequest,
) -> SnapshotOutcome
where
    S: MarketDataSource,
{
    let source = CachedSource::new(source, CacheStore::new(config.cache_ttl)).with_mode(mode);
    SnapshotBuilder::new(source)
        .with_config(config)
        .build(request)
        .await
}

/// Apply command-line overrides on top of the environment configuration.
fn resolve_config(cli: &Cli, config: SnapshotConfig) -> Result<SnapshotConfig, CliError> {
    let mut config = config;
    if let Some(ttl) = cli.cache_ttl_secs {
        config = config.with_cache_ttl(Duration::from_secs(ttl));
    }
    if cli.no_cache {
        config = config.with_cache_ttl(Duration::ZERO);
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        if timeout_ms == 0 {
            return Err(CliError::Command(String::from(
                "--timeout-ms must be greater than zero",
            )));
        }
        config = config.with_request_timeout_ms(timeout_ms);
    }
    Ok(config)
}

fn lookback_window(args: &SnapshotArgs, config: &SnapshotConfig) -> Result<LookbackWindow, ValidationError> {
    match (&args.start, &args.end) {
        (Some(start), Some(end)) => {
            LookbackWindow::between(TradingDate::parse(start)?, TradingDate::parse(end)?)
        }
        _ => LookbackWindow::days(args.days.unwrap_or(config.default_lookback_days)),
    }
}

fn average_selection(args: &SnapshotArgs) -> Result<MovingAverageSelection, ValidationError> {
    args.sma.iter().try_fold(
        MovingAverageSelection::none()
            .with_sma20(args.sma20)
            .with_sma50(args.sma50),
        |selection, &window| selection.with_window(window),
    )
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::cli::Command;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["tickerlens"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).expect("valid arguments")
    }

    fn snapshot_args(cli: &Cli) -> &SnapshotArgs {
        let Command::Snapshot(args) = &cli.command;
        args
    }

    #[test]
    fn window_defaults_to_configured_lookback() {
        let cli = parse(&["snapshot", "AAPL"]);
        let config = SnapshotConfig {
            default_lookback_days: 30,
            ..SnapshotConfig::default()
        };
        assert_eq!(
            lookback_window(snapshot_args(&cli), &config),
            Ok(LookbackWindow::Days(30))
        );
    }

    #[test]
    fn explicit_range_is_parsed() {
        let cli = parse(&["snapshot", "AAPL", "--start", "2024-01-01", "--end", "2024-03-31"]);
        let window = lookback_window(snapshot_args(&cli), &SnapshotConfig::default())
            .expect("valid window");
        assert!(matches!(window, LookbackWindow::Range(_)));

        let cli = parse(&["snapshot", "AAPL", "--start", "2024-03-31", "--end", "2024-01-01"]);
        assert!(lookback_window(snapshot_args(&cli), &SnapshotConfig::default()).is_err());
    }

    #[test]
    fn averages_merge_flags_and_custom_windows() {
        let cli = parse(&["snapshot", "AAPL", "--sma50", "--sma", "5", "--sma", "50"]);
        let selection = average_selection(snapshot_args(&cli)).expect("valid selection");
        assert_eq!(selection.windows().collect::<Vec<_>>(), vec![5, 50]);

        let cli = parse(&["snapshot", "AAPL", "--sma", "0"]);
        assert_eq!(
            average_selection(snapshot_args(&cli)),
            Err(ValidationError::ZeroWindow)
        );
    }

    #[test]
    fn flags_override_environment_config() {
        let cli = parse(&["snapshot", "AAPL", "--cache-ttl-secs", "60", "--timeout-ms", "500"]);
        let config = resolve_config(&cli, SnapshotConfig::default()).expect("valid overrides");
        assert_eq!(config.cache_ttl, Duration::from_secs(60));
        assert_eq!(config.request_timeout_ms, 500);

        let cli = parse(&["snapshot", "AAPL", "--no-cache", "--cache-ttl-secs", "60"]);
        let config = resolve_config(&cli, SnapshotConfig::default()).expect("valid overrides");
        assert_eq!(config.cache_ttl, Duration::ZERO);

        let cli = parse(&["snapshot", "AAPL", "--timeout-ms", "0"]);
        assert!(resolve_config(&cli, SnapshotConfig::default()).is_err());
    }

    #[tokio::test]
    async fn mock_mode_builds_a_snapshot() {
        let cli = parse(&["snapshot", "msft", "--mock", "--days", "120", "--sma20"]);
        let outcome = run(&cli, snapshot_args(&cli)).await.expect("command runs");

        let snapshot = outcome.snapshot().expect("demo data is available");
        assert_eq!(snapshot.symbol.as_str(), "MSFT");
        assert_eq!(snapshot.display.profile.name, "Microsoft Corporation");
        assert!(snapshot.moving_average(20).is_some());
    }

    #[tokio::test]
    async fn mock_mode_reports_unknown_ticker_as_no_data() {
        let cli = parse(&["snapshot", "NOPE", "--mock"]);
        let outcome = run(&cli, snapshot_args(&cli)).await.expect("command runs");
        assert!(!outcome.is_ready());
    }
}
