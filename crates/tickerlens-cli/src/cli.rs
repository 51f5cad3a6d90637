//! CLI argument definitions for tickerlens.
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--format` | `table` | Output format (json, table) |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--mock` | `false` | Serve deterministic demo data instead of Yahoo |
//! | `--no-cache` | `false` | Skip the response cache |
//! | `--cache-ttl-secs` | config | Response cache TTL |
//! | `--timeout-ms` | config | Per-request HTTP timeout |
//! | `--rows` | `10` | Recent sessions listed in table output |
//!
//! # Examples
//!
//! ```bash
//! tickerlens snapshot AAPL
//! tickerlens snapshot msft --days 90 --sma20 --format json --pretty
//! tickerlens snapshot TSLA --start 2024-01-01 --end 2024-06-30 --sma 10 --sma 200
//! tickerlens snapshot AAPL --mock --sma20 --sma50
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Quote snapshots for a single ticker.
///
/// Fetches daily price history and company metadata, then prints the
/// latest price, day range, change, moving averages and key statistics.
#[derive(Debug, Parser)]
#[command(
    name = "tickerlens",
    author,
    version,
    about = "Quote snapshots for a single ticker",
    long_about = "tickerlens fetches daily price history and company metadata for a ticker \
and reduces it to a display-ready snapshot:\n\
\n\
  • latest price, day high/low, volume and percent change\n\
  • optional simple moving averages\n\
  • key statistics and company profile\n\
\n\
Use 'tickerlens <command> --help' for command-specific help."
)]
pub struct Cli {
    /// Output format for results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Serve deterministic demo data (AAPL, MSFT, GOOGL, TSLA) without network access.
    #[arg(long, global = true, env = "TICKERLENS_MOCK", default_value_t = false)]
    pub mock: bool,

    /// Always fetch upstream and skip the response cache.
    #[arg(long, global = true, default_value_t = false)]
    pub no_cache: bool,

    /// Response cache TTL in seconds; overrides TICKERLENS_CACHE_TTL_SECS.
    #[arg(long, global = true)]
    pub cache_ttl_secs: Option<u64>,

    /// Request timeout in milliseconds; overrides TICKERLENS_TIMEOUT_MS.
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    /// Number of recent sessions listed in table output.
    #[arg(long, global = true, default_value_t = 10)]
    pub rows: usize,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text layout.
    Table,
    /// The full snapshot as one JSON object.
    Json,
}

/// Available CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Build a quote snapshot for one ticker.
    ///
    /// Exits with status 3 when the provider has no data for the ticker
    /// and window.
    ///
    /// # Examples
    ///
    ///   tickerlens snapshot AAPL
    ///   tickerlens snapshot AAPL --days 30 --sma20
    Snapshot(SnapshotArgs),
}

/// Arguments for the `snapshot` command.
#[derive(Debug, Args)]
pub struct SnapshotArgs {
    /// Ticker symbol (case-insensitive), e.g. AAPL or ^GSPC.
    pub ticker: String,

    /// Trailing lookback in calendar days; defaults to TICKERLENS_LOOKBACK_DAYS or 365.
    #[arg(long, conflicts_with_all = ["start", "end"])]
    pub days: Option<u32>,

    /// First date of an explicit window (YYYY-MM-DD).
    #[arg(long, requires = "end")]
    pub start: Option<String>,

    /// Last date of an explicit window (YYYY-MM-DD), inclusive.
    #[arg(long, requires = "start")]
    pub end: Option<String>,

    /// Compute the 20-session simple moving average.
    #[arg(long, default_value_t = false)]
    pub sma20: bool,

    /// Compute the 50-session simple moving average.
    #[arg(long, default_value_t = false)]
    pub sma50: bool,

    /// Compute an additional moving average over WINDOW sessions; repeatable.
    #[arg(long = "sma", value_name = "WINDOW")]
    pub sma: Vec<usize>,
}
