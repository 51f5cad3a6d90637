//! # Tickerlens Core
//!
//! Quote snapshots for a single ticker: daily price history plus company
//! metadata, reduced to the handful of display-ready fields a dashboard shows.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Market-data sources (Yahoo, in-memory fixtures) |
//! | [`cache`] | TTL response cache and the caching source decorator |
//! | [`config`] | Runtime configuration with environment overrides |
//! | [`data_source`] | Source trait and request/error types |
//! | [`domain`] | Validated domain types (Symbol, PriceBar, QuoteMeta, ...) |
//! | [`error`] | Validation and configuration errors |
//! | [`format`] | Currency, percentage and magnitude formatting |
//! | [`http_client`] | HTTP transport abstraction |
//! | [`metrics`] | Latest-session metrics |
//! | [`moving_average`] | Simple moving averages |
//! | [`snapshot`] | The snapshot builder |
//! | [`source`] | Provider identifiers |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use tickerlens_core::{
//!     CacheStore, CachedSource, LookbackWindow, MovingAverageSelection, SnapshotBuilder,
//!     SnapshotConfig, SnapshotOutcome, SnapshotRequest, YahooSource,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SnapshotConfig::from_env()?;
//!     let source = CachedSource::new(YahooSource::from_config(&config)?, CacheStore::new(config.cache_ttl));
//!     let builder = SnapshotBuilder::new(source).with_config(&config);
//!
//!     let request = SnapshotRequest::new("AAPL", LookbackWindow::days(365)?, MovingAverageSelection::standard())?;
//!     match builder.build(&request).await {
//!         SnapshotOutcome::Ready(snapshot) => {
//!             for field in &snapshot.display.headline {
//!                 println!("{}: {}", field.label, field.value);
//!             }
//!         }
//!         SnapshotOutcome::NoData(no_data) => eprintln!("{}", no_data.message),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  CLI / caller   │
//! └────────┬────────┘
//!          │ SnapshotRequest
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ SnapshotBuilder │────▶│ metrics / SMA /  │
//! │                 │     │ format           │
//! └────────┬────────┘     └──────────────────┘
//!          │ HistoryRequest
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │  CachedSource   │────▶│ CacheStore (TTL) │
//! └────────┬────────┘     └──────────────────┘
//!          │ miss
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │  YahooSource    │────▶│ HttpClient       │
//! │ (Source Trait)  │     │ (reqwest)        │
//! └─────────────────┘     └──────────────────┘
//! ```
//!
//! ## Error Handling
//!
//! Bad input is rejected up front with [`ValidationError`]. Once a request
//! is valid, the builder never fails: provider errors and empty histories
//! become [`SnapshotOutcome::NoData`], and missing or malformed metadata
//! renders as `N/A`.
//!
//! ```rust
//! use tickerlens_core::{SourceError, SourceErrorKind};
//!
//! fn describe(error: &SourceError) -> &'static str {
//!     match error.kind() {
//!         SourceErrorKind::NotFound => "unknown ticker",
//!         SourceErrorKind::RateLimited => "slow down",
//!         _ => "provider problem",
//!     }
//! }
//! ```

pub mod adapters;
pub mod cache;
pub mod config;
pub mod data_source;
pub mod domain;
pub mod error;
pub mod format;
pub mod http_client;
pub mod metrics;
pub mod moving_average;
pub mod snapshot;
pub mod source;

// Adapter implementations
pub use adapters::{FixtureSource, YahooSource};

// Caching
pub use cache::{CacheKey, CacheMode, CacheStore, CachedSource, HistoryCache};

// Configuration
pub use config::SnapshotConfig;

// Data source trait and types
pub use data_source::{
    HealthState, HealthStatus, HistoryFuture, HistoryRequest, MarketDataSource, SourceError,
    SourceErrorKind,
};

// Domain models
pub use domain::{
    DateRange, LookbackWindow, MarketData, MetaValue, PriceBar, PriceSeries, QuoteMeta, Symbol,
    TradingDate,
};

// Error types
pub use error::{ConfigError, ValidationError};

// Formatting
pub use format::{format_field, FieldFormatter, FormatKind, NOT_AVAILABLE};

// HTTP client types
pub use http_client::{HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestHttpClient};

// Derivations
pub use metrics::{derive_metrics, DerivedMetrics};
pub use moving_average::{simple_moving_average, MovingAverage, MovingAverageSelection};

// Snapshot pipeline
pub use snapshot::{
    CompanyProfile, DisplayField, NoData, NoDataReason, QuoteSnapshot, SnapshotBuilder,
    SnapshotDisplay, SnapshotOutcome, SnapshotRequest,
};

// Source identifiers
pub use source::ProviderId;
