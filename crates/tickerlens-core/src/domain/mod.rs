//! # Domain Models
//!
//! Canonical, validated types flowing through the snapshot pipeline.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Symbol`] | Normalized ticker |
//! | [`TradingDate`] | Session date (`YYYY-MM-DD`) |
//! | [`LookbackWindow`] | Trailing days or explicit range |
//! | [`DateRange`] | Resolved inclusive range |
//! | [`PriceBar`] | Daily OHLCV record |
//! | [`PriceSeries`] | Ascending, date-unique bar sequence |
//! | [`QuoteMeta`] | Optional scalar metadata fields |
//! | [`MarketData`] | Bars plus metadata for one fetch |
//!
//! Construction validates invariants:
//!
//! ```rust
//! use tickerlens_core::{PriceBar, TradingDate, ValidationError};
//!
//! let date = TradingDate::parse("2024-01-02").unwrap();
//! let invalid = PriceBar::new(date, 100.0, 95.0, 105.0, 102.0, 1_000);
//! assert!(matches!(invalid, Err(ValidationError::InvalidBarRange)));
//! ```

mod date;
mod models;
mod symbol;
mod window;

pub use date::TradingDate;
pub use models::{MarketData, MetaValue, PriceBar, PriceSeries, QuoteMeta};
pub use symbol::Symbol;
pub use window::{DateRange, LookbackWindow};
