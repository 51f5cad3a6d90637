//! Market-data source trait and request/error types.
//!
//! A [`MarketDataSource`] is the only upstream collaborator of the snapshot
//! builder: given a ticker and a resolved date range it returns the daily
//! bars plus the flat metadata record for that ticker.
//!
//! # Example
//!
//! ```rust,ignore
//! use tickerlens_core::{DateRange, HistoryRequest, MarketDataSource, Symbol, YahooSource};
//!
//! async fn fetch(source: &YahooSource, range: DateRange) -> Result<(), SourceError> {
//!     let request = HistoryRequest::new(Symbol::parse("AAPL")?, range);
//!     let data = source.fetch_history(request).await?;
//!     println!("{} bars, {} metadata fields", data.bars.len(), data.meta.len());
//!     Ok(())
//! }
//! ```

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::{DateRange, MarketData, ProviderId, Symbol};

/// Health state reported by a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthState {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Runtime source health snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub state: HealthState,
    pub rate_available: bool,
}

impl HealthStatus {
    pub const fn new(state: HealthState, rate_available: bool) -> Self {
        Self {
            state,
            rate_available,
        }
    }

    pub const fn healthy() -> Self {
        Self::new(HealthState::Healthy, true)
    }
}

/// Adapter-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceErrorKind {
    /// Transport failure or provider outage.
    Unavailable,
    /// The provider does not know the ticker.
    NotFound,
    RateLimited,
    InvalidRequest,
    Internal,
}

/// Structured source error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
    retryable: bool,
}

impl SourceError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Unavailable,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn not_found(symbol: &Symbol) -> Self {
        Self {
            kind: SourceErrorKind::NotFound,
            message: format!("no market data found for '{symbol}'"),
            retryable: false,
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::RateLimited,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::InvalidRequest,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Internal,
            message: message.into(),
            retryable: false,
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::Unavailable => "source.unavailable",
            SourceErrorKind::NotFound => "source.not_found",
            SourceErrorKind::RateLimited => "source.rate_limited",
            SourceErrorKind::InvalidRequest => "source.invalid_request",
            SourceErrorKind::Internal => "source.internal",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

/// Request payload for a daily history fetch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HistoryRequest {
    pub symbol: Symbol,
    pub range: DateRange,
}

impl HistoryRequest {
    pub fn new(symbol: Symbol, range: DateRange) -> Self {
        Self { symbol, range }
    }
}

/// Boxed future returned by [`MarketDataSource::fetch_history`].
pub type HistoryFuture<'a> =
    Pin<Box<dyn Future<Output = Result<MarketData, SourceError>> + Send + 'a>>;

/// Upstream market-data contract.
///
/// Implementations must be `Send + Sync` so one instance can serve every
/// request of a process. Returning an empty [`PriceSeries`](crate::PriceSeries)
/// is a valid answer for a window without trading sessions.
pub trait MarketDataSource: Send + Sync {
    /// Returns the provider identifier.
    fn id(&self) -> ProviderId;

    /// Fetches daily bars and metadata for `req.symbol` over `req.range`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] when the provider is unreachable, rate limits
    /// the call, or does not know the ticker.
    fn fetch_history<'a>(&'a self, req: HistoryRequest) -> HistoryFuture<'a>;

    /// Returns the current health status of this source.
    fn health<'a>(&'a self) -> Pin<Box<dyn Future<Output = HealthStatus> + Send + 'a>>;
}

impl<S> MarketDataSource for std::sync::Arc<S>
where
    S: MarketDataSource + ?Sized,
{
    fn id(&self) -> ProviderId {
        (**self).id()
    }

    fn fetch_history<'a>(&'a self, req: HistoryRequest) -> HistoryFuture<'a> {
        (**self).fetch_history(req)
    }

    fn health<'a>(&'a self) -> Pin<Box<dyn Future<Output = HealthStatus> + Send + 'a>> {
        (**self).health()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_are_stable() {
        let symbol = Symbol::parse("ZZZZ").expect("valid symbol");
        assert_eq!(SourceError::not_found(&symbol).code(), "source.not_found");
        assert_eq!(SourceError::unavailable("down").code(), "source.unavailable");
        assert_eq!(SourceError::rate_limited("slow").code(), "source.rate_limited");
    }

    #[test]
    fn transient_errors_are_retryable() {
        assert!(SourceError::unavailable("timeout").retryable());
        assert!(SourceError::rate_limited("429").retryable());
        assert!(!SourceError::internal("bad payload").retryable());
    }

    #[test]
    fn display_includes_code() {
        let error = SourceError::unavailable("yahoo returned status 503");
        assert_eq!(
            error.to_string(),
            "yahoo returned status 503 (source.unavailable)"
        );
    }
}
