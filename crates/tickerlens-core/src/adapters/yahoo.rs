use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::SnapshotConfig;
use crate::data_source::{
    HealthState, HealthStatus, HistoryFuture, HistoryRequest, MarketDataSource, SourceError,
};
use crate::http_client::{HttpClient, HttpRequest, HttpResponse, ReqwestHttpClient};
use crate::{MarketData, MetaValue, PriceBar, PriceSeries, ProviderId, QuoteMeta, Symbol, TradingDate};

const CHART_ENDPOINT: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const SUMMARY_ENDPOINT: &str = "https://query2.finance.yahoo.com/v10/finance/quoteSummary";
const COOKIE_ENDPOINT: &str = "https://fc.yahoo.com";
const CRUMB_ENDPOINTS: [&str; 2] = [
    "https://query1.finance.yahoo.com/v1/test/getcrumb",
    "https://query2.finance.yahoo.com/v1/test/getcrumb",
];
const REFERER: &str = "https://finance.yahoo.com/";

/// quoteSummary modules, in precedence order when two modules share a field.
pub const SUMMARY_MODULES: [&str; 5] = [
    "price",
    "summaryDetail",
    "defaultKeyStatistics",
    "financialData",
    "assetProfile",
];

const SECONDS_PER_DAY: i64 = 86_400;

// ============================================================================
// Crumb handshake
// ============================================================================

#[derive(Debug, Clone)]
struct CrumbState {
    crumb: String,
    fetched_at: Instant,
}

/// Caches the crumb token quoteSummary requires.
///
/// Yahoo hands out a crumb only after a session cookie has been set by
/// `fc.yahoo.com`; the cookie itself lives in the transport's cookie jar or
/// comes from the configured session cookie.
#[derive(Debug)]
struct YahooAuthManager {
    state: tokio::sync::Mutex<Option<CrumbState>>,
    ttl: Duration,
}

impl YahooAuthManager {
    fn new(ttl: Duration) -> Self {
        Self {
            state: tokio::sync::Mutex::new(None),
            ttl,
        }
    }

    /// Cached crumb, refreshed when missing or older than the TTL.
    ///
    /// The lock is held across the handshake so concurrent callers share one refresh.
    async fn crumb(
        &self,
        http_client: &dyn HttpClient,
        cookie: Option<&str>,
        timeout_ms: u64,
    ) -> Result<String, SourceError> {
        let mut state = self.state.lock().await;
        if let Some(cached) = state.as_ref() {
            if cached.fetched_at.elapsed() < self.ttl {
                return Ok(cached.crumb.clone());
            }
        }

        let crumb = handshake(http_client, cookie, timeout_ms).await?;
        *state = Some(CrumbState {
            crumb: crumb.clone(),
            fetched_at: Instant::now(),
        });
        Ok(crumb)
    }

    async fn invalidate(&self) {
        *self.state.lock().await = None;
    }
}

async fn handshake(
    http_client: &dyn HttpClient,
    cookie: Option<&str>,
    timeout_ms: u64,
) -> Result<String, SourceError> {
    debug!("refreshing yahoo crumb");

    // fc.yahoo.com answers 404 but still sets the session cookie.
    let cookie_request = HttpRequest::get(COOKIE_ENDPOINT)
        .with_header("referer", REFERER)
        .with_cookie(cookie)
        .with_timeout_ms(timeout_ms);
    http_client.execute(cookie_request).await.map_err(|error| {
        SourceError::unavailable(format!("failed to fetch yahoo cookie: {}", error.message()))
    })?;

    for endpoint in CRUMB_ENDPOINTS {
        let request = HttpRequest::get(endpoint)
            .with_header("referer", REFERER)
            .with_cookie(cookie)
            .with_timeout_ms(timeout_ms);

        let response = match http_client.execute(request).await {
            Ok(response) => response,
            Err(error) => {
                debug!(endpoint, error = %error, "crumb endpoint failed");
                continue;
            }
        };

        if response.status == 429 {
            return Err(SourceError::rate_limited(
                "yahoo rate limited the crumb request",
            ));
        }
        if !response.is_success() {
            continue;
        }

        let body = response.body.trim();
        if body.contains("<html") || body.contains("<!DOCTYPE") {
            continue;
        }
        if body.to_ascii_lowercase().contains("too many requests") {
            return Err(SourceError::rate_limited(
                "yahoo rate limited the crumb request",
            ));
        }
        if !body.is_empty() && body.len() < 100 && !body.contains(char::is_whitespace) {
            return Ok(body.to_owned());
        }
    }

    Err(SourceError::unavailable(
        "failed to fetch yahoo crumb from all endpoints",
    ))
}

// ============================================================================
// Yahoo source
// ============================================================================

/// Daily history and company metadata from Yahoo Finance.
///
/// Bars come from the v8 chart endpoint; metadata from the v10 quoteSummary
/// endpoint. A metadata failure does not fail the fetch: the bars are
/// returned with an empty [`QuoteMeta`] and a warning.
pub struct YahooSource {
    http_client: Arc<dyn HttpClient>,
    auth: YahooAuthManager,
    session_cookie: Option<String>,
    timeout_ms: u64,
    rate_limited: AtomicBool,
}

impl YahooSource {
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client,
            auth: YahooAuthManager::new(Duration::from_secs(3600)),
            session_cookie: None,
            timeout_ms: 10_000,
            rate_limited: AtomicBool::new(false),
        }
    }

    /// Production source over a reqwest transport configured from `config`.
    pub fn from_config(config: &SnapshotConfig) -> Result<Self, SourceError> {
        let client = ReqwestHttpClient::new()
            .map_err(|error| SourceError::internal(error.message().to_owned()))?;
        Ok(Self::new(Arc::new(client))
            .with_session_cookie(config.session_cookie.clone())
            .with_timeout_ms(config.request_timeout_ms))
    }

    pub fn with_session_cookie(mut self, cookie: Option<String>) -> Self {
        self.session_cookie = cookie;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_auth_ttl(mut self, ttl: Duration) -> Self {
        self.auth = YahooAuthManager::new(ttl);
        self
    }

    fn request(&self, url: String) -> HttpRequest {
        HttpRequest::get(url)
            .with_header("referer", REFERER)
            .with_cookie(self.session_cookie.as_deref())
            .with_timeout_ms(self.timeout_ms)
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, SourceError> {
        debug!(url = %request.url, "yahoo request");
        let response = self.http_client.execute(request).await.map_err(|error| {
            SourceError::unavailable(format!("yahoo transport error: {}", error.message()))
        })?;

        if response.status == 429 {
            self.rate_limited.store(true, Ordering::Relaxed);
            return Err(SourceError::rate_limited("yahoo returned status 429"));
        }
        self.rate_limited.store(false, Ordering::Relaxed);
        Ok(response)
    }

    async fn fetch_chart(&self, req: &HistoryRequest) -> Result<(PriceSeries, QuoteMeta), SourceError> {
        let period1 = req.range.start.unix_midnight();
        let period2 = req.range.end.unix_midnight() + SECONDS_PER_DAY;
        let url = format!(
            "{CHART_ENDPOINT}/{}?period1={period1}&period2={period2}&interval=1d&events=div%2Csplits",
            urlencoding::encode(req.symbol.as_str()),
        );

        let response = self.send(self.request(url)).await?;
        if !response.is_success() && response.status != 404 {
            return Err(SourceError::unavailable(format!(
                "yahoo chart returned status {}",
                response.status
            )));
        }

        let parsed: ChartEnvelope = serde_json::from_str(&response.body).map_err(|error| {
            if response.status == 404 {
                SourceError::not_found(&req.symbol)
            } else {
                SourceError::internal(format!("failed to parse yahoo chart: {error}"))
            }
        })?;

        parse_chart(parsed.chart, &req.symbol)
    }

    async fn summary_request(&self, symbol: &Symbol) -> Result<HttpResponse, SourceError> {
        let crumb = self
            .auth
            .crumb(
                self.http_client.as_ref(),
                self.session_cookie.as_deref(),
                self.timeout_ms,
            )
            .await?;
        let url = format!(
            "{SUMMARY_ENDPOINT}/{}?modules={}&crumb={}",
            urlencoding::encode(symbol.as_str()),
            SUMMARY_MODULES.join("%2C"),
            urlencoding::encode(&crumb),
        );
        self.send(self.request(url)).await
    }

    async fn fetch_summary(&self, symbol: &Symbol) -> Result<QuoteMeta, SourceError> {
        let mut response = self.summary_request(symbol).await?;
        if response.status == 401 {
            debug!(symbol = %symbol, "yahoo rejected crumb, refreshing once");
            self.auth.invalidate().await;
            response = self.summary_request(symbol).await?;
        }

        if !response.is_success() && response.status != 404 {
            return Err(SourceError::unavailable(format!(
                "yahoo quoteSummary returned status {}",
                response.status
            )));
        }

        let parsed: SummaryEnvelope = serde_json::from_str(&response.body).map_err(|error| {
            if response.status == 404 {
                SourceError::not_found(symbol)
            } else {
                SourceError::internal(format!("failed to parse yahoo quoteSummary: {error}"))
            }
        })?;

        parse_summary(parsed.quote_summary, symbol)
    }
}

impl MarketDataSource for YahooSource {
    fn id(&self) -> ProviderId {
        ProviderId::Yahoo
    }

    fn fetch_history<'a>(&'a self, req: HistoryRequest) -> HistoryFuture<'a> {
        Box::pin(async move {
            let (bars, chart_meta) = self.fetch_chart(&req).await?;
            if bars.is_empty() {
                return Ok(MarketData::new(bars, chart_meta));
            }

            match self.fetch_summary(&req.symbol).await {
                Ok(mut meta) => {
                    for (field, value) in chart_meta.iter() {
                        meta.insert_if_absent(field, value.clone());
                    }
                    Ok(MarketData::new(bars, meta))
                }
                Err(error) => {
                    warn!(symbol = %req.symbol, error = %error, "company metadata unavailable");
                    Ok(MarketData::new(bars, chart_meta)
                        .with_warning(format!("company metadata unavailable: {error}")))
                }
            }
        })
    }

    fn health<'a>(&'a self) -> Pin<Box<dyn Future<Output = HealthStatus> + Send + 'a>> {
        Box::pin(async move {
            if self.rate_limited.load(Ordering::Relaxed) {
                HealthStatus::new(HealthState::Degraded, false)
            } else {
                HealthStatus::healthy()
            }
        })
    }
}

// ============================================================================
// Chart payload
// ============================================================================

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<YahooApiError>,
}

#[derive(Debug, Deserialize)]
struct YahooApiError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    description: Option<String>,
}

impl YahooApiError {
    fn is_not_found(&self) -> bool {
        self.code.eq_ignore_ascii_case("Not Found")
            || self
                .description
                .as_deref()
                .is_some_and(|text| text.contains("No data found"))
    }

    fn into_source_error(self, symbol: &Symbol, endpoint: &str) -> SourceError {
        if self.is_not_found() {
            return SourceError::not_found(symbol);
        }
        SourceError::unavailable(format!(
            "yahoo {endpoint} error {}: {}",
            self.code,
            self.description.unwrap_or_default()
        ))
    }
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    meta: Option<ChartMeta>,
    #[serde(default)]
    timestamp: Option<Vec<i64>>,
    #[serde(default)]
    indicators: Option<ChartIndicators>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    #[serde(default)]
    currency: Option<String>,
    #[serde(default)]
    long_name: Option<String>,
    #[serde(default)]
    short_name: Option<String>,
    #[serde(default)]
    exchange_name: Option<String>,
    /// Exchange offset from UTC in seconds.
    #[serde(default)]
    gmtoffset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Default, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

fn parse_chart(body: ChartBody, symbol: &Symbol) -> Result<(PriceSeries, QuoteMeta), SourceError> {
    if let Some(error) = body.error {
        return Err(error.into_source_error(symbol, "chart"));
    }

    let result = body
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| SourceError::not_found(symbol))?;

    let chart_meta = result.meta.unwrap_or_default();
    let offset = chart_meta.gmtoffset.unwrap_or(0);
    let meta = chart_quote_meta(&chart_meta);

    let timestamps = result.timestamp.unwrap_or_default();
    let quote = result
        .indicators
        .and_then(|indicators| indicators.quote.into_iter().next())
        .unwrap_or_default();

    let mut bars = Vec::with_capacity(timestamps.len());
    let mut skipped = 0_usize;
    for (index, &timestamp) in timestamps.iter().enumerate() {
        let row = (
            timestamp
                .checked_add(offset)
                .and_then(TradingDate::from_unix_timestamp),
            value_at(&quote.open, index),
            value_at(&quote.high, index),
            value_at(&quote.low, index),
            value_at(&quote.close, index),
        );
        let (Some(date), Some(open), Some(high), Some(low), Some(close)) = row else {
            skipped += 1;
            continue;
        };
        let volume = value_at(&quote.volume, index).map_or(0, |volume| volume.max(0.0) as u64);

        match PriceBar::new(date, open, high, low, close, volume) {
            Ok(bar) => bars.push(bar),
            Err(error) => {
                debug!(symbol = %symbol, date = %date, error = %error, "dropping invalid bar");
                skipped += 1;
            }
        }
    }

    if skipped > 0 {
        warn!(symbol = %symbol, skipped, "skipped incomplete chart rows");
    }

    Ok((PriceSeries::new(bars), meta))
}

fn value_at(values: &[Option<f64>], index: usize) -> Option<f64> {
    values.get(index).copied().flatten()
}

fn chart_quote_meta(meta: &ChartMeta) -> QuoteMeta {
    let mut quote_meta = QuoteMeta::new();
    let fields = [
        ("currency", &meta.currency),
        ("longName", &meta.long_name),
        ("shortName", &meta.short_name),
        ("exchange", &meta.exchange_name),
    ];
    for (field, value) in fields {
        if let Some(value) = value.as_deref().filter(|value| !value.trim().is_empty()) {
            quote_meta.insert(field, value);
        }
    }
    quote_meta
}

// ============================================================================
// quoteSummary payload
// ============================================================================

#[derive(Debug, Deserialize)]
struct SummaryEnvelope {
    #[serde(rename = "quoteSummary")]
    quote_summary: SummaryBody,
}

#[derive(Debug, Deserialize)]
struct SummaryBody {
    #[serde(default)]
    result: Option<Vec<serde_json::Map<String, Value>>>,
    #[serde(default)]
    error: Option<YahooApiError>,
}

fn parse_summary(body: SummaryBody, symbol: &Symbol) -> Result<QuoteMeta, SourceError> {
    if let Some(error) = body.error {
        return Err(error.into_source_error(symbol, "quoteSummary"));
    }

    let modules = body
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| SourceError::not_found(symbol))?;

    Ok(flatten_modules(&modules))
}

/// Flatten every module's scalar fields into one record; earlier modules win.
fn flatten_modules(modules: &serde_json::Map<String, Value>) -> QuoteMeta {
    let mut meta = QuoteMeta::new();
    for name in SUMMARY_MODULES {
        let Some(Value::Object(fields)) = modules.get(name) else {
            continue;
        };
        for (field, value) in fields {
            if field == "maxAge" {
                continue;
            }
            if let Some(value) = scalar(value) {
                meta.insert_if_absent(field.as_str(), value);
            }
        }
    }
    meta
}

/// `{"raw": 1.5, "fmt": "1.50"}` and plain scalars become values; `{}`, arrays and nulls are dropped.
fn scalar(value: &Value) -> Option<MetaValue> {
    match value {
        Value::Number(number) => number.as_f64().map(MetaValue::Number),
        Value::String(text) if !text.trim().is_empty() => Some(MetaValue::Text(text.clone())),
        Value::Object(object) => match object.get("raw") {
            Some(Value::Number(number)) => number.as_f64().map(MetaValue::Number),
            _ => None,
        },
        _ => None,
    }
}
