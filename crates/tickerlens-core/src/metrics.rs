//! Headline metrics derived from the last two bars of a series.

use serde::{Deserialize, Serialize};

use crate::{PriceSeries, TradingDate};

/// Latest-session figures shown above the chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetrics {
    pub as_of: TradingDate,
    pub latest_close: f64,
    pub previous_close: f64,
    pub absolute_change: f64,
    /// Percent move versus the previous close; `None` when the previous close is zero.
    pub percent_change: Option<f64>,
    pub day_high: f64,
    pub day_low: f64,
    pub volume_latest: u64,
}

/// Derive headline metrics, or `None` for an empty series.
///
/// With a single bar the previous close equals the latest close and the
/// change is zero.
pub fn derive_metrics(series: &PriceSeries) -> Option<DerivedMetrics> {
    let bars = series.bars();
    let latest = bars.last()?;
    let previous_close = match bars.len() {
        0 | 1 => latest.close,
        len => bars[len - 2].close,
    };
    let absolute_change = latest.close - previous_close;

    Some(DerivedMetrics {
        as_of: latest.date,
        latest_close: latest.close,
        previous_close,
        absolute_change,
        percent_change: percent_change(latest.close, previous_close),
        day_high: latest.high,
        day_low: latest.low,
        volume_latest: latest.volume,
    })
}

/// `(latest - previous) / previous * 100`, undefined for a zero base.
pub fn percent_change(latest: f64, previous: f64) -> Option<f64> {
    if previous == 0.0 {
        return None;
    }
    let change = (latest - previous) / previous * 100.0;
    change.is_finite().then_some(change)
}
