use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{TradingDate, ValidationError};

/// Daily OHLCV record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: TradingDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl PriceBar {
    pub fn new(
        date: TradingDate,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: u64,
    ) -> Result<Self, ValidationError> {
        validate_non_negative("open", open)?;
        validate_non_negative("high", high)?;
        validate_non_negative("low", low)?;
        validate_non_negative("close", close)?;

        if high < low {
            return Err(ValidationError::InvalidBarRange);
        }

        if open < low || open > high || close < low || close > high {
            return Err(ValidationError::InvalidBarBounds);
        }

        Ok(Self {
            date,
            open,
            high,
            low,
            close,
            volume,
        })
    }
}

/// Date-ordered bar sequence with unique dates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<PriceBar>", into = "Vec<PriceBar>")]
pub struct PriceSeries {
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    /// Sort by date and collapse duplicate dates, keeping the later occurrence.
    pub fn new(mut bars: Vec<PriceBar>) -> Self {
        // Stable sort keeps arrival order within a date, so the last one is the latest revision.
        bars.sort_by_key(|bar| bar.date);
        let mut unique: Vec<PriceBar> = Vec::with_capacity(bars.len());
        for bar in bars {
            match unique.last_mut() {
                Some(last) if last.date == bar.date => *last = bar,
                _ => unique.push(bar),
            }
        }
        Self { bars: unique }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first(&self) -> Option<&PriceBar> {
        self.bars.first()
    }

    pub fn last(&self) -> Option<&PriceBar> {
        self.bars.last()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|bar| bar.close).collect()
    }

    pub fn dates(&self) -> Vec<TradingDate> {
        self.bars.iter().map(|bar| bar.date).collect()
    }

    /// Bars whose date lies inside `[start, end]`.
    pub fn within(&self, start: TradingDate, end: TradingDate) -> Self {
        Self {
            bars: self
                .bars
                .iter()
                .filter(|bar| start <= bar.date && bar.date <= end)
                .cloned()
                .collect(),
        }
    }

    pub fn into_bars(self) -> Vec<PriceBar> {
        self.bars
    }
}

impl From<Vec<PriceBar>> for PriceSeries {
    fn from(value: Vec<PriceBar>) -> Self {
        Self::new(value)
    }
}

impl From<PriceSeries> for Vec<PriceBar> {
    fn from(value: PriceSeries) -> Self {
        value.bars
    }
}

/// Scalar metadata value reported by a provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaValue {
    Number(f64),
    Text(String),
}

impl MetaValue {
    /// Numeric view of the value; numeric text such as `"1,500"` is coerced.
    pub fn as_number(&self) -> Option<f64> {
        let value = match self {
            Self::Number(value) => *value,
            Self::Text(text) => text.trim().replace(',', "").parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text.as_str()),
            Self::Number(_) => None,
        }
    }
}

impl From<f64> for MetaValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for MetaValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for MetaValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Flat company/quote metadata keyed by provider field name (`marketCap`, `sector`, ...).
///
/// Every field is optional; lookups of absent keys simply return `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuoteMeta {
    fields: BTreeMap<String, MetaValue>,
}

impl QuoteMeta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<MetaValue>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<MetaValue>) {
        self.fields.insert(field.into(), value.into());
    }

    /// Insert only when the field is not yet present.
    pub fn insert_if_absent(&mut self, field: impl Into<String>, value: impl Into<MetaValue>) {
        self.fields.entry(field.into()).or_insert_with(|| value.into());
    }

    pub fn get(&self, field: &str) -> Option<&MetaValue> {
        self.fields.get(field)
    }

    pub fn number(&self, field: &str) -> Option<f64> {
        self.get(field).and_then(MetaValue::as_number)
    }

    /// Non-blank text value of a field.
    pub fn text(&self, field: &str) -> Option<&str> {
        self.get(field)
            .and_then(MetaValue::as_text)
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetaValue)> {
        self.fields.iter().map(|(key, value)| (key.as_str(), value))
    }
}

/// Result of one upstream history fetch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketData {
    pub bars: PriceSeries,
    pub meta: QuoteMeta,
    /// Non-fatal problems encountered while assembling the result.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl MarketData {
    pub fn new(bars: PriceSeries, meta: QuoteMeta) -> Self {
        Self {
            bars,
            meta,
            warnings: Vec::new(),
        }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }
}

fn validate_non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue { field });
    }
    if value < 0.0 {
        return Err(ValidationError::NegativeValue { field });
    }
    Ok(())
}
