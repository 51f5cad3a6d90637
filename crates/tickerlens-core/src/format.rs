//! Display formatting for metric and metadata values.
//!
//! Every formatter is total: absent, non-finite, or non-numeric input
//! renders as [`NOT_AVAILABLE`] instead of failing.
//!
//! ```rust
//! use tickerlens_core::format::{format_field, FormatKind};
//! use tickerlens_core::MetaValue;
//!
//! assert_eq!(format_field(Some(&MetaValue::Number(1.5e9)), FormatKind::LargeMagnitude), "1.50B");
//! assert_eq!(format_field(Some(&MetaValue::Number(0.0421)), FormatKind::Percentage), "4.21%");
//! assert_eq!(format_field(None, FormatKind::Plain), "N/A");
//! ```

use serde::{Deserialize, Serialize};

use crate::MetaValue;

/// Marker rendered for missing or unformattable values.
pub const NOT_AVAILABLE: &str = "N/A";

/// Currency symbol used when the provider does not report a currency.
pub const DEFAULT_CURRENCY_SYMBOL: &str = "$";

const MAGNITUDES: [(f64, &str); 3] = [(1e12, "T"), (1e9, "B"), (1e6, "M")];

/// How a value should be rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatKind {
    /// `$152.50`
    Currency,
    /// Fraction rendered as percent: `0.0421` -> `4.21%`.
    Percentage,
    /// `1.50B`, `2.31T`, `45.00M`, or `950,000` below a million.
    LargeMagnitude,
    /// Thousands-grouped integer: `1,234,567`.
    Plain,
    /// Two decimals without grouping: `28.53`.
    Ratio,
    /// Text as reported.
    Text,
}

/// Formatter bound to a currency symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFormatter {
    currency_symbol: String,
}

impl Default for FieldFormatter {
    fn default() -> Self {
        Self::new(DEFAULT_CURRENCY_SYMBOL)
    }
}

impl FieldFormatter {
    pub fn new(currency_symbol: impl Into<String>) -> Self {
        Self {
            currency_symbol: currency_symbol.into(),
        }
    }

    pub fn currency_symbol(&self) -> &str {
        &self.currency_symbol
    }

    /// Format an optional metadata value.
    pub fn field(&self, value: Option<&MetaValue>, kind: FormatKind) -> String {
        match (value, kind) {
            (None, _) => NOT_AVAILABLE.to_owned(),
            (Some(MetaValue::Text(text)), FormatKind::Text) => {
                let text = text.trim();
                if text.is_empty() {
                    NOT_AVAILABLE.to_owned()
                } else {
                    text.to_owned()
                }
            }
            (Some(MetaValue::Number(number)), FormatKind::Text) => {
                if number.is_finite() {
                    number.to_string()
                } else {
                    NOT_AVAILABLE.to_owned()
                }
            }
            (Some(value), kind) => self.number(value.as_number(), kind),
        }
    }

    /// Format an optional number.
    pub fn number(&self, value: Option<f64>, kind: FormatKind) -> String {
        let Some(value) = value.filter(|value| value.is_finite()) else {
            return NOT_AVAILABLE.to_owned();
        };

        match kind {
            FormatKind::Currency => self.currency(value),
            FormatKind::Percentage => format!("{}%", two_decimals(value * 100.0)),
            FormatKind::LargeMagnitude => large_magnitude(value),
            FormatKind::Plain => group_thousands(value),
            FormatKind::Ratio => two_decimals(value),
            FormatKind::Text => value.to_string(),
        }
    }

    fn currency(&self, value: f64) -> String {
        let sign = if value < 0.0 && format!("{:.2}", value.abs()) != "0.00" {
            "-"
        } else {
            ""
        };
        format!("{sign}{}{:.2}", self.currency_symbol, value.abs())
    }
}

/// Format with the default `$` currency symbol.
pub fn format_field(value: Option<&MetaValue>, kind: FormatKind) -> String {
    FieldFormatter::default().field(value, kind)
}

/// Format a percent figure that is already scaled (`1.67` -> `1.67%`).
pub fn format_percent_change(value: Option<f64>) -> String {
    match value.filter(|value| value.is_finite()) {
        Some(value) => format!("{}%", two_decimals(value)),
        None => NOT_AVAILABLE.to_owned(),
    }
}

/// Parse a currency string produced by [`FieldFormatter`] back into a number.
///
/// Any leading currency symbol or code is ignored, as are grouping commas.
pub fn parse_currency(text: &str) -> Option<f64> {
    let text = text.trim();
    let (negative, rest) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let digits_start = rest.find(|ch: char| ch.is_ascii_digit() || ch == '-' || ch == '.')?;
    let number = rest[digits_start..].replace(',', "").parse::<f64>().ok()?;
    let number = if negative { -number } else { number };
    number.is_finite().then_some(number)
}

/// Display symbol for an ISO currency code.
pub fn currency_symbol(code: &str) -> String {
    match code.trim().to_ascii_uppercase().as_str() {
        "USD" | "CAD" | "AUD" | "NZD" | "HKD" | "SGD" => String::from("$"),
        "EUR" => String::from("€"),
        "GBP" => String::from("£"),
        "JPY" | "CNY" => String::from("¥"),
        "INR" => String::from("₹"),
        "KRW" => String::from("₩"),
        "" => String::from(DEFAULT_CURRENCY_SYMBOL),
        other => format!("{other} "),
    }
}

/// Two decimals, with values that round to zero rendered unsigned.
fn two_decimals(value: f64) -> String {
    let text = format!("{value:.2}");
    match text.strip_prefix('-') {
        Some(unsigned) if unsigned == "0.00" => String::from(unsigned),
        _ => text,
    }
}

fn large_magnitude(value: f64) -> String {
    let magnitude = value.abs();
    for (threshold, suffix) in MAGNITUDES {
        if magnitude >= threshold {
            return format!("{:.2}{suffix}", value / threshold);
        }
    }
    group_thousands(value)
}

fn group_thousands(value: f64) -> String {
    let rounded = value.round();
    if rounded == 0.0 {
        return String::from("0");
    }

    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if rounded < 0.0 {
        grouped.push('-');
    }
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}
