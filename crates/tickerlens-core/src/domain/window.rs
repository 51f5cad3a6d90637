use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::{TradingDate, ValidationError};

/// Inclusive calendar range `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: TradingDate,
    pub end: TradingDate,
}

impl DateRange {
    pub fn new(start: TradingDate, end: TradingDate) -> Result<Self, ValidationError> {
        if start > end {
            return Err(ValidationError::InvertedRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: TradingDate) -> bool {
        self.start <= date && date <= self.end
    }
}

impl Display for DateRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

/// How far back a snapshot looks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookbackWindow {
    /// Trailing calendar days ending today.
    Days(u32),
    /// Explicit inclusive range.
    Range(DateRange),
}

impl LookbackWindow {
    pub fn days(days: u32) -> Result<Self, ValidationError> {
        if days == 0 {
            return Err(ValidationError::EmptyLookback);
        }
        Ok(Self::Days(days))
    }

    pub fn between(start: TradingDate, end: TradingDate) -> Result<Self, ValidationError> {
        DateRange::new(start, end).map(Self::Range)
    }

    /// Resolve to a concrete range relative to `today`.
    pub fn resolve(self, today: TradingDate) -> Result<DateRange, ValidationError> {
        match self {
            Self::Days(0) => Err(ValidationError::EmptyLookback),
            Self::Days(days) => {
                let start = today
                    .checked_sub_days(days)
                    .ok_or(ValidationError::LookbackOutOfRange { days })?;
                DateRange::new(start, today)
            }
            Self::Range(range) => DateRange::new(range.start, range.end),
        }
    }
}
