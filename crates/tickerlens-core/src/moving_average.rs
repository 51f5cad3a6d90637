//! Simple (trailing arithmetic) moving averages over closing prices.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{PriceSeries, ValidationError};

/// Moving-average series aligned index-for-index with the bars it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovingAverage {
    pub window: usize,
    /// `None` until `window` bars are available.
    pub values: Vec<Option<f64>>,
}

impl MovingAverage {
    pub fn latest(&self) -> Option<f64> {
        self.values.last().copied().flatten()
    }

    pub fn label(&self) -> String {
        format!("SMA {}", self.window)
    }
}

/// Trailing mean of `closes` over `window` values.
///
/// `values[i]` is defined iff `i + 1 >= window`.
pub fn simple_moving_average(
    closes: &[f64],
    window: usize,
) -> Result<MovingAverage, ValidationError> {
    if window == 0 {
        return Err(ValidationError::ZeroWindow);
    }

    let values = (0..closes.len())
        .map(|index| {
            (index + 1 >= window).then(|| {
                let start = index + 1 - window;
                closes[start..=index].iter().sum::<f64>() / window as f64
            })
        })
        .collect();

    Ok(MovingAverage { window, values })
}

/// Which moving averages a caller wants computed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovingAverageSelection {
    windows: BTreeSet<usize>,
}

impl MovingAverageSelection {
    /// No averages.
    pub fn none() -> Self {
        Self::default()
    }

    /// The 20- and 50-session averages.
    pub fn standard() -> Self {
        Self::none().with_sma20(true).with_sma50(true)
    }

    pub fn with_sma20(self, enabled: bool) -> Self {
        self.toggle(20, enabled)
    }

    pub fn with_sma50(self, enabled: bool) -> Self {
        self.toggle(50, enabled)
    }

    pub fn with_window(self, window: usize) -> Result<Self, ValidationError> {
        if window == 0 {
            return Err(ValidationError::ZeroWindow);
        }
        Ok(self.toggle(window, true))
    }

    pub fn windows(&self) -> impl Iterator<Item = usize> + '_ {
        self.windows.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// Compute every selected average over `series`, in ascending window order.
    pub fn compute(&self, series: &PriceSeries) -> Vec<MovingAverage> {
        let closes = series.closes();
        self.windows
            .iter()
            .filter_map(|&window| simple_moving_average(&closes, window).ok())
            .collect()
    }

    fn toggle(mut self, window: usize, enabled: bool) -> Self {
        if enabled {
            self.windows.insert(window);
        } else {
            self.windows.remove(&window);
        }
        self
    }
}
