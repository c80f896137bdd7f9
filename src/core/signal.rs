// Trend signal from a fast/slow simple moving average comparison

use crate::core::types::{BarSeries, Signal};

/// Signal plus the averages it was derived from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalReading {
    pub signal: Signal,
    pub fast: f64,
    pub slow: f64,
}

/// Trailing simple moving average of the last `window` values.
///
/// Returns `None` for an empty window or when fewer than `window` values exist.
pub fn sma(values: &[f64], window: usize) -> Option<f64> {
    if window == 0 || values.len() < window {
        return None;
    }

    let sum: f64 = values[values.len() - window..].iter().sum();
    Some(sum / window as f64)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalCalculator {
    fast_window: usize,
    slow_window: usize,
}

impl SignalCalculator {
    pub fn new(fast_window: usize, slow_window: usize) -> Self {
        Self { fast_window, slow_window }
    }

    pub fn fast_window(&self) -> usize {
        self.fast_window
    }

    pub fn slow_window(&self) -> usize {
        self.slow_window
    }

    /// Bars needed before `compute` can produce a reading
    pub fn required_bars(&self) -> usize {
        self.fast_window.max(self.slow_window)
    }

    /// Compare both averages at the latest bar.
    ///
    /// Pure function of the series: no state survives between calls. Exact
    /// equality of the two averages yields `Signal::Neutral`; a NaN or
    /// infinite average yields no reading at all.
    pub fn compute(&self, series: &BarSeries) -> Option<SignalReading> {
        if series.len() < self.required_bars() {
            return None;
        }

        let closes = series.closes();
        let fast = sma(&closes, self.fast_window)?;
        let slow = sma(&closes, self.slow_window)?;

        if !fast.is_finite() || !slow.is_finite() {
            return None;
        }

        let signal = if fast > slow {
            Signal::Long
        } else if fast < slow {
            Signal::Short
        } else {
            Signal::Neutral
        };

        Some(SignalReading { signal, fast, slow })
    }
}

impl Default for SignalCalculator {
    fn default() -> Self {
        Self::new(5, 15)
    }
}
