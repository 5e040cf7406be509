//! Fibonacci retracement levels over a bar window

use serde::Serialize;

use crate::error::{BotError, Result};
use crate::types::BarWindow;

/// Retracement ratios with their display names, top of range first
pub const FIB_RATIOS: [(&str, f64); 7] = [
    ("0%", 0.0),
    ("23.6%", 0.236),
    ("38.2%", 0.382),
    ("50%", 0.5),
    ("61.8%", 0.618),
    ("78.6%", 0.786),
    ("100%", 1.0),
];

/// Retracement prices between the window's high and low
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FibLevels {
    pub recent_high: f64,
    pub recent_low: f64,
    /// Prices in `FIB_RATIOS` order
    pub levels: [f64; 7],
}

impl FibLevels {
    pub fn level_0(&self) -> f64 {
        self.levels[0]
    }

    pub fn level_618(&self) -> f64 {
        self.levels[4]
    }

    pub fn level_100(&self) -> f64 {
        self.levels[6]
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        FIB_RATIOS
            .iter()
            .position(|(n, _)| *n == name)
            .map(|i| self.levels[i])
    }

    pub fn named(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        FIB_RATIOS
            .iter()
            .zip(self.levels.iter())
            .map(|((name, _), price)| (*name, *price))
    }
}

/// Derives retracements from the full-window high/low range
#[derive(Debug, Clone, Copy, Default)]
pub struct FibonacciCalculator;

impl FibonacciCalculator {
    pub fn calculate(&self, window: &BarWindow) -> Result<FibLevels> {
        let (recent_high, recent_low) = match (window.highest_high(), window.lowest_low()) {
            (Some(h), Some(l)) => (h, l),
            _ => return Err(BotError::insufficient(window.timeframe(), 1, 0)),
        };

        Ok(Self::from_range(recent_high, recent_low))
    }

    /// The 0% and 100% levels are the extremes themselves, not `high - ratio * diff`.
    pub fn from_range(recent_high: f64, recent_low: f64) -> FibLevels {
        let diff = recent_high - recent_low;
        let mut levels = [0.0; 7];
        for (slot, (_, ratio)) in levels.iter_mut().zip(FIB_RATIOS.iter()) {
            *slot = recent_high - ratio * diff;
        }
        levels[0] = recent_high;
        levels[6] = recent_low;

        FibLevels {
            recent_high,
            recent_low,
            levels,
        }
    }
}
