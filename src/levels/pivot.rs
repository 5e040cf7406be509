//! Classical pivot points with extended R3-R5 / S3-S5 bands

use serde::Serialize;

use crate::error::{BotError, Result};
use crate::types::BarWindow;

/// Pivot and outer support/resistance levels
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PivotLevels {
    pub p: f64,
    pub r3: f64,
    pub r4: f64,
    pub r5: f64,
    pub s3: f64,
    pub s4: f64,
    pub s5: f64,
}

impl PivotLevels {
    /// Levels keyed by their conventional names, resistance first
    pub fn named(&self) -> [(&'static str, f64); 7] {
        [
            ("R5", self.r5),
            ("R4", self.r4),
            ("R3", self.r3),
            ("P", self.p),
            ("S3", self.s3),
            ("S4", self.s4),
            ("S5", self.s5),
        ]
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.named()
            .into_iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v)
    }
}

/// Derives pivot levels from the latest closed bar of a window
#[derive(Debug, Clone, Copy, Default)]
pub struct PivotCalculator;

impl PivotCalculator {
    pub const MIN_BARS: usize = 2;

    /// Compute levels from the second-to-last bar; the last one may still be forming.
    pub fn calculate(&self, window: &BarWindow) -> Result<PivotLevels> {
        let bar = window.last_closed().ok_or_else(|| {
            BotError::insufficient(window.timeframe(), Self::MIN_BARS, window.len())
        })?;

        Ok(Self::from_hlc(bar.high, bar.low, bar.close))
    }

    /// Operation order is kept literal so results stay reproducible.
    pub fn from_hlc(high: f64, low: f64, close: f64) -> PivotLevels {
        let p = (high + low + close) / 3.0;
        let r1 = 2.0 * p - low;
        let s1 = 2.0 * p - high;
        let r2 = p + (high - low);
        let s2 = p - (high - low);
        let r3 = high + 2.0 * (p - low);
        let s3 = low - 2.0 * (high - p);
        let r4 = r3 + (r2 - r1);
        let s4 = s3 - (s1 - s2);
        let r5 = r4 + (r2 - r1);
        let s5 = s4 - (s1 - s2);

        PivotLevels {
            p,
            r3,
            r4,
            r5,
            s3,
            s4,
            s5,
        }
    }
}
