//! Core market data types
//!
//! Bars arrive from the data source oldest → newest. The last element of a
//! window may still be forming; the one before it is the latest closed bar.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One OHLC bar as served by the terminal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub tick_volume: u64,
    pub spread: i32,
    pub real_volume: u64,
}

impl Bar {
    /// Bar with only prices set (volumes zero)
    pub fn ohlc(timestamp: DateTime<Utc>, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            tick_volume: 0,
            spread: 0,
            real_volume: 0,
        }
    }
}

/// Supported timeframes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TimeFrame {
    M1,
    M5,
    M15,
    M30,
    H1,
    H4,
    D1,
    W1,
}

impl TimeFrame {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeFrame::M1 => "M1",
            TimeFrame::M5 => "M5",
            TimeFrame::M15 => "M15",
            TimeFrame::M30 => "M30",
            TimeFrame::H1 => "H1",
            TimeFrame::H4 => "H4",
            TimeFrame::D1 => "D1",
            TimeFrame::W1 => "W1",
        }
    }

    pub fn to_seconds(&self) -> i64 {
        match self {
            TimeFrame::M1 => 60,
            TimeFrame::M5 => 300,
            TimeFrame::M15 => 900,
            TimeFrame::M30 => 1800,
            TimeFrame::H1 => 3600,
            TimeFrame::H4 => 14400,
            TimeFrame::D1 => 86400,
            TimeFrame::W1 => 604800,
        }
    }
}

impl std::fmt::Display for TimeFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered bars for a single timeframe
#[derive(Debug, Clone, PartialEq)]
pub struct BarWindow {
    timeframe: TimeFrame,
    bars: Vec<Bar>,
}

impl BarWindow {
    pub fn new(timeframe: TimeFrame, bars: Vec<Bar>) -> Self {
        Self { timeframe, bars }
    }

    pub fn timeframe(&self) -> TimeFrame {
        self.timeframe
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Most recent bar (possibly still forming)
    pub fn latest(&self) -> Option<&Bar> {
        self.bars.last()
    }

    /// Most recent fully closed bar, i.e. the second-to-last element
    pub fn last_closed(&self) -> Option<&Bar> {
        self.bars.len().checked_sub(2).map(|i| &self.bars[i])
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// Highest high across the window, `None` when empty
    pub fn highest_high(&self) -> Option<f64> {
        self.bars.iter().map(|b| b.high).reduce(f64::max)
    }

    /// Lowest low across the window, `None` when empty
    pub fn lowest_low(&self) -> Option<f64> {
        self.bars.iter().map(|b| b.low).reduce(f64::min)
    }
}
