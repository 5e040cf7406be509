//! Reference price levels
//!
//! Two independent level sets feed the signal engine:
//! - classical pivot points from the latest closed higher-timeframe bar
//! - Fibonacci retracements over the lower-timeframe high/low range

pub mod fibonacci;
pub mod pivot;

pub use fibonacci::{FibLevels, FibonacciCalculator, FIB_RATIOS};
pub use pivot::{PivotCalculator, PivotLevels};
