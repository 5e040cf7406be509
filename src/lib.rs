//! FibPivot Bot Library
//!
//! Pivot + Fibonacci signal engine for a single instrument on two timeframes.

pub mod client;
pub mod config;
pub mod error;
pub mod executor;
pub mod intent;
pub mod levels;
pub mod market_data;
pub mod runner;
pub mod signal;
pub mod trend;
pub mod types;

#[cfg(test)]
mod tests;

// Re-export main types for convenience
pub use client::{BridgeClient, OrderOptions};
pub use config::{BotConfig, TradingMode};
pub use error::{BotError, Result};
pub use executor::{OrderSink, PaperOrderSink};
pub use intent::{FillOutcome, TradeIntent};
pub use levels::{FibLevels, FibonacciCalculator, PivotCalculator, PivotLevels};
pub use market_data::MarketDataSource;
pub use runner::{BotRunner, CycleReport, Dispatch, RetryPolicy};
pub use signal::{decide, SignalDecision, SignalEngine, SignalInputs, SignalReport, TradeSide};
pub use trend::{ema_last, EmaWeighting, TrendClassifier, TrendFilter, TrendReading, TrendState};
pub use types::{Bar, BarWindow, TimeFrame};
