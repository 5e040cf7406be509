//! Bot Configuration
//!
//! Flat set of named options, read from an optional config file and
//! `FIBPIVOT_*` environment variables. Every key has a default.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{BotError, Result};
use crate::trend::{EmaWeighting, TrendFilter};
use crate::types::TimeFrame;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "FIBPIVOT";

/// Default config file stem (any format the `config` crate understands)
pub const DEFAULT_CONFIG_FILE: &str = "fibpivot";

/// Smallest lot the terminal accepts
pub const MIN_SIZE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Bot configuration
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct BotConfig {
    #[serde(default = "default_instrument")]
    pub instrument: String,
    #[serde(default = "default_fast_timeframe")]
    pub fast_timeframe: TimeFrame,
    #[serde(default = "default_slow_timeframe")]
    pub slow_timeframe: TimeFrame,
    /// Order volume in lots
    #[serde(default = "default_size")]
    pub size: Decimal,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Bars requested per timeframe each cycle
    #[serde(default = "default_bar_count")]
    pub bar_count: usize,
    #[serde(default = "default_no_data_backoff_secs")]
    pub no_data_backoff_secs: u64,
    #[serde(default = "default_error_backoff_secs")]
    pub error_backoff_secs: u64,
    #[serde(default = "default_max_backoff_secs")]
    pub max_backoff_secs: u64,
    #[serde(default = "default_fast_ema_span")]
    pub fast_ema_span: usize,
    #[serde(default = "default_slow_ema_span")]
    pub slow_ema_span: usize,
    #[serde(default)]
    pub ema_weighting: EmaWeighting,
    #[serde(default)]
    pub trading_mode: TradingMode,
    #[serde(default = "default_bridge_url")]
    pub bridge_url: String,
    /// Max price deviation accepted by the terminal, in points
    #[serde(default = "default_deviation_points")]
    pub deviation_points: u32,
    /// Order tag identifying this bot's orders
    #[serde(default = "default_magic")]
    pub magic: u64,
    #[serde(default = "default_order_comment")]
    pub order_comment: String,
    /// Upper bound of simulated slippage in paper mode, in price units
    #[serde(default)]
    pub paper_slippage: f64,
}

/// Where decisions go
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TradingMode {
    /// Log decisions only
    SignalOnly,
    /// Simulated fills
    #[default]
    Paper,
    /// Orders sent to the terminal bridge
    Live,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            instrument: default_instrument(),
            fast_timeframe: default_fast_timeframe(),
            slow_timeframe: default_slow_timeframe(),
            size: default_size(),
            poll_interval_secs: default_poll_interval_secs(),
            bar_count: default_bar_count(),
            no_data_backoff_secs: default_no_data_backoff_secs(),
            error_backoff_secs: default_error_backoff_secs(),
            max_backoff_secs: default_max_backoff_secs(),
            fast_ema_span: default_fast_ema_span(),
            slow_ema_span: default_slow_ema_span(),
            ema_weighting: EmaWeighting::default(),
            trading_mode: TradingMode::default(),
            bridge_url: default_bridge_url(),
            deviation_points: default_deviation_points(),
            magic: default_magic(),
            order_comment: default_order_comment(),
            paper_slippage: 0.0,
        }
    }
}

impl BotConfig {
    /// Load from `path` (optional file) overlaid with `FIBPIVOT_*` env vars, then validate
    pub fn load(path: Option<&str>) -> Result<Self> {
        let builder = config::Config::builder()
            .add_source(
                config::File::with_name(path.unwrap_or(DEFAULT_CONFIG_FILE)).required(path.is_some()),
            )
            .add_source(config::Environment::with_prefix(ENV_PREFIX));

        let config: BotConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that make the bot meaningless
    pub fn validate(&self) -> Result<()> {
        if self.instrument.trim().is_empty() {
            return Err(invalid("instrument must not be empty"));
        }
        if self.size < MIN_SIZE {
            return Err(invalid(format!("size must be >= {}, got {}", MIN_SIZE, self.size)));
        }
        if self.poll_interval_secs == 0 {
            return Err(invalid("poll_interval_secs must be positive"));
        }
        if self.no_data_backoff_secs == 0 || self.error_backoff_secs == 0 {
            return Err(invalid("backoff durations must be positive"));
        }
        if self.max_backoff_secs < self.no_data_backoff_secs.max(self.error_backoff_secs) {
            return Err(invalid("max_backoff_secs must cover both backoff durations"));
        }
        if self.bar_count < 2 {
            return Err(invalid(format!("bar_count must be >= 2, got {}", self.bar_count)));
        }
        if self.fast_ema_span == 0 || self.slow_ema_span == 0 {
            return Err(invalid("EMA spans must be at least 1"));
        }
        if self.fast_timeframe >= self.slow_timeframe {
            return Err(invalid(format!(
                "fast_timeframe ({}) must be shorter than slow_timeframe ({})",
                self.fast_timeframe, self.slow_timeframe
            )));
        }
        if !self.paper_slippage.is_finite() || self.paper_slippage < 0.0 {
            return Err(invalid(format!(
                "paper_slippage must be finite and non-negative, got {}",
                self.paper_slippage
            )));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn trend_filter(&self) -> TrendFilter {
        TrendFilter {
            fast_span: self.fast_ema_span,
            slow_span: self.slow_ema_span,
            weighting: self.ema_weighting,
        }
    }
}

fn invalid(message: impl Into<String>) -> BotError {
    BotError::InvalidConfiguration(message.into())
}

fn default_instrument() -> String { "XAUUSD".to_string() }
fn default_fast_timeframe() -> TimeFrame { TimeFrame::M5 }
fn default_slow_timeframe() -> TimeFrame { TimeFrame::M15 }
fn default_size() -> Decimal { MIN_SIZE }
fn default_poll_interval_secs() -> u64 { 60 }
fn default_bar_count() -> usize { 200 }
fn default_no_data_backoff_secs() -> u64 { 5 }
fn default_error_backoff_secs() -> u64 { 10 }
fn default_max_backoff_secs() -> u64 { 60 }
fn default_fast_ema_span() -> usize { 10 }
fn default_slow_ema_span() -> usize { 20 }
fn default_bridge_url() -> String { "http://127.0.0.1:8700".to_string() }
fn default_deviation_points() -> u32 { 20 }
fn default_magic() -> u64 { 2025 }
fn default_order_comment() -> String { "FibPivotBot".to_string() }
