//! Bot Runner - Main polling loop
//!
//! One cycle: fetch both windows → levels + trend → decision → dispatch.
//! Cycles never overlap; the runner owns the engine state.

use std::mem::{discriminant, Discriminant};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::config::BotConfig;
use crate::error::{BotError, Result};
use crate::executor::OrderSink;
use crate::intent::{FillOutcome, TradeIntent};
use crate::levels::{FibLevels, FibonacciCalculator, PivotCalculator, PivotLevels};
use crate::market_data::MarketDataSource;
use crate::signal::{SignalEngine, SignalInputs, SignalReport};
use crate::trend::{TrendFilter, TrendReading};
use crate::types::BarWindow;

/// Wait durations between cycles
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// After a successful cycle
    pub poll_interval: Duration,
    /// After missing or too-short data
    pub no_data_backoff: Duration,
    /// After any other recoverable error
    pub error_backoff: Duration,
    /// Cap for consecutive-failure growth
    pub max_backoff: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &BotConfig) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            no_data_backoff: Duration::from_secs(config.no_data_backoff_secs),
            error_backoff: Duration::from_secs(config.error_backoff_secs),
            max_backoff: Duration::from_secs(config.max_backoff_secs),
        }
    }

    /// Backoff for the `failures`-th consecutive failure of the same kind (1-based),
    /// doubling up to the cap
    pub fn backoff(&self, error: &BotError, failures: u32) -> Duration {
        let base = match error {
            BotError::InsufficientData { .. } => self.no_data_backoff,
            _ => self.error_backoff,
        };
        let exponent = failures.saturating_sub(1).min(16);
        base.saturating_mul(1 << exponent).min(self.max_backoff.max(base))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&BotConfig::default())
    }
}

/// Intent dispatched in a cycle and what the sink answered
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatch {
    pub intent: TradeIntent,
    pub outcome: FillOutcome,
}

/// Everything computed in one cycle
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub pivots: PivotLevels,
    pub fib: FibLevels,
    pub trend: TrendReading,
    pub signal: SignalReport,
    pub dispatch: Option<Dispatch>,
}

/// Main bot runner that manages the polling loop
pub struct BotRunner {
    config: BotConfig,
    market_data: Arc<dyn MarketDataSource>,
    order_sink: Option<Arc<dyn OrderSink>>,
    engine: SignalEngine,
    pivot_calc: PivotCalculator,
    fib_calc: FibonacciCalculator,
    trend_filter: TrendFilter,
    retry: RetryPolicy,
    consecutive_failures: u32,
    last_failure: Option<Discriminant<BotError>>,
    cycle_count: u64,
}

impl BotRunner {
    /// Create new bot runner; `order_sink` of `None` means signal-only
    pub fn new(
        config: BotConfig,
        market_data: Arc<dyn MarketDataSource>,
        order_sink: Option<Arc<dyn OrderSink>>,
    ) -> Self {
        let trend_filter = config.trend_filter();
        let retry = RetryPolicy::from_config(&config);
        Self {
            config,
            market_data,
            order_sink,
            engine: SignalEngine::new(),
            pivot_calc: PivotCalculator,
            fib_calc: FibonacciCalculator,
            trend_filter,
            retry,
            consecutive_failures: 0,
            last_failure: None,
            cycle_count: 0,
        }
    }

    /// Override wait durations
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn engine(&self) -> &SignalEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut SignalEngine {
        &mut self.engine
    }

    pub fn cycle_count(&self) -> u64 {
        self.cycle_count
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Run until a fatal error; recoverable errors back off and retry
    pub async fn run(mut self) -> Result<()> {
        info!(
            "Bot runner starting main loop: {} on {}/{} every {:?}",
            self.config.instrument,
            self.config.fast_timeframe,
            self.config.slow_timeframe,
            self.retry.poll_interval
        );

        loop {
            let delay = self.step().await?;
            sleep(delay).await;
        }
    }

    /// Run one cycle and work out how long to wait before the next.
    ///
    /// Only fatal errors are returned.
    pub async fn step(&mut self) -> Result<Duration> {
        match self.run_cycle().await {
            Ok(report) => {
                self.consecutive_failures = 0;
                self.last_failure = None;
                if let Some(dispatch) = &report.dispatch {
                    info!(
                        "Cycle #{} dispatched {} | accepted: {}",
                        self.cycle_count,
                        dispatch.intent.side,
                        dispatch.outcome.accepted()
                    );
                }
                Ok(self.retry.poll_interval)
            }
            Err(e) if e.is_fatal() => {
                error!("Fatal error, stopping: {}", e);
                Err(e)
            }
            Err(e) => {
                // A different kind of failure starts a new streak
                let kind = discriminant(&e);
                if self.last_failure != Some(kind) {
                    self.consecutive_failures = 0;
                    self.last_failure = Some(kind);
                }
                self.consecutive_failures += 1;
                let delay = self.retry.backoff(&e, self.consecutive_failures);
                match e {
                    BotError::InsufficientData { .. } => {
                        warn!("⚠️ {}. Retrying in {:?}", e, delay)
                    }
                    _ => error!("⚠️ Cycle error: {}. Retrying in {:?}", e, delay),
                }
                Ok(delay)
            }
        }
    }

    /// Run one trading cycle
    pub async fn run_cycle(&mut self) -> Result<CycleReport> {
        self.cycle_count += 1;

        let (fast, slow) = self.fetch_windows().await?;
        if slow.is_empty() || fast.is_empty() {
            let empty = if slow.is_empty() { &slow } else { &fast };
            return Err(BotError::insufficient(empty.timeframe(), 1, 0));
        }

        let pivots = self.pivot_calc.calculate(&slow)?;
        let fib = self.fib_calc.calculate(&fast)?;
        let trend = self.trend_filter.evaluate(&fast, &slow)?;
        let price = fast
            .latest()
            .map(|bar| bar.close)
            .ok_or_else(|| BotError::insufficient(fast.timeframe(), 1, 0))?;

        let inputs = SignalInputs {
            price,
            pivots: &pivots,
            fib: &fib,
            trend: trend.state,
        };

        debug!(
            "Cycle #{} | price {:.2} | fast EMA {:.2} | slow EMA {:.2} | P {:.2}",
            self.cycle_count, price, trend.fast_ema, trend.slow_ema, pivots.p
        );

        let (signal, dispatch) = match self.order_sink.clone() {
            None => (self.engine.evaluate(&inputs), None),
            Some(sink) => {
                let signal = self.engine.propose(&inputs);
                let dispatch = self.dispatch(sink.as_ref(), &signal).await?;
                (signal, dispatch)
            }
        };

        Ok(CycleReport {
            pivots,
            fib,
            trend,
            signal,
            dispatch,
        })
    }

    async fn fetch_windows(&self) -> Result<(BarWindow, BarWindow)> {
        let count = self.config.bar_count;
        let instrument = &self.config.instrument;

        let slow = self
            .market_data
            .fetch_window(instrument, self.config.slow_timeframe, count)
            .await?;
        let fast = self
            .market_data
            .fetch_window(instrument, self.config.fast_timeframe, count)
            .await?;

        Ok((fast, slow))
    }

    /// Send the intent; the direction is committed once the sink has answered
    async fn dispatch(&mut self, sink: &dyn OrderSink, signal: &SignalReport) -> Result<Option<Dispatch>> {
        let intent = match TradeIntent::from_report(&self.config.instrument, self.config.size, signal) {
            Some(intent) => intent,
            None => return Ok(None),
        };

        debug!("Submitting intent {} to {}", intent.id, sink.name());
        let outcome = sink.submit(&intent).await?;
        self.engine.commit(intent.side);

        if let FillOutcome::Rejected { rejection_code, message } = &outcome {
            warn!(
                "Intent {} rejected by {}: {} {}",
                intent.id,
                sink.name(),
                rejection_code,
                message
            );
        }

        Ok(Some(Dispatch { intent, outcome }))
    }
}
