//! Signal engine - combines levels, trend and price into one decision
//!
//! The engine is edge-triggered: once a direction fires it cannot fire again
//! until the opposite direction has fired (or the engine is reset).

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::levels::{FibLevels, PivotLevels};
use crate::trend::TrendState;

/// Trade direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    Buy,
    Sell,
}

impl std::fmt::Display for TradeSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeSide::Buy => write!(f, "buy"),
            TradeSide::Sell => write!(f, "sell"),
        }
    }
}

/// Per-cycle output of the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalDecision {
    Buy,
    Sell,
    None,
}

impl SignalDecision {
    pub fn side(&self) -> Option<TradeSide> {
        match self {
            SignalDecision::Buy => Some(TradeSide::Buy),
            SignalDecision::Sell => Some(TradeSide::Sell),
            SignalDecision::None => None,
        }
    }
}

impl From<TradeSide> for SignalDecision {
    fn from(side: TradeSide) -> Self {
        match side {
            TradeSide::Buy => SignalDecision::Buy,
            TradeSide::Sell => SignalDecision::Sell,
        }
    }
}

/// Everything the decision rule looks at
#[derive(Debug, Clone, Copy)]
pub struct SignalInputs<'a> {
    pub price: f64,
    pub pivots: &'a PivotLevels,
    pub fib: &'a FibLevels,
    pub trend: TrendState,
}

/// Decision plus the values that produced it
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SignalReport {
    pub decision: SignalDecision,
    pub price: f64,
    pub fib_618: f64,
    pub s3: f64,
    pub r3: f64,
    pub trend: TrendState,
}

/// Apply the decision rule against an explicit `last_action`.
///
/// First matching branch wins:
/// 1. Buy: uptrend, price at or below Fib 61.8% or S3, last action not Buy
/// 2. Sell: downtrend, price at or above Fib 61.8% or R3, last action not Sell
pub fn decide(inputs: &SignalInputs<'_>, last_action: Option<TradeSide>) -> SignalDecision {
    let price = inputs.price;
    let fib_618 = inputs.fib.level_618();

    if inputs.trend == TrendState::Up
        && (price <= fib_618 || price <= inputs.pivots.s3)
        && last_action != Some(TradeSide::Buy)
    {
        SignalDecision::Buy
    } else if inputs.trend == TrendState::Down
        && (price >= fib_618 || price >= inputs.pivots.r3)
        && last_action != Some(TradeSide::Sell)
    {
        SignalDecision::Sell
    } else {
        SignalDecision::None
    }
}

/// Holds `last_action` for the lifetime of the process
#[derive(Debug, Clone, Default)]
pub struct SignalEngine {
    last_action: Option<TradeSide>,
}

impl SignalEngine {
    pub fn new() -> Self {
        Self { last_action: None }
    }

    pub fn last_action(&self) -> Option<TradeSide> {
        self.last_action
    }

    /// Decide and record the direction in one step
    pub fn evaluate(&mut self, inputs: &SignalInputs<'_>) -> SignalReport {
        let report = self.propose(inputs);
        if let Some(side) = report.decision.side() {
            self.commit(side);
        }
        report
    }

    /// Decide without touching state
    pub fn propose(&self, inputs: &SignalInputs<'_>) -> SignalReport {
        let decision = decide(inputs, self.last_action);
        let report = SignalReport {
            decision,
            price: inputs.price,
            fib_618: inputs.fib.level_618(),
            s3: inputs.pivots.s3,
            r3: inputs.pivots.r3,
            trend: inputs.trend,
        };

        match decision {
            SignalDecision::Buy => info!(
                "BUY setup | Price: {:.2} | Fib 61.8: {:.2} | S3: {:.2}",
                report.price, report.fib_618, report.s3
            ),
            SignalDecision::Sell => info!(
                "SELL setup | Price: {:.2} | Fib 61.8: {:.2} | R3: {:.2}",
                report.price, report.fib_618, report.r3
            ),
            SignalDecision::None => debug!(
                "No setup | Price: {:.2} | Trend: {} | Last action: {:?}",
                report.price, report.trend, self.last_action
            ),
        }

        report
    }

    /// Record a fired direction
    pub fn commit(&mut self, side: TradeSide) {
        if self.last_action != Some(side) {
            debug!("Last action: {:?} -> {}", self.last_action, side);
        }
        self.last_action = Some(side);
    }

    /// Forget the last direction so either side may fire again
    pub fn reset(&mut self) {
        self.last_action = None;
    }
}
