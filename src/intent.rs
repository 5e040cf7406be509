//! Trade intents and their fill outcomes

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::signal::{SignalReport, TradeSide};

/// A fully computed order request handed to the order sink
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeIntent {
    pub id: Uuid,
    pub instrument: String,
    pub side: TradeSide,
    /// Volume in lots
    pub size: Decimal,
    /// Price the decision was taken at
    pub reference_price: f64,
    pub rationale: String,
    pub created_at: DateTime<Utc>,
}

impl TradeIntent {
    pub fn new(instrument: &str, side: TradeSide, size: Decimal, reference_price: f64, rationale: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            instrument: instrument.to_string(),
            side,
            size,
            reference_price,
            rationale: rationale.to_string(),
            created_at: Utc::now(),
        }
    }

    /// Build an intent from a signal report; `None` when the report has no direction
    pub fn from_report(instrument: &str, size: Decimal, report: &SignalReport) -> Option<Self> {
        let side = report.decision.side()?;
        let rationale = match side {
            TradeSide::Buy => format!(
                "{} trend, price {:.2} <= Fib 61.8 {:.2} or S3 {:.2}",
                report.trend, report.price, report.fib_618, report.s3
            ),
            TradeSide::Sell => format!(
                "{} trend, price {:.2} >= Fib 61.8 {:.2} or R3 {:.2}",
                report.trend, report.price, report.fib_618, report.r3
            ),
        };
        Some(Self::new(instrument, side, size, report.price, &rationale))
    }
}

/// What the order sink did with an intent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FillOutcome {
    Filled {
        executed_price: f64,
        order_id: Option<u64>,
    },
    Rejected {
        rejection_code: String,
        message: String,
    },
}

impl FillOutcome {
    pub fn accepted(&self) -> bool {
        matches!(self, FillOutcome::Filled { .. })
    }

    pub fn executed_price(&self) -> Option<f64> {
        match self {
            FillOutcome::Filled { executed_price, .. } => Some(*executed_price),
            FillOutcome::Rejected { .. } => None,
        }
    }

    pub fn rejection_code(&self) -> Option<&str> {
        match self {
            FillOutcome::Filled { .. } => None,
            FillOutcome::Rejected { rejection_code, .. } => Some(rejection_code),
        }
    }
}
