//! Order execution - sink trait and paper trading sink

use async_trait::async_trait;
use rand::Rng;
use tracing::info;

use crate::error::Result;
use crate::intent::{FillOutcome, TradeIntent};
use crate::signal::TradeSide;

/// Accepts trade intents and reports what happened to them.
///
/// `Err` means the sink could not be reached; a rejection is an `Ok` outcome.
#[async_trait]
pub trait OrderSink: Send + Sync {
    async fn submit(&self, intent: &TradeIntent) -> Result<FillOutcome>;

    /// Sink name
    fn name(&self) -> &str;
}

/// Fills every intent locally at its reference price plus simulated slippage
pub struct PaperOrderSink {
    max_slippage: f64,
}

impl PaperOrderSink {
    /// Non-finite or negative bounds disable slippage
    pub fn new(max_slippage: f64) -> Self {
        let max_slippage = if max_slippage.is_finite() { max_slippage.max(0.0) } else { 0.0 };
        Self { max_slippage }
    }

    /// Slippage always works against the trader
    fn simulated_price(&self, side: TradeSide, reference: f64) -> f64 {
        let slippage = if self.max_slippage > 0.0 {
            rand::thread_rng().gen_range(0.0..=self.max_slippage)
        } else {
            0.0
        };
        match side {
            TradeSide::Buy => reference + slippage,
            TradeSide::Sell => reference - slippage,
        }
    }
}

impl Default for PaperOrderSink {
    fn default() -> Self {
        Self::new(0.0)
    }
}

#[async_trait]
impl OrderSink for PaperOrderSink {
    async fn submit(&self, intent: &TradeIntent) -> Result<FillOutcome> {
        let executed_price = self.simulated_price(intent.side, intent.reference_price);

        info!(
            "📝 Paper {} {} {} @ {:.2} (intent {})",
            intent.side, intent.size, intent.instrument, executed_price, intent.id
        );

        Ok(FillOutcome::Filled {
            executed_price,
            order_id: None,
        })
    }

    fn name(&self) -> &str {
        "paper"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[tokio::test]
    async fn test_paper_fill_without_slippage() {
        let sink = PaperOrderSink::default();
        let intent = TradeIntent::new("XAUUSD", TradeSide::Buy, Decimal::ONE, 1935.0, "test");

        let outcome = sink.submit(&intent).await.unwrap();
        assert!(outcome.accepted());
        assert_eq!(outcome.executed_price(), Some(1935.0));
    }

    #[tokio::test]
    async fn test_paper_slippage_is_adverse_and_bounded() {
        let sink = PaperOrderSink::new(0.5);

        for _ in 0..50 {
            let buy = TradeIntent::new("XAUUSD", TradeSide::Buy, Decimal::ONE, 1935.0, "buy");
            let price = sink.submit(&buy).await.unwrap().executed_price().unwrap();
            assert!((1935.0..=1935.5).contains(&price));

            let sell = TradeIntent::new("XAUUSD", TradeSide::Sell, Decimal::ONE, 2025.0, "sell");
            let price = sink.submit(&sell).await.unwrap().executed_price().unwrap();
            assert!((2024.5..=2025.0).contains(&price));
        }
    }

    #[test]
    fn test_negative_slippage_clamped() {
        let sink = PaperOrderSink::new(-3.0);
        assert_eq!(sink.simulated_price(TradeSide::Buy, 100.0), 100.0);
    }

    #[tokio::test]
    async fn test_infinite_slippage_does_not_panic() {
        let sink = PaperOrderSink::new(f64::INFINITY);
        let intent = TradeIntent::new("XAUUSD", TradeSide::Sell, Decimal::ONE, 2025.0, "test");

        let outcome = sink.submit(&intent).await.unwrap();
        assert_eq!(outcome.executed_price(), Some(2025.0));
    }
}
