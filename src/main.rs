//! FibPivot Bot - pivot + Fibonacci signal bot
//!
//! 1. Loads configuration (file + FIBPIVOT_* environment)
//! 2. Polls the terminal bridge for bars on two timeframes
//! 3. Derives pivot, Fibonacci and trend readings
//! 4. Dispatches at most one trade intent per cycle

use std::sync::Arc;
use tracing::{info, warn};

use fibpivot_bot::{
    BotConfig, BotRunner, BridgeClient, OrderOptions, OrderSink, PaperOrderSink, TradingMode,
};

/// Bot entry point
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    info!("Starting FibPivot Bot...");

    let config_path = std::env::var("FIBPIVOT_CONFIG").ok();
    let config = BotConfig::load(config_path.as_deref())
        .map_err(|e| anyhow::anyhow!("Startup aborted: {}", e))?;

    info!("🚀 Combined Strategy Bot (Pivot + Fibonacci)");
    info!(
        "📊 Symbol: {} | Timeframes: {} + {} | Size: {}",
        config.instrument, config.fast_timeframe, config.slow_timeframe, config.size
    );
    info!("💡 Conditions:");
    info!("   • Buys near S3–S5 or Fib 61.8% retracement in uptrend");
    info!("   • Sells near R3–R5 or Fib 61.8% retracement in downtrend");

    let bridge = Arc::new(
        BridgeClient::new(&config.bridge_url)?.with_order_options(OrderOptions::from(&config)),
    );
    info!("Bridge: {}", config.bridge_url);

    let order_sink: Option<Arc<dyn OrderSink>> = match config.trading_mode {
        TradingMode::SignalOnly => {
            info!("Running in SIGNAL ONLY mode - no orders will be sent");
            None
        }
        TradingMode::Paper => {
            info!("📝 Running in PAPER TRADING mode");
            Some(Arc::new(PaperOrderSink::new(config.paper_slippage)))
        }
        TradingMode::Live => {
            warn!("💰 Running in LIVE TRADING mode - REAL MONEY AT RISK");
            Some(bridge.clone())
        }
    };

    let runner = BotRunner::new(config, bridge, order_sink);
    runner.run().await?;
    Ok(())
}
