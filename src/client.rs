//! Terminal Bridge API Client
//!
//! HTTP client for the bridge service that fronts the trading terminal.
//! It serves bars (`GET /v1/rates/{symbol}`) and accepts market orders
//! (`POST /v1/orders`).

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use reqwest::{Client, StatusCode};
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::BotConfig;
use crate::error::{BotError, Result};
use crate::executor::OrderSink;
use crate::intent::{FillOutcome, TradeIntent};
use crate::market_data::MarketDataSource;
use crate::signal::TradeSide;
use crate::types::{Bar, TimeFrame};

/// Terminal return code for a completed request
pub const RETCODE_DONE: u32 = 10009;

/// Per-order settings forwarded to the terminal
#[derive(Debug, Clone, PartialEq)]
pub struct OrderOptions {
    pub deviation_points: u32,
    pub magic: u64,
    pub comment: String,
}

impl Default for OrderOptions {
    fn default() -> Self {
        Self {
            deviation_points: 20,
            magic: 2025,
            comment: "FibPivotBot".to_string(),
        }
    }
}

impl From<&BotConfig> for OrderOptions {
    fn from(config: &BotConfig) -> Self {
        Self {
            deviation_points: config.deviation_points,
            magic: config.magic,
            comment: config.order_comment.clone(),
        }
    }
}

/// Client for the terminal bridge
pub struct BridgeClient {
    client: Client,
    base_url: String,
    order_options: OrderOptions,
}

impl BridgeClient {
    /// Create new bridge client
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            order_options: OrderOptions::default(),
        })
    }

    pub fn with_order_options(mut self, options: OrderOptions) -> Self {
        self.order_options = options;
        self
    }

    /// Fetch the most recent `count` bars, oldest first
    pub async fn get_rates(&self, symbol: &str, timeframe: TimeFrame, count: usize) -> Result<Vec<Bar>> {
        let url = format!("{}/v1/rates/{}", self.base_url, symbol);

        debug!("Fetching {} {} bars from {}", count, timeframe, url);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("timeframe", timeframe.as_str().to_string()),
                ("count", count.to_string()),
            ])
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => {
                let rates: Vec<RateBar> = response.json().await?;
                let bars = rates
                    .into_iter()
                    .map(RateBar::into_bar)
                    .collect::<Result<Vec<_>>>()?;
                ensure_ascending(&bars)?;
                debug!("Received {} {} bars for {}", bars.len(), timeframe, symbol);
                Ok(bars)
            }
            StatusCode::NOT_FOUND => {
                warn!("No {} rates for {}", timeframe, symbol);
                Ok(Vec::new())
            }
            status => {
                let text = response.text().await.unwrap_or_default();
                Err(BotError::ExternalUnavailable(format!(
                    "Rates fetch failed: {} - {}",
                    status, text
                )))
            }
        }
    }

    /// Send a market order for the intent
    pub async fn send_order(&self, intent: &TradeIntent) -> Result<FillOutcome> {
        let url = format!("{}/v1/orders", self.base_url);

        let volume = order_volume(intent)?;
        let req = OrderRequest {
            symbol: intent.instrument.clone(),
            volume,
            side: intent.side,
            deviation: self.order_options.deviation_points,
            magic: self.order_options.magic,
            comment: self.order_options.comment.clone(),
            type_time: "gtc",
            type_filling: "ioc",
        };

        let response = self.client.post(&url).json(&req).send().await?;

        match response.status() {
            status if status.is_success() => {
                let resp: OrderResponse = response.json().await?;
                Ok(resp.into_outcome(intent))
            }
            StatusCode::NOT_FOUND => {
                warn!("⚠️ Symbol not found: {}", intent.instrument);
                Ok(FillOutcome::Rejected {
                    rejection_code: "symbol_not_found".to_string(),
                    message: format!("Symbol not found: {}", intent.instrument),
                })
            }
            status => {
                let text = response.text().await.unwrap_or_default();
                Err(BotError::ExternalUnavailable(format!(
                    "Order send failed: {} - {}",
                    status, text
                )))
            }
        }
    }
}

#[async_trait]
impl MarketDataSource for BridgeClient {
    async fn fetch_bars(&self, instrument: &str, timeframe: TimeFrame, count: usize) -> Result<Vec<Bar>> {
        self.get_rates(instrument, timeframe, count).await
    }

    fn name(&self) -> &str {
        "bridge"
    }
}

#[async_trait]
impl OrderSink for BridgeClient {
    async fn submit(&self, intent: &TradeIntent) -> Result<FillOutcome> {
        let outcome = self.send_order(intent).await?;
        match &outcome {
            FillOutcome::Filled { executed_price, .. } => {
                info!("✓ {} executed at {:.2}", intent.side.to_string().to_uppercase(), executed_price)
            }
            FillOutcome::Rejected { rejection_code, message } => {
                warn!("⚠️ Order failed: {} {}", rejection_code, message)
            }
        }
        Ok(outcome)
    }

    fn name(&self) -> &str {
        "bridge"
    }
}

fn order_volume(intent: &TradeIntent) -> Result<f64> {
    intent
        .size
        .to_f64()
        .filter(|v| v.is_finite() && *v > 0.0)
        .ok_or_else(|| {
            BotError::InvalidConfiguration(format!("order size {} is not a valid volume", intent.size))
        })
}

fn ensure_ascending(bars: &[Bar]) -> Result<()> {
    if bars.windows(2).all(|w| w[0].timestamp < w[1].timestamp) {
        Ok(())
    } else {
        Err(BotError::MalformedResponse {
            source_name: "bridge".to_string(),
            message: "bars are not in ascending time order".to_string(),
        })
    }
}

// Request/Response types

#[derive(Debug, Clone, Deserialize)]
struct RateBar {
    /// Bar open time, unix seconds
    time: i64,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    #[serde(default)]
    tick_volume: u64,
    #[serde(default)]
    spread: i32,
    #[serde(default)]
    real_volume: u64,
}

impl RateBar {
    fn into_bar(self) -> Result<Bar> {
        let timestamp = Utc
            .timestamp_opt(self.time, 0)
            .single()
            .ok_or_else(|| BotError::MalformedResponse {
                source_name: "bridge".to_string(),
                message: format!("invalid bar time {}", self.time),
            })?;

        Ok(Bar {
            timestamp,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            tick_volume: self.tick_volume,
            spread: self.spread,
            real_volume: self.real_volume,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
struct OrderRequest {
    symbol: String,
    volume: f64,
    side: TradeSide,
    deviation: u32,
    magic: u64,
    comment: String,
    type_time: &'static str,
    type_filling: &'static str,
}

#[derive(Debug, Deserialize)]
struct OrderResponse {
    retcode: u32,
    #[serde(default)]
    price: Option<f64>,
    #[serde(default)]
    order: Option<u64>,
    #[serde(default)]
    comment: Option<String>,
}

impl OrderResponse {
    fn into_outcome(self, intent: &TradeIntent) -> FillOutcome {
        if self.retcode == RETCODE_DONE {
            FillOutcome::Filled {
                executed_price: self.price.unwrap_or(intent.reference_price),
                order_id: self.order,
            }
        } else {
            FillOutcome::Rejected {
                rejection_code: self.retcode.to_string(),
                message: self.comment.unwrap_or_default(),
            }
        }
    }
}
