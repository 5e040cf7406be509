//! Market data seam

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Bar, BarWindow, TimeFrame};

/// Supplier of recent bars
///
/// Implementations return the most recent `count` bars, oldest first, or an
/// empty vector when nothing is available. Transport failures are errors.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    async fn fetch_bars(&self, instrument: &str, timeframe: TimeFrame, count: usize) -> Result<Vec<Bar>>;

    /// Source name
    fn name(&self) -> &str;

    async fn fetch_window(&self, instrument: &str, timeframe: TimeFrame, count: usize) -> Result<BarWindow> {
        let bars = self.fetch_bars(instrument, timeframe, count).await?;
        Ok(BarWindow::new(timeframe, bars))
    }
}
