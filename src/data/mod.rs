// Data ingestion and live market feeds
pub mod bitget;
pub mod ingest;

// Re-export commonly used types
pub use bitget::BitgetFeed;
pub use ingest::normalize;

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::Candle;

/// Where candles come from. An `Ok(empty)` result means "no data this cycle";
/// `Err` is reserved for transport/protocol failures and is caught at the
/// watcher loop boundary.
#[async_trait]
pub trait CandleSource: Send + Sync {
    async fn fetch_candles(
        &self,
        symbol: &str,
        granularity: &str,
        limit: u32,
    ) -> Result<Vec<Candle>>;
}

/// Live last-price prints, used by the take-profit watcher only.
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn last_price(&self, symbol: &str) -> Result<Option<f64>>;
}
