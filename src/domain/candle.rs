use serde::{Deserialize, Serialize};

// Define the CandleType enum
#[derive(Debug, PartialEq)]
pub enum CandleType {
    Bullish,
    Bearish,
}

/// One normalized OHLCV bar. Ingestion guarantees `time_s` is in seconds
/// (millisecond feeds are divided down) and that all four prices are present.
/// Candles are immutable once produced; the evaluator never mutates input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub time_s: i64,
    pub open_price: f64,
    pub high_price: f64,
    pub low_price: f64,
    pub close_price: f64,
    pub base_volume: f64,
}

// Implement methods for the Candle struct
impl Candle {
    // A constructor for convenience
    pub fn new(
        time_s: i64,
        open_price: f64,
        high_price: f64,
        low_price: f64,
        close_price: f64,
        base_volume: f64,
    ) -> Self {
        Candle {
            time_s,
            open_price,
            high_price,
            low_price,
            close_price,
            base_volume,
        }
    }

    // A method to determine the type of candle
    pub fn get_type(&self) -> CandleType {
        if self.close_price >= self.open_price {
            CandleType::Bullish
        } else {
            CandleType::Bearish
        }
    }

    // Returns the low and high of the candle body as a tuple
    pub fn body_range(&self) -> (f64, f64) {
        match self.get_type() {
            CandleType::Bullish => (self.open_price, self.close_price),
            CandleType::Bearish => (self.close_price, self.open_price),
        }
    }

    /// Full high-to-low extent of the bar.
    pub fn range(&self) -> f64 {
        self.high_price - self.low_price
    }

    /// Length of the wick above the body.
    pub fn upper_wick(&self) -> f64 {
        self.high_price - self.body_range().1
    }

    /// Length of the wick below the body.
    pub fn lower_wick(&self) -> f64 {
        self.body_range().0 - self.low_price
    }

    /// Whether any part of the bar trades inside `[low, high]`.
    pub fn overlaps(&self, low: f64, high: f64) -> bool {
        self.low_price <= high && self.high_price >= low
    }
}
