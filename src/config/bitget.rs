//! Bitget-specific configuration constants and types.

/// REST paths for the public market endpoints we poll.
/// MIX (futures) is tried first, SPOT is the fallback universe.
pub struct RestEndpoints {
    pub base_url: &'static str,
    pub mix_candles_path: &'static str,
    pub spot_candles_path: &'static str,
    pub mix_ticker_path: &'static str,
    pub spot_ticker_path: &'static str,
    pub mix_product_type: &'static str,
}

/// Default values for the Rest Client
pub struct ClientDefaults {
    pub timeout_ms: u64,
    /// Candles per fetch; enough for EMA(200) plus pivot lookback
    pub candle_limit: u32,
    /// Checklist timeframe (Bitget shorthand)
    pub granularity: &'static str,
}

/// Watcher cadence and sanity limits
pub struct WatchDefaults {
    pub setup_poll_sec: u64,
    pub tp_poll_sec: u64,
    /// Ticker prints further than this fraction from the previous print are
    /// skipped for that poll (stale/fat-finger protection)
    pub price_sanity_pct: f64,
}

/// The Master Configuration Struct
pub struct BitgetConfig {
    pub rest: RestEndpoints,
    pub client: ClientDefaults,
    pub watch: WatchDefaults,
}

pub const BITGET: BitgetConfig = BitgetConfig {
    rest: RestEndpoints {
        base_url: "https://api.bitget.com",
        mix_candles_path: "/api/v2/mix/market/candles",
        spot_candles_path: "/api/v2/spot/market/candles",
        mix_ticker_path: "/api/v2/mix/market/ticker",
        spot_ticker_path: "/api/v2/spot/market/tickers",
        mix_product_type: "USDT-FUTURES",
    },
    client: ClientDefaults {
        timeout_ms: 10_000,
        candle_limit: 320,
        granularity: "4H",
    },
    watch: WatchDefaults {
        setup_poll_sec: 900,
        tp_poll_sec: 30,
        price_sanity_pct: 0.02,
    },
};
