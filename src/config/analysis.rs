//! Checklist, plan and cluster configuration.
//!
//! One canonical set of constants. The scoring ceilings (4/3/3) are part of
//! the checklist contract and live next to the checks themselves, not here.

/// Settings for the market-structure check
pub struct StructureSettings {
    // EMA period used for trend alignment (close above/below)
    pub ema_period: usize,
    // Bars required on each side of a pivot before it is confirmed
    pub pivot_left: usize,
    pub pivot_right: usize,
}

/// Settings for the liquidity-sweep check
pub struct LiquiditySettings {
    // Window (bars, excluding the current one) defining the recent high/low
    pub lookback: usize,
    // A sweep without a reclaiming close is "wait", not a signal
    pub reclaim_required: bool,
    // Sweep margin as a fraction of ATR
    pub atr_margin_factor: f64,
    // Fallback margin as a fraction of the window range when ATR is unknown
    pub range_margin_pct: f64,
}

/// Settings for the fair-value-gap check
pub struct FvgSettings {
    // How many recent bars to scan for 3-candle gaps
    pub max_lookback: usize,
    // Minimum gap width as a fraction of ATR (0 when ATR is unknown)
    pub min_gap_atr_factor: f64,
    // Reaction wick must cover at least this share of the candle range
    pub reaction_wick_ratio: f64,
}

/// Settings for the plan builder
pub struct PlanSettings {
    // Support/resistance window in bars
    pub sr_window: usize,
    // Entry/stop buffer: max(atr * atr_buffer_factor, last * min_buffer_pct)
    pub atr_buffer_factor: f64,
    pub min_buffer_pct: f64,
    // Take-profit fractions of the distance to resistance (or support)
    pub tp_fractions: [f64; 3],
}

/// Settings for liquidity-cluster confluence
pub struct ClusterSettings {
    // Clusters below this notional are ignored
    pub min_usd: f64,
    // A level within this percentage of spot counts as confluent
    pub proximity_pct: f64,
    // Default lifetime for manually added clusters
    pub manual_ttl_sec: i64,
}

/// The Master Analysis Configuration
pub struct AnalysisConfig {
    pub atr_period: usize,
    pub structure: StructureSettings,
    pub liquidity: LiquiditySettings,
    pub fvg: FvgSettings,
    pub plan: PlanSettings,
    pub clusters: ClusterSettings,
}

pub const ANALYSIS: AnalysisConfig = AnalysisConfig {
    atr_period: 14,

    structure: StructureSettings {
        ema_period: 200,
        pivot_left: 2,
        pivot_right: 2,
    },

    liquidity: LiquiditySettings {
        lookback: 24,
        reclaim_required: true,
        atr_margin_factor: 0.15,
        range_margin_pct: 0.01,
    },

    fvg: FvgSettings {
        max_lookback: 80,
        min_gap_atr_factor: 0.05,
        reaction_wick_ratio: 0.45,
    },

    plan: PlanSettings {
        sr_window: 48,
        atr_buffer_factor: 0.35,
        min_buffer_pct: 0.0015,
        tp_fractions: [0.35, 0.70, 1.0],
    },

    clusters: ClusterSettings {
        min_usd: 150_000_000.0,
        proximity_pct: 0.6,
        // 24 hours (60 * 60 * 24)
        manual_ttl_sec: 86_400,
    },
};
