//! Trade-plan construction: entry zone, protective stop and three
//! take-profit levels derived from the recent support/resistance window.
//!
//! The builder is pure: identical candles and bias always produce an
//! identical plan. No live price, clock or randomness is consulted.

use serde::Serialize;

use crate::config::AnalysisConfig;
use crate::domain::{Bias, Candle};
use crate::utils::maths_utils;

use super::indicators;

/// A fully specified plan. `tps` are ordered nearest-first and TP3 always
/// lands on the far side of the range (resistance for longs, support for
/// shorts).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Plan {
    pub bias: Bias,
    pub entry_low: f64,
    pub entry_high: f64,
    pub stop: f64,
    pub tps: [f64; 3],
    pub support: f64,
    pub resistance: f64,
    pub last_close: f64,
}

/// Build a plan from the trailing support/resistance window.
///
/// A NEUTRAL bias still produces a plan, shaped like a long around support;
/// with a take-profit fraction of 1.0 the final target sits on resistance,
/// so the range itself is the trade.
///
/// Returns `None` when fewer than `sr_window` candles are available.
pub fn build_plan(candles: &[Candle], bias: Bias, cfg: &AnalysisConfig) -> Option<Plan> {
    let window_len = cfg.plan.sr_window;
    if candles.len() < window_len {
        return None;
    }

    let window = &candles[candles.len() - window_len..];
    let highs: Vec<f64> = window.iter().map(|c| c.high_price).collect();
    let lows: Vec<f64> = window.iter().map(|c| c.low_price).collect();
    let resistance = maths_utils::get_max(&highs);
    let support = maths_utils::get_min(&lows);
    let last_close = candles[candles.len() - 1].close_price;

    let atr = indicators::atr(candles, cfg.atr_period);
    let buf = (atr * cfg.plan.atr_buffer_factor).max(last_close * cfg.plan.min_buffer_pct);
    let [f1, f2, f3] = cfg.plan.tp_fractions;

    let plan = match bias {
        Bias::Short => Plan {
            bias,
            entry_low: resistance - 1.2 * buf,
            entry_high: resistance - 0.2 * buf,
            stop: resistance + 1.2 * buf,
            tps: [
                last_close - (last_close - support) * f1,
                last_close - (last_close - support) * f2,
                last_close - (last_close - support) * f3,
            ],
            support,
            resistance,
            last_close,
        },
        _ => Plan {
            bias,
            entry_low: support + 0.2 * buf,
            entry_high: support + 1.2 * buf,
            stop: support - 1.2 * buf,
            tps: [
                last_close + (resistance - last_close) * f1,
                last_close + (resistance - last_close) * f2,
                last_close + (resistance - last_close) * f3,
            ],
            support,
            resistance,
            last_close,
        },
    };
    Some(plan)
}

/// Whether a live print has reached a take-profit level. NEUTRAL plans are
/// long-shaped, so they check the long way.
pub fn tp_reached(bias: Bias, price: f64, tp: f64) -> bool {
    match bias {
        Bias::Short => price <= tp,
        _ => price >= tp,
    }
}

/// Nearby support/resistance prints for the levels report.
#[derive(Debug, Clone, Serialize)]
pub struct Levels {
    pub last_close: f64,
    /// Confirmed pivot lows below the last close, nearest first.
    pub supports: Vec<f64>,
    /// Confirmed pivot highs above the last close, nearest first.
    pub resistances: Vec<f64>,
}

/// Collect the `per_side` nearest confirmed pivot levels on each side of the
/// last close. Pivots within 0.05% of an already kept level are folded away.
pub fn nearest_levels(candles: &[Candle], per_side: usize, cfg: &AnalysisConfig) -> Levels {
    let last_close = candles.last().map(|c| c.close_price).unwrap_or(0.0);
    let left = cfg.structure.pivot_left;
    let right = cfg.structure.pivot_right;

    let highs = indicators::last_n_pivots(candles, indicators::PivotKind::High, usize::MAX, left, right);
    let lows = indicators::last_n_pivots(candles, indicators::PivotKind::Low, usize::MAX, left, right);

    let mut resistances: Vec<f64> = highs
        .iter()
        .map(|&(_, p)| p)
        .filter(|&p| p > last_close)
        .collect();
    let mut supports: Vec<f64> = lows
        .iter()
        .map(|&(_, p)| p)
        .filter(|&p| p < last_close)
        .collect();

    let by_distance = |a: &f64, b: &f64| {
        let (da, db) = ((a - last_close).abs(), (b - last_close).abs());
        da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
    };
    resistances.sort_by(by_distance);
    supports.sort_by(by_distance);

    Levels {
        last_close,
        supports: dedup_nearby(supports, per_side),
        resistances: dedup_nearby(resistances, per_side),
    }
}

fn dedup_nearby(sorted: Vec<f64>, keep: usize) -> Vec<f64> {
    let mut out: Vec<f64> = Vec::new();
    for level in sorted {
        let duplicate = out
            .iter()
            .any(|&kept| maths_utils::pct_distance(kept, level) < 0.05);
        if !duplicate {
            out.push(level);
            if out.len() >= keep {
                break;
            }
        }
    }
    out
}
