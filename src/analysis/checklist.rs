//! The 4H setup checklist: structure, liquidity sweep and fair-value gap.
//!
//! Every check consumes the full candle sequence and returns a well-formed
//! `CheckResult` on every path. Data insufficiency is a low-confidence result
//! (score 0, NEUTRAL, explanatory reason), never an error; the only special
//! case is an empty candle sequence, which short-circuits to a NO DATA
//! verdict before any check runs.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::AnalysisConfig;
use crate::domain::{Bias, Candle, VerdictStatus};
use crate::utils::maths_utils;

use super::indicators::{self, PivotKind};

pub const STRUCTURE_MAX_SCORE: u32 = 4;
pub const LIQUIDITY_MAX_SCORE: u32 = 3;
pub const FVG_MAX_SCORE: u32 = 3;

/// Outcome of a single check. `score` is always within `[0, max_score]`.
#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub passed: bool,
    pub score: u32,
    pub max_score: u32,
    pub bias: Bias,
    pub reasons: Vec<String>,
    pub details: BTreeMap<String, String>,
}

impl CheckResult {
    /// Low-confidence placeholder for "not enough data to judge".
    fn insufficient(max_score: u32, reason: impl Into<String>) -> Self {
        Self {
            passed: false,
            score: 0,
            max_score,
            bias: Bias::Neutral,
            reasons: vec![reason.into()],
            details: BTreeMap::new(),
        }
    }
}

/// Combined verdict. Recomputed from fresh candles on every evaluation;
/// never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct ChecklistVerdict {
    pub status: VerdictStatus,
    pub bias: Bias,
    pub score: u32,
    pub max_score: u32,
    pub structure: CheckResult,
    pub liquidity: CheckResult,
    pub fvg: CheckResult,
}

/// Market-structure check, scored out of 4:
/// 2 points for a pivot sequence (HH/HL or LH/LL), 2 for EMA alignment.
pub fn check_structure(candles: &[Candle], cfg: &AnalysisConfig) -> CheckResult {
    let ema_period = cfg.structure.ema_period;
    let min_candles = (ema_period + 20).max(120);
    if candles.len() < min_candles {
        return CheckResult::insufficient(
            STRUCTURE_MAX_SCORE,
            "Not enough candles for structure/EMA.",
        );
    }

    let left = cfg.structure.pivot_left;
    let right = cfg.structure.pivot_right;
    let highs = indicators::last_n_pivots(candles, PivotKind::High, 2, left, right);
    let lows = indicators::last_n_pivots(candles, PivotKind::Low, 2, left, right);
    if highs.len() < 2 || lows.len() < 2 {
        return CheckResult::insufficient(STRUCTURE_MAX_SCORE, "Not enough pivot points.");
    }

    let (h1, h2) = (highs[0].1, highs[1].1);
    let (l1, l2) = (lows[0].1, lows[1].1);
    let bullish = h2 > h1 && l2 > l1;
    let bearish = h2 < h1 && l2 < l1;

    let closes: Vec<f64> = candles.iter().map(|c| c.close_price).collect();
    let ema = indicators::ema(&closes, ema_period);
    let last_close = closes[closes.len() - 1];
    let last_ema = ema[ema.len() - 1];

    let mut score = 0;
    let mut reasons: Vec<String> = Vec::new();
    let mut bias = Bias::Neutral;

    if bullish {
        bias = Bias::Long;
        score += 2;
        reasons.push(format!(
            "Structure: HH/HL (H {h1:.0}->{h2:.0}, L {l1:.0}->{l2:.0})."
        ));
    } else if bearish {
        bias = Bias::Short;
        score += 2;
        reasons.push(format!(
            "Structure: LH/LL (H {h1:.0}->{h2:.0}, L {l1:.0}->{l2:.0})."
        ));
    } else {
        reasons.push("Structure: mixed pivots (range/transition).".to_string());
    }

    let ema_aligned = match bias {
        Bias::Long => last_close > last_ema,
        Bias::Short => last_close < last_ema,
        Bias::Neutral => false,
    };
    if ema_aligned {
        score += 2;
        let side = if bias == Bias::Long { "above" } else { "below" };
        reasons.push(format!("EMA{ema_period}: close {side}."));
    } else if bias.is_directional() {
        reasons.push(format!(
            "EMA{ema_period}: not aligned (close {last_close:.0} vs {last_ema:.0})."
        ));
    }

    let mut details = BTreeMap::new();
    details.insert("close".to_string(), format!("{last_close:.4}"));
    details.insert("ema".to_string(), format!("{last_ema:.4}"));
    details.insert("pivot_highs".to_string(), format!("{h1:.4} -> {h2:.4}"));
    details.insert("pivot_lows".to_string(), format!("{l1:.4} -> {l2:.4}"));

    CheckResult {
        passed: bias.is_directional() && score >= 2,
        score,
        max_score: STRUCTURE_MAX_SCORE,
        bias,
        reasons,
        details,
    }
}

/// Liquidity-sweep check, scored out of 3:
/// 1 point for a sweep beyond the recent extreme, 2 more for the reclaim.
pub fn check_liquidity(candles: &[Candle], cfg: &AnalysisConfig) -> CheckResult {
    let lookback = cfg.liquidity.lookback;
    if candles.len() < lookback + 5 {
        return CheckResult::insufficient(
            LIQUIDITY_MAX_SCORE,
            "Not enough candles for liquidity check.",
        );
    }

    let atr = indicators::atr(candles, cfg.atr_period);
    let last = candles[candles.len() - 1];
    // Recent extremes over the lookback window, excluding the current bar
    let window = &candles[candles.len() - lookback..candles.len() - 1];
    let highs: Vec<f64> = window.iter().map(|c| c.high_price).collect();
    let lows: Vec<f64> = window.iter().map(|c| c.low_price).collect();
    let recent_high = maths_utils::get_max(&highs);
    let recent_low = maths_utils::get_min(&lows);

    let margin = if atr > 0.0 {
        atr * cfg.liquidity.atr_margin_factor
    } else {
        (recent_high - recent_low) * cfg.liquidity.range_margin_pct
    };

    // Sweep-low takes priority; one bar never registers both directions
    let swept_low = last.low_price < recent_low - margin;
    let swept_high = last.high_price > recent_high + margin;

    let mut score = 0;
    let mut reasons: Vec<String> = Vec::new();
    let mut bias = Bias::Neutral;
    let reclaim_required = cfg.liquidity.reclaim_required;

    if swept_low {
        bias = Bias::Long;
        score += 1;
        reasons.push(format!("Sweep: sell-side below {recent_low:.0}."));
        if reclaim_required && last.close_price > recent_low {
            score += 2;
            reasons.push("Reclaim: close back above swept low.".to_string());
        } else if reclaim_required {
            reasons.push("Reclaim: not yet (wait).".to_string());
        } else {
            score += 1;
        }
    } else if swept_high {
        bias = Bias::Short;
        score += 1;
        reasons.push(format!("Sweep: buy-side above {recent_high:.0}."));
        if reclaim_required && last.close_price < recent_high {
            score += 2;
            reasons.push("Reclaim: close back below swept high.".to_string());
        } else if reclaim_required {
            reasons.push("Reclaim: not yet (wait).".to_string());
        } else {
            score += 1;
        }
    } else {
        reasons.push("No clear sweep detected.".to_string());
    }

    let mut details = BTreeMap::new();
    details.insert("recent_high".to_string(), format!("{recent_high:.4}"));
    details.insert("recent_low".to_string(), format!("{recent_low:.4}"));
    details.insert("margin".to_string(), format!("{margin:.4}"));
    details.insert("atr".to_string(), format!("{atr:.4}"));

    let needed = if reclaim_required { 3 } else { 2 };
    CheckResult {
        passed: score >= needed,
        score,
        max_score: LIQUIDITY_MAX_SCORE,
        bias,
        reasons,
        details,
    }
}

#[derive(Debug, Clone, Copy)]
struct FvgZone {
    bias: Bias,
    low: f64,
    high: f64,
}

/// Fair-value-gap check, scored out of 3:
/// 1 for the latest candle touching the most recent zone, 1 for a reaction
/// wick against the gap direction, 1 for a close beyond the zone midpoint.
pub fn check_fvg(candles: &[Candle], cfg: &AnalysisConfig) -> CheckResult {
    if candles.len() < 10 {
        return CheckResult::insufficient(FVG_MAX_SCORE, "Not enough candles for FVG check.");
    }

    let atr = indicators::atr(candles, cfg.atr_period);
    let min_gap = if atr > 0.0 {
        atr * cfg.fvg.min_gap_atr_factor
    } else {
        0.0
    };

    // Only the most recently created zone matters; earlier zones are ignored
    // even when still open.
    let start = candles.len().saturating_sub(cfg.fvg.max_lookback).max(2);
    let mut latest: Option<FvgZone> = None;
    for i in start..candles.len() {
        let c1 = &candles[i - 2];
        let c3 = &candles[i];
        if c1.high_price + min_gap < c3.low_price {
            latest = Some(FvgZone {
                bias: Bias::Long,
                low: c1.high_price,
                high: c3.low_price,
            });
        }
        if c1.low_price - min_gap > c3.high_price {
            latest = Some(FvgZone {
                bias: Bias::Short,
                low: c3.high_price,
                high: c1.low_price,
            });
        }
    }

    let Some(zone) = latest else {
        return CheckResult::insufficient(FVG_MAX_SCORE, "No recent FVG found.");
    };

    let last = candles[candles.len() - 1];
    if !last.overlaps(zone.low, zone.high) {
        // Inapplicable this bar, not a failure
        let mut result =
            CheckResult::insufficient(FVG_MAX_SCORE, "No active FVG interaction.");
        result
            .details
            .insert("zone".to_string(), format!("{:.4}-{:.4}", zone.low, zone.high));
        return result;
    }

    let kind = if zone.bias == Bias::Long { "bullish" } else { "bearish" };
    let mut score = 1;
    let mut reasons = vec![format!(
        "FVG touched: {kind} [{:.0}-{:.0}].",
        zone.low, zone.high
    )];

    let rng = last.range().max(1e-9);
    let wick_ratio = match zone.bias {
        Bias::Long => last.lower_wick() / rng,
        _ => last.upper_wick() / rng,
    };
    if wick_ratio >= cfg.fvg.reaction_wick_ratio {
        score += 1;
        reasons.push("Reaction wick confirmed.".to_string());
    } else {
        reasons.push("Weak wick reaction.".to_string());
    }

    let mid = (zone.low + zone.high) / 2.0;
    let close_ok = match zone.bias {
        Bias::Long => last.close_price >= mid,
        _ => last.close_price <= mid,
    };
    if close_ok {
        score += 1;
        reasons.push("Close confirms direction vs midpoint.".to_string());
    } else {
        reasons.push("Close not confirming (lower confidence).".to_string());
    }

    let mut details = BTreeMap::new();
    details.insert("zone".to_string(), format!("{:.4}-{:.4}", zone.low, zone.high));
    details.insert("mid".to_string(), format!("{mid:.4}"));
    details.insert("atr".to_string(), format!("{atr:.4}"));

    CheckResult {
        passed: score >= 2,
        score,
        max_score: FVG_MAX_SCORE,
        bias: zone.bias,
        reasons,
        details,
    }
}

/// Merge the three check results into one verdict.
///
/// A confirming check only counts toward SETUP VALID when it both passed and
/// agrees in direction with structure.
pub fn combine(
    structure: CheckResult,
    liquidity: CheckResult,
    fvg: CheckResult,
) -> ChecklistVerdict {
    let structure_ok = structure.passed && structure.bias.is_directional();
    let setup_ok = (liquidity.passed && liquidity.bias == structure.bias)
        || (fvg.passed && fvg.bias == structure.bias);

    let score = structure.score + liquidity.score + fvg.score;
    let max_score = structure.max_score + liquidity.max_score + fvg.max_score;

    let (status, bias) = if structure_ok && setup_ok {
        (VerdictStatus::SetupValid, structure.bias)
    } else if structure_ok {
        (VerdictStatus::PartialWait, structure.bias)
    } else {
        (VerdictStatus::NoTrade, Bias::Neutral)
    };

    ChecklistVerdict {
        status,
        bias,
        score,
        max_score,
        structure,
        liquidity,
        fvg,
    }
}

/// Run the full checklist over a candle sequence.
pub fn evaluate(candles: &[Candle], cfg: &AnalysisConfig) -> ChecklistVerdict {
    if candles.is_empty() {
        let reason = "No candles returned from feed.";
        return ChecklistVerdict {
            status: VerdictStatus::NoData,
            bias: Bias::Neutral,
            score: 0,
            max_score: STRUCTURE_MAX_SCORE + LIQUIDITY_MAX_SCORE + FVG_MAX_SCORE,
            structure: CheckResult::insufficient(STRUCTURE_MAX_SCORE, reason),
            liquidity: CheckResult::insufficient(LIQUIDITY_MAX_SCORE, reason),
            fvg: CheckResult::insufficient(FVG_MAX_SCORE, reason),
        };
    }

    combine(
        check_structure(candles, cfg),
        check_liquidity(candles, cfg),
        check_fvg(candles, cfg),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ANALYSIS;

    fn bar(i: i64, open: f64, high: f64, low: f64, close: f64) -> Candle {
        Candle::new(i * 14_400, open, high, low, close, 1.0)
    }

    /// Gentle uptrend with engineered pivots: highs at 200/210, lows at
    /// 195/205, all ascending, closes above the lagging EMA(200).
    fn bullish_structure_candles() -> Vec<Candle> {
        let mut candles: Vec<Candle> = (0..220)
            .map(|i| {
                let base = 100.0 + i as f64 * 0.1;
                bar(i, base - 0.2, base + 0.5, base - 0.5, base)
            })
            .collect();
        for (idx, bump) in [(200usize, 5.0), (210usize, 5.0)] {
            let c = candles[idx];
            candles[idx] = bar(idx as i64, c.open_price, c.high_price + bump, c.low_price, c.close_price);
        }
        for idx in [195usize, 205usize] {
            let c = candles[idx];
            candles[idx] = bar(idx as i64, c.open_price, c.high_price, c.low_price - 5.0, c.close_price);
        }
        candles
    }

    fn flat_candles(n: usize) -> Vec<Candle> {
        (0..n as i64).map(|i| bar(i, 100.5, 101.0, 100.0, 100.5)).collect()
    }

    #[test]
    fn structure_scores_full_marks_on_hh_hl_above_ema() {
        let candles = bullish_structure_candles();
        let result = check_structure(&candles, &ANALYSIS);
        assert_eq!(result.bias, Bias::Long);
        assert_eq!(result.score, 4);
        assert!(result.passed);
    }

    #[test]
    fn structure_needs_enough_history() {
        let candles = flat_candles(100);
        let result = check_structure(&candles, &ANALYSIS);
        assert_eq!(result.score, 0);
        assert_eq!(result.bias, Bias::Neutral);
        assert!(!result.passed);
    }

    #[test]
    fn liquidity_sweep_with_reclaim_scores_three() {
        // Flat bars: ATR = 1.0, so margin = 0.15 around the 24-bar low of 100
        let mut candles = flat_candles(40);
        let last = candles.len() - 1;
        candles[last] = bar(last as i64, 100.2, 100.8, 99.5, 100.6);
        let result = check_liquidity(&candles, &ANALYSIS);
        assert_eq!(result.bias, Bias::Long);
        assert_eq!(result.score, 3);
        assert!(result.passed);
    }

    #[test]
    fn liquidity_sweep_without_reclaim_is_a_wait() {
        let mut candles = flat_candles(40);
        let last = candles.len() - 1;
        // Undercuts the low but closes below it: sweep only
        candles[last] = bar(last as i64, 100.2, 100.8, 99.5, 99.7);
        let result = check_liquidity(&candles, &ANALYSIS);
        assert_eq!(result.bias, Bias::Long);
        assert_eq!(result.score, 1);
        assert!(!result.passed);
    }

    #[test]
    fn liquidity_neutral_without_a_sweep() {
        let candles = flat_candles(40);
        let result = check_liquidity(&candles, &ANALYSIS);
        assert_eq!(result.score, 0);
        assert_eq!(result.bias, Bias::Neutral);
    }

    /// 12 bars: flat base, an impulse leaving a bullish gap [101, 102],
    /// then bars holding above the zone.
    fn fvg_candles(last: Candle) -> Vec<Candle> {
        let mut candles: Vec<Candle> = (0..8).map(|i| bar(i, 100.0, 101.0, 99.5, 100.5)).collect();
        candles.push(bar(8, 100.5, 103.0, 100.0, 102.8)); // impulse
        candles.push(bar(9, 102.8, 104.0, 102.0, 103.5)); // completes the gap vs bar 7
        candles.push(bar(10, 103.5, 104.5, 103.0, 104.0));
        candles.push(last);
        candles
    }

    #[test]
    fn fvg_untouched_zone_is_inapplicable_not_failed() {
        let result = check_fvg(&fvg_candles(bar(11, 104.0, 105.0, 103.2, 104.5)), &ANALYSIS);
        assert_eq!(result.score, 0);
        assert_eq!(result.bias, Bias::Neutral);
        assert!(!result.passed);
    }

    #[test]
    fn fvg_touch_with_wick_and_close_scores_three() {
        // Dips into [101, 102] with a dominant lower wick, closes over the
        // midpoint of 101.5
        let touch = bar(11, 102.3, 102.6, 101.2, 102.5);
        let result = check_fvg(&fvg_candles(touch), &ANALYSIS);
        assert_eq!(result.bias, Bias::Long);
        assert_eq!(result.score, 3);
        assert!(result.passed);
    }

    fn manual(passed: bool, score: u32, max_score: u32, bias: Bias) -> CheckResult {
        CheckResult {
            passed,
            score,
            max_score,
            bias,
            reasons: Vec::new(),
            details: BTreeMap::new(),
        }
    }

    #[test]
    fn one_agreeing_confirmation_is_enough() {
        // Liquidity agrees with structure; a disagreeing, failed FVG is moot
        let verdict = combine(
            manual(true, 4, 4, Bias::Long),
            manual(true, 3, 3, Bias::Long),
            manual(false, 1, 3, Bias::Short),
        );
        assert_eq!(verdict.status, VerdictStatus::SetupValid);
        assert_eq!(verdict.bias, Bias::Long);
        assert_eq!(verdict.score, 8);
        assert_eq!(verdict.max_score, 10);
    }

    #[test]
    fn a_passed_but_disagreeing_confirmation_does_not_count() {
        let verdict = combine(
            manual(true, 4, 4, Bias::Long),
            manual(true, 3, 3, Bias::Short),
            manual(false, 0, 3, Bias::Neutral),
        );
        assert_eq!(verdict.status, VerdictStatus::PartialWait);
        assert_eq!(verdict.bias, Bias::Long);
    }

    #[test]
    fn no_structure_means_no_trade() {
        let verdict = combine(
            manual(false, 0, 4, Bias::Neutral),
            manual(true, 3, 3, Bias::Long),
            manual(true, 3, 3, Bias::Long),
        );
        assert_eq!(verdict.status, VerdictStatus::NoTrade);
        assert_eq!(verdict.bias, Bias::Neutral);
    }

    #[test]
    fn zero_candles_short_circuit_to_no_data() {
        let verdict = evaluate(&[], &ANALYSIS);
        assert_eq!(verdict.status, VerdictStatus::NoData);
        assert_eq!(verdict.score, 0);
        assert_eq!(verdict.max_score, 10);
        assert_eq!(verdict.structure.score, 0);
        assert_eq!(verdict.liquidity.score, 0);
        assert_eq!(verdict.fvg.score, 0);
    }

    #[test]
    fn full_evaluate_on_flat_data_is_no_trade() {
        let verdict = evaluate(&flat_candles(250), &ANALYSIS);
        assert_eq!(verdict.status, VerdictStatus::NoTrade);
        assert_eq!(verdict.bias, Bias::Neutral);
    }
}
