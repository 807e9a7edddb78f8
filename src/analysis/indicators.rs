//! EMA, ATR and swing-pivot primitives over canonical candle sequences.

use crate::domain::Candle;

/// Exponential moving average, seeded with the first value (not an SMA seed).
/// Output has the same length as the input.
pub fn ema(values: &[f64], period: usize) -> Vec<f64> {
    if values.is_empty() {
        return Vec::new();
    }
    let k = 2.0 / (period as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());
    let mut prev = values[0];
    out.push(prev);
    for &v in &values[1..] {
        prev = v * k + prev * (1.0 - k);
        out.push(prev);
    }
    out
}

/// Average true range over the last `period` bars.
///
/// Returns `0.0` when fewer than `period + 1` candles are available; callers
/// must treat that as "unknown", not as zero volatility.
pub fn atr(candles: &[Candle], period: usize) -> f64 {
    if candles.len() < period + 1 {
        return 0.0;
    }
    let start = candles.len() - period;
    let mut sum = 0.0;
    for i in start..candles.len() {
        let c = &candles[i];
        let prev_close = candles[i - 1].close_price;
        let tr = (c.high_price - c.low_price)
            .max((c.high_price - prev_close).abs())
            .max((c.low_price - prev_close).abs());
        sum += tr;
    }
    sum / period as f64
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PivotKind {
    High,
    Low,
}

/// A bar is a pivot high when its high is strictly above every neighbour
/// within `left`/`right` bars.
pub fn is_pivot_high(candles: &[Candle], i: usize, left: usize, right: usize) -> bool {
    if i < left || i + right >= candles.len() {
        return false;
    }
    let h = candles[i].high_price;
    (i - left..=i + right)
        .filter(|&j| j != i)
        .all(|j| candles[j].high_price < h)
}

/// Pivot low: every neighbour's low must be strictly above this bar's low.
/// Ties disqualify, otherwise flat bases inflate the pivot count.
pub fn is_pivot_low(candles: &[Candle], i: usize, left: usize, right: usize) -> bool {
    if i < left || i + right >= candles.len() {
        return false;
    }
    let l = candles[i].low_price;
    (i - left..=i + right)
        .filter(|&j| j != i)
        .all(|j| candles[j].low_price > l)
}

/// The most recent `n` confirmed pivots, in chronological order.
///
/// Scans backward from the last confirmable bar (one that still has `right`
/// bars of lookahead); the pair `(index, price)` is returned per pivot.
pub fn last_n_pivots(
    candles: &[Candle],
    kind: PivotKind,
    n: usize,
    left: usize,
    right: usize,
) -> Vec<(usize, f64)> {
    let mut out: Vec<(usize, f64)> = Vec::new();
    let Some(last_confirmable) = candles.len().checked_sub(right + 1) else {
        return out;
    };
    for i in (left + 1..=last_confirmable).rev() {
        let hit = match kind {
            PivotKind::High if is_pivot_high(candles, i, left, right) => {
                Some(candles[i].high_price)
            }
            PivotKind::Low if is_pivot_low(candles, i, left, right) => Some(candles[i].low_price),
            _ => None,
        };
        if let Some(price) = hit {
            out.push((i, price));
            if out.len() >= n {
                break;
            }
        }
    }
    out.reverse();
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(time_s: i64, price: f64) -> Candle {
        Candle::new(time_s, price, price, price, price, 1.0)
    }

    fn bar(time_s: i64, high: f64, low: f64, close: f64) -> Candle {
        Candle::new(time_s, close, high, low, close, 1.0)
    }

    #[test]
    fn ema_is_seeded_with_first_value_and_keeps_length() {
        let values = vec![10.0, 11.0, 12.0, 13.0];
        let out = ema(&values, 3);
        assert_eq!(out.len(), values.len());
        assert_eq!(out[0], values[0]);
        // k = 0.5 for period 3: 11*0.5 + 10*0.5 = 10.5
        assert!((out[1] - 10.5).abs() < 1e-12);
        assert!(ema(&[], 3).is_empty());
    }

    #[test]
    fn atr_is_zero_without_enough_candles() {
        let candles: Vec<Candle> = (0..14).map(|i| flat(i, 100.0)).collect();
        assert_eq!(atr(&candles, 14), 0.0, "needs period + 1 bars");
    }

    #[test]
    fn atr_averages_true_ranges() {
        // 15 bars with a constant 2.0 high-low range and no close gaps
        let candles: Vec<Candle> = (0..15).map(|i| bar(i, 101.0, 99.0, 100.0)).collect();
        assert!((atr(&candles, 14) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn flat_tops_are_not_pivots() {
        let mut candles: Vec<Candle> = (0..9).map(|i| bar(i, 100.0, 99.0, 99.5)).collect();
        candles[4] = bar(4, 102.0, 99.0, 101.0);
        candles[5] = bar(5, 102.0, 99.0, 101.0); // equal high: neither bar qualifies
        assert!(!is_pivot_high(&candles, 4, 2, 2));
        assert!(!is_pivot_high(&candles, 5, 2, 2));
    }

    #[test]
    fn last_n_pivots_come_back_in_chronological_order() {
        let mut candles: Vec<Candle> = (0..20).map(|i| bar(i, 100.0 + (i % 2) as f64 * 0.1, 99.0, 99.5)).collect();
        candles[6] = bar(6, 105.0, 99.0, 104.0);
        candles[12] = bar(12, 107.0, 99.0, 106.0);
        let pivots = last_n_pivots(&candles, PivotKind::High, 2, 2, 2);
        assert_eq!(pivots.len(), 2);
        assert_eq!(pivots[0].0, 6, "older pivot first");
        assert_eq!(pivots[1].0, 12);
        assert_eq!(pivots[1].1, 107.0);
    }

    #[test]
    fn unconfirmed_trailing_bars_are_ignored() {
        // A spike on the final bar has no right-side lookahead yet
        let mut candles: Vec<Candle> = (0..10).map(|i| bar(i, 100.0, 99.0, 99.5)).collect();
        candles[9] = bar(9, 120.0, 99.0, 119.0);
        let pivots = last_n_pivots(&candles, PivotKind::High, 1, 2, 2);
        assert!(pivots.iter().all(|&(i, _)| i != 9));
    }
}
