use argminmax::ArgMinMax;

// SIMD-backed extrema over price windows. Callers guarantee non-empty slices
// (lookback windows are validated before we get here).
pub fn get_max(vec: &[f64]) -> f64 {
    let max_index: usize = vec.argmax();
    vec[max_index]
}

pub fn get_min(vec: &[f64]) -> f64 {
    let min_index: usize = vec.argmin();
    vec[min_index]
}

pub fn get_min_max(vec: &[f64]) -> (f64, f64) {
    (get_min(vec), get_max(vec))
}

/// Percentage distance between a level and a reference price.
pub fn pct_distance(reference: f64, level: f64) -> f64 {
    (level - reference).abs() / reference.abs().max(1e-9) * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn min_max_over_window() {
        let window = vec![101.5, 99.0, 104.25, 100.0];
        assert_eq!(get_min_max(&window), (99.0, 104.25));
    }

    #[test]
    fn pct_distance_is_symmetric_and_guarded() {
        assert!((pct_distance(100.0, 100.6) - 0.6).abs() < 1e-9);
        assert!((pct_distance(100.0, 99.4) - 0.6).abs() < 1e-9);
        // Zero reference must not divide by zero
        assert!(pct_distance(0.0, 1.0).is_finite());
    }
}
