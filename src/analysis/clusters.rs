//! Liquidity clusters: large resting-liquidity levels used as confluence
//! for plan targets.
//!
//! Two sources feed the book. Synthetic clusters are derived from spot
//! (round-number magnets, fully deterministic), and manual clusters are
//! operator-pinned levels with a TTL so stale pins age out on their own.

use serde::Serialize;

use crate::config::AnalysisConfig;
use crate::utils::maths_utils;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Cluster {
    pub price: f64,
    pub size_usd: f64,
}

#[derive(Debug, Clone, Copy)]
struct ManualCluster {
    price: f64,
    size_usd: f64,
    added_at_s: i64,
}

/// Per-run store of manually pinned cluster levels.
#[derive(Debug, Default)]
pub struct ClusterBook {
    manual: Vec<ManualCluster>,
}

impl ClusterBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_manual(&mut self, price: f64, size_usd: f64, now_s: i64) {
        self.manual.push(ManualCluster {
            price,
            size_usd,
            added_at_s: now_s,
        });
    }

    pub fn manual_count(&self) -> usize {
        self.manual.len()
    }

    /// Drop manual clusters past their TTL.
    pub fn prune(&mut self, now_s: i64, cfg: &AnalysisConfig) {
        self.manual
            .retain(|c| now_s - c.added_at_s < cfg.clusters.manual_ttl_sec);
    }

    /// Current cluster view around spot: synthetic plus surviving manual
    /// pins, with anything under the notional floor dropped.
    pub fn snapshot(&self, spot: f64, cfg: &AnalysisConfig) -> Vec<Cluster> {
        let mut out = synthetic_clusters(spot, cfg);
        out.extend(self.manual.iter().map(|c| Cluster {
            price: c.price,
            size_usd: c.size_usd,
        }));
        out.retain(|c| c.size_usd >= cfg.clusters.min_usd);
        out
    }
}

/// Deterministic round-number clusters within roughly 4% of spot.
///
/// Step is one tenth of the price magnitude, so 65_000 yields thousand-dollar
/// levels. Full-magnitude levels carry double weight.
pub fn synthetic_clusters(spot: f64, cfg: &AnalysisConfig) -> Vec<Cluster> {
    if spot <= 0.0 {
        return Vec::new();
    }
    let magnitude = 10f64.powf(spot.log10().floor());
    let step = magnitude / 10.0;
    let lo = spot * 0.96;
    let hi = spot * 1.04;

    let mut out = Vec::new();
    let mut level = (lo / step).ceil() * step;
    while level <= hi {
        let on_magnitude = (level / magnitude).fract().abs() < 1e-9;
        let size_usd = if on_magnitude {
            cfg.clusters.min_usd * 2.0
        } else {
            cfg.clusters.min_usd
        };
        out.push(Cluster {
            price: level,
            size_usd,
        });
        level += step;
    }
    out
}

/// Clusters within the proximity band of `spot`, nearest first; equidistant
/// clusters are ordered by size, largest first.
pub fn clusters_near(spot: f64, clusters: &[Cluster], cfg: &AnalysisConfig) -> Vec<Cluster> {
    let mut near: Vec<Cluster> = clusters
        .iter()
        .copied()
        .filter(|c| maths_utils::pct_distance(spot, c.price) <= cfg.clusters.proximity_pct)
        .collect();
    near.sort_by(|a, b| {
        let da = maths_utils::pct_distance(spot, a.price);
        let db = maths_utils::pct_distance(spot, b.price);
        da.partial_cmp(&db)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(
                b.size_usd
                    .partial_cmp(&a.size_usd)
                    .unwrap_or(std::cmp::Ordering::Equal),
            )
    });
    near
}

/// Whether a plan level sits on top of resting liquidity.
pub fn is_confluent(level: f64, clusters: &[Cluster], cfg: &AnalysisConfig) -> bool {
    clusters
        .iter()
        .any(|c| maths_utils::pct_distance(level, c.price) <= cfg.clusters.proximity_pct)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ANALYSIS;

    #[test]
    fn synthetic_clusters_are_deterministic_round_levels() {
        let a = synthetic_clusters(65_000.0, &ANALYSIS);
        let b = synthetic_clusters(65_000.0, &ANALYSIS);
        assert_eq!(a, b);
        assert!(!a.is_empty());
        assert!(a.iter().all(|c| c.price % 1000.0 == 0.0));
        // 62_400..=67_600 at thousand steps
        assert_eq!(a.first().map(|c| c.price), Some(63_000.0));
        assert_eq!(a.last().map(|c| c.price), Some(67_000.0));
    }

    #[test]
    fn manual_clusters_expire_after_ttl() {
        let mut book = ClusterBook::new();
        book.add_manual(64_500.0, 200_000_000.0, 1_000);
        book.prune(1_000 + ANALYSIS.clusters.manual_ttl_sec - 1, &ANALYSIS);
        assert_eq!(book.manual_count(), 1);
        book.prune(1_000 + ANALYSIS.clusters.manual_ttl_sec, &ANALYSIS);
        assert_eq!(book.manual_count(), 0);
    }

    #[test]
    fn snapshot_drops_clusters_under_the_notional_floor() {
        let mut book = ClusterBook::new();
        book.add_manual(64_500.0, 1_000.0, 0); // dust pin
        book.add_manual(64_800.0, 200_000_000.0, 0);
        let snap = book.snapshot(65_000.0, &ANALYSIS);
        assert!(snap.iter().all(|c| c.size_usd >= ANALYSIS.clusters.min_usd));
        assert!(snap.iter().any(|c| c.price == 64_800.0));
        assert!(!snap.iter().any(|c| c.price == 64_500.0 && c.size_usd < 2_000.0));
    }

    #[test]
    fn near_ordering_is_distance_then_size() {
        let clusters = [
            Cluster { price: 100.2, size_usd: 1.0e9 },
            Cluster { price: 99.8, size_usd: 2.0e9 }, // same distance, bigger
            Cluster { price: 100.1, size_usd: 1.0e9 },
            Cluster { price: 150.0, size_usd: 9.0e9 }, // far outside the band
        ];
        let near = clusters_near(100.0, &clusters, &ANALYSIS);
        assert_eq!(near.len(), 3);
        assert_eq!(near[0].price, 100.1);
        assert_eq!(near[1].price, 99.8, "size breaks the distance tie");
        assert_eq!(near[2].price, 100.2);
    }

    #[test]
    fn confluence_respects_the_proximity_band() {
        let clusters = [Cluster { price: 100.0, size_usd: 2.0e8 }];
        assert!(is_confluent(100.5, &clusters, &ANALYSIS));
        assert!(!is_confluent(101.0, &clusters, &ANALYSIS));
    }
}
