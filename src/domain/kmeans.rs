//! K-means regime detection.
//!
//! Clusters each bar over four features: 1-period return, rolling return
//! volatility, normalized RSI, and volume ratio. Runs Lloyd's algorithm
//! with k-means++ seeding from a fixed RNG seed, keeping the lowest-inertia
//! labeling across restarts, then maps clusters to regimes by ascending
//! mean return: lowest maps to Bear, middle to Sideways, highest to Bull.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cmp::Ordering;

use crate::domain::error::RegimetraderError;
use crate::domain::ohlcv::{closes, volumes, OhlcvBar};
use crate::domain::regime::Regime;
use crate::domain::rolling::{normalized_rsi, pct_change, rolling_mean, rolling_sample_std};

pub const KMEANS_SEED: u64 = 42;

const NUM_CLUSTERS: usize = 3;
const NUM_FEATURES: usize = 4;
const RESTARTS: usize = 10;
const MAX_ITERATIONS: usize = 300;

type FeatureRow = [f64; NUM_FEATURES];

pub fn detect_kmeans(bars: &[OhlcvBar], window: usize) -> Result<Vec<Regime>, RegimetraderError> {
    if window == 0 {
        return Err(RegimetraderError::InvalidParameter {
            name: "window".into(),
            reason: "must be positive".into(),
        });
    }
    let need = window.max(NUM_CLUSTERS);
    if bars.len() < need {
        return Err(RegimetraderError::InsufficientData {
            ticker: bars.first().map(|b| b.ticker.clone()).unwrap_or_default(),
            have: bars.len(),
            need,
        });
    }

    let features = build_features(bars, window);

    let mut rng = StdRng::seed_from_u64(KMEANS_SEED);
    let mut best_assignments: Option<Vec<usize>> = None;
    let mut best_inertia = f64::INFINITY;

    for _ in 0..RESTARTS {
        let (assignments, inertia) = lloyd(&features, &mut rng);
        if inertia < best_inertia {
            best_inertia = inertia;
            best_assignments = Some(assignments);
        }
    }

    // RESTARTS > 0, so an assignment always exists
    let assignments = best_assignments.unwrap_or_default();
    let returns: Vec<f64> = features.iter().map(|f| f[0]).collect();
    Ok(map_clusters_to_regimes(&assignments, &returns))
}

/// Per-bar feature rows. Warm-up values take neutral fills: return 0,
/// volatility 0, RSI 0.5, volume ratio 1.
fn build_features(bars: &[OhlcvBar], window: usize) -> Vec<FeatureRow> {
    let n = bars.len();
    let close_prices = closes(bars);
    let volume_series = volumes(bars);

    let returns = pct_change(&close_prices);
    let vol = rolling_sample_std(&returns, window);
    let rsi = normalized_rsi(&close_prices, window);
    let vol_mean = rolling_mean(&volume_series, window);

    let mut rows = Vec::with_capacity(n);
    for i in 0..n {
        let ret = if i > 0 { returns[i - 1] } else { 0.0 };
        let volatility = if i > 0 { vol[i - 1].unwrap_or(0.0) } else { 0.0 };
        let volume_ratio = match vol_mean[i] {
            Some(m) if m > 0.0 => volume_series[i] / m,
            _ => 1.0,
        };
        rows.push([ret, volatility, rsi[i], volume_ratio]);
    }
    rows
}

/// One k-means run: k-means++ seeding then Lloyd iterations until the
/// assignment is stable or the iteration cap is hit. The best labeling so
/// far is returned either way.
fn lloyd(points: &[FeatureRow], rng: &mut StdRng) -> (Vec<usize>, f64) {
    let mut centroids = init_plus_plus(points, rng);
    let mut assignments = assign(points, &centroids);

    for _ in 0..MAX_ITERATIONS {
        update_centroids(points, &assignments, &mut centroids);
        let next = assign(points, &centroids);
        if next == assignments {
            break;
        }
        assignments = next;
    }

    let inertia = assignments
        .iter()
        .enumerate()
        .map(|(i, &c)| squared_distance(&points[i], &centroids[c]))
        .sum();
    (assignments, inertia)
}

fn init_plus_plus(points: &[FeatureRow], rng: &mut StdRng) -> Vec<FeatureRow> {
    let mut centroids = Vec::with_capacity(NUM_CLUSTERS);
    centroids.push(points[rng.gen_range(0..points.len())]);

    while centroids.len() < NUM_CLUSTERS {
        let weights: Vec<f64> = points
            .iter()
            .map(|p| {
                centroids
                    .iter()
                    .map(|c| squared_distance(p, c))
                    .fold(f64::INFINITY, f64::min)
            })
            .collect();
        let total: f64 = weights.iter().sum();

        let next = if total > 0.0 {
            let mut target = rng.gen::<f64>() * total;
            let mut chosen = points.len() - 1;
            for (i, w) in weights.iter().enumerate() {
                target -= w;
                if target <= 0.0 {
                    chosen = i;
                    break;
                }
            }
            points[chosen]
        } else {
            // all points coincide with an existing centroid
            points[rng.gen_range(0..points.len())]
        };
        centroids.push(next);
    }

    centroids
}

fn assign(points: &[FeatureRow], centroids: &[FeatureRow]) -> Vec<usize> {
    points
        .iter()
        .map(|p| {
            let mut best = 0usize;
            let mut best_dist = f64::INFINITY;
            for (c, centroid) in centroids.iter().enumerate() {
                let d = squared_distance(p, centroid);
                if d < best_dist {
                    best_dist = d;
                    best = c;
                }
            }
            best
        })
        .collect()
}

fn update_centroids(points: &[FeatureRow], assignments: &[usize], centroids: &mut [FeatureRow]) {
    let mut sums = vec![[0.0; NUM_FEATURES]; centroids.len()];
    let mut counts = vec![0usize; centroids.len()];

    for (point, &cluster) in points.iter().zip(assignments) {
        counts[cluster] += 1;
        for d in 0..NUM_FEATURES {
            sums[cluster][d] += point[d];
        }
    }

    for c in 0..centroids.len() {
        if counts[c] == 0 {
            // reseed an empty cluster with the point farthest from its centroid
            let mut farthest = 0usize;
            let mut farthest_dist = -1.0f64;
            for (i, point) in points.iter().enumerate() {
                let d = squared_distance(point, &centroids[assignments[i]]);
                if d > farthest_dist {
                    farthest_dist = d;
                    farthest = i;
                }
            }
            centroids[c] = points[farthest];
            continue;
        }
        for d in 0..NUM_FEATURES {
            centroids[c][d] = sums[c][d] / counts[c] as f64;
        }
    }
}

fn squared_distance(a: &FeatureRow, b: &FeatureRow) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Rank clusters by mean member return. Equal means fall back to the lower
/// cluster index taking the lower rank.
fn map_clusters_to_regimes(assignments: &[usize], returns: &[f64]) -> Vec<Regime> {
    let mut sums = [0.0f64; NUM_CLUSTERS];
    let mut counts = [0usize; NUM_CLUSTERS];
    for (&cluster, &ret) in assignments.iter().zip(returns) {
        sums[cluster] += ret;
        counts[cluster] += 1;
    }

    let means: Vec<f64> = (0..NUM_CLUSTERS)
        .map(|c| if counts[c] > 0 { sums[c] / counts[c] as f64 } else { 0.0 })
        .collect();

    let mut order: Vec<usize> = (0..NUM_CLUSTERS).collect();
    order.sort_by(|&a, &b| {
        means[a]
            .partial_cmp(&means[b])
            .unwrap_or(Ordering::Equal)
            .then(a.cmp(&b))
    });

    let mut labels = [Regime::Sideways; NUM_CLUSTERS];
    labels[order[0]] = Regime::Bear;
    labels[order[1]] = Regime::Sideways;
    labels[order[2]] = Regime::Bull;

    assignments.iter().map(|&c| labels[c]).collect()
}
