//! Rolling statistics shared by regime detection and signal generation.
//!
//! Windows are trailing and dense: the value at index `i` covers
//! `values[i + 1 - window ..= i]` and is `None` during warm-up. Standard
//! deviations are sample statistics (ddof = 1) throughout.

/// One-period simple returns. Output is one shorter than the input;
/// entry `i` is the return from `values[i]` to `values[i + 1]`.
pub fn pct_change(values: &[f64]) -> Vec<f64> {
    values
        .windows(2)
        .map(|w| if w[0] != 0.0 { w[1] / w[0] - 1.0 } else { 0.0 })
        .collect()
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (ddof = 1). Zero for fewer than two values.
pub fn sample_std(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / (n - 1) as f64;
    var.sqrt()
}

pub fn rolling_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    rolling(values, window, mean)
}

pub fn rolling_sample_std(values: &[f64], window: usize) -> Vec<Option<f64>> {
    rolling(values, window, sample_std)
}

fn rolling(values: &[f64], window: usize, stat: fn(&[f64]) -> f64) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(values.len());
    for i in 0..values.len() {
        if window == 0 || i + 1 < window {
            out.push(None);
        } else {
            out.push(Some(stat(&values[i + 1 - window..=i])));
        }
    }
    out
}

/// RSI on a 0 to 1 scale for use as a clustering feature.
///
/// Average gain and loss are plain rolling means of the one-period close
/// changes. Undefined values (warm-up) and windows whose loss average is
/// zero are neutral-filled at 0.5.
pub fn normalized_rsi(closes: &[f64], window: usize) -> Vec<f64> {
    let n = closes.len();
    if n < 2 || window == 0 {
        return vec![0.5; n];
    }

    let deltas: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();
    let gains: Vec<f64> = deltas.iter().map(|&d| if d > 0.0 { d } else { 0.0 }).collect();
    let losses: Vec<f64> = deltas.iter().map(|&d| if d < 0.0 { -d } else { 0.0 }).collect();

    let avg_gains = rolling_mean(&gains, window);
    let avg_losses = rolling_mean(&losses, window);

    let mut out = vec![0.5; n];
    for i in 1..n {
        // delta index i - 1 corresponds to bar index i
        if let (Some(g), Some(l)) = (avg_gains[i - 1], avg_losses[i - 1]) {
            if l > 0.0 {
                let rs = g / l;
                let rsi = 100.0 - 100.0 / (1.0 + rs);
                out[i] = rsi / 100.0;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn pct_change_basic() {
        let changes = pct_change(&[100.0, 110.0, 99.0]);
        assert_eq!(changes.len(), 2);
        assert_relative_eq!(changes[0], 0.10, epsilon = 1e-12);
        assert_relative_eq!(changes[1], -0.10, epsilon = 1e-12);
    }

    #[test]
    fn pct_change_short_input() {
        assert!(pct_change(&[100.0]).is_empty());
        assert!(pct_change(&[]).is_empty());
    }

    #[test]
    fn sample_std_known_value() {
        // sample variance of [2, 4, 4, 4, 5, 5, 7, 9] is 32/7
        let std = sample_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert_relative_eq!(std, (32.0_f64 / 7.0).sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn sample_std_degenerate() {
        assert_eq!(sample_std(&[]), 0.0);
        assert_eq!(sample_std(&[5.0]), 0.0);
        assert_eq!(sample_std(&[5.0, 5.0, 5.0]), 0.0);
    }

    #[test]
    fn rolling_mean_warmup() {
        let out = rolling_mean(&[1.0, 2.0, 3.0, 4.0], 3);
        assert_eq!(out[0], None);
        assert_eq!(out[1], None);
        assert_relative_eq!(out[2].unwrap(), 2.0, epsilon = 1e-12);
        assert_relative_eq!(out[3].unwrap(), 3.0, epsilon = 1e-12);
    }

    #[test]
    fn rolling_mean_zero_window() {
        let out = rolling_mean(&[1.0, 2.0], 0);
        assert_eq!(out, vec![None, None]);
    }

    #[test]
    fn rolling_std_matches_scalar() {
        let values = [1.0, 3.0, 2.0, 5.0, 4.0];
        let out = rolling_sample_std(&values, 3);
        assert_eq!(out[1], None);
        assert_relative_eq!(out[2].unwrap(), sample_std(&values[0..3]), epsilon = 1e-12);
        assert_relative_eq!(out[4].unwrap(), sample_std(&values[2..5]), epsilon = 1e-12);
    }

    #[test]
    fn rsi_warmup_is_neutral() {
        let closes: Vec<f64> = (0..10).map(|i| 100.0 + i as f64).collect();
        let rsi = normalized_rsi(&closes, 5);
        for v in &rsi[0..5] {
            assert_relative_eq!(*v, 0.5, epsilon = 1e-12);
        }
    }

    #[test]
    fn rsi_all_gains_neutral_filled() {
        // strictly rising closes have a zero loss average, so the ratio is
        // undefined and every point stays at 0.5
        let closes: Vec<f64> = (0..10).map(|i| 100.0 + i as f64).collect();
        let rsi = normalized_rsi(&closes, 5);
        for v in &rsi {
            assert_relative_eq!(*v, 0.5, epsilon = 1e-12);
        }
    }

    #[test]
    fn rsi_all_losses_is_zero() {
        let closes: Vec<f64> = (0..10).map(|i| 100.0 - i as f64).collect();
        let rsi = normalized_rsi(&closes, 5);
        assert_relative_eq!(rsi[9], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn rsi_balanced_moves() {
        // alternating +1/-1 closes give equal gain and loss averages, so RSI is 50
        let closes = [100.0, 101.0, 100.0, 101.0, 100.0, 101.0, 100.0];
        let rsi = normalized_rsi(&closes, 4);
        assert_relative_eq!(rsi[6], 0.5, epsilon = 1e-12);
    }

    #[test]
    fn rsi_stays_in_unit_range() {
        let closes = [44.0, 44.25, 44.5, 43.75, 44.5, 44.25, 44.75, 45.25, 45.5, 45.25];
        for v in normalized_rsi(&closes, 4) {
            assert!((0.0..=1.0).contains(&v));
        }
    }
}
