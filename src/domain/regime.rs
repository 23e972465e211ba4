//! Market regime labels and the statistical detection method.
//!
//! Statistical classification at bar `t` (for `t >= window`):
//! a rolling mean of returns above 0.5x the rolling std labels Bull,
//! below -0.5x labels Bear, otherwise Sideways.
//! Bars inside the warm-up window are Neutral.

use std::collections::HashMap;
use std::fmt;

use crate::domain::error::RegimetraderError;
use crate::domain::ohlcv::{closes, OhlcvBar};
use crate::domain::rolling::{mean, pct_change, sample_std};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Regime {
    Bull,
    Bear,
    Sideways,
    Neutral,
}

impl Regime {
    pub const ALL: [Regime; 4] = [Regime::Bull, Regime::Bear, Regime::Sideways, Regime::Neutral];

    pub fn as_str(&self) -> &'static str {
        match self {
            Regime::Bull => "Bull",
            Regime::Bear => "Bear",
            Regime::Sideways => "Sideways",
            Regime::Neutral => "Neutral",
        }
    }
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which detection method to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegimeMethod {
    Statistical,
    KMeans,
}

impl RegimeMethod {
    pub fn from_name(name: &str) -> Option<RegimeMethod> {
        match name.to_lowercase().as_str() {
            "statistical" => Some(RegimeMethod::Statistical),
            "kmeans" | "k-means" => Some(RegimeMethod::KMeans),
            _ => None,
        }
    }
}

/// Label each bar from rolling return statistics. One label per bar.
pub fn detect_statistical(
    bars: &[OhlcvBar],
    window: usize,
) -> Result<Vec<Regime>, RegimetraderError> {
    if window == 0 {
        return Err(RegimetraderError::InvalidParameter {
            name: "window".into(),
            reason: "must be positive".into(),
        });
    }

    let returns = pct_change(&closes(bars));
    let mut regimes = Vec::with_capacity(bars.len());

    for i in 0..bars.len() {
        if i < window {
            regimes.push(Regime::Neutral);
        } else {
            // returns[j] is the return into bar j + 1, so the trailing
            // window of returns ending at bar i is returns[i-window..i]
            let slice = &returns[i - window..i];
            let m = mean(slice);
            let s = sample_std(slice);
            if m > 0.5 * s {
                regimes.push(Regime::Bull);
            } else if m < -0.5 * s {
                regimes.push(Regime::Bear);
            } else {
                regimes.push(Regime::Sideways);
            }
        }
    }

    Ok(regimes)
}

/// How often the labeling switches regime, and for how long each regime runs.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionSummary {
    /// Number of regime runs (the first bar starts the first run).
    pub total_transitions: usize,
    pub average_durations: HashMap<Regime, f64>,
    pub regime_counts: HashMap<Regime, usize>,
}

pub fn analyze_transitions(regimes: &[Regime]) -> TransitionSummary {
    let mut durations: HashMap<Regime, Vec<usize>> = HashMap::new();
    let mut counts: HashMap<Regime, usize> = HashMap::new();
    let mut transitions = 0usize;

    let mut current: Option<Regime> = None;
    let mut run_len = 0usize;

    for &regime in regimes {
        *counts.entry(regime).or_insert(0) += 1;
        if Some(regime) != current {
            if let Some(prev) = current {
                durations.entry(prev).or_default().push(run_len);
            }
            current = Some(regime);
            run_len = 1;
            transitions += 1;
        } else {
            run_len += 1;
        }
    }
    if let Some(prev) = current {
        durations.entry(prev).or_default().push(run_len);
    }

    let average_durations = durations
        .into_iter()
        .map(|(regime, runs)| {
            let avg = runs.iter().sum::<usize>() as f64 / runs.len() as f64;
            (regime, avg)
        })
        .collect();

    TransitionSummary {
        total_transitions: transitions,
        average_durations,
        regime_counts: counts,
    }
}

/// Return distribution statistics for bars labeled with one regime.
#[derive(Debug, Clone, PartialEq)]
pub struct RegimeReturnStats {
    pub mean_return: f64,
    pub std_return: f64,
    pub sharpe_ratio: f64,
    pub skewness: f64,
    pub kurtosis: f64,
    pub num_periods: usize,
}

impl RegimeReturnStats {
    fn empty() -> Self {
        RegimeReturnStats {
            mean_return: 0.0,
            std_return: 0.0,
            sharpe_ratio: 0.0,
            skewness: 0.0,
            kurtosis: 0.0,
            num_periods: 0,
        }
    }
}

/// Per-regime distribution of price returns. `returns[i]` is the return into
/// bar `i` (`None` at the first bar) and must align with `regimes`.
pub fn regime_return_stats(
    regimes: &[Regime],
    returns: &[Option<f64>],
) -> HashMap<Regime, RegimeReturnStats> {
    let mut stats = HashMap::new();

    for regime in Regime::ALL {
        let slice: Vec<f64> = regimes
            .iter()
            .zip(returns)
            .filter(|(r, _)| **r == regime)
            .filter_map(|(_, ret)| *ret)
            .collect();

        if slice.is_empty() {
            stats.insert(regime, RegimeReturnStats::empty());
            continue;
        }

        let m = mean(&slice);
        let s = sample_std(&slice);
        stats.insert(
            regime,
            RegimeReturnStats {
                mean_return: m,
                std_return: s,
                sharpe_ratio: if s != 0.0 { m / s } else { 0.0 },
                skewness: sample_skewness(&slice),
                kurtosis: sample_excess_kurtosis(&slice),
                num_periods: slice.len(),
            },
        );
    }

    stats
}

/// Bias-adjusted sample skewness. Zero for fewer than three values or a
/// constant series.
fn sample_skewness(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 3 {
        return 0.0;
    }
    let s = sample_std(values);
    if s == 0.0 {
        return 0.0;
    }
    let m = mean(values);
    let nf = n as f64;
    let sum_cubed: f64 = values.iter().map(|v| ((v - m) / s).powi(3)).sum();
    nf / ((nf - 1.0) * (nf - 2.0)) * sum_cubed
}

/// Bias-adjusted sample excess kurtosis (Fisher). Zero for fewer than four
/// values or a constant series.
fn sample_excess_kurtosis(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 4 {
        return 0.0;
    }
    let s = sample_std(values);
    if s == 0.0 {
        return 0.0;
    }
    let m = mean(values);
    let nf = n as f64;
    let sum_quartic: f64 = values.iter().map(|v| ((v - m) / s).powi(4)).sum();
    nf * (nf + 1.0) / ((nf - 1.0) * (nf - 2.0) * (nf - 3.0)) * sum_quartic
        - 3.0 * (nf - 1.0) * (nf - 1.0) / ((nf - 2.0) * (nf - 3.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn make_bars(prices: &[f64]) -> Vec<OhlcvBar> {
        prices
            .iter()
            .enumerate()
            .map(|(i, &close)| OhlcvBar {
                ticker: "TEST".into(),
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
                    + chrono::Duration::days(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1000,
            })
            .collect()
    }

    #[test]
    fn statistical_zero_window_rejected() {
        let bars = make_bars(&[100.0, 101.0]);
        assert!(detect_statistical(&bars, 0).is_err());
    }

    #[test]
    fn statistical_warmup_is_neutral() {
        let prices: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let regimes = detect_statistical(&make_bars(&prices), 10).unwrap();
        for r in &regimes[0..10] {
            assert_eq!(*r, Regime::Neutral);
        }
        for r in &regimes[10..] {
            assert_ne!(*r, Regime::Neutral);
        }
    }

    #[test]
    fn statistical_short_series_all_neutral() {
        let regimes = detect_statistical(&make_bars(&[100.0, 101.0, 102.0]), 10).unwrap();
        assert!(regimes.iter().all(|r| *r == Regime::Neutral));
    }

    #[test]
    fn statistical_uptrend_is_bull() {
        // steady positive returns with mild noise keep the rolling mean above
        // half a standard deviation
        let mut prices = vec![100.0];
        for i in 1..40 {
            let bump = if i % 2 == 0 { 1.02 } else { 1.01 };
            prices.push(prices[i - 1] * bump);
        }
        let regimes = detect_statistical(&make_bars(&prices), 10).unwrap();
        assert_eq!(regimes[39], Regime::Bull);
    }

    #[test]
    fn statistical_downtrend_is_bear() {
        let mut prices = vec![100.0];
        for i in 1..40 {
            let drop = if i % 2 == 0 { 0.98 } else { 0.99 };
            prices.push(prices[i - 1] * drop);
        }
        let regimes = detect_statistical(&make_bars(&prices), 10).unwrap();
        assert_eq!(regimes[39], Regime::Bear);
    }

    #[test]
    fn statistical_constant_series_is_sideways() {
        // zero mean, zero variance: neither threshold is reachable
        let regimes = detect_statistical(&make_bars(&[100.0; 30]), 10).unwrap();
        for r in &regimes[10..] {
            assert_eq!(*r, Regime::Sideways);
        }
    }

    #[test]
    fn statistical_constant_growth_is_bull_past_warmup() {
        // constant positive return has zero variance, so mean > 0.5 * 0
        let prices: Vec<f64> = (0..30).map(|i| 100.0 * 1.01_f64.powi(i)).collect();
        let regimes = detect_statistical(&make_bars(&prices), 10).unwrap();
        for r in &regimes[10..] {
            assert_eq!(*r, Regime::Bull);
        }
    }

    #[test]
    fn transitions_counts_runs() {
        use Regime::*;
        let regimes = [Bull, Bull, Bear, Bear, Bear, Bull];
        let summary = analyze_transitions(&regimes);
        assert_eq!(summary.total_transitions, 3);
        assert_eq!(summary.regime_counts[&Bull], 3);
        assert_eq!(summary.regime_counts[&Bear], 3);
        // Bull runs: [2, 1] average 1.5, Bear runs: [3]
        assert_relative_eq!(summary.average_durations[&Bull], 1.5, epsilon = 1e-12);
        assert_relative_eq!(summary.average_durations[&Bear], 3.0, epsilon = 1e-12);
    }

    #[test]
    fn transitions_empty_input() {
        let summary = analyze_transitions(&[]);
        assert_eq!(summary.total_transitions, 0);
        assert!(summary.regime_counts.is_empty());
    }

    #[test]
    fn return_stats_partitions_by_regime() {
        use Regime::*;
        let regimes = [Neutral, Bull, Bull, Bear, Bull];
        let returns = [None, Some(0.01), Some(0.03), Some(-0.02), Some(0.02)];
        let stats = regime_return_stats(&regimes, &returns);

        assert_eq!(stats[&Bull].num_periods, 3);
        assert_relative_eq!(stats[&Bull].mean_return, 0.02, epsilon = 1e-12);
        assert_eq!(stats[&Bear].num_periods, 1);
        assert_eq!(stats[&Bear].sharpe_ratio, 0.0);
        assert_eq!(stats[&Sideways].num_periods, 0);
        assert_eq!(stats[&Neutral].num_periods, 0);
    }

    #[test]
    fn skewness_symmetric_is_zero() {
        assert_relative_eq!(
            sample_skewness(&[1.0, 2.0, 3.0, 4.0, 5.0]),
            0.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn skewness_small_sample_is_zero() {
        assert_eq!(sample_skewness(&[1.0, 2.0]), 0.0);
    }

    #[test]
    fn kurtosis_known_value() {
        // matches the bias-adjusted Fisher definition for a 1..5 ramp
        let k = sample_excess_kurtosis(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_relative_eq!(k, -1.2, epsilon = 1e-12);
    }

    #[test]
    fn kurtosis_small_sample_is_zero() {
        assert_eq!(sample_excess_kurtosis(&[1.0, 2.0, 3.0]), 0.0);
    }

    #[test]
    fn method_parsing() {
        assert_eq!(
            RegimeMethod::from_name("Statistical"),
            Some(RegimeMethod::Statistical)
        );
        assert_eq!(RegimeMethod::from_name("kmeans"), Some(RegimeMethod::KMeans));
        assert_eq!(RegimeMethod::from_name("k-means"), Some(RegimeMethod::KMeans));
        assert_eq!(RegimeMethod::from_name("hmm"), None);
    }
}
