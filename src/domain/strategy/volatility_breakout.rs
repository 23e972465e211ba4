//! Volatility breakout strategy.
//!
//! Long (signal 1) when rolling return volatility exceeds its own rolling
//! mean scaled by a multiplier; flat otherwise. The threshold needs a second
//! warm-up window on top of the volatility warm-up.

use crate::domain::error::RegimetraderError;
use crate::domain::ohlcv::{closes, OhlcvBar};
use crate::domain::rolling::{mean, pct_change, rolling_sample_std};
use crate::domain::signal::{SignalPoint, SignalSeries};

pub fn generate(
    bars: &[OhlcvBar],
    window: usize,
    multiplier: f64,
) -> Result<SignalSeries, RegimetraderError> {
    if window == 0 {
        return Err(RegimetraderError::InvalidParameter {
            name: "window".into(),
            reason: "must be positive".into(),
        });
    }
    if multiplier <= 0.0 {
        return Err(RegimetraderError::InvalidParameter {
            name: "multiplier".into(),
            reason: "must be positive".into(),
        });
    }
    if bars.len() < 2 * window {
        return Err(RegimetraderError::InsufficientData {
            ticker: bars.first().map(|b| b.ticker.clone()).unwrap_or_default(),
            have: bars.len(),
            need: 2 * window,
        });
    }

    let returns = pct_change(&closes(bars));
    let vol_by_return = rolling_sample_std(&returns, window);

    // volatility at bar i covers the window of returns ending at bar i
    let volatility: Vec<Option<f64>> = (0..bars.len())
        .map(|i| if i > 0 { vol_by_return[i - 1] } else { None })
        .collect();

    let points = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            let signal = if i + 1 >= 2 * window {
                let trailing: Vec<f64> = volatility[i + 1 - window..=i]
                    .iter()
                    .filter_map(|v| *v)
                    .collect();
                let threshold = mean(&trailing) * multiplier;
                match volatility[i] {
                    Some(v) if v > threshold => 1,
                    _ => 0,
                }
            } else {
                0
            };
            SignalPoint {
                date: bar.date,
                price: bar.close,
                signal,
            }
        })
        .collect();

    Ok(SignalSeries { points })
}

#[cfg(test)]
mod tests {
    use super::*;
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
    fn rejects_bad_parameters() {
        let bars = make_bars(&[100.0; 40]);
        assert!(generate(&bars, 0, 2.0).is_err());
        assert!(generate(&bars, 10, 0.0).is_err());
        assert!(generate(&bars, 10, -1.0).is_err());
    }

    #[test]
    fn rejects_too_few_bars() {
        let bars = make_bars(&[100.0; 15]);
        assert!(matches!(
            generate(&bars, 10, 2.0),
            Err(RegimetraderError::InsufficientData { .. })
        ));
    }

    #[test]
    fn calm_market_stays_flat() {
        let series = generate(&make_bars(&[100.0; 40]), 5, 2.0).unwrap();
        assert!(series.points.iter().all(|p| p.signal == 0));
    }

    #[test]
    fn spike_triggers_breakout() {
        // calm for 25 bars, then large alternating moves
        let mut prices = vec![100.0; 25];
        for i in 0..8 {
            prices.push(if i % 2 == 0 { 120.0 } else { 85.0 });
        }
        let series = generate(&make_bars(&prices), 5, 2.0).unwrap();

        for point in &series.points[0..25] {
            assert_eq!(point.signal, 0);
        }
        assert!(
            series.points[25..].iter().any(|p| p.signal == 1),
            "volatility spike should produce at least one breakout signal"
        );
    }

    #[test]
    fn warmup_is_flat_even_when_volatile() {
        let prices: Vec<f64> = (0..30)
            .map(|i| if i % 2 == 0 { 100.0 } else { 110.0 })
            .collect();
        let series = generate(&make_bars(&prices), 5, 2.0).unwrap();
        for point in &series.points[0..9] {
            assert_eq!(point.signal, 0);
        }
    }
}
