//! Moving-average crossover strategy.
//!
//! Long (signal 1) while the short SMA sits above the long SMA, flat
//! otherwise. Signals start one bar after the long warm-up completes.

use crate::domain::error::RegimetraderError;
use crate::domain::ohlcv::{closes, OhlcvBar};
use crate::domain::rolling::rolling_mean;
use crate::domain::signal::{SignalPoint, SignalSeries};

pub fn generate(
    bars: &[OhlcvBar],
    short_window: usize,
    long_window: usize,
) -> Result<SignalSeries, RegimetraderError> {
    if short_window == 0 {
        return Err(RegimetraderError::InvalidParameter {
            name: "short_window".into(),
            reason: "must be positive".into(),
        });
    }
    if short_window >= long_window {
        return Err(RegimetraderError::InvalidParameter {
            name: "short_window".into(),
            reason: "must be less than long_window".into(),
        });
    }
    if bars.len() < long_window {
        return Err(RegimetraderError::InsufficientData {
            ticker: bars.first().map(|b| b.ticker.clone()).unwrap_or_default(),
            have: bars.len(),
            need: long_window,
        });
    }

    let close_prices = closes(bars);
    let short_ma = rolling_mean(&close_prices, short_window);
    let long_ma = rolling_mean(&close_prices, long_window);

    let points = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            let signal = match (short_ma[i], long_ma[i]) {
                (Some(short), Some(long)) if i >= long_window && short > long => 1,
                _ => 0,
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
