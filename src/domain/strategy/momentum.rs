//! Momentum strategy.
//!
//! Compares the n-period return against buy/sell thresholds: above the buy
//! threshold goes long, below the sell threshold signals short, else flat.

use crate::domain::error::RegimetraderError;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::signal::{SignalPoint, SignalSeries};

pub fn generate(
    bars: &[OhlcvBar],
    window: usize,
    buy_threshold: f64,
    sell_threshold: f64,
) -> Result<SignalSeries, RegimetraderError> {
    if window == 0 {
        return Err(RegimetraderError::InvalidParameter {
            name: "window".into(),
            reason: "must be positive".into(),
        });
    }
    if buy_threshold <= sell_threshold {
        return Err(RegimetraderError::InvalidParameter {
            name: "buy_threshold".into(),
            reason: "must be greater than sell_threshold".into(),
        });
    }
    if bars.len() < window + 1 {
        return Err(RegimetraderError::InsufficientData {
            ticker: bars.first().map(|b| b.ticker.clone()).unwrap_or_default(),
            have: bars.len(),
            need: window + 1,
        });
    }

    let points = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            let signal = if i >= window && bars[i - window].close != 0.0 {
                let momentum = bar.close / bars[i - window].close - 1.0;
                if momentum > buy_threshold {
                    1
                } else if momentum < sell_threshold {
                    -1
                } else {
                    0
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
