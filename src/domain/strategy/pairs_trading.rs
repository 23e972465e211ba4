//! Pairs trading strategy.
//!
//! Trades the z-score of the price spread between two date-aligned legs:
//! a rich spread (z above entry) shorts, a cheap spread (z below -entry)
//! goes long, and a z back inside the exit band flattens. An undefined z-score
//! holds the current position. The emitted `price` column is leg 1's close;
//! the backtest engine replays only the primary leg's P&L.

use crate::domain::error::RegimetraderError;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::rolling::{rolling_mean, rolling_sample_std};
use crate::domain::signal::{SignalPoint, SignalSeries};
use chrono::NaiveDate;

pub fn generate(
    primary: &[OhlcvBar],
    secondary: &[OhlcvBar],
    window: usize,
    entry_z: f64,
    exit_z: f64,
) -> Result<SignalSeries, RegimetraderError> {
    if window == 0 {
        return Err(RegimetraderError::InvalidParameter {
            name: "window".into(),
            reason: "must be positive".into(),
        });
    }
    if entry_z <= exit_z {
        return Err(RegimetraderError::InvalidParameter {
            name: "entry_z".into(),
            reason: "must be greater than exit_z".into(),
        });
    }

    let aligned = align_by_date(primary, secondary);
    if aligned.len() < 2 * window {
        return Err(RegimetraderError::InsufficientData {
            ticker: primary.first().map(|b| b.ticker.clone()).unwrap_or_default(),
            have: aligned.len(),
            need: 2 * window,
        });
    }

    let spread: Vec<f64> = aligned.iter().map(|(_, c1, c2)| c1 - c2).collect();
    let spread_mean = rolling_mean(&spread, window);
    let spread_std = rolling_sample_std(&spread, window);

    let mut position = 0i32;
    let mut points = Vec::with_capacity(aligned.len());

    for (i, (date, close1, _)) in aligned.iter().enumerate() {
        let zscore = match (spread_mean[i], spread_std[i]) {
            (Some(m), Some(s)) if s > 0.0 => Some((spread[i] - m) / s),
            _ => None,
        };

        if let Some(z) = zscore {
            if position == 0 {
                if z > entry_z {
                    position = -1;
                } else if z < -entry_z {
                    position = 1;
                }
            } else if z.abs() < exit_z
                || (position == 1 && z > entry_z)
                || (position == -1 && z < -entry_z)
            {
                position = 0;
            }
        }

        points.push(SignalPoint {
            date: *date,
            price: *close1,
            signal: position,
        });
    }

    Ok(SignalSeries { points })
}

/// Inner join of the two legs on date. Both inputs are date-ordered.
fn align_by_date(
    primary: &[OhlcvBar],
    secondary: &[OhlcvBar],
) -> Vec<(NaiveDate, f64, f64)> {
    let mut aligned = Vec::new();
    let mut j = 0usize;
    for bar in primary {
        while j < secondary.len() && secondary[j].date < bar.date {
            j += 1;
        }
        if j < secondary.len() && secondary[j].date == bar.date {
            aligned.push((bar.date, bar.close, secondary[j].close));
        }
    }
    aligned
}
