//! Signal series produced by strategies and consumed by the backtest engine.

use chrono::NaiveDate;

/// One timestamp of strategy output: the tradeable price and the desired
/// position intent (-1 short/exit, 0 flat, 1 long).
#[derive(Debug, Clone, PartialEq)]
pub struct SignalPoint {
    pub date: NaiveDate,
    pub price: f64,
    pub signal: i32,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SignalSeries {
    pub points: Vec<SignalPoint>,
}

impl SignalSeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// First difference of the signal column. Entry 0 is always 0: no trade
    /// is possible on the baseline bar.
    pub fn position_changes(&self) -> Vec<i32> {
        let mut changes = Vec::with_capacity(self.points.len());
        for (i, point) in self.points.iter().enumerate() {
            if i == 0 {
                changes.push(0);
            } else {
                changes.push(point.signal - self.points[i - 1].signal);
            }
        }
        changes
    }
}
