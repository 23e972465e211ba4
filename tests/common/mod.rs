#![allow(dead_code)]

use chrono::NaiveDate;
use regimetrader::domain::error::RegimetraderError;
pub use regimetrader::domain::ohlcv::OhlcvBar;
use regimetrader::domain::signal::{SignalPoint, SignalSeries};
use regimetrader::ports::data_port::DataPort;
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, ticker: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(ticker.to_string(), bars);
        self
    }

    pub fn with_error(mut self, ticker: &str, reason: &str) -> Self {
        self.errors.insert(ticker.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_ohlcv(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, RegimetraderError> {
        if let Some(reason) = self.errors.get(ticker) {
            return Err(RegimetraderError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(ticker)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter(|b| b.date >= start_date && b.date <= end_date)
            .collect())
    }

    fn data_range(
        &self,
        ticker: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, RegimetraderError> {
        if let Some(reason) = self.errors.get(ticker) {
            return Err(RegimetraderError::Data {
                reason: reason.clone(),
            });
        }
        match self.data.get(ticker) {
            Some(bars) if !bars.is_empty() => Ok(Some((
                bars.first().unwrap().date,
                bars.last().unwrap().date,
                bars.len(),
            ))),
            _ => Ok(None),
        }
    }
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub fn day(offset: usize) -> NaiveDate {
    date(2024, 1, 1) + chrono::Duration::days(offset as i64)
}

pub fn make_bar(ticker: &str, d: NaiveDate, close: f64) -> OhlcvBar {
    OhlcvBar {
        ticker: ticker.to_string(),
        date: d,
        open: close - 1.0,
        high: close + 1.0,
        low: close - 2.0,
        close,
        volume: 1000,
    }
}

pub fn bars_from_closes(ticker: &str, closes: &[f64]) -> Vec<OhlcvBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| make_bar(ticker, day(i), close))
        .collect()
}

/// A deterministic zig-zag walk with an upward drift, long enough for
/// rolling windows to warm up.
pub fn trending_closes(len: usize, start: f64) -> Vec<f64> {
    (0..len)
        .map(|i| {
            let wiggle = if i % 2 == 0 { 1.0 } else { -1.0 };
            start + i as f64 * 0.5 + wiggle
        })
        .collect()
}

pub fn series_from(prices: &[f64], signals: &[i32]) -> SignalSeries {
    SignalSeries {
        points: prices
            .iter()
            .zip(signals)
            .enumerate()
            .map(|(i, (&price, &signal))| SignalPoint {
                date: day(i),
                price,
                signal,
            })
            .collect(),
    }
}
