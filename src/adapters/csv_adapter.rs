//! CSV file data adapter.
//!
//! One file per ticker, `<base>/<TICKER>.csv`, with a
//! `date,open,high,low,close,volume` header. Rows must be date-ascending
//! with positive closes; bad data is rejected rather than repaired.

use crate::domain::error::RegimetraderError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use csv::StringRecord;
use std::path::PathBuf;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, ticker: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", ticker))
    }

    fn read_all(&self, ticker: &str) -> Result<Vec<OhlcvBar>, RegimetraderError> {
        let path = self.csv_path(ticker);
        let mut rdr =
            csv::Reader::from_path(&path).map_err(|e| RegimetraderError::Data {
                reason: format!("failed to open {}: {}", path.display(), e),
            })?;

        let mut bars = Vec::new();
        for (line, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| RegimetraderError::Data {
                reason: format!("{}: CSV parse error: {}", path.display(), e),
            })?;
            bars.push(parse_bar(ticker, &record, line + 2)?);
        }

        validate_bars(ticker, &bars)?;
        Ok(bars)
    }
}

fn field<'a>(
    record: &'a StringRecord,
    index: usize,
    name: &str,
    line: usize,
) -> Result<&'a str, RegimetraderError> {
    record.get(index).ok_or_else(|| RegimetraderError::Data {
        reason: format!("line {}: missing {} column", line, name),
    })
}

fn parse_number(value: &str, name: &str, line: usize) -> Result<f64, RegimetraderError> {
    value.trim().parse().map_err(|_| RegimetraderError::Data {
        reason: format!("line {}: invalid {} value '{}'", line, name, value),
    })
}

fn parse_bar(
    ticker: &str,
    record: &StringRecord,
    line: usize,
) -> Result<OhlcvBar, RegimetraderError> {
    let date_str = field(record, 0, "date", line)?;
    let date = NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d").map_err(|_| {
        RegimetraderError::Data {
            reason: format!("line {}: invalid date '{}'", line, date_str),
        }
    })?;

    Ok(OhlcvBar {
        ticker: ticker.to_string(),
        date,
        open: parse_number(field(record, 1, "open", line)?, "open", line)?,
        high: parse_number(field(record, 2, "high", line)?, "high", line)?,
        low: parse_number(field(record, 3, "low", line)?, "low", line)?,
        close: parse_number(field(record, 4, "close", line)?, "close", line)?,
        volume: field(record, 5, "volume", line)?
            .trim()
            .parse()
            .map_err(|_| RegimetraderError::Data {
                reason: format!("line {}: invalid volume value", line),
            })?,
    })
}

fn validate_bars(ticker: &str, bars: &[OhlcvBar]) -> Result<(), RegimetraderError> {
    for pair in bars.windows(2) {
        if pair[1].date <= pair[0].date {
            return Err(RegimetraderError::Data {
                reason: format!(
                    "{}: dates must be strictly ascending, {} follows {}",
                    ticker, pair[1].date, pair[0].date
                ),
            });
        }
    }
    for bar in bars {
        if bar.close <= 0.0 {
            return Err(RegimetraderError::Data {
                reason: format!("{}: non-positive close {} on {}", ticker, bar.close, bar.date),
            });
        }
        if bar.volume < 0 {
            return Err(RegimetraderError::Data {
                reason: format!("{}: negative volume on {}", ticker, bar.date),
            });
        }
    }
    Ok(())
}

impl DataPort for CsvAdapter {
    fn fetch_ohlcv(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, RegimetraderError> {
        let bars = self.read_all(ticker)?;
        Ok(bars
            .into_iter()
            .filter(|b| b.date >= start_date && b.date <= end_date)
            .collect())
    }

    fn data_range(
        &self,
        ticker: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, RegimetraderError> {
        let bars = self.read_all(ticker)?;
        match (bars.first(), bars.last()) {
            (Some(first), Some(last)) => Ok(Some((first.date, last.date, bars.len()))),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const GOOD_CSV: &str = "date,open,high,low,close,volume\n\
        2024-01-15,100.0,110.0,90.0,105.0,50000\n\
        2024-01-16,105.0,115.0,100.0,110.0,60000\n\
        2024-01-17,110.0,120.0,105.0,115.0,55000\n";

    fn setup(files: &[(&str, &str)]) -> (TempDir, CsvAdapter) {
        let dir = TempDir::new().unwrap();
        for (name, content) in files {
            fs::write(dir.path().join(name), content).unwrap();
        }
        let adapter = CsvAdapter::new(dir.path().to_path_buf());
        (dir, adapter)
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn fetch_ohlcv_parses_all_columns() {
        let (_dir, adapter) = setup(&[("SPY.csv", GOOD_CSV)]);
        let bars = adapter.fetch_ohlcv("SPY", day(1), day(31)).unwrap();

        assert_eq!(bars.len(), 3);
        assert_eq!(bars[0].ticker, "SPY");
        assert_eq!(bars[0].date, day(15));
        assert_eq!(bars[0].open, 100.0);
        assert_eq!(bars[0].low, 90.0);
        assert_eq!(bars[2].close, 115.0);
        assert_eq!(bars[2].volume, 55_000);
    }

    #[test]
    fn fetch_ohlcv_filters_by_date_range() {
        let (_dir, adapter) = setup(&[("SPY.csv", GOOD_CSV)]);
        let bars = adapter.fetch_ohlcv("SPY", day(16), day(16)).unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].date, day(16));
    }

    #[test]
    fn missing_file_is_a_data_error() {
        let (_dir, adapter) = setup(&[]);
        assert!(matches!(
            adapter.fetch_ohlcv("XYZ", day(1), day(31)),
            Err(RegimetraderError::Data { .. })
        ));
    }

    #[test]
    fn out_of_order_dates_are_rejected() {
        let csv = "date,open,high,low,close,volume\n\
            2024-01-16,1,1,1,1,1\n\
            2024-01-15,1,1,1,1,1\n";
        let (_dir, adapter) = setup(&[("BAD.csv", csv)]);
        assert!(matches!(
            adapter.fetch_ohlcv("BAD", day(1), day(31)),
            Err(RegimetraderError::Data { .. })
        ));
    }

    #[test]
    fn non_positive_close_is_rejected() {
        let csv = "date,open,high,low,close,volume\n2024-01-15,1,1,1,0.0,1\n";
        let (_dir, adapter) = setup(&[("BAD.csv", csv)]);
        assert!(adapter.fetch_ohlcv("BAD", day(1), day(31)).is_err());
    }

    #[test]
    fn malformed_numeric_field_names_the_line() {
        let csv = "date,open,high,low,close,volume\n2024-01-15,abc,1,1,1,1\n";
        let (_dir, adapter) = setup(&[("BAD.csv", csv)]);
        let err = adapter.fetch_ohlcv("BAD", day(1), day(31)).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn data_range_reports_span_and_count() {
        let (_dir, adapter) = setup(&[("SPY.csv", GOOD_CSV)]);
        let range = adapter.data_range("SPY").unwrap();
        assert_eq!(range, Some((day(15), day(17), 3)));
    }

    #[test]
    fn data_range_of_empty_file_is_none() {
        let (_dir, adapter) = setup(&[("EMPTY.csv", "date,open,high,low,close,volume\n")]);
        assert_eq!(adapter.data_range("EMPTY").unwrap(), None);
    }
}
