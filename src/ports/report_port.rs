//! Report generation port trait.

use crate::domain::backtest::{BacktestResult, TradeStats};
use crate::domain::error::RegimetraderError;
use crate::domain::metrics::MetricsReport;
use chrono::NaiveDate;

/// Run-level header data for a report.
pub struct ReportContext<'a> {
    pub strategy_name: &'a str,
    pub tickers: &'a [String],
    pub regime_method: &'a str,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Port for writing backtest reports.
pub trait ReportPort {
    fn write(
        &self,
        result: &BacktestResult,
        metrics: &MetricsReport,
        stats: &TradeStats,
        context: &ReportContext<'_>,
        output_path: &str,
    ) -> Result<(), RegimetraderError>;
}
