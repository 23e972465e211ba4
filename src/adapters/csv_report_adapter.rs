//! CSV report adapter implementing ReportPort.
//!
//! Writes one flat CSV with labelled sections: run header, aggregate
//! metrics, per-regime breakdown, trade statistics, trade history and the
//! tail of the daily ledger.

use crate::domain::backtest::{BacktestResult, TradeStats};
use crate::domain::error::RegimetraderError;
use crate::domain::metrics::MetricsReport;
use crate::domain::regime::Regime;
use crate::ports::report_port::{ReportContext, ReportPort};
use std::path::Path;

/// Ledger rows included at the bottom of the report.
const LEDGER_TAIL_ROWS: usize = 100;

pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CsvReportAdapter {
    fn default() -> Self {
        Self::new()
    }
}

fn ratio(value: f64) -> String {
    if value.is_infinite() {
        "inf".to_string()
    } else {
        format!("{:.4}", value)
    }
}

fn pct(value: f64) -> String {
    format!("{:.2}", value)
}

impl ReportPort for CsvReportAdapter {
    fn write(
        &self,
        result: &BacktestResult,
        metrics: &MetricsReport,
        stats: &TradeStats,
        context: &ReportContext<'_>,
        output_path: &str,
    ) -> Result<(), RegimetraderError> {
        let mut wtr = csv::WriterBuilder::new()
            .flexible(true)
            .from_path(Path::new(output_path))
            .map_err(|e| RegimetraderError::Data {
                reason: format!("failed to create report {}: {}", output_path, e),
            })?;
        let mut row = |fields: &[&str]| -> Result<(), RegimetraderError> {
            wtr.write_record(fields).map_err(|e| RegimetraderError::Data {
                reason: format!("report write error: {}", e),
            })
        };

        row(&["BACKTEST REPORT"])?;
        row(&["strategy", context.strategy_name])?;
        row(&["tickers", &context.tickers.join(",")])?;
        row(&["regime_method", context.regime_method])?;
        row(&["start_date", &context.start_date.to_string()])?;
        row(&["end_date", &context.end_date.to_string()])?;
        row(&[])?;

        let agg = &metrics.aggregate;
        row(&["PERFORMANCE METRICS"])?;
        row(&["metric", "value"])?;
        row(&["total_return_pct", &pct(agg.total_return_pct)])?;
        row(&["annualized_return_pct", &pct(agg.annualized_return_pct)])?;
        row(&["volatility_pct", &pct(agg.volatility_pct)])?;
        row(&["sharpe_ratio", &ratio(agg.sharpe_ratio)])?;
        row(&["sortino_ratio", &ratio(agg.sortino_ratio)])?;
        row(&["max_drawdown_pct", &pct(agg.max_drawdown_pct)])?;
        row(&["calmar_ratio", &ratio(agg.calmar_ratio)])?;
        row(&["win_rate_pct", &pct(agg.win_rate_pct)])?;
        row(&["num_trades", &agg.num_trades.to_string()])?;
        row(&["var_95_pct", &pct(agg.var_95_pct)])?;
        row(&["cvar_95_pct", &pct(agg.cvar_95_pct)])?;
        row(&["information_ratio", &ratio(agg.information_ratio)])?;
        row(&["beta", &ratio(agg.beta)])?;
        row(&["alpha_pct", &ratio(agg.alpha_pct)])?;
        row(&[])?;

        row(&["REGIME ANALYSIS"])?;
        row(&[
            "regime",
            "days",
            "total_return_pct",
            "sharpe_ratio",
            "volatility_pct",
            "max_drawdown_pct",
            "win_rate_pct",
            "num_trades",
        ])?;
        for regime in Regime::ALL {
            if let Some(m) = metrics.per_regime.get(&regime) {
                row(&[
                    regime.as_str(),
                    &m.days.to_string(),
                    &pct(m.total_return_pct),
                    &ratio(m.sharpe_ratio),
                    &pct(m.volatility_pct),
                    &pct(m.max_drawdown_pct),
                    &pct(m.win_rate_pct),
                    &m.num_trades.to_string(),
                ])?;
            }
        }
        row(&[])?;

        row(&["TRADE STATISTICS"])?;
        row(&["round_trips", &stats.round_trips.to_string()])?;
        row(&["winners", &stats.winners.to_string()])?;
        row(&["losers", &stats.losers.to_string()])?;
        row(&["win_rate_pct", &pct(stats.win_rate_pct)])?;
        row(&["total_pnl", &pct(stats.total_pnl)])?;
        row(&["average_pnl", &pct(stats.average_pnl)])?;
        row(&["average_return_pct", &pct(stats.average_return_pct)])?;
        row(&["best_pnl", &pct(stats.best_pnl)])?;
        row(&["worst_pnl", &pct(stats.worst_pnl)])?;
        row(&["average_holding_days", &pct(stats.average_holding_days)])?;
        row(&["total_commission", &pct(stats.total_commission)])?;
        row(&["profit_factor", &ratio(stats.profit_factor)])?;
        row(&[])?;

        row(&["TRADES BY ENTRY REGIME"])?;
        row(&[
            "regime",
            "trades",
            "win_rate_pct",
            "average_pnl",
            "average_return_pct",
        ])?;
        for regime in Regime::ALL {
            if let Some(breakdown) = stats.round_trips_by_regime.get(&regime) {
                row(&[
                    regime.as_str(),
                    &breakdown.trades.to_string(),
                    &pct(breakdown.win_rate_pct),
                    &pct(breakdown.average_pnl),
                    &pct(breakdown.average_return_pct),
                ])?;
            }
        }
        row(&[])?;

        row(&["TRADE HISTORY"])?;
        row(&[
            "date",
            "action",
            "price",
            "shares",
            "commission",
            "regime",
            "portfolio_value",
        ])?;
        for trade in &result.trades {
            row(&[
                &trade.date.to_string(),
                &trade.action.to_string(),
                &pct(trade.price),
                &trade.shares.to_string(),
                &format!("{:.4}", trade.commission),
                trade.regime.as_str(),
                &pct(trade.portfolio_value),
            ])?;
        }
        row(&[])?;

        row(&["PORTFOLIO LEDGER (TAIL)"])?;
        row(&[
            "date",
            "price",
            "regime",
            "holdings",
            "cash",
            "total",
            "cumulative_return",
            "benchmark_cumulative",
        ])?;
        let skip = result.rows.len().saturating_sub(LEDGER_TAIL_ROWS);
        for ledger_row in &result.rows[skip..] {
            row(&[
                &ledger_row.date.to_string(),
                &pct(ledger_row.price),
                ledger_row.regime.as_str(),
                &pct(ledger_row.holdings),
                &pct(ledger_row.cash),
                &pct(ledger_row.total),
                &format!("{:.6}", ledger_row.cumulative_return),
                &format!("{:.6}", ledger_row.benchmark_cumulative),
            ])?;
        }

        wtr.flush().map_err(|e| RegimetraderError::Data {
            reason: format!("report flush error: {}", e),
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::backtest::{run_backtest, trade_stats, BacktestConfig};
    use crate::domain::signal::{SignalPoint, SignalSeries};
    use chrono::NaiveDate;
    use std::fs;
    use tempfile::TempDir;

    fn sample_result() -> BacktestResult {
        let points: Vec<SignalPoint> = [100.0, 100.0, 110.0, 105.0]
            .iter()
            .zip([0, 1, 0, 0])
            .enumerate()
            .map(|(i, (&price, signal))| SignalPoint {
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
                    + chrono::Duration::days(i as i64),
                price,
                signal,
            })
            .collect();
        let series = SignalSeries { points };
        let regimes = vec![Regime::Bull; 4];
        run_backtest(&series, &regimes, &BacktestConfig::default()).unwrap()
    }

    #[test]
    fn report_contains_all_sections() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.csv");
        let result = sample_result();
        let metrics = MetricsReport::compute(&result.rows, &result.trades).unwrap();
        let stats = trade_stats(&result.trades);
        let tickers = vec!["SPY".to_string()];
        let context = ReportContext {
            strategy_name: "ma_crossover",
            tickers: &tickers,
            regime_method: "statistical",
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 1, 4).unwrap(),
        };

        CsvReportAdapter::new()
            .write(&result, &metrics, &stats, &context, path.to_str().unwrap())
            .unwrap();

        let content = fs::read_to_string(&path).unwrap();
        for section in [
            "BACKTEST REPORT",
            "PERFORMANCE METRICS",
            "REGIME ANALYSIS",
            "TRADE STATISTICS",
            "TRADES BY ENTRY REGIME",
            "TRADE HISTORY",
            "PORTFOLIO LEDGER (TAIL)",
        ] {
            assert!(content.contains(section), "missing section {}", section);
        }
        assert!(content.contains("BUY"));
        assert!(content.contains("SELL"));
        assert!(content.contains("Bull"));
    }

    #[test]
    fn unwritable_path_is_a_data_error() {
        let result = sample_result();
        let metrics = MetricsReport::compute(&result.rows, &result.trades).unwrap();
        let stats = trade_stats(&result.trades);
        let tickers = vec!["SPY".to_string()];
        let context = ReportContext {
            strategy_name: "momentum",
            tickers: &tickers,
            regime_method: "kmeans",
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 1, 4).unwrap(),
        };
        let err = CsvReportAdapter::new()
            .write(&result, &metrics, &stats, &context, "/no/such/dir/report.csv")
            .unwrap_err();
        assert!(matches!(err, RegimetraderError::Data { .. }));
    }
}
