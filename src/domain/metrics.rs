//! Performance metrics over the backtest ledger.
//!
//! Every ratio with a degenerate denominator (too few observations, zero
//! dispersion, zero drawdown) evaluates to exactly 0.0, never NaN or
//! infinity, so report consumers can format values without guards.

use crate::domain::error::RegimetraderError;
use crate::domain::portfolio::{PortfolioRow, TradeAction, TradeRecord};
use crate::domain::regime::Regime;
use crate::domain::rolling::{mean, sample_std};
use std::collections::HashMap;

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;
pub const RISK_FREE_RATE: f64 = 0.02;

/// Whole-run performance summary. Percentages are in percent units.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Metrics {
    pub total_return_pct: f64,
    pub annualized_return_pct: f64,
    pub volatility_pct: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub max_drawdown_pct: f64,
    pub calmar_ratio: f64,
    pub win_rate_pct: f64,
    pub num_trades: usize,
    pub var_95_pct: f64,
    pub cvar_95_pct: f64,
    pub information_ratio: f64,
    pub beta: f64,
    pub alpha_pct: f64,
}

/// Performance of the strategy restricted to the days spent in one regime.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RegimeMetrics {
    pub total_return_pct: f64,
    pub sharpe_ratio: f64,
    pub volatility_pct: f64,
    pub max_drawdown_pct: f64,
    pub num_trades: usize,
    pub win_rate_pct: f64,
    pub days: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricsReport {
    pub aggregate: Metrics,
    pub per_regime: HashMap<Regime, RegimeMetrics>,
}

impl MetricsReport {
    pub fn compute(
        rows: &[PortfolioRow],
        trades: &[TradeRecord],
    ) -> Result<Self, RegimetraderError> {
        if rows.is_empty() {
            return Err(RegimetraderError::EmptyInput {
                what: "portfolio ledger".into(),
            });
        }
        Ok(Self {
            aggregate: aggregate_metrics(rows, trades),
            per_regime: regime_metrics(rows, trades),
        })
    }
}

fn aggregate_metrics(rows: &[PortfolioRow], trades: &[TradeRecord]) -> Metrics {
    let returns: Vec<f64> = rows.iter().filter_map(|r| r.portfolio_return).collect();
    if returns.is_empty() {
        return Metrics {
            num_trades: trades.len(),
            ..Metrics::default()
        };
    }

    let total_return = returns.iter().fold(1.0, |acc, r| acc * (1.0 + r)) - 1.0;
    // annualization exponent runs over ledger rows, not return observations
    let annualized =
        (1.0 + total_return).powf(TRADING_DAYS_PER_YEAR / rows.len() as f64) - 1.0;
    let std = sample_std(&returns);
    let volatility = std * TRADING_DAYS_PER_YEAR.sqrt();
    let max_dd = max_drawdown(&returns);

    let calmar = if max_dd != 0.0 {
        annualized * 100.0 / (max_dd * 100.0).abs()
    } else {
        0.0
    };

    let var_95 = quantile(&returns, 0.05);
    let tail: Vec<f64> = returns.iter().copied().filter(|&r| r <= var_95).collect();
    let cvar_95 = if tail.is_empty() { 0.0 } else { mean(&tail) };

    let (beta, alpha, information_ratio) = benchmark_relative(rows);

    Metrics {
        total_return_pct: total_return * 100.0,
        annualized_return_pct: annualized * 100.0,
        volatility_pct: volatility * 100.0,
        sharpe_ratio: sharpe(&returns),
        sortino_ratio: sortino(&returns),
        max_drawdown_pct: max_dd * 100.0,
        calmar_ratio: calmar,
        win_rate_pct: trade_win_rate(trades),
        num_trades: trades.len(),
        var_95_pct: var_95 * 100.0,
        cvar_95_pct: cvar_95 * 100.0,
        information_ratio,
        beta,
        alpha_pct: alpha * 100.0,
    }
}

fn regime_metrics(
    rows: &[PortfolioRow],
    trades: &[TradeRecord],
) -> HashMap<Regime, RegimeMetrics> {
    let mut out = HashMap::new();
    for regime in Regime::ALL {
        let days = rows.iter().filter(|r| r.regime == regime).count();
        let returns: Vec<f64> = rows
            .iter()
            .filter(|r| r.regime == regime)
            .filter_map(|r| r.portfolio_return)
            .collect();
        let num_trades = trades.iter().filter(|t| t.regime == regime).count();

        if returns.is_empty() {
            out.insert(
                regime,
                RegimeMetrics {
                    num_trades,
                    days,
                    ..RegimeMetrics::default()
                },
            );
            continue;
        }

        // drawdown runs over the account value on the regime's days, so
        // losses taken on interleaved other-regime days still register
        let totals: Vec<f64> = rows
            .iter()
            .filter(|r| r.regime == regime)
            .map(|r| r.total)
            .collect();
        out.insert(
            regime,
            RegimeMetrics {
                total_return_pct: returns.iter().sum::<f64>() * 100.0,
                sharpe_ratio: sharpe(&returns),
                volatility_pct: sample_std(&returns) * TRADING_DAYS_PER_YEAR.sqrt() * 100.0,
                max_drawdown_pct: if totals.len() > 1 {
                    max_drawdown_values(&totals) * 100.0
                } else {
                    0.0
                },
                num_trades,
                win_rate_pct: trade_win_rate(trades.iter().filter(|t| t.regime == regime)),
                days,
            },
        );
    }
    out
}

fn sharpe(returns: &[f64]) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    let std = sample_std(returns);
    if std == 0.0 {
        return 0.0;
    }
    let excess = mean(returns) - RISK_FREE_RATE / TRADING_DAYS_PER_YEAR;
    excess / std * TRADING_DAYS_PER_YEAR.sqrt()
}

fn sortino(returns: &[f64]) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    let downside: Vec<f64> = returns.iter().copied().filter(|&r| r < 0.0).collect();
    if downside.len() < 2 {
        return 0.0;
    }
    let downside_std = sample_std(&downside);
    if downside_std == 0.0 {
        return 0.0;
    }
    let excess = mean(returns) - RISK_FREE_RATE / TRADING_DAYS_PER_YEAR;
    excess / downside_std * TRADING_DAYS_PER_YEAR.sqrt()
}

/// Deepest peak-to-trough loss of the compounded wealth path, as a
/// non-positive decimal.
pub fn max_drawdown(returns: &[f64]) -> f64 {
    let mut wealth = 1.0;
    let mut peak = 1.0;
    let mut worst = 0.0f64;
    for r in returns {
        wealth *= 1.0 + r;
        if wealth > peak {
            peak = wealth;
        }
        worst = worst.min(wealth / peak - 1.0);
    }
    worst
}

/// Deepest peak-to-trough loss along a path of account values, as a
/// non-positive decimal.
pub fn max_drawdown_values(values: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut worst = 0.0f64;
    for &v in values {
        if v > peak {
            peak = v;
        }
        if peak > 0.0 {
            worst = worst.min(v / peak - 1.0);
        }
    }
    worst
}

/// Linear-interpolation quantile over a copy of the data.
pub fn quantile(values: &[f64], q: f64) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let h = (sorted.len() - 1) as f64 * q;
    let lo = h.floor() as usize;
    let frac = h - lo as f64;
    if lo + 1 < sorted.len() {
        sorted[lo] + frac * (sorted[lo + 1] - sorted[lo])
    } else {
        sorted[lo]
    }
}

/// Fraction of closed round trips with positive gross profit, in percent.
/// Buys and sells are paired in fill order within the given trades.
fn trade_win_rate<'a, I>(trades: I) -> f64
where
    I: IntoIterator<Item = &'a TradeRecord>,
{
    let mut buys: Vec<&TradeRecord> = Vec::new();
    let mut sells: Vec<&TradeRecord> = Vec::new();
    for trade in trades {
        match trade.action {
            TradeAction::Buy => buys.push(trade),
            TradeAction::Sell => sells.push(trade),
        }
    }
    let pairs = buys.len().min(sells.len());
    if pairs == 0 {
        return 0.0;
    }
    let winners = buys
        .iter()
        .zip(sells.iter())
        .filter(|(buy, sell)| (sell.price - buy.price) * buy.shares as f64 > 0.0)
        .count();
    winners as f64 / pairs as f64 * 100.0
}

/// Beta, daily alpha (decimal) and annualized information ratio against
/// the buy-and-hold benchmark.
fn benchmark_relative(rows: &[PortfolioRow]) -> (f64, f64, f64) {
    let pairs: Vec<(f64, f64)> = rows
        .iter()
        .filter_map(|r| match (r.portfolio_return, r.benchmark_return) {
            (Some(p), Some(b)) => Some((p, b)),
            _ => None,
        })
        .collect();
    if pairs.len() < 2 {
        return (0.0, 0.0, 0.0);
    }

    let port: Vec<f64> = pairs.iter().map(|(p, _)| *p).collect();
    let bench: Vec<f64> = pairs.iter().map(|(_, b)| *b).collect();
    let mean_p = mean(&port);
    let mean_b = mean(&bench);

    let n = pairs.len() as f64;
    let cov = pairs
        .iter()
        .map(|(p, b)| (p - mean_p) * (b - mean_b))
        .sum::<f64>()
        / (n - 1.0);
    let var_b = bench.iter().map(|b| (b - mean_b).powi(2)).sum::<f64>() / (n - 1.0);

    let beta = if var_b > 0.0 { cov / var_b } else { 0.0 };

    let rf_daily = RISK_FREE_RATE / TRADING_DAYS_PER_YEAR;
    let alpha = mean_p - (rf_daily + beta * (mean_b - rf_daily));

    let excess: Vec<f64> = pairs.iter().map(|(p, b)| p - b).collect();
    let excess_std = sample_std(&excess);
    let information_ratio = if excess_std > 0.0 {
        mean(&excess) / excess_std * TRADING_DAYS_PER_YEAR.sqrt()
    } else {
        0.0
    };

    (beta, alpha, information_ratio)
}
