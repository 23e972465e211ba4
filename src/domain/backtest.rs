//! Sequential backtest engine.
//!
//! Replays a signal series against a regime-labelled price path, one bar at
//! a time. All-in long-only sizing: a buy converts as much cash as
//! commission allows into whole shares, a sell liquidates the full
//! position. Fills happen at the bar's close.

use crate::domain::error::RegimetraderError;
use crate::domain::portfolio::{PortfolioRow, PortfolioState, TradeAction, TradeRecord};
use crate::domain::regime::Regime;
use crate::domain::signal::SignalSeries;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BacktestConfig {
    pub initial_capital: f64,
    pub commission: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            initial_capital: 100_000.0,
            commission: 0.001,
        }
    }
}

impl BacktestConfig {
    pub fn validate(&self) -> Result<(), RegimetraderError> {
        if !(self.initial_capital > 0.0) {
            return Err(RegimetraderError::InvalidParameter {
                name: "initial_capital".into(),
                reason: "must be positive".into(),
            });
        }
        if !(0.0..1.0).contains(&self.commission) {
            return Err(RegimetraderError::InvalidParameter {
                name: "commission".into(),
                reason: "must be in [0, 1)".into(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct BacktestResult {
    pub rows: Vec<PortfolioRow>,
    pub trades: Vec<TradeRecord>,
}

pub fn run_backtest(
    signals: &SignalSeries,
    regimes: &[Regime],
    config: &BacktestConfig,
) -> Result<BacktestResult, RegimetraderError> {
    config.validate()?;
    if signals.is_empty() {
        return Err(RegimetraderError::EmptyInput {
            what: "signal series".into(),
        });
    }
    if signals.len() != regimes.len() {
        return Err(RegimetraderError::Alignment {
            left: "signals".into(),
            left_len: signals.len(),
            right: "regimes".into(),
            right_len: regimes.len(),
        });
    }

    let changes = signals.position_changes();
    let mut state = PortfolioState::new(config.initial_capital);
    let mut rows = Vec::with_capacity(signals.len());
    let mut trades = Vec::new();

    for (i, point) in signals.points.iter().enumerate() {
        if let Some(record) =
            execute_trade(&mut state, changes[i], point.date, point.price, regimes[i], config)
        {
            trades.push(record);
        }

        rows.push(PortfolioRow {
            date: point.date,
            price: point.price,
            regime: regimes[i],
            holdings: state.holdings_value(point.price),
            cash: state.cash,
            total: state.total_value(point.price),
            portfolio_return: None,
            cumulative_return: 0.0,
            benchmark_return: None,
            benchmark_cumulative: 0.0,
            excess_return: None,
        });
    }

    fill_derived_columns(&mut rows, config.initial_capital);
    Ok(BacktestResult { rows, trades })
}

/// Applies one signal change to the portfolio. Returns the fill, or `None`
/// when nothing tradeable happened (no change, no cash for a single share,
/// nothing held to sell).
fn execute_trade(
    state: &mut PortfolioState,
    change: i32,
    date: chrono::NaiveDate,
    price: f64,
    regime: Regime,
    config: &BacktestConfig,
) -> Option<TradeRecord> {
    if change > 0 && state.shares <= 0 {
        let affordable = (state.cash / (price * (1.0 + config.commission))).floor() as i64;
        if affordable <= 0 {
            return None;
        }
        let commission = affordable as f64 * price * config.commission;
        state.cash -= affordable as f64 * price + commission;
        state.shares = affordable;
        Some(TradeRecord {
            date,
            action: TradeAction::Buy,
            price,
            shares: affordable,
            commission,
            regime,
            portfolio_value: state.total_value(price),
        })
    } else if change < 0 && state.shares > 0 {
        let shares = state.shares;
        let gross = shares as f64 * price;
        let commission = gross * config.commission;
        state.cash += gross - commission;
        state.shares = 0;
        Some(TradeRecord {
            date,
            action: TradeAction::Sell,
            price,
            shares,
            commission,
            regime,
            portfolio_value: state.total_value(price),
        })
    } else {
        None
    }
}

fn fill_derived_columns(rows: &mut [PortfolioRow], initial_capital: f64) {
    let first_price = rows[0].price;
    for i in 0..rows.len() {
        rows[i].cumulative_return = rows[i].total / initial_capital - 1.0;
        if first_price != 0.0 {
            rows[i].benchmark_cumulative = rows[i].price / first_price - 1.0;
        }
        if i > 0 {
            let prev = rows[i - 1].total;
            let port = if prev != 0.0 {
                rows[i].total / prev - 1.0
            } else {
                0.0
            };
            let prev_price = rows[i - 1].price;
            let bench = if prev_price != 0.0 {
                rows[i].price / prev_price - 1.0
            } else {
                0.0
            };
            rows[i].portfolio_return = Some(port);
            rows[i].benchmark_return = Some(bench);
            rows[i].excess_return = Some(port - bench);
        }
    }
}

/// A buy matched with the sell that closed it, oldest first. An open
/// position at the end of the series stays unpaired. `pnl` is net of
/// both the entry and exit commissions.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundTrip {
    pub entry_date: chrono::NaiveDate,
    pub exit_date: chrono::NaiveDate,
    pub entry_price: f64,
    pub exit_price: f64,
    pub shares: i64,
    pub entry_regime: Regime,
    pub exit_regime: Regime,
    pub pnl: f64,
    pub return_pct: f64,
    pub holding_days: i64,
}

pub fn pair_round_trips(trades: &[TradeRecord]) -> Vec<RoundTrip> {
    let buys: Vec<&TradeRecord> = trades
        .iter()
        .filter(|t| t.action == TradeAction::Buy)
        .collect();
    let sells: Vec<&TradeRecord> = trades
        .iter()
        .filter(|t| t.action == TradeAction::Sell)
        .collect();

    buys.iter()
        .zip(sells.iter())
        .map(|(buy, sell)| {
            let pnl = (sell.price - buy.price) * buy.shares as f64
                - buy.commission
                - sell.commission;
            let notional = buy.price * buy.shares as f64;
            RoundTrip {
                entry_date: buy.date,
                exit_date: sell.date,
                entry_price: buy.price,
                exit_price: sell.price,
                shares: buy.shares,
                entry_regime: buy.regime,
                exit_regime: sell.regime,
                pnl,
                return_pct: if notional > 0.0 { pnl / notional } else { 0.0 },
                holding_days: (sell.date - buy.date).num_days(),
            }
        })
        .collect()
}

/// Round trips grouped by the regime in force when the position opened.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RegimeTradeStats {
    pub trades: usize,
    pub win_rate_pct: f64,
    pub average_pnl: f64,
    pub average_return_pct: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TradeStats {
    pub round_trips: usize,
    pub winners: usize,
    pub losers: usize,
    pub win_rate_pct: f64,
    pub total_pnl: f64,
    pub average_pnl: f64,
    pub average_return_pct: f64,
    pub best_pnl: f64,
    pub worst_pnl: f64,
    pub average_holding_days: f64,
    pub total_commission: f64,
    pub profit_factor: f64,
    pub round_trips_by_regime: HashMap<Regime, RegimeTradeStats>,
}

pub fn trade_stats(trades: &[TradeRecord]) -> TradeStats {
    let round_trips = pair_round_trips(trades);
    let total_commission: f64 = trades.iter().map(|t| t.commission).sum();

    if round_trips.is_empty() {
        return TradeStats {
            round_trips: 0,
            winners: 0,
            losers: 0,
            win_rate_pct: 0.0,
            total_pnl: 0.0,
            average_pnl: 0.0,
            average_return_pct: 0.0,
            best_pnl: 0.0,
            worst_pnl: 0.0,
            average_holding_days: 0.0,
            total_commission,
            profit_factor: 0.0,
            round_trips_by_regime: HashMap::new(),
        };
    }

    let n = round_trips.len();
    let winners = round_trips.iter().filter(|r| r.pnl > 0.0).count();
    let losers = round_trips.iter().filter(|r| r.pnl < 0.0).count();
    let total_pnl: f64 = round_trips.iter().map(|r| r.pnl).sum();
    let gross_wins: f64 = round_trips.iter().map(|r| r.pnl.max(0.0)).sum();
    let gross_losses: f64 = round_trips.iter().map(|r| (-r.pnl).max(0.0)).sum();
    let profit_factor = if gross_losses > 0.0 {
        gross_wins / gross_losses
    } else if gross_wins > 0.0 {
        f64::INFINITY
    } else {
        0.0
    };

    let mut by_regime: HashMap<Regime, Vec<&RoundTrip>> = HashMap::new();
    for trip in &round_trips {
        by_regime.entry(trip.entry_regime).or_default().push(trip);
    }
    let round_trips_by_regime = by_regime
        .into_iter()
        .map(|(regime, trips)| {
            let count = trips.len();
            let wins = trips.iter().filter(|t| t.pnl > 0.0).count();
            (
                regime,
                RegimeTradeStats {
                    trades: count,
                    win_rate_pct: wins as f64 / count as f64 * 100.0,
                    average_pnl: trips.iter().map(|t| t.pnl).sum::<f64>() / count as f64,
                    average_return_pct: trips.iter().map(|t| t.return_pct).sum::<f64>()
                        / count as f64
                        * 100.0,
                },
            )
        })
        .collect();

    TradeStats {
        round_trips: n,
        winners,
        losers,
        win_rate_pct: winners as f64 / n as f64 * 100.0,
        total_pnl,
        average_pnl: total_pnl / n as f64,
        average_return_pct: round_trips.iter().map(|r| r.return_pct).sum::<f64>() / n as f64
            * 100.0,
        best_pnl: round_trips
            .iter()
            .map(|r| r.pnl)
            .fold(f64::NEG_INFINITY, f64::max),
        worst_pnl: round_trips
            .iter()
            .map(|r| r.pnl)
            .fold(f64::INFINITY, f64::min),
        average_holding_days: round_trips.iter().map(|r| r.holding_days as f64).sum::<f64>()
            / n as f64,
        total_commission,
        profit_factor,
        round_trips_by_regime,
    }
}
