//! Portfolio state and the per-bar ledger rows the backtest produces.

use crate::domain::regime::Regime;
use chrono::NaiveDate;
use std::fmt;

/// Mutable state threaded through the backtest loop. Long-only, so
/// `shares` never goes negative.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PortfolioState {
    pub cash: f64,
    pub shares: i64,
}

impl PortfolioState {
    pub fn new(initial_capital: f64) -> Self {
        Self {
            cash: initial_capital,
            shares: 0,
        }
    }

    pub fn holdings_value(&self, price: f64) -> f64 {
        self.shares as f64 * price
    }

    pub fn total_value(&self, price: f64) -> f64 {
        self.cash + self.holdings_value(price)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeAction {
    Buy,
    Sell,
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeAction::Buy => write!(f, "BUY"),
            TradeAction::Sell => write!(f, "SELL"),
        }
    }
}

/// One executed fill. `portfolio_value` is marked immediately after the
/// fill settles, at the fill price.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeRecord {
    pub date: NaiveDate,
    pub action: TradeAction,
    pub price: f64,
    pub shares: i64,
    pub commission: f64,
    pub regime: Regime,
    pub portfolio_value: f64,
}

/// One row of the daily portfolio ledger. Return fields are `None` on the
/// first row, where no prior value exists to difference against.
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioRow {
    pub date: NaiveDate,
    pub price: f64,
    pub regime: Regime,
    pub holdings: f64,
    pub cash: f64,
    pub total: f64,
    pub portfolio_return: Option<f64>,
    pub cumulative_return: f64,
    pub benchmark_return: Option<f64>,
    pub benchmark_cumulative: f64,
    pub excess_return: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_state_is_all_cash() {
        let state = PortfolioState::new(100_000.0);
        assert_eq!(state.shares, 0);
        assert_eq!(state.total_value(123.45), 100_000.0);
    }

    #[test]
    fn total_value_marks_shares_at_price() {
        let state = PortfolioState {
            cash: 500.0,
            shares: 10,
        };
        assert_eq!(state.holdings_value(25.0), 250.0);
        assert_eq!(state.total_value(25.0), 750.0);
    }

    #[test]
    fn trade_action_labels() {
        assert_eq!(TradeAction::Buy.to_string(), "BUY");
        assert_eq!(TradeAction::Sell.to_string(), "SELL");
    }
}
