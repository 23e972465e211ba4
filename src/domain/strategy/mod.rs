//! Trading strategies behind a single tagged-variant dispatch.
//!
//! Every strategy validates its parameters, then produces a [`SignalSeries`]
//! with one point per input bar (pairs trading: per date-aligned bar) whose
//! signal column is always in {-1, 0, 1}.

pub mod ma_crossover;
pub mod momentum;
pub mod pairs_trading;
pub mod volatility_breakout;

use crate::domain::error::RegimetraderError;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::signal::SignalSeries;

#[derive(Debug, Clone, PartialEq)]
pub enum StrategySpec {
    MaCrossover {
        short_window: usize,
        long_window: usize,
    },
    Momentum {
        window: usize,
        buy_threshold: f64,
        sell_threshold: f64,
    },
    VolatilityBreakout {
        window: usize,
        multiplier: f64,
    },
    PairsTrading {
        window: usize,
        entry_z: f64,
        exit_z: f64,
    },
}

impl StrategySpec {
    pub fn name(&self) -> &'static str {
        match self {
            StrategySpec::MaCrossover { .. } => "MA Crossover",
            StrategySpec::Momentum { .. } => "Momentum",
            StrategySpec::VolatilityBreakout { .. } => "Volatility Breakout",
            StrategySpec::PairsTrading { .. } => "Pairs Trading",
        }
    }

    /// True when the strategy trades a spread and needs a second leg.
    pub fn needs_secondary(&self) -> bool {
        matches!(self, StrategySpec::PairsTrading { .. })
    }

    /// Generate the signal series for this strategy. `secondary` is required
    /// for pairs trading and ignored otherwise.
    pub fn generate(
        &self,
        primary: &[OhlcvBar],
        secondary: Option<&[OhlcvBar]>,
    ) -> Result<SignalSeries, RegimetraderError> {
        match *self {
            StrategySpec::MaCrossover {
                short_window,
                long_window,
            } => ma_crossover::generate(primary, short_window, long_window),
            StrategySpec::Momentum {
                window,
                buy_threshold,
                sell_threshold,
            } => momentum::generate(primary, window, buy_threshold, sell_threshold),
            StrategySpec::VolatilityBreakout { window, multiplier } => {
                volatility_breakout::generate(primary, window, multiplier)
            }
            StrategySpec::PairsTrading {
                window,
                entry_z,
                exit_z,
            } => {
                let second = secondary.ok_or_else(|| RegimetraderError::InvalidParameter {
                    name: "secondary_ticker".into(),
                    reason: "pairs trading requires a second leg".into(),
                })?;
                pairs_trading::generate(primary, second, window, entry_z, exit_z)
            }
        }
    }
}
