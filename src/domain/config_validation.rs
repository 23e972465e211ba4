//! Configuration validation.
//!
//! Validates all config fields before a backtest runs. Invalid values fail
//! loudly here instead of silently falling back to defaults.

use crate::domain::backtest::BacktestConfig;
use crate::domain::error::RegimetraderError;
use crate::domain::regime::RegimeMethod;
use crate::domain::strategy::StrategySpec;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), RegimetraderError> {
    validate_initial_capital(config)?;
    validate_commission(config)?;
    validate_dates(config)?;
    validate_ticker(config)?;
    Ok(())
}

pub fn validate_regime_config(config: &dyn ConfigPort) -> Result<(), RegimetraderError> {
    build_regime_method(config)?;
    validate_regime_window(config)?;
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), RegimetraderError> {
    build_strategy_spec(config)?;
    Ok(())
}

/// Parsed backtest settings, after validation.
pub fn build_backtest_config(config: &dyn ConfigPort) -> Result<BacktestConfig, RegimetraderError> {
    validate_backtest_config(config)?;
    Ok(BacktestConfig {
        initial_capital: config.get_double("backtest", "initial_capital", 100_000.0)?,
        commission: config.get_double("backtest", "commission", 0.001)?,
    })
}

pub fn build_regime_method(config: &dyn ConfigPort) -> Result<RegimeMethod, RegimetraderError> {
    let name = config
        .get_string("regime", "method")
        .unwrap_or_else(|| "statistical".to_string());
    RegimeMethod::from_name(&name).ok_or_else(|| RegimetraderError::ConfigInvalid {
        section: "regime".to_string(),
        key: "method".to_string(),
        reason: format!("unknown regime method '{}'", name),
    })
}

pub fn build_strategy_spec(config: &dyn ConfigPort) -> Result<StrategySpec, RegimetraderError> {
    let kind = match config.get_string("strategy", "kind") {
        Some(s) if !s.trim().is_empty() => s.trim().to_lowercase(),
        _ => {
            return Err(RegimetraderError::ConfigMissing {
                section: "strategy".to_string(),
                key: "kind".to_string(),
            })
        }
    };

    match kind.as_str() {
        "ma_crossover" => build_ma_crossover(config),
        "momentum" => build_momentum(config),
        "volatility_breakout" => build_volatility_breakout(config),
        "pairs_trading" => build_pairs_trading(config),
        other => Err(RegimetraderError::ConfigInvalid {
            section: "strategy".to_string(),
            key: "kind".to_string(),
            reason: format!("unknown strategy kind '{}'", other),
        }),
    }
}

fn validate_initial_capital(config: &dyn ConfigPort) -> Result<(), RegimetraderError> {
    let value = config.get_double("backtest", "initial_capital", 100_000.0)?;
    if value <= 0.0 {
        return Err(RegimetraderError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "initial_capital".to_string(),
            reason: "initial_capital must be positive".to_string(),
        });
    }
    Ok(())
}

fn validate_commission(config: &dyn ConfigPort) -> Result<(), RegimetraderError> {
    let value = config.get_double("backtest", "commission", 0.001)?;
    if !(0.0..1.0).contains(&value) {
        return Err(RegimetraderError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "commission".to_string(),
            reason: "commission must be in [0, 1)".to_string(),
        });
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), RegimetraderError> {
    let start_str = config.get_string("backtest", "start_date");
    let end_str = config.get_string("backtest", "end_date");

    let start_date = parse_date(start_str.as_deref(), "start_date")?;
    let end_date = parse_date(end_str.as_deref(), "end_date")?;

    if start_date >= end_date {
        return Err(RegimetraderError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "start_date".to_string(),
            reason: "start_date must be before end_date".to_string(),
        });
    }
    Ok(())
}

pub fn parse_date(value: Option<&str>, field: &str) -> Result<NaiveDate, RegimetraderError> {
    match value {
        None => Err(RegimetraderError::ConfigMissing {
            section: "backtest".to_string(),
            key: field.to_string(),
        }),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
            RegimetraderError::ConfigInvalid {
                section: "backtest".to_string(),
                key: field.to_string(),
                reason: format!("invalid {} format, expected YYYY-MM-DD", field),
            }
        }),
    }
}

fn validate_ticker(config: &dyn ConfigPort) -> Result<(), RegimetraderError> {
    match config.get_string("backtest", "ticker") {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(RegimetraderError::ConfigMissing {
            section: "backtest".to_string(),
            key: "ticker".to_string(),
        }),
    }
}

fn validate_regime_window(config: &dyn ConfigPort) -> Result<(), RegimetraderError> {
    let value = config.get_int("regime", "window", 20)?;
    if value < 1 {
        return Err(RegimetraderError::ConfigInvalid {
            section: "regime".to_string(),
            key: "window".to_string(),
            reason: "window must be at least 1".to_string(),
        });
    }
    Ok(())
}

fn positive_window(config: &dyn ConfigPort, key: &str, default: i64) -> Result<usize, RegimetraderError> {
    let value = config.get_int("strategy", key, default)?;
    if value < 1 {
        return Err(RegimetraderError::ConfigInvalid {
            section: "strategy".to_string(),
            key: key.to_string(),
            reason: format!("{} must be at least 1", key),
        });
    }
    Ok(value as usize)
}

fn build_ma_crossover(config: &dyn ConfigPort) -> Result<StrategySpec, RegimetraderError> {
    let short_window = positive_window(config, "short_window", 50)?;
    let long_window = positive_window(config, "long_window", 200)?;
    if short_window >= long_window {
        return Err(RegimetraderError::ConfigInvalid {
            section: "strategy".to_string(),
            key: "short_window".to_string(),
            reason: "short_window must be less than long_window".to_string(),
        });
    }
    Ok(StrategySpec::MaCrossover {
        short_window,
        long_window,
    })
}

fn build_momentum(config: &dyn ConfigPort) -> Result<StrategySpec, RegimetraderError> {
    let window = positive_window(config, "window", 20)?;
    let buy_threshold = config.get_double("strategy", "buy_threshold", 0.05)?;
    let sell_threshold = config.get_double("strategy", "sell_threshold", -0.05)?;
    if buy_threshold <= sell_threshold {
        return Err(RegimetraderError::ConfigInvalid {
            section: "strategy".to_string(),
            key: "buy_threshold".to_string(),
            reason: "buy_threshold must be greater than sell_threshold".to_string(),
        });
    }
    Ok(StrategySpec::Momentum {
        window,
        buy_threshold,
        sell_threshold,
    })
}

fn build_volatility_breakout(config: &dyn ConfigPort) -> Result<StrategySpec, RegimetraderError> {
    let window = positive_window(config, "window", 20)?;
    let multiplier = config.get_double("strategy", "multiplier", 1.5)?;
    if multiplier <= 0.0 {
        return Err(RegimetraderError::ConfigInvalid {
            section: "strategy".to_string(),
            key: "multiplier".to_string(),
            reason: "multiplier must be positive".to_string(),
        });
    }
    Ok(StrategySpec::VolatilityBreakout { window, multiplier })
}

fn build_pairs_trading(config: &dyn ConfigPort) -> Result<StrategySpec, RegimetraderError> {
    let window = positive_window(config, "window", 20)?;
    let entry_z = config.get_double("strategy", "entry_z", 2.0)?;
    let exit_z = config.get_double("strategy", "exit_z", 0.5)?;
    if entry_z <= exit_z {
        return Err(RegimetraderError::ConfigInvalid {
            section: "strategy".to_string(),
            key: "entry_z".to_string(),
            reason: "entry_z must be greater than exit_z".to_string(),
        });
    }
    match config.get_string("strategy", "pair_ticker") {
        Some(s) if !s.trim().is_empty() => {}
        _ => {
            return Err(RegimetraderError::ConfigMissing {
                section: "strategy".to_string(),
                key: "pair_ticker".to_string(),
            })
        }
    }
    Ok(StrategySpec::PairsTrading {
        window,
        entry_z,
        exit_z,
    })
}
