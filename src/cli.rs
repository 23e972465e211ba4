//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{self, BacktestResult, TradeStats};
use crate::domain::config_validation::{
    build_backtest_config, build_regime_method, build_strategy_spec, parse_date,
    validate_backtest_config, validate_regime_config, validate_strategy_config,
};
use crate::domain::error::RegimetraderError;
use crate::domain::kmeans::detect_kmeans;
use crate::domain::metrics::MetricsReport;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::regime::{
    analyze_transitions, detect_statistical, regime_return_stats, Regime, RegimeMethod,
};
use crate::domain::signal::SignalSeries;
use crate::domain::strategy::StrategySpec;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::{ReportContext, ReportPort};

/// Fewer bars than this makes regime labels unreliable.
const MIN_RECOMMENDED_BARS: usize = 50;

#[derive(Parser, Debug)]
#[command(name = "regimetrader", about = "Regime-conditioned strategy backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        ticker: Option<String>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show data range for a ticker
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        ticker: Option<String>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            output,
            ticker,
            dry_run,
        } => {
            if dry_run {
                run_dry_run(&config)
            } else {
                run_backtest(&config, output.as_ref(), ticker.as_deref())
            }
        }
        Command::Validate { config } => run_validate(&config),
        Command::Info { config, ticker } => run_info(&config, ticker.as_deref()),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })
}

fn fail(e: &RegimetraderError) -> ExitCode {
    eprintln!("error: {e}");
    e.into()
}

fn run_backtest(
    config_path: &PathBuf,
    output_path: Option<&PathBuf>,
    ticker_override: Option<&str>,
) -> ExitCode {
    // Stage 1: Load and validate config
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    if let Err(e) = validate_backtest_config(&adapter) {
        return fail(&e);
    }
    if let Err(e) = validate_regime_config(&adapter) {
        return fail(&e);
    }

    // Stage 2: Build run settings
    let bt_config = match build_backtest_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };
    let method = match build_regime_method(&adapter) {
        Ok(m) => m,
        Err(e) => return fail(&e),
    };
    let spec = match build_strategy_spec(&adapter) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };
    let (start_date, end_date) = match config_dates(&adapter) {
        Ok(d) => d,
        Err(e) => return fail(&e),
    };
    let ticker = ticker_override
        .map(str::to_string)
        .or_else(|| adapter.get_string("backtest", "ticker"))
        .unwrap_or_default();
    let regime_window = match adapter.get_int("regime", "window", 20) {
        Ok(w) => w as usize,
        Err(e) => return fail(&e),
    };

    eprintln!(
        "Strategy: {} | regime method: {} | ticker: {}",
        spec.name(),
        method_name(method),
        ticker,
    );

    // Stage 3: Fetch data
    let data_path = adapter
        .get_string("data", "path")
        .unwrap_or_else(|| "data".to_string());
    let data_port = CsvAdapter::new(PathBuf::from(data_path));

    let bars = match data_port.fetch_ohlcv(&ticker, start_date, end_date) {
        Ok(b) => b,
        Err(e) => return fail(&e),
    };
    eprintln!("Loaded {} bars for {}", bars.len(), ticker);
    if bars.is_empty() {
        return fail(&RegimetraderError::InsufficientData {
            ticker: ticker.clone(),
            have: 0,
            need: 2,
        });
    }
    if bars.len() < MIN_RECOMMENDED_BARS {
        eprintln!(
            "warning: only {} bars available, regime labels may be unreliable",
            bars.len()
        );
    }

    let mut tickers = vec![ticker.clone()];
    let secondary = if spec.needs_secondary() {
        let pair_ticker = adapter
            .get_string("strategy", "pair_ticker")
            .unwrap_or_default();
        match data_port.fetch_ohlcv(&pair_ticker, start_date, end_date) {
            Ok(b) => {
                eprintln!("Loaded {} bars for pair leg {}", b.len(), pair_ticker);
                tickers.push(pair_ticker);
                Some(b)
            }
            Err(e) => return fail(&e),
        }
    } else {
        None
    };

    // Stage 4: Detect regimes
    let regimes = match detect_regimes(&bars, method, regime_window) {
        Ok(r) => r,
        Err(e) => return fail(&e),
    };

    // Stage 5: Generate signals and align regimes to signal dates
    let signals = match spec.generate(&bars, secondary.as_deref()) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };
    let aligned_regimes = align_regimes(&bars, &regimes, &signals);

    // Stage 6: Run the backtest
    eprintln!(
        "Running backtest: {} signal bars, {} to {}",
        signals.len(),
        start_date,
        end_date,
    );
    let result = match backtest::run_backtest(&signals, &aligned_regimes, &bt_config) {
        Ok(r) => r,
        Err(e) => return fail(&e),
    };

    // Stage 7: Metrics and console summary
    let metrics = match MetricsReport::compute(&result.rows, &result.trades) {
        Ok(m) => m,
        Err(e) => return fail(&e),
    };
    let stats = backtest::trade_stats(&result.trades);
    print_summary(&result, &metrics, &stats, &aligned_regimes);

    // Stage 8: Optional report, --output wins over [report] output
    let report_target = output_path
        .map(|p| p.display().to_string())
        .or_else(|| adapter.get_string("report", "output"));
    if let Some(path) = report_target {
        let context = ReportContext {
            strategy_name: spec.name(),
            tickers: &tickers,
            regime_method: method_name(method),
            start_date,
            end_date,
        };
        if let Err(e) =
            CsvReportAdapter::new().write(&result, &metrics, &stats, &context, &path)
        {
            return fail(&e);
        }
        eprintln!("\nReport written to: {}", path);
    }

    ExitCode::SUCCESS
}

fn config_dates(adapter: &dyn ConfigPort) -> Result<(NaiveDate, NaiveDate), RegimetraderError> {
    let start = parse_date(
        adapter.get_string("backtest", "start_date").as_deref(),
        "start_date",
    )?;
    let end = parse_date(
        adapter.get_string("backtest", "end_date").as_deref(),
        "end_date",
    )?;
    Ok((start, end))
}

fn method_name(method: RegimeMethod) -> &'static str {
    match method {
        RegimeMethod::Statistical => "statistical",
        RegimeMethod::KMeans => "kmeans",
    }
}

fn detect_regimes(
    bars: &[OhlcvBar],
    method: RegimeMethod,
    window: usize,
) -> Result<Vec<Regime>, RegimetraderError> {
    match method {
        RegimeMethod::Statistical => detect_statistical(bars, window),
        RegimeMethod::KMeans => detect_kmeans(bars, window),
    }
}

/// Joins the regime labels, detected on the primary bar dates, onto the
/// signal dates. Pairs trading emits only the date intersection of its two
/// legs, so signal dates are always a subset of the bar dates.
fn align_regimes(bars: &[OhlcvBar], regimes: &[Regime], signals: &SignalSeries) -> Vec<Regime> {
    let by_date: HashMap<NaiveDate, Regime> = bars
        .iter()
        .zip(regimes)
        .map(|(bar, &regime)| (bar.date, regime))
        .collect();
    signals
        .points
        .iter()
        .map(|p| by_date.get(&p.date).copied().unwrap_or(Regime::Neutral))
        .collect()
}

fn print_summary(
    result: &BacktestResult,
    metrics: &MetricsReport,
    stats: &TradeStats,
    regimes: &[Regime],
) {
    let agg = &metrics.aggregate;
    eprintln!("\n=== Performance ===");
    eprintln!("Total Return:     {:.2}%", agg.total_return_pct);
    eprintln!("Annualized:       {:.2}%", agg.annualized_return_pct);
    eprintln!("Volatility:       {:.2}%", agg.volatility_pct);
    eprintln!("Sharpe Ratio:     {:.2}", agg.sharpe_ratio);
    eprintln!("Sortino Ratio:    {:.2}", agg.sortino_ratio);
    eprintln!("Max Drawdown:     {:.2}%", agg.max_drawdown_pct);
    eprintln!("Calmar Ratio:     {:.2}", agg.calmar_ratio);
    eprintln!("VaR (95%):        {:.2}%", agg.var_95_pct);
    eprintln!("CVaR (95%):       {:.2}%", agg.cvar_95_pct);
    eprintln!("Beta:             {:.2}", agg.beta);
    eprintln!("Info Ratio:       {:.2}", agg.information_ratio);
    eprintln!("Trades:           {}", agg.num_trades);
    eprintln!("Win Rate:         {:.1}%", agg.win_rate_pct);
    eprintln!("Profit Factor:    {:.2}", stats.profit_factor);

    let transitions = analyze_transitions(regimes);
    eprintln!("\n=== Regimes ===");
    eprintln!("Transitions:      {}", transitions.total_transitions);
    for regime in Regime::ALL {
        let Some(m) = metrics.per_regime.get(&regime) else {
            continue;
        };
        if m.days == 0 {
            continue;
        }
        let duration = transitions
            .average_durations
            .get(&regime)
            .copied()
            .unwrap_or(0.0);
        eprintln!(
            "  {:<9} {:>4} days (avg run {:.1}), return {:+.2}%, sharpe {:.2}, {} trades",
            regime.as_str(),
            m.days,
            duration,
            m.total_return_pct,
            m.sharpe_ratio,
            m.num_trades,
        );
    }

    let returns: Vec<Option<f64>> = result.rows.iter().map(|r| r.portfolio_return).collect();
    let return_stats = regime_return_stats(regimes, &returns);
    eprintln!("\n=== Regime Return Distribution ===");
    for regime in Regime::ALL {
        let Some(s) = return_stats.get(&regime) else {
            continue;
        };
        if s.num_periods == 0 {
            continue;
        }
        eprintln!(
            "  {:<9} mean {:+.4}%, std {:.4}%, skew {:+.2}, kurtosis {:+.2}",
            regime.as_str(),
            s.mean_return * 100.0,
            s.std_return * 100.0,
            s.skewness,
            s.kurtosis,
        );
    }
}

pub fn run_dry_run(config_path: &PathBuf) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_backtest_config(&adapter) {
        return fail(&e);
    }
    if let Err(e) = validate_regime_config(&adapter) {
        return fail(&e);
    }
    let spec = match build_strategy_spec(&adapter) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };
    eprintln!("Config validated successfully");

    eprintln!("\nResolved strategy:");
    match spec {
        StrategySpec::MaCrossover {
            short_window,
            long_window,
        } => eprintln!("  ma_crossover: short {} / long {}", short_window, long_window),
        StrategySpec::Momentum {
            window,
            buy_threshold,
            sell_threshold,
        } => eprintln!(
            "  momentum: window {}, buy > {}, sell < {}",
            window, buy_threshold, sell_threshold
        ),
        StrategySpec::VolatilityBreakout { window, multiplier } => {
            eprintln!("  volatility_breakout: window {}, multiplier {}", window, multiplier)
        }
        StrategySpec::PairsTrading {
            window,
            entry_z,
            exit_z,
        } => eprintln!(
            "  pairs_trading: window {}, entry |z| > {}, exit |z| < {}",
            window, entry_z, exit_z
        ),
    }

    ExitCode::SUCCESS
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let checks: [fn(&dyn ConfigPort) -> Result<(), RegimetraderError>; 3] = [
        validate_backtest_config,
        validate_regime_config,
        validate_strategy_config,
    ];
    for check in checks {
        if let Err(e) = check(&adapter) {
            return fail(&e);
        }
    }

    eprintln!("Config validated successfully");
    ExitCode::SUCCESS
}

fn run_info(config_path: &PathBuf, ticker_override: Option<&str>) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let ticker = match ticker_override
        .map(str::to_string)
        .or_else(|| adapter.get_string("backtest", "ticker"))
    {
        Some(t) if !t.trim().is_empty() => t,
        _ => {
            return fail(&RegimetraderError::ConfigMissing {
                section: "backtest".to_string(),
                key: "ticker".to_string(),
            })
        }
    };

    let data_path = adapter
        .get_string("data", "path")
        .unwrap_or_else(|| "data".to_string());
    let data_port = CsvAdapter::new(PathBuf::from(data_path));

    match data_port.data_range(&ticker) {
        Ok(Some((first, last, count))) => {
            eprintln!("{}: {} bars, {} to {}", ticker, count, first, last);
            ExitCode::SUCCESS
        }
        Ok(None) => {
            eprintln!("{}: no data", ticker);
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}
