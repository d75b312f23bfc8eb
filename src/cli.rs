//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::{write_records, CsvReportAdapter, CsvTradeLogAdapter};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::config_validation::{
    validate_config, validate_data_config, validate_strategy_config,
};
use crate::domain::error::DipbuyerError;
use crate::domain::metrics::PerformanceSummary;
use crate::domain::recovery::{analyse_recovery, RecoveryConfig, RecoveryStats};
use crate::domain::strategy::StrategyConfig;
use crate::domain::trend::{trend_residency, TrendResidency, DEFAULT_SMA_PERIOD};
use crate::domain::universe::{
    collect_series, parse_instruments, resolve_instruments, run_batch, BatchOptions, BatchResult,
};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::PriceSeriesProvider;
use crate::ports::report_port::{ReportPort, TradeLogPort};

#[derive(Parser, Debug)]
#[command(name = "dipbuyer", about = "Backtester for buying after two down days")]
pub struct Cli {
    /// Debug-level logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the strategy over every instrument
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Backtest a single instrument
        #[arg(long)]
        instrument: Option<String>,
        /// Directory for relative report paths
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// How often two-day declines recover, without capital or costs
    Analyse {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Share of days closing above the simple moving average
    Trend {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long, default_value_t = DEFAULT_SMA_PERIOD)]
        period: usize,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List instruments available from the configured source
    ListInstruments {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    init_logging(cli.verbose);

    let result = match cli.command {
        Command::Backtest {
            config,
            instrument,
            output_dir,
        } => run_backtest(&config, instrument.as_deref(), output_dir.as_deref()),
        Command::Analyse { config, output } => run_analyse(&config, output.as_deref()),
        Command::Trend {
            config,
            period,
            output,
        } => run_trend(&config, period, output.as_deref()),
        Command::ListInstruments { config } => run_list_instruments(&config),
        Command::Validate { config } => run_validate(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// Installs the stderr subscriber once; later calls are no-ops.
pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, DipbuyerError> {
    info!(path = %path.display(), "loading config");
    FileConfigAdapter::from_file(path)
}

pub fn build_strategy_config(config: &dyn ConfigPort) -> Result<StrategyConfig, DipbuyerError> {
    validate_strategy_config(config)?;
    let defaults = StrategyConfig::default();

    let stop_loss_pct = config.get_double(
        "strategy",
        "stop_loss_pct",
        defaults.stop_loss_pct.unwrap_or(0.0),
    );

    Ok(StrategyConfig {
        initial_capital: config.get_double("strategy", "initial_capital", defaults.initial_capital),
        transaction_cost_pips: config.get_double(
            "strategy",
            "transaction_cost_pips",
            defaults.transaction_cost_pips,
        ),
        pip_value: config.get_double("strategy", "pip_value", defaults.pip_value),
        cooling_period_days: config.get_int(
            "strategy",
            "cooling_period_days",
            defaults.cooling_period_days,
        ),
        recovery_threshold_pct: config.get_double(
            "strategy",
            "recovery_threshold_pct",
            defaults.recovery_threshold_pct,
        ),
        // zero disables the stop
        stop_loss_pct: (stop_loss_pct > 0.0).then_some(stop_loss_pct),
        lookahead_days: config.get_int("strategy", "lookahead_days", defaults.lookahead_days as i64)
            as usize,
        min_cumulative_drop_pct: config.get_optional_double("strategy", "min_cumulative_drop_pct"),
    })
}

pub fn build_recovery_config(config: &dyn ConfigPort) -> Result<RecoveryConfig, DipbuyerError> {
    let defaults = RecoveryConfig::default();
    let threshold_pct = config.get_double(
        "analysis",
        "recovery_threshold_pct",
        defaults.threshold_pct,
    );
    if threshold_pct <= 0.0 {
        return Err(DipbuyerError::ConfigInvalid {
            section: "analysis".into(),
            key: "recovery_threshold_pct".into(),
            reason: "recovery_threshold_pct must be positive".into(),
        });
    }
    let window = config.get_int("analysis", "window", defaults.window as i64);
    if window < 1 {
        return Err(DipbuyerError::ConfigInvalid {
            section: "analysis".into(),
            key: "window".into(),
            reason: "window must be at least 1".into(),
        });
    }

    Ok(RecoveryConfig {
        threshold_pct,
        window: window as usize,
        signal: build_strategy_config(config)?.signal_config(),
    })
}

pub fn build_batch_options(config: &dyn ConfigPort) -> BatchOptions {
    let secs = config.get_int("backtest", "max_duration_secs", 0);
    BatchOptions {
        parallel: config.get_bool("backtest", "parallel", false),
        max_duration: (secs > 0).then(|| Duration::from_secs(secs as u64)),
    }
}

/// Picks the price source named by `[data] source`.
pub fn build_provider(
    config: &dyn ConfigPort,
) -> Result<Box<dyn PriceSeriesProvider>, DipbuyerError> {
    validate_data_config(config)?;
    let source = config
        .get_string("data", "source")
        .unwrap_or_else(|| "csv".to_string());
    debug!(source = %source, "building price provider");

    match source.trim() {
        "sqlite" => {
            #[cfg(feature = "sqlite")]
            {
                use crate::adapters::sqlite_adapter::SqliteAdapter;
                Ok(Box::new(SqliteAdapter::from_config(config)?))
            }
            #[cfg(not(feature = "sqlite"))]
            {
                Err(feature_missing("sqlite"))
            }
        }
        "postgres" => {
            #[cfg(feature = "postgres")]
            {
                use crate::adapters::postgres_adapter::PostgresAdapter;
                Ok(Box::new(PostgresAdapter::from_config(config)?))
            }
            #[cfg(not(feature = "postgres"))]
            {
                Err(feature_missing("postgres"))
            }
        }
        _ => {
            let path = config.get_string("data", "path").unwrap_or_default();
            Ok(Box::new(CsvAdapter::new(PathBuf::from(path))))
        }
    }
}

#[cfg(not(all(feature = "sqlite", feature = "postgres")))]
fn feature_missing(source: &str) -> DipbuyerError {
    DipbuyerError::ConfigInvalid {
        section: "data".into(),
        key: "source".into(),
        reason: format!("built without the {} feature", source),
    }
}

/// Explicit instrument wins over `[backtest] instruments`; with neither, the
/// provider's full list is used.
pub fn configured_instruments(
    instrument_override: Option<&str>,
    config: &dyn ConfigPort,
) -> Result<Option<Vec<String>>, DipbuyerError> {
    if let Some(instrument) = instrument_override {
        return Ok(Some(vec![instrument.trim().to_string()]));
    }

    match config.get_string("backtest", "instruments") {
        Some(list) if !list.trim().is_empty() => parse_instruments(&list)
            .map(Some)
            .map_err(|e| DipbuyerError::ConfigInvalid {
                section: "backtest".into(),
                key: "instruments".into(),
                reason: e.to_string(),
            }),
        _ => Ok(None),
    }
}

/// Report path from `[report]`, falling back to `default`; relative paths are
/// placed under `output_dir` when one is given.
pub fn report_path(
    config: &dyn ConfigPort,
    key: &str,
    default: &str,
    output_dir: Option<&Path>,
) -> PathBuf {
    let path = PathBuf::from(
        config
            .get_string("report", key)
            .unwrap_or_else(|| default.to_string()),
    );
    match output_dir {
        Some(dir) if path.is_relative() => dir.join(path),
        _ => path,
    }
}

fn run_backtest(
    config_path: &Path,
    instrument_override: Option<&str>,
    output_dir: Option<&Path>,
) -> Result<(), DipbuyerError> {
    let config = load_config(config_path)?;
    validate_config(&config)?;

    let strategy = build_strategy_config(&config)?;
    let options = build_batch_options(&config);
    let provider = build_provider(&config)?;

    let explicit = configured_instruments(instrument_override, &config)?;
    let instruments = resolve_instruments(provider.as_ref(), explicit)?;
    info!(count = instruments.len(), "resolved instruments");

    let batch = run_batch(provider.as_ref(), &instruments, &strategy, &options)?;
    print_summary_table(&batch.summaries());
    print_skipped(&batch);

    let summary_path = report_path(&config, "summary_path", "summary.csv", output_dir);
    let reporter = CsvReportAdapter::new(summary_path)
        .with_skipped(report_path(&config, "skipped_path", "skipped.csv", output_dir))
        .with_trajectory(report_path(
            &config,
            "trajectory_path",
            "trajectory.csv",
            output_dir,
        ));
    reporter.write_summaries(&batch.summaries(), &batch.skipped)?;
    reporter.write_trajectory(&batch.merged_trajectory())?;

    let trade_log = CsvTradeLogAdapter::new(report_path(
        &config,
        "trade_log_path",
        "trades_log.csv",
        output_dir,
    ));
    trade_log.export(&batch.trade_log())?;

    Ok(())
}

fn run_analyse(config_path: &Path, output: Option<&Path>) -> Result<(), DipbuyerError> {
    let config = load_config(config_path)?;
    let recovery = build_recovery_config(&config)?;
    let provider = build_provider(&config)?;

    let explicit = configured_instruments(None, &config)?;
    let instruments = resolve_instruments(provider.as_ref(), explicit)?;
    let (series, skipped) = collect_series(provider.as_ref(), &instruments, None)?;

    let stats: Vec<RecoveryStats> = series
        .iter()
        .map(|s| analyse_recovery(s, &recovery))
        .collect();

    println!(
        "{:<12} {:>10} {:>10} {:>9} {:>12} {:>8}",
        "instrument", "avg drop%", "max drop%", "recovered", "no recovery", "p(rec)"
    );
    for s in &stats {
        println!(
            "{:<12} {:>10} {:>10} {:>9} {:>12} {:>8.3}",
            s.instrument,
            fmt_opt(s.average_decline_pct),
            fmt_opt(s.max_decline_pct),
            s.recovery_count,
            s.no_recovery_count,
            s.recovery_probability,
        );
    }
    for s in &skipped {
        eprintln!("skipped {}: {}", s.instrument, s.reason);
    }

    if let Some(path) = output {
        write_records(path, &stats)?;
    }
    Ok(())
}

fn run_trend(
    config_path: &Path,
    period: usize,
    output: Option<&Path>,
) -> Result<(), DipbuyerError> {
    if period == 0 {
        return Err(DipbuyerError::ConfigInvalid {
            section: "trend".into(),
            key: "period".into(),
            reason: "period must be at least 1".into(),
        });
    }

    let config = load_config(config_path)?;
    let provider = build_provider(&config)?;

    let explicit = configured_instruments(None, &config)?;
    let instruments = resolve_instruments(provider.as_ref(), explicit)?;
    let (series, skipped) = collect_series(provider.as_ref(), &instruments, None)?;

    let residency: Vec<TrendResidency> = series
        .iter()
        .map(|s| trend_residency(s, period))
        .collect();

    println!("{:<12} {:>8} {:>8} {:>9}", "instrument", "above", "days", "% above");
    for r in &residency {
        println!(
            "{:<12} {:>8} {:>8} {:>9.2}",
            r.instrument, r.days_above, r.total_days, r.pct_above
        );
    }
    for s in &skipped {
        eprintln!("skipped {}: {}", s.instrument, s.reason);
    }

    if let Some(path) = output {
        write_records(path, &residency)?;
    }
    Ok(())
}

fn run_list_instruments(config_path: &Path) -> Result<(), DipbuyerError> {
    let config = load_config(config_path)?;
    let provider = build_provider(&config)?;
    let instruments = provider.list_instruments()?;

    if instruments.is_empty() {
        eprintln!("No instruments found");
    } else {
        for instrument in &instruments {
            println!("{}", instrument);
        }
        eprintln!("{} instruments found", instruments.len());
    }
    Ok(())
}

fn run_validate(config_path: &Path) -> Result<(), DipbuyerError> {
    let config = load_config(config_path)?;
    validate_config(&config)?;
    let strategy = build_strategy_config(&config)?;

    eprintln!("Strategy:");
    eprintln!("  initial capital:   {:.2}", strategy.initial_capital);
    eprintln!("  transaction cost:  {}", strategy.transaction_cost());
    eprintln!("  cooling period:    {} days", strategy.cooling_period_days);
    eprintln!("  recovery target:   {}%", strategy.recovery_threshold_pct);
    match strategy.stop_loss_pct {
        Some(stop) => eprintln!("  stop loss:         {}%", stop),
        None => eprintln!("  stop loss:         disabled"),
    }
    eprintln!("  lookahead:         {} points", strategy.lookahead_days);
    if let Some(drop) = strategy.min_cumulative_drop_pct {
        eprintln!("  min 2-day drop:    {}%", drop);
    }

    eprintln!("\nConfiguration is valid.");
    Ok(())
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.2}", v))
}

fn print_summary_table(summaries: &[PerformanceSummary]) {
    println!(
        "{:<12} {:>6} {:>5} {:>5} {:>7} {:>12} {:>9} {:>9} {:>9}",
        "instrument", "trades", "rec", "miss", "p(rec)", "capital", "return%", "annual%", "maxdd%"
    );
    for s in summaries {
        println!(
            "{:<12} {:>6} {:>5} {:>5} {:>7.3} {:>12.2} {:>9.2} {:>9} {:>9.2}",
            s.instrument,
            s.trade_count,
            s.recovery_count,
            s.no_recovery_count,
            s.recovery_probability,
            s.final_capital,
            s.portfolio_return_pct,
            fmt_opt(s.annualized_return_pct),
            s.max_drawdown_pct,
        );
    }
}

fn print_skipped(batch: &BatchResult) {
    if batch.skipped_count() == 0 {
        return;
    }
    println!("\n{} instruments skipped:", batch.skipped_count());
    for s in &batch.skipped {
        println!("  {}: {}", s.instrument, s.reason);
    }
}
