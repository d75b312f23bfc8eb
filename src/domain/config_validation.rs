//! Configuration validation.
//!
//! Validates all config fields before a run starts.

use crate::domain::error::DipbuyerError;
use crate::domain::universe::parse_instruments;
use crate::ports::config_port::ConfigPort;

pub const DATA_SOURCES: [&str; 3] = ["csv", "sqlite", "postgres"];

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), DipbuyerError> {
    validate_data_config(config)?;
    validate_strategy_config(config)?;
    validate_backtest_config(config)?;
    Ok(())
}

pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), DipbuyerError> {
    let source = config
        .get_string("data", "source")
        .unwrap_or_else(|| "csv".to_string());

    match source.trim() {
        "csv" => match config.get_string("data", "path") {
            Some(p) if !p.trim().is_empty() => Ok(()),
            _ => Err(DipbuyerError::ConfigMissing {
                section: "data".to_string(),
                key: "path".to_string(),
            }),
        },
        "sqlite" => match config.get_string("sqlite", "path") {
            Some(p) if !p.trim().is_empty() => Ok(()),
            _ => Err(DipbuyerError::ConfigMissing {
                section: "sqlite".to_string(),
                key: "path".to_string(),
            }),
        },
        "postgres" => match config.get_string("postgres", "connection_string") {
            Some(s) if !s.trim().is_empty() => Ok(()),
            _ => Err(DipbuyerError::ConfigMissing {
                section: "postgres".to_string(),
                key: "connection_string".to_string(),
            }),
        },
        other => Err(DipbuyerError::ConfigInvalid {
            section: "data".to_string(),
            key: "source".to_string(),
            reason: format!(
                "unknown source '{}', expected one of {}",
                other,
                DATA_SOURCES.join(", ")
            ),
        }),
    }
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), DipbuyerError> {
    validate_initial_capital(config)?;
    validate_transaction_cost(config)?;
    validate_cooling_period(config)?;
    validate_recovery_threshold(config)?;
    validate_stop_loss(config)?;
    validate_lookahead(config)?;
    validate_cumulative_drop(config)?;
    Ok(())
}

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), DipbuyerError> {
    if let Some(list) = config.get_string("backtest", "instruments") {
        if let Err(e) = parse_instruments(&list) {
            return Err(invalid("backtest", "instruments", e.to_string()));
        }
    }
    if config.get_int("backtest", "max_duration_secs", 0) < 0 {
        return Err(invalid(
            "backtest",
            "max_duration_secs",
            "max_duration_secs must be non-negative",
        ));
    }
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> DipbuyerError {
    DipbuyerError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn validate_initial_capital(config: &dyn ConfigPort) -> Result<(), DipbuyerError> {
    let value = config.get_double("strategy", "initial_capital", 20_000.0);
    if value <= 0.0 {
        return Err(invalid(
            "strategy",
            "initial_capital",
            "initial_capital must be positive",
        ));
    }
    Ok(())
}

fn validate_transaction_cost(config: &dyn ConfigPort) -> Result<(), DipbuyerError> {
    if config.get_double("strategy", "transaction_cost_pips", 200.0) < 0.0 {
        return Err(invalid(
            "strategy",
            "transaction_cost_pips",
            "transaction_cost_pips must be non-negative",
        ));
    }
    if config.get_double("strategy", "pip_value", 0.0001) <= 0.0 {
        return Err(invalid("strategy", "pip_value", "pip_value must be positive"));
    }
    Ok(())
}

fn validate_cooling_period(config: &dyn ConfigPort) -> Result<(), DipbuyerError> {
    if config.get_int("strategy", "cooling_period_days", 7) < 0 {
        return Err(invalid(
            "strategy",
            "cooling_period_days",
            "cooling_period_days must be non-negative",
        ));
    }
    Ok(())
}

fn validate_recovery_threshold(config: &dyn ConfigPort) -> Result<(), DipbuyerError> {
    if config.get_double("strategy", "recovery_threshold_pct", 2.0) <= 0.0 {
        return Err(invalid(
            "strategy",
            "recovery_threshold_pct",
            "recovery_threshold_pct must be positive",
        ));
    }
    Ok(())
}

fn validate_stop_loss(config: &dyn ConfigPort) -> Result<(), DipbuyerError> {
    let value = config.get_double("strategy", "stop_loss_pct", 10.0);
    if !(0.0..100.0).contains(&value) {
        return Err(invalid(
            "strategy",
            "stop_loss_pct",
            "stop_loss_pct must be between 0 and 100",
        ));
    }
    Ok(())
}

fn validate_lookahead(config: &dyn ConfigPort) -> Result<(), DipbuyerError> {
    if config.get_int("strategy", "lookahead_days", 36) < 1 {
        return Err(invalid(
            "strategy",
            "lookahead_days",
            "lookahead_days must be at least 1",
        ));
    }
    Ok(())
}

fn validate_cumulative_drop(config: &dyn ConfigPort) -> Result<(), DipbuyerError> {
    match config.get_string("strategy", "min_cumulative_drop_pct") {
        None => Ok(()),
        Some(raw) => match raw.trim().parse::<f64>() {
            Ok(v) if v >= 0.0 => Ok(()),
            _ => Err(invalid(
                "strategy",
                "min_cumulative_drop_pct",
                "min_cumulative_drop_pct must be a non-negative number",
            )),
        },
    }
}
