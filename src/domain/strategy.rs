//! Strategy parameters for the two-day-dip backtest.

use crate::domain::signal::SignalConfig;

#[derive(Debug, Clone, PartialEq)]
pub struct StrategyConfig {
    pub initial_capital: f64,
    /// Cost charged on entry and again on exit, in price increments.
    pub transaction_cost_pips: f64,
    /// Value of one price increment.
    pub pip_value: f64,
    pub cooling_period_days: i64,
    pub recovery_threshold_pct: f64,
    /// `None` disables the stop-loss exit.
    pub stop_loss_pct: Option<f64>,
    /// Number of price points searched for an exit after entry.
    pub lookahead_days: usize,
    pub min_cumulative_drop_pct: Option<f64>,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        StrategyConfig {
            initial_capital: 20_000.0,
            transaction_cost_pips: 200.0,
            pip_value: 0.0001,
            cooling_period_days: 7,
            recovery_threshold_pct: 2.0,
            stop_loss_pct: Some(10.0),
            lookahead_days: 36,
            min_cumulative_drop_pct: None,
        }
    }
}

impl StrategyConfig {
    /// 1% target over 30 points without a stop, as used by the recovery study.
    pub fn analysis_variant() -> Self {
        StrategyConfig {
            recovery_threshold_pct: 1.0,
            stop_loss_pct: None,
            lookahead_days: 30,
            ..Self::default()
        }
    }

    pub fn transaction_cost(&self) -> f64 {
        self.transaction_cost_pips * self.pip_value
    }

    pub fn signal_config(&self) -> SignalConfig {
        SignalConfig {
            min_cumulative_drop_pct: self.min_cumulative_drop_pct,
        }
    }

    pub fn recovery_price(&self, entry_price: f64) -> f64 {
        entry_price * (1.0 + self.recovery_threshold_pct / 100.0)
    }

    pub fn stop_price(&self, entry_price: f64) -> Option<f64> {
        self.stop_loss_pct
            .map(|pct| entry_price * (1.0 - pct / 100.0))
    }
}
