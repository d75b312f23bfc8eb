//! Property tests for simulator invariants.
//!
//! Uses proptest to verify, over random price paths:
//! 1. The first point never carries an entry signal
//! 2. Trades never overlap and always exit on or after entry
//! 3. One trajectory point per closed trade
//! 4. Drawdown is never positive
//! 5. Entries respect the cooling period after two losses
//! 6. The recovery probability stays strictly inside (0, 1)

mod common;

use common::*;
use dipbuyer::domain::metrics::{compute_drawdown, recovery_probability};
use dipbuyer::domain::portfolio::CapitalPoint;
use dipbuyer::domain::price::PriceSeries;
use dipbuyer::domain::signal::{entry_signals, SignalConfig};
use dipbuyer::domain::strategy::StrategyConfig;
use dipbuyer::domain::universe::backtest_instrument;
use proptest::prelude::*;

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_series() -> impl Strategy<Value = PriceSeries> {
    prop::collection::vec(-0.05..0.05_f64, 1..150).prop_map(|moves| {
        let mut price = 100.0;
        let prices: Vec<f64> = moves
            .iter()
            .map(|m| {
                price *= 1.0 + m;
                price
            })
            .collect();
        make_series("PROP", &prices)
    })
}

fn arb_config() -> impl Strategy<Value = StrategyConfig> {
    (
        0.5..5.0_f64,
        prop::option::of(1.0..20.0_f64),
        1_usize..40,
        0_i64..15,
        0.0..300.0_f64,
    )
        .prop_map(|(target, stop, lookahead, cooling, pips)| StrategyConfig {
            recovery_threshold_pct: target,
            stop_loss_pct: stop,
            lookahead_days: lookahead,
            cooling_period_days: cooling,
            transaction_cost_pips: pips,
            ..StrategyConfig::default()
        })
}

proptest! {
    #[test]
    fn first_point_never_signals(
        series in arb_series(),
        min_drop in prop::option::of(0.0..3.0_f64),
    ) {
        let signals = entry_signals(&series, &SignalConfig { min_cumulative_drop_pct: min_drop });
        prop_assert_eq!(signals.len(), series.len());
        prop_assert!(!signals[0]);
    }

    #[test]
    fn trades_never_overlap(series in arb_series(), config in arb_config()) {
        let result = backtest_instrument(&series, &config).unwrap();
        for trade in &result.trades {
            prop_assert!(trade.entry_date <= trade.exit_date);
        }
        for pair in result.trades.windows(2) {
            prop_assert!(pair[0].exit_date <= pair[1].entry_date);
        }
    }

    #[test]
    fn trajectory_has_one_point_per_trade(series in arb_series(), config in arb_config()) {
        let result = backtest_instrument(&series, &config).unwrap();
        let summary = &result.summary;
        prop_assert_eq!(
            result.trajectory.len(),
            summary.recovery_count + summary.no_recovery_count
        );
        prop_assert_eq!(result.trades.len(), summary.trade_count);
    }

    #[test]
    fn drawdown_is_never_positive(series in arb_series(), config in arb_config()) {
        let result = backtest_instrument(&series, &config).unwrap();
        prop_assert!(result.summary.max_drawdown_pct <= 0.0);
    }

    #[test]
    fn non_decreasing_curve_has_no_drawdown(steps in prop::collection::vec(0.0..100.0_f64, 1..50)) {
        let mut capital = 1000.0;
        let curve: Vec<CapitalPoint> = steps
            .iter()
            .enumerate()
            .map(|(i, step)| {
                capital += step;
                CapitalPoint { date: day(i as i64 + 1), capital }
            })
            .collect();
        let (dd, _) = compute_drawdown(&curve).unwrap();
        prop_assert_eq!(dd, 0.0);
    }

    #[test]
    fn entries_respect_cooling(series in arb_series(), config in arb_config()) {
        let result = backtest_instrument(&series, &config).unwrap();
        let mut losses = 0;
        for pair in result.trades.windows(2) {
            if pair[0].return_pct < 0.0 {
                losses += 1;
            } else {
                losses = 0;
            }
            if losses == 2 {
                losses = 0;
                let gap = (pair[1].entry_date - pair[0].exit_date).num_days();
                prop_assert!(gap >= config.cooling_period_days);
            }
        }
    }

    #[test]
    fn probability_strictly_inside_unit_interval(r in 0_usize..100_000, n in 0_usize..100_000) {
        let p = recovery_probability(r, n);
        prop_assert!(p > 0.0 && p < 1.0);
    }
}
