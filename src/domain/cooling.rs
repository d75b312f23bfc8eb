//! Cooling period after a losing streak.
//!
//! Two consecutive losing trades suppress every new entry for
//! `period_days` calendar days, counted from the exit date of the second loss.

use chrono::NaiveDate;

/// Number of consecutive losses that starts a cooling period.
pub const LOSS_STREAK_LIMIT: u32 = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct CoolingController {
    period_days: i64,
    consecutive_losses: u32,
}

/// Observable cooling status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoolingState {
    pub active: bool,
    pub start_date: Option<NaiveDate>,
    pub consecutive_losses: u32,
}

impl CoolingController {
    pub fn new(period_days: i64) -> Self {
        CoolingController {
            period_days,
            consecutive_losses: 0,
        }
    }

    pub fn consecutive_losses(&self) -> u32 {
        self.consecutive_losses
    }

    /// Books a closed trade. Returns true when cooling must start; the loss
    /// counter is reset in that case.
    pub fn record_trade(&mut self, return_pct: f64) -> bool {
        if return_pct < 0.0 {
            self.consecutive_losses += 1;
        } else {
            self.consecutive_losses = 0;
        }

        if self.consecutive_losses >= LOSS_STREAK_LIMIT {
            self.consecutive_losses = 0;
            return true;
        }
        false
    }

    pub fn has_elapsed(&self, since: NaiveDate, today: NaiveDate) -> bool {
        (today - since).num_days() >= self.period_days
    }

    pub fn reset(&mut self) {
        self.consecutive_losses = 0;
    }

    pub fn state(&self, cooling_since: Option<NaiveDate>) -> CoolingState {
        CoolingState {
            active: cooling_since.is_some(),
            start_date: cooling_since,
            consecutive_losses: self.consecutive_losses,
        }
    }
}
